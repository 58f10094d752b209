//! line: the reference sorting line, run as a small batch.
//!
//! Six beams over two in-feed lanes and one out-feed lane of split packages.
//! Pass a parameter JSON path to simulate another line and `--sweep` to also
//! vary the belt speed and the scheduling policies; `RUST_LOG` controls log
//! verbosity.  Ctrl-C ends the batch once the current run is written out.

mod logging;

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};

use pnp_core::{MachineParams, RunStats, SchedulingPolicy, SimRng, Tick};
use pnp_machine::MachineError;
use pnp_output::{CsvWriter, ErrorRow, OutputWriter, SimOutputObserver};
use pnp_sim::{RunOutcome, SimBuilder, SimError, SimObserver, Snapshot, StopSignal};

// ── Constants ─────────────────────────────────────────────────────────────────

const RUNS:                u32 = 3;
/// Seeds tried per run before it is given up.
const ATTEMPTS:            u32 = 3;
const BATCH_SEED:          u64 = 42;
const SNAPSHOT_INTERVAL:   u64 = 100; // one snapshot per simulated second
const OUTPUT_DIR:          &str = "output/line";

/// Belt speed multipliers, fastest first.
const SPEED_FROM:          f64 = 1.3;
const SPEED_TO:            f64 = 0.7;
const SPEED_STEPS:         usize = 7;

// ── Observer wrapper to count rows ────────────────────────────────────────────

struct CountingObserver<W: OutputWriter> {
    inner:     SimOutputObserver<W>,
    snapshots: usize,
    ticks:     u64,
}

impl<W: OutputWriter> CountingObserver<W> {
    fn new(inner: SimOutputObserver<W>) -> Self {
        Self { inner, snapshots: 0, ticks: 0 }
    }
}

impl<W: OutputWriter> SimObserver for CountingObserver<W> {
    fn on_tick_end(&mut self, tick: Tick, stats: &RunStats) {
        self.ticks += 1;
        self.inner.on_tick_end(tick, stats);
    }

    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.snapshots += 1;
        self.inner.on_snapshot(snapshot);
    }

    fn on_run_end(&mut self, final_tick: Tick, stats: &RunStats) {
        self.inner.on_run_end(final_tick, stats);
    }
}

// ── Batch cases ───────────────────────────────────────────────────────────────

/// One parameter set of the batch, written to its own output directory.
struct Case {
    name:   String,
    params: MachineParams,
}

fn cases(base: &MachineParams, sweep: bool) -> Vec<Case> {
    let mut cases = vec![Case { name: "reference".to_owned(), params: base.clone() }];
    if !sweep {
        return cases;
    }

    for i in 0..SPEED_STEPS {
        let m = SPEED_FROM + (SPEED_TO - SPEED_FROM) * i as f64 / (SPEED_STEPS - 1) as f64;
        let mut params = base.clone();
        params.conveyor.speed = base.conveyor.speed.map(|v| v * m);
        cases.push(Case { name: format!("speed_x{m:.2}"), params });
    }

    let beams = base.beam.nb_of_beams;
    for pin in SchedulingPolicy::ALL {
        for pout in SchedulingPolicy::ALL {
            let mut params = base.clone();
            params.beam.scheduling = vec![pin.as_str().to_owned(); beams];
            params.beam.out_scheduling = Some(vec![pout.as_str().to_owned(); beams]);
            let name = format!("sched_{}_{}", pin.as_str(), pout.as_str()).to_lowercase();
            cases.push(Case { name, params });
        }
    }
    cases
}

/// Totals over every case of the batch.
#[derive(Default)]
struct Tally {
    finished:  u32,
    errors:    u32,
    ticks:     u64,
    snapshots: usize,
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    logging::init();

    let mut sweep = false;
    let mut params_path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--sweep" => sweep = true,
            _ => params_path = Some(arg),
        }
    }
    let base = match params_path {
        Some(path) => MachineParams::load_json(&path)?,
        None => MachineParams::default(),
    };
    let cases = cases(&base, sweep);

    // `batch` stays raised once Ctrl-C is seen; `run` is re-armed by every reset.
    let batch = StopSignal::new();
    let run = StopSignal::new();
    {
        let (batch, run) = (batch.clone(), run.clone());
        ctrlc::set_handler(move || {
            run.stop();
            batch.stop();
        })?;
    }

    println!("=== line: pick-and-place sorting line ===");
    println!(
        "Beams: {}  |  Sliders: {}  |  Cases: {}  |  Runs: {RUNS} × {:.0} s",
        base.beam.nb_of_beams,
        base.slider_count(),
        cases.len(),
        base.duration,
    );
    println!();
    println!(
        "{:<16} {:<12} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "Case", "Seed", "Placed", "Picks", "Missed", "Unfilled", "Fill rate"
    );
    println!("{}", "-".repeat(76));

    let mut seeds = SimRng::new(BATCH_SEED);
    let mut tally = Tally::default();
    let t0 = Instant::now();
    for case in cases {
        if batch.is_stopped() {
            break;
        }
        run_case(case, &mut seeds, &batch, &run, &mut tally)?;
    }
    let elapsed = t0.elapsed();

    println!();
    if batch.is_stopped() {
        println!("Batch interrupted after {:.3} s", elapsed.as_secs_f64());
    } else {
        println!("Batch complete in {:.3} s", elapsed.as_secs_f64());
    }
    println!("  ticks simulated : {}", tally.ticks);
    println!("  snapshots.csv   : {} snapshots", tally.snapshots);
    println!("  run_stats.csv   : {} rows", tally.finished);
    println!("  errors.csv      : {} rows", tally.errors);

    Ok(())
}

/// Run every seed of one case.  A run that breaks a state-machine invariant
/// is written to `errors.csv` and retried with the next seed.
fn run_case(
    case:  Case,
    seeds: &mut SimRng,
    batch: &StopSignal,
    run:   &StopSignal,
    tally: &mut Tally,
) -> Result<()> {
    let mut config = case.params.run_config();
    config.snapshot_interval_ticks = SNAPSHOT_INTERVAL;
    let mut sim = SimBuilder::from_params(case.params)?
        .run_config(config)
        .stop_signal(run.clone())
        .build()?;

    let dir = Path::new(OUTPUT_DIR).join(&case.name);
    std::fs::create_dir_all(&dir)?;
    let mut obs = CountingObserver::new(SimOutputObserver::new(CsvWriter::new(&dir)?));

    'runs: for index in 0..RUNS {
        for attempt in 0..ATTEMPTS {
            let seed = seeds.next_run_seed();
            sim.reset(seed)?;
            // a Ctrl-C that landed before the reset re-armed the run flag
            if batch.is_stopped() {
                break 'runs;
            }

            match sim.run(&mut obs) {
                Ok(outcome) => {
                    tally.finished += 1;
                    let s = &sim.ctx.stats;
                    println!(
                        "{:<16} {:<12} {:>8} {:>8} {:>8} {:>8} {:>10.3}",
                        case.name,
                        seed,
                        s.placed(),
                        s.total_picks,
                        s.missed_picks,
                        s.unfilled_packages,
                        s.fill_rate(),
                    );
                    if outcome == RunOutcome::Interrupted {
                        info!(case = %case.name, run = index, "batch interrupted");
                        break 'runs;
                    }
                    continue 'runs;
                }
                Err(SimError::Machine(MachineError::InvariantViolation(violation))) => {
                    let tick = sim.ctx.clock.current_tick;
                    warn!(case = %case.name, run = index, attempt, seed, %tick, "run abandoned: {violation}");
                    tally.errors += 1;
                    obs.inner.record_error(&ErrorRow {
                        run:   index,
                        seed,
                        tick:  tick.0,
                        error: violation.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
        warn!(case = %case.name, run = index, "no seed finished, run skipped");
    }

    tally.ticks += obs.ticks;
    tally.snapshots += obs.snapshots;
    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error in {}: {e}", case.name);
    }
    Ok(())
}
