//! Scheduling policies resolved to plain ordering functions.
//!
//! | Policy | Order                                   | Reversed when | Swaps lead |
//! |--------|-----------------------------------------|---------------|------------|
//! | FIFO   | rows oldest first, ids within a row     | row, Negative | no         |
//! | LIFO   | rows newest first, ids within a row     | row, Negative | no         |
//! | SPT    | ascending y (stable)                    | all, Negative | no         |
//! | LPT    | ascending y (stable)                    | all, Zero     | yes        |
//!
//! Candidates arrive in ascending id order, so within a row the ids keep
//! their generation order.

use pnp_core::SchedulingPolicy;

use crate::{Candidate, Side};

/// Ordering plus the lead-slider rule of one scheduling policy.
#[derive(Copy, Clone, Debug)]
pub struct Strategy {
    pub policy:     SchedulingPolicy,
    pub order:      fn(&mut [Candidate], Side),
    pub swaps_lead: bool,
}

impl Strategy {
    pub fn for_policy(policy: SchedulingPolicy) -> Self {
        let (order, swaps_lead): (fn(&mut [Candidate], Side), bool) = match policy {
            SchedulingPolicy::Fifo => (fifo, false),
            SchedulingPolicy::Lifo => (lifo, false),
            SchedulingPolicy::Spt => (spt, false),
            SchedulingPolicy::Lpt => (lpt, true),
        };
        Self { policy, order, swaps_lead }
    }

    /// Slider index this strategy tries first for `side`.
    #[inline]
    pub fn lead(&self, side: Side) -> usize {
        if self.swaps_lead { side.swapped().lead() } else { side.lead() }
    }
}

pub fn fifo(candidates: &mut [Candidate], side: Side) {
    by_rows(candidates, side, false);
}

pub fn lifo(candidates: &mut [Candidate], side: Side) {
    by_rows(candidates, side, true);
}

pub fn spt(candidates: &mut [Candidate], side: Side) {
    by_y(candidates);
    if side == Side::Negative {
        candidates.reverse();
    }
}

pub fn lpt(candidates: &mut [Candidate], side: Side) {
    by_y(candidates);
    if side == Side::Zero {
        candidates.reverse();
    }
}

fn by_rows(candidates: &mut [Candidate], side: Side, newest_first: bool) {
    candidates.sort_by(|a, b| {
        let ord = a.row.cmp(&b.row);
        if newest_first { ord.reverse() } else { ord }
    });
    if side == Side::Negative {
        for row in candidates.chunk_by_mut(|a, b| a.row == b.row) {
            row.reverse();
        }
    }
}

fn by_y(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
}
