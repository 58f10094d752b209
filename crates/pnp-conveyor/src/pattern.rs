//! Precomputed item layouts, relative to a lane's generation origin.
//!
//! Offsets are in the machine frame: x along the flow, y across the lane
//! (relative to the lane centre line).

use pnp_core::{RowPattern, Vec2};

/// `n` evenly spaced values over `[lo, hi]`; a single value sits at the midpoint.
pub(crate) fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![(lo + hi) / 2.0],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| lo + step * i as f64).collect()
        }
    }
}

// ── In-feed rows ──────────────────────────────────────────────────────────────

/// One in-feed generation row: items spread across the usable width.
#[derive(Clone, Debug, PartialEq)]
pub struct RowLayout {
    pub offsets: Vec<Vec2>,
    pub kind:    RowPattern,
    /// Distance between neighbouring items across the lane.
    pub pitch:   f64,
}

impl RowLayout {
    /// `usable_width` is the lane width minus one item width.
    pub fn new(items: usize, usable_width: f64, kind: RowPattern) -> Self {
        let half = usable_width / 2.0;
        let offsets = linspace(-half, half, items)
            .into_iter()
            .map(|y| Vec2::new(0.0, y))
            .collect();
        let pitch = if items > 1 { usable_width / (items - 1) as f64 } else { 0.0 };
        Self { offsets, kind, pitch }
    }

    /// Across-lane shift for generation `generation`.
    ///
    /// Staggered rows alternate ±pitch/4, so consecutive rows are offset by
    /// half a pitch while both stay centred on the lane.
    pub fn shift(&self, generation: u32) -> f64 {
        match self.kind {
            RowPattern::Aligned => 0.0,
            RowPattern::Staggered if generation % 2 == 0 => -self.pitch / 4.0,
            RowPattern::Staggered => self.pitch / 4.0,
        }
    }
}

// ── Out-feed packages ─────────────────────────────────────────────────────────

/// One slot of the out-feed package group.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlotLayout {
    pub offset:  Vec2,
    /// Package index within the group (0, or 0/1 when split).
    pub package: u32,
    /// Row index within the group.
    pub row:     u32,
}

/// One out-feed generation: `rows × per_row` slots forming one or two packages.
#[derive(Clone, Debug, PartialEq)]
pub struct PackageLayout {
    pub slots:    Vec<SlotLayout>,
    pub packages: u32,
    pub rows:     u32,
}

impl PackageLayout {
    /// Rows advance downstream from the origin (`flow_sign` × `row_spacing`).
    /// With a split spacing the slots are pushed apart across the centre line
    /// and each half forms its own package.
    pub fn new(
        per_row:       usize,
        rows:          usize,
        width:         f64,
        side_offset:   f64,
        split_spacing: Option<f64>,
        row_spacing:   f64,
        flow_sign:     f64,
    ) -> Self {
        let split = split_spacing.unwrap_or(0.0);
        let half = (width - side_offset - split) / 2.0;
        let mut across = linspace(-half, half, per_row);
        if split_spacing.is_some() {
            for y in &mut across {
                *y += if *y > 0.0 { split / 2.0 } else { -split / 2.0 };
            }
        }

        let mut slots = Vec::with_capacity(per_row * rows);
        for r in 0..rows {
            let x = r as f64 * row_spacing * flow_sign;
            for &y in &across {
                let package = u32::from(split_spacing.is_some() && y > 0.0);
                slots.push(SlotLayout { offset: Vec2::new(x, y), package, row: r as u32 });
            }
        }
        let packages = if split_spacing.is_some() { 2 } else { 1 };
        Self { slots, packages, rows: rows as u32 }
    }
}
