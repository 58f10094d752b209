//! Rails and beams.

use pnp_core::{BeamId, LaneId, RailId, SliderId};

use crate::RailPhase;

/// Two sliders sharing one side of a beam.
#[derive(Clone, Debug, PartialEq)]
pub struct Rail {
    pub id:       RailId,
    pub beam:     BeamId,
    /// `-1.0` for the rail whose arms reach toward −x, `+1.0` otherwise.
    pub side:     f64,
    pub sliders:  [SliderId; 2],
    pub phase:    RailPhase,
    /// The ready phase the rail is starving in, while it bounces.
    pub bouncing: Option<RailPhase>,
    /// Consecutive passes that found no candidate at all.
    pub starved_passes: u32,
}

impl Rail {
    /// Id of the other slider on this rail.
    #[inline]
    pub fn sibling(&self, index: usize) -> SliderId {
        self.sliders[1 - index]
    }
}

/// A fixed beam across the lanes carrying two rails.
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
    pub id:       BeamId,
    /// Flow-axis position of the beam centre line.
    pub x:        f64,
    pub rails:    [RailId; 2],
    /// In-feed lane the beam picks from.
    pub in_lane:  LaneId,
    /// Out-feed lane the beam places onto.
    pub out_lane: LaneId,
}
