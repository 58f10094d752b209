use pnp_conveyor::{LaneItem, TargetRef};
use pnp_core::{RowId, Vec2};

/// One item a rail may try to intercept this pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate {
    pub target:   TargetRef,
    pub row:      RowId,
    pub position: Vec2,
}

impl Candidate {
    pub fn of<I: LaneItem>(item: &I) -> Self {
        Self { target: item.target(), row: item.row(), position: item.position() }
    }
}

/// Which end of the rail acts first, seen from the lane being served.
///
/// `Zero` leads with slider 0 (the lower y), `Negative` with slider 1.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Side {
    Zero,
    Negative,
}

impl Side {
    /// Index of the lead slider within the rail.
    #[inline]
    pub fn lead(self) -> usize {
        match self {
            Side::Zero => 0,
            Side::Negative => 1,
        }
    }

    #[inline]
    pub fn swapped(self) -> Side {
        match self {
            Side::Zero => Side::Negative,
            Side::Negative => Side::Zero,
        }
    }
}
