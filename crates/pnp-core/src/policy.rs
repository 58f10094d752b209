//! Named choices read from the parameter file.
//!
//! Both enums are closed: names are resolved once while the parameters are
//! validated, and nothing downstream compares strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PnpError;

// ── SchedulingPolicy ──────────────────────────────────────────────────────────

/// Ordering applied to a rail's candidates before the feasibility search.
///
/// | Name   | Order                                            |
/// |--------|--------------------------------------------------|
/// | `FIFO` | oldest generation row first                      |
/// | `LIFO` | newest generation row first                      |
/// | `SPT`  | ascending beam-axis position                     |
/// | `LPT`  | descending beam-axis position, lead slider swap  |
///
/// `splitConveyor` is a recognised name with no implementation; selecting it
/// is a configuration error distinct from an unknown name.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum SchedulingPolicy {
    #[default]
    Fifo,
    Lifo,
    Spt,
    Lpt,
}

impl SchedulingPolicy {
    /// Every implemented policy, in table order.
    pub const ALL: [SchedulingPolicy; 4] = [
        SchedulingPolicy::Fifo,
        SchedulingPolicy::Lifo,
        SchedulingPolicy::Spt,
        SchedulingPolicy::Lpt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SchedulingPolicy::Fifo => "FIFO",
            SchedulingPolicy::Lifo => "LIFO",
            SchedulingPolicy::Spt  => "SPT",
            SchedulingPolicy::Lpt  => "LPT",
        }
    }
}

impl FromStr for SchedulingPolicy {
    type Err = PnpError;

    fn from_str(s: &str) -> Result<Self, PnpError> {
        match s {
            "FIFO" => Ok(SchedulingPolicy::Fifo),
            "LIFO" => Ok(SchedulingPolicy::Lifo),
            "SPT"  => Ok(SchedulingPolicy::Spt),
            "LPT"  => Ok(SchedulingPolicy::Lpt),
            "splitConveyor" => Err(PnpError::PolicyNotImplemented(s.to_owned())),
            other => Err(PnpError::UnknownPolicy(other.to_owned())),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── RowPattern ────────────────────────────────────────────────────────────────

/// Layout of the items inside one in-feed generation row.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum RowPattern {
    /// Items spread evenly across the usable width, identical every row.
    #[default]
    Aligned,
    /// As `Aligned`, with every odd generation shifted by half the item pitch.
    Staggered,
}

impl RowPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            RowPattern::Aligned   => "aligned",
            RowPattern::Staggered => "staggered",
        }
    }
}

impl FromStr for RowPattern {
    type Err = PnpError;

    fn from_str(s: &str) -> Result<Self, PnpError> {
        match s {
            "aligned"   => Ok(RowPattern::Aligned),
            "staggered" => Ok(RowPattern::Staggered),
            other => Err(PnpError::UnknownPattern(other.to_owned())),
        }
    }
}

impl fmt::Display for RowPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
