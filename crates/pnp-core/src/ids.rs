//! Strongly typed, zero-cost identifier wrappers.
//!
//! Ids are ordered: lanes key their items in `BTreeMap`s so candidate order
//! is ascending id without a sort.  Machine ids double as arena indices
//! through `.index()`.

use std::fmt;

/// Newtype over an integer id with arena indexing and a `MAX` sentinel.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Placeholder for arena slots filled in after construction.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// A pickable item on an in-feed lane.  Unique across all in-feed lanes.
    pub struct PickId(u32);
}

typed_id! {
    /// A drop slot on an out-feed lane.  Unique across all out-feed lanes.
    pub struct DropId(u32);
}

typed_id! {
    /// A package (group of drop slots filled together).
    pub struct PackageId(u32);
}

typed_id! {
    /// A generation row.  Items generated together share a row.
    pub struct RowId(u32);
}

typed_id! {
    /// Index of a slider in the machine arena.
    pub struct SliderId(u16);
}

typed_id! {
    /// Index of a rail (one beam side) in the machine arena.
    pub struct RailId(u16);
}

typed_id! {
    /// Index of a beam in the machine arena.
    pub struct BeamId(u16);
}

typed_id! {
    /// Index of a conveyor lane within its feed (in-feed or out-feed).
    pub struct LaneId(u16);
}
