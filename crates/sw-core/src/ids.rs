//! Strongly typed identifier wrappers.
//!
//! The road graph and the agent list are index-based arenas, so every id is a
//! plain `u32` position.  The wrappers keep node, edge, and agent indices from
//! being mixed up while still being `Copy + Ord + Hash`.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as an arena index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Build an id from an arena position.
            ///
            /// Arenas never exceed `u32::MAX` entries at city scale; positions
            /// past that saturate to `INVALID`.
            #[inline]
            pub fn from_index(i: usize) -> Self {
                <$inner>::try_from(i).map($name).unwrap_or(Self::INVALID)
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

typed_id! {
    /// Index of a road-graph node (intersection or sampled curve point).
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of an undirected road-graph edge.
    pub struct EdgeId(u32);
}

typed_id! {
    /// Slot of an agent in the simulation's agent list.
    pub struct AgentId(u32);
}
