//! Spatial-subsystem error type.

use thiserror::Error;

use sw_core::{NodeId, SwError};

/// Errors produced by `sw-spatial`.
///
/// Routing failures are ordinary values: callers keep their previous route.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("point cannot be snapped onto the road graph")]
    Unsnappable,

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("road layer contains no usable coordinates")]
    NoRoads,

    #[error(transparent)]
    Core(#[from] SwError),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
