use thiserror::Error;

use sw_core::SwError;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("no building footprint could be extruded ({skipped} skipped)")]
    NoBuildings { skipped: usize },

    #[error(transparent)]
    Core(#[from] SwError),
}

pub type WorldResult<T> = Result<T, WorldError>;
