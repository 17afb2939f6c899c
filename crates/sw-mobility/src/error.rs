use sw_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("routing failed: {0}")]
    Routing(#[from] SpatialError),

    #[error("replanner returned an empty route")]
    EmptyRoute,
}

pub type MobilityResult<T> = Result<T, MobilityError>;
