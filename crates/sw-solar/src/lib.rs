//! `sw-solar`: where the sun is, and which way its light falls.
//!
//! | Module  | Contents                                            |
//! |---------|-----------------------------------------------------|
//! | [`sun`] | `SunPosition` (altitude, azimuth, scene direction)  |
//!
//! The estimator is the NOAA low-precision algorithm: good to roughly a
//! tenth of a degree between 1800 and 2100, which is far below what shade
//! sampling on a city-scale road graph can resolve.
//!
//! There is no error type.  An unusable timestamp yields the fixed
//! [`SunPosition::fallback`] position so NaN never reaches the lighting or
//! shade pipeline.

pub mod sun;


pub use sun::SunPosition;
