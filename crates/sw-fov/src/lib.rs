//! `sw-fov`: what each agent can see.
//!
//! | Module  | Contents                                                     |
//! |---------|--------------------------------------------------------------|
//! | [`fan`] | `FovParams`, `FovFan`, `FovCap`, `shade_along_heading`       |
//!
//! The fan is output only: steering never reads it.  It is rebuilt in place
//! every tick so a renderer can upload the same buffers each frame.

pub mod fan;


pub use fan::{FovCap, FovFan, FovParams, shade_along_heading};
