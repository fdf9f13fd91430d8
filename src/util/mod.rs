//! Utility types shared by every layer.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`Dimensions`] - Dataspace extents
//! - [`Settings`] - Library configuration

mod dimensions;
mod error;
mod settings;

pub use dimensions::*;
pub use error::*;
pub use settings::*;
