//! Chat prompt normalization and provider request shaping.

pub mod constants;
pub mod error;
pub mod transforms;

pub use error::ConvertError;
