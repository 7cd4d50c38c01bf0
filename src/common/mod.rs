pub mod constants;
pub mod errors;
pub mod float_utils;

pub use errors::InvariantViolation;
