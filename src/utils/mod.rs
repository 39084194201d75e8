//! Utility functions and types

pub mod timing;

pub use timing::{measure, timed, Timer};
