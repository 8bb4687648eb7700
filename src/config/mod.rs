//! Configuration and parameters
//!
//! Fixed force coefficients and tunable simulation parameters.

pub mod constants;
pub mod fluid_params;

pub use constants::*;
pub use fluid_params::*;
