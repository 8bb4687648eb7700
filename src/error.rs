//! Error types for simulation setup and parameter files.

use thiserror::Error;

use crate::math::Real;

#[derive(Error, Debug)]
pub enum FluidError {
    #[error("particle mass must be positive and finite, got {0}")]
    InvalidMass(Real),
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: Real },
    #[error("failed to access params file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse params: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FluidResult<T> = Result<T, FluidError>;
