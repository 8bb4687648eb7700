// src/solver/mod.rs
pub mod boundary;
pub mod forces;
pub mod integrate;
pub mod lifecycle;

// Re-export from the solver module
pub use boundary::Domain;
pub use forces::*;
pub use integrate::*;
pub use lifecycle::*;
