//! Carbon cycle simulator
//!
//! The simulation itself lives in [`ccycle_core`]; this crate re-exports it and
//! builds the `_lib` Python extension module when the `python` feature is on.

pub use ccycle_core::*;

#[cfg(feature = "python")]
mod python;
