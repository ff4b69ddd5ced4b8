//! Inference provider adapters.

pub mod remote;
pub mod synthetic;
