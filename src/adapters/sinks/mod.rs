//! Response sink adapters.

pub mod file;
pub mod texture;
