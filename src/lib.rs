//! Latent bridge - drive a generative image model from a live controller.
//!
//! A controller sends `seed_<n>` datagrams (or calls the plugin callbacks
//! with a latent vector), the bridge runs one inference at a time and hands
//! each image to a sink: a file, a shared texture frame, or the caller.

pub mod adapters;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod context;
pub mod decoder;
pub mod error;
pub mod latent;
pub mod model;
pub mod output;
pub mod params;
pub mod plugin;
pub mod ports;
pub mod session;
pub mod settings;
