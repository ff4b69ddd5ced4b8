//! Startup composition: build the provider and sink a bridge will own.

use std::path::Path;

use tracing::info;

use crate::adapters::providers::remote::RemoteProvider;
use crate::adapters::providers::synthetic::SyntheticProvider;
use crate::adapters::sinks::file::FileSink;
use crate::adapters::sinks::texture::TexturePublisher;
use crate::error::StartupError;
use crate::model::{detect_backend, Backend};
use crate::params::SinkMode;
use crate::ports::{InferenceProvider, ResponseSink};
use crate::session::Session;
use crate::settings::BridgeSettings;

/// Load the inference provider named by `network`.
///
/// `latent_dim` applies to remote providers; local descriptors carry their own.
///
/// # Errors
///
/// Returns an error if the artifact is missing or invalid.
pub fn load_provider(
    network: &str,
    latent_dim: usize,
) -> Result<Box<dyn InferenceProvider>, StartupError> {
    let backend = detect_backend(network);
    info!(network, ?backend, "loading model");
    let provider: Box<dyn InferenceProvider> = match backend {
        Backend::Remote => Box::new(RemoteProvider::new(network, latent_dim)?),
        Backend::Synthetic => Box::new(SyntheticProvider::load(Path::new(network))?),
    };
    Ok(provider)
}

/// Load the provider and wrap it in a session with the configured defaults.
///
/// # Errors
///
/// Returns an error if the provider cannot be loaded.
pub fn open_session(settings: &BridgeSettings) -> Result<Session, StartupError> {
    let provider = load_provider(&settings.checkpoint, settings.latent_dim)?;
    Ok(Session::new(provider, settings.truncation, settings.seed))
}

/// Build the response sink for the configured mode.
///
/// # Errors
///
/// Returns an error for [`SinkMode::Return`], which only exists for
/// in-process callers, or if the texture sender cannot be created.
pub fn build_sink(settings: &BridgeSettings) -> Result<Box<dyn ResponseSink>, StartupError> {
    let sink: Box<dyn ResponseSink> = match settings.sink_mode {
        SinkMode::File => Box::new(FileSink::new(&settings.output)),
        SinkMode::Texture => {
            let t = &settings.texture;
            Box::new(TexturePublisher::create(&t.name, t.width, t.height, &t.dir)?)
        }
        SinkMode::Return => {
            return Err(StartupError::Config(
                "the 'return' sink is only available to in-process callers".into(),
            ));
        }
    };
    Ok(sink)
}
