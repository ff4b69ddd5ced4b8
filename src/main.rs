//! Latent bridge command-line entry point.

use std::process;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use latent_bridge::adapters::udp::{UdpTransport, READY_MESSAGE};
use latent_bridge::bridge::Bridge;
use latent_bridge::cli::{Cli, Command, GenerateArgs};
use latent_bridge::config::{discover_config_path, Config};
use latent_bridge::context::{build_sink, open_session};
use latent_bridge::error::{BridgeError, StartupError};
use latent_bridge::params::{parse_seed_spec, seed_filename, SinkMode};
use latent_bridge::ports::GenerationRequest;
use latent_bridge::settings::BridgeSettings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        eprintln!("Error: missing subcommand.  Re-run with --help for usage.");
        process::exit(1);
    };

    if let Err(e) = run(command, cli.config.as_deref()).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, config: Option<&str>) -> Result<(), BridgeError> {
    let config_path = discover_config_path(config);
    let config = Config::load(&config_path).map_err(StartupError::Config)?;

    match command {
        Command::GenerateImages(args) => generate_images(&config, &args).await,
    }
}

async fn generate_images(config: &Config, args: &GenerateArgs) -> Result<(), BridgeError> {
    // Validate the seed list before anything is loaded.
    let seeds = args
        .seeds
        .as_deref()
        .map(parse_seed_spec)
        .transpose()
        .map_err(BridgeError::InvalidArgument)?;
    let settings = BridgeSettings::resolve(config, args)?;

    if seeds.is_some() && settings.sink_mode != SinkMode::File {
        return Err(BridgeError::InvalidArgument(format!(
            "--seeds writes image files; the '{}' sink is only available when listening",
            settings.sink_mode
        )));
    }

    match seeds {
        Some(seeds) => render_seeds(&settings, &seeds).await,
        None => listen(&settings).await,
    }
}

/// Render each seed once into the result directory.
///
/// Stops at the first failure; files already written are kept.
async fn render_seeds(settings: &BridgeSettings, seeds: &[u32]) -> Result<(), BridgeError> {
    let mut session = open_session(settings)?;
    for &seed in seeds {
        info!(seed, "generating image");
        let image = session.generate(&GenerationRequest::seed(seed)).await?;
        let path = settings.result_dir.join(seed_filename(seed));
        latent_bridge::output::save_image(&image, &path)?;
        eprintln!("Saved: {}", path.display());
    }
    Ok(())
}

/// Serve datagram requests until the controller sends the exit sentinel.
///
/// Resources acquired here are released on every path: the bridge releases
/// them itself once running, and drop releases them on earlier failures.
async fn listen(settings: &BridgeSettings) -> Result<(), BridgeError> {
    let sink = build_sink(settings)?;
    let mut transport = UdpTransport::bind(settings.listen_port, settings.recv_buffer).await?;
    let session = open_session(settings)?;

    if let Err(e) = transport.send_to(READY_MESSAGE, settings.peer).await {
        warn!(peer = %settings.peer, error = %e, "could not announce readiness");
    }

    let mut bridge = Bridge::new(session, sink);
    let reason = bridge.run(&mut transport).await?;
    info!(?reason, "shutdown complete");
    Ok(())
}
