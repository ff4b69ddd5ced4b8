//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::params::SinkMode;

/// Drive a generative image model from a live controller.
#[derive(Parser, Debug)]
#[command(name = "latent-bridge", version, about)]
pub struct Cli {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate images: listen for controller requests, or render `--seeds` and exit.
    GenerateImages(GenerateArgs),
}

/// Arguments of `generate-images`. Unset values fall back to the config file.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Model artifact: descriptor file or model server URL [default: results/network.json].
    #[arg(long)]
    pub network: Option<String>,

    /// Truncation psi in [0, 2] [default: 0.5].
    #[arg(long)]
    pub truncation_psi: Option<f32>,

    /// Root directory for results [default: results].
    #[arg(long, value_name = "DIR")]
    pub result_dir: Option<PathBuf>,

    /// Render these seeds ('a,b,c' or 'a-c') to `<DIR>/seedNNNN.png` and exit instead of
    /// listening. Requires the file sink.
    #[arg(long)]
    pub seeds: Option<String>,

    /// UDP port to receive requests on [default: 6000].
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Controller address that receives the ready message [default: 127.0.0.1:7000].
    #[arg(long)]
    pub peer: Option<String>,

    /// Where images go: file or texture [default: file].
    #[arg(long)]
    pub sink: Option<SinkMode>,

    /// Noise seed for vector requests [default: 1].
    #[arg(long)]
    pub seed: Option<u32>,

    /// File sink output path [default: <DIR>/result.png].
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_args(cli: Cli) -> GenerateArgs {
        match cli.command {
            Some(Command::GenerateImages(args)) => args,
            None => panic!("expected generate-images"),
        }
    }

    #[test]
    fn missing_subcommand_parses_to_none() {
        let cli = Cli::parse_from(["latent-bridge"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn generate_images_defaults_are_unset() {
        let args = generate_args(Cli::parse_from(["latent-bridge", "generate-images"]));
        assert!(args.network.is_none());
        assert!(args.truncation_psi.is_none());
        assert!(args.result_dir.is_none());
        assert!(args.seeds.is_none());
        assert!(args.sink.is_none());
    }

    #[test]
    fn generate_images_all_options() {
        let cli = Cli::parse_from([
            "latent-bridge",
            "-vv",
            "--config",
            "bridge.toml",
            "generate-images",
            "--network",
            "http://localhost:9000",
            "--truncation-psi",
            "0.8",
            "--result-dir",
            "out",
            "--seeds",
            "1-3",
            "--listen-port",
            "6001",
            "--peer",
            "127.0.0.1:7001",
            "--sink",
            "texture",
            "--seed",
            "5",
            "-o",
            "out/frame.png",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some("bridge.toml"));
        let args = generate_args(cli);
        assert_eq!(args.network.as_deref(), Some("http://localhost:9000"));
        assert_eq!(args.truncation_psi, Some(0.8));
        assert_eq!(args.result_dir, Some(PathBuf::from("out")));
        assert_eq!(args.seeds.as_deref(), Some("1-3"));
        assert_eq!(args.listen_port, Some(6001));
        assert_eq!(args.peer.as_deref(), Some("127.0.0.1:7001"));
        assert_eq!(args.sink, Some(SinkMode::Texture));
        assert_eq!(args.seed, Some(5));
        assert_eq!(args.output, Some(PathBuf::from("out/frame.png")));
    }

    #[test]
    fn bad_sink_is_rejected() {
        let args = ["latent-bridge", "generate-images", "--sink", "spout"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
