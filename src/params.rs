//! Parameter validation shared by the CLI, config file and decoders.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::DecodeError;

/// Inclusive lower bound for truncation psi.
pub const TRUNCATION_MIN: f32 = 0.0;
/// Inclusive upper bound for truncation psi.
pub const TRUNCATION_MAX: f32 = 2.0;
/// Largest seed a plugin host may pass at setup.
pub const SETUP_SEED_MAX: u32 = 1_000_000;
/// Most seeds a single batch render may request.
pub const MAX_BATCH_SEEDS: usize = 100_000;

/// Validate a truncation value. Values are rejected, never clamped.
///
/// # Errors
///
/// Returns [`DecodeError::OutOfRange`] for values outside `[0, 2]` and for NaN.
pub fn validate_truncation(psi: f32) -> Result<f32, DecodeError> {
    if (TRUNCATION_MIN..=TRUNCATION_MAX).contains(&psi) {
        Ok(psi)
    } else {
        Err(DecodeError::OutOfRange {
            field: "truncation",
            value: psi,
            min: TRUNCATION_MIN,
            max: TRUNCATION_MAX,
        })
    }
}

/// How generated images leave the bridge. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    /// Overwrite an image file on every generation.
    #[default]
    File,
    /// Publish to a shared texture sender.
    Texture,
    /// Hand the image back to an in-process caller.
    Return,
}

impl FromStr for SinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "texture" => Ok(Self::Texture),
            "return" => Ok(Self::Return),
            _ => Err(format!("Unsupported sink '{s}'. Valid: file, texture, return")),
        }
    }
}

impl fmt::Display for SinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Texture => "texture",
            Self::Return => "return",
        })
    }
}

/// Parse a seed list: either an inclusive range `a-b` or comma-separated integers.
///
/// # Errors
///
/// Returns an error if the spec is empty, malformed, the range is reversed,
/// or it names more than [`MAX_BATCH_SEEDS`] seeds.
pub fn parse_seed_spec(spec: &str) -> Result<Vec<u32>, String> {
    let spec = spec.trim();
    if let Some((start, end)) = spec.split_once('-') {
        let start = parse_seed_token(start)?;
        let end = parse_seed_token(end)?;
        if start > end {
            return Err(format!("Seed range '{spec}' is reversed"));
        }
        let count = u64::from(end - start) + 1;
        if count > MAX_BATCH_SEEDS as u64 {
            return Err(format!(
                "Seed range '{spec}' names {count} seeds; at most {MAX_BATCH_SEEDS} per batch"
            ));
        }
        return Ok((start..=end).collect());
    }
    let seeds = spec
        .split(',')
        .map(parse_seed_token)
        .collect::<Result<Vec<_>, _>>()?;
    if seeds.len() > MAX_BATCH_SEEDS {
        return Err(format!(
            "Seed list names {} seeds; at most {MAX_BATCH_SEEDS} per batch",
            seeds.len()
        ));
    }
    Ok(seeds)
}

fn parse_seed_token(token: &str) -> Result<u32, String> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("Invalid seed '{token}'. Expected 'a,b,c' or 'a-c'"));
    }
    token
        .parse()
        .map_err(|_| format!("Seed '{token}' does not fit in 32 bits"))
}

/// Output file name for a batch-rendered seed.
#[must_use]
pub fn seed_filename(seed: u32) -> String {
    format!("seed{seed:04}.png")
}
