//! Request decoding for datagram commands and direct vector calls.
//!
//! Datagram grammar: `<name>[_<arg>]*`, UTF-8, at most [`RECV_BUFFER`] bytes.
//! Recognised commands are `seed_<u32>`, `truncation_<f32>` and the
//! sentinel `Exit`. Any other command name is ignored without error so
//! that controllers sending extra control messages keep working.

use crate::error::DecodeError;
use crate::params::validate_truncation;
use crate::ports::{GenerationRequest, Latent};

/// Receive buffer size for datagrams. Longer payloads are truncated by the socket.
pub const RECV_BUFFER: usize = 1024;

/// Token separator in datagram commands.
const DELIMITER: char = '_';

/// Sentinel payload that ends the bridge session.
pub const EXIT_COMMAND: &str = "Exit";

/// A decoded datagram command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Generate an image.
    Generate(GenerationRequest),
    /// Change the session truncation for later requests.
    SetTruncation(f32),
    /// Terminate after the current cycle.
    Exit,
}

/// Decode one datagram payload.
///
/// Returns `Ok(None)` for unrecognised commands.
///
/// # Errors
///
/// Returns a [`DecodeError`] if a recognised command is malformed.
pub fn decode_datagram(payload: &[u8]) -> Result<Option<Command>, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotUtf8)?;
    decode_text(text)
}

/// Decode one text command. See [`decode_datagram`].
///
/// # Errors
///
/// Returns a [`DecodeError`] if a recognised command is malformed.
pub fn decode_text(text: &str) -> Result<Option<Command>, DecodeError> {
    let text = text.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
    if text == EXIT_COMMAND {
        return Ok(Some(Command::Exit));
    }

    let mut tokens = text.split(DELIMITER);
    let name = tokens.next().unwrap_or_default();
    let args: Vec<&str> = tokens.collect();

    match name {
        "seed" => {
            let arg = single_argument(name, &args)?;
            let seed = arg
                .parse::<u32>()
                .map_err(|_| DecodeError::BadSeed(arg.to_string()))?;
            Ok(Some(Command::Generate(GenerationRequest::seed(seed))))
        }
        "truncation" => {
            let arg = single_argument(name, &args)?;
            let psi = arg
                .parse::<f32>()
                .map_err(|_| DecodeError::BadNumber(arg.to_string()))?;
            validate_truncation(psi)?;
            Ok(Some(Command::SetTruncation(psi)))
        }
        _ => Ok(None),
    }
}

fn single_argument<'a>(command: &str, args: &[&'a str]) -> Result<&'a str, DecodeError> {
    match args {
        [] | [""] => Err(DecodeError::MissingArgument {
            command: command.to_string(),
        }),
        [arg] => Ok(arg),
        _ => Err(DecodeError::ExtraArguments {
            command: command.to_string(),
            got: args.len(),
        }),
    }
}

/// Validate a direct latent-vector request.
///
/// # Errors
///
/// Returns [`DecodeError::BadDimension`] if `z` does not have `expected_dim`
/// components, or [`DecodeError::OutOfRange`] if the truncation is outside
/// `[0, 2]`.
pub fn decode_vector(
    z: Vec<f32>,
    truncation: Option<f32>,
    expected_dim: usize,
) -> Result<GenerationRequest, DecodeError> {
    if z.len() != expected_dim {
        return Err(DecodeError::BadDimension {
            expected: expected_dim,
            got: z.len(),
        });
    }
    if let Some(psi) = truncation {
        validate_truncation(psi)?;
    }
    Ok(GenerationRequest {
        latent: Latent::Vector(z),
        truncation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_command() {
        assert_eq!(
            decode_text("seed_42").unwrap(),
            Some(Command::Generate(GenerationRequest::seed(42)))
        );
    }

    #[test]
    fn seed_decoding_is_idempotent() {
        for s in [0_u32, 1, 42, 6600, u32::MAX] {
            let payload = format!("seed_{s}");
            let first = decode_datagram(payload.as_bytes()).unwrap();
            let second = decode_datagram(payload.as_bytes()).unwrap();
            assert_eq!(first, second);
            assert_eq!(first, Some(Command::Generate(GenerationRequest::seed(s))));
        }
    }

    #[test]
    fn trailing_newline_and_nul_are_ignored() {
        assert_eq!(
            decode_text("seed_7\n").unwrap(),
            Some(Command::Generate(GenerationRequest::seed(7)))
        );
        assert_eq!(decode_datagram(b"Exit\0\0").unwrap(), Some(Command::Exit));
    }

    #[test]
    fn exit_sentinel() {
        assert_eq!(decode_text("Exit").unwrap(), Some(Command::Exit));
    }

    #[test]
    fn exit_is_case_sensitive() {
        assert_eq!(decode_text("exit").unwrap(), None);
        assert_eq!(decode_text("Exit_now").unwrap(), None);
    }

    #[test]
    fn unknown_commands_are_ignored() {
        assert_eq!(decode_text("hello").unwrap(), None);
        assert_eq!(decode_text("style_mix_3").unwrap(), None);
        assert_eq!(decode_text("").unwrap(), None);
    }

    #[test]
    fn missing_seed_argument() {
        assert!(matches!(
            decode_text("seed"),
            Err(DecodeError::MissingArgument { .. })
        ));
        assert!(matches!(
            decode_text("seed_"),
            Err(DecodeError::MissingArgument { .. })
        ));
    }

    #[test]
    fn too_many_tokens() {
        assert_eq!(
            decode_text("seed_1_2"),
            Err(DecodeError::ExtraArguments {
                command: "seed".into(),
                got: 2
            })
        );
    }

    #[test]
    fn non_integer_seed() {
        for arg in ["abc", "1.5", "-3"] {
            assert_eq!(
                decode_text(&format!("seed_{arg}")),
                Err(DecodeError::BadSeed(arg.into()))
            );
        }
    }

    #[test]
    fn invalid_utf8() {
        assert_eq!(
            decode_datagram(&[0xff, 0xfe, 0x00]),
            Err(DecodeError::NotUtf8)
        );
    }

    #[test]
    fn truncation_command() {
        assert_eq!(
            decode_text("truncation_0.8").unwrap(),
            Some(Command::SetTruncation(0.8))
        );
        assert!(matches!(
            decode_text("truncation_2.5"),
            Err(DecodeError::OutOfRange { .. })
        ));
        assert!(matches!(decode_text("truncation_x"), Err(DecodeError::BadNumber(_))));
    }

    #[test]
    fn vector_accepts_matching_dimension() {
        let req = decode_vector(vec![0.0; 4], Some(0.8), 4).unwrap();
        assert_eq!(req.latent, Latent::Vector(vec![0.0; 4]));
        assert_eq!(req.truncation, Some(0.8));
    }

    #[test]
    fn vector_rejects_wrong_dimension() {
        assert_eq!(
            decode_vector(vec![0.0; 3], None, 512),
            Err(DecodeError::BadDimension {
                expected: 512,
                got: 3
            })
        );
    }

    #[test]
    fn vector_rejects_out_of_range_truncation() {
        let err = decode_vector(vec![0.0; 2], Some(2.5), 2).unwrap_err();
        assert!(matches!(err, DecodeError::OutOfRange { .. }));
        assert!(err.to_string().starts_with("truncation 2.5"));
        assert!(decode_vector(vec![0.0; 2], Some(-0.1), 2).is_err());
        assert!(decode_vector(vec![0.0; 2], Some(f32::NAN), 2).is_err());
    }
}
