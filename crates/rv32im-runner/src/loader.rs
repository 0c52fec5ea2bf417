//! Hex-text program image loader.
//!
//! Each line holds whitespace-separated two-digit hex bytes placed at
//! consecutive offsets from the memory base. Lines starting with `@` carry
//! address metadata and are skipped.

use std::fs;
use std::path::Path;

use rv32im_core::{CoreState, LoadError};
use thiserror::Error;

/// Malformed image text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageParseError {
    /// A token was not exactly two hex digits.
    #[error("line {line}: invalid byte `{token}`")]
    InvalidByte {
        /// One-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },
}

/// Failure to bring an image file into a core.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The file could not be read.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    /// The file contents are not a valid hex image.
    #[error(transparent)]
    Parse(#[from] ImageParseError),
    /// The decoded bytes do not fit in memory.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Parses hex image text into raw bytes.
///
/// # Errors
///
/// Returns [`ImageParseError::InvalidByte`] for the first token that is not a
/// two-digit hex byte.
pub fn parse_hex_image(text: &str) -> Result<Vec<u8>, ImageParseError> {
    let mut bytes = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('@') {
            continue;
        }
        for token in line.split_whitespace() {
            bytes.push(parse_byte(token).ok_or_else(|| ImageParseError::InvalidByte {
                line: index + 1,
                token: token.to_owned(),
            })?);
        }
    }
    Ok(bytes)
}

fn parse_byte(token: &str) -> Option<u8> {
    if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(token, 16).ok()
}

/// Reads, parses and loads an image file at the start of `state`'s memory.
///
/// Returns the number of bytes loaded.
///
/// # Errors
///
/// Returns [`ImageError`] when the file cannot be read, does not parse, or
/// exceeds memory capacity.
pub fn load_hex_file(path: &Path, state: &mut CoreState) -> Result<usize, ImageError> {
    let text = fs::read_to_string(path)?;
    let bytes = parse_hex_image(&text)?;
    state.load_image(&bytes)?;
    tracing::debug!("loaded {} bytes from {}", bytes.len(), path.display());
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use rv32im_core::{CoreConfig, CoreState, LoadError};

    use super::{parse_hex_image, ImageParseError};

    #[test]
    fn parses_bytes_and_skips_address_records() {
        let text = "@80000000\n93 00 10 00\n\n73 00 10 00\n";
        assert_eq!(
            parse_hex_image(text).unwrap(),
            vec![0x93, 0x00, 0x10, 0x00, 0x73, 0x00, 0x10, 0x00]
        );
    }

    #[test]
    fn accepts_mixed_case_and_tabs() {
        assert_eq!(parse_hex_image("aB\tCd  ef").unwrap(), vec![0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn rejects_wrong_width_tokens() {
        assert_eq!(
            parse_hex_image("@0\n00 11\n123 00\n"),
            Err(ImageParseError::InvalidByte {
                line: 3,
                token: "123".to_owned()
            })
        );
    }

    #[test]
    fn rejects_non_hex_tokens() {
        let err = parse_hex_image("zz").unwrap_err();
        assert_eq!(err.to_string(), "line 1: invalid byte `zz`");
    }

    #[test]
    fn rejects_sign_prefixed_tokens() {
        assert!(parse_hex_image("+1").is_err());
    }

    #[test]
    fn oversized_image_is_rejected_by_memory() {
        let config = CoreConfig {
            memory_bytes: 4,
            ..CoreConfig::default()
        };
        let mut state = CoreState::with_config(&config);
        let bytes = parse_hex_image("00 00 00 00 00").unwrap();

        assert_eq!(
            state.load_image(&bytes),
            Err(LoadError::ImageTooLarge {
                len: 5,
                offset: 0,
                capacity: 4
            })
        );
    }
}
