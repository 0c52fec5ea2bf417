//! Program loading, trace rendering and run reporting for the `rv32im-run` binary.

use anyhow as _;
use clap as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use tracing_subscriber as _;

/// Hex-text image parsing and loading.
pub mod loader;
pub use loader::{load_hex_file, parse_hex_image, ImageError, ImageParseError};

/// Line-oriented trace formatting.
pub mod format;
pub use format::{render_event, TraceFormatter};

/// Final status line and JSON state dump.
pub mod report;
pub use report::{status_line, RegisterDump, StateDump};
