//! # arbor-ini
//!
//! Reads and writes [`RawConfig`](arbor_core::RawConfig) trees as flat text:
//!
//! ```text
//! TopLevelKey=Value
//!
//! [Group/Path]
//! Key=Value
//!
//! [Group/Sub$SubConfigType/Nested]
//! NestedKey=Value
//! ```
//!
//! Values are written verbatim and never escaped, so names and values must not
//! contain newlines, and names must not contain `=`, `[`, `]`, `/` or `$`.
//! A trailing `\r` is read as part of a CRLF line ending, so values must not
//! end with one either.

pub mod read;
pub mod write;

pub use read::{parse_ini_str, read_ini, read_ini_file, IniDiagnostic};
pub use write::{to_ini_string, write_ini, write_ini_file};
