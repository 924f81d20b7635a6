//! JSON encoding for files the engine keeps on disk.
//!
//! Output is pretty-printed with 2-space indentation and a trailing newline,
//! so a credentials file inspected by hand reads cleanly.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable_bytes};
