//! Locally minted token values.

use uuid::Uuid;

/// Generates an opaque local token value with the given prefix.
///
/// The suffix is a time-ordered UUID v7 in simple form.
#[must_use]
pub fn generate_token(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::now_v7().simple())
}
