//! API key resolution from environment variables.
//!
//! Keys are wrapped in [`SecretString`] at the boundary so they never
//! appear in Debug output or logs. Users set them via shell config;
//! nothing here writes secrets anywhere.

use secrecy::SecretString;

use doppel_types::error::GatewayError;

/// App-specific variable, checked first.
pub const API_KEY_VAR: &str = "DOPPEL_GEMINI_API_KEY";

/// Conventional fallback shared with other Gemini tooling.
pub const API_KEY_FALLBACK_VAR: &str = "GEMINI_API_KEY";

/// Resolve the Gemini API key, preferring [`API_KEY_VAR`].
///
/// Returns `MissingCredential` when neither variable is set. A variable
/// that exists but holds invalid Unicode is treated as unset, since keys
/// must be valid strings.
pub fn resolve_api_key() -> Result<SecretString, GatewayError> {
    lookup(API_KEY_VAR)
        .or_else(|| lookup(API_KEY_FALLBACK_VAR))
        .map(SecretString::from)
        .ok_or_else(|| {
            GatewayError::MissingCredential(format!("{API_KEY_VAR} or {API_KEY_FALLBACK_VAR}"))
        })
}

fn lookup(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
