//! Secret lookup for the advice proxy
//!
//! The API key is looked up on every request, so rotating the environment
//! takes effect without a restart of the lookup path.

/// Source of named secrets
pub trait SecretSource: Send + Sync {
    /// Value of `name`, or `None` when unset or blank
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads secrets from process environment variables
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn get(&self, name: &str) -> Option<String> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(std::env::VarError::NotPresent) => None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", name, e);
                None
            }
        }
    }
}
