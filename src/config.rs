//! Configuration for CoralKV
//!
//! Centralized client environment with sensible defaults.
//!
//! The environment is shared by every connection of a client instance and
//! is read-only once built; per-connection state lives in the codec itself.

/// Client environment consulted by the codec
#[derive(Debug, Clone)]
pub struct Environment {
    // -------------------------------------------------------------------------
    // Feature Configuration
    // -------------------------------------------------------------------------
    /// Whether mutation tokens should be decoded when the server offers them
    pub mutation_tokens_enabled: bool,

    // -------------------------------------------------------------------------
    // Wire Limits
    // -------------------------------------------------------------------------
    /// Max total-body-length accepted on a single frame (in bytes)
    pub max_body_size: usize,

    // -------------------------------------------------------------------------
    // Keep-Alive Configuration
    // -------------------------------------------------------------------------
    /// Idle interval after which a NOOP keep-alive is emitted (milliseconds)
    pub keepalive_interval_ms: u64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            mutation_tokens_enabled: true,
            max_body_size: 20 * 1024 * 1024, // 20 MiB document ceiling
            keepalive_interval_ms: 30_000,
        }
    }
}

impl Environment {
    /// Create a new environment builder
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::default()
    }
}

/// Builder for Environment
#[derive(Default)]
pub struct EnvironmentBuilder {
    env: Environment,
}

impl EnvironmentBuilder {
    pub fn mutation_tokens_enabled(mut self, enabled: bool) -> Self {
        self.env.mutation_tokens_enabled = enabled;
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.env.max_body_size = bytes;
        self
    }

    pub fn keepalive_interval_ms(mut self, millis: u64) -> Self {
        self.env.keepalive_interval_ms = millis;
        self
    }

    pub fn build(self) -> Environment {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults() {
        let env = Environment::default();
        assert!(env.mutation_tokens_enabled);
        assert_eq!(env.max_body_size, 20 * 1024 * 1024);
        assert_eq!(env.keepalive_interval_ms, 30_000);
    }

    #[test]
    fn test_environment_builder() {
        let env = Environment::builder()
            .mutation_tokens_enabled(false)
            .max_body_size(1024)
            .keepalive_interval_ms(5_000)
            .build();

        assert!(!env.mutation_tokens_enabled);
        assert_eq!(env.max_body_size, 1024);
        assert_eq!(env.keepalive_interval_ms, 5_000);
    }
}
