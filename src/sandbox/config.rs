//! Sandbox configuration with builder pattern.

use std::time::Duration;

/// Configuration shared by the JavaScript and TypeScript runtimes.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Wall-clock budget per execution. `None` lets a call run unbounded.
    ///
    /// The call returns when the budget runs out, but the engine thread only
    /// stops at a timer boundary or when `loop_iteration_limit` trips.
    pub timeout: Option<Duration>,
    /// Maximum iterations of any single loop before the engine aborts it.
    pub loop_iteration_limit: u64,
    /// Maximum call depth.
    pub recursion_limit: usize,
    /// Maximum size of the engine's value stack.
    pub stack_size_limit: usize,
    /// Lower bound applied to timer delays.
    pub min_timer_interval: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            loop_iteration_limit: 100_000_000,
            recursion_limit: 10_000,
            stack_size_limit: 1024 * 1024,
            min_timer_interval: Duration::from_millis(1),
        }
    }
}

impl SandboxConfig {
    /// Create a new builder for SandboxConfig.
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }
}

/// Builder for creating SandboxConfig instances.
#[derive(Debug, Clone, Default)]
pub struct SandboxConfigBuilder {
    timeout: Option<Option<Duration>>,
    loop_iteration_limit: Option<u64>,
    recursion_limit: Option<usize>,
    stack_size_limit: Option<usize>,
    min_timer_interval: Option<Duration>,
}

impl SandboxConfigBuilder {
    /// Set the wall-clock timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(Some(timeout));
        self
    }

    /// Disable the wall-clock timeout entirely.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = Some(None);
        self
    }

    /// Set the per-loop iteration limit.
    pub fn loop_iteration_limit(mut self, limit: u64) -> Self {
        self.loop_iteration_limit = Some(limit);
        self
    }

    /// Set the recursion limit.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    /// Set the value stack limit.
    pub fn stack_size_limit(mut self, limit: usize) -> Self {
        self.stack_size_limit = Some(limit);
        self
    }

    /// Set the minimum delay between timer firings.
    pub fn min_timer_interval(mut self, interval: Duration) -> Self {
        self.min_timer_interval = Some(interval);
        self
    }

    /// Build the SandboxConfig.
    pub fn build(self) -> SandboxConfig {
        let default = SandboxConfig::default();
        SandboxConfig {
            timeout: self.timeout.unwrap_or(default.timeout),
            loop_iteration_limit: self
                .loop_iteration_limit
                .unwrap_or(default.loop_iteration_limit),
            recursion_limit: self.recursion_limit.unwrap_or(default.recursion_limit),
            stack_size_limit: self.stack_size_limit.unwrap_or(default.stack_size_limit),
            min_timer_interval: self
                .min_timer_interval
                .unwrap_or(default.min_timer_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SandboxConfig::default();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.loop_iteration_limit, 100_000_000);
        assert_eq!(config.min_timer_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_builder() {
        let config = SandboxConfig::builder()
            .timeout(Duration::from_secs(5))
            .loop_iteration_limit(1_000)
            .recursion_limit(64)
            .build();

        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.loop_iteration_limit, 1_000);
        assert_eq!(config.recursion_limit, 64);
        assert_eq!(config.stack_size_limit, 1024 * 1024);
    }

    #[test]
    fn test_builder_no_timeout() {
        let config = SandboxConfig::builder().no_timeout().build();
        assert_eq!(config.timeout, None);
    }
}
