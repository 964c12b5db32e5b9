//! Resource limiting for the engine worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use boa_engine::Context;

use crate::sandbox::config::SandboxConfig;

/// Wall-clock budget shared between the async caller and the engine worker.
///
/// The caller cancels the budget when its timeout fires; the worker polls it
/// between timer firings and gives up instead of running stale callbacks.
#[derive(Debug, Clone)]
pub struct ExecutionBudget {
    timeout: Option<Duration>,
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl ExecutionBudget {
    /// Start a budget that expires `timeout` from now.
    pub fn start(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            deadline: timeout.map(|t| Instant::now() + t),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A budget that never expires on its own.
    pub fn unbounded() -> Self {
        Self::start(None)
    }

    /// The budget this was started with.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Mark the budget as spent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if the budget was cancelled or its deadline passed.
    pub fn is_exhausted(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline, if there is one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Sleep until `until`, waking early if the budget runs out.
    ///
    /// Returns `false` if the budget was exhausted before `until`.
    pub fn sleep_until(&self, until: Instant) -> bool {
        const SLICE: Duration = Duration::from_millis(10);
        loop {
            if self.is_exhausted() {
                return false;
            }
            let now = Instant::now();
            if now >= until {
                return true;
            }
            let mut nap = (until - now).min(SLICE);
            if let Some(remaining) = self.remaining() {
                nap = nap.min(remaining);
            }
            std::thread::sleep(nap);
        }
    }
}

/// Extension trait for applying configured limits to an engine context.
pub trait ContextLimitsExt {
    /// Configure the context's runtime limits from the sandbox configuration.
    fn configure_limits(&mut self, config: &SandboxConfig);
}

impl ContextLimitsExt for Context {
    fn configure_limits(&mut self, config: &SandboxConfig) {
        let limits = self.runtime_limits_mut();
        limits.set_loop_iteration_limit(config.loop_iteration_limit);
        limits.set_recursion_limit(config.recursion_limit);
        limits.set_stack_size_limit(config.stack_size_limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_budget_never_exhausts() {
        let budget = ExecutionBudget::unbounded();
        assert!(!budget.is_exhausted());
        assert_eq!(budget.remaining(), None);
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let budget = ExecutionBudget::start(Some(Duration::from_secs(60)));
        let worker_view = budget.clone();
        budget.cancel();
        assert!(worker_view.is_exhausted());
        assert!(!worker_view.sleep_until(Instant::now() + Duration::from_secs(5)));
    }

    #[test]
    fn test_deadline_expires() {
        let budget = ExecutionBudget::start(Some(Duration::from_millis(0)));
        assert!(budget.is_exhausted());
    }

    #[test]
    fn test_sleep_until_past_instant_returns_immediately() {
        let budget = ExecutionBudget::unbounded();
        assert!(budget.sleep_until(Instant::now()));
    }

    #[test]
    fn test_limits_applied_to_context() {
        let config = SandboxConfig::builder()
            .loop_iteration_limit(10)
            .recursion_limit(5)
            .build();
        let mut context = Context::default();
        context.configure_limits(&config);

        assert_eq!(context.runtime_limits().loop_iteration_limit(), 10);
        assert_eq!(context.runtime_limits().recursion_limit(), 5);
    }
}
