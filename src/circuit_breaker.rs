use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Breaker type shared by the narrative enricher.
pub type LlmCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Creates the circuit breaker for language model calls.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// While OPEN, enrichment skips the network call and returns the fallback narrative.
pub fn create_llm_circuit_breaker() -> LlmCircuitBreaker {
    llm_circuit_breaker(5, Duration::from_secs(10), Duration::from_secs(60))
}

/// Breaker that opens after `failure_threshold` consecutive failures and
/// lets a trial call through after a backoff between `min_backoff` and
/// `max_backoff`. A successful trial closes it again.
pub fn llm_circuit_breaker(
    failure_threshold: u32,
    min_backoff: Duration,
    max_backoff: Duration,
) -> LlmCircuitBreaker {
    let backoff_strategy = backoff::exponential(min_backoff, max_backoff);
    let failure_policy = failure_policy::consecutive_failures(failure_threshold, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
