//! Anti-forgery `state` generation and validation.
//!
//! A login attempt is bound to its callback by a value the vendor echoes
//! back unchanged. [`NonceStates`] hands out random single-use values that
//! expire; [`FixedState`] is the old shared-constant mode.

use rand::RngCore as _;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Issues `state` values for logins and checks the ones callbacks return.
pub trait StateStrategy: Send + Sync {
    /// Produce the value to attach to a new authorize redirect.
    fn generate(&self) -> String;
    /// Return `true` if `state` belongs to a login this strategy issued.
    fn validate(&self, state: &str) -> bool;
}

/// Generate a random `state` parameter (32 lowercase hex chars).
#[must_use]
pub fn random_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(32), |mut s, b| {
        use std::fmt::Write as _;
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// Random single-use states remembered for a bounded time.
///
/// A value validates at most once and only within `ttl` of being issued.
/// Expired entries are pruned whenever a new one is issued.
pub struct NonceStates {
    ttl: Duration,
    issued: Mutex<HashMap<String, Instant>>,
}

impl NonceStates {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Number of states currently awaiting a callback.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl StateStrategy for NonceStates {
    fn generate(&self) -> String {
        let state = random_state();
        let now = Instant::now();
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        issued.retain(|_, at| now.duration_since(*at) < self.ttl);
        issued.insert(state.clone(), now);
        state
    }

    fn validate(&self, state: &str) -> bool {
        let removed = self
            .issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(state);
        removed.is_some_and(|at| at.elapsed() < self.ttl)
    }
}

/// A single constant shared by every login.
///
/// Anyone who knows the value can forge a callback, so this only fits a
/// debugger used by one operator.
pub struct FixedState(String);

impl FixedState {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl StateStrategy for FixedState {
    fn generate(&self) -> String {
        self.0.clone()
    }

    fn validate(&self, state: &str) -> bool {
        !state.is_empty() && state == self.0
    }
}
