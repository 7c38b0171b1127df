//! In-memory failed-login tracking with a time-windowed lockout.
//!
//! Flow Overview:
//! 1) `try_begin` checks the lock and counts the attempt as a failure under one lock.
//! 2) A username is locked once the counter reaches the threshold.
//! 3) Expiry is lazy: the first check after the window has passed drops the record.
//! 4) A successful login clears the record; an attempt that must not count is released.
//!
//! Scaling: state is per process. Swap the [`AttemptTracker`] implementation
//! for a shared store before running more than one instance.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

pub const DEFAULT_THRESHOLD: u32 = 5;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Returned by [`AttemptTracker::try_begin`] while a principal is locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locked {
    pub window_minutes: u64,
}

pub trait AttemptTracker: Send + Sync {
    /// Reserve an attempt: fail with [`Locked`] at the threshold, otherwise
    /// count the attempt as a failure before any credential work runs.
    ///
    /// # Errors
    /// [`Locked`] when the principal has reached the threshold inside the window.
    fn try_begin(&self, principal: &str) -> Result<(), Locked>;
    /// Give back a reservation that must not count as a failure.
    fn release(&self, principal: &str);
    fn record_failure(&self, principal: &str);
    fn clear(&self, principal: &str);
    fn is_locked(&self, principal: &str) -> bool;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub threshold: u32,
    pub window: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            window: DEFAULT_WINDOW,
        }
    }
}

impl LockoutPolicy {
    #[must_use]
    pub fn window_minutes(&self) -> u64 {
        self.window.as_secs() / 60
    }
}

#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    count: u32,
    last_failure: Instant,
}

pub struct LoginAttemptTracker<C = SystemClock> {
    policy: LockoutPolicy,
    clock: C,
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl LoginAttemptTracker<SystemClock> {
    #[must_use]
    pub fn new(policy: LockoutPolicy) -> Self {
        Self::with_clock(policy, SystemClock)
    }
}

impl<C: Clock> LoginAttemptTracker<C> {
    #[must_use]
    pub fn with_clock(policy: LockoutPolicy, clock: C) -> Self {
        Self {
            policy,
            clock,
            records: Mutex::new(HashMap::new()),
        }
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, AttemptRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current failure count, after lazy expiry.
    pub fn failure_count(&self, principal: &str) -> u32 {
        let now = self.clock.now();
        let mut records = self.records();
        match records.get(principal) {
            Some(record) if self.expired(record, now) => {
                records.remove(principal);
                0
            }
            Some(record) => record.count,
            None => 0,
        }
    }

    fn expired(&self, record: &AttemptRecord, now: Instant) -> bool {
        now.saturating_duration_since(record.last_failure) > self.policy.window
    }

    fn bump(&self, records: &mut HashMap<String, AttemptRecord>, principal: &str, now: Instant) {
        let record = records
            .entry(principal.to_string())
            .or_insert(AttemptRecord {
                count: 0,
                last_failure: now,
            });
        // A stale record restarts the count instead of resuming it.
        if self.expired(record, now) {
            record.count = 0;
        }
        record.count = record.count.saturating_add(1);
        record.last_failure = now;
    }
}

impl<C: Clock> AttemptTracker for LoginAttemptTracker<C> {
    fn try_begin(&self, principal: &str) -> Result<(), Locked> {
        let now = self.clock.now();
        let mut records = self.records();
        if let Some(record) = records.get(principal) {
            if !self.expired(record, now) && record.count >= self.policy.threshold {
                return Err(Locked {
                    window_minutes: self.policy.window_minutes(),
                });
            }
        }
        self.bump(&mut records, principal, now);
        Ok(())
    }

    fn release(&self, principal: &str) {
        let mut records = self.records();
        if let Some(record) = records.get_mut(principal) {
            record.count = record.count.saturating_sub(1);
            if record.count == 0 {
                records.remove(principal);
            }
        }
    }

    fn record_failure(&self, principal: &str) {
        let now = self.clock.now();
        let mut records = self.records();
        self.bump(&mut records, principal, now);
    }

    fn clear(&self, principal: &str) {
        self.records().remove(principal);
    }

    fn is_locked(&self, principal: &str) -> bool {
        let now = self.clock.now();
        let mut records = self.records();
        let Some(record) = records.get(principal) else {
            return false;
        };
        if self.expired(record, now) {
            records.remove(principal);
            return false;
        }
        record.count >= self.policy.threshold
    }
}

impl<C> std::fmt::Debug for LoginAttemptTracker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginAttemptTracker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
