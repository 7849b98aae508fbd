//! Crash coefficient sampling
//!
//! Each round draws one crash target from a two-bucket distribution:
//! - 80% "main" bucket over [1.10, 2.10], skewed toward the low end by `u^β`
//! - 20% truncated-exponential tail over [2.10, 4.50]
//!
//! An operator may load a fixed queue of five targets which then replaces the
//! distribution and is replayed round-robin.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// The coefficient at which a round crashes, always within [1.10, 4.50]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct CrashTarget(f64);

impl CrashTarget {
    /// Validated constructor; `None` when outside [1.10, 4.50] or not finite
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (CRASH_MIN..=CRASH_MAX).contains(&value)).then_some(Self(value))
    }

    /// Clamp an arbitrary draw into range
    fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self(CRASH_MIN);
        }
        Self(value.clamp(CRASH_MIN, CRASH_MAX))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

/// Rejected fixed-queue loads
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueueError {
    #[error("fixed crash queue needs exactly 5 values, got {len}")]
    WrongLength { len: usize },
    #[error("fixed crash value #{index} = {value} is outside [1.10, 4.50]")]
    OutOfRange { index: usize, value: f64 },
}

/// Round-robin replay of operator-supplied targets
#[derive(Debug, Clone)]
struct FixedQueue {
    values: [CrashTarget; FIXED_QUEUE_LEN],
    next: usize,
}

impl FixedQueue {
    fn pop(&mut self) -> CrashTarget {
        let value = self.values[self.next];
        self.next = (self.next + 1) % FIXED_QUEUE_LEN;
        value
    }
}

/// Round to cents, nudged by a tiny epsilon so exact halves don't tie
#[inline]
fn round_cents(value: f64) -> f64 {
    ((value + 1e-8) * 100.0).round() / 100.0
}

/// Main bucket: `min + span * u^β`
pub fn main_bucket(u: f64) -> f64 {
    CRASH_MIN + (CRASH_MAIN_TOP - CRASH_MIN) * u.clamp(0.0, 1.0).powf(CRASH_MAIN_BETA)
}

/// Tail bucket: inverse CDF of an exponential truncated to [2.10, 4.50]
pub fn tail_bucket(w: f64) -> f64 {
    let denom = 1.0 - (-CRASH_TAIL_LAMBDA * (CRASH_MAX - CRASH_MAIN_TOP)).exp();
    let x = CRASH_MAIN_TOP - (1.0 / CRASH_TAIL_LAMBDA) * (1.0 - denom * w.clamp(0.0, 1.0)).ln();
    x.min(CRASH_MAX)
}

/// Draws crash targets for successive rounds
#[derive(Debug, Clone)]
pub struct CoefficientSampler {
    rng: Pcg32,
    fixed: Option<FixedQueue>,
}

impl CoefficientSampler {
    pub fn new(rng: Pcg32) -> Self {
        Self { rng, fixed: None }
    }

    /// Next crash target (fixed queue if loaded, otherwise the distribution)
    pub fn sample(&mut self) -> CrashTarget {
        if let Some(queue) = self.fixed.as_mut() {
            return queue.pop();
        }

        let raw = if self.rng.random::<f64>() < CRASH_MAIN_WEIGHT {
            main_bucket(self.rng.random::<f64>())
        } else {
            tail_bucket(self.rng.random::<f64>())
        };
        CrashTarget::clamped(round_cents(raw))
    }

    /// Replace the distribution with a fixed round-robin queue.
    ///
    /// Invalid input leaves the previous queue (or randomness) in effect.
    pub fn load_fixed_queue(&mut self, values: &[f64]) -> Result<(), QueueError> {
        let result = Self::validate(values);
        match result {
            Ok(values) => {
                log::warn!("Fixed crash queue loaded: {:?}", values.map(CrashTarget::value));
                self.fixed = Some(FixedQueue { values, next: 0 });
                Ok(())
            }
            Err(err) => {
                log::warn!("Rejected fixed crash queue: {}", err);
                Err(err)
            }
        }
    }

    /// Return to random sampling
    pub fn clear_fixed_queue(&mut self) {
        if self.fixed.take().is_some() {
            log::info!("Fixed crash queue cleared");
        }
    }

    pub fn has_fixed_queue(&self) -> bool {
        self.fixed.is_some()
    }

    fn validate(values: &[f64]) -> Result<[CrashTarget; FIXED_QUEUE_LEN], QueueError> {
        if values.len() != FIXED_QUEUE_LEN {
            return Err(QueueError::WrongLength { len: values.len() });
        }
        let mut out = [CrashTarget(CRASH_MIN); FIXED_QUEUE_LEN];
        for (index, (&value, slot)) in values.iter().zip(out.iter_mut()).enumerate() {
            *slot = CrashTarget::new(value).ok_or(QueueError::OutOfRange { index, value })?;
        }
        Ok(out)
    }
}
