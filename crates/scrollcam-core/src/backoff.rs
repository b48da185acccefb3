//! Bounded retry schedule for attaching observers to late-mounting elements.

use serde::{Deserialize, Serialize};

/// Exponential backoff with a hard attempt limit.
///
/// Attempt `0` is the first retry; there is no delay before the initial try.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backoff {
    pub initial_ms: u32,
    pub factor: f64,
    pub max_ms: u32,
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_ms: 50,
            factor: 2.0,
            max_ms: 1600,
            max_attempts: 8,
        }
    }
}

impl Backoff {
    /// Delay before retry `attempt`, or `None` once the budget is spent.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for(&self, attempt: u32) -> Option<u32> {
        if attempt >= self.max_attempts {
            return None;
        }
        let scaled = f64::from(self.initial_ms) * self.factor.max(1.0).powf(f64::from(attempt));
        let capped = scaled.min(f64::from(self.max_ms));
        // `capped` is within `0..=max_ms`.
        Some(capped as u32)
    }

    pub fn delays(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.max_attempts).filter_map(|attempt| self.delay_for(attempt))
    }

    /// Total time spent waiting if every retry fails.
    pub fn budget_ms(&self) -> u64 {
        self.delays().map(u64::from).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_and_caps() {
        let delays: Vec<u32> = Backoff::default().delays().collect();
        assert_eq!(delays, vec![50, 100, 200, 400, 800, 1600, 1600, 1600]);
        assert_eq!(Backoff::default().budget_ms(), 6350);
    }

    #[test]
    fn stops_after_max_attempts() {
        let backoff = Backoff {
            max_attempts: 2,
            ..Backoff::default()
        };
        assert_eq!(backoff.delay_for(1), Some(100));
        assert_eq!(backoff.delay_for(2), None);
    }

    #[test]
    fn factor_below_one_never_shrinks() {
        let backoff = Backoff {
            factor: 0.5,
            ..Backoff::default()
        };
        assert!(backoff.delays().all(|d| d == 50));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let backoff: Backoff = serde_json::from_str(r#"{"max_attempts": 3}"#).unwrap();
        assert_eq!(backoff.max_attempts, 3);
        assert_eq!(backoff.initial_ms, 50);
    }
}
