use std::time::Duration;

/// Randomized pause applied at the start of each handler invocation, to
/// avoid a uniform request-rate signature. Not a correctness mechanism.
#[derive(Debug, Clone, Copy)]
pub struct RequestDelay {
    min_ms: u64,
    max_ms: u64,
}

impl RequestDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms > max_ms {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        } else {
            Self { min_ms, max_ms }
        }
    }

    /// Default polite delay: 500ms-1500ms.
    pub fn default_polite() -> Self {
        Self {
            min_ms: 500,
            max_ms: 1500,
        }
    }

    pub fn random_delay(&self) -> u64 {
        if self.max_ms == 0 {
            return 0;
        }
        use rand::prelude::*;
        let mut rng = rand::rng();
        rng.random_range(self.min_ms..=self.max_ms)
    }

    pub async fn apply(&self) {
        let delay = self.random_delay();
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}
