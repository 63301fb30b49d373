use std::time::Duration;

use tokio::time::Instant;

/// Minimum spacing between consecutive requests to the same origin. Not a
/// lock; just keeps the outbound request pattern slow and uniform.
pub struct Pacer {
    min_gap: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(min_gap: Duration) -> Self {
        Self { min_gap, last: None }
    }

    /// Sleep for whatever remains of the minimum gap since the previous
    /// call. The first call returns immediately.
    pub async fn pause(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_gap {
                tokio::time::sleep(self.min_gap - elapsed).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
