//! Generation rate tracking across replies.

use std::time::Duration;

/// Figures for one finished reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplyStats {
    pub tokens: u32,
    pub elapsed: Duration,
}

impl ReplyStats {
    pub fn tokens_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            f64::from(self.tokens) / secs
        } else {
            0.0
        }
    }
}

/// Cumulative counters plus the most recent reply.
#[derive(Debug, Clone, Default)]
pub struct RateTracker {
    last: Option<ReplyStats>,
    total_tokens: u64,
    total_elapsed: Duration,
    replies: u64,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished reply.
    pub fn record(&mut self, stats: ReplyStats) {
        self.total_tokens += u64::from(stats.tokens);
        self.total_elapsed += stats.elapsed;
        self.replies += 1;
        self.last = Some(stats);
    }

    pub fn last(&self) -> Option<ReplyStats> {
        self.last
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn reply_count(&self) -> u64 {
        self.replies
    }

    /// Mean generation rate over every recorded reply.
    pub fn average_tokens_per_second(&self) -> f64 {
        let secs = self.total_elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_tokens as f64 / secs
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
