//! Per-phase timing counters for the walker.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseStats {
    pub count: u64,
    pub total: Duration,
}

#[derive(Debug, Default)]
pub struct TimerCounter {
    open: BTreeMap<&'static str, Instant>,
    stats: BTreeMap<&'static str, PhaseStats>,
}

impl TimerCounter {
    pub fn new() -> Self { Self::default() }

    pub fn enter(&mut self, tag: &'static str) {
        self.open.insert(tag, Instant::now());
        self.stats.entry(tag).or_default().count += 1;
    }

    /// Close the phase opened by `enter`; an unmatched exit is ignored.
    pub fn exit(&mut self, tag: &'static str) {
        if let Some(start) = self.open.remove(tag) {
            self.stats.entry(tag).or_default().total += start.elapsed();
        }
    }

    pub fn get(&self, tag: &str) -> Option<PhaseStats> { self.stats.get(tag).copied() }

    pub fn summary(&self) {
        for (tag, s) in &self.stats {
            info!(target: "canopy::ingest", "{:15}: total {:?}, count {}", tag, s.total, s.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_totals() {
        let mut t = TimerCounter::new();
        for _ in 0..3 {
            t.enter("push");
            t.exit("push");
        }
        t.exit("never-entered");
        let s = t.get("push").unwrap();
        assert_eq!(s.count, 3);
        assert!(t.get("never-entered").is_none());
        t.summary();
    }
}
