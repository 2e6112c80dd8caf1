// ── Loop counters ──

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters, shared between the loop and anyone observing it.
#[derive(Debug, Default)]
pub struct LoopStats {
    cycles: AtomicU64,
    poll_failures: AtomicU64,
    events_seen: AtomicU64,
    events_skipped: AtomicU64,
    flows_installed: AtomicU64,
    flows_deduplicated: AtomicU64,
    install_failures: AtomicU64,
    fallbacks: AtomicU64,
    cache_refreshes: AtomicU64,
}

/// Point-in-time copy of [`LoopStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub poll_failures: u64,
    pub events_seen: u64,
    pub events_skipped: u64,
    pub flows_installed: u64,
    pub flows_deduplicated: u64,
    pub install_failures: u64,
    pub fallbacks: u64,
    pub cache_refreshes: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl LoopStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            cycles: load(&self.cycles),
            poll_failures: load(&self.poll_failures),
            events_seen: load(&self.events_seen),
            events_skipped: load(&self.events_skipped),
            flows_installed: load(&self.flows_installed),
            flows_deduplicated: load(&self.flows_deduplicated),
            install_failures: load(&self.install_failures),
            fallbacks: load(&self.fallbacks),
            cache_refreshes: load(&self.cache_refreshes),
        }
    }

    pub(crate) fn cycle(&self) {
        bump(&self.cycles);
    }

    pub(crate) fn poll_failed(&self) {
        bump(&self.poll_failures);
    }

    pub(crate) fn event_seen(&self) {
        bump(&self.events_seen);
    }

    pub(crate) fn event_skipped(&self) {
        bump(&self.events_skipped);
    }

    pub(crate) fn flow_installed(&self) {
        bump(&self.flows_installed);
    }

    pub(crate) fn flow_deduplicated(&self) {
        bump(&self.flows_deduplicated);
    }

    pub(crate) fn install_failed(&self) {
        bump(&self.install_failures);
    }

    pub(crate) fn fallback(&self) {
        bump(&self.fallbacks);
    }

    pub(crate) fn cache_refreshed(&self) {
        bump(&self.cache_refreshes);
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cycles:             {}", self.cycles)?;
        writeln!(f, "poll failures:      {}", self.poll_failures)?;
        writeln!(f, "events seen:        {}", self.events_seen)?;
        writeln!(f, "events skipped:     {}", self.events_skipped)?;
        writeln!(f, "flows installed:    {}", self.flows_installed)?;
        writeln!(f, "flows deduplicated: {}", self.flows_deduplicated)?;
        writeln!(f, "install failures:   {}", self.install_failures)?;
        writeln!(f, "fallback rules:     {}", self.fallbacks)?;
        write!(f, "cache refreshes:    {}", self.cache_refreshes)
    }
}
