// ── Reactive event loop ──
//
// Starting → Clearing → Polling ⇄ Processing → … → Stopped
//
// One logical worker. Each tick polls once and fully processes the batch
// before returning; `run` spaces ticks with a cancellation-aware sleep so
// a stop lands on a poll boundary and never interrupts an in-flight call.

use std::sync::Arc;

use strum::Display;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::cache::HostLocationCache;
use crate::clear::{ClearReport, clear_devices};
use crate::client::ControllerClient;
use crate::config::ReactiveConfig;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, FlowRule, PacketInEvent, PacketPayload};
use crate::stats::{LoopStats, StatsSnapshot};
use crate::store::FlowStore;
use crate::synth::FlowRuleSynthesizer;

/// Lifecycle phase of the loop, published on a `watch` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LoopState {
    Starting,
    Clearing,
    Polling,
    Processing,
    Stopped,
}

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The poll itself failed; nothing was processed.
    PollFailed,
    /// The poll returned no events.
    Idle,
    Processed(BatchReport),
}

/// Per-batch tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub events: usize,
    pub skipped: usize,
    pub installed: usize,
    pub deduplicated: usize,
    pub failed: usize,
    pub fallbacks: usize,
}

/// The reactive flow installer.
pub struct ReactiveLoop<C> {
    client: C,
    config: ReactiveConfig,
    synth: FlowRuleSynthesizer,
    cache: HostLocationCache,
    store: FlowStore,
    devices: Vec<Device>,
    cycle: u64,
    state: watch::Sender<LoopState>,
    stats: Arc<LoopStats>,
}

impl<C: ControllerClient> ReactiveLoop<C> {
    pub fn new(client: C, config: ReactiveConfig) -> Result<Self, CoreError> {
        if config.refresh_every == 0 {
            return Err(CoreError::Config {
                message: "host cache refresh cadence must be at least one cycle".into(),
            });
        }
        let synth = FlowRuleSynthesizer::from_config(&config)?;
        let (state, _) = watch::channel(LoopState::Starting);

        Ok(Self {
            client,
            config,
            synth,
            cache: HostLocationCache::new(),
            store: FlowStore::new(),
            devices: Vec::new(),
            cycle: 0,
            state,
            stats: Arc::new(LoopStats::default()),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &HostLocationCache {
        &self.cache
    }

    pub fn store(&self) -> &FlowStore {
        &self.store
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Subscribe to lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Shared handle to the live counters.
    pub fn stats(&self) -> Arc<LoopStats> {
        Arc::clone(&self.stats)
    }

    fn set_state(&self, next: LoopState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = %current, to = %next, "loop state");
            *current = next;
            true
        });
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the Starting and Clearing phases.
    ///
    /// Retries the device inventory until it loads. Returns `false` if
    /// cancelled first, in which case the loop is already `Stopped`.
    pub async fn start(&mut self, cancel: &CancellationToken) -> bool {
        self.set_state(LoopState::Starting);

        let devices = loop {
            match self.client.list_devices().await {
                Ok(devices) => break devices,
                Err(e) => {
                    warn!(error = %e, backoff = ?self.config.error_backoff, "device inventory unavailable");
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            self.set_state(LoopState::Stopped);
                            return false;
                        }
                        () = tokio::time::sleep(self.config.error_backoff) => {}
                    }
                }
            }
        };
        info!(devices = devices.len(), "device inventory loaded");
        self.devices = devices;

        self.refresh_hosts().await;

        self.set_state(LoopState::Clearing);
        let ids: Vec<DeviceId> = self.devices.iter().map(|d| d.id.clone()).collect();
        let report = self.clear(&ids).await;
        info!(
            cleared = report.cleared.len(),
            failed = report.failed.len(),
            "startup flow clear finished"
        );

        self.install_reachability().await;
        self.set_state(LoopState::Polling);
        true
    }

    /// Clear remote flows on `devices` and forget their local records.
    pub async fn clear(&self, devices: &[DeviceId]) -> ClearReport {
        let report = clear_devices(&self.client, devices).await;
        for id in devices {
            self.store.clear(id);
        }
        report
    }

    /// One Polling(+Processing) cycle. Never sleeps.
    pub async fn tick(&mut self) -> TickOutcome {
        self.cycle += 1;
        self.stats.cycle();

        if self.cycle % u64::from(self.config.refresh_every) == 0 {
            self.refresh().await;
        }

        self.set_state(LoopState::Polling);
        let events = match self.client.poll_packet_events().await {
            Ok(events) => events,
            Err(e) => {
                self.stats.poll_failed();
                warn!(error = %e, cycle = self.cycle, "packet poll failed");
                return TickOutcome::PollFailed;
            }
        };
        if events.is_empty() {
            trace!(cycle = self.cycle, "no packet-in events");
            return TickOutcome::Idle;
        }

        self.set_state(LoopState::Processing);
        let mut report = BatchReport::default();
        for event in &events {
            self.process_event(event, &mut report).await;
        }
        self.set_state(LoopState::Polling);

        debug!(
            cycle = self.cycle,
            events = report.events,
            installed = report.installed,
            skipped = report.skipped,
            deduplicated = report.deduplicated,
            failed = report.failed,
            "batch processed"
        );
        TickOutcome::Processed(report)
    }

    /// Start, then tick until `cancel` fires.
    ///
    /// Waits `error_backoff` after a failed poll and `poll_interval`
    /// otherwise. Returns the final counters.
    pub async fn run(&mut self, cancel: &CancellationToken) -> StatsSnapshot {
        if self.start(cancel).await {
            info!("reactive loop running");
            while !cancel.is_cancelled() {
                let pause = match self.tick().await {
                    TickOutcome::PollFailed => self.config.error_backoff,
                    TickOutcome::Idle | TickOutcome::Processed(_) => self.config.poll_interval,
                };
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(pause) => {}
                }
            }
        }

        self.set_state(LoopState::Stopped);
        let stats = self.stats.snapshot();
        info!(
            cycles = stats.cycles,
            installed = stats.flows_installed,
            "reactive loop stopped"
        );
        stats
    }

    // ── Processing ───────────────────────────────────────────────────

    async fn process_event(&self, event: &PacketInEvent, report: &mut BatchReport) {
        report.events += 1;
        self.stats.event_seen();

        let PacketPayload::Ipv4 { src, dst, protocol } = event.payload else {
            trace!(device = %event.device_id, "non-IPv4 packet-in");
            self.skip(report);
            return;
        };

        let egress = self.cache.resolve(dst, &event.device_id);
        let rule = match self.synth.build(event, egress) {
            Ok(Some(rule)) => rule,
            Ok(None) => {
                trace!(device = %event.device_id, proto = protocol, "unsupported protocol");
                self.skip(report);
                return;
            }
            Err(e) => {
                warn!(device = %event.device_id, error = %e, "could not build rule");
                report.failed += 1;
                self.stats.install_failed();
                return;
            }
        };

        if egress.is_none() {
            report.fallbacks += 1;
            self.stats.fallback();
            debug!(device = %event.device_id, %dst, fallback = %self.synth.fallback(), "destination unresolved");
        }

        if !self.store.should_install(&rule) {
            report.deduplicated += 1;
            self.stats.flow_deduplicated();
            trace!(device = %event.device_id, %src, %dst, "rule already installed");
            return;
        }

        if self.install(&rule).await {
            report.installed += 1;
        } else {
            report.failed += 1;
        }
    }

    fn skip(&self, report: &mut BatchReport) {
        report.skipped += 1;
        self.stats.event_skipped();
    }

    /// Install and record on success. Failures leave the store untouched.
    async fn install(&self, rule: &FlowRule) -> bool {
        let port = rule
            .treatment()
            .egress()
            .map(|p| p.to_string())
            .unwrap_or_default();
        match self.client.install_flow(rule).await {
            Ok(ack) => {
                self.store.record(rule);
                self.stats.flow_installed();
                info!(
                    device = %rule.device_id(),
                    priority = rule.priority(),
                    port = %port,
                    status = ack.status,
                    "flow installed"
                );
                true
            }
            Err(e) => {
                self.stats.install_failed();
                warn!(device = %rule.device_id(), port = %port, error = %e, "flow install failed");
                false
            }
        }
    }

    // ── Refresh ──────────────────────────────────────────────────────

    async fn refresh(&mut self) {
        self.refresh_hosts().await;

        let purged = self.store.purge_expired();
        if purged > 0 {
            debug!(purged, "expired flow records dropped");
        }

        if self.config.controller_ip.is_some() {
            match self.client.list_devices().await {
                Ok(devices) => {
                    if devices.len() != self.devices.len() {
                        info!(devices = devices.len(), "device inventory changed");
                    }
                    self.devices = devices;
                }
                Err(e) => warn!(error = %e, "device refresh failed, keeping previous inventory"),
            }
            self.install_reachability().await;
        }
    }

    async fn refresh_hosts(&self) {
        match self.cache.refresh(&self.client).await {
            Ok(_) => self.stats.cache_refreshed(),
            Err(e) => warn!(error = %e, hosts = self.cache.len(), "host refresh failed, keeping previous cache"),
        }
    }

    /// Steer controller-bound traffic on every device the controller host
    /// is attached to. Returns how many rules were installed.
    async fn install_reachability(&self) -> usize {
        let Some(controller_ip) = self.config.controller_ip else {
            return 0;
        };

        let mut installed = 0;
        for device in &self.devices {
            let Some(port) = self.cache.resolve(controller_ip, &device.id) else {
                debug!(device = %device.id, controller = %controller_ip, "controller not attached here");
                continue;
            };
            let rule = self.synth.reachability(device.id.clone(), controller_ip, port);
            if self.store.should_install(&rule) && self.install(&rule).await {
                installed += 1;
            }
        }
        installed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::FallbackAction;
    use crate::fake::{Call, FakeController};
    use crate::model::{Host, HostLocation, PortNumber};

    fn host(ip: &str, device: &str, port: u32) -> Host {
        Host {
            id: format!("host-{ip}"),
            mac: "00:00:00:00:00:02".into(),
            vlan: None,
            inner_vlan: None,
            outer_tpid: None,
            configured: false,
            suspended: false,
            ip_addresses: vec![ip.parse().unwrap()],
            locations: vec![HostLocation::new(device, PortNumber::Physical(port))],
        }
    }

    fn tcp(device: &str, dst: [u8; 4]) -> PacketInEvent {
        PacketInEvent::ipv4(device, 3, Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::from(dst), 6)
    }

    fn with_proto(protocol: u8) -> PacketInEvent {
        PacketInEvent::ipv4(
            "of:01",
            3,
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            protocol,
        )
    }

    async fn started(fake: FakeController, config: ReactiveConfig) -> ReactiveLoop<FakeController> {
        let mut lp = ReactiveLoop::new(fake, config).unwrap();
        assert!(lp.start(&CancellationToken::new()).await);
        lp
    }

    fn polls_after_start(calls: &[Call]) -> usize {
        calls.iter().filter(|c| matches!(c, Call::Poll)).count()
    }

    #[tokio::test]
    async fn startup_clears_every_device_before_first_poll() {
        let fake = FakeController::with_devices(&["of:01", "of:02", "of:03"]);
        fake.fail_clear("of:02");
        let mut lp = started(fake, ReactiveConfig::default()).await;

        lp.tick().await;

        let calls = lp.client().calls();
        let first_poll = calls.iter().position(|c| matches!(c, Call::Poll)).unwrap();
        let clears: Vec<&Call> = calls[..first_poll]
            .iter()
            .filter(|c| matches!(c, Call::Clear(_)))
            .collect();
        assert_eq!(clears.len(), 3);
        assert_eq!(*lp.state().borrow(), LoopState::Polling);
    }

    #[tokio::test]
    async fn resolved_destination_installs_output_rule() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.set_hosts(vec![host("10.0.0.2", "of:01", 5)]);
        fake.push_batch(vec![tcp("of:01", [10, 0, 0, 2])]);
        let mut lp = started(fake, ReactiveConfig::default()).await;

        let outcome = lp.tick().await;

        let TickOutcome::Processed(report) = outcome else {
            panic!("expected a processed batch, got {outcome:?}");
        };
        assert_eq!(report.installed, 1);
        assert_eq!(report.fallbacks, 0);
        let installs = lp.client().installs();
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0].treatment().egress(), Some(PortNumber::Physical(5)));
        assert_eq!(installs[0].priority(), 4000);
        assert_eq!(installs[0].timeout_secs(), 30);
    }

    #[tokio::test]
    async fn unresolved_destination_uses_fallback() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.push_batch(vec![tcp("of:01", [10, 0, 0, 2])]);
        let config = ReactiveConfig {
            fallback: FallbackAction::Flood,
            ..ReactiveConfig::default()
        };
        let mut lp = started(fake, config).await;

        lp.tick().await;

        let installs = lp.client().installs();
        assert_eq!(installs[0].treatment().egress(), Some(PortNumber::Flood));
        assert_eq!(lp.stats().snapshot().fallbacks, 1);
    }

    #[tokio::test]
    async fn unsupported_and_non_ipv4_events_make_no_calls() {
        let fake = FakeController::with_devices(&["of:01"]);
        let mut non_ip = with_proto(6);
        non_ip.payload = PacketPayload::NonIpv4;
        fake.push_batch(vec![with_proto(51), with_proto(89), non_ip]);
        let mut lp = started(fake, ReactiveConfig::default()).await;

        let outcome = lp.tick().await;

        assert_eq!(
            outcome,
            TickOutcome::Processed(BatchReport {
                events: 3,
                skipped: 3,
                ..BatchReport::default()
            })
        );
        assert!(lp.client().installs().is_empty());
    }

    #[tokio::test]
    async fn identical_event_installs_once() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.set_hosts(vec![host("10.0.0.2", "of:01", 5)]);
        fake.push_batch(vec![tcp("of:01", [10, 0, 0, 2]), tcp("of:01", [10, 0, 0, 2])]);
        fake.push_batch(vec![tcp("of:01", [10, 0, 0, 2])]);
        let mut lp = started(fake, ReactiveConfig::default()).await;

        lp.tick().await;
        lp.tick().await;

        assert_eq!(lp.client().installs().len(), 1);
        assert_eq!(lp.stats().snapshot().flows_deduplicated, 2);
    }

    #[tokio::test]
    async fn failed_install_is_retried_next_cycle() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.fail_installs(1);
        fake.push_batch(vec![tcp("of:01", [10, 0, 0, 2])]);
        fake.push_batch(vec![tcp("of:01", [10, 0, 0, 2])]);
        let mut lp = started(fake, ReactiveConfig::default()).await;

        let first = lp.tick().await;
        let second = lp.tick().await;

        assert!(matches!(first, TickOutcome::Processed(r) if r.failed == 1));
        assert!(matches!(second, TickOutcome::Processed(r) if r.installed == 1));
        assert_eq!(lp.client().installs().len(), 2);
        assert_eq!(lp.store().len(), 1);
    }

    #[tokio::test]
    async fn poll_failure_is_reported_not_fatal() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.push_poll_failure();
        let mut lp = started(fake, ReactiveConfig::default()).await;

        assert_eq!(lp.tick().await, TickOutcome::PollFailed);
        assert_eq!(lp.tick().await, TickOutcome::Idle);
        assert_eq!(lp.stats().snapshot().poll_failures, 1);
    }

    #[tokio::test]
    async fn host_cache_refreshes_on_cadence() {
        let fake = FakeController::with_devices(&["of:01"]);
        let config = ReactiveConfig {
            refresh_every: 3,
            ..ReactiveConfig::default()
        };
        let mut lp = started(fake, config).await;
        lp.client().set_hosts(vec![host("10.0.0.2", "of:01", 5)]);

        lp.tick().await;
        lp.tick().await;
        assert!(lp.cache().is_empty());

        lp.tick().await;
        assert_eq!(lp.cache().len(), 1);

        let host_lists = lp
            .client()
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::ListHosts))
            .count();
        assert_eq!(host_lists, 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_cache() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.set_hosts(vec![host("10.0.0.2", "of:01", 5)]);
        let config = ReactiveConfig {
            refresh_every: 1,
            ..ReactiveConfig::default()
        };
        let mut lp = started(fake, config).await;
        lp.client().fail_host_lists(1);

        lp.tick().await;

        assert_eq!(lp.cache().len(), 1);
    }

    #[tokio::test]
    async fn controller_reachability_rule_installed_after_clearing() {
        let fake = FakeController::with_devices(&["of:01", "of:02"]);
        fake.set_hosts(vec![host("192.168.71.10", "of:01", 1)]);
        let config = ReactiveConfig {
            controller_ip: Some(Ipv4Addr::new(192, 168, 71, 10)),
            ..ReactiveConfig::default()
        };
        let lp = started(fake, config).await;

        let calls = lp.client().calls();
        let last_clear = calls
            .iter()
            .rposition(|c| matches!(c, Call::Clear(_)))
            .unwrap();
        let install = calls
            .iter()
            .position(|c| matches!(c, Call::Install(_)))
            .unwrap();
        assert!(install > last_clear);

        let installs = lp.client().installs();
        assert_eq!(installs.len(), 1);
        assert_eq!(installs[0].device_id().as_str(), "of:01");
        assert!(installs[0].is_permanent());
        assert_eq!(installs[0].priority(), 10000);
    }

    #[tokio::test]
    async fn new_device_gets_reachability_rule_on_refresh() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.set_hosts(vec![host("192.168.71.10", "of:01", 1)]);
        let config = ReactiveConfig {
            controller_ip: Some(Ipv4Addr::new(192, 168, 71, 10)),
            refresh_every: 1,
            ..ReactiveConfig::default()
        };
        let mut lp = started(fake, config).await;
        assert_eq!(lp.client().installs().len(), 1);

        let mut second = host("192.168.71.10", "of:01", 1);
        second.locations.push(HostLocation::new("of:02", PortNumber::Physical(4)));
        lp.client().set_devices(&["of:01", "of:02"]);
        lp.client().set_hosts(vec![second]);
        lp.tick().await;

        let installs = lp.client().installs();
        assert_eq!(installs.len(), 2);
        assert_eq!(installs[1].device_id().as_str(), "of:02");
        assert_eq!(lp.devices().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_retries_device_inventory_with_backoff() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.fail_device_lists(2);
        let mut lp = ReactiveLoop::new(fake, ReactiveConfig::default()).unwrap();

        let began = tokio::time::Instant::now();
        assert!(lp.start(&CancellationToken::new()).await);

        assert_eq!(began.elapsed(), Duration::from_secs(4));
        assert_eq!(lp.devices().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_startup_stops_loop() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.fail_device_lists(usize::MAX);
        let mut lp = ReactiveLoop::new(fake, ReactiveConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = lp.run(&cancel).await;

        assert_eq!(stats.cycles, 0);
        assert_eq!(*lp.state().borrow(), LoopState::Stopped);
        assert_eq!(polls_after_start(&lp.client().calls()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_paces_polls_and_backs_off_after_failure() {
        let fake = FakeController::with_devices(&["of:01"]);
        fake.push_poll_failure();
        let mut lp = ReactiveLoop::new(fake, ReactiveConfig::default()).unwrap();
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            // Poll at t=0 fails (2s backoff), t=2 and t=3 are idle (1s each).
            tokio::time::sleep(Duration::from_millis(3500)).await;
            stopper.cancel();
        });

        let stats = lp.run(&cancel).await;

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.poll_failures, 1);
        assert_eq!(polls_after_start(&lp.client().calls()), 3);
        assert_eq!(*lp.state().borrow(), LoopState::Stopped);
    }
}
