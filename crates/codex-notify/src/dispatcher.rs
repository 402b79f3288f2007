//! Fan-out of a qualified lead to every configured channel.
//!
//! Channels run concurrently, each under its own timeout. A failing channel
//! never stops the others. When no channel delivered or stored the lead, the
//! dispatcher appends it to the local lead store itself, so a lead is only
//! lost when the local store has no capacity. A lead store that outlives the
//! channel timeout is treated like an unreachable one: the lead is kept
//! locally right away.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use codex_core::{LeadData, NotificationConfig};

use crate::channel::{
    http_client, ChannelKind, ChannelOutcome, EmailChannel, LeadStoreChannel, NotificationChannel,
    SmsChannel, WebhookChannel, WhatsAppChannel,
};
use crate::error::ChannelError;
use crate::local_store::LocalLeadStore;

/// Result of one channel for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ChannelStatus {
    Delivered,
    StoredLocally,
    Skipped(String),
    Failed(String),
    TimedOut,
}

impl ChannelStatus {
    fn succeeded(&self) -> bool {
        matches!(self, ChannelStatus::Delivered | ChannelStatus::StoredLocally)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelReport {
    pub channel: ChannelKind,
    #[serde(flatten)]
    pub status: ChannelStatus,
}

/// Outcome of [`Dispatcher::notify`], channels sorted by kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub channels: Vec<ChannelReport>,
    /// The dispatcher stored the lead locally after every channel came up empty.
    pub fallback_stored: bool,
}

impl DispatchReport {
    /// True when at least one channel delivered or the lead was kept locally.
    pub fn delivered(&self) -> bool {
        self.fallback_stored || self.channels.iter().any(|c| c.status.succeeded())
    }

    pub fn status_of(&self, kind: ChannelKind) -> Option<&ChannelStatus> {
        self.channels
            .iter()
            .find(|c| c.channel == kind)
            .map(|c| &c.status)
    }
}

/// Running counters across all dispatches.
///
/// `delivered` and `failed` count channel attempts; `dispatched` and `lost`
/// count leads.
#[derive(Debug, Default)]
pub struct DispatchStats {
    dispatched: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    stored_locally: AtomicU64,
    lost: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStatsSnapshot {
    pub dispatched: u64,
    pub delivered: u64,
    pub failed: u64,
    pub stored_locally: u64,
    pub lost: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            stored_locally: self.stored_locally.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
        }
    }

    fn record(&self, report: &DispatchReport) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        for c in &report.channels {
            match c.status {
                ChannelStatus::Delivered => {
                    self.delivered.fetch_add(1, Ordering::Relaxed);
                }
                ChannelStatus::StoredLocally => {
                    self.stored_locally.fetch_add(1, Ordering::Relaxed);
                }
                ChannelStatus::Failed(_) | ChannelStatus::TimedOut => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                }
                ChannelStatus::Skipped(_) => {}
            }
        }
        if report.fallback_stored {
            self.stored_locally.fetch_add(1, Ordering::Relaxed);
        }
        if !report.delivered() {
            self.lost.fetch_add(1, Ordering::Relaxed);
        }
    }
}

pub struct Dispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    local: Arc<LocalLeadStore>,
    timeout: Duration,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    pub fn new(
        channels: Vec<Arc<dyn NotificationChannel>>,
        local: Arc<LocalLeadStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            channels,
            local,
            timeout,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    /// Build every channel from configuration, sharing one HTTP client.
    pub fn from_config(config: &NotificationConfig) -> Result<Self, ChannelError> {
        let timeout = Duration::from_secs(config.channel_timeout_secs.max(1));
        let client = http_client(timeout)?;

        let local = Arc::new(match &config.local_store_file {
            Some(path) => LocalLeadStore::with_file(PathBuf::from(path), config.local_store_capacity),
            None => LocalLeadStore::in_memory(config.local_store_capacity),
        });

        let channels: Vec<Arc<dyn NotificationChannel>> = vec![
            Arc::new(WebhookChannel::new(
                client.clone(),
                config.webhook_url.clone(),
                config.webhook_enabled,
            )),
            Arc::new(SmsChannel::new(
                client.clone(),
                config.sms_webhook_url.clone(),
                config.phone.clone(),
                config.sms_enabled,
            )),
            Arc::new(WhatsAppChannel::new(
                client.clone(),
                config.whatsapp_webhook_url.clone(),
                config.phone.clone(),
                config.whatsapp_enabled,
            )),
            Arc::new(EmailChannel::new(
                client.clone(),
                config.email_webhook_url.clone(),
                config.email.clone(),
                config.email_enabled,
            )),
            Arc::new(LeadStoreChannel::new(
                client,
                config.lead_store_url.clone(),
                config.lead_store_enabled,
                local.clone(),
            )),
        ];

        info!(
            channels = channels.len(),
            timeout_secs = timeout.as_secs(),
            local_capacity = local.capacity(),
            "Notification dispatcher ready"
        );
        Ok(Self::new(channels, local, timeout))
    }

    pub fn local_store(&self) -> &Arc<LocalLeadStore> {
        &self.local
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Send `lead` through every channel and wait for all of them.
    pub async fn notify(&self, lead: &LeadData) -> DispatchReport {
        let lead = Arc::new(lead.clone());
        let mut set = JoinSet::new();

        for channel in &self.channels {
            let channel = Arc::clone(channel);
            let lead = Arc::clone(&lead);
            let local = Arc::clone(&self.local);
            let timeout = self.timeout;
            set.spawn(async move {
                let kind = channel.kind();
                let mut status = match tokio::time::timeout(timeout, channel.send(&lead)).await {
                    Ok(Ok(ChannelOutcome::Delivered)) => ChannelStatus::Delivered,
                    Ok(Ok(ChannelOutcome::StoredLocally)) => ChannelStatus::StoredLocally,
                    Ok(Ok(ChannelOutcome::Skipped(reason))) => {
                        debug!(channel = %kind, reason = %reason, "Channel skipped");
                        ChannelStatus::Skipped(reason)
                    }
                    Ok(Err(ChannelError::Timeout)) | Err(_) => {
                        warn!(channel = %kind, session = %lead.session_id, "Channel timed out");
                        ChannelStatus::TimedOut
                    }
                    Ok(Err(e)) => {
                        warn!(channel = %kind, session = %lead.session_id, error = %e, "Channel failed");
                        ChannelStatus::Failed(e.to_string())
                    }
                };
                if kind == ChannelKind::LeadStore && status == ChannelStatus::TimedOut {
                    if let Some(record) = local.append(&lead) {
                        info!(session = %lead.session_id, id = %record.id, "Lead store timed out, lead stored locally");
                        status = ChannelStatus::StoredLocally;
                    }
                }
                ChannelReport {
                    channel: kind,
                    status,
                }
            });
        }

        let mut report = DispatchReport::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(channel_report) => report.channels.push(channel_report),
                Err(e) => error!(error = %e, "Notification task panicked"),
            }
        }
        report.channels.sort_by_key(|c| c.channel);

        if !report.delivered() && self.local.append(&lead).is_some() {
            report.fallback_stored = true;
            info!(session = %lead.session_id, "No channel succeeded, lead kept in local store");
        }

        self.stats.record(&report);
        if report.delivered() {
            info!(
                session = %lead.session_id,
                score = lead.score,
                delivered = report.channels.iter().filter(|c| c.status.succeeded()).count(),
                "Lead dispatched"
            );
        } else {
            error!(session = %lead.session_id, score = lead.score, "Lead lost: no channel delivered and local store is full");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::sample_lead;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedChannel {
        kind: ChannelKind,
        result: fn() -> Result<ChannelOutcome, ChannelError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedChannel {
        fn new(kind: ChannelKind, result: fn() -> Result<ChannelOutcome, ChannelError>) -> Self {
            Self {
                kind,
                result,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl NotificationChannel for FixedChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn send(&self, _lead: &LeadData) -> Result<ChannelOutcome, ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.result)()
        }
    }

    fn failing_config(server: &MockServer) -> NotificationConfig {
        NotificationConfig {
            phone: Some("+15550100".to_string()),
            email: Some("sales@example.com".to_string()),
            webhook_url: Some(format!("{}/hook", server.uri())),
            sms_webhook_url: Some(format!("{}/sms", server.uri())),
            whatsapp_webhook_url: Some(format!("{}/wa", server.uri())),
            email_webhook_url: Some(format!("{}/email", server.uri())),
            lead_store_url: Some(format!("{}/leads", server.uri())),
            channel_timeout_secs: 5,
            ..NotificationConfig::default()
        }
    }

    // ---- fallback ----

    #[tokio::test]
    async fn test_all_remote_channels_failing_stores_exactly_one_local_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(5)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::from_config(&failing_config(&server)).unwrap();
        let report = dispatcher.notify(&sample_lead()).await;

        assert!(report.delivered());
        assert!(!report.fallback_stored);
        assert_eq!(dispatcher.local_store().len(), 1);
        assert_eq!(
            report.status_of(ChannelKind::LeadStore),
            Some(&ChannelStatus::StoredLocally)
        );
        for kind in [
            ChannelKind::Webhook,
            ChannelKind::Sms,
            ChannelKind::WhatsApp,
            ChannelKind::Email,
        ] {
            assert!(matches!(
                report.status_of(kind),
                Some(ChannelStatus::Failed(_))
            ));
        }

        let stats = dispatcher.stats();
        assert_eq!(stats.dispatched, 1);
        assert_eq!(stats.failed, 4);
        assert_eq!(stats.stored_locally, 1);
        assert_eq!(stats.lost, 0);
    }

    #[tokio::test]
    async fn test_nothing_configured_keeps_lead_locally() {
        let dispatcher = Dispatcher::from_config(&NotificationConfig::default()).unwrap();
        let report = dispatcher.notify(&sample_lead()).await;

        assert!(report.delivered());
        assert_eq!(dispatcher.local_store().len(), 1);
        assert!(matches!(
            report.status_of(ChannelKind::Webhook),
            Some(ChannelStatus::Skipped(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatcher_fallback_when_lead_store_disabled() {
        let local = Arc::new(LocalLeadStore::in_memory(5));
        let channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(FixedChannel::new(
            ChannelKind::Webhook,
            || Err(ChannelError::Status(502)),
        ))];
        let dispatcher = Dispatcher::new(channels, local.clone(), Duration::from_secs(1));

        let report = dispatcher.notify(&sample_lead()).await;
        assert!(report.fallback_stored);
        assert!(report.delivered());
        assert_eq!(local.len(), 1);
    }

    #[tokio::test]
    async fn test_lost_when_local_store_has_no_capacity() {
        let local = Arc::new(LocalLeadStore::in_memory(0));
        let channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(FixedChannel::new(
            ChannelKind::Email,
            || Err(ChannelError::Unreachable("refused".to_string())),
        ))];
        let dispatcher = Dispatcher::new(channels, local, Duration::from_secs(1));

        let report = dispatcher.notify(&sample_lead()).await;
        assert!(!report.delivered());
        assert_eq!(dispatcher.stats().lost, 1);
    }

    // ---- fan-out ----

    #[tokio::test]
    async fn test_slow_channel_times_out_without_blocking_others() {
        let mut slow = FixedChannel::new(ChannelKind::Sms, || Ok(ChannelOutcome::Delivered));
        slow.delay = Duration::from_secs(5);
        let fast = Arc::new(FixedChannel::new(ChannelKind::Webhook, || {
            Ok(ChannelOutcome::Delivered)
        }));

        let local = Arc::new(LocalLeadStore::in_memory(5));
        let channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(slow), fast.clone() as Arc<dyn NotificationChannel>];
        let dispatcher = Dispatcher::new(channels, local.clone(), Duration::from_millis(100));

        let started = std::time::Instant::now();
        let report = dispatcher.notify(&sample_lead()).await;
        assert!(started.elapsed() < Duration::from_secs(2));

        assert_eq!(report.status_of(ChannelKind::Sms), Some(&ChannelStatus::TimedOut));
        assert_eq!(
            report.status_of(ChannelKind::Webhook),
            Some(&ChannelStatus::Delivered)
        );
        assert!(report.delivered());
        assert!(local.is_empty());
        assert_eq!(fast.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hung_lead_store_keeps_lead_locally() {
        let mut hung = FixedChannel::new(ChannelKind::LeadStore, || Ok(ChannelOutcome::Delivered));
        hung.delay = Duration::from_secs(5);
        let channels: Vec<Arc<dyn NotificationChannel>> = vec![
            Arc::new(hung),
            Arc::new(FixedChannel::new(ChannelKind::Webhook, || {
                Ok(ChannelOutcome::Delivered)
            })),
        ];
        let local = Arc::new(LocalLeadStore::in_memory(5));
        let dispatcher = Dispatcher::new(channels, local.clone(), Duration::from_millis(100));

        let report = dispatcher.notify(&sample_lead()).await;

        assert_eq!(
            report.status_of(ChannelKind::LeadStore),
            Some(&ChannelStatus::StoredLocally)
        );
        assert!(!report.fallback_stored);
        assert_eq!(local.len(), 1);
        assert_eq!(dispatcher.stats().stored_locally, 1);
    }

    #[tokio::test]
    async fn test_report_sorted_by_channel_kind() {
        let channels: Vec<Arc<dyn NotificationChannel>> = vec![
            Arc::new(FixedChannel::new(ChannelKind::LeadStore, || {
                Ok(ChannelOutcome::Delivered)
            })),
            Arc::new(FixedChannel::new(ChannelKind::Email, || {
                Ok(ChannelOutcome::Skipped("off".to_string()))
            })),
            Arc::new(FixedChannel::new(ChannelKind::Webhook, || {
                Ok(ChannelOutcome::Delivered)
            })),
        ];
        let dispatcher = Dispatcher::new(
            channels,
            Arc::new(LocalLeadStore::in_memory(5)),
            Duration::from_secs(1),
        );
        let report = dispatcher.notify(&sample_lead()).await;
        let kinds: Vec<ChannelKind> = report.channels.iter().map(|c| c.channel).collect();
        assert_eq!(
            kinds,
            vec![ChannelKind::Webhook, ChannelKind::Email, ChannelKind::LeadStore]
        );
        assert_eq!(dispatcher.stats().delivered, 2);
    }

    #[test]
    fn test_report_serializes_status_tag() {
        let report = ChannelReport {
            channel: ChannelKind::Sms,
            status: ChannelStatus::Failed("boom".to_string()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["channel"], "sms");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["detail"], "boom");
    }
}
