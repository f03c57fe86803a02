//! The protection engine.

use crate::{Action, DispatchReport, EngineSettings, StateSweeper, UpdateOutcome, diff_protections};
use bulwark_core::{
    ActionExecutor, EventKind, ManagementNotifier, NormalizedEvent, PowerLevelSource, PowerLevels,
    RequestContext,
};
use bulwark_protections::{Evaluation, Protection, ProtectionState, Protections, Verdict};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

/// Evaluates events against the current protections snapshot.
///
/// Safe to share across tasks: dispatch takes `&self`, snapshot updates swap
/// an `Arc` under a short write lock, and state stores lock internally.
pub struct ProtectionEngine {
    settings: EngineSettings,
    snapshot: RwLock<Option<Arc<Protections>>>,
    state: ProtectionState,
    power_levels: Arc<dyn PowerLevelSource>,
    executor: Arc<dyn ActionExecutor>,
    notifier: Option<Arc<dyn ManagementNotifier>>,
}

impl std::fmt::Debug for ProtectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectionEngine")
            .field("settings", &self.settings)
            .field("has_snapshot", &self.snapshot.read().is_some())
            .field("state", &self.state)
            .field("has_notifier", &self.notifier.is_some())
            .finish()
    }
}

impl ProtectionEngine {
    /// Creates an engine with no protections configured.
    pub fn new(
        settings: EngineSettings,
        state: ProtectionState,
        power_levels: Arc<dyn PowerLevelSource>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        Self {
            settings,
            snapshot: RwLock::new(None),
            state,
            power_levels,
            executor,
            notifier: None,
        }
    }

    /// Sets the notifier used for bot-mention alerts.
    pub fn with_notifier(mut self, notifier: Arc<dyn ManagementNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The engine-owned protection state.
    pub fn state(&self) -> &ProtectionState {
        &self.state
    }

    /// The current snapshot, if one has been applied.
    pub fn snapshot(&self) -> Option<Arc<Protections>> {
        self.snapshot.read().clone()
    }

    /// A fresh request context bounded by the configured timeout.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new().with_timeout(*self.settings.request_timeout())
    }

    /// Parses `content` and replaces the snapshot.
    ///
    /// On a parse failure the previous snapshot stays in place and the
    /// outcome carries the error.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub fn update_protections(&self, content: &[u8]) -> UpdateOutcome {
        match Protections::from_slice(content) {
            Ok(protections) => self.replace_protections(protections),
            Err(e) => {
                warn!(error = %e, "Rejected protections update");
                UpdateOutcome::rejected(format!("failed to parse protections: {}", e.message))
            }
        }
    }

    /// Replaces the snapshot with an already parsed one.
    #[instrument(skip_all)]
    pub fn replace_protections(&self, protections: Protections) -> UpdateOutcome {
        let new = Arc::new(protections);
        let previous = self.snapshot.write().replace(new.clone());
        let changes = diff_protections(previous.as_deref(), &new);
        if changes.is_empty() && previous.is_some() {
            debug!("Protections snapshot unchanged");
            return UpdateOutcome::applied(vec!["No changes".to_string()]);
        }
        info!(changes = changes.len(), "Protections updated");
        let mut messages = Vec::with_capacity(changes.len() + 1);
        messages.push("Protections updated".to_string());
        messages.extend(changes);
        UpdateOutcome::applied(messages)
    }

    /// Dispatches `event` on the path matching its kind, under a fresh context.
    pub async fn dispatch(&self, event: &NormalizedEvent) -> DispatchReport {
        let ctx = self.request_context();
        match event.kind() {
            EventKind::Message | EventKind::Sticker => self.dispatch_message(&ctx, event).await,
            EventKind::Reaction => self.dispatch_reaction(&ctx, event).await,
            EventKind::Other => {
                trace!(event_id = %event.event_id(), "Ignoring event kind");
                DispatchReport::default()
            }
        }
    }

    /// Handles a message or sticker: bot-mention alert, then every applicable protection.
    #[instrument(
        skip(self, ctx, event),
        fields(room_id = %event.room_id(), event_id = %event.event_id(), sender = %event.sender())
    )]
    pub async fn dispatch_message(
        &self,
        ctx: &RequestContext,
        event: &NormalizedEvent,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.is_own_event(event) {
            return report;
        }
        self.alert_if_mentioned(ctx, event, &mut report).await;
        self.evaluate(ctx, event, &mut report).await;
        report
    }

    /// Handles a reaction; only media-oriented protections apply.
    #[instrument(
        skip(self, ctx, event),
        fields(room_id = %event.room_id(), event_id = %event.event_id(), sender = %event.sender())
    )]
    pub async fn dispatch_reaction(
        &self,
        ctx: &RequestContext,
        event: &NormalizedEvent,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.is_own_event(event) {
            return report;
        }
        self.evaluate(ctx, event, &mut report).await;
        report
    }

    /// Starts the background sweep of expired counters and verdicts.
    ///
    /// The task stops when `shutdown` is cancelled.
    pub fn spawn_sweeper(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        StateSweeper::new(self.state.clone(), interval, shutdown).start()
    }

    fn is_own_event(&self, event: &NormalizedEvent) -> bool {
        let own = event.sender() == self.settings.bot_user_id();
        if own {
            trace!("Skipping own event");
        }
        own
    }

    async fn alert_if_mentioned(
        &self,
        ctx: &RequestContext,
        event: &NormalizedEvent,
        report: &mut DispatchReport,
    ) {
        if !event.mentions_user(self.settings.bot_user_id()) {
            return;
        }
        let (Some(management_room), Some(notifier)) =
            (self.settings.management_room(), &self.notifier)
        else {
            debug!("Bot mentioned but no management room is configured");
            return;
        };

        let sender = event.sender();
        let room = event.room_id();
        let text = format!(
            "@room [{}]({}) [pinged]({}) the bot in [{}]({})",
            sender,
            sender.matrix_to_url(),
            room.event_matrix_to_url(event.event_id()),
            room,
            room.matrix_to_url(),
        );
        match notifier.notify(ctx, management_room, &text).await {
            Ok(()) => {
                info!(management_room = %management_room, "Alerted moderators of bot mention");
                report.push_action(Action::Alert {
                    management_room: management_room.clone(),
                    room_id: room.clone(),
                    event_id: event.event_id().clone(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to alert moderators of bot mention");
                report.push_error(e);
            }
        }
    }

    async fn evaluate(
        &self,
        ctx: &RequestContext,
        event: &NormalizedEvent,
        report: &mut DispatchReport,
    ) {
        let Some(snapshot) = self.snapshot() else {
            debug!("No protections configured");
            return;
        };
        let Some((scope, set)) = snapshot.effective_set(event.room_id()) else {
            debug!("No protections apply to this room");
            return;
        };
        debug!(%scope, "Resolved protections");

        let protections: Vec<Protection<'_>> = set
            .enabled()
            .into_iter()
            .filter(|p| p.kind().applies_to(*event.kind()))
            .collect();
        if protections.is_empty() {
            trace!("No enabled protection applies to this event");
            return;
        }

        let power_levels = if protections.iter().any(|p| p.kind().uses_power_levels()) {
            self.fetch_power_levels(ctx, event, report).await
        } else {
            None
        };

        let input = Evaluation {
            ctx,
            event,
            scope: &scope,
            power_levels: power_levels.as_ref(),
            state: &self.state,
        };
        let mut triggered = Vec::new();
        let mut reasons = Vec::new();
        for protection in &protections {
            match protection.evaluate(&input).await {
                Ok(Verdict::Pass) => {}
                Ok(Verdict::Redact { reason }) => {
                    debug!(protection = %protection.kind(), reason = %reason, "Protection requested redaction");
                    triggered.push(protection.kind());
                    reasons.push(reason);
                }
                Err(e) => {
                    warn!(protection = %protection.kind(), error = %e, "Protection failed");
                    report.push_error(e);
                }
            }
        }

        if triggered.is_empty() {
            return;
        }
        match self
            .executor
            .redact(ctx, event.room_id(), event.event_id())
            .await
        {
            Ok(()) => {
                info!(protections = ?triggered, "Redacted event");
                report.push_action(Action::Redact {
                    room_id: event.room_id().clone(),
                    event_id: event.event_id().clone(),
                    protections: triggered,
                    reasons,
                });
            }
            Err(e) => {
                error!(protections = ?triggered, error = %e, "Failed to redact event");
                report.push_error(e);
            }
        }
    }

    async fn fetch_power_levels(
        &self,
        ctx: &RequestContext,
        event: &NormalizedEvent,
        report: &mut DispatchReport,
    ) -> Option<PowerLevels> {
        match ctx.run(self.power_levels.power_levels(ctx, event.room_id())).await {
            Ok(Ok(levels)) => levels,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to fetch power levels, continuing without");
                report.push_error(e);
                None
            }
            Err(e) => {
                warn!(error = %e, "Power level fetch did not complete, continuing without");
                report.push_error(e);
                None
            }
        }
    }
}
