use serde::{Deserialize, Serialize};

use crate::capabilities::{TimerId, VoiceInfo};
use crate::config::AppConfig;
use crate::emergency::{CompanionFlow, SosFlow};
use crate::error::{AppError, Notice};
use crate::fake_call::FakeCall;
use crate::locale::Locale;
use crate::map::MapAdapter;
use crate::presentation::StepReports;
use crate::reports::ReportLog;
use crate::route::{RouteData, TransportMode};

/// Monotonic id of a route request; only the newest one may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The route request in flight and the timer guarding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRoute {
    pub id: RequestId,
    pub deadline: TimerId,
}

/// Runtime-only secrets: never serialized, never logged.
#[derive(Default)]
pub struct RuntimeSecrets {
    pub api_key: Option<secrecy::SecretString>,
}

impl std::fmt::Debug for RuntimeSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeSecrets")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: AppConfig,
    pub secrets: RuntimeSecrets,
    pub locale: Locale,

    // Route form
    pub start: String,
    pub end: String,
    pub mode: TransportMode,
    pub locating_start: bool,

    // Current route; `route` and `map` always change together
    pub last_request: RequestId,
    pub pending_route: Option<PendingRoute>,
    pub route: Option<RouteData>,
    pub error: Option<AppError>,
    pub map: MapAdapter,
    pub step_reports: StepReports,
    pub report_log: ReportLog,

    pub sos: SosFlow,
    pub companion: CompanionFlow,
    pub fake_call: FakeCall,
    pub voices: Vec<VoiceInfo>,

    /// Blocking notice awaiting acknowledgement.
    pub alert: Option<Notice>,
}

impl Model {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending_route.is_some()
    }

    pub fn set_error(&mut self, error: AppError) {
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Shows a blocking notice. A notice already showing is replaced.
    pub fn show_alert(&mut self, notice: Notice) {
        if let Some(previous) = self.alert.replace(notice) {
            tracing::debug!(replaced = previous.key(), "alert replaced");
        }
    }

    /// Replaces the current route; map and details follow.
    pub fn replace_route(&mut self, route: Option<RouteData>) {
        self.route = route;
        self.step_reports.reset();
        self.map.route_replaced();
    }

    /// Starts a new route request, superseding any in flight.
    pub fn begin_route_request(&mut self) -> PendingRoute {
        self.last_request = self.last_request.next();
        let pending = PendingRoute {
            id: self.last_request,
            deadline: TimerId::new(),
        };
        self.pending_route = Some(pending);
        self.clear_error();
        self.replace_route(None);
        pending
    }

    /// Takes the pending request if `id` is the live one.
    pub fn settle_route_request(&mut self, id: RequestId) -> Option<PendingRoute> {
        match self.pending_route {
            Some(pending) if pending.id == id => self.pending_route.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::fixtures::sample_route;
    use secrecy::SecretString;

    #[test]
    fn test_request_ids_supersede() {
        let mut model = Model::default();
        let first = model.begin_route_request();
        let second = model.begin_route_request();
        assert!(second.id > first.id);
        assert_eq!(model.settle_route_request(first.id), None);
        assert!(model.is_loading());
        assert_eq!(model.settle_route_request(second.id), Some(second));
        assert!(!model.is_loading());
    }

    #[test]
    fn test_new_request_clears_route_and_error_together() {
        let mut model = Model::default();
        model.replace_route(Some(sample_route()));
        let generation = model.map.generation();
        model.set_error(AppError::new(crate::error::ErrorKind::Timeout, "late"));

        model.begin_route_request();
        assert!(model.route.is_none());
        assert!(model.error.is_none());
        assert!(model.map.generation() > generation);
    }

    #[test]
    fn test_secrets_are_redacted() {
        let secrets = RuntimeSecrets {
            api_key: Some(SecretString::new("sk-live-123".into())),
        };
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("sk-live"));
        assert!(debug.contains("REDACTED"));
    }
}
