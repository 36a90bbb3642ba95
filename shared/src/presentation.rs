//! Route Presentation: the route-details panel and per-step issue reports.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::capabilities::TimerId;
use crate::error::AppError;
use crate::reports::{ReportError, ReportKind};
use crate::route::{RouteData, SafetyPointKind, SafetyTrend};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepReport {
    #[default]
    Idle,
    Reporting {
        kind: ReportKind,
        description: String,
    },
    /// Acknowledgement banner; cleared when `ack` fires.
    Submitted {
        ack: TimerId,
    },
}

/// What a submitted form hands to the report log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub kind: ReportKind,
    pub description: String,
}

/// Report form state for each step of the current route, keyed by the
/// 1-based step number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReports {
    steps: HashMap<u32, StepReport>,
}

impl StepReports {
    pub fn reset(&mut self) {
        self.steps.clear();
    }

    #[must_use]
    pub fn state(&self, step: u32) -> StepReport {
        self.steps.get(&step).cloned().unwrap_or_default()
    }

    /// Opens the form; ignored while the acknowledgement is showing.
    pub fn open(&mut self, step: u32) {
        let entry = self.steps.entry(step).or_default();
        if *entry == StepReport::Idle {
            *entry = StepReport::Reporting {
                kind: ReportKind::default(),
                description: String::new(),
            };
        }
    }

    pub fn set_kind(&mut self, step: u32, new_kind: ReportKind) {
        if let Some(StepReport::Reporting { kind, .. }) = self.steps.get_mut(&step) {
            *kind = new_kind;
        }
    }

    pub fn set_description(&mut self, step: u32, text: String) {
        if let Some(StepReport::Reporting { description, .. }) = self.steps.get_mut(&step) {
            *description = text;
        }
    }

    pub fn cancel(&mut self, step: u32) {
        if matches!(self.steps.get(&step), Some(StepReport::Reporting { .. })) {
            self.steps.remove(&step);
        }
    }

    /// Closes the form and shows the acknowledgement. A blank description
    /// leaves the form untouched.
    pub fn submit(&mut self, step: u32, ack: TimerId) -> Result<Submission, ReportError> {
        let Some(StepReport::Reporting { kind, description }) = self.steps.get(&step) else {
            return Err(ReportError::NotReporting(step));
        };
        let description = description.trim();
        if description.is_empty() {
            return Err(ReportError::EmptyDescription);
        }
        let submission = Submission {
            kind: *kind,
            description: description.to_string(),
        };
        self.steps.insert(step, StepReport::Submitted { ack });
        Ok(submission)
    }

    /// Returns `true` if `ack` was the live acknowledgement timer for `step`.
    pub fn acknowledgement_elapsed(&mut self, step: u32, ack: TimerId) -> bool {
        if self.steps.get(&step) == Some(&StepReport::Submitted { ack }) {
            self.steps.remove(&step);
            true
        } else {
            false
        }
    }

    pub fn pending_acks(&self) -> impl Iterator<Item = TimerId> + '_ {
        self.steps.values().filter_map(|s| match s {
            StepReport::Submitted { ack } => Some(*ack),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StepReportView {
    Idle,
    #[serde(rename_all = "camelCase")]
    Reporting {
        kind: ReportKind,
        description: String,
        can_submit: bool,
    },
    Submitted,
}

impl From<StepReport> for StepReportView {
    fn from(state: StepReport) -> Self {
        match state {
            StepReport::Idle => Self::Idle,
            StepReport::Reporting { kind, description } => Self::Reporting {
                kind,
                can_submit: !description.trim().is_empty(),
                description,
            },
            StepReport::Submitted { .. } => Self::Submitted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub number: u32,
    pub instruction: String,
    pub distance: String,
    pub report: StepReportView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyInsightView {
    pub kind: SafetyPointKind,
    pub title: String,
    pub description: String,
    pub trend: Option<SafetyTrend>,
    /// Only present when at least one recent report exists.
    pub recent_reports: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetailsView {
    pub overview: String,
    pub safety_insights: Vec<SafetyInsightView>,
    pub steps: Vec<StepView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RouteDetailsState {
    Loading,
    Error { key: String, message: String },
    Empty,
    Loaded(RouteDetailsView),
}

/// Picks the details panel state: loading, then error, then empty, then loaded.
#[must_use]
pub fn route_details(
    is_loading: bool,
    error: Option<&AppError>,
    route: Option<&RouteData>,
    reports: &StepReports,
) -> RouteDetailsState {
    if is_loading {
        return RouteDetailsState::Loading;
    }
    if let Some(error) = error {
        return RouteDetailsState::Error {
            key: error.notice().key().to_string(),
            message: error.user_facing_message(),
        };
    }
    let Some(route) = route else {
        return RouteDetailsState::Empty;
    };

    RouteDetailsState::Loaded(RouteDetailsView {
        overview: route.overview.clone(),
        safety_insights: route
            .safety_points
            .iter()
            .map(|p| SafetyInsightView {
                kind: p.kind,
                title: p.kind.label().to_string(),
                description: p.description.clone(),
                trend: p.historical_trend,
                recent_reports: p.user_reports.filter(|n| *n > 0),
            })
            .collect(),
        steps: route
            .steps
            .iter()
            .zip(1u32..)
            .map(|(step, number)| StepView {
                number,
                instruction: step.instruction.clone(),
                distance: step.distance.clone(),
                report: reports.state(number).into(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Notice};
    use crate::route::fixtures::sample_route;

    #[test]
    fn test_precedence_loading_error_empty_loaded() {
        let route = sample_route();
        let err = AppError::new(ErrorKind::Timeout, "late");
        let reports = StepReports::default();

        assert_eq!(
            route_details(true, Some(&err), Some(&route), &reports),
            RouteDetailsState::Loading
        );
        assert!(matches!(
            route_details(false, Some(&err), Some(&route), &reports),
            RouteDetailsState::Error { ref key, .. } if key == Notice::RouteGenerationError.key()
        ));
        assert_eq!(
            route_details(false, None, None, &reports),
            RouteDetailsState::Empty
        );
        assert!(matches!(
            route_details(false, None, Some(&route), &reports),
            RouteDetailsState::Loaded(_)
        ));
    }

    #[test]
    fn test_loaded_view_numbers_steps_and_hides_zero_reports() {
        let mut route = sample_route();
        route.safety_points.push(crate::route::SafetyPoint {
            user_reports: Some(0),
            ..route.safety_points[0].clone()
        });
        let RouteDetailsState::Loaded(view) =
            route_details(false, None, Some(&route), &StepReports::default())
        else {
            panic!("expected loaded");
        };
        assert_eq!(view.steps[0].number, 1);
        assert_eq!(view.steps[1].number, 2);
        assert_eq!(view.safety_insights[0].recent_reports, Some(2));
        assert_eq!(view.safety_insights[1].recent_reports, None);
        assert_eq!(view.safety_insights[0].title, "Police presence");
    }

    #[test]
    fn test_blank_submission_is_rejected_and_form_kept() {
        let mut reports = StepReports::default();
        reports.open(1);
        reports.set_description(1, "   ".into());
        assert_eq!(
            reports.submit(1, TimerId::new()),
            Err(ReportError::EmptyDescription)
        );
        assert!(matches!(reports.state(1), StepReport::Reporting { .. }));
    }

    #[test]
    fn test_submit_clears_form_and_acknowledges() {
        let mut reports = StepReports::default();
        reports.open(2);
        reports.set_kind(2, ReportKind::Road);
        reports.set_description(2, " Pothole near gate ".into());
        let ack = TimerId::new();
        let submission = reports.submit(2, ack).unwrap();
        assert_eq!(submission.kind, ReportKind::Road);
        assert_eq!(submission.description, "Pothole near gate");
        assert_eq!(reports.state(2), StepReport::Submitted { ack });

        // form cannot reopen during the acknowledgement window
        reports.open(2);
        assert_eq!(reports.state(2), StepReport::Submitted { ack });

        assert!(!reports.acknowledgement_elapsed(2, TimerId::new()));
        assert!(reports.acknowledgement_elapsed(2, ack));
        assert_eq!(reports.state(2), StepReport::Idle);
    }

    #[test]
    fn test_submit_without_open_form() {
        let mut reports = StepReports::default();
        assert_eq!(
            reports.submit(3, TimerId::new()),
            Err(ReportError::NotReporting(3))
        );
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut reports = StepReports::default();
        reports.open(1);
        reports.set_description(1, "draft".into());
        reports.cancel(1);
        assert_eq!(reports.state(1), StepReport::Idle);
    }
}
