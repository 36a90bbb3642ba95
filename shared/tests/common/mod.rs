#![allow(dead_code)]

use astrapath_shared::capabilities::{
    GeolocationOperation, LauncherOperation, MediaOperation, SpeechRecognitionOperation,
    SpeechSynthesisOperation, TimerOperation,
};
use astrapath_shared::{App, AppConfig, Effect, Event, Model};
use crux_core::testing::{AppTester, Update};
use crux_core::Request;

pub type Tester = AppTester<App, Effect>;

pub fn started() -> (Tester, Model) {
    let app = Tester::default();
    let mut model = Model::default();
    let config = AppConfig {
        api_key: Some("test-key".into()),
        ..AppConfig::default()
    };
    app.update(Event::AppStarted(config), &mut model);
    (app, model)
}

/// Applies the events an update produced, depth first, and returns every
/// effect requested along the way.
pub fn settle(app: &Tester, model: &mut Model, update: Update<Effect, Event>) -> Vec<Effect> {
    let mut effects = update.effects;
    for event in update.events {
        let next = app.update(event, model);
        effects.extend(settle(app, model, next));
    }
    effects
}

pub fn send(app: &Tester, model: &mut Model, event: Event) -> Vec<Effect> {
    let update = app.update(event, model);
    settle(app, model, update)
}

pub fn timers(effects: Vec<Effect>) -> Vec<Request<TimerOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Timer(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn scheduled_timer(effects: Vec<Effect>) -> Option<Request<TimerOperation>> {
    timers(effects)
        .into_iter()
        .find(|r| matches!(r.operation, TimerOperation::NotifyAfter { .. }))
}

pub fn geolocation(effects: Vec<Effect>) -> Option<Request<GeolocationOperation>> {
    effects.into_iter().find_map(|e| match e {
        Effect::Geolocation(request) => Some(request),
        _ => None,
    })
}

pub fn media(effects: Vec<Effect>) -> Vec<Request<MediaOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Media(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn recognition(effects: Vec<Effect>) -> Vec<Request<SpeechRecognitionOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::SpeechRecognition(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn synthesis(effects: Vec<Effect>) -> Vec<Request<SpeechSynthesisOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::SpeechSynthesis(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn launches(effects: &[Effect]) -> Vec<LauncherOperation> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Launcher(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

pub const ROUTE_JSON: &str = r#"{
  "overview": "2.1 km, about 25 minutes on foot",
  "path": [
    {"lat": 12.9716, "lng": 77.5946},
    {"lat": 12.9750, "lng": 77.6010},
    {"lat": 12.9784, "lng": 77.6082}
  ],
  "steps": [
    {"instruction": "Head north on MG Road", "distance": "800 m"},
    {"instruction": "Turn right onto Brigade Road", "distance": "1.3 km"}
  ],
  "safetyPoints": [
    {
      "location": {"lat": 12.9750, "lng": 77.6010},
      "type": "police_presence",
      "description": "Police booth at the junction",
      "historicalTrend": "Improving",
      "userReports": 2
    }
  ],
  "roadIssues": [
    {
      "location": {"lat": 12.9770, "lng": 77.6050},
      "type": "pothole",
      "description": "Deep pothole near the bus stop",
      "severity": "high"
    }
  ],
  "bounds": {
    "southWest": {"lat": 12.9716, "lng": 77.5946},
    "northEast": {"lat": 12.9784, "lng": 77.6082}
  }
}"#;

pub fn route_fetched(
    request_id: astrapath_shared::model::RequestId,
    json: &str,
) -> Event {
    Event::RouteFetched {
        request_id,
        outcome: Box::new(astrapath_shared::route::gateway::parse_route_json(json)),
    }
}

/// Fills the form and submits it; returns the effects of the submission.
pub fn request_route(app: &Tester, model: &mut Model) -> Vec<Effect> {
    send(app, model, Event::StartChanged("MG Road, Bengaluru".into()));
    send(app, model, Event::EndChanged("Indiranagar, Bengaluru".into()));
    send(app, model, Event::FindRoute)
}

/// Requests and receives the sample route.
pub fn with_route(app: &Tester, model: &mut Model) {
    request_route(app, model);
    let id = model.last_request;
    send(app, model, route_fetched(id, ROUTE_JSON));
}
