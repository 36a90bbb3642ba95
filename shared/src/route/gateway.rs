//! Route Data Gateway: builds the `generateContent` request for the route
//! planning model and turns its reply into a validated [`RouteData`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::{RouteData, RouteValidationError, TransportMode};
use crate::capabilities::{HttpError, MAX_RESPONSE_BODY_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RouteQueryError {
    #[error("a starting point is required")]
    EmptyStart,
    #[error("a destination is required")]
    EmptyEnd,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RouteFetchError {
    #[error("no API key configured for the route service")]
    MissingApiKey,
    #[error("could not build route request: {message}")]
    Request { message: String },
    #[error("route service unreachable: {message}")]
    Transport { message: String },
    #[error("route service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("route service did not answer in time")]
    Timeout,
    #[error("route service response too large ({size} bytes)")]
    ResponseTooLarge { size: usize },
    #[error("route service returned no candidates{}", .block_reason.as_ref().map(|r| format!(" (blocked: {r})")).unwrap_or_default())]
    NoCandidates { block_reason: Option<String> },
    #[error("route service response is not valid route JSON: {message}")]
    MalformedJson { message: String },
    #[error("route failed validation: {0}")]
    Invalid(#[from] RouteValidationError),
}

/// A validated route request: both ends non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub start: String,
    pub end: String,
    pub mode: TransportMode,
}

impl RouteQuery {
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        mode: TransportMode,
    ) -> Result<Self, RouteQueryError> {
        let start = start.into().trim().to_string();
        let end = end.into().trim().to_string();
        if start.is_empty() {
            return Err(RouteQueryError::EmptyStart);
        }
        if end.is_empty() {
            return Err(RouteQueryError::EmptyEnd);
        }
        Ok(Self { start, end, mode })
    }
}

#[must_use]
pub fn system_instruction(region: &str) -> String {
    format!(
        "You are an expert route planning AI for {region}, with a specialization in user safety \
         and road conditions. Your task is to generate a route plan in a structured JSON format. \
         The route should prioritize safety by preferring streets with known police presence, \
         good lighting, and lower crime rates. You must also identify and report road quality \
         issues like potholes. For each safety point, you MUST provide additional context, such \
         as historical safety trends ('Improving', 'Stable', 'Declining') and a simulated number \
         of recent user-reported incidents. All coordinates for the route path and points of \
         interest must be real-world WGS84 latitude and longitude coordinates. You must also \
         calculate a bounding box that encompasses the entire route."
    )
}

#[must_use]
pub fn user_prompt(query: &RouteQuery, region: &str) -> String {
    format!(
        "Generate the safest route from \"{start}\" to \"{end}\" in {region} for a user who is \
         {mode}. The user's top priority is safety. Provide a detailed route including safety \
         points with historical context and road condition issues. The entire output must be a \
         single JSON object matching the provided schema.",
        start = query.start,
        end = query.end,
        mode = query.mode,
    )
}

/// Response schema handed to the model; mirrors the serde shape of [`RouteData`].
#[must_use]
pub fn route_schema() -> Value {
    let point = json!({
        "type": "OBJECT",
        "properties": {
            "lat": { "type": "NUMBER", "description": "Latitude" },
            "lng": { "type": "NUMBER", "description": "Longitude" }
        },
        "required": ["lat", "lng"]
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "overview": {
                "type": "STRING",
                "description": "A brief summary of the route including total distance and estimated time."
            },
            "path": {
                "type": "ARRAY",
                "description": "An array of {lat, lng} coordinates representing the route path.",
                "items": point
            },
            "steps": {
                "type": "ARRAY",
                "description": "Turn-by-turn instructions for the route.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "instruction": { "type": "STRING" },
                        "distance": { "type": "STRING" }
                    },
                    "required": ["instruction", "distance"]
                }
            },
            "safetyPoints": {
                "type": "ARRAY",
                "description": "Points of interest related to safety along the route, including contextual data.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "location": point,
                        "type": { "type": "STRING", "enum": ["police_presence", "well_lit", "low_crime_zone"] },
                        "description": { "type": "STRING" },
                        "historicalTrend": {
                            "type": "STRING",
                            "enum": ["Improving", "Stable", "Declining"],
                            "description": "The safety trend for this location."
                        },
                        "userReports": {
                            "type": "INTEGER",
                            "description": "Number of recent user-reported incidents."
                        }
                    },
                    "required": ["location", "type", "description"]
                }
            },
            "roadIssues": {
                "type": "ARRAY",
                "description": "Points of interest related to road damage.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "location": point,
                        "type": { "type": "STRING", "enum": ["pothole", "damaged_road"] },
                        "description": { "type": "STRING" },
                        "severity": { "type": "STRING", "enum": ["low", "medium", "high"] }
                    },
                    "required": ["location", "type", "description", "severity"]
                }
            },
            "bounds": {
                "type": "OBJECT",
                "description": "The bounding box for the entire route, covering the most south-west and north-east points.",
                "properties": {
                    "southWest": point,
                    "northEast": point
                },
                "required": ["southWest", "northEast"]
            }
        },
        "required": ["overview", "path", "steps", "safetyPoints", "roadIssues", "bounds"]
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

impl GenerateContentRequest {
    #[must_use]
    pub fn for_query(query: &RouteQuery, region: &str) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(system_instruction(region)),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(user_prompt(query, region)),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: route_schema(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Reads the HTTP outcome delivered by the `Http` capability.
pub fn read_response(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<RouteData, RouteFetchError> {
    let mut response = result.map_err(|e| RouteFetchError::Transport {
        message: e.to_string(),
    })?;
    let status: u16 = response.status().into();
    let body = response.take_body().unwrap_or_default();
    parse_response(status, &body)
}

/// Turns a raw `generateContent` reply into a validated route.
pub fn parse_response(status: u16, body: &[u8]) -> Result<RouteData, RouteFetchError> {
    if let Some(HttpError::HttpStatus { status, message, .. }) = HttpError::from_status(status, body)
    {
        return Err(RouteFetchError::Status { status, message });
    }

    if body.len() > MAX_RESPONSE_BODY_SIZE {
        return Err(RouteFetchError::ResponseTooLarge { size: body.len() });
    }

    let envelope: GenerateContentResponse =
        serde_json::from_slice(body).map_err(|e| RouteFetchError::MalformedJson {
            message: format!("envelope: {e}"),
        })?;

    let text: String = envelope
        .candidates
        .into_iter()
        .find_map(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .concat()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(RouteFetchError::NoCandidates {
            block_reason: envelope.prompt_feedback.and_then(|f| f.block_reason),
        });
    }

    parse_route_json(&text)
}

/// Parses the model's JSON text, tolerating a Markdown code fence around it.
pub fn parse_route_json(text: &str) -> Result<RouteData, RouteFetchError> {
    let trimmed = strip_code_fence(text.trim());
    let route: RouteData =
        serde_json::from_str(trimmed).map_err(|e| RouteFetchError::MalformedJson {
            message: e.to_string(),
        })?;
    Ok(route.validated()?)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::fixtures::sample_route;
    use proptest::prelude::*;

    fn envelope_for(text: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_query_requires_both_ends() {
        assert_eq!(
            RouteQuery::new("  ", "Indiranagar", TransportMode::Walking),
            Err(RouteQueryError::EmptyStart)
        );
        assert_eq!(
            RouteQuery::new("MG Road", "", TransportMode::Car),
            Err(RouteQueryError::EmptyEnd)
        );
        let q = RouteQuery::new(" MG Road ", "Indiranagar", TransportMode::Bike).unwrap();
        assert_eq!(q.start, "MG Road");
    }

    #[test]
    fn test_request_shape() {
        let q = RouteQuery::new("MG Road", "Indiranagar", TransportMode::Bike).unwrap();
        let body = serde_json::to_value(GenerateContentRequest::for_query(&q, "India")).unwrap();

        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["overview", "path", "steps", "safetyPoints", "roadIssues", "bounds"])
        );
        assert_eq!(body["contents"][0]["role"], "user");
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("\"MG Road\""));
        assert!(prompt.contains("who is bike"));
        assert!(body["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn test_parse_success() {
        let text = serde_json::to_string(&sample_route()).unwrap();
        let route = parse_response(200, &envelope_for(&text)).unwrap();
        assert_eq!(route, sample_route().validated().unwrap());
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = format!("```json\n{}\n```", serde_json::to_string(&sample_route()).unwrap());
        assert!(parse_response(200, &envelope_for(&text)).is_ok());
    }

    #[test]
    fn test_parse_status_error() {
        let err = parse_response(503, br#"{"error":{"message":"overloaded"}}"#).unwrap_err();
        assert_eq!(
            err,
            RouteFetchError::Status {
                status: 503,
                message: "overloaded".into()
            }
        );
    }

    #[test]
    fn test_parse_missing_field() {
        let mut value = serde_json::to_value(sample_route()).unwrap();
        value.as_object_mut().unwrap().remove("bounds");
        let err = parse_response(200, &envelope_for(&value.to_string())).unwrap_err();
        assert!(matches!(err, RouteFetchError::MalformedJson { .. }));
    }

    #[test]
    fn test_parse_invalid_coordinate() {
        let mut route = sample_route();
        route.path[1].lng = 400.0;
        let text = serde_json::to_string(&route).unwrap();
        let err = parse_response(200, &envelope_for(&text)).unwrap_err();
        assert!(matches!(err, RouteFetchError::Invalid(_)));
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = br#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = parse_response(200, body).unwrap_err();
        assert_eq!(
            err,
            RouteFetchError::NoCandidates {
                block_reason: Some("SAFETY".into())
            }
        );
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_garbage_envelope() {
        assert!(matches!(
            parse_response(200, b"<html>"),
            Err(RouteFetchError::MalformedJson { .. })
        ));
    }

    fn point() -> impl Strategy<Value = (f64, f64)> {
        (-90.0f64..=90.0, -180.0f64..=180.0)
    }

    proptest! {
        #[test]
        fn parsed_bounds_cover_the_whole_path(
            path in prop::collection::vec(point(), 1..48),
            corner_a in point(),
            corner_b in point(),
        ) {
            let text = serde_json::json!({
                "overview": "generated",
                "path": path.iter().map(|&(lat, lng)| serde_json::json!({"lat": lat, "lng": lng})).collect::<Vec<_>>(),
                "steps": [],
                "safetyPoints": [],
                "roadIssues": [],
                "bounds": {
                    "southWest": {"lat": corner_a.0, "lng": corner_a.1},
                    "northEast": {"lat": corner_b.0, "lng": corner_b.1},
                },
            })
            .to_string();

            let route = parse_route_json(&text).unwrap();
            let bounds = route.bounds;
            prop_assert!(bounds.south_west.lat <= bounds.north_east.lat);
            prop_assert!(bounds.south_west.lng <= bounds.north_east.lng);
            for p in &route.path {
                prop_assert!(bounds.contains(*p));
            }
            prop_assert!(bounds.contains(route.start().unwrap()));
            prop_assert!(bounds.contains(route.end().unwrap()));
        }
    }
}
