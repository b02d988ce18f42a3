//! Wire messages exchanged between the host and the worker.
//!
//! Inbound: `{ "type": <kind>, "data": <payload>, "id": <correlation id> }`
//!
//! Outbound: `{ "type": <echoed kind>, "result" | "error": ..., "id": ... }`
//! plus a single `{ "type": "ready" }` when the worker starts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use telemetry_core::{Error, Result, Sample};
use telemetry_dsp::{FilterHandle, FilterKind, SpectrumResult, StatisticsResult, WindowFunction};

/// Operation kinds the worker computes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Decimate,
    Analyze,
    Filter,
}

/// Declared by older hosts but never implemented
const RESERVED_KINDS: &[&str] = &["process"];

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Decimate => "decimate",
            RequestKind::Analyze => "analyze",
            RequestKind::Filter => "filter",
        }
    }

    pub fn parse(kind: &str) -> Result<Self> {
        match kind {
            "decimate" => Ok(RequestKind::Decimate),
            "analyze" => Ok(RequestKind::Analyze),
            "filter" => Ok(RequestKind::Filter),
            reserved if RESERVED_KINDS.contains(&reserved) => {
                Err(Error::ReservedKind(reserved.to_string()))
            }
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecimatePayload {
    pub points: Vec<Sample>,
    pub threshold: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzePayload {
    pub points: Vec<Sample>,
    pub include_fft: bool,
    /// Window applied before the DFT
    #[serde(default)]
    pub window: WindowFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPayload {
    pub points: Vec<Sample>,
    pub filter_type: FilterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_noise: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_noise: Option<f64>,
    /// Caller-owned state continuing a previous chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<FilterHandle>,
}

/// A decoded request
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Decimate(DecimatePayload),
    Analyze(AnalyzePayload),
    Filter(FilterPayload),
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Decimate(_) => RequestKind::Decimate,
            Request::Analyze(_) => RequestKind::Analyze,
            Request::Filter(_) => RequestKind::Filter,
        }
    }

    pub fn points(&self) -> &[Sample] {
        match self {
            Request::Decimate(p) => &p.points,
            Request::Analyze(p) => &p.points,
            Request::Filter(p) => &p.points,
        }
    }

    /// Decode a payload for the given kind string
    pub fn decode(kind: &str, data: Value) -> Result<Self> {
        match RequestKind::parse(kind)? {
            RequestKind::Decimate => payload(data).map(Request::Decimate),
            RequestKind::Analyze => payload(data).map(Request::Analyze),
            RequestKind::Filter => payload(data).map(Request::Filter),
        }
    }

    /// Wrap the request in an envelope with a correlation id
    pub fn into_message(self, id: impl Into<String>) -> Result<InboundMessage> {
        let kind = self.kind();
        let data = match self {
            Request::Decimate(p) => serde_json::to_value(p)?,
            Request::Analyze(p) => serde_json::to_value(p)?,
            Request::Filter(p) => serde_json::to_value(p)?,
        };

        Ok(InboundMessage {
            kind: kind.as_str().to_string(),
            data,
            id: id.into(),
        })
    }
}

fn payload<T: DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| Error::MalformedPayload(e.to_string()))
}

/// Host → worker envelope.
///
/// The kind stays a string here so that unknown kinds still reach the
/// dispatcher and receive a correlated error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    pub id: String,
}

impl InboundMessage {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// `None` for an empty series
    pub statistics: Option<StatisticsResult>,
    /// Present only when requested
    pub fft: Option<SpectrumResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterOutput {
    Series(Vec<Sample>),
    Continued {
        points: Vec<Sample>,
        handle: FilterHandle,
    },
}

impl FilterOutput {
    pub fn points(&self) -> &[Sample] {
        match self {
            FilterOutput::Series(points) => points,
            FilterOutput::Continued { points, .. } => points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Decimate(Vec<Sample>),
    Analyze(AnalysisResult),
    Filter(FilterOutput),
}

/// Exactly one of `result` / `error`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(ResponseBody),
    Error(String),
}

/// Worker → host reply to a single request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Echo of the request's kind string
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub id: String,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Result(_))
    }

    pub fn result(&self) -> Option<&ResponseBody> {
        match &self.outcome {
            Outcome::Result(body) => Some(body),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(message) => Some(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
enum ReadyTag {
    #[serde(rename = "ready")]
    Ready,
}

/// Unsolicited startup signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadySignal {
    #[serde(rename = "type")]
    kind: ReadyTag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Ready(ReadySignal),
    Response(Response),
}

impl OutboundMessage {
    pub fn ready() -> Self {
        OutboundMessage::Ready(ReadySignal {
            kind: ReadyTag::Ready,
        })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, OutboundMessage::Ready(_))
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            OutboundMessage::Ready(_) => None,
            OutboundMessage::Response(response) => Some(response),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(RequestKind::parse("decimate").unwrap(), RequestKind::Decimate);
        assert_eq!(RequestKind::parse("analyze").unwrap(), RequestKind::Analyze);
        assert_eq!(RequestKind::parse("filter").unwrap(), RequestKind::Filter);

        assert!(matches!(RequestKind::parse("process"), Err(Error::ReservedKind(_))));
        assert!(matches!(RequestKind::parse("Decimate"), Err(Error::UnknownKind(_))));
    }

    #[test]
    fn test_decode_filter_payload() {
        let data = json!({
            "points": [{"timestamp": 1, "value": 2.0}],
            "filterType": "kalman",
            "processNoise": 0.2
        });

        let Request::Filter(payload) = Request::decode("filter", data).unwrap() else {
            panic!("expected filter request");
        };
        assert_eq!(payload.filter_type, FilterKind::Kalman);
        assert_eq!(payload.process_noise, Some(0.2));
        assert_eq!(payload.measurement_noise, None);
        assert!(payload.handle.is_none());
    }

    #[test]
    fn test_decode_analyze_defaults() {
        let data = json!({ "points": [], "includeFft": false });
        let Request::Analyze(payload) = Request::decode("analyze", data).unwrap() else {
            panic!("expected analyze request");
        };
        assert!(!payload.include_fft);
        assert_eq!(payload.window, WindowFunction::None);
    }

    #[test]
    fn test_malformed_payload() {
        let missing = Request::decode("decimate", json!({ "points": [] }));
        assert!(matches!(missing, Err(Error::MalformedPayload(_))));

        let wrong_type = Request::decode(
            "analyze",
            json!({ "points": [{"timestamp": 0, "value": "x"}], "includeFft": true }),
        );
        assert!(matches!(wrong_type, Err(Error::MalformedPayload(_))));

        let no_fft_flag = Request::decode("analyze", json!({ "points": [] }));
        assert!(matches!(no_fft_flag, Err(Error::MalformedPayload(_))));

        let negative = Request::decode("decimate", json!({ "points": [], "threshold": -3 }));
        assert!(matches!(negative, Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn test_into_message_round_trip() {
        let request = Request::Decimate(DecimatePayload {
            points: vec![Sample::new(0, 1.0), Sample::new(1, 2.0)],
            threshold: 10,
        });

        let message = request.clone().into_message("req-7").unwrap();
        assert_eq!(message.kind, "decimate");
        assert_eq!(message.id, "req-7");
        assert_eq!(Request::decode(&message.kind, message.data).unwrap(), request);
    }

    #[test]
    fn test_inbound_from_json() {
        let message =
            InboundMessage::from_json(r#"{"type":"filter","data":{"points":[]},"id":"a1"}"#).unwrap();
        assert_eq!(message.kind, "filter");
        assert_eq!(message.id, "a1");

        assert!(InboundMessage::from_json(r#"{"type":"filter"}"#).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let ok = OutboundMessage::Response(Response {
            kind: "decimate".into(),
            outcome: Outcome::Result(ResponseBody::Decimate(vec![Sample::new(3, 4.0)])),
            id: "r1".into(),
        });
        let value: Value = serde_json::from_str(&ok.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({ "type": "decimate", "result": [{"timestamp": 3, "value": 4.0}], "id": "r1" })
        );

        let err = OutboundMessage::Response(Response {
            kind: "process".into(),
            outcome: Outcome::Error("nope".into()),
            id: "r2".into(),
        });
        let value: Value = serde_json::from_str(&err.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "process", "error": "nope", "id": "r2" }));
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_ready_wire_format() {
        let ready = OutboundMessage::ready();
        assert!(ready.is_ready());
        assert_eq!(ready.to_json().unwrap(), r#"{"type":"ready"}"#);
    }

    #[test]
    fn test_analysis_null_fields() {
        let body = ResponseBody::Analyze(AnalysisResult {
            statistics: None,
            fft: None,
        });
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({ "statistics": null, "fft": null }));
    }
}
