use crate::error::{IngestError, Result};
use crate::types::RawResponse;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

/// Outcome of a single GET, before the envelope is decoded
#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// Blocking HTTP access used by the pipeline.
pub trait HttpSource: Send + Sync {
    /// Transport failures come back as `IngestError::Transport`.
    fn get(&self, url: &str) -> Result<HttpGetResult>;
}

pub struct ReqwestSource {
    client: reqwest::blocking::Client,
}

impl ReqwestSource {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| IngestError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl HttpSource for ReqwestSource {
    fn get(&self, url: &str) -> Result<HttpGetResult> {
        let resp = self.client.get(url).send()?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.bytes()?.to_vec();
        Ok(HttpGetResult { status, body, content_type })
    }
}

/// Issue one GET against `url` and decode the envelope. No retries.
#[instrument(skip(http))]
pub fn fetch(http: &dyn HttpSource, url: &str) -> Result<RawResponse> {
    let url = url.trim();
    if url.is_empty() {
        return Err(IngestError::MissingSource);
    }

    let resp = http.get(url)?;
    debug!(
        status = resp.status,
        bytes = resp.body.len(),
        content_type = resp.content_type.as_deref().unwrap_or("-"),
        "Received response"
    );
    if resp.status != 200 {
        return Err(IngestError::HttpStatus { status: resp.status });
    }

    decode_envelope(&resp.body)
}

/// The body must be a JSON object; its fields are checked by `validate`.
pub fn decode_envelope(body: &[u8]) -> Result<RawResponse> {
    let map: Map<String, Value> = serde_json::from_slice(body)?;
    Ok(RawResponse::from_map(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedSource {
        result: Mutex<Option<Result<HttpGetResult>>>,
        calls: Mutex<Vec<String>>,
    }

    impl CannedSource {
        fn new(result: Result<HttpGetResult>) -> Self {
            Self {
                result: Mutex::new(Some(result)),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn ok(status: u16, body: &str) -> Self {
            Self::new(Ok(HttpGetResult {
                status,
                body: body.as_bytes().to_vec(),
                content_type: Some("application/json".to_string()),
            }))
        }
    }

    impl HttpSource for CannedSource {
        fn get(&self, url: &str) -> Result<HttpGetResult> {
            self.calls.lock().unwrap().push(url.to_string());
            self.result.lock().unwrap().take().expect("called more than once")
        }
    }

    #[test]
    fn test_empty_source_is_rejected_before_any_request() {
        let http = CannedSource::ok(200, "{}");
        let err = fetch(&http, "   ").unwrap_err();
        assert!(matches!(err, IngestError::MissingSource));
        assert!(http.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_200_is_http_status_error() {
        let http = CannedSource::ok(503, r#"{"status":"success","readings":[]}"#);
        let err = fetch(&http, "http://sensors.local/api").unwrap_err();
        assert!(matches!(err, IngestError::HttpStatus { status: 503 }));
    }

    #[test]
    fn test_unparseable_body_is_decode_error() {
        let http = CannedSource::ok(200, "<html>oops</html>");
        let err = fetch(&http, "http://sensors.local/api").unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));
    }

    #[test]
    fn test_non_object_body_is_decode_error() {
        let http = CannedSource::ok(200, r#"["success", null, [1, 2]]"#);
        let err = fetch(&http, "http://sensors.local/api").unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));
    }

    #[test]
    fn test_malformed_fields_survive_decoding() {
        let env = decode_envelope(br#"{"status":false,"message":{"code":7},"readings":{}}"#)
            .unwrap();
        assert_eq!(env.status, Some(serde_json::json!(false)));
        assert_eq!(env.readings, Some(serde_json::json!({})));
    }

    #[test]
    fn test_transport_error_is_passed_through() {
        let http = CannedSource::new(Err(IngestError::Transport("connection refused".into())));
        let err = fetch(&http, "http://sensors.local/api").unwrap_err();
        assert!(matches!(err, IngestError::Transport(_)));
    }

    #[test]
    fn test_success_decodes_envelope() {
        let http = CannedSource::ok(
            200,
            r#"{"status":"success","readings":[{"timestamp":"2024-01-01T00:00:00","x":1}]}"#,
        );
        let env = fetch(&http, " http://sensors.local/api ").unwrap();
        assert_eq!(env.status, Some(Value::from("success")));
        assert_eq!(env.readings.and_then(|r| r.as_array().map(Vec::len)), Some(1));
        assert_eq!(http.calls.lock().unwrap()[0], "http://sensors.local/api");
    }
}
