use crate::config::{ServerConfig, SourceConfig};
use crate::dashboard::Dashboard;
use crate::error::{IngestError, Result};
use crate::pipeline::IngestionPipeline;
use crate::views::AnalysisSelector;
use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use hyper::Server;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Builds a fresh pipeline for each request
pub type PipelineFactory = Arc<dyn Fn() -> Result<IngestionPipeline> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pipelines: PipelineFactory,
    default_source: Option<String>,
}

impl AppState {
    pub fn new(pipelines: PipelineFactory, default_source: Option<String>) -> Self {
        Self { pipelines, default_source }
    }

    pub fn from_config(source: &SourceConfig) -> Self {
        let cfg = source.clone();
        Self::new(
            Arc::new(move || IngestionPipeline::from_config(&cfg)),
            source.api_url.clone(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    pub api: Option<String>,
    pub view: Option<String>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sensor-analytics",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_text() -> Response {
    match crate::metrics::render() {
        Some(body) => body.into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// One dashboard page: the source arrives as `?api=`, the view as `?view=`
async fn analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Response {
    let selector = match params.view.as_deref() {
        None => AnalysisSelector::default(),
        Some(raw) => match raw.parse::<AnalysisSelector>() {
            Ok(sel) => sel,
            Err(message) => return error_body(StatusCode::BAD_REQUEST, "invalid_view", message),
        },
    };
    let source = params.api.or(state.default_source.clone());

    // The pipeline is synchronous; keep it off the async workers
    let pipelines = state.pipelines.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let pipeline = (*pipelines)()?;
        let dashboard = Dashboard::load(&pipeline, source.as_deref())?;
        Ok::<_, IngestError>(dashboard.report(selector))
    })
    .await;

    match joined {
        Ok(Ok(report)) => Json(report).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            warn!("Analytics task failed: {}", e);
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "An unexpected error occurred".to_string(),
            )
        }
    }
}

pub fn status_for(err: &IngestError) -> StatusCode {
    if err.is_advisory() {
        return StatusCode::OK;
    }
    match err {
        IngestError::MissingSource => StatusCode::BAD_REQUEST,
        IngestError::Transport(_)
        | IngestError::HttpStatus { .. }
        | IngestError::Decode(_)
        | IngestError::Api { .. } => StatusCode::BAD_GATEWAY,
        IngestError::EmptyData | IngestError::EmptyFilterResult { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        IngestError::Config(_) | IngestError::Toml(_) | IngestError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &IngestError) -> Response {
    error_body(status_for(err), err.kind(), err.user_message())
}

fn error_body(status: StatusCode, kind: &str, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({
            "status": "error",
            "kind": kind,
            "message": message,
        })),
    )
        .into_response()
}

pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/analytics", get(analytics))
        .route("/metrics", get(metrics_text))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server and block until it stops
pub async fn start_server(
    server: &ServerConfig,
    state: AppState,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_server(state);
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;

    info!("HTTP server listening on {}", addr);
    println!("🚀 Sensor analytics running on http://localhost:{}", server.port);
    println!("💚 Health check: http://localhost:{}/health", server.port);
    println!(
        "📊 Analytics:    http://localhost:{}/analytics?api=<url>&view=overview",
        server.port
    );

    Server::bind(&addr).serve(app.into_make_service()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{HttpGetResult, HttpSource};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const BODY: &str = r#"{"status":"success","readings":[
        {"timestamp":"2024-01-01T00:00:00","x":"1.5","y":"2","z":"bad","label":"bump"},
        {"timestamp":"2024-01-01T00:00:01","x":"3","y":"4","z":"5","label":"pothole"}
    ]}"#;

    struct Canned(u16, &'static str);

    impl HttpSource for Canned {
        fn get(&self, _url: &str) -> Result<HttpGetResult> {
            Ok(HttpGetResult {
                status: self.0,
                body: self.1.as_bytes().to_vec(),
                content_type: None,
            })
        }
    }

    fn app(status: u16, body: &'static str) -> Router {
        let factory: PipelineFactory =
            Arc::new(move || Ok(IngestionPipeline::new(Box::new(Canned(status, body)))));
        create_server(AppState::new(factory, None))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(200, BODY), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_analytics_renders_selected_view() {
        let (status, body) =
            get_json(app(200, BODY), "/analytics?api=http://sensors.local&view=bump").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["view"], "bump");
        assert_eq!(body["analysis"]["rows"], 1);
        assert_eq!(body["rows"].as_array().map(|r| r.len()), Some(2));
        assert_eq!(body["rows"][0]["z"], Value::Null);
    }

    #[tokio::test]
    async fn test_missing_api_param_is_bad_request() {
        let (status, body) = get_json(app(200, BODY), "/analytics").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "missing_source");
    }

    #[tokio::test]
    async fn test_unknown_view_is_bad_request() {
        let (status, body) =
            get_json(app(200, BODY), "/analytics?api=http://sensors.local&view=speedbump").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_view");
    }

    #[tokio::test]
    async fn test_upstream_failures_map_to_bad_gateway() {
        let (status, body) = get_json(app(500, "boom"), "/analytics?api=http://sensors.local").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "Failed to fetch data. Status Code: 500");

        let (status, body) = get_json(
            app(200, r#"{"status":"success","readings":[]}"#),
            "/analytics?api=http://sensors.local",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "empty_data");
    }

    #[test]
    fn test_advisory_errors_are_not_failures() {
        let skipped = IngestError::EmptyFilterResult { label: "pothole".into() };
        assert_eq!(status_for(&skipped), StatusCode::OK);
        assert_eq!(status_for(&IngestError::EmptyData), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
