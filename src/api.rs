use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::analyzer::AnalyzerService;
use crate::models::RiskResult;

#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<AnalyzerService>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub domain: String,
}

/// REST surface over the analyzer. Requests that fail JSON schema
/// extraction are answered 422 by the Json extractor itself; an invalid
/// domain maps to 400; a completed analysis is always 200 whatever the
/// risk band.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analyze", post(analyze))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "webrisk",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<RiskResult>, (StatusCode, Json<serde_json::Value>)> {
    match state.analyzer.analyze(&payload.domain).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            log::warn!("rejected analyze request: {e}");
            Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}

/// Bind and serve until ctrl-c.
pub async fn serve(analyzer: AnalyzerService, listen: &str) -> anyhow::Result<()> {
    let state = AppState {
        analyzer: Arc::new(analyzer),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("API server listening on http://{listen}");
    log::info!("  POST /api/v1/analyze  {{\"domain\": \"example.com\"}}");
    log::info!("  GET  /api/v1/health");

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("shutdown signal received");
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;

    fn state() -> AppState {
        AppState {
            analyzer: Arc::new(AnalyzerService::new(RiskConfig::default())),
        }
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn analyze_rejects_invalid_domain_with_400() {
        let request = AnalyzeRequest {
            domain: "not a domain".to_string(),
        };

        let response = analyze(State(state()), Json(request)).await;
        let (status, Json(body)) = response.expect_err("invalid domain must be rejected");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
