//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;
use super::types::{
    AnalyzeInvoicesRequest, AnalyzeInvoicesResponse, CompensatorsResponse, ErrorResponse,
    HealthResponse,
};
use crate::error::CalcError;
use crate::recommend::CalculationResult;
use crate::types::MeteringRecord;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Every engine error is a caller error: bad or missing input.
fn bad_request(err: CalcError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// `GET /api/health` → 200 + `HealthResponse`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        catalog_size: state.recommender.list_devices().len(),
    })
}

/// `GET /api/compensators` → 200 + catalog listing
pub async fn list_compensators(State(state): State<Arc<AppState>>) -> Json<CompensatorsResponse> {
    Json(CompensatorsResponse {
        compensators: state.recommender.list_devices().to_vec(),
    })
}

/// Manual calculation for one record.
///
/// `POST /api/calculate` → 200 + `CalculationResult`, or 400 + `ErrorResponse`
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(record): Json<MeteringRecord>,
) -> Result<Json<CalculationResult>, ApiError> {
    state
        .recommender
        .compute(&record)
        .map(Json)
        .map_err(bad_request)
}

/// Aggregated calculation over extraction outcomes.
///
/// `POST /api/analyze-invoices` → 200 + `AnalyzeInvoicesResponse`, or 400
pub async fn analyze_invoices(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeInvoicesRequest>,
) -> Result<Json<AnalyzeInvoicesResponse>, ApiError> {
    let succeeded = req.invoices.iter().filter(|o| o.is_success()).count();
    let failed = req.invoices.len() - succeeded;
    let result = state
        .recommender
        .compute_from_extractions(&req.invoices, req.has_photovoltaic)
        .map_err(bad_request)?;
    Ok(Json(AnalyzeInvoicesResponse {
        succeeded,
        failed,
        result,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::recommend::Recommender;

    fn make_test_state() -> Arc<AppState> {
        Arc::new(AppState {
            recommender: Recommender::default(),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_returns_200() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["catalog_size"], 8);
    }

    #[tokio::test]
    async fn compensators_are_listed_ascending() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/api/compensators")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        let list = json["compensators"].as_array().unwrap();
        assert_eq!(list.len(), 8);
        assert_eq!(list[0]["rating_kvar"], 5);
        assert_eq!(list[7]["model_name"], "LOPI LKD 50 PRO");
    }

    #[tokio::test]
    async fn calculate_returns_recommendation() {
        let app = router(make_test_state());
        let body = r#"{ "reactive_energy_kwh": 1000.0, "billing_months": 2,
                        "power_factor_tangent": 0.5 }"#;
        let resp = app.oneshot(post_json("/api/calculate", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["rating_kvar"], 5);
        assert_eq!(json["data_source"], "manual");
        assert_eq!(json["invoice_count"], 1);
        assert!(json.get("calculation").is_some());
    }

    #[tokio::test]
    async fn calculate_missing_tangent_returns_400() {
        let app = router(make_test_state());
        let body = r#"{ "reactive_energy_kwh": 1000.0, "billing_months": 2 }"#;
        let resp = app.oneshot(post_json("/api/calculate", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("power_factor_tangent"));
    }

    #[tokio::test]
    async fn calculate_zero_months_returns_400() {
        let app = router(make_test_state());
        let body = r#"{ "reactive_energy_kwh": 10.0, "billing_months": 0,
                        "power_factor_tangent": 0.5 }"#;
        let resp = app.oneshot(post_json("/api/calculate", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analyze_invoices_counts_outcomes() {
        let app = router(make_test_state());
        let body = r#"{
            "has_photovoltaic": false,
            "invoices": [
                { "status": "extracted", "source": "jan.pdf",
                  "invoice": { "reactive_energy_kwh": 800.0, "billing_months": 1,
                               "power_factor_tangent": 0.6 } },
                { "status": "extracted", "source": "feb.pdf",
                  "invoice": { "reactive_energy_kwh": 200.0, "billing_months": 1,
                               "power_factor_tangent": 0.4 } },
                { "status": "failed", "source": "mar.jpg", "reason": "unreadable" }
            ]
        }"#;
        let resp = app
            .oneshot(post_json("/api/analyze-invoices", body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["succeeded"], 2);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["result"]["data_source"], "aggregated");
        assert_eq!(json["result"]["invoice_count"], 2);
        assert_eq!(json["result"]["input"]["billing_months"], 2);
    }

    #[tokio::test]
    async fn analyze_all_failed_returns_400() {
        let app = router(make_test_state());
        let body = r#"{ "invoices": [ { "status": "failed", "reason": "blurry" } ] }"#;
        let resp = app
            .oneshot(post_json("/api/analyze-invoices", body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert!(json["error"].as_str().unwrap().contains("1 of 1"));
    }
}
