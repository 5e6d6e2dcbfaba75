use crate::infra::{AppState, Board};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use job_board::applications::application_router;
use job_board::documents::document_router;
use job_board::notifications::notification_router;
use job_board::postings::posting_router;
use serde_json::json;

/// Domain routers merged with the health and metrics endpoints.
pub(crate) fn with_board_routes(board: &Board) -> axum::Router {
    posting_router(board.postings.clone())
        .merge(application_router(board.applications.clone()))
        .merge(notification_router(board.notifications.clone()))
        .merge(document_router(board.documents.clone()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use job_board::accounts::{ACCOUNT_ID_HEADER, ACCOUNT_ROLE_HEADER};
    use job_board::clock::FixedClock;
    use job_board::config::BoardConfig;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn board() -> Board {
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        ));
        Board::in_memory(&BoardConfig::default(), clock).expect("board builds")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn merged_router_serves_every_domain() {
        let board = board();
        let app = with_board_routes(&board);

        let post_job = Request::post("/api/v1/jobs")
            .header(header::CONTENT_TYPE, "application/json")
            .header(ACCOUNT_ID_HEADER, "10")
            .header(ACCOUNT_ROLE_HEADER, "company")
            .body(Body::from(
                json!({
                    "title": "Graphic Designer",
                    "category": ["Design"],
                    "location": "Bangkok",
                    "type": "internship",
                    "arrangement": "onsite",
                    "salary": { "min": 30000, "max": 60000 },
                    "deadline": "2026-04-01",
                    "skills": ["Figma"],
                    "description": {
                        "overview": "Brand work",
                        "responsibility": "Assets",
                        "requirement": "Portfolio",
                        "qualification": "Design student"
                    },
                    "publish": true
                })
                .to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(post_job).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);

        let apply = Request::post("/api/v1/jobs/1/applications")
            .header(ACCOUNT_ID_HEADER, "20")
            .header(ACCOUNT_ROLE_HEADER, "student")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(apply).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);

        let advance = Request::patch("/api/v1/applications/1/status")
            .header(header::CONTENT_TYPE, "application/json")
            .header(ACCOUNT_ID_HEADER, "10")
            .header(ACCOUNT_ROLE_HEADER, "company")
            .body(Body::from(r#"{"status":"interview"}"#))
            .unwrap();
        let response = app.clone().oneshot(advance).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let feed = Request::get("/api/v1/notifications")
            .header(ACCOUNT_ID_HEADER, "20")
            .header(ACCOUNT_ROLE_HEADER, "student")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(feed).await.expect("route executes");
        let payload = json_body(response).await;
        assert_eq!(payload["unread"], 1);
        assert_eq!(
            payload["notifications"][0]["message"],
            "Your application for Graphic Designer is now interview"
        );

        let upload = Request::post("/api/v1/documents?kind=resume&filename=cv.pdf")
            .header(ACCOUNT_ID_HEADER, "20")
            .header(ACCOUNT_ROLE_HEADER, "student")
            .body(Body::from("%PDF-1.7 resume"))
            .unwrap();
        let response = app.clone().oneshot(upload).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        let receipt = json_body(response).await;
        let url = receipt["link"]["url"].as_str().expect("signed url").to_string();

        let download = Request::get(url).body(Body::empty()).unwrap();
        let response = app.oneshot(download).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
    }

    #[tokio::test]
    async fn tampered_document_links_are_refused() {
        let app = with_board_routes(&board());

        let response = app
            .oneshot(
                Request::get("/api/v1/documents/doc-000001?expires=1900000000&signature=00ff")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
