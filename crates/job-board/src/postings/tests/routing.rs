use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::accounts::{Actor, ACCOUNT_ID_HEADER, ACCOUNT_ROLE_HEADER};

fn company_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(ACCOUNT_ID_HEADER, "10")
        .header(ACCOUNT_ROLE_HEADER, "company")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn create_route_returns_created_view() {
    let (service, _) = build_service();
    let mut body = serde_json::to_value(valid_form()).expect("form serializes");
    body["publish"] = json!(true);

    let response = router_for(service)
        .oneshot(company_request("POST", "/api/v1/jobs", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["id"], 1);
    assert_eq!(payload["status"], "published");
    assert_eq!(payload["employment_type"], "internship");
}

#[tokio::test]
async fn create_route_returns_validation_messages() {
    let (service, _) = build_service();
    let body = json!({
        "title": "Graphic Designer",
        "salary": { "min": 50000, "max": 30000 },
        "deadline": "2026-03-01"
    });

    let response = router_for(service)
        .oneshot(company_request("POST", "/api/v1/jobs", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    let errors: Vec<String> =
        serde_json::from_value(payload["errors"].clone()).expect("error list");
    assert!(errors.contains(&"Min Salary should be less than Max Salary".to_string()));
    assert!(errors.contains(&"Deadline must be today or a future date".to_string()));
    assert!(errors.contains(&"Overview is required".to_string()));
}

#[tokio::test]
async fn validate_route_reports_without_storing() {
    let (service, repository) = build_service();

    let response = router_for(service)
        .oneshot(
            Request::post("/api/v1/jobs/validate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "location": "Bangkok" }).to_string()))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["valid"], false);
    assert!(payload["errors"]
        .as_array()
        .expect("errors list")
        .contains(&json!("Title is required")));
    assert!(crate::postings::JobPostingRepository::list(repository.as_ref())
        .expect("list succeeds")
        .is_empty());
}

#[tokio::test]
async fn malformed_values_are_reported_as_messages() {
    let (service, repository) = build_service();
    let app = router_for(service);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/jobs/validate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "title": "X", "deadline": "2026-13-45" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["valid"], false);
    let errors = payload["errors"].as_array().expect("errors list");
    assert!(errors.contains(&json!("Deadline must be a valid date")));
    assert!(errors.contains(&json!("Location is required")));
    assert!(errors.contains(&json!("Salary is required")));

    let body = json!({
        "title": "Graphic Designer",
        "salary": { "min": false, "max": 60000 },
        "deadline": "not a date"
    });
    let response = app
        .oneshot(company_request("POST", "/api/v1/jobs", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    let errors: Vec<String> =
        serde_json::from_value(payload["errors"].clone()).expect("error list");
    assert!(errors.contains(&"Min Salary must be a number".to_string()));
    assert!(errors.contains(&"Deadline must be a valid date".to_string()));
    assert!(crate::postings::JobPostingRepository::list(repository.as_ref())
        .expect("list succeeds")
        .is_empty());
}

#[tokio::test]
async fn search_route_applies_query_criteria() {
    let (service, _) = build_service();
    service
        .create(&Actor::company(10), valid_form(), true)
        .expect("stored");
    let mut remote = valid_form();
    remote.title = Some("Data Analyst".to_string());
    remote.arrangement = Some("remote".to_string());
    remote.location = Some("Phuket".to_string());
    service
        .create(&Actor::company(10), remote, true)
        .expect("stored");

    let response = router_for(service.clone())
        .oneshot(
            Request::get("/api/v1/jobs?keyword=graphic&location=Bangkok&min_salary=30000&date_post=today")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["count"], 1);
    assert_eq!(payload["jobs"][0]["title"], "Graphic Designer");

    let response = router_for(service)
        .oneshot(
            Request::get("/api/v1/jobs?location=Chiang%20Mai")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await["count"], 0);
}

#[tokio::test]
async fn fetch_route_hides_drafts_from_anonymous_callers() {
    let (service, _) = build_service();
    let draft = service
        .create(&Actor::company(10), valid_form(), false)
        .expect("draft stored");
    let uri = format!("/api/v1/jobs/{}", draft.id);

    let anonymous = router_for(service.clone())
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .expect("route executes");
    assert_eq!(anonymous.status(), StatusCode::NOT_FOUND);

    let owner = router_for(service)
        .oneshot(
            Request::get(uri.as_str())
                .header(ACCOUNT_ID_HEADER, "10")
                .header(ACCOUNT_ROLE_HEADER, "company")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(owner.status(), StatusCode::OK);
    assert_eq!(read_json_body(owner).await["status"], "draft");
}

#[tokio::test]
async fn publish_and_delete_routes_require_ownership() {
    let (service, _) = build_service();
    let draft = service
        .create(&Actor::company(10), valid_form(), false)
        .expect("draft stored");

    let response = router_for(service.clone())
        .oneshot(
            Request::post(format!("/api/v1/jobs/{}/publish", draft.id))
                .header(ACCOUNT_ID_HEADER, "11")
                .header(ACCOUNT_ROLE_HEADER, "company")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router_for(service.clone())
        .oneshot(company_request(
            "POST",
            &format!("/api/v1/jobs/{}/publish", draft.id),
            json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["published"], true);

    let response = router_for(service.clone())
        .oneshot(company_request(
            "DELETE",
            &format!("/api/v1/jobs/{}", draft.id),
            json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router_for(service)
        .oneshot(
            Request::get("/api/v1/companies/me/jobs")
                .header(ACCOUNT_ID_HEADER, "10")
                .header(ACCOUNT_ROLE_HEADER, "company")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
}
