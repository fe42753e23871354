//! End-to-end scenarios for the application workflow, driven through the public HTTP router
//! with tokens issued at sign-up.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use job_board::board::{board_router, BoardState, InMemoryStore};
    use job_board::identity::TokenKeys;

    pub(super) fn router() -> Router {
        let keys = Arc::new(TokenKeys::from_secret(
            b"integration-secret",
            Duration::minutes(10),
        ));
        board_router(BoardState::new(Arc::new(InMemoryStore::new()), keys))
    }

    pub(super) async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("json body"))),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("route executes");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json payload")
        };
        (status, payload)
    }

    /// Registers an account and returns its bearer token.
    pub(super) async fn sign_up(router: &Router, email: &str, role: &str) -> String {
        let (status, payload) = call(
            router,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "email": email,
                "firstName": "Test",
                "lastName": "Account",
                "role": role,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{payload}");
        payload["token"].as_str().expect("token").to_string()
    }

    pub(super) async fn post_job(router: &Router, token: &str, title: &str) -> u64 {
        let (status, payload) = call(
            router,
            "POST",
            "/api/jobs/create",
            Some(token),
            Some(json!({
                "title": title,
                "description": "Own the hiring platform APIs",
                "company": "Acme",
                "location": "Remote",
                "salary": 90000.0,
                "jobType": "FULL_TIME",
                "experienceLevel": "SENIOR",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{payload}");
        assert_eq!(payload["isActive"], true);
        payload["id"].as_u64().expect("job id")
    }

    pub(super) async fn apply(router: &Router, token: &str, job: u64) -> (StatusCode, Value) {
        call(
            router,
            "POST",
            "/api/job-seeker/apply",
            Some(token),
            Some(json!({ "jobId": job, "coverLetter": "I am interested" })),
        )
        .await
    }
}

use axum::http::StatusCode;
use serde_json::json;

use common::{apply, call, post_job, router, sign_up};

#[tokio::test]
async fn seeker_applies_once_to_an_active_posting() {
    let router = router();
    let provider = sign_up(&router, "hiring@acme.test", "JOB_PROVIDER").await;
    let seeker = sign_up(&router, "sam@mail.test", "JOB_SEEKER").await;
    let job = post_job(&router, &provider, "Backend Engineer").await;

    let (status, application) = apply(&router, &seeker, job).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["status"], "APPLIED");
    assert_eq!(application["coverLetter"], "I am interested");
    assert!(application["appliedAt"].is_string());

    let (status, applied) = call(
        &router,
        "GET",
        &format!("/api/job-seeker/jobs/{job}/applied"),
        Some(&seeker),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(applied["hasApplied"], true);

    let (status, rejection) = apply(&router, &seeker, job).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(rejection["error"], "You have already applied for this job");
}

#[tokio::test]
async fn withdrawn_application_cannot_be_adjudicated() {
    let router = router();
    let provider = sign_up(&router, "hiring@acme.test", "JOB_PROVIDER").await;
    let seeker = sign_up(&router, "sam@mail.test", "JOB_SEEKER").await;
    let job = post_job(&router, &provider, "Backend Engineer").await;
    let (_, application) = apply(&router, &seeker, job).await;
    let id = application["id"].as_u64().expect("application id");
    let status_uri = format!("/api/provider/applications/{id}/status");

    let (status, shortlisted) = call(
        &router,
        "PUT",
        &status_uri,
        Some(&provider),
        Some(json!({ "status": "SHORTLISTED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shortlisted["status"], "SHORTLISTED");

    let (status, withdrawn) = call(
        &router,
        "PUT",
        &format!("/api/job-seeker/applications/{id}/withdraw"),
        Some(&seeker),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(withdrawn["status"], "WITHDRAWN");

    let (status, rejection) = call(
        &router,
        "PUT",
        &status_uri,
        Some(&provider),
        Some(json!({ "status": "OFFERED" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        rejection["error"],
        "Cannot update status of withdrawn application"
    );
}

#[tokio::test]
async fn inactive_postings_refuse_applications() {
    let router = router();
    let provider = sign_up(&router, "hiring@acme.test", "JOB_PROVIDER").await;
    let seeker = sign_up(&router, "sam@mail.test", "JOB_SEEKER").await;
    let job = post_job(&router, &provider, "Backend Engineer").await;

    let (status, _) = call(
        &router,
        "DELETE",
        &format!("/api/jobs/{job}"),
        Some(&provider),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, rejection) = apply(&router, &seeker, job).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(rejection["error"], "This job is no longer active");

    let (status, owned) = call(&router, "GET", "/api/jobs/my-jobs", Some(&provider), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owned.as_array().map(Vec::len), Some(1));
    assert_eq!(owned[0]["isActive"], false);
}

#[tokio::test]
async fn unrelated_seekers_cannot_view_applications() {
    let router = router();
    let provider = sign_up(&router, "hiring@acme.test", "JOB_PROVIDER").await;
    let seeker = sign_up(&router, "sam@mail.test", "JOB_SEEKER").await;
    let bystander = sign_up(&router, "alex@mail.test", "JOB_SEEKER").await;
    let job = post_job(&router, &provider, "Backend Engineer").await;
    let (_, application) = apply(&router, &seeker, job).await;
    let uri = format!(
        "/api/job-seeker/applications/{}",
        application["id"].as_u64().expect("application id")
    );

    let (status, rejection) = call(&router, "GET", &uri, Some(&bystander), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(rejection["kind"], "forbidden");

    let (status, own) = call(&router, "GET", &uri, Some(&seeker), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own["jobTitle"], "Backend Engineer");
}

#[tokio::test]
async fn counts_match_listings_for_both_roles() {
    let router = router();
    let provider = sign_up(&router, "hiring@acme.test", "JOB_PROVIDER").await;
    let seeker = sign_up(&router, "sam@mail.test", "JOB_SEEKER").await;
    for title in ["Backend Engineer", "Data Engineer", "Platform Engineer"] {
        let job = post_job(&router, &provider, title).await;
        apply(&router, &seeker, job).await;
    }

    for (token, prefix) in [(&seeker, "/api/job-seeker"), (&provider, "/api/provider")] {
        for filter in ["", "?status=APPLIED", "?status=WITHDRAWN"] {
            let (_, listing) = call(
                &router,
                "GET",
                &format!("{prefix}/applications{filter}"),
                Some(token),
                None,
            )
            .await;
            let (_, count) = call(
                &router,
                "GET",
                &format!("{prefix}/applications/count{filter}"),
                Some(token),
                None,
            )
            .await;
            let listed = listing.as_array().map(Vec::len).expect("listing array");
            assert_eq!(count["count"].as_u64(), Some(listed as u64), "{prefix}{filter}");
        }
    }
}
