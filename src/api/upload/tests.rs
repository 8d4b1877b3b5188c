use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::test_support::{self, TestContext};

const BOUNDARY: &str = "taskdesk-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_request(token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
                );
            }
            Part::File(file_name, contents) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(contents);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/upload/submit-task")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).expect("request")
}

async fn send(ctx: &TestContext, request: Request<Body>) -> (StatusCode, Value) {
    let response = ctx.app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

fn stored_files(ctx: &TestContext) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(ctx.uploads_dir.path())
        .expect("read uploads")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn create_task_for(ctx: &TestContext, assignee_id: &str) -> String {
    let admin = test_support::insert_admin(&ctx.store, "admin@example.com", "Admin").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/tasks",
            Some(&token),
            Some(json!({
                "title": "Lab report",
                "shortDescription": "Upload the report",
                "longDescription": "PDF only",
                "deadline": "2030-01-01T12:00:00Z",
                "assignedTo": [assignee_id]
            })),
        ))
        .await
        .expect("create task");
    assert_eq!(response.status(), StatusCode::CREATED);
    test_support::read_json(response).await["id"].as_str().expect("task id").to_string()
}

#[tokio::test]
async fn stores_file_under_submission_id() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(&ctx.store, "ada@example.com", "Ada").await;
    let task_id = create_task_for(&ctx, &student.id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let (status, body) = send(
        &ctx,
        multipart_request(
            Some(&token),
            &[
                Part::Text("userId", &student.id),
                Part::Text("taskId", &task_id),
                Part::Text("status", "completed"),
                Part::File("report.pdf", b"%PDF-1.4 fake report"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["message"], "Task submitted");
    let submission = &body["submission"];
    let id = submission["id"].as_str().expect("id");
    assert_eq!(submission["userId"], student.id.as_str());
    assert_eq!(submission["taskId"], task_id.as_str());
    assert_eq!(submission["status"], "completed");
    assert_eq!(submission["fileOriginalName"], "report.pdf");
    assert_eq!(submission["fileStoredName"], format!("{id}.pdf"));

    assert_eq!(stored_files(&ctx), vec![format!("{id}.pdf")]);
    let contents = std::fs::read(ctx.uploads_dir.path().join(format!("{id}.pdf"))).expect("stored file");
    assert_eq!(contents, b"%PDF-1.4 fake report");

    let recorded = ctx.store.submissions().await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].id, id);
}

#[tokio::test]
async fn user_id_defaults_to_caller() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_user(&ctx.store, "ada@example.com", "Ada").await;
    let task_id = create_task_for(&ctx, &student.id).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let (status, body) = send(
        &ctx,
        multipart_request(
            Some(&token),
            &[Part::File("notes.txt", b"notes"), Part::Text("taskId", &task_id)],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["submission"]["userId"], student.id.as_str());
}

#[tokio::test]
async fn anonymous_upload_is_rejected() {
    let ctx = test_support::setup_test_context().await;

    let (status, _) = send(
        &ctx,
        multipart_request(
            None,
            &[
                Part::Text("userId", "someone"),
                Part::Text("taskId", "task"),
                Part::File("report.pdf", b"data"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(stored_files(&ctx).is_empty());
}

#[tokio::test]
async fn submitting_for_another_user_is_forbidden() {
    let ctx = test_support::setup_test_context().await;
    let ada = test_support::insert_user(&ctx.store, "ada@example.com", "Ada").await;
    let bob = test_support::insert_user(&ctx.store, "bob@example.com", "Bob").await;
    let task_id = create_task_for(&ctx, &bob.id).await;
    let token = test_support::bearer_token(&ada.id, ctx.state.settings());

    let (status, body) = send(
        &ctx,
        multipart_request(
            Some(&token),
            &[
                Part::Text("userId", &bob.id),
                Part::Text("taskId", &task_id),
                Part::File("report.pdf", b"data"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN, "response: {body}");
    assert!(stored_files(&ctx).is_empty());
    assert!(ctx.store.submissions().await.is_empty());
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let ctx = test_support::setup_test_context().await;
    let ada = test_support::insert_user(&ctx.store, "ada@example.com", "Ada").await;
    let token = test_support::bearer_token(&ada.id, ctx.state.settings());

    let (status, body) = send(
        &ctx,
        multipart_request(
            Some(&token),
            &[Part::Text("taskId", "no-such-task"), Part::File("report.pdf", b"data")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND, "response: {body}");
    assert_eq!(body["detail"], "Task not found");
    assert!(stored_files(&ctx).is_empty());
}

#[tokio::test]
async fn missing_file_is_a_field_error() {
    let ctx = test_support::setup_test_context().await;
    let ada = test_support::insert_user(&ctx.store, "ada@example.com", "Ada").await;
    let token = test_support::bearer_token(&ada.id, ctx.state.settings());

    let (status, body) = send(&ctx, multipart_request(Some(&token), &[Part::Text("taskId", "task")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["errors"][0]["field"], "file");
}

#[tokio::test]
async fn oversized_file_leaves_nothing_behind() {
    let ctx = test_support::setup_test_context_with(|| std::env::set_var("MAX_UPLOAD_SIZE_MB", "1")).await;
    let ada = test_support::insert_user(&ctx.store, "ada@example.com", "Ada").await;
    let task_id = create_task_for(&ctx, &ada.id).await;
    let token = test_support::bearer_token(&ada.id, ctx.state.settings());
    let payload = vec![b'x'; 1024 * 1024 + 4096];

    let (status, body) = send(
        &ctx,
        multipart_request(
            Some(&token),
            &[Part::Text("taskId", &task_id), Part::File("big.bin", &payload)],
        ),
    )
    .await;

    assert!(status.is_client_error(), "status {status}, response: {body}");
    assert!(stored_files(&ctx).is_empty());
    assert!(ctx.store.submissions().await.is_empty());
}

#[tokio::test]
async fn open_intake_accepts_anonymous_uploads() {
    let ctx =
        test_support::setup_test_context_with(|| std::env::set_var("UPLOAD_REQUIRE_AUTH", "0")).await;

    let (status, body) = send(
        &ctx,
        multipart_request(
            None,
            &[
                Part::Text("userId", "legacy-user"),
                Part::Text("taskId", "legacy-task"),
                Part::File("scan.png", b"\x89PNG"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["submission"]["userId"], "legacy-user");
    assert_eq!(stored_files(&ctx).len(), 1);
}

#[tokio::test]
async fn open_intake_still_needs_a_user_id() {
    let ctx =
        test_support::setup_test_context_with(|| std::env::set_var("UPLOAD_REQUIRE_AUTH", "0")).await;

    let (status, body) = send(
        &ctx,
        multipart_request(None, &[Part::Text("taskId", "task"), Part::File("scan.png", b"data")]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["errors"][0]["field"], "userId");
    assert!(stored_files(&ctx).is_empty());
}

#[tokio::test]
async fn only_one_file_per_submission() {
    let ctx = test_support::setup_test_context().await;
    let ada = test_support::insert_user(&ctx.store, "ada@example.com", "Ada").await;
    let task_id = create_task_for(&ctx, &ada.id).await;
    let token = test_support::bearer_token(&ada.id, ctx.state.settings());

    let (status, body) = send(
        &ctx,
        multipart_request(
            Some(&token),
            &[
                Part::Text("taskId", &task_id),
                Part::File("a.pdf", b"first"),
                Part::File("b.pdf", b"second"),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    assert_eq!(body["detail"], "Only one file may be submitted");
    assert!(stored_files(&ctx).is_empty());
    assert!(ctx.store.submissions().await.is_empty());
}

#[tokio::test]
async fn unassigned_student_cannot_submit() {
    let ctx = test_support::setup_test_context().await;
    let ada = test_support::insert_user(&ctx.store, "ada@example.com", "Ada").await;
    let bob = test_support::insert_user(&ctx.store, "bob@example.com", "Bob").await;
    let task_id = create_task_for(&ctx, &bob.id).await;
    let token = test_support::bearer_token(&ada.id, ctx.state.settings());

    let (status, body) = send(
        &ctx,
        multipart_request(
            Some(&token),
            &[Part::Text("taskId", &task_id), Part::File("report.pdf", b"data")],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND, "response: {body}");
    assert!(stored_files(&ctx).is_empty());
    assert!(ctx.store.submissions().await.is_empty());
}
