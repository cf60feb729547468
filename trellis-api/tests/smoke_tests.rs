//! End-to-end smoke tests for the Trellis API router

use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::json;
use trellis_api::{create_api_router, AuthConfig};
use trellis_core::ConversationId;

#[path = "support/http.rs"]
mod test_http_support;
#[path = "support/state.rs"]
mod test_state_support;

use test_http_support::{bearer, send, test_auth_config};
use test_state_support::{test_state, MENTEE, MENTOR};

struct Harness {
    app: Router,
    config: AuthConfig,
    conversation_id: ConversationId,
}

impl Harness {
    fn new() -> Self {
        let (state, conversation_id) = test_state();
        let config = test_auth_config();
        let app = create_api_router(state, config.clone()).expect("router");
        Self {
            app,
            config,
            conversation_id,
        }
    }

    fn base(&self) -> String {
        format!("/api/v1/conversations/{}", self.conversation_id)
    }

    fn auth(&self, user: &str) -> String {
        bearer(&self.config, user)
    }

    async fn create_acme(&self) -> serde_json::Value {
        let (status, row) = send(
            &self.app,
            Method::POST,
            &format!("{}/applications", self.base()),
            Some(&self.auth(MENTEE)),
            Some(json!({ "cells": { "company": "Acme", "position": "SWE", "status": "Applied" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", row);
        row
    }
}

#[tokio::test]
async fn smoke_test_health_is_public() {
    let h = Harness::new();
    let (status, body) = send(&h.app, Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn smoke_test_requires_bearer_token() {
    let h = Harness::new();
    let (status, body) = send(&h.app, Method::GET, &format!("{}/board", h.base()), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn smoke_test_outsider_is_forbidden() {
    let h = Harness::new();
    let (status, _) = send(
        &h.app,
        Method::GET,
        &format!("{}/board", h.base()),
        Some(&h.auth("stranger")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn smoke_test_default_board_then_create_row() {
    let h = Harness::new();
    let (status, board) = send(
        &h.app,
        Method::GET,
        &format!("{}/board", h.base()),
        Some(&h.auth(MENTOR)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = board["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .filter_map(|c| c["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["company", "dateApplied", "position", "status", "notes"]);

    let row = h.create_acme().await;
    assert_eq!(row["cells"]["company"], "Acme");
    assert_eq!(row["history"], json!([]));
}

#[tokio::test]
async fn smoke_test_create_without_required_is_rejected() {
    let h = Harness::new();
    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("{}/applications", h.base()),
        Some(&h.auth(MENTEE)),
        Some(json!({ "cells": { "company": "Acme" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn smoke_test_edit_records_history_and_undo_restores() {
    let h = Harness::new();
    let row = h.create_acme().await;
    let id = row["applicationId"].as_str().expect("id").to_string();
    let uri = format!("{}/applications/{}", h.base(), id);

    let (status, edited) = send(
        &h.app,
        Method::PATCH,
        &uri,
        Some(&h.auth(MENTOR)),
        Some(json!({ "cells": { "status": "Interview", "company": "Acme" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["changes"], json!({ "status": "Interview" }));
    assert_eq!(edited["application"]["history"].as_array().map(Vec::len), Some(1));
    assert_eq!(edited["application"]["history"][0]["changedBy"], "mentor");

    let (status, undone) = send(&h.app, Method::POST, &format!("{}/undo", uri), Some(&h.auth(MENTEE)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(undone["field"], "status");
    assert_eq!(undone["newValue"], "Applied");

    let (_, history) = send(&h.app, Method::GET, &format!("{}/history", uri), Some(&h.auth(MENTEE)), None).await;
    assert_eq!(history["total"], 2);
    assert_eq!(history["items"][0]["oldValue"], "Interview");
}

#[tokio::test]
async fn smoke_test_undo_without_history_fails() {
    let h = Harness::new();
    let row = h.create_acme().await;
    let id = row["applicationId"].as_str().expect("id").to_string();
    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("{}/applications/{}/undo", h.base(), id),
        Some(&h.auth(MENTEE)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn smoke_test_suggestion_accept_flow() {
    let h = Harness::new();
    let row = h.create_acme().await;
    let id = row["applicationId"].as_str().expect("id").to_string();

    let (status, suggestion) = send(
        &h.app,
        Method::POST,
        &format!("{}/suggestions", h.base()),
        Some(&h.auth(MENTOR)),
        Some(json!({
            "applicationId": id,
            "field": "notes",
            "oldValue": null,
            "proposedValue": "Follow up Friday"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "suggestion failed: {}", suggestion);
    assert_eq!(suggestion["status"], "pending");
    let sid = suggestion["suggestionId"].as_str().expect("sid").to_string();

    let (status, _) = send(
        &h.app,
        Method::POST,
        &format!("/api/v1/suggestions/{}/accept", sid),
        Some(&h.auth(MENTOR)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resolved) = send(
        &h.app,
        Method::POST,
        &format!("/api/v1/suggestions/{}/accept", sid),
        Some(&h.auth(MENTEE)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["suggestion"]["status"], "accepted");
    assert_eq!(resolved["application"]["cells"]["notes"], "Follow up Friday");
    assert_eq!(resolved["application"]["history"][0]["changedBy"], "mentee");

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/v1/suggestions/{}/reject", sid),
        Some(&h.auth(MENTEE)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "STATE_CONFLICT");
}

#[tokio::test]
async fn smoke_test_stale_suggestion_conflicts() {
    let h = Harness::new();
    let row = h.create_acme().await;
    let id = row["applicationId"].as_str().expect("id").to_string();

    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("{}/suggestions", h.base()),
        Some(&h.auth(MENTOR)),
        Some(json!({
            "applicationId": id,
            "field": "status",
            "oldValue": "Interview",
            "proposedValue": "Offer"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "STALE_STATE");
}

#[tokio::test]
async fn smoke_test_pagination_bounds() {
    let h = Harness::new();
    for _ in 0..3 {
        h.create_acme().await;
    }
    let list = format!("{}/applications", h.base());

    let (status, page) = send(&h.app, Method::GET, &format!("{}?page=2&limit=2", list), Some(&h.auth(MENTOR)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(&h.app, Method::GET, &format!("{}?limit=101", list), Some(&h.auth(MENTOR)), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&h.app, Method::GET, &format!("{}?page=0", list), Some(&h.auth(MENTOR)), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn smoke_test_add_column_then_edit_it() {
    let h = Harness::new();
    let row = h.create_acme().await;
    let id = row["applicationId"].as_str().expect("id").to_string();

    let (status, column) = send(
        &h.app,
        Method::POST,
        &format!("{}/board/columns", h.base()),
        Some(&h.auth(MENTOR)),
        Some(json!({ "name": "Salary", "type": "number" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add column failed: {}", column);
    assert_eq!(column["key"], "salary");

    let (status, body) = send(
        &h.app,
        Method::PATCH,
        &format!("{}/applications/{}", h.base(), id),
        Some(&h.auth(MENTEE)),
        Some(json!({ "cells": { "salary": "a lot" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "salary");

    let (status, edited) = send(
        &h.app,
        Method::PATCH,
        &format!("{}/applications/{}", h.base(), id),
        Some(&h.auth(MENTEE)),
        Some(json!({ "cells": { "salary": "120000" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["changes"]["salary"], 120000.0);
}

#[tokio::test]
async fn smoke_test_foreign_conversation_row_is_not_found() {
    let h = Harness::new();
    let row = h.create_acme().await;
    let id = row["applicationId"].as_str().expect("id").to_string();
    let other = ConversationId::now_v7();

    let (status, _) = send(
        &h.app,
        Method::GET,
        &format!("/api/v1/conversations/{}/applications/{}", other, id),
        Some(&h.auth(MENTEE)),
        None,
    )
    .await;
    // Not a participant of the other conversation.
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn smoke_test_reordered_column_moves_in_board() {
    let h = Harness::new();
    let (status, column) = send(
        &h.app,
        Method::PATCH,
        &format!("{}/board/columns/company", h.base()),
        Some(&h.auth(MENTOR)),
        Some(json!({ "order": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "update column failed: {}", column);
    assert_eq!(column["order"], 10);

    let (status, board) = send(
        &h.app,
        Method::GET,
        &format!("{}/board", h.base()),
        Some(&h.auth(MENTEE)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = board["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .filter_map(|c| c["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["dateApplied", "position", "status", "notes", "company"]);
}

#[tokio::test]
async fn smoke_test_create_with_empty_body_is_missing_field() {
    let h = Harness::new();
    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("{}/applications", h.base()),
        Some(&h.auth(MENTEE)),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
}
