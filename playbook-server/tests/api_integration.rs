//! Integration tests for the widget CRUD API.
//!
//! Runs the real router against the shipped fixtures over HTTP.

mod common;

use common::TestServer;
use playbook_core::ItemId;
use serde_json::{json, Value};

async fn get_json(url: &str) -> (u16, Value) {
    let resp = reqwest::get(url).await.expect("request");
    let status = resp.status().as_u16();
    (status, resp.json().await.expect("json"))
}

// ==========================================================================
// Reads
// ==========================================================================

#[tokio::test]
async fn test_health_reports_widgets() {
    let server = TestServer::start().await;

    let live = reqwest::get(server.url("/health/live")).await.expect("live");
    assert_eq!(live.status(), 200);

    let (status, body) = get_json(&server.url("/health/ready")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["widgets"], 8);

    server.shutdown().await;
}

#[tokio::test]
async fn test_list_widgets_in_english() {
    let server = TestServer::start().await;

    let (status, body) = get_json(&server.url("/api/widgets?lang=en")).await;
    assert_eq!(status, 200);
    let widgets = body.as_array().expect("array");
    assert_eq!(widgets.len(), 8);
    let swot = widgets.iter().find(|w| w["id"] == "swot").expect("swot");
    assert_eq!(swot["title"], "SWOT Analysis");
    assert_eq!(swot["element_id"], "widget-swot");
    let seven_s = widgets.iter().find(|w| w["id"] == "mckinsey-7s").expect("7s");
    assert_eq!(seven_s["read_only"], true);

    server.shutdown().await;
}

#[tokio::test]
async fn test_widget_view_is_ready_shell() {
    let server = TestServer::start().await;

    let (status, body) = get_json(&server.widget_url("five-dysfunctions", "?lang=en")).await;
    assert_eq!(status, 200);
    assert_eq!(body["state"], "ready");
    assert_eq!(body["header"]["breadcrumbs"][0], "Frameworks");
    assert_eq!(body["controls"]["exports"], json!(["csv", "png", "svg"]));
    assert_eq!(body["body"]["aggregate"]["display"], "3.0");

    let (_, zh) = get_json(&server.widget_url("five-dysfunctions", "")).await;
    assert_eq!(zh["header"]["breadcrumbs"][0], "框架库");

    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_widget_is_404() {
    let server = TestServer::start().await;

    let (status, body) = get_json(&server.widget_url("nope", "")).await;
    assert_eq!(status, 404);
    assert!(body["error"].as_str().expect("message").contains("nope"));

    let bad = reqwest::get(server.widget_url("not%20valid", "/record"))
        .await
        .expect("request");
    assert_eq!(bad.status(), 400);

    server.shutdown().await;
}

// ==========================================================================
// Mutations
// ==========================================================================

#[tokio::test]
async fn test_score_update_moves_aggregate() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .patch(server.widget_url("five-dysfunctions", "/dysfunctions/items/trust"))
        .json(&json!({ "score": 5 }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json");
    assert_eq!(body["outcome"], "applied");

    let (_, record) = get_json(&server.widget_url("five-dysfunctions", "/record")).await;
    assert_eq!(record["overall_score"], 3.4);

    server.shutdown().await;
}

#[tokio::test]
async fn test_add_then_remove_item() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.widget_url("gantt", "/tasks/items"))
        .json(&json!({ "start_date": "2024-01-01", "end_date": "2024-01-08" }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("json");
    let id = body["id"].as_str().expect("id").to_string();

    let (_, record) = get_json(&server.widget_url("gantt", "/record")).await;
    let tasks = record["tasks"].as_array().expect("tasks");
    assert_eq!(tasks.last().expect("last")["id"], id.as_str());
    assert_eq!(tasks.len(), 5);

    let resp = client
        .delete(server.widget_url("gantt", &format!("/tasks/items/{id}")))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    assert!(server
        .store()
        .snapshot("gantt")
        .expect("gantt")
        .record
        .find("tasks", &ItemId::from(id.as_str()))
        .is_none());

    server.shutdown().await;
}

#[tokio::test]
async fn test_remove_task_cascades_over_http() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .delete(server.widget_url("gantt", "/tasks/items/task-2"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);

    let (_, record) = get_json(&server.widget_url("gantt", "/record")).await;
    let milestones = record["milestones"].as_array().expect("milestones");
    assert_eq!(milestones.len(), 1);
    let task_3 = record["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .find(|t| t["id"] == "task-3")
        .expect("task-3");
    assert_eq!(task_3["dependencies"], json!([]));

    server.shutdown().await;
}

#[tokio::test]
async fn test_missing_item_is_unchanged() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    for resp in [
        client
            .patch(server.widget_url("swot", "/entries/items/entry-ghost"))
            .json(&json!({ "weight": 2 })),
        client.delete(server.widget_url("swot", "/entries/items/entry-ghost")),
    ] {
        let resp = resp.send().await.expect("request");
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.expect("json");
        assert_eq!(body["outcome"], "unchanged");
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_schema_violations_are_400() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let unknown_field = client
        .patch(server.widget_url("swot", "/entries/items/entry-s1"))
        .json(&json!({ "wieght": 2 }))
        .send()
        .await
        .expect("request");
    assert_eq!(unknown_field.status(), 400);
    let body: Value = unknown_field.json().await.expect("json");
    assert!(body["error"].as_str().expect("message").contains("wieght"));

    let bad_choice = client
        .patch(server.widget_url("swot", "/entries/items/entry-s1"))
        .json(&json!({ "quadrant": "sideways" }))
        .send()
        .await
        .expect("request");
    assert_eq!(bad_choice.status(), 400);

    let not_object = client
        .post(server.widget_url("swot", "/entries/items"))
        .json(&json!(["title"]))
        .send()
        .await
        .expect("request");
    assert_eq!(not_object.status(), 400);

    let unknown_collection = client
        .post(server.widget_url("swot", "/risks/items"))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(unknown_collection.status(), 404);

    server.shutdown().await;
}

#[tokio::test]
async fn test_read_only_widget_is_403() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .patch(server.widget_url("mckinsey-7s", "/elements/items/strategy"))
        .json(&json!({ "alignment": 5 }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 403);

    let (_, record) = get_json(&server.widget_url("mckinsey-7s", "/record")).await;
    let strategy = &record["elements"][0];
    assert_eq!(strategy["alignment"], 4.0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_forced_read_only_rejects_everything() {
    let server = TestServer::start_with(true).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.widget_url("swot", "/entries/items"))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 403);

    let (_, view) = get_json(&server.widget_url("swot", "")).await;
    assert_eq!(view["controls"]["read_only"], true);

    server.shutdown().await;
}
