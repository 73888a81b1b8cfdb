//! Integration tests for the export download endpoint.
//!
//! Exercises CSV, SVG and PNG downloads via the HTTP API.

mod common;

use common::TestServer;
use serde_json::json;

fn disposition(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn content_type(resp: &reqwest::Response) -> String {
    resp.headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ==========================================================================
// Success cases
// ==========================================================================

#[tokio::test]
async fn test_export_csv_download() {
    let server = TestServer::start().await;

    let resp = reqwest::get(server.widget_url("porter-five-forces", "/export/csv?lang=en"))
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "text/csv;charset=utf-8");
    let disposition = disposition(&resp);
    assert!(disposition.starts_with("attachment; filename=\"porter-five-forces-"));
    assert!(disposition.ends_with(".csv\""));

    let body = resp.text().await.expect("body");
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("Force,Intensity,Factors"));
    assert_eq!(lines.count(), 5);

    server.shutdown().await;
}

#[tokio::test]
async fn test_export_reflects_latest_edit() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .delete(server.widget_url("pestle", "/factors/items/social-1"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);

    let body = reqwest::get(server.widget_url("pestle", "/export/csv"))
        .await
        .expect("request")
        .text()
        .await
        .expect("body");
    assert_eq!(body.lines().count(), 6);

    server.shutdown().await;
}

#[tokio::test]
async fn test_export_png_at_double_scale() {
    let server = TestServer::start().await;

    let resp = reqwest::get(server.widget_url("raci", "/export/png"))
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "image/png");
    assert!(disposition(&resp).ends_with(".png\""));

    let bytes = resp.bytes().await.expect("body");
    assert_eq!(&bytes[0..4], &[137, 80, 78, 71]);
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    assert_eq!(width, 1600);

    server.shutdown().await;
}

#[tokio::test]
async fn test_export_svg_in_english() {
    let server = TestServer::start().await;

    let resp = reqwest::get(server.widget_url("swot", "/export/svg?lang=en"))
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);
    assert_eq!(content_type(&resp), "image/svg+xml");
    let svg = resp.text().await.expect("body");
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("SWOT Analysis"));

    server.shutdown().await;
}

// ==========================================================================
// Error cases
// ==========================================================================

#[tokio::test]
async fn test_export_unknown_format_is_400() {
    let server = TestServer::start().await;

    let resp = reqwest::get(server.widget_url("swot", "/export/pdf"))
        .await
        .expect("request");
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.expect("json");
    assert_eq!(body, json!({ "error": "Unknown export format: pdf" }));

    server.shutdown().await;
}

#[tokio::test]
async fn test_export_unknown_widget_is_404() {
    let server = TestServer::start().await;

    let resp = reqwest::get(server.widget_url("ghost", "/export/csv?lang=en"))
        .await
        .expect("request");
    assert_eq!(resp.status(), 404);

    server.shutdown().await;
}
