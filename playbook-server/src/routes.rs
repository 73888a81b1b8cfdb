//! API route handlers.

use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use playbook_core::{ExportFormat, ItemId, Lang, MutationOutcome, RecordView, ShellView};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::metrics;
use crate::store::WidgetSummary;
use crate::validation::{validate_id, validate_patch, ValidationError};
use crate::AppState;

/// `?lang=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    /// Display language; the widget's mount language when absent.
    #[serde(default)]
    pub lang: Option<Lang>,
}

/// Body of a successful add.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddResponse {
    /// Id of the new item.
    pub id: ItemId,
}

/// Body of a successful update or remove.
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Whether anything changed.
    pub outcome: MutationOutcome,
}

fn check_id(what: &'static str, id: &str) -> Result<(), ApiError> {
    validate_id(what, id).map_err(reject)
}

fn reject(error: ValidationError) -> ApiError {
    metrics::record_validation_failure(error.kind());
    ApiError::from(error)
}

fn mutation_result<T>(
    op: &str,
    result: Result<T, ApiError>,
    outcome: impl Fn(&T) -> &'static str,
) -> Result<T, ApiError> {
    match &result {
        Ok(value) => metrics::record_mutation(op, outcome(value)),
        Err(_) => metrics::record_mutation(op, "rejected"),
    }
    result
}

fn outcome_label(outcome: MutationOutcome) -> &'static str {
    match outcome {
        MutationOutcome::Applied => "applied",
        MutationOutcome::Unchanged => "unchanged",
    }
}

/// List hosted widgets.
#[tracing::instrument(name = "list_widgets", skip(state))]
pub async fn list_widgets(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Json<Vec<WidgetSummary>> {
    Json(state.store.summaries(query.lang.unwrap_or_default()))
}

/// Get a widget's shell view.
#[tracing::instrument(name = "get_widget", skip(state))]
pub async fn get_widget(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
    Query(query): Query<LangQuery>,
) -> Result<Json<ShellView<RecordView>>, ApiError> {
    check_id("widget_id", &widget_id)?;
    Ok(Json(state.store.view(&widget_id, query.lang)?))
}

/// Get a widget's raw record.
#[tracing::instrument(name = "get_record", skip(state))]
pub async fn get_record(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    check_id("widget_id", &widget_id)?;
    Ok(Json(state.store.record_json(&widget_id)?))
}

/// Append an item.
#[tracing::instrument(name = "add_item", skip(state, seed))]
pub async fn add_item(
    State(state): State<AppState>,
    Path((widget_id, collection)): Path<(String, String)>,
    Json(seed): Json<Value>,
) -> Result<(StatusCode, Json<AddResponse>), ApiError> {
    check_id("widget_id", &widget_id)?;
    check_id("collection", &collection)?;
    validate_patch(&seed).map_err(reject)?;

    let result = state
        .store
        .add(&widget_id, &collection, &seed)
        .map_err(ApiError::from);
    let id = mutation_result("add", result, |_| "applied")?;
    Ok((StatusCode::CREATED, Json(AddResponse { id })))
}

/// Merge a patch into an item.
#[tracing::instrument(name = "update_item", skip(state, patch))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((widget_id, collection, item_id)): Path<(String, String, String)>,
    Json(patch): Json<Value>,
) -> Result<Json<MutationResponse>, ApiError> {
    check_id("widget_id", &widget_id)?;
    check_id("collection", &collection)?;
    check_id("item_id", &item_id)?;
    validate_patch(&patch).map_err(reject)?;

    let result = state
        .store
        .update(&widget_id, &collection, &ItemId::from(item_id.as_str()), &patch)
        .map_err(ApiError::from);
    let outcome = mutation_result("update", result, |o| outcome_label(*o))?;
    Ok(Json(MutationResponse { outcome }))
}

/// Remove an item and its dependents.
#[tracing::instrument(name = "remove_item", skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((widget_id, collection, item_id)): Path<(String, String, String)>,
) -> Result<Json<MutationResponse>, ApiError> {
    check_id("widget_id", &widget_id)?;
    check_id("collection", &collection)?;
    check_id("item_id", &item_id)?;

    let result = state
        .store
        .remove(&widget_id, &collection, &ItemId::from(item_id.as_str()))
        .map_err(ApiError::from);
    let outcome = mutation_result("remove", result, |o| outcome_label(*o))?;
    Ok(Json(MutationResponse { outcome }))
}

/// Download a widget export.
#[tracing::instrument(name = "export_widget", skip(state))]
pub async fn export_widget(
    State(state): State<AppState>,
    Path((widget_id, format)): Path<(String, String)>,
    Query(query): Query<LangQuery>,
) -> Result<Response, ApiError> {
    check_id("widget_id", &widget_id)?;
    let format: ExportFormat = format.parse().map_err(ApiError::BadRequest)?;
    let lang = match query.lang {
        Some(lang) => lang,
        None => state.store.lang(&widget_id)?,
    };

    let started = Instant::now();
    let element_id = format!("widget-{widget_id}");
    let store = state.store.clone();
    let exporter = state.exporter.clone();
    let result =
        tokio::task::spawn_blocking(move || exporter.export(&store, &element_id, format, lang))
            .await
            .map_err(|e| ApiError::Internal(format!("export task failed: {e}")))?;
    metrics::record_export(
        format.extension(),
        result.is_ok(),
        started.elapsed().as_secs_f64(),
    );

    let artifact = result?;
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}
