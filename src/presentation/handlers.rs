// HTTP request handlers - Serve stored snapshots without contacting the service
use crate::domain::resource::Resource;
use crate::presentation::app_state::AppState;
use crate::presentation::view_models::{
    DashboardView, ReportView, ResourceSummary, TableView, dashboard_to_view, report_to_view,
    table_to_view,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/reports", get(list_reports))
        .route("/reports/:id", get(get_report))
        .route("/reports/:id/thumbnail", get(get_report_thumbnail))
        .route("/reports/:id/views/:view_id/table", get(get_view_table))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/:id", get(get_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn internal_error(what: &str, e: anyhow::Error) -> StatusCode {
    tracing::error!("Error loading {}: {:#}", what, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List stored report snapshots
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResourceSummary>>, StatusCode> {
    let ids = state
        .store
        .list_reports()
        .await
        .map_err(|e| internal_error("report list", e))?;

    let mut summaries = Vec::with_capacity(ids.len());
    for id in ids {
        match state.store.load_report(&id).await {
            Ok(Some(report)) => summaries.push(ResourceSummary {
                id: report.id().to_string(),
                name: report.name().to_string(),
            }),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping unreadable report snapshot {}: {:#}", id, e),
        }
    }
    Ok(Json(summaries))
}

pub async fn get_report(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReportView>, StatusCode> {
    match state.store.load_report(&id).await {
        Ok(Some(report)) => Ok(Json(report_to_view(&report))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(internal_error(&format!("report {}", id), e)),
    }
}

pub async fn get_report_thumbnail(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let report = match state.store.load_report(&id).await {
        Ok(Some(report)) => report,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => return Err(internal_error(&format!("report {}", id), e)),
    };

    let image = report.thumbnail().ok_or(StatusCode::NOT_FOUND)?;
    Ok((
        [(header::CONTENT_TYPE, image.format().mime_type())],
        image.bytes().clone(),
    )
        .into_response())
}

pub async fn get_view_table(
    Path((id, view_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TableView>, StatusCode> {
    let report = match state.store.load_report(&id).await {
        Ok(Some(report)) => report,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => return Err(internal_error(&format!("report {}", id), e)),
    };

    let table = report
        .find_view(&view_id)
        .and_then(|view| view.table())
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(table_to_view(table)))
}

/// List stored dashboard snapshots
pub async fn list_dashboards(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResourceSummary>>, StatusCode> {
    let ids = state
        .store
        .list_dashboards()
        .await
        .map_err(|e| internal_error("dashboard list", e))?;

    let mut summaries = Vec::with_capacity(ids.len());
    for id in ids {
        match state.store.load_dashboard(&id).await {
            Ok(Some(dashboard)) => summaries.push(ResourceSummary {
                id: dashboard.id().to_string(),
                name: dashboard.name().to_string(),
            }),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping unreadable dashboard snapshot {}: {:#}", id, e),
        }
    }
    Ok(Json(summaries))
}

pub async fn get_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, StatusCode> {
    match state.store.load_dashboard(&id).await {
        Ok(Some(dashboard)) => Ok(Json(dashboard_to_view(&dashboard))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(internal_error(&format!("dashboard {}", id), e)),
    }
}
