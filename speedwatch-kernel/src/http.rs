/**
 * API REST SPEEDWATCH - Serveur HTTP du tableau de bord
 *
 * RÔLE :
 * Expose en JSON tout ce que l'app mobile affiche : journal filtré des
 * infractions, statut ESP32, panneau de trafic, caméras, rapports, réglages.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, état unique `AppState` cloné dans chaque handler
 * - Routes : /health, /system, /ports, /violations, /device, /traffic,
 *   /cameras, /reports, /settings
 * - Erreurs métier -> `ApiError` -> status HTTP + corps {"error", "status"}
 *
 * SÉCURITÉ :
 * - Si une clé API est configurée, header x-api-key obligatoire sauf /health
 * - Sans clé configurée, l'API est ouverte (usage LAN / démo)
 */

use crate::cameras::{Camera, CameraError};
use crate::device::{DevicePoller, RefreshOutcome};
use crate::filters::{project, FilterInput, FilterState, Outcome};
use crate::health::{HealthTracker, KernelHealth};
use crate::ports::PortInfo;
use crate::records::{Lane, RecordStore, ViolationRecord};
use crate::reports::{series, ReportSeries, TimeFrame};
use crate::settings::{NotificationKind, Settings, SettingsError};
use crate::state::DashboardState;
use crate::traffic::{ControlMode, LevelInfo, TrafficError, TrafficLevel, TrafficPanel};
use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Traffic(#[from] TrafficError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Traffic(TrafficError::ManualModeRequired) => StatusCode::CONFLICT,
            ApiError::Traffic(TrafficError::SensorOutOfRange(_)) => StatusCode::BAD_REQUEST,
            ApiError::Camera(CameraError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Camera(CameraError::Offline(_)) => StatusCode::CONFLICT,
            ApiError::Camera(CameraError::Empty) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Settings(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("[http] {self}");
        }
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub dashboard: DashboardState,
    pub poller: DevicePoller,
    pub health: HealthTracker,
    pub ports: Arc<Vec<PortInfo>>,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: RecordStore, violations_port: PortInfo, poller: DevicePoller, health: HealthTracker) -> Self {
        let ports = vec![violations_port, poller.probe_info()];
        Self {
            store,
            dashboard: DashboardState::default(),
            poller,
            health,
            ports: Arc::new(ports),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty()).map(Arc::from);
        self
    }
}

async fn require_api_key(State(app): State<AppState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    let Some(expected) = app.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    // Health check toujours accessible
    if req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        tracing::warn!("[http] rejected {} {}: bad or missing api key", req.method(), req.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/ports", get(list_ports))
        .route("/violations", get(get_violations))
        .route("/violations/filters", get(get_filters).put(put_filters))
        .route("/violations/filters/date", delete(clear_date))
        .route("/device", get(get_device))
        .route("/device/refresh", post(refresh_device))
        .route("/traffic", get(get_traffic))
        .route("/traffic/levels", get(list_levels))
        .route("/traffic/mode", post(toggle_mode))
        .route("/traffic/level", put(set_level))
        .route("/traffic/sensor", post(sensor_reading))
        .route("/cameras", get(list_cameras))
        .route("/cameras/{id}/select", post(select_camera))
        .route("/reports/{timeframe}", get(get_report))
        .route("/settings", get(get_settings))
        .route("/settings/lanes/{lane}", put(set_lane_limit))
        .route("/settings/notifications/{kind}", post(toggle_notification))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_api_key))
        .with_state(app_state)
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health.get_health(&app.store, &app.poller, &app.dashboard.traffic))
}

// GET /ports (mocks branchés)
async fn list_ports(State(app): State<AppState>) -> Json<Vec<PortInfo>> {
    Json(app.ports.as_ref().clone())
}

#[derive(Serialize)]
struct ViolationsView {
    filters: FilterState,
    outcome: Outcome,
    count: usize,
    records: Vec<ViolationRecord>,
}

// GET /violations?date=yyyy-MM-dd&speed=20-25
// Les paramètres présents remplacent les filtres de la vue pour cette requête seulement
async fn get_violations(State(app): State<AppState>, Query(input): Query<FilterInput>) -> Json<ViolationsView> {
    app.health.record_violation_query();
    let filters = app.dashboard.filters.lock().overridden_by(&input);
    let view = project(app.store.records(), &filters);
    Json(ViolationsView {
        filters,
        outcome: view.outcome(),
        count: view.count(),
        records: view.to_owned_records(),
    })
}

async fn get_filters(State(app): State<AppState>) -> Json<FilterState> {
    Json(*app.dashboard.filters.lock())
}

// PUT /violations/filters : remplace l'état complet (date invalide = absente)
async fn put_filters(State(app): State<AppState>, Json(input): Json<FilterInput>) -> Json<FilterState> {
    let next = FilterState::from_input(&input);
    *app.dashboard.filters.lock() = next;
    tracing::debug!("[http] filters -> {:?} / {}", next.selected_date, next.speed_bucket);
    Json(next)
}

async fn clear_date(State(app): State<AppState>) -> Json<FilterState> {
    let mut filters = app.dashboard.filters.lock();
    filters.clear_date();
    Json(*filters)
}

#[derive(Serialize)]
struct DeviceView {
    #[serde(flatten)]
    poll: crate::device::PollerSnapshot,
    delay_ms: u128,
    probe: PortInfo,
}

async fn get_device(State(app): State<AppState>) -> Json<DeviceView> {
    Json(DeviceView {
        poll: app.poller.snapshot(),
        delay_ms: app.poller.delay().as_millis(),
        probe: app.poller.probe_info(),
    })
}

// POST /device/refresh : 202 lancé, 409 déjà en cours
async fn refresh_device(State(app): State<AppState>) -> (StatusCode, Json<RefreshOutcome>) {
    let outcome = app.poller.refresh();
    let code = match outcome {
        RefreshOutcome::Started { .. } => StatusCode::ACCEPTED,
        RefreshOutcome::AlreadyPolling { .. } => StatusCode::CONFLICT,
        RefreshOutcome::ShutDown => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(outcome))
}

#[derive(Serialize)]
struct TrafficView {
    level: LevelInfo,
    mode: ControlMode,
}

impl From<TrafficPanel> for TrafficView {
    fn from(panel: TrafficPanel) -> Self {
        Self {
            level: panel.level().info(),
            mode: panel.mode(),
        }
    }
}

async fn get_traffic(State(app): State<AppState>) -> Json<TrafficView> {
    Json(TrafficView::from(*app.dashboard.traffic.lock()))
}

async fn list_levels() -> Json<Vec<LevelInfo>> {
    Json(TrafficLevel::ALL.into_iter().map(TrafficLevel::info).collect())
}

async fn toggle_mode(State(app): State<AppState>) -> Json<TrafficView> {
    let mut panel = app.dashboard.traffic.lock();
    panel.toggle_mode();
    Json(TrafficView::from(*panel))
}

#[derive(Deserialize)]
struct LevelInput {
    level: TrafficLevel,
}

// PUT /traffic/level : mode manuel uniquement
async fn set_level(State(app): State<AppState>, Json(input): Json<LevelInput>) -> Result<Json<TrafficView>, ApiError> {
    let mut panel = app.dashboard.traffic.lock();
    panel.set_level(input.level)?;
    Ok(Json(TrafficView::from(*panel)))
}

#[derive(Deserialize)]
struct SensorInput {
    value: u16,
}

// POST /traffic/sensor : relevé capteur du microcontrôleur
async fn sensor_reading(
    State(app): State<AppState>,
    Json(input): Json<SensorInput>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut panel = app.dashboard.traffic.lock();
    let (level, applied) = panel.apply_sensor_reading(input.value)?;
    Ok(Json(json!({
        "classified": level,
        "applied": applied,
        "current": TrafficView::from(*panel),
    })))
}

#[derive(Serialize)]
struct CamerasView {
    selected: String,
    cameras: Vec<Camera>,
}

async fn list_cameras(State(app): State<AppState>) -> Json<CamerasView> {
    let registry = app.dashboard.cameras.lock();
    Json(CamerasView {
        selected: registry.selected().id.clone(),
        cameras: registry.list().to_vec(),
    })
}

async fn select_camera(State(app): State<AppState>, Path(id): Path<String>) -> Result<Json<Camera>, ApiError> {
    let mut registry = app.dashboard.cameras.lock();
    let camera = registry.select(&id)?.clone();
    Ok(Json(camera))
}

async fn get_report(Path(timeframe): Path<String>) -> Json<ReportSeries> {
    Json(series(TimeFrame::parse_lenient(&timeframe)))
}

async fn get_settings(State(app): State<AppState>) -> Json<Settings> {
    Json(app.dashboard.settings.lock().clone())
}

#[derive(Deserialize)]
struct LimitInput {
    value: serde_json::Value,
}

// PUT /settings/lanes/{lane} body {"value": "45"} (texte saisi ou nombre)
async fn set_lane_limit(
    State(app): State<AppState>,
    Path(lane): Path<u8>,
    Json(input): Json<LimitInput>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let lane = Lane::from_number(lane).ok_or_else(|| ApiError::NotFound(format!("lane not found: {lane}")))?;
    let raw = match input.value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    let value = app.dashboard.settings.lock().set_speed_limit(lane, &raw)?;
    Ok(Json(json!({ "lane": lane, "speed_limit_kmh": value })))
}

async fn toggle_notification(
    State(app): State<AppState>,
    Path(kind): Path<NotificationKind>,
) -> Json<serde_json::Value> {
    let enabled = app.dashboard.settings.lock().toggle_notification(kind);
    Json(json!({ "kind": kind, "enabled": enabled }))
}
