use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use sunsmart_core::domain::calculation::CalculationRecord;
use sunsmart_core::domain::site::SiteInput;
use sunsmart_core::estimate::labels::GeometryLabels;
use sunsmart_core::estimate::simulation::{simulate, SimulationRequest, SimulationResult};
use sunsmart_core::estimate::{Estimate, Estimator};
use sunsmart_core::geocode::nominatim::NominatimClient;
use sunsmart_core::geocode::{gazetteer, geocode_or_fallback, GeocodeOutcome, Geocoder, Place};
use sunsmart_core::pvgis::PvgisClient;
use sunsmart_core::storage::calculations::{clamp_list_limit, PgCalculationStore};
use sunsmart_core::storage::CalculationStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = sunsmart_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match sunsmart_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; starting API without history");
            None
        }
    };

    let mut estimator = Estimator::new().with_store_timeout(settings.store_timeout());
    match PvgisClient::from_settings(&settings) {
        Ok(pvgis) => estimator = estimator.with_production_provider(Arc::new(pvgis)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "PVGIS client unavailable; every estimate will use the fallback");
        }
    }

    if let Some(pool) = pool {
        estimator = estimator.with_store(Arc::new(PgCalculationStore::new(pool)));
    }

    let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimClient::from_settings(&settings)?);

    let state = AppState {
        estimator,
        geocoder,
    };

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/estimates", post(create_estimate))
        .route("/api/calculations", get(list_calculations))
        .route("/api/calculations/:id", get(get_calculation))
        .route(
            "/api/calculations/:id/recalculate",
            post(recalculate_calculation),
        )
        .route("/api/simulate", post(simulate_roof))
        .route("/api/geocode", get(geocode_location))
        .route("/api/geocode/reverse", get(reverse_geocode))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    estimator: Estimator,
    geocoder: Arc<dyn Geocoder>,
}

impl AppState {
    fn store(&self) -> Result<&Arc<dyn CalculationStore>, ApiError> {
        self.estimator.store().ok_or_else(ApiError::unavailable)
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "calculation not found".to_string(),
        }
    }

    fn unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "calculation history is unavailable".to_string(),
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct EstimateResponse {
    calculation: CalculationRecord,
    labels: GeometryLabels,
    saved: bool,
}

impl From<Estimate> for EstimateResponse {
    fn from(estimate: Estimate) -> Self {
        Self {
            labels: estimate.calculation.labels(),
            calculation: estimate.calculation,
            saved: estimate.saved,
        }
    }
}

#[derive(Debug, Serialize)]
struct CalculationView {
    calculation: CalculationRecord,
    labels: GeometryLabels,
}

impl From<CalculationRecord> for CalculationView {
    fn from(calculation: CalculationRecord) -> Self {
        Self {
            labels: calculation.labels(),
            calculation,
        }
    }
}

async fn create_estimate(
    State(state): State<AppState>,
    Json(site): Json<SiteInput>,
) -> Result<Json<EstimateResponse>, ApiError> {
    site.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let estimate = state.estimator.estimate(site.location_or_unknown()).await;
    Ok(Json(estimate.into()))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
struct CalculationList {
    calculations: Vec<CalculationView>,
}

fn parse_limit(raw: Option<&str>) -> Result<i64, ApiError> {
    let limit = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(
            s.parse::<i64>()
                .map_err(|_| ApiError::bad_request("limit must be a valid integer"))?,
        ),
        None => None,
    };
    Ok(clamp_list_limit(limit))
}

async fn list_calculations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<CalculationList>, ApiError> {
    let store = state.store()?;
    let limit = parse_limit(params.limit.as_deref())?;
    let records = store.list(limit).await.map_err(ApiError::internal)?;

    Ok(Json(CalculationList {
        calculations: records.into_iter().map(CalculationView::from).collect(),
    }))
}

async fn get_calculation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CalculationView>, ApiError> {
    let record = state
        .store()?
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(record.into()))
}

async fn recalculate_calculation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EstimateResponse>, ApiError> {
    state.store()?;

    let estimate = state
        .estimator
        .recalculate(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(estimate.into()))
}

async fn simulate_roof(
    Json(request): Json<SimulationRequest>,
) -> Result<Json<SimulationResult>, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    Ok(Json(simulate(&request)))
}

#[derive(Debug, Deserialize)]
struct GeocodeParams {
    #[serde(default)]
    location: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeocodeResponse {
    Found {
        success: bool,
        locations: Vec<Place>,
    },
    Fallback {
        success: bool,
        message: String,
        fallback: Place,
    },
}

impl From<GeocodeOutcome> for GeocodeResponse {
    fn from(outcome: GeocodeOutcome) -> Self {
        match outcome {
            GeocodeOutcome::Found(locations) => GeocodeResponse::Found {
                success: true,
                locations,
            },
            GeocodeOutcome::Fallback { reason, place } => GeocodeResponse::Fallback {
                success: false,
                message: reason,
                fallback: place,
            },
        }
    }
}

async fn geocode_location(
    State(state): State<AppState>,
    Query(params): Query<GeocodeParams>,
) -> Result<Json<GeocodeResponse>, ApiError> {
    let query = params.location.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("location parameter is required"));
    }

    let outcome = geocode_or_fallback(state.geocoder.as_ref(), query).await;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
struct ReverseParams {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct ReverseResponse {
    name: String,
}

async fn reverse_geocode(Query(params): Query<ReverseParams>) -> Json<ReverseResponse> {
    Json(ReverseResponse {
        name: gazetteer::reverse_geocode(params.lat, params.lon),
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &sunsmart_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
