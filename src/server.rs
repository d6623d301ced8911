use crate::aggregate;
use crate::config::AppConfig;
use crate::filter;
use crate::render;
use crate::types::{DepartmentBoundary, Garden};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Immutable datasets loaded once at startup. Handlers only read from this;
/// every request re-runs filter -> aggregate -> render over it.
pub struct AppState {
    pub gardens: Vec<Garden>,
    pub boundaries: Vec<DepartmentBoundary>,
}

#[derive(Deserialize)]
pub struct FilterParams {
    #[serde(default = "default_all")]
    garden_type: String,
    #[serde(default = "default_all")]
    department: String,
}

fn default_all() -> String {
    filter::ALL.to_string()
}

#[derive(Serialize)]
pub struct FilterOptions {
    types: Vec<String>,
    departments: Vec<String>,
}

pub async fn start_server(
    config: AppConfig,
    gardens: Vec<Garden>,
    boundaries: Vec<DepartmentBoundary>,
) -> Result<()> {
    let state = Arc::new(AppState { gardens, boundaries });

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    info!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/", get(dashboard_handler))
        .route("/map/gardens", get(gardens_map_handler))
        .route("/map/departments", get(departments_map_handler))
        .route("/api/filters", get(filters_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Html<String> {
    let filtered = filter::filter(&state.gardens, &params.garden_type, &params.department);
    let counts = aggregate::gardens_per_department(&filtered, &state.boundaries);
    let center = render::map_center(&filtered);

    let gardens_map = render::gardens_map_fragment(&filtered, center);
    let departments_map = render::choropleth_fragment(&counts, center);

    let types = filter::distinct_types(&state.gardens);
    let departments = filter::distinct_departments(&state.gardens);

    Html(render::dashboard_page(&render::DashboardView {
        types: &types,
        departments: &departments,
        selected_type: &params.garden_type,
        selected_department: &params.department,
        gardens: &filtered,
        gardens_map: &gardens_map,
        departments_map: &departments_map,
    }))
}

async fn gardens_map_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Html<String> {
    let filtered = filter::filter(&state.gardens, &params.garden_type, &params.department);
    let center = render::map_center(&filtered);
    let fragment = render::gardens_map_fragment(&filtered, center);
    Html(render::map_page("Remarkable gardens", &fragment))
}

async fn departments_map_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Html<String> {
    let filtered = filter::filter(&state.gardens, &params.garden_type, &params.department);
    let counts = aggregate::gardens_per_department(&filtered, &state.boundaries);
    let center = render::map_center(&filtered);
    let fragment = render::choropleth_fragment(&counts, center);
    Html(render::map_page("Gardens by department", &fragment))
}

/// Distinct dropdown values, for clients that render their own controls.
async fn filters_handler(State(state): State<Arc<AppState>>) -> Json<FilterOptions> {
    Json(FilterOptions {
        types: filter::distinct_types(&state.gardens),
        departments: filter::distinct_departments(&state.gardens),
    })
}
