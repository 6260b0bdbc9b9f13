use std::path::Path;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use cut_planner::catalog::StockCatalog;
use cut_planner::config::{PlanOptions, RemnantSeed};
use cut_planner::extract::RequirementInput;
use cut_planner::logging;
use cut_planner::pool::RemnantPool;
use cut_planner::solver::{Report, Solver};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct PlanRequest {
    #[serde(default)]
    catalog: Option<StockCatalog>,
    #[serde(default)]
    options: Option<PlanOptions>,
    requirements: Vec<RequirementInput>,
    #[serde(default)]
    remnants: Vec<RemnantSeed>,
}

async fn plan(Json(req): Json<PlanRequest>) -> Result<Json<Report>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /plan"
    );

    tokio::task::spawn_blocking(move || run_plan(req))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "planning task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "planning failed".to_string())
        })?
        .map(Json)
}

fn run_plan(req: PlanRequest) -> Result<Report, (StatusCode, String)> {
    if req.requirements.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "at least one requirement is needed".to_string(),
        ));
    }
    let catalog = match req.catalog {
        Some(catalog) => {
            catalog
                .validate()
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid catalog: {e}")))?;
            catalog
        }
        None => StockCatalog::builtin(),
    };
    let options = req.options.unwrap_or_default();
    options
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid options: {e}")))?;

    let solver = Solver::new(catalog, options);
    let mut pool = RemnantPool::new();
    solver
        .seed_remnants(&mut pool, &req.remnants)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    solver
        .solve(&req.requirements, &mut pool)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init_file(Path::new("development.log"), Level::INFO) {
        eprintln!("failed to open development.log: {e}");
        std::process::exit(1);
    }

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/plan", post(plan))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    eprintln!("Listening on {addr}");
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}
