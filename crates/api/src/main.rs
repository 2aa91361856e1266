use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use investwise_core::domain::answers::QuestionnaireAnswers;
use investwise_core::domain::assessment::{Allocation, RiskProfile};
use investwise_core::domain::security::{EnrichedSecurity, ExternalSuggestion, SecurityRecord};
use investwise_core::llm::anthropic::AnthropicClient;
use investwise_core::llm::{LlmClient, PicksRequest};
use investwise_core::marketdata::yahoo::YahooRapidApiClient;
use investwise_core::momentum;
use investwise_core::risk::engine::assess;
use investwise_core::risk::selection::{
    query_for_profile, selection_explanation, DEFAULT_RESULT_LIMIT,
};
use investwise_core::storage::securities::{
    fetch_all, fetch_by_symbol, PgSecurityStore, MAX_LIST_LIMIT,
};
use investwise_core::storage::SecurityStore;
use investwise_core::sync::reconcile::reconcile;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = investwise_core::config::Settings::from_env()?;
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
            Ok(pool) => match investwise_core::storage::migrate(&pool).await {
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
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let llm = match AnthropicClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "LLM client unavailable; /ai-picks will be disabled");
            None
        }
    };

    let quotes = match YahooRapidApiClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "quote provider unavailable; /ai-picks will be disabled");
            None
        }
    };

    let state = AppState { pool, llm, quotes };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/recommendations", post(post_recommendations))
        .route("/ai-picks", post(post_ai_picks))
        .route("/stocks", get(get_stocks))
        .route("/stocks/:symbol", get(get_stock_by_symbol))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    llm: Option<Arc<AnthropicClient>>,
    quotes: Option<Arc<YahooRapidApiClient>>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn internal_error(err: anyhow::Error) -> ApiError {
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
}

fn service_unavailable(reason: &str) -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": reason})),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationsResponse {
    risk_profile: RiskProfile,
    description: String,
    allocation: Allocation,
    score: i32,
    selection_explanation: &'static str,
    recommended_stocks: Vec<SecurityRecord>,
}

async fn post_recommendations(
    State(state): State<AppState>,
    Json(answers): Json<QuestionnaireAnswers>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let Some(pool) = &state.pool else {
        return Err(service_unavailable("database unavailable"));
    };

    let assessment = assess(&answers);
    let query = query_for_profile(assessment.risk_profile);

    let store = PgSecurityStore::new(pool.clone());
    let mut stocks = store
        .find_securities(&query, DEFAULT_RESULT_LIMIT)
        .await
        .map_err(internal_error)?;

    // Stored labels may be stale; recompute from the change columns on the
    // way out. An empty shortlist is a valid outcome, not an error.
    for stock in &mut stocks {
        stock.momentum = momentum::from_changes(stock.change_1m, stock.change_1w);
    }

    Ok(Json(RecommendationsResponse {
        risk_profile: assessment.risk_profile,
        description: assessment.description,
        allocation: assessment.allocation,
        score: assessment.score,
        selection_explanation: selection_explanation(assessment.risk_profile),
        recommended_stocks: stocks,
    }))
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AiStocks {
    Enriched(Vec<EnrichedSecurity>),
    Raw(Vec<ExternalSuggestion>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AiPicksResponse {
    risk_profile: RiskProfile,
    allocation: Allocation,
    ai_summary: Option<String>,
    ai_disclaimer: Option<String>,
    ai_stocks: AiStocks,
}

async fn post_ai_picks(
    State(state): State<AppState>,
    Json(answers): Json<QuestionnaireAnswers>,
) -> Result<Json<AiPicksResponse>, ApiError> {
    let Some(pool) = &state.pool else {
        return Err(service_unavailable("database unavailable"));
    };
    let Some(llm) = &state.llm else {
        return Err(service_unavailable("LLM provider unavailable"));
    };
    let Some(quotes) = &state.quotes else {
        return Err(service_unavailable("quote provider unavailable"));
    };

    let assessment = assess(&answers);
    let request = PicksRequest {
        assessment: assessment.clone(),
        answers,
    };

    let picks = llm
        .generate_stock_picks(&request)
        .await
        .map_err(internal_error)?;

    let store = PgSecurityStore::new(pool.clone());
    let enriched = reconcile(&store, quotes.as_ref(), &picks.suggestions).await;

    // All-failed enrichment degrades to the raw validated suggestions
    // rather than an error.
    let ai_stocks = if enriched.is_empty() {
        tracing::warn!("reconciliation produced no records; returning raw AI suggestions");
        AiStocks::Raw(picks.suggestions)
    } else {
        AiStocks::Enriched(enriched)
    };

    Ok(Json(AiPicksResponse {
        risk_profile: assessment.risk_profile,
        allocation: assessment.allocation,
        ai_summary: picks.summary,
        ai_disclaimer: picks.disclaimer,
        ai_stocks,
    }))
}

async fn get_stocks(
    State(state): State<AppState>,
) -> Result<Json<Vec<SecurityRecord>>, ApiError> {
    let Some(pool) = &state.pool else {
        return Err(service_unavailable("database unavailable"));
    };

    let stocks = fetch_all(pool, MAX_LIST_LIMIT).await.map_err(internal_error)?;
    Ok(Json(stocks))
}

async fn get_stock_by_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<SecurityRecord>, ApiError> {
    let Some(pool) = &state.pool else {
        return Err(service_unavailable("database unavailable"));
    };

    let stock = fetch_by_symbol(pool, &symbol)
        .await
        .map_err(internal_error)?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Stock not found"})),
        ))?;

    Ok(Json(stock))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &investwise_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
