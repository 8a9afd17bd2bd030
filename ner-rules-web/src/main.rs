//! Módulo HTTP do pós-processador NER (motor de regras e uniformização)
//!
//! Segue o contrato dos demais módulos de anotação:
//! - `GET|POST /process` com `{"input": "...", "output": "...", "mode": "..."}`
//!   lê o CoNLL-U Plus em `input` e grava o resultado em `output`;
//! - `GET|POST /checkHealth` informa se o módulo está pronto.
//!
//! As respostas são sempre `{"status": "OK"|"ERROR", "message": "..."}`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use clap::Parser;
use ner_rules_core::{Mode, Pipeline, PipelineReport, RuleSet};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Configuração do serviço (linha de comando ou variáveis de ambiente)
#[derive(Parser, Debug)]
#[command(name = "ner-rules-web")]
#[command(about = "Serviço HTTP de pós-processamento NER")]
struct Args {
    /// Porta HTTP
    #[arg(long, env = "NER_RULES_PORT", default_value_t = 5000)]
    port: u16,

    /// Documento JSON com as regras
    #[arg(long, env = "NER_RULES_FILE")]
    rules: Option<PathBuf>,

    /// Tamanho mínimo das entidades uniformizadas
    #[arg(long, env = "NER_RULES_MINW", default_value_t = 2)]
    minw: usize,

    /// Modo usado quando a requisição não informa um
    #[arg(long, env = "NER_RULES_MODE", default_value = "rules")]
    mode: Mode,
}

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: Pipeline,
    default_mode: Mode,
}

#[derive(Deserialize)]
struct ProcessRequest {
    input: PathBuf,
    output: PathBuf,
    #[serde(default)]
    mode: Option<Mode>,
}

#[derive(Serialize)]
struct ModuleResponse {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<PipelineReport>,
}

impl ModuleResponse {
    fn ok(report: Option<PipelineReport>) -> Self {
        Self {
            status: "OK",
            message: String::new(),
            report,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "ERROR",
            message: message.into(),
            report: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let rules = args
        .rules
        .as_deref()
        .map(RuleSet::from_path)
        .transpose()
        .context("falha ao carregar as regras")?;

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(rules, args.minw),
        default_mode: args.mode,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("falha ao abrir {addr}"))?;
    info!("🚀 Módulo NER (regras/uniformização) em http://{addr} [modo padrão: {}]", args.mode);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/process", get(process_handler).post(process_handler))
        .route("/checkHealth", get(health_handler).post(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Processa um arquivo CoNLL-U Plus
async fn process_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessRequest>,
) -> impl IntoResponse {
    // entrada vazia é erro do módulo, não do protocolo HTTP
    if req.input.as_os_str().is_empty() {
        return (
            StatusCode::OK,
            Json(ModuleResponse::error("Nenhum arquivo de entrada informado.")),
        );
    }

    let mode = req.mode.unwrap_or(state.default_mode);
    info!("Processando {} [{}]", req.input.display(), mode);

    // O pipeline é síncrono; roda fora das threads do runtime
    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        worker.pipeline.run_paths(mode, &req.input, &req.output)
    })
    .await;

    match result {
        Ok(Ok(report)) => (StatusCode::OK, Json(ModuleResponse::ok(Some(report)))),
        Ok(Err(e)) => {
            error!("falha no processamento: {e}");
            (StatusCode::OK, Json(ModuleResponse::error(e.to_string())))
        }
        Err(e) => {
            error!("tarefa de processamento abortada: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ModuleResponse::error(e.to_string())),
            )
        }
    }
}

/// Verifica se o módulo consegue atender o modo padrão
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.default_mode.needs_rules() && state.pipeline.rules().is_none() {
        return Json(ModuleResponse::error(format!(
            "O modo '{}' exige um arquivo de regras.",
            state.default_mode
        )));
    }
    Json(ModuleResponse::ok(None))
}
