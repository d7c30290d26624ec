//! Servidor web Axum para extração de objetos astronômicos, com streaming via WebSocket
//!
//! Rotas:
//! - `GET /isalive`: verificação de saúde
//! - `POST /processAstroText`: `{"text": ...}` → `{"runtime": ms, "entities": [...]}`
//! - `GET /ws`: recebe um texto e transmite os `PipelineEvent`s como JSON

use astro_core::{AstroConfig, AstroEntity, AstroParser, PipelineEvent};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Estado compartilhado da aplicação: o contexto é montado uma vez e só lido depois.
struct AppState {
    parser: AstroParser,
}

#[derive(Deserialize)]
struct ProcessRequest {
    text: String,
}

#[derive(Serialize)]
struct ProcessResponse {
    runtime: u64,
    entities: Vec<AstroEntity>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // arquivo TOML opcional como primeiro argumento; variáveis de ambiente prevalecem
    let config = AstroConfig::load(std::env::args().nth(1).map(PathBuf::from))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let parser = config.build_parser()?;
    info!(
        "Léxico: {} termos | etiquetador: {}",
        parser.lexicon().vocabulary_size(),
        parser.labeler_name()
    );
    let state = Arc::new(AppState { parser });

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("🚀 Servidor astro iniciado em http://{}", config.bind_address());
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/isalive", get(is_alive_handler))
        .route("/processAstroText", post(process_text_handler))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn is_alive_handler() -> &'static str {
    "true"
}

fn error_response(status: StatusCode, message: String) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Extração síncrona via HTTP POST
async fn process_text_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Texto vazio".to_string());
    }

    let start = Instant::now();
    let text_len = req.text.len();
    // o etiquetador é bloqueante: roda fora do runtime
    let result =
        tokio::task::spawn_blocking(move || state.parser.process_text(&req.text)).await;

    match result {
        Ok(Ok(entities)) => {
            let runtime = start.elapsed().as_millis() as u64;
            info!("{} chars → {} entidades em {} ms", text_len, entities.len(), runtime);
            Json(ProcessResponse { runtime, entities }).into_response()
        }
        Ok(Err(e)) => {
            error!("Falha ao processar texto: {}", e);
            let status = if e.is_labeling_failure() {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            error_response(status, e.to_string())
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Recebe texto (JSON `{"text"}` ou texto puro), executa o pipeline e envia os eventos
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let text = match serde_json::from_str::<ProcessRequest>(&text) {
                    Ok(req) => req.text,
                    Err(_) => text.to_string(),
                };
                if text.trim().is_empty() {
                    continue;
                }

                let events = run_streaming(Arc::clone(&state), text).await;
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            return; // cliente desconectou
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

/// Executa o pipeline fora do runtime e devolve os eventos emitidos.
/// Se a tarefa falhar (pânico), a sequência termina com `PipelineEvent::Error`.
async fn run_streaming(state: Arc<AppState>, text: String) -> Vec<PipelineEvent> {
    let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
    let joined = tokio::task::spawn_blocking(move || {
        state.parser.process_text_streaming(&text, tx);
    })
    .await;

    // a tarefa terminou: todos os eventos já estão no canal
    let mut events: Vec<PipelineEvent> = rx.try_iter().collect();
    if let Err(e) = joined {
        error!("Pipeline abortado: {}", e);
        events.push(PipelineEvent::Error {
            message: format!("pipeline abortado: {e}"),
        });
    }
    events
}
