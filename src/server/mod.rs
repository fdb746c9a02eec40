//! Superfície HTTP da automação (`/api/sankhya/*`).
//!
//! Todo o estado fica atrás de um único `tokio::sync::Mutex`, então rodadas e
//! leituras do resumo nunca se sobrepõem, mesmo com requisições concorrentes.

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::accumulator::RunSummary;
use crate::automation::SankhyaAutomation;
use crate::error::AppError;
use crate::planning::{PlanningDate, RoundRange};
use crate::sankhya::OrderService;
use crate::store::PlanningStore;
use types::{ApiResponse, PendingRequest, RoundRequest};

pub type SharedAutomation<S, O> = Arc<Mutex<SankhyaAutomation<S, O>>>;

const BANNER: &str = "Aplicação Unificada - Sankhya Automation";

pub fn router<S, O>(state: SharedAutomation<S, O>) -> Router
where
    S: PlanningStore + 'static,
    O: OrderService + 'static,
{
    Router::new()
        .route("/api/sankhya/verificar_conexoes", post(verificar_conexoes::<S, O>))
        .route("/api/sankhya/buscar_planejamentos", post(buscar_planejamentos::<S, O>))
        .route("/api/sankhya/processar_rodada", post(processar_rodada::<S, O>))
        .route("/api/sankhya/finalizar_conexoes", post(finalizar_conexoes::<S, O>))
        .route("/api/sankhya/resumo", get(resumo::<S, O>))
        .fallback(banner)
        .with_state(state)
}

/// Sobe o servidor e, ao receber Ctrl+C, finaliza as conexões antes de sair.
pub async fn serve<S, O>(state: SharedAutomation<S, O>, addr: &str) -> anyhow::Result<()>
where
    S: PlanningStore + 'static,
    O: OrderService + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "servidor HTTP iniciado");

    axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.lock().await.finalize().await;
    info!("servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "falha ao aguardar sinal de encerramento");
    }
}

fn rejected(rejection: JsonRejection) -> AppError {
    AppError::invalid(format!("Requisição inválida: {}", rejection.body_text()))
}

fn failure(operation: &str, err: AppError) -> Json<ApiResponse> {
    error!(operation, error = %err, "operação falhou");
    Json(ApiResponse::failure(&err))
}

async fn verificar_conexoes<S, O>(State(state): State<SharedAutomation<S, O>>) -> Json<ApiResponse>
where
    S: PlanningStore,
    O: OrderService,
{
    match state.lock().await.verify_connections().await {
        Ok(()) => Json(ApiResponse::ok("Conexões estabelecidas com sucesso")),
        Err(e) => failure("verificar_conexoes", e),
    }
}

async fn buscar_planejamentos<S, O>(
    State(state): State<SharedAutomation<S, O>>,
    payload: Result<Json<PendingRequest>, JsonRejection>,
) -> Json<ApiResponse>
where
    S: PlanningStore,
    O: OrderService,
{
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return failure("buscar_planejamentos", rejected(rejection)),
    };
    let parsed = PlanningDate::parse(&req.data_planejamento)
        .and_then(|date| Ok((date, RoundRange::new(req.rodada_inicial, req.rodada_final)?)));
    let (date, rounds) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return failure("buscar_planejamentos", e),
    };

    match state.lock().await.count_pending(date, req.braco, rounds).await {
        Ok(total) => Json(ApiResponse::total(total)),
        Err(e) => failure("buscar_planejamentos", e),
    }
}

async fn processar_rodada<S, O>(
    State(state): State<SharedAutomation<S, O>>,
    payload: Result<Json<RoundRequest>, JsonRejection>,
) -> Json<ApiResponse>
where
    S: PlanningStore,
    O: OrderService,
{
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return failure("processar_rodada", rejected(rejection)),
    };
    let date = match PlanningDate::parse(&req.data_planejamento) {
        Ok(date) => date,
        Err(e) => return failure("processar_rodada", e),
    };

    let result = state
        .lock()
        .await
        .process_round(date, req.braco, req.rodada)
        .await;
    match result {
        Ok(report) => Json(ApiResponse::from(&report)),
        Err(e) => failure("processar_rodada", e),
    }
}

async fn finalizar_conexoes<S, O>(State(state): State<SharedAutomation<S, O>>) -> Json<ApiResponse>
where
    S: PlanningStore,
    O: OrderService,
{
    state.lock().await.finalize().await;
    Json(ApiResponse::ok("Conexões finalizadas"))
}

async fn resumo<S, O>(State(state): State<SharedAutomation<S, O>>) -> Json<RunSummary>
where
    S: PlanningStore,
    O: OrderService,
{
    Json(state.lock().await.summary())
}

async fn banner() -> &'static str {
    BANNER
}
