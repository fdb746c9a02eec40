//! Corpos JSON dos endpoints `/api/sankhya/*`.
//!
//! Falhas de aplicação respondem HTTP 200 com `sucesso: false` e `erro`;
//! campos ausentes não são serializados.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::orchestrator::{BatchStatus, RoundReport};

/// Corpo de `buscar_planejamentos`.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingRequest {
    pub data_planejamento: String,
    pub braco: i32,
    pub rodada_inicial: i32,
    pub rodada_final: i32,
}

/// Corpo de `processar_rodada`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoundRequest {
    pub data_planejamento: String,
    pub braco: i32,
    pub rodada: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub sucesso: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mensagem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processados: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops_criadas: Option<usize>,
}

impl ApiResponse {
    pub fn ok(mensagem: impl Into<String>) -> Self {
        Self {
            sucesso: true,
            mensagem: Some(mensagem.into()),
            ..Self::default()
        }
    }

    pub fn failure(err: &AppError) -> Self {
        Self {
            sucesso: false,
            erro: Some(err.to_string()),
            ..Self::default()
        }
    }

    pub fn total(total: u64) -> Self {
        Self {
            sucesso: true,
            total: Some(total),
            ..Self::default()
        }
    }
}

impl From<&RoundReport> for ApiResponse {
    fn from(report: &RoundReport) -> Self {
        let rodada = report.round;
        let counts = Self {
            processados: Some(report.processed()),
            ops_criadas: Some(report.created.len()),
            ..Self::default()
        };

        if report.attempted == 0 {
            return Self {
                sucesso: true,
                mensagem: Some(format!(
                    "Nenhum planejamento pendente para a rodada {rodada}"
                )),
                ..counts
            };
        }

        match report.batch {
            BatchStatus::Registered => Self {
                sucesso: true,
                ..counts
            },
            BatchStatus::Skipped => Self {
                sucesso: true,
                mensagem: Some("Nenhuma OP criada com sucesso".to_string()),
                ..counts
            },
            BatchStatus::Failed => Self {
                sucesso: false,
                erro: Some(format!(
                    "Falha ao registrar lote/braço para a rodada {rodada}"
                )),
                ..counts
            },
        }
    }
}
