//! Tipos do planejamento de produção lidos da tabela `AD_PLAN`.
//!
//! [`PlanningRecord`] é uma linha pendente (sem `IDIPROC`). [`PlanningDate`] e
//! [`RoundRange`] validam os filtros recebidos pela API antes de chegarem ao banco.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Formato canônico da data de planejamento, igual ao usado no `TO_DATE` da consulta.
pub const PLANNING_DATE_FORMAT: &str = "%Y-%m-%d";

/// Uma linha de planejamento ainda não vinculada a uma OP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRecord {
    /// Chave da linha (NUPLAN).
    pub nuplan: i64,
    /// Produto acabado a produzir (CODPROD).
    pub codprod: i64,
    /// Quantidade planejada, enviada como tamanho do lote (QTDPLAN).
    pub qtdplan: f64,
}

/// Data de planejamento validada no formato `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningDate(NaiveDate);

impl PlanningDate {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        NaiveDate::parse_from_str(raw.trim(), PLANNING_DATE_FORMAT)
            .map(Self)
            .map_err(|_| {
                AppError::invalid(format!(
                    "Data de planejamento inválida '{raw}': use o formato AAAA-MM-DD"
                ))
            })
    }
}

impl fmt::Display for PlanningDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(PLANNING_DATE_FORMAT))
    }
}

/// Faixa inclusiva de rodadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRange {
    pub first: i32,
    pub last: i32,
}

impl RoundRange {
    pub fn new(first: i32, last: i32) -> Result<Self, AppError> {
        if first > last {
            return Err(AppError::invalid(
                "Rodada inicial não pode ser maior que a rodada final",
            ));
        }
        Ok(Self { first, last })
    }

    /// Faixa de uma única rodada.
    pub fn single(round: i32) -> Self {
        Self {
            first: round,
            last: round,
        }
    }

    pub fn count(&self) -> u64 {
        (i64::from(self.last) - i64::from(self.first) + 1) as u64
    }

    pub fn rounds(&self) -> impl Iterator<Item = i32> {
        self.first..=self.last
    }
}

/// Filtro completo de uma consulta de pendências.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFilter {
    pub date: PlanningDate,
    pub braco: i32,
    pub rounds: RoundRange,
}
