//! Acesso à tabela de planejamento (`AD_PLAN`) e à procedure de geração de lote.

pub mod oracle;

use async_trait::async_trait;

use crate::error::AppError;
use crate::planning::{PendingFilter, PlanningRecord};

pub use self::oracle::OracleStore;

/// Operações que o orquestrador precisa do banco de planejamento.
///
/// Erros de banco são tratados dentro da implementação (log + valor neutro);
/// `Err` fica reservado para falta de conexão e falhas fora do banco.
#[async_trait]
pub trait PlanningStore: Send + Sync {
    /// Abre (ou reaproveita) a conexão. `false` deixa o store desconectado.
    async fn connect(&mut self) -> bool;

    async fn disconnect(&mut self);

    /// Consulta mínima de ida e volta para validar a conexão.
    async fn test_connection(&self) -> bool;

    /// Quantidade de linhas pendentes no filtro.
    async fn count_pending(&self, filter: &PendingFilter) -> Result<u64, AppError>;

    /// Linhas pendentes no filtro, em ordem crescente de NUPLAN.
    async fn fetch_pending(&self, filter: &PendingFilter) -> Result<Vec<PlanningRecord>, AppError>;

    /// Grava o IDIPROC na linha e confirma. `true` somente se uma linha foi alterada.
    async fn link_order(&self, nuplan: i64, idiproc: i64) -> Result<bool, AppError>;

    /// Agrupa as OPs em um lote registrando o braço. Lista vazia não faz nada.
    async fn run_batch_procedure(&self, idiprocs: &[i64], braco: i32) -> Result<bool, AppError>;
}
