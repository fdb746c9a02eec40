use std::sync::Arc;

use async_trait::async_trait;
use oracle::Connection;
use oracle::sql_type::{OracleType, ToSql};
use tracing::{debug, error, info, warn};

use super::PlanningStore;
use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::planning::{PendingFilter, PlanningRecord};

const PENDING_PREDICATE: &str = "
    WHERE TRUNC(DTINC) = TO_DATE(:data_planejamento, 'YYYY-MM-DD')
      AND BRACO = :braco
      AND RODADA BETWEEN :rodada_inicial AND :rodada_final
      AND IDIPROC IS NULL";

const LINK_ORDER_SQL: &str = "UPDATE AD_PLAN SET IDIPROC = :idiproc WHERE NUPLAN = :nuplan";

const BATCH_PROCEDURE_SQL: &str =
    "BEGIN STP_GERAR_RODADA_VASAP_EXT(:idiprocs, :braco, :mensagem); END;";

const PING_SQL: &str = "SELECT 1 FROM DUAL";

/// Conexão do store: ausente ou aberta.
enum Handle {
    Disconnected,
    Connected(Arc<Connection>),
}

/// Store de planejamento sobre uma conexão Oracle dedicada.
///
/// O driver é síncrono; cada operação roda em `spawn_blocking`.
pub struct OracleStore {
    config: DatabaseConfig,
    handle: Handle,
}

impl OracleStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            handle: Handle::Disconnected,
        }
    }

    fn connection(&self) -> Result<Arc<Connection>, AppError> {
        match &self.handle {
            Handle::Connected(conn) => Ok(Arc::clone(conn)),
            Handle::Disconnected => Err(AppError::not_connected(
                "Conexão com banco não estabelecida",
            )),
        }
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> T + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection()?;
        Ok(tokio::task::spawn_blocking(move || op(&conn)).await?)
    }
}

fn pending_sql(select: &str, order_by: &str) -> String {
    format!("{select} FROM AD_PLAN {PENDING_PREDICATE} {order_by}")
}

fn filter_params(filter: &PendingFilter) -> (String, i32, i32, i32) {
    (
        filter.date.to_string(),
        filter.braco,
        filter.rounds.first,
        filter.rounds.last,
    )
}

fn query_count(conn: &Connection, filter: (String, i32, i32, i32)) -> oracle::Result<i64> {
    let (date, braco, first, last) = filter;
    conn.query_row_as_named::<i64>(
        &pending_sql("SELECT COUNT(*)", ""),
        &[
            ("data_planejamento", &date as &dyn ToSql),
            ("braco", &braco as &dyn ToSql),
            ("rodada_inicial", &first as &dyn ToSql),
            ("rodada_final", &last as &dyn ToSql),
        ],
    )
}

fn query_pending(
    conn: &Connection,
    filter: (String, i32, i32, i32),
) -> oracle::Result<Vec<PlanningRecord>> {
    let (date, braco, first, last) = filter;
    let rows = conn.query_named(
        &pending_sql("SELECT NUPLAN, CODPROD, QTDPLAN", "ORDER BY NUPLAN"),
        &[
            ("data_planejamento", &date as &dyn ToSql),
            ("braco", &braco as &dyn ToSql),
            ("rodada_inicial", &first as &dyn ToSql),
            ("rodada_final", &last as &dyn ToSql),
        ],
    )?;

    let mut records = Vec::new();
    for row in rows {
        let row = row?;
        records.push(PlanningRecord {
            nuplan: row.get::<usize, i64>(0)?,
            codprod: row.get::<usize, i64>(1)?,
            qtdplan: row.get::<usize, f64>(2)?,
        });
    }
    Ok(records)
}

fn update_idiproc(conn: &Connection, nuplan: i64, idiproc: i64) -> oracle::Result<u64> {
    let stmt = conn.execute_named(
        LINK_ORDER_SQL,
        &[
            ("idiproc", &idiproc as &dyn ToSql),
            ("nuplan", &nuplan as &dyn ToSql),
        ],
    )?;
    let affected = stmt.row_count()?;
    conn.commit()?;
    Ok(affected)
}

fn call_batch_procedure(
    conn: &Connection,
    idiprocs: &str,
    braco: i32,
) -> oracle::Result<Option<String>> {
    let stmt = conn.execute_named(
        BATCH_PROCEDURE_SQL,
        &[
            ("idiprocs", &idiprocs as &dyn ToSql),
            ("braco", &braco as &dyn ToSql),
            ("mensagem", &OracleType::Varchar2(4000) as &dyn ToSql),
        ],
    )?;
    let message = stmt.bind_value::<&str, Option<String>>("mensagem")?;
    conn.commit()?;
    Ok(message)
}

fn rollback(conn: &Connection, operation: &str) {
    if let Err(e) = conn.rollback() {
        error!(operation, error = %e, "Erro ao desfazer transação");
    }
}

/// Junta os IDIPROCs no formato esperado pela procedure (`"1,2,3"`).
pub fn join_idiprocs(idiprocs: &[i64]) -> String {
    idiprocs
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl PlanningStore for OracleStore {
    async fn connect(&mut self) -> bool {
        if let Handle::Connected(conn) = &self.handle {
            let conn = Arc::clone(conn);
            let alive = tokio::task::spawn_blocking(move || conn.ping().is_ok())
                .await
                .unwrap_or(false);
            if alive {
                debug!("reaproveitando conexão Oracle existente");
                return true;
            }
            self.disconnect().await;
        }

        info!("Conectando ao banco de dados Oracle...");
        let DatabaseConfig {
            username,
            password,
            connect_string,
        } = self.config.clone();
        let result = tokio::task::spawn_blocking(move || {
            Connection::connect(username, password, connect_string)
        })
        .await;

        match result {
            Ok(Ok(conn)) => {
                info!("Conexão com o banco de dados estabelecida com sucesso.");
                self.handle = Handle::Connected(Arc::new(conn));
                true
            }
            Ok(Err(e)) => {
                error!(error = %e, "Erro ao conectar com o banco de dados");
                false
            }
            Err(e) => {
                error!(error = %e, "Erro inesperado ao conectar com o banco");
                false
            }
        }
    }

    async fn disconnect(&mut self) {
        let previous = std::mem::replace(&mut self.handle, Handle::Disconnected);
        if let Handle::Connected(conn) = previous {
            let closed = tokio::task::spawn_blocking(move || conn.close()).await;
            match closed {
                Ok(Ok(())) => info!("Conexão com o banco de dados fechada."),
                Ok(Err(e)) => error!(error = %e, "Erro ao fechar conexão com o banco"),
                Err(e) => error!(error = %e, "Erro ao fechar conexão com o banco"),
            }
        }
    }

    async fn test_connection(&self) -> bool {
        let result = self
            .with_connection(|conn| conn.query_row_as::<i64>(PING_SQL, &[]))
            .await;
        match result {
            Ok(Ok(1)) => true,
            Ok(Ok(other)) => {
                warn!(value = other, "teste de conexão retornou valor inesperado");
                false
            }
            Ok(Err(e)) => {
                error!(error = %e, "Erro no teste de conexão");
                false
            }
            Err(_) => false,
        }
    }

    async fn count_pending(&self, filter: &PendingFilter) -> Result<u64, AppError> {
        let params = filter_params(filter);
        match self.with_connection(move |conn| query_count(conn, params)).await? {
            Ok(total) => Ok(u64::try_from(total).unwrap_or(0)),
            Err(e) => {
                error!(error = %e, "Erro ao executar contagem SQL");
                Ok(0)
            }
        }
    }

    async fn fetch_pending(&self, filter: &PendingFilter) -> Result<Vec<PlanningRecord>, AppError> {
        let params = filter_params(filter);
        match self.with_connection(move |conn| query_pending(conn, params)).await? {
            Ok(records) => {
                info!(total = records.len(), "planejamentos pendentes encontrados");
                Ok(records)
            }
            Err(e) => {
                error!(error = %e, "Erro ao executar consulta SQL");
                Ok(Vec::new())
            }
        }
    }

    async fn link_order(&self, nuplan: i64, idiproc: i64) -> Result<bool, AppError> {
        let outcome = self
            .with_connection(move |conn| {
                let result = update_idiproc(conn, nuplan, idiproc);
                if result.is_err() {
                    rollback(conn, "atualização de IDIPROC");
                }
                result
            })
            .await?;

        match outcome {
            Ok(0) => {
                warn!(nuplan, "Nenhum registro foi atualizado");
                Ok(false)
            }
            Ok(_) => {
                info!(nuplan, idiproc, "IDIPROC atualizado");
                Ok(true)
            }
            Err(e) => {
                error!(nuplan, idiproc, error = %e, "Erro ao atualizar IDIPROC");
                Ok(false)
            }
        }
    }

    async fn run_batch_procedure(&self, idiprocs: &[i64], braco: i32) -> Result<bool, AppError> {
        if idiprocs.is_empty() {
            warn!("Nenhuma OP criada, a geração de lote não será executada.");
            return Ok(true);
        }

        let joined = join_idiprocs(idiprocs);
        info!(idiprocs = %joined, braco, "Chamando procedure STP_GERAR_RODADA_VASAP_EXT");

        let outcome = self
            .with_connection(move |conn| {
                let result = call_batch_procedure(conn, &joined, braco);
                if result.is_err() {
                    rollback(conn, "procedure de lote");
                }
                result
            })
            .await?;

        match outcome {
            Ok(message) => {
                info!(
                    mensagem = message.as_deref().unwrap_or(""),
                    "Procedure de geração de lote executada com sucesso"
                );
                Ok(true)
            }
            Err(e) => {
                error!(braco, error = %e, "Erro ao executar a procedure de geração de lote");
                Ok(false)
            }
        }
    }
}
