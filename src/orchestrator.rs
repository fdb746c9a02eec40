use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::accumulator::RunAccumulator;
use crate::error::AppError;
use crate::planning::{PendingFilter, PlanningDate, PlanningRecord, RoundRange};
use crate::sankhya::OrderService;
use crate::store::PlanningStore;

/// Why a single planning row did not end up linked to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFailure {
    /// The remote service refused the order or returned no identifier.
    CreationFailed { message: String },
    /// The order exists remotely but the row was not updated (dangling order).
    LinkFailed { idiproc: i64 },
    /// Anything else that went wrong while handling the row.
    UnexpectedFault { message: String },
}

impl RecordFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            RecordFailure::CreationFailed { .. } => "falha_criacao",
            RecordFailure::LinkFailed { .. } => "falha_vinculo",
            RecordFailure::UnexpectedFault { .. } => "falha_inesperada",
        }
    }
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFailure::CreationFailed { message } => write!(f, "{message}"),
            RecordFailure::LinkFailed { idiproc } => {
                write!(f, "OP {idiproc} criada, mas falha ao atualizar banco")
            }
            RecordFailure::UnexpectedFault { message } => write!(f, "{message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Created { idiproc: i64 },
    Failed(RecordFailure),
}

/// What happened to the batching step at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// No order was created, nothing to batch.
    Skipped,
    Registered,
    /// Orders stay created and linked; only the batch is missing.
    Failed,
}

/// Outcome of one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub round: i32,
    /// Rows fetched for the round.
    pub attempted: usize,
    /// Identifiers created and linked, in processing order.
    pub created: Vec<i64>,
    pub failures: Vec<(i64, RecordFailure)>,
    pub batch: BatchStatus,
}

impl RoundReport {
    fn empty(round: i32) -> Self {
        Self {
            round,
            attempted: 0,
            created: Vec::new(),
            failures: Vec::new(),
            batch: BatchStatus::Skipped,
        }
    }

    /// Rows fully processed: order created and linked.
    pub fn processed(&self) -> usize {
        self.created.len()
    }

    pub fn succeeded(&self) -> bool {
        self.batch != BatchStatus::Failed
    }
}

/// Fixed pause between consecutive order submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    delay: Duration,
}

impl Pacing {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    #[cfg(test)]
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

/// Runs one round: re-authenticate, fetch, create and link each row, batch.
///
/// Borrows connected gateways; the caller guarantees only one round runs at a time.
pub struct RoundOrchestrator<'a, S, O> {
    store: &'a S,
    orders: &'a mut O,
    pacing: Pacing,
}

impl<'a, S: PlanningStore, O: OrderService> RoundOrchestrator<'a, S, O> {
    pub fn new(store: &'a S, orders: &'a mut O, pacing: Pacing) -> Self {
        Self {
            store,
            orders,
            pacing,
        }
    }

    #[instrument(skip(self, date, accumulator), fields(data = %date))]
    pub async fn process_round(
        &mut self,
        date: PlanningDate,
        braco: i32,
        rodada: i32,
        accumulator: &mut RunAccumulator,
    ) -> Result<RoundReport, AppError> {
        // Sessions are not assumed to survive between rounds.
        if !self.orders.authenticate().await {
            error!("re-authentication failed, round aborted");
            return Err(AppError::Authentication(rodada));
        }

        let filter = PendingFilter {
            date,
            braco,
            rounds: RoundRange::single(rodada),
        };
        let records = self.store.fetch_pending(&filter).await?;
        if records.is_empty() {
            info!("no pending planning rows");
            return Ok(RoundReport::empty(rodada));
        }

        let mut report = RoundReport {
            attempted: records.len(),
            ..RoundReport::empty(rodada)
        };

        for (index, record) in records.iter().enumerate() {
            if index > 0 {
                self.pacing.pause().await;
            }

            let outcome = match self.process_record(record).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let message = format!(
                        "Erro inesperado ao processar NUPLAN {}: {e}",
                        record.nuplan
                    );
                    error!(nuplan = record.nuplan, error = %e, "unexpected fault");
                    RecordOutcome::Failed(RecordFailure::UnexpectedFault { message })
                }
            };

            match outcome {
                RecordOutcome::Created { idiproc } => {
                    accumulator.record_success(record.nuplan, idiproc);
                    report.created.push(idiproc);
                }
                RecordOutcome::Failed(failure) => {
                    warn!(nuplan = record.nuplan, kind = failure.kind(), "{failure}");
                    accumulator.record_failure(record.nuplan, &failure);
                    report.failures.push((record.nuplan, failure));
                }
            }
        }

        report.batch = self.register_batch(&report.created, braco).await;
        info!(
            attempted = report.attempted,
            created = report.created.len(),
            failed = report.failures.len(),
            batch = ?report.batch,
            "round finished"
        );
        Ok(report)
    }

    async fn process_record(&self, record: &PlanningRecord) -> Result<RecordOutcome, AppError> {
        let creation = self
            .orders
            .create_production_order(record.codprod, record.qtdplan)
            .await;

        let idiproc = match (creation.success, creation.idiproc) {
            (true, Some(idiproc)) => idiproc,
            _ => {
                return Ok(RecordOutcome::Failed(RecordFailure::CreationFailed {
                    message: creation.message,
                }));
            }
        };

        if self.store.link_order(record.nuplan, idiproc).await? {
            info!(nuplan = record.nuplan, idiproc, "order created and linked");
            Ok(RecordOutcome::Created { idiproc })
        } else {
            Ok(RecordOutcome::Failed(RecordFailure::LinkFailed { idiproc }))
        }
    }

    async fn register_batch(&self, created: &[i64], braco: i32) -> BatchStatus {
        if created.is_empty() {
            return BatchStatus::Skipped;
        }
        match self.store.run_batch_procedure(created, braco).await {
            Ok(true) => BatchStatus::Registered,
            Ok(false) => BatchStatus::Failed,
            Err(e) => {
                error!(error = %e, "batch procedure could not run");
                BatchStatus::Failed
            }
        }
    }
}
