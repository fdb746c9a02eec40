//! Execução direta pelo terminal, sem o servidor HTTP.
//!
//! Reproduz a sequência do painel web: verificar conexões, contar
//! pendências, processar cada rodada da faixa com uma pausa entre elas e
//! finalizar. Falha em uma rodada não interrompe as seguintes.

use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::accumulator::RunSummary;
use crate::automation::SankhyaAutomation;
use crate::planning::{PlanningDate, RoundRange};
use crate::sankhya::OrderService;
use crate::store::PlanningStore;
use crate::ui::RunProgress;

/// Parâmetros de uma execução pelo comando `run`.
#[derive(Debug, Clone, Copy)]
pub struct RunPlan {
    pub date: PlanningDate,
    pub braco: i32,
    pub rounds: RoundRange,
    pub round_delay: Duration,
}

/// Verifica as conexões e as encerra em seguida.
pub async fn check<S, O>(automation: &mut SankhyaAutomation<S, O>) -> Result<()>
where
    S: PlanningStore,
    O: OrderService,
{
    let result = automation.verify_connections().await;
    automation.finalize().await;
    result?;
    Ok(())
}

pub async fn run<S, O>(
    automation: &mut SankhyaAutomation<S, O>,
    plan: RunPlan,
    progress: &RunProgress,
) -> Result<RunSummary>
where
    S: PlanningStore,
    O: OrderService,
{
    let result = run_rounds(automation, plan, progress).await;
    automation.finalize().await;
    result?;

    let summary = automation.summary();
    progress.finish(&summary);
    Ok(summary)
}

async fn run_rounds<S, O>(
    automation: &mut SankhyaAutomation<S, O>,
    plan: RunPlan,
    progress: &RunProgress,
) -> Result<()>
where
    S: PlanningStore,
    O: OrderService,
{
    automation.verify_connections().await?;
    progress.info("Conexões estabelecidas com sucesso");

    let total = automation
        .count_pending(plan.date, plan.braco, plan.rounds)
        .await?;
    if total == 0 {
        info!(data = %plan.date, braco = plan.braco, "nenhum planejamento pendente");
        progress.info("Nenhum planejamento pendente encontrado para os critérios informados");
        return Ok(());
    }
    progress.info(&format!("Encontrados {total} planejamentos pendentes"));

    let mut rounds = plan.rounds.rounds().peekable();
    while let Some(rodada) = rounds.next() {
        progress.round_started(rodada);
        match automation.process_round(plan.date, plan.braco, rodada).await {
            Ok(report) => {
                if !report.succeeded() {
                    warn!(rodada, "lote da rodada não registrado");
                }
                progress.round_finished(&report);
            }
            Err(e) => {
                warn!(rodada, error = %e, "rodada falhou");
                progress.round_failed(rodada, &e);
            }
        }
        if rounds.peek().is_some() && !plan.round_delay.is_zero() {
            tokio::time::sleep(plan.round_delay).await;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::ConnectionState;
    use crate::orchestrator::Pacing;
    use crate::sankhya::OrderCreation;
    use crate::test_support::{FakeOrders, FakeStore, record};

    fn plan(first: i32, last: i32) -> RunPlan {
        RunPlan {
            date: PlanningDate::parse("2025-06-02").unwrap(),
            braco: 2,
            rounds: RoundRange::new(first, last).unwrap(),
            round_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn run_processes_every_round_and_finalizes() {
        let store = FakeStore::new(vec![
            (1, record(1, 10, 1.0)),
            (2, record(2, 20, 1.0)),
            (3, record(3, 30, 1.0)),
        ]);
        let orders = FakeOrders::new().respond(20, OrderCreation::failed("insufficient stock"));
        let mut auto = SankhyaAutomation::new(store, orders, Pacing::none());

        let summary = run(&mut auto, plan(1, 3), &RunProgress::hidden())
            .await
            .unwrap();

        assert_eq!(summary.total_ops_criadas, 2);
        assert_eq!(summary.total_falhas, 1);
        assert_eq!(summary.detalhes_falhas[0].nuplan, 2);
        assert_eq!(auto.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn run_continues_after_round_error() {
        let store = FakeStore::new(vec![(1, record(1, 10, 1.0)), (2, record(2, 20, 1.0))]);
        // verify consumes one authentication, round 1 the second
        let orders = FakeOrders::new().auth_limit(2);
        let mut auto = SankhyaAutomation::new(store, orders, Pacing::none());

        let summary = run(&mut auto, plan(1, 2), &RunProgress::hidden())
            .await
            .unwrap();

        assert_eq!(summary.total_ops_criadas, 1);
        assert_eq!(summary.total_falhas, 0);
    }

    #[tokio::test]
    async fn run_stops_early_without_pending_records() {
        let mut auto = SankhyaAutomation::new(FakeStore::new(vec![]), FakeOrders::new(), Pacing::none());

        let summary = run(&mut auto, plan(1, 5), &RunProgress::hidden())
            .await
            .unwrap();

        assert_eq!(summary.total_ops_criadas, 0);
        assert_eq!(summary.total_falhas, 0);
        assert_eq!(auto.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn run_fails_when_connections_fail() {
        let mut auto = SankhyaAutomation::new(
            FakeStore::new(vec![(1, record(1, 10, 1.0))]).failing_connect(),
            FakeOrders::new(),
            Pacing::none(),
        );

        let err = run(&mut auto, plan(1, 1), &RunProgress::hidden())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Falha na conexão com o banco Oracle");
        assert_eq!(auto.summary().total_ops_criadas, 0);
    }

    #[tokio::test]
    async fn check_always_finalizes() {
        let mut auto = SankhyaAutomation::new(FakeStore::new(vec![]), FakeOrders::new(), Pacing::none());
        check(&mut auto).await.unwrap();
        assert_eq!(auto.state(), ConnectionState::Disconnected);

        let mut auto = SankhyaAutomation::new(
            FakeStore::new(vec![]),
            FakeOrders::new().failing_test(),
            Pacing::none(),
        );
        let err = check(&mut auto).await.unwrap_err();
        assert_eq!(err.to_string(), "Falha na conexão com a API Sankhya");
    }
}
