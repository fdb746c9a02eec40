//! Fluxo completo da automação: conexões, contagem, rodadas e resumo.
//!
//! [`SankhyaAutomation`] é dona dos dois gateways e do [`RunAccumulator`].
//! As rodadas só rodam no estado [`ConnectionState::Connected`], alcançado por
//! [`SankhyaAutomation::verify_connections`] e desfeito por
//! [`SankhyaAutomation::finalize`].

use tracing::info;

use crate::accumulator::{RunAccumulator, RunSummary};
use crate::error::AppError;
use crate::orchestrator::{Pacing, RoundOrchestrator, RoundReport};
use crate::planning::{PendingFilter, PlanningDate, RoundRange};
use crate::sankhya::OrderService;
use crate::store::PlanningStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

pub struct SankhyaAutomation<S, O> {
    store: S,
    orders: O,
    state: ConnectionState,
    accumulator: RunAccumulator,
    pacing: Pacing,
}

impl<S: PlanningStore, O: OrderService> SankhyaAutomation<S, O> {
    pub fn new(store: S, orders: O, pacing: Pacing) -> Self {
        Self {
            store,
            orders,
            state: ConnectionState::Disconnected,
            accumulator: RunAccumulator::new(),
            pacing,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Conecta e testa o banco, depois testa a API (que não deixa sessão aberta).
    pub async fn verify_connections(&mut self) -> Result<(), AppError> {
        if !self.store.connect().await || !self.store.test_connection().await {
            self.state = ConnectionState::Disconnected;
            return Err(AppError::not_connected(
                "Falha na conexão com o banco Oracle",
            ));
        }

        if !self.orders.test_connection().await {
            self.store.disconnect().await;
            self.state = ConnectionState::Disconnected;
            return Err(AppError::not_connected(
                "Falha na conexão com a API Sankhya",
            ));
        }

        self.state = ConnectionState::Connected;
        info!("Conexões estabelecidas com sucesso");
        Ok(())
    }

    pub async fn count_pending(
        &self,
        date: PlanningDate,
        braco: i32,
        rounds: RoundRange,
    ) -> Result<u64, AppError> {
        if self.state == ConnectionState::Disconnected {
            return Err(AppError::not_connected(
                "Conexão com banco não estabelecida",
            ));
        }
        let filter = PendingFilter {
            date,
            braco,
            rounds,
        };
        let total = self.store.count_pending(&filter).await?;
        info!(total, braco, first = rounds.first, last = rounds.last, "pendências contadas");
        Ok(total)
    }

    pub async fn process_round(
        &mut self,
        date: PlanningDate,
        braco: i32,
        rodada: i32,
    ) -> Result<RoundReport, AppError> {
        match self.state {
            ConnectionState::Disconnected => {
                Err(AppError::not_connected("Conexões não estabelecidas"))
            }
            ConnectionState::Connected => {
                RoundOrchestrator::new(&self.store, &mut self.orders, self.pacing)
                    .process_round(date, braco, rodada, &mut self.accumulator)
                    .await
            }
        }
    }

    /// Logout e desconexão, sempre sem erro.
    pub async fn finalize(&mut self) {
        self.orders.logout().await;
        self.store.disconnect().await;
        if self.state == ConnectionState::Connected {
            info!(
                criadas = self.accumulator.total_orders_created(),
                falhas = self.accumulator.total_failures(),
                "Conexões finalizadas"
            );
        }
        self.state = ConnectionState::Disconnected;
    }

    pub fn summary(&self) -> RunSummary {
        self.accumulator.summary()
    }
}
