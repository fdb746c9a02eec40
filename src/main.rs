mod accumulator;
mod automation;
mod cli;
mod config;
mod error;
mod logging;
mod orchestrator;
mod planning;
mod runner;
mod sankhya;
mod server;
mod store;
#[cfg(test)]
mod test_support;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Mutex;
use tracing::info;

use automation::SankhyaAutomation;
use cli::{Cli, Command};
use config::AppConfig;
use orchestrator::Pacing;
use planning::{PlanningDate, RoundRange};
use sankhya::SankhyaClient;
use store::OracleStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    let _log_guard = logging::init(&config.logging, cli.verbose)?;

    let store = OracleStore::new(config.database.clone());
    let orders = SankhyaClient::new(&config.sankhya).context("failed to build Sankhya client")?;
    let pacing = Pacing::new(config.pacing.record_delay());
    info!(record_delay = ?pacing.delay(), round_delay = ?config.pacing.round_delay(), "ritmo configurado");
    let mut automation = SankhyaAutomation::new(store, orders, pacing);

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{host}:{port}");
            server::serve(Arc::new(Mutex::new(automation)), &addr).await?;
        }
        Command::Check => {
            runner::check(&mut automation).await?;
            println!("Conexões estabelecidas com sucesso");
        }
        Command::Run {
            data,
            braco,
            rodada_inicial,
            rodada_final,
        } => {
            let plan = runner::RunPlan {
                date: PlanningDate::parse(&data)?,
                braco,
                rounds: RoundRange::new(rodada_inicial, rodada_final)?,
                round_delay: config.pacing.round_delay(),
            };
            info!(data = %plan.date, braco, rodada_inicial, rodada_final, "execução iniciada");
            let progress = ui::RunProgress::start(plan.rounds.count());
            runner::run(&mut automation, plan, &progress).await?;
        }
    }

    Ok(())
}
