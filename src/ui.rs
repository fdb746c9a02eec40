//! Progresso no terminal para o comando `run`.
//!
//! Usa `indicatif` para a barra de rodadas e `console` para as cores. As
//! mensagens seguem as do painel web: uma linha por rodada e o resumo ao final.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::accumulator::RunSummary;
use crate::error::AppError;
use crate::orchestrator::RoundReport;
use crate::server::types::ApiResponse;

pub struct RunProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl RunProgress {
    /// Inicia a barra com o total de rodadas da faixa.
    pub fn start(total_rounds: u64) -> Self {
        let pb = ProgressBar::new(total_rounds);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("invalid template")
                .progress_chars("=> "),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self::with_bar(pb)
    }

    /// Progresso sem saída, para testes.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(pb: ProgressBar) -> Self {
        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub fn info(&self, message: &str) {
        self.pb.println(format!("  {message}"));
    }

    pub fn round_started(&self, rodada: i32) {
        self.pb.set_message(format!("Processando rodada {rodada}"));
    }

    pub fn round_finished(&self, report: &RoundReport) {
        let response = ApiResponse::from(report);
        let rodada = report.round;
        if !response.sucesso {
            let erro = response.erro.unwrap_or_default();
            self.pb
                .println(format!("  {} Rodada {rodada}: {erro}", self.red.apply_to("✗")));
        } else if report.created.is_empty() {
            self.pb.println(format!(
                "  {} Rodada {rodada}: Nenhuma OP criada",
                self.yellow.apply_to("!")
            ));
        } else {
            self.pb.println(format!(
                "  {} Rodada {rodada}: {} OPs criadas com sucesso",
                self.green.apply_to("✓"),
                report.created.len()
            ));
        }
        self.pb.inc(1);
    }

    pub fn round_failed(&self, rodada: i32, err: &AppError) {
        self.pb
            .println(format!("  {} Rodada {rodada}: {err}", self.red.apply_to("✗")));
        self.pb.inc(1);
    }

    /// Finaliza a barra e imprime o resumo em JSON.
    pub fn finish(&self, summary: &RunSummary) {
        self.pb.finish_and_clear();
        let style = if summary.total_falhas == 0 {
            &self.green
        } else {
            &self.yellow
        };
        println!();
        println!(
            "{}",
            style.apply_to(format!(
                "─── Resumo: {} OPs criadas, {} falhas ───",
                summary.total_ops_criadas, summary.total_falhas
            ))
        );
        println!("{}", serde_json::to_string_pretty(summary).unwrap_or_default());
    }
}
