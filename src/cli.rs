//! Interface de linha de comando baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (serve, check, run)
//! e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;

/// Criação automática de OPs no Sankhya a partir do planejamento por rodada.
#[derive(Debug, Parser)]
#[command(name = "sankhya-ops", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Habilita saída detalhada (nível debug).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sobe a API HTTP `/api/sankhya/*`.
    Serve {
        /// Endereço de escuta (sobrepõe o arquivo de configuração).
        #[arg(long)]
        host: Option<String>,

        /// Porta de escuta (sobrepõe o arquivo de configuração).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Verifica as conexões com o banco e a API e as encerra.
    Check,

    /// Processa uma faixa de rodadas diretamente, sem servidor HTTP.
    Run {
        /// Data do planejamento (AAAA-MM-DD).
        #[arg(long)]
        data: String,

        /// Braço de produção.
        #[arg(long)]
        braco: i32,

        /// Primeira rodada da faixa.
        #[arg(long)]
        rodada_inicial: i32,

        /// Última rodada da faixa (inclusiva).
        #[arg(long)]
        rodada_final: i32,
    },
}
