//! Configuração da automação carregada a partir de `sankhya.toml`.
//!
//! A struct [`AppConfig`] agrupa os parâmetros do banco Oracle, da API Sankhya,
//! do servidor HTTP, do ritmo de processamento e do log. Valores não presentes
//! no arquivo usam defaults sensíveis. Variáveis de ambiente têm precedência
//! sobre o arquivo para credenciais e endereços.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Nome padrão do arquivo de configuração no diretório atual.
pub const DEFAULT_CONFIG_FILE: &str = "sankhya.toml";

/// Configuração de nível superior carregada de `sankhya.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sankhya: SankhyaConfig,
    pub server: ServerConfig,
    pub pacing: PacingConfig,
    pub logging: LoggingConfig,
}

/// Credenciais e endereço do banco Oracle que contém a tabela `AD_PLAN`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    /// String de conexão no formato aceito pelo cliente Oracle (ex.: `host:1521/SERVICO`).
    pub connect_string: String,
}

/// Parâmetros de acesso à API do Sankhya.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SankhyaConfig {
    /// URL base do servidor Sankhya, sem barra final (ex.: `http://erp:8180`).
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Caminho do endpoint de serviços relativo à URL base.
    pub service_path: String,
    /// Nome do serviço que cria a ordem de produção.
    pub create_order_service: String,
    /// Timeout de cada requisição HTTP em segundos.
    pub timeout_secs: u64,
}

impl Default for SankhyaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8180".to_string(),
            username: String::new(),
            password: String::new(),
            service_path: "/mge/service.sbr".to_string(),
            create_order_service: "OperacaoProducaoSP.criarOrdemProducao".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

/// Ritmo de envio para a API: pausa entre registros e entre rodadas.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub record_delay_ms: u64,
    pub round_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            record_delay_ms: 500,
            round_delay_ms: 1000,
        }
    }
}

impl PacingConfig {
    pub fn record_delay(&self) -> Duration {
        Duration::from_millis(self.record_delay_ms)
    }

    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.round_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            file_name: "unified_app.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Carrega a configuração do caminho informado.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<AppConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Sobrepõe os valores vindos de variáveis de ambiente não vazias.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut String); 6] = [
            ("ORACLE_USER", &mut self.database.username),
            ("ORACLE_PASSWORD", &mut self.database.password),
            ("ORACLE_CONNECT_STRING", &mut self.database.connect_string),
            ("SANKHYA_BASE_URL", &mut self.sankhya.base_url),
            ("SANKHYA_USER", &mut self.sankhya.username),
            ("SANKHYA_PASSWORD", &mut self.sankhya.password),
        ];

        for (key, slot) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
    }
}
