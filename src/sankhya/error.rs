//! Tipos de erro para o cliente da API Sankhya.
//!
//! Define [`SankhyaError`] com variantes para respostas de erro do serviço,
//! falhas de autenticação, respostas malformadas e erros de rede.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a API do Sankhya.
#[derive(Debug, Error)]
pub enum SankhyaError {
    /// O servidor respondeu com status HTTP de erro (4xx/5xx).
    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },

    /// O serviço respondeu `status != "1"`; `message` traz o `statusMessage`.
    #[error("{message}")]
    Service { message: String },

    /// O login respondeu sem `jsessionid`.
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// Operação exige sessão ativa e não há nenhuma.
    #[error("no active session")]
    NoSession,

    /// A resposta não tem o formato esperado.
    #[error("unexpected response: {0}")]
    Malformed(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
