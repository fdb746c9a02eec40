pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::SankhyaClient;
pub use types::OrderCreation;

/// Serviço remoto de ordens de produção.
///
/// Nenhum método devolve erro: falhas de transporte ou do protocolo viram
/// `false` ou um [`OrderCreation`] com `success = false`.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Abre uma sessão, substituindo a anterior se houver.
    async fn authenticate(&mut self) -> bool;

    /// Autentica, verifica a sessão e a encerra antes de retornar.
    async fn test_connection(&mut self) -> bool;

    /// Cria exatamente uma OP para o produto, usando `lot_size` como tamanho do lote.
    async fn create_production_order(&self, product_code: i64, lot_size: f64) -> OrderCreation;

    /// Encerra a sessão ativa; não faz nada se não houver sessão.
    async fn logout(&mut self);
}
