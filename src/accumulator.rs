//! Totais acumulados desde o início do processo.
//!
//! O [`RunAccumulator`] recebe o resultado de cada planejamento processado e
//! mantém contadores e listas sempre consistentes entre si. Não há operação
//! de limpeza: os totais só voltam a zero com o reinício do processo.

use serde::Serialize;

use crate::orchestrator::RecordFailure;

/// OP criada e vinculada ao planejamento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessDetail {
    pub nuplan: i64,
    pub idiproc: i64,
}

/// Planejamento que não resultou em OP vinculada.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDetail {
    pub nuplan: i64,
    pub erro: String,
    pub tipo: &'static str,
}

/// Fotografia dos totais, no formato do endpoint de resumo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_ops_criadas: usize,
    pub total_falhas: usize,
    pub ops_criadas_sucesso: Vec<SuccessDetail>,
    pub detalhes_falhas: Vec<FailureDetail>,
}

#[derive(Debug, Default)]
pub struct RunAccumulator {
    successes: Vec<SuccessDetail>,
    failures: Vec<FailureDetail>,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, nuplan: i64, idiproc: i64) {
        self.successes.push(SuccessDetail { nuplan, idiproc });
    }

    pub fn record_failure(&mut self, nuplan: i64, failure: &RecordFailure) {
        self.failures.push(FailureDetail {
            nuplan,
            erro: failure.to_string(),
            tipo: failure.kind(),
        });
    }

    pub fn total_orders_created(&self) -> usize {
        self.successes.len()
    }

    pub fn total_failures(&self) -> usize {
        self.failures.len()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total_ops_criadas: self.total_orders_created(),
            total_falhas: self.total_failures(),
            ops_criadas_sucesso: self.successes.clone(),
            detalhes_falhas: self.failures.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let summary = RunAccumulator::new().summary();
        assert_eq!(summary.total_ops_criadas, 0);
        assert_eq!(summary.total_falhas, 0);
        assert!(summary.ops_criadas_sucesso.is_empty());
        assert!(summary.detalhes_falhas.is_empty());
    }

    #[test]
    fn counters_match_lists_in_insertion_order() {
        let mut acc = RunAccumulator::new();
        acc.record_success(1, 900);
        acc.record_failure(
            2,
            &RecordFailure::CreationFailed {
                message: "insufficient stock".into(),
            },
        );
        acc.record_success(3, 901);

        let summary = acc.summary();
        assert_eq!(summary.total_ops_criadas, summary.ops_criadas_sucesso.len());
        assert_eq!(summary.total_falhas, summary.detalhes_falhas.len());
        assert_eq!(
            summary.ops_criadas_sucesso,
            vec![
                SuccessDetail { nuplan: 1, idiproc: 900 },
                SuccessDetail { nuplan: 3, idiproc: 901 },
            ]
        );
        assert_eq!(summary.detalhes_falhas[0].nuplan, 2);
        assert_eq!(summary.detalhes_falhas[0].erro, "insufficient stock");
        assert_eq!(summary.detalhes_falhas[0].tipo, "falha_criacao");
    }

    #[test]
    fn summary_is_a_pure_read() {
        let mut acc = RunAccumulator::new();
        acc.record_success(1, 900);
        let first = acc.summary();
        let second = acc.summary();
        assert_eq!(first, second);
        assert_eq!(acc.total_orders_created(), 1);
    }

    #[test]
    fn summary_serializes_with_api_field_names() {
        let mut acc = RunAccumulator::new();
        acc.record_success(10, 555);
        acc.record_failure(11, &RecordFailure::LinkFailed { idiproc: 556 });

        let json = serde_json::to_value(acc.summary()).unwrap();
        assert_eq!(json["total_ops_criadas"], 1);
        assert_eq!(json["total_falhas"], 1);
        assert_eq!(json["ops_criadas_sucesso"][0]["idiproc"], 555);
        assert_eq!(
            json["detalhes_falhas"][0]["erro"],
            "OP 556 criada, mas falha ao atualizar banco"
        );
        assert_eq!(json["detalhes_falhas"][0]["tipo"], "falha_vinculo");
    }
}
