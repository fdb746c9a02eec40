//! Tipos de dados para requisições e respostas do `service.sbr` do Sankhya.
//!
//! Toda chamada segue o envelope `{"serviceName": ..., "requestBody": ...}` e
//! toda resposta traz `status` ("1" = sucesso), `statusMessage` e `responseBody`.
//! Campos escalares do login usam o formato `{"$": "valor"}` exigido pelo serviço.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope de requisição para qualquer serviço do Sankhya.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRequest<B> {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "requestBody")]
    pub request_body: B,
}

impl<B> ServiceRequest<B> {
    pub fn new(service_name: impl Into<String>, request_body: B) -> Self {
        Self {
            service_name: service_name.into(),
            request_body,
        }
    }
}

/// Valor escalar no formato `{"$": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scalar {
    #[serde(rename = "$")]
    pub value: String,
}

impl Scalar {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Corpo do `MobileLoginSP.login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginBody {
    #[serde(rename = "NOMUSU")]
    pub user: Scalar,
    #[serde(rename = "INTERNO")]
    pub password: Scalar,
    #[serde(rename = "KEEPCONNECTED")]
    pub keep_connected: Scalar,
}

/// Parâmetros de criação de uma OP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionOrderParams {
    /// Produto acabado.
    #[serde(rename = "CODPRODPA")]
    pub product_code: i64,
    /// Processo produtivo.
    #[serde(rename = "IDPROC")]
    pub process_id: i64,
    /// Planta.
    #[serde(rename = "CODPLP")]
    pub plan_id: i64,
    /// Tamanho do lote.
    #[serde(rename = "TAMLOTE")]
    pub lot_size: f64,
}

/// Corpo da criação de OP: `{"params": {...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderBody {
    pub params: ProductionOrderParams,
}

/// Resposta genérica do `service.sbr`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceResponse {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "statusMessage", default)]
    pub status_message: Option<String>,
    #[serde(rename = "responseBody", default)]
    pub response_body: Option<Value>,
}

impl ServiceResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// Mensagem do serviço, ou um texto genérico quando ausente.
    pub fn message(&self) -> String {
        self.status_message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("status {}", self.status))
    }

    /// `responseBody.jsessionid.$` do login.
    pub fn session_id(&self) -> Option<String> {
        self.response_body
            .as_ref()
            .and_then(|body| body.get("jsessionid"))
            .and_then(scalar_text)
            .filter(|id| !id.is_empty())
    }

    /// Primeiro `IDIPROC` encontrado no corpo da resposta.
    pub fn idiproc(&self) -> Option<i64> {
        self.response_body
            .as_ref()
            .and_then(|body| find_key(body, "IDIPROC"))
            .and_then(scalar_text)
            .and_then(|text| text.trim().parse::<i64>().ok())
    }
}

/// Resultado da criação de uma OP, sempre devolvido ao orquestrador (nunca um erro).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreation {
    pub success: bool,
    pub idiproc: Option<i64>,
    pub message: String,
}

impl OrderCreation {
    pub fn created(idiproc: i64) -> Self {
        Self {
            success: true,
            idiproc: Some(idiproc),
            message: format!("OP {idiproc} criada"),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            idiproc: None,
            message: message.into(),
        }
    }
}

// Aceita `"123"`, `123` e `{"$": "123"}`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$").and_then(scalar_text),
        _ => None,
    }
}

fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_uses_dollar_scalars() {
        let req = ServiceRequest::new(
            "MobileLoginSP.login",
            LoginBody {
                user: Scalar::new("admin"),
                password: Scalar::new("secret"),
                keep_connected: Scalar::new("S"),
            },
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["serviceName"], "MobileLoginSP.login");
        assert_eq!(json["requestBody"]["NOMUSU"]["$"], "admin");
        assert_eq!(json["requestBody"]["INTERNO"]["$"], "secret");
        assert_eq!(json["requestBody"]["KEEPCONNECTED"]["$"], "S");
    }

    #[test]
    fn create_order_params_use_sankhya_field_names() {
        let body = CreateOrderBody {
            params: ProductionOrderParams {
                product_code: 1010,
                process_id: 51,
                plan_id: 1,
                lot_size: 12.5,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["params"]["CODPRODPA"], 1010);
        assert_eq!(json["params"]["IDPROC"], 51);
        assert_eq!(json["params"]["CODPLP"], 1);
        assert_eq!(json["params"]["TAMLOTE"], 12.5);
    }

    #[test]
    fn login_response_exposes_session_id() {
        let json = r#"{
            "serviceName": "MobileLoginSP.login",
            "status": "1",
            "responseBody": {"callID": {"$": "x"}, "jsessionid": {"$": "ABC123"}}
        }"#;
        let resp: ServiceResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.session_id().as_deref(), Some("ABC123"));
    }

    #[test]
    fn idiproc_accepts_scalar_string_and_number() {
        for body in [
            r#"{"IDIPROC": {"$": "900"}}"#,
            r#"{"IDIPROC": "900"}"#,
            r#"{"ordem": {"IDIPROC": 900}}"#,
        ] {
            let resp = ServiceResponse {
                status: "1".into(),
                status_message: None,
                response_body: Some(serde_json::from_str(body).unwrap()),
            };
            assert_eq!(resp.idiproc(), Some(900), "body: {body}");
        }
    }

    #[test]
    fn error_response_message_falls_back_to_status() {
        let resp: ServiceResponse = serde_json::from_str(r#"{"status": "0"}"#).unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.message(), "status 0");
        assert_eq!(resp.idiproc(), None);
        assert_eq!(resp.session_id(), None);
    }
}
