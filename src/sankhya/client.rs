use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::COOKIE;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::OrderService;
use super::error::SankhyaError;
use super::types::{
    CreateOrderBody, LoginBody, OrderCreation, ProductionOrderParams, Scalar, ServiceRequest,
    ServiceResponse,
};
use crate::config::SankhyaConfig;

const LOGIN_SERVICE: &str = "MobileLoginSP.login";
const LOGOUT_SERVICE: &str = "MobileLoginSP.logout";

/// Processo produtivo (IDPROC) de toda OP criada.
const PROCESS_ID: i64 = 51;
/// Planta (CODPLP) de toda OP criada.
const PLAN_ID: i64 = 1;

/// Estado da sessão com o Sankhya.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Session {
    Inactive,
    Active { jsessionid: String },
}

pub struct SankhyaClient {
    client: Client,
    base_url: String,
    service_path: String,
    username: String,
    password: String,
    create_order_service: String,
    session: Session,
}

impl SankhyaClient {
    pub fn new(config: &SankhyaConfig) -> Result<Self, SankhyaError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_path: config.service_path.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            create_order_service: config.create_order_service.clone(),
            session: Session::Inactive,
        })
    }

    #[cfg(test)]
    pub fn has_session(&self) -> bool {
        matches!(self.session, Session::Active { .. })
    }

    async fn call<B: Serialize + Sync>(
        &self,
        service: &str,
        body: &B,
        jsessionid: Option<&str>,
    ) -> Result<ServiceResponse, SankhyaError> {
        let url = format!("{}{}", self.base_url, self.service_path);
        let mut request = self
            .client
            .post(&url)
            .query(&[("serviceName", service), ("outputType", "json")])
            .json(&ServiceRequest::new(service, body));

        if let Some(id) = jsessionid {
            request = request
                .query(&[("mgeSession", id)])
                .header(COOKIE, format!("JSESSIONID={id}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SankhyaError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        serde_json::from_str::<ServiceResponse>(&text)
            .map_err(|e| SankhyaError::Malformed(format!("{service}: {e}")))
    }

    async fn login(&self) -> Result<String, SankhyaError> {
        let body = LoginBody {
            user: Scalar::new(&self.username),
            password: Scalar::new(&self.password),
            keep_connected: Scalar::new("S"),
        };
        let response = self.call(LOGIN_SERVICE, &body, None).await?;
        if !response.is_ok() {
            return Err(SankhyaError::Authentication(response.message()));
        }
        response
            .session_id()
            .ok_or_else(|| SankhyaError::Authentication("login sem jsessionid".to_string()))
    }

    async fn end_session(&self, jsessionid: &str) -> Result<(), SankhyaError> {
        let response = self
            .call(LOGOUT_SERVICE, &serde_json::json!({}), Some(jsessionid))
            .await?;
        if !response.is_ok() {
            return Err(SankhyaError::Service {
                message: response.message(),
            });
        }
        Ok(())
    }

    async fn submit_order(&self, params: &ProductionOrderParams) -> Result<i64, SankhyaError> {
        let jsessionid = match &self.session {
            Session::Active { jsessionid } => jsessionid.as_str(),
            Session::Inactive => return Err(SankhyaError::NoSession),
        };

        let body = CreateOrderBody {
            params: params.clone(),
        };
        let response = self
            .call(&self.create_order_service, &body, Some(jsessionid))
            .await?;
        if !response.is_ok() {
            return Err(SankhyaError::Service {
                message: response.message(),
            });
        }
        response
            .idiproc()
            .ok_or_else(|| SankhyaError::Malformed("resposta sem IDIPROC".to_string()))
    }
}

#[async_trait]
impl OrderService for SankhyaClient {
    async fn authenticate(&mut self) -> bool {
        // Uma sessão anterior é encerrada antes de abrir a nova.
        self.logout().await;

        match self.login().await {
            Ok(jsessionid) => {
                debug!("sessão Sankhya aberta");
                self.session = Session::Active { jsessionid };
                true
            }
            Err(e) => {
                error!(error = %e, "falha ao autenticar na API Sankhya");
                false
            }
        }
    }

    async fn test_connection(&mut self) -> bool {
        let ok = self.authenticate().await;
        self.logout().await;
        if ok {
            info!("conexão com a API Sankhya verificada");
        }
        ok
    }

    async fn create_production_order(&self, product_code: i64, lot_size: f64) -> OrderCreation {
        let params = ProductionOrderParams {
            product_code,
            process_id: PROCESS_ID,
            plan_id: PLAN_ID,
            lot_size,
        };

        match self.submit_order(&params).await {
            Ok(idiproc) => {
                info!(idiproc, codprod = product_code, "OP criada no Sankhya");
                OrderCreation::created(idiproc)
            }
            Err(e) => {
                warn!(codprod = product_code, error = %e, "falha ao criar OP");
                OrderCreation::failed(e.to_string())
            }
        }
    }

    async fn logout(&mut self) {
        let previous = std::mem::replace(&mut self.session, Session::Inactive);
        if let Session::Active { jsessionid } = previous {
            match self.end_session(&jsessionid).await {
                Ok(()) => debug!("sessão Sankhya encerrada"),
                Err(e) => warn!(error = %e, "falha ao encerrar sessão Sankhya"),
            }
        }
    }
}
