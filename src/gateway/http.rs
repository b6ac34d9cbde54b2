// src/gateway/http.rs
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::Serialize;

use super::{wire, Gateway, GatewayResult};
use crate::config::MonitorConfig;
use crate::error::GatewayError;
use crate::model::{AnalysisResult, NewTerm, ResultId, RunOutcome, RunRequest, Term, TermId, TermPatch};

/// REST adapter for the X Monitor API (`/api/terms`, `/api/results`, `/api/run`).
#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(cfg: &MonitorConfig) -> GatewayResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("x-monitor/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| GatewayError::Transport(format!("building http client: {e}")))?;
        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> GatewayResult<Vec<u8>> {
        let mut req = self.http.request(method, self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        read_body(resp).await
    }

    async fn get(&self, path: &str) -> GatewayResult<Vec<u8>> {
        self.send::<()>(Method::GET, path, None).await
    }
}

async fn read_body(resp: Response) -> GatewayResult<Vec<u8>> {
    let status = resp.status();
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    if status.is_success() {
        return Ok(bytes.to_vec());
    }

    let message = wire::error_message(&bytes).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(message));
    }
    Err(GatewayError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_terms(&self) -> GatewayResult<Vec<Term>> {
        let body = self.get("/api/terms").await?;
        wire::terms_from_json(&body)
    }

    async fn create_term(&self, term: &NewTerm) -> GatewayResult<Term> {
        let body = self.send(Method::POST, "/api/terms", Some(term)).await?;
        wire::term_from_json(&body)
    }

    async fn update_term(&self, id: TermId, patch: &TermPatch) -> GatewayResult<Term> {
        let path = format!("/api/terms/{id}");
        let body = self.send(Method::PUT, &path, Some(patch)).await?;
        wire::term_from_json(&body)
    }

    async fn delete_term(&self, id: TermId) -> GatewayResult<()> {
        let path = format!("/api/terms/{id}");
        // Body is a confirmation message; nothing to decode.
        self.send::<()>(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn list_results(&self) -> GatewayResult<Vec<AnalysisResult>> {
        let body = self.get("/api/results").await?;
        wire::results_from_json(&body)
    }

    async fn get_result(&self, id: ResultId) -> GatewayResult<AnalysisResult> {
        let body = self.get(&format!("/api/results/{id}")).await?;
        wire::result_from_json(&body)
    }

    async fn manual_run(&self, request: &RunRequest) -> GatewayResult<RunOutcome> {
        let body = self.send(Method::POST, "/api/run", Some(request)).await?;
        wire::run_outcome_from_json(&body, &request.keyword)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
