//! reqwest transport for the simulation endpoints.

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use phylogen::api::SimulationApi;
use phylogen::config::Endpoints;
use phylogen::error::ApiError;
use phylogen::protocol::{SaveRequest, StepResult};
use reqwest::{Client, RequestBuilder, Response};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    endpoints: Rc<Endpoints>,
}

impl HttpApi {
    pub fn new(cfg: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoints: Rc::new(cfg.polling.endpoints.resolved(&cfg.server_url)),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

async fn send(request: RequestBuilder, endpoint: &str) -> Result<Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::transport(endpoint, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

impl SimulationApi for HttpApi {
    fn step(&self, cancel: &CancellationToken) -> impl Future<Output = Result<StepResult, ApiError>> {
        let endpoint = self.endpoints.step.as_str();
        let request = self.client.post(endpoint);
        async move {
            let fetch = async {
                let response = send(request, endpoint).await?;
                let text = response
                    .text()
                    .await
                    .map_err(|e| ApiError::transport(endpoint, e))?;
                StepResult::from_json(&text).map_err(|e| ApiError::decode(endpoint, e))
            };
            // Dropping the request future aborts the connection.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ApiError::Cancelled),
                outcome = fetch => outcome,
            }
        }
    }

    fn save(&self, request: &SaveRequest) -> impl Future<Output = Result<(), ApiError>> {
        let endpoint = self.endpoints.save.as_str();
        let request = self.client.post(endpoint).json(request);
        async move { send(request, endpoint).await.map(drop) }
    }

    fn reset(&self) -> impl Future<Output = Result<(), ApiError>> {
        let endpoint = self.endpoints.reset.as_str();
        let request = self.client.post(endpoint);
        async move { send(request, endpoint).await.map(drop) }
    }
}
