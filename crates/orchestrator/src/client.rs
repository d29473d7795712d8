//! HTTP clients for Lester and the crew.

use async_trait::async_trait;
use events::FeedStartRequest;
use heist_core::{
    Ack, CutDetails, DecisionRequest, DistractionRequest, HitRequest, LootDetails, Offer,
    PhaseKind, PhaseSnapshot, ProposeResponse, Role, StartAck,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::desk::{OfferDesk, Operator};
use crate::error::{OrchestratorError, Result};
use crate::retry::{with_retry, RetryPolicy};

pub struct LesterClient {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl LesterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize(base_url.into()),
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl OfferDesk for LesterClient {
    async fn propose_offer(&self) -> Result<Option<Offer>> {
        let url = format!("{}/api/offers/propose", self.base_url);
        let response: ProposeResponse = with_retry(&self.retry, "propose_offer", || async {
            let response = self.client.post(&url).send().await?;
            handle_response(response).await
        })
        .await?;
        Ok(response.offer)
    }

    async fn record_decision(&self, accepted: bool) -> Result<()> {
        let url = format!("{}/api/offers/decision", self.base_url);
        let body = DecisionRequest { accepted };
        post_empty(&self.client, &self.retry, "record_decision", &url, &body).await
    }

    async fn verify_settlement(&self, cut: CutDetails) -> Result<Ack> {
        let url = format!("{}/api/settlement/verify", self.base_url);
        post_json(&self.client, &self.retry, "verify_settlement", &url, &cut).await
    }

    async fn start_feed(&self, frequency: u32) -> Result<()> {
        let url = format!("{}/api/feed/start", self.base_url);
        let body = FeedStartRequest { frequency };
        post_empty(&self.client, &self.retry, "start_feed", &url, &body).await
    }

    async fn stop_feed(&self) -> Result<()> {
        let url = format!("{}/api/feed/stop", self.base_url);
        with_retry(&self.retry, "stop_feed", || async {
            let response = self.client.post(&url).send().await?;
            handle_empty(response).await
        })
        .await
    }
}

pub struct CrewClient {
    role: Role,
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl CrewClient {
    pub fn new(role: Role, base_url: impl Into<String>) -> Self {
        Self::with_client(role, base_url, Client::new())
    }

    pub fn with_client(role: Role, base_url: impl Into<String>, client: Client) -> Self {
        Self {
            role,
            base_url: normalize(base_url.into()),
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn start_phase<B>(&self, phase: PhaseKind, body: &B) -> Result<StartAck>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}/api/phases/{}", self.base_url, phase.as_str());
        let operation = format!("start_{}", phase.as_str());

        with_retry(&self.retry, &operation, || async {
            let response = self.client.post(&url).json(body).send().await?;
            if response.status() == StatusCode::CONFLICT {
                return Err(OrchestratorError::PhaseBusy {
                    role: self.role,
                    phase,
                });
            }
            handle_response(response).await
        })
        .await
    }
}

#[async_trait]
impl Operator for CrewClient {
    fn role(&self) -> Role {
        self.role
    }

    async fn start_distraction(&self, turns_needed: u32) -> Result<StartAck> {
        self.start_phase(PhaseKind::Distraction, &DistractionRequest { turns_needed })
            .await
    }

    async fn start_hit(&self, turns_needed: u32, loot: u64) -> Result<StartAck> {
        self.start_phase(PhaseKind::Hit, &HitRequest { turns_needed, loot })
            .await
    }

    async fn check_status(&self) -> Result<PhaseSnapshot> {
        let url = format!("{}/api/phases/status", self.base_url);
        get_json(&self.client, &self.retry, "check_status", &url).await
    }

    async fn retrieve_loot(&self) -> Result<LootDetails> {
        let url = format!("{}/api/loot", self.base_url);
        get_json(&self.client, &self.retry, "retrieve_loot", &url).await
    }

    async fn confirm_cut(&self, cut: CutDetails) -> Result<Ack> {
        let url = format!("{}/api/cut/confirm", self.base_url);
        post_json(&self.client, &self.retry, "confirm_cut", &url, &cut).await
    }
}

fn normalize(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    retry: &RetryPolicy,
    operation: &str,
    url: &str,
) -> Result<T> {
    with_retry(retry, operation, || async {
        let response = client.get(url).send().await?;
        handle_response(response).await
    })
    .await
}

async fn post_json<B, T>(
    client: &Client,
    retry: &RetryPolicy,
    operation: &str,
    url: &str,
    body: &B,
) -> Result<T>
where
    B: Serialize + Sync,
    T: DeserializeOwned,
{
    with_retry(retry, operation, || async {
        let response = client.post(url).json(body).send().await?;
        handle_response(response).await
    })
    .await
}

async fn post_empty<B: Serialize + Sync>(
    client: &Client,
    retry: &RetryPolicy,
    operation: &str,
    url: &str,
    body: &B,
) -> Result<()> {
    with_retry(retry, operation, || async {
        let response = client.post(url).json(body).send().await?;
        handle_empty(response).await
    })
    .await
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    ) {
        return Err(OrchestratorError::Unavailable(format!(
            "Status {}: {}",
            status, body
        )));
    }
    Err(OrchestratorError::InvalidResponse(format!(
        "Status {}: {}",
        status, body
    )))
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = ensure_success(response).await?;
    response
        .json()
        .await
        .map_err(|e| OrchestratorError::InvalidResponse(e.to_string()))
}

async fn handle_empty(response: reqwest::Response) -> Result<()> {
    ensure_success(response).await.map(|_| ())
}
