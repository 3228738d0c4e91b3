use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{AssistantClient, AssistantError};
use crate::profile::UserProfile;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
    #[allow(dead_code)]
    customer_id: Option<String>,
    #[allow(dead_code)]
    timestamp: Option<f64>,
}

/// HTTP client for the property portal backend
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one chat message and return the assistant's full reply.
    pub async fn query(&self, message: &str) -> Result<String, AssistantError> {
        let url = format!("{}/api/chat/simple", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let body = ensure_success(response).await?.text().await?;
        parse_chat_response(&body)
    }

    /// Load the signed-in user and their projects.
    pub async fn fetch_user(&self) -> Result<UserProfile, AssistantError> {
        let url = format!("{}/api/user", self.base_url);

        let response = self.client.get(&url).send().await?;
        let body = ensure_success(response).await?.text().await?;

        serde_json::from_str(&body).map_err(|e| AssistantError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl AssistantClient for PortalClient {
    async fn ask(&self, message: &str) -> Result<String, AssistantError> {
        self.query(message).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, AssistantError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AssistantError::Status {
        status: status.as_u16(),
        body,
    })
}

fn parse_chat_response(body: &str) -> Result<String, AssistantError> {
    let chat: ChatResponse =
        serde_json::from_str(body).map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;
    Ok(chat.response)
}
