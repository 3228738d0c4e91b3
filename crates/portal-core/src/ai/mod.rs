pub mod portal;

pub use portal::PortalClient;

use async_trait::async_trait;

/// The remote assistant as seen by the chat session: one question in, one
/// reply body out.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    async fn ask(&self, message: &str) -> Result<String, AssistantError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("portal returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
