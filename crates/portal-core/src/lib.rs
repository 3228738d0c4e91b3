pub mod ai;
pub mod config;
pub mod profile;
pub mod quick_actions;
pub mod session;
pub mod state;
pub mod transcript;

// Re-export main types for convenience
pub use ai::{AssistantClient, AssistantError, PortalClient};
pub use config::Config;
pub use profile::{Project, UserProfile};
pub use quick_actions::{quick_action, QUICK_ACTIONS};
pub use session::{ChatSession, Rejection, Submission, SubmitOutcome, APOLOGY};
pub use state::{ChatMessage, ChatRole};
pub use transcript::{Transcript, GREETING};
