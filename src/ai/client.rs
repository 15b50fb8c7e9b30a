use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::prompt;
use super::{ApiKeyManager, Vendor, VendorProfile};
use crate::models::{MoodEnergyEntry, Task};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0} API key not set")]
    MissingApiKey(Vendor),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a request produced no usable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// The vendor answered but the response had no text.
    EmptyResponse,
    RateLimited,
    AuthFailed,
    NetworkFailed,
    /// The body could not be decoded.
    InvalidResponse,
    /// Any other non-success status.
    ServiceError(u16),
}

/// The outcome of a vendor call: text, or a degraded-service message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Content(String),
    Degraded {
        reason: DegradedReason,
        message: String,
    },
}

impl Reply {
    /// The text to show the user, whichever way the call went.
    pub fn text(&self) -> &str {
        match self {
            Self::Content(text) => text,
            Self::Degraded { message, .. } => message,
        }
    }

    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content(_))
    }

    pub fn degraded_reason(&self) -> Option<DegradedReason> {
        match self {
            Self::Content(_) => None,
            Self::Degraded { reason, .. } => Some(*reason),
        }
    }
}

/// One AI client for every vendor, driven by a [`VendorProfile`].
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: Client,
    profile: VendorProfile,
    keys: Arc<ApiKeyManager>,
}

impl AssistantClient {
    pub fn new(profile: VendorProfile, keys: Arc<ApiKeyManager>) -> Result<Self, AiError> {
        Self::with_timeout(profile, keys, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        profile: VendorProfile,
        keys: Arc<ApiKeyManager>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            profile,
            keys,
        })
    }

    pub fn vendor(&self) -> Vendor {
        self.profile.vendor
    }

    pub fn profile(&self) -> &VendorProfile {
        &self.profile
    }

    fn require_key(&self) -> Result<String, AiError> {
        self.keys
            .api_key(self.profile.vendor)
            .ok_or(AiError::MissingApiKey(self.profile.vendor))
    }

    /// Ask the assistant about `user_text` with the user's tasks as context.
    ///
    /// Fails only when no key is set, before any request is made. Transport,
    /// auth and parsing problems come back as [`Reply::Degraded`].
    pub async fn send_message(&self, user_text: &str, tasks: &[Task]) -> Result<Reply, AiError> {
        let api_key = self.require_key()?;
        let system = prompt::system_prompt(tasks);

        let reply = match self.complete(&api_key, &system, user_text).await {
            Ok(text) => Reply::Content(text),
            Err(reason) => Reply::Degraded {
                reason,
                message: self.chat_fallback(reason),
            },
        };
        Ok(reply)
    }

    /// A greeting built locally from the task list.
    pub fn generate_initial_greeting(&self, tasks: &[Task]) -> String {
        prompt::initial_greeting(self.profile.vendor.display_name(), tasks)
    }

    /// Like [`generate_initial_greeting`](Self::generate_initial_greeting), addressed to `user_name`.
    pub fn generate_greeting_for(&self, user_name: Option<&str>, tasks: &[Task]) -> String {
        prompt::greeting_for(self.profile.vendor.display_name(), user_name, tasks)
    }

    /// Ask for a short reflection on recent mood and energy entries.
    ///
    /// With no entries this returns a fixed message without calling the vendor.
    pub async fn generate_reflection(&self, entries: &[MoodEnergyEntry]) -> Result<Reply, AiError> {
        let api_key = self.require_key()?;

        if entries.is_empty() {
            return Ok(Reply::Content(prompt::NO_MOOD_DATA.to_string()));
        }

        let system = prompt::reflection_prompt(entries);
        let reply = match self
            .complete(&api_key, &system, prompt::REFLECTION_REQUEST)
            .await
        {
            Ok(text) => Reply::Content(text),
            Err(reason) => Reply::Degraded {
                reason,
                message: reflection_fallback(reason).to_string(),
            },
        };
        Ok(reply)
    }

    async fn complete(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> Result<String, DegradedReason> {
        tracing::debug!(
            vendor = self.profile.vendor.as_str(),
            model = %self.profile.model,
            "Sending completion request"
        );

        let response = self
            .profile
            .build_request(&self.http, api_key, system, user)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("{} request failed: {}", self.profile.vendor, e.without_url());
                DegradedReason::NetworkFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DegradedReason::AuthFailed,
                StatusCode::TOO_MANY_REQUESTS => DegradedReason::RateLimited,
                _ => DegradedReason::ServiceError(status.as_u16()),
            };
            tracing::warn!("{} returned {}", self.profile.vendor, status);
            return Err(reason);
        }

        let body = response.text().await.map_err(|e| {
            tracing::warn!("{} response body unreadable: {}", self.profile.vendor, e.without_url());
            DegradedReason::NetworkFailed
        })?;

        match self.profile.extract_text(&body) {
            Ok(Some(text)) => Ok(text),
            Ok(None) => {
                tracing::warn!("{} response had no text content", self.profile.vendor);
                Err(DegradedReason::EmptyResponse)
            }
            Err(e) => {
                tracing::warn!("{} response could not be decoded: {}", self.profile.vendor, e);
                Err(DegradedReason::InvalidResponse)
            }
        }
    }

    fn chat_fallback(&self, reason: DegradedReason) -> String {
        let name = self.profile.vendor.display_name();
        match reason {
            DegradedReason::EmptyResponse => format!(
                "I'm sorry, but I couldn't generate a response at this time. This might be due to a temporary issue with the {name} AI service. Please try again in a few moments."
            ),
            _ => format!(
                "I'm sorry, but I encountered an error while communicating with the {name} AI service. This might be due to an invalid API key or network issues. Please check your API key and internet connection, then try again."
            ),
        }
    }
}

fn reflection_fallback(reason: DegradedReason) -> &'static str {
    match reason {
        DegradedReason::EmptyResponse => {
            "I couldn't generate a reflection at this time. Please try again later."
        }
        _ => "I encountered an error while trying to generate a reflection. Please check your internet connection and try again.",
    }
}
