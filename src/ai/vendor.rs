//! Vendor capability descriptors.
//!
//! One [`VendorProfile`] captures everything that differs between AI vendors:
//! endpoint layout, how the key is passed, and the request/response shapes.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

/// The AI vendors Echo can talk to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// Anthropic Claude
    #[default]
    Claude,
    /// Google Gemini
    Gemini,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "claude" => Some(Self::Claude),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const CLAUDE_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "models/gemini-2.0-flash";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// How the API key travels with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStyle {
    Header { name: String },
    QueryParam { name: String },
}

#[derive(Debug, Clone)]
pub struct VendorProfile {
    pub vendor: Vendor,
    pub base_url: String,
    pub model: String,
    pub auth: AuthStyle,
    /// Sent on every request, e.g. `anthropic-version`.
    pub extra_headers: Vec<(String, String)>,
    pub max_tokens: u32,
}

impl VendorProfile {
    pub fn claude() -> Self {
        Self {
            vendor: Vendor::Claude,
            base_url: CLAUDE_BASE_URL.to_string(),
            model: CLAUDE_MODEL.to_string(),
            auth: AuthStyle::Header {
                name: "x-api-key".to_string(),
            },
            extra_headers: vec![("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string())],
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn gemini() -> Self {
        Self {
            vendor: Vendor::Gemini,
            base_url: GEMINI_BASE_URL.to_string(),
            model: GEMINI_MODEL.to_string(),
            auth: AuthStyle::QueryParam {
                name: "key".to_string(),
            },
            extra_headers: Vec::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn for_vendor(vendor: Vendor) -> Self {
        match vendor {
            Vendor::Claude => Self::claude(),
            Vendor::Gemini => Self::gemini(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.vendor {
            Vendor::Claude => format!("{}/messages", base),
            Vendor::Gemini => {
                let model = self.model.trim_matches('/');
                if model.starts_with("models/") || model.starts_with("tunedModels/") {
                    format!("{}/{}:generateContent", base, model)
                } else {
                    format!("{}/models/{}:generateContent", base, model)
                }
            }
        }
    }

    /// Build the POST for one system prompt + user message exchange.
    pub(crate) fn build_request(
        &self,
        client: &Client,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> RequestBuilder {
        let mut req = client.post(self.endpoint());

        req = match &self.auth {
            AuthStyle::Header { name } => req.header(name.as_str(), api_key),
            AuthStyle::QueryParam { name } => req.query(&[(name.as_str(), api_key)]),
        };
        for (name, value) in &self.extra_headers {
            req = req.header(name.as_str(), value.as_str());
        }

        match self.vendor {
            Vendor::Claude => req.json(&MessageRequest {
                model: &self.model,
                system: Some(system),
                messages: vec![Message {
                    role: "user",
                    content: user,
                }],
                max_tokens: self.max_tokens,
            }),
            Vendor::Gemini => req.json(&GenerateContentRequest {
                contents: vec![GeminiContent {
                    parts: vec![GeminiPart { text: system }, GeminiPart { text: user }],
                }],
            }),
        }
    }

    /// Pull the first text block out of a response body.
    ///
    /// `Ok(None)` means the body parsed but carried no text.
    pub(crate) fn extract_text(&self, body: &str) -> Result<Option<String>, serde_json::Error> {
        let text = match self.vendor {
            Vendor::Claude => {
                let response: MessageResponse = serde_json::from_str(body)?;
                response
                    .content
                    .into_iter()
                    .filter(|block| block.kind == "text")
                    .find_map(|block| block.text)
            }
            Vendor::Gemini => {
                let response: GenerateContentResponse = serde_json::from_str(body)?;
                response
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content)
                    .and_then(|content| content.parts.into_iter().next())
                    .and_then(|part| part.text)
            }
        };
        Ok(text.filter(|t| !t.trim().is_empty()))
    }
}

// ============================================================
// Wire types
// ============================================================

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct MessageResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}
