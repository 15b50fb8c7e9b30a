//! AI assistant integration.
//!
//! A single [`AssistantClient`] talks to any supported [`Vendor`]; the
//! differences live in a [`VendorProfile`]. Keys come from an
//! [`ApiKeyManager`] and are only held in memory.

mod client;
mod keys;
pub mod prompt;
mod vendor;

pub use client::{AiError, AssistantClient, DegradedReason, Reply};
pub use keys::ApiKeyManager;
pub use vendor::{AuthStyle, Vendor, VendorProfile};
pub use vendor::{ANTHROPIC_VERSION, CLAUDE_BASE_URL, CLAUDE_MODEL, GEMINI_BASE_URL, GEMINI_MODEL};
