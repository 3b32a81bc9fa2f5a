//! Advisor layer: decides what each conversation turn needs
//!
//! An advisor looks at the transcript and either answers directly or asks for
//! market searches to be dispatched first. [`GeminiAdvisor`] drives this with
//! function calling against the Gemini API; [`KeywordAdvisor`] is a
//! deterministic stand-in so the stack runs without credentials.

pub mod gemini;
pub mod keyword;

pub use gemini::GeminiAdvisor;
pub use keyword::KeywordAdvisor;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use paper_core::{DispatchOutcome, Message, PaperResult, SearchIntent};

/// Ceiling on search intents a single plan may carry
pub const MAX_INTENTS_PER_TURN: usize = 5;

/// Closing reply when a turn ends without a composable answer
pub const FALLBACK_REPLY: &str = "I've searched multiple times but couldn't find markets that \
    perfectly fit. Let me know if you'd like me to try different search terms or if you can \
    provide more details about your specific risks.";

/// What the advisor wants to happen in the current turn
///
/// Either `intents` is non-empty and the turn dispatches searches before
/// composing a reply, or `reply` carries the final assistant text directly.
#[derive(Debug, Clone, Default)]
pub struct AdvisorPlan {
    pub intents: Vec<SearchIntent>,
    pub reply: Option<String>,
}

impl AdvisorPlan {
    /// Plan that answers immediately without searching
    pub fn direct(text: impl Into<String>) -> Self {
        AdvisorPlan {
            intents: Vec::new(),
            reply: Some(text.into()),
        }
    }

    /// Plan that dispatches searches before replying
    pub fn search(intents: Vec<SearchIntent>) -> Self {
        AdvisorPlan {
            intents,
            reply: None,
        }
    }
}

/// One operational risk surfaced for a business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub name: String,
    /// "High", "Medium" or "Low"
    pub likelihood: String,
    /// "Severe", "High", "Moderate" or "Low"
    pub impact: String,
    pub description: String,
}

/// Conversation planner and risk analyst
#[async_trait]
pub trait RiskAdvisor: Send + Sync {
    /// Decide what the turn needs: market searches or a direct reply
    ///
    /// The transcript already ends with the user message that opened the turn.
    async fn plan_turn(&self, history: &[Message]) -> PaperResult<AdvisorPlan>;

    /// Produce the closing assistant reply once dispatch results are in
    async fn compose_reply(
        &self,
        history: &[Message],
        outcomes: &[DispatchOutcome],
    ) -> PaperResult<String>;

    /// Identify hedgeable operational risks for a business description
    async fn analyze(&self, description: &str) -> PaperResult<Vec<Risk>>;
}

/// Pick an advisor from the environment
///
/// `GEMINI_API_KEY` selects the live Gemini advisor; without it the keyword
/// advisor keeps conversations working offline.
pub fn advisor_from_env() -> Arc<dyn RiskAdvisor> {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() && key != "your-api-key-here" => {
            let model = std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| gemini::DEFAULT_MODEL.to_string());
            tracing::info!("Using Gemini advisor with model {}", model);
            Arc::new(GeminiAdvisor::new(key, model))
        }
        _ => {
            tracing::info!("GEMINI_API_KEY not set, using keyword advisor");
            Arc::new(KeywordAdvisor::new())
        }
    }
}
