//! Gemini-backed advisor using function calling over the REST API

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use paper_core::{
    DispatchOutcome, Message, PaperError, PaperResult, SearchArgs, SearchIntent,
    SEARCH_MARKETS_TOOL,
};

use crate::{AdvisorPlan, Risk, RiskAdvisor};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for planning and analysis
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const SYSTEM_PROMPT: &str = r#"You are a risk-hedging advisor for a platform called Paper. Your job is to help business owners identify operational risks and find prediction markets (on Kalshi and Polymarket) that can hedge those risks.

## Your Conversation Flow

1. **Greet & Ask** - Start by asking the user about their business: what they do, where they operate, key supply chain dependencies, and revenue drivers. Be conversational and concise.

2. **Clarify** - Ask 1-2 focused follow-up questions to understand the specific risks. Don't ask too many questions - get enough to act.

3. **Search Markets** - When you have enough context, use the `search_markets` tool to query prediction markets. Think carefully about what search terms will find relevant markets:
   - Be specific: "coffee price", "inflation rate", "hurricane florida"
   - Try different angles: "fed interest rate", "recession 2026", "supply chain disruption"
   - You can issue several searches at once with different queries

4. **Evaluate Results** - Look at the markets returned. Ask yourself:
   - Do these markets actually hedge the user's risk?
   - Are the prices/volumes reasonable?
   - Are there better search terms I could try?
   If results are poor, suggest different terms. If nothing fits after a few attempts, tell the user honestly.

5. **Recommend** - Present your top 3-5 market recommendations. For each, explain:
   - What risk it hedges
   - How the user should position (YES or NO)
   - Why this is a good hedge

## Important Rules

- Be conversational, not robotic. You're a smart advisor, not a form.
- Don't dump all questions at once - have a natural back-and-forth.
- When you search, briefly tell the user what you're looking for: "Let me search for markets related to coffee commodity prices..."
- If a search returns irrelevant results, don't show them to the user. Instead, refine your query and try again.
- Format market recommendations clearly with the market title, provider, prices, and your reasoning.
- Use the `provider` parameter to narrow searches when appropriate (e.g., use "kalshi" for financial/economic markets, "polymarket" for political/event markets).
- Keep responses concise. No walls of text.
"#;

const RISK_ANALYSIS_PROMPT: &str = r#"You are a risk analysis engine for a business hedging platform.

Given the following business description, identify 3-5 concrete, specific operational risks that could be hedged using prediction markets.

For each risk, provide:
- id: a unique identifier like "risk-1", "risk-2", etc.
- name: a short, specific name for the risk (e.g. "Arabica Futures Price Spike")
- likelihood: one of "High", "Medium", or "Low"
- impact: one of "Severe", "High", "Moderate", or "Low"
- description: a 1-2 sentence explanation of why this is a risk for this specific business

Respond ONLY with valid JSON in this exact format, no markdown or extra text:
{
  "risks": [
    {"id": "risk-1", "name": "...", "likelihood": "...", "impact": "...", "description": "..."}
  ]
}

Business description:
"#;

/// Advisor backed by the Gemini `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiAdvisor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Override the API base URL (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> PaperResult<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!("Calling Gemini at: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PaperError::network(format!("Failed to reach Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaperError::api(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PaperError::parse(format!("Failed to decode Gemini response: {}", e)))
    }
}

#[async_trait]
impl RiskAdvisor for GeminiAdvisor {
    #[instrument(skip(self, history))]
    async fn plan_turn(&self, history: &[Message]) -> PaperResult<AdvisorPlan> {
        let request = GenerateContentRequest {
            system_instruction: Some(Content::system(SYSTEM_PROMPT)),
            contents: contents_from_history(history),
            tools: Some(vec![search_markets_tool()]),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                response_mime_type: None,
            }),
        };

        let response = self.generate(&request).await?;
        let parts = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .ok_or_else(|| PaperError::parse("No response from Gemini"))?;

        plan_from_parts(parts)
    }

    #[instrument(skip(self, history, outcomes))]
    async fn compose_reply(
        &self,
        history: &[Message],
        outcomes: &[DispatchOutcome],
    ) -> PaperResult<String> {
        let mut contents = contents_from_history(history);

        // Replay the searches as a model turn plus a function-response turn,
        // then request text with tools disabled so the model must answer.
        let mut call_parts = Vec::new();
        let mut response_parts = Vec::new();
        for outcome in outcomes {
            let args = serde_json::to_value(&outcome.record.args).map_err(|e| {
                PaperError::internal(format!("Failed to serialize search args: {}", e))
            })?;

            let mut payload = serde_json::json!({
                "query": outcome.record.args.query,
                "provider": outcome.record.args.provider.to_string(),
                "count": outcome.record.result_count,
                "markets": outcome.markets,
            });
            if let Some(failure) = &outcome.failure {
                payload["error"] = serde_json::Value::String(failure.clone());
            }

            call_parts.push(Part {
                function_call: Some(FunctionCall {
                    name: outcome.record.tool.clone(),
                    args,
                }),
                ..Default::default()
            });
            response_parts.push(Part {
                function_response: Some(FunctionResponse {
                    name: outcome.record.tool.clone(),
                    response: payload,
                }),
                ..Default::default()
            });
        }
        if !call_parts.is_empty() {
            contents.push(Content {
                role: Some("model".to_string()),
                parts: call_parts,
            });
            contents.push(Content {
                role: Some("user".to_string()),
                parts: response_parts,
            });
        }

        let request = GenerateContentRequest {
            system_instruction: Some(Content::system(SYSTEM_PROMPT)),
            contents,
            tools: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                response_mime_type: None,
            }),
        };

        let response = self.generate(&request).await?;
        let parts = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .ok_or_else(|| PaperError::parse("No response from Gemini"))?;

        let text = text_of(parts);
        if text.trim().is_empty() {
            return Err(PaperError::advisor("Gemini returned an empty reply"));
        }
        Ok(text)
    }

    #[instrument(skip(self, description))]
    async fn analyze(&self, description: &str) -> PaperResult<Vec<Risk>> {
        let request = GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::text(
                "user",
                format!("{}{}", RISK_ANALYSIS_PROMPT, description),
            )],
            tools: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                response_mime_type: Some("application/json".to_string()),
            }),
        };

        let response = self.generate(&request).await?;
        let parts = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .ok_or_else(|| PaperError::parse("No response from Gemini"))?;

        risks_from_text(&text_of(parts))
    }
}

// ============================================================================
// Wire types (camelCase on the wire)
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: impl Into<String>) -> Self {
        Content {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.into()),
                ..Default::default()
            }],
        }
    }

    fn system(text: impl Into<String>) -> Self {
        Content {
            role: None,
            parts: vec![Part {
                text: Some(text.into()),
                ..Default::default()
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

// ============================================================================
// Request building and response parsing
// ============================================================================

/// Map a transcript onto Gemini content turns
///
/// Tool messages stay behind: they summarize calls for the client, and the
/// function exchange is rebuilt per request instead.
fn contents_from_history(history: &[Message]) -> Vec<Content> {
    let mut contents = Vec::new();
    for message in history {
        match message {
            Message::User { content } => contents.push(Content::text("user", content)),
            Message::Assistant { content } => contents.push(Content::text("model", content)),
            Message::Tool { .. } => {}
        }
    }
    contents
}

fn search_markets_tool() -> Tool {
    Tool {
        function_declarations: vec![FunctionDeclaration {
            name: SEARCH_MARKETS_TOOL.to_string(),
            description: "Search prediction markets on Kalshi and/or Polymarket. Use this to \
                find markets that could hedge a user's business risk. Returns a list of market \
                contracts with titles, prices, and volumes."
                .to_string(),
            parameters: serde_json::json!({
                "type": "OBJECT",
                "properties": {
                    "query": {
                        "type": "STRING",
                        "description": "Search query for markets. Be specific and risk-focused. \
                            Examples: 'bitcoin price', 'fed interest rate', 'hurricane florida', \
                            'oil price', 'recession', 'inflation'",
                    },
                    "provider": {
                        "type": "STRING",
                        "description": "Which market provider to search. Options: 'all', \
                            'kalshi', 'polymarket'. Use 'kalshi' for financial/commodity markets, \
                            'polymarket' for political/event markets. Default: 'all'",
                    },
                },
                "required": ["query"],
            }),
        }],
    }
}

/// Turn the model's parts into a plan
///
/// Function calls become search intents. Text sent alongside calls is dropped;
/// the composed reply closes the turn.
fn plan_from_parts(parts: &[Part]) -> PaperResult<AdvisorPlan> {
    let mut intents = Vec::new();
    for part in parts {
        let Some(call) = &part.function_call else {
            continue;
        };
        if call.name != SEARCH_MARKETS_TOOL {
            warn!("Ignoring unknown tool call: {}", call.name);
            continue;
        }

        let args = if call.args.is_null() {
            serde_json::json!({})
        } else {
            call.args.clone()
        };
        match serde_json::from_value::<SearchArgs>(args) {
            Ok(args) => intents.push(SearchIntent::new(args.provider, args.query)),
            Err(e) => warn!("Dropping {} call with bad args: {}", SEARCH_MARKETS_TOOL, e),
        }
    }

    if !intents.is_empty() {
        return Ok(AdvisorPlan::search(intents));
    }

    let text = text_of(parts);
    if text.trim().is_empty() {
        return Err(PaperError::advisor(
            "Gemini returned neither text nor usable tool calls",
        ));
    }
    Ok(AdvisorPlan::direct(text))
}

fn text_of(parts: &[Part]) -> String {
    parts.iter().filter_map(|p| p.text.as_deref()).collect()
}

/// Extract JSON from a string that might contain markdown code blocks
fn extract_json(content: &str) -> PaperResult<String> {
    if let Some(start) = content.find("```json") {
        let start = start + 7;
        if let Some(end) = content[start..].find("```") {
            return Ok(content[start..start + end].trim().to_string());
        }
    }

    if let Some(start) = content.find('{') {
        if let Some(end) = content.rfind('}') {
            return Ok(content[start..=end].to_string());
        }
    }

    Err(PaperError::parse("No JSON found in response"))
}

fn risks_from_text(text: &str) -> PaperResult<Vec<Risk>> {
    #[derive(Deserialize)]
    struct RisksEnvelope {
        risks: Vec<Risk>,
    }

    let json_str = extract_json(text)?;
    let envelope: RisksEnvelope = serde_json::from_str(&json_str)
        .map_err(|e| PaperError::parse(format!("Failed to parse risk analysis: {}", e)))?;
    Ok(envelope.risks)
}
