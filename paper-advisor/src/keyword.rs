//! Deterministic advisor used when no Gemini key is configured

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::instrument;

use paper_core::{DispatchOutcome, Message, PaperError, PaperResult, ProviderSelector, SearchIntent};

use crate::{AdvisorPlan, Risk, RiskAdvisor, FALLBACK_REPLY};

/// Words that carry no signal for a market search
const STOPWORDS: &[&str] = &[
    "a", "about", "am", "an", "and", "any", "are", "be", "been", "business", "but", "can",
    "could", "do", "does", "find", "for", "from", "has", "have", "hedge", "hedging", "help",
    "how", "i", "if", "in", "is", "it", "its", "like", "looking", "market", "markets", "me",
    "my", "need", "of", "on", "or", "our", "own", "risk", "risks", "run", "search", "should",
    "so", "some", "that", "the", "their", "them", "they", "this", "to", "want", "was", "we",
    "what", "which", "with", "worried", "worry", "would", "you", "your",
];

const MAX_QUERY_TERMS: usize = 4;

/// Advisor that plans searches from keywords in the latest user message
///
/// No LLM involved: term extraction drives the search, the reply is a plain
/// summary of what came back, and risk analysis returns fixture data.
#[derive(Debug, Clone, Default)]
pub struct KeywordAdvisor;

impl KeywordAdvisor {
    pub fn new() -> Self {
        KeywordAdvisor
    }
}

#[async_trait]
impl RiskAdvisor for KeywordAdvisor {
    #[instrument(skip(self, history))]
    async fn plan_turn(&self, history: &[Message]) -> PaperResult<AdvisorPlan> {
        let last_user = history
            .iter()
            .rev()
            .find(|m| m.is_user())
            .ok_or_else(|| PaperError::advisor("No user message to plan from"))?;

        let terms = significant_terms(last_user.content());
        if terms.is_empty() {
            return Ok(AdvisorPlan::direct(
                "Tell me a bit about your business: what you sell, where you operate, and \
                 which costs or events worry you most. I'll look for prediction markets that \
                 can hedge those risks.",
            ));
        }

        Ok(AdvisorPlan::search(vec![SearchIntent::new(
            ProviderSelector::All,
            terms.join(" "),
        )]))
    }

    #[instrument(skip(self, _history, outcomes))]
    async fn compose_reply(
        &self,
        _history: &[Message],
        outcomes: &[DispatchOutcome],
    ) -> PaperResult<String> {
        let mut seen = HashSet::new();
        let mut markets = Vec::new();
        for outcome in outcomes {
            for market in &outcome.markets {
                if seen.insert(market.id.as_str()) {
                    markets.push(market);
                }
            }
        }

        if markets.is_empty() {
            if outcomes.iter().any(|o| o.failure.is_some()) {
                return Ok("I couldn't reach the market providers for that search. Give me a \
                    moment and ask again, or try a different angle on the risk."
                    .to_string());
            }
            return Ok(FALLBACK_REPLY.to_string());
        }

        let noun = if markets.len() == 1 { "market" } else { "markets" };
        let mut reply = format!(
            "I found {} {} that could hedge this. The most traded ones:\n",
            markets.len(),
            noun
        );
        for market in markets.iter().take(5) {
            reply.push_str(&format!(
                "\n- {} ({}): YES {} / NO {}, {} traded",
                market.title,
                market.provider.display_name(),
                market.yes_price,
                market.no_price,
                market.volume
            ));
        }
        reply.push_str(
            "\n\nBuy YES on a market to get paid when the risk happens, NO for the opposite \
             side. Want me to refine the search?",
        );
        Ok(reply)
    }

    #[instrument(skip(self, _description))]
    async fn analyze(&self, _description: &str) -> PaperResult<Vec<Risk>> {
        Ok(mock_risks())
    }
}

/// Lowercased, deduplicated query terms from free text
fn significant_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in text.split_whitespace() {
        let term: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if term.len() < 3 || STOPWORDS.contains(&term.as_str()) {
            continue;
        }
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms.truncate(MAX_QUERY_TERMS);
    terms
}

fn mock_risks() -> Vec<Risk> {
    vec![
        Risk {
            id: "risk-1".to_string(),
            name: "Coffee Bean Price Surge".to_string(),
            likelihood: "High".to_string(),
            impact: "Severe".to_string(),
            description: "Exposure to Arabica futures volatility due to reliance on Brazilian \
                imports."
                .to_string(),
        },
        Risk {
            id: "risk-2".to_string(),
            name: "Supply Chain Disruption".to_string(),
            likelihood: "Medium".to_string(),
            impact: "High".to_string(),
            description: "Potential shipping delays affecting inventory levels during peak \
                season."
                .to_string(),
        },
        Risk {
            id: "risk-3".to_string(),
            name: "Local Foot Traffic Decline".to_string(),
            likelihood: "Low".to_string(),
            impact: "Moderate".to_string(),
            description: "Risk of reduced revenue due to local economic downturn or weather \
                events."
                .to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_core::{MarketContract, Provider, SearchArgs, ToolCallRecord};

    fn market(id: &str, title: &str) -> MarketContract {
        MarketContract {
            id: id.to_string(),
            provider: Provider::Kalshi,
            title: title.to_string(),
            volume: "$125.0K".to_string(),
            yes_price: "$0.42".to_string(),
            no_price: "$0.58".to_string(),
            expiry: "Jun 30, 2026".to_string(),
        }
    }

    fn outcome(markets: Vec<MarketContract>, failure: Option<&str>) -> DispatchOutcome {
        let count = markets.len();
        DispatchOutcome {
            markets,
            record: ToolCallRecord::search(
                SearchArgs {
                    provider: ProviderSelector::All,
                    query: "coffee".to_string(),
                },
                count,
            ),
            failure: failure.map(str::to_string),
        }
    }

    #[test]
    fn terms_skip_stopwords_and_short_words() {
        let terms = significant_terms("I run a coffee shop and worry about bean prices");
        assert_eq!(terms, vec!["coffee", "shop", "bean", "prices"]);
    }

    #[tokio::test]
    async fn plan_searches_all_providers() {
        let advisor = KeywordAdvisor::new();
        let history = vec![Message::user("I run a coffee shop and worry about bean prices")];

        let plan = advisor.plan_turn(&history).await.unwrap();
        assert_eq!(plan.intents.len(), 1);
        assert_eq!(plan.intents[0].provider, ProviderSelector::All);
        assert_eq!(plan.intents[0].query, "coffee shop bean prices");
    }

    #[tokio::test]
    async fn vague_message_asks_for_detail() {
        let advisor = KeywordAdvisor::new();
        let history = vec![Message::user("hi")];

        let plan = advisor.plan_turn(&history).await.unwrap();
        assert!(plan.intents.is_empty());
        assert!(plan.reply.unwrap().contains("your business"));
    }

    #[tokio::test]
    async fn reply_lists_unique_markets() {
        let advisor = KeywordAdvisor::new();
        let outcomes = vec![
            outcome(
                vec![
                    market("kalshi:KC-HIGH", "Coffee futures above $3?"),
                    market("kalshi:PORT", "East coast port strike?"),
                ],
                None,
            ),
            outcome(vec![market("kalshi:PORT", "East coast port strike?")], None),
        ];

        let reply = advisor.compose_reply(&[], &outcomes).await.unwrap();
        assert!(reply.contains("2 markets"));
        assert!(reply.contains("Coffee futures above $3?"));
        assert!(reply.contains("East coast port strike?"));
    }

    #[tokio::test]
    async fn empty_results_use_fallback_reply() {
        let advisor = KeywordAdvisor::new();
        let outcomes = vec![outcome(vec![], None)];

        let reply = advisor.compose_reply(&[], &outcomes).await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn provider_failures_are_reported() {
        let advisor = KeywordAdvisor::new();
        let outcomes = vec![outcome(vec![], Some("All providers failed"))];

        let reply = advisor.compose_reply(&[], &outcomes).await.unwrap();
        assert!(reply.contains("couldn't reach the market providers"));
    }

    #[tokio::test]
    async fn analyze_returns_fixture_risks() {
        let advisor = KeywordAdvisor::new();
        let risks = advisor.analyze("a coffee shop in Portland").await.unwrap();

        assert_eq!(risks.len(), 3);
        assert_eq!(risks[0].id, "risk-1");
        assert_eq!(risks[0].name, "Coffee Bean Price Surge");
        assert_eq!(risks[2].impact, "Moderate");
    }
}
