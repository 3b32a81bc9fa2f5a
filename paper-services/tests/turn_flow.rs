//! Conversation turn flow against stub adapters and scripted advisors
//!
//! Run with: cargo test -p paper-services --test turn_flow

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use paper_advisor::{AdvisorPlan, Risk, RiskAdvisor, FALLBACK_REPLY};
use paper_core::{
    DispatchOutcome, MarketAdapter, MarketContract, Message, PaperError, PaperResult, Provider,
    ProviderSelector, SearchFilters, SearchIntent,
};
use paper_services::{
    ConversationService, DispatchConfig, MarketAggregator, SessionStore, ToolDispatcher,
    DEFAULT_SESSION_TTL_SECS,
};

// ============================================================================
// Stubs
// ============================================================================

struct StubAdapter {
    provider: Provider,
    delay: Duration,
    markets: Vec<MarketContract>,
}

impl StubAdapter {
    fn new(provider: Provider, markets: Vec<MarketContract>) -> Arc<Self> {
        Arc::new(StubAdapter {
            provider,
            delay: Duration::ZERO,
            markets,
        })
    }

    fn slow(provider: Provider, delay: Duration, markets: Vec<MarketContract>) -> Arc<Self> {
        Arc::new(StubAdapter {
            provider,
            delay,
            markets,
        })
    }
}

#[async_trait]
impl MarketAdapter for StubAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn search(
        &self,
        _query: &str,
        _filters: &SearchFilters,
    ) -> PaperResult<Vec<MarketContract>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.markets.clone())
    }
}

struct ScriptedAdvisor {
    intents: Vec<SearchIntent>,
    direct_reply: Option<String>,
    compose_reply: Option<String>,
}

impl ScriptedAdvisor {
    fn searching(intents: Vec<SearchIntent>, compose: &str) -> Arc<Self> {
        Arc::new(ScriptedAdvisor {
            intents,
            direct_reply: None,
            compose_reply: Some(compose.to_string()),
        })
    }

    fn direct(reply: &str) -> Arc<Self> {
        Arc::new(ScriptedAdvisor {
            intents: Vec::new(),
            direct_reply: Some(reply.to_string()),
            compose_reply: None,
        })
    }

    fn broken_compose(intents: Vec<SearchIntent>) -> Arc<Self> {
        Arc::new(ScriptedAdvisor {
            intents,
            direct_reply: None,
            compose_reply: None,
        })
    }
}

#[async_trait]
impl RiskAdvisor for ScriptedAdvisor {
    async fn plan_turn(&self, _history: &[Message]) -> PaperResult<AdvisorPlan> {
        if self.intents.is_empty() {
            Ok(AdvisorPlan::direct(
                self.direct_reply.clone().unwrap_or_default(),
            ))
        } else {
            Ok(AdvisorPlan::search(self.intents.clone()))
        }
    }

    async fn compose_reply(
        &self,
        _history: &[Message],
        _outcomes: &[DispatchOutcome],
    ) -> PaperResult<String> {
        match &self.compose_reply {
            Some(text) => Ok(text.clone()),
            None => Err(PaperError::advisor("scripted compose failure")),
        }
    }

    async fn analyze(&self, _description: &str) -> PaperResult<Vec<Risk>> {
        Ok(Vec::new())
    }
}

/// Fails every plan call, like an unreachable model endpoint
struct FailingAdvisor;

#[async_trait]
impl RiskAdvisor for FailingAdvisor {
    async fn plan_turn(&self, _history: &[Message]) -> PaperResult<AdvisorPlan> {
        Err(PaperError::advisor("scripted plan failure"))
    }

    async fn compose_reply(
        &self,
        _history: &[Message],
        _outcomes: &[DispatchOutcome],
    ) -> PaperResult<String> {
        Err(PaperError::advisor("scripted plan failure"))
    }

    async fn analyze(&self, _description: &str) -> PaperResult<Vec<Risk>> {
        Ok(Vec::new())
    }
}

/// Drops its own session while planning, like a sweeper racing the turn
struct EvictingAdvisor {
    store: Arc<SessionStore>,
    session_id: String,
    intents: Vec<SearchIntent>,
}

#[async_trait]
impl RiskAdvisor for EvictingAdvisor {
    async fn plan_turn(&self, _history: &[Message]) -> PaperResult<AdvisorPlan> {
        self.store.drop_session(&self.session_id);
        Ok(AdvisorPlan::search(self.intents.clone()))
    }

    async fn compose_reply(
        &self,
        _history: &[Message],
        _outcomes: &[DispatchOutcome],
    ) -> PaperResult<String> {
        Ok("Recovered".to_string())
    }

    async fn analyze(&self, _description: &str) -> PaperResult<Vec<Risk>> {
        Ok(Vec::new())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn market(provider: Provider, id: &str, title: &str, volume: &str) -> MarketContract {
    MarketContract {
        id: id.to_string(),
        provider,
        title: title.to_string(),
        volume: volume.to_string(),
        yes_price: "$0.42".to_string(),
        no_price: "$0.58".to_string(),
        expiry: "Jun 30, 2026".to_string(),
    }
}

fn kalshi_markets() -> Vec<MarketContract> {
    vec![
        market(Provider::Kalshi, "kalshi:KC3", "Coffee above $3?", "$2M"),
        market(Provider::Kalshi, "kalshi:KC4", "Coffee supply shortage?", "$5K"),
    ]
}

fn poly_markets() -> Vec<MarketContract> {
    vec![market(
        Provider::Polymarket,
        "polymarket:42",
        "Coffee shortage by June?",
        "$900K",
    )]
}

fn coffee_intent() -> SearchIntent {
    SearchIntent::new(ProviderSelector::All, "coffee")
}

fn build(
    advisor: Arc<dyn RiskAdvisor>,
    adapters: Vec<Arc<dyn MarketAdapter>>,
) -> (Arc<SessionStore>, ConversationService) {
    let store = Arc::new(SessionStore::new(DEFAULT_SESSION_TTL_SECS));
    let dispatcher = Arc::new(ToolDispatcher::new(adapters, MarketAggregator::new()));
    let service = ConversationService::new(Arc::clone(&store), dispatcher, advisor);
    (store, service)
}

fn both_adapters() -> Vec<Arc<dyn MarketAdapter>> {
    vec![
        StubAdapter::new(Provider::Kalshi, kalshi_markets()),
        StubAdapter::new(Provider::Polymarket, poly_markets()),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn coffee_turn_end_to_end() {
    let advisor = ScriptedAdvisor::searching(vec![coffee_intent()], "Here are the best hedges");
    let (_store, service) = build(advisor, both_adapters());

    let outcome = service
        .run_turn("s1", Vec::new(), "I run a coffee shop, what can I hedge with?")
        .await
        .unwrap();

    assert_eq!(outcome.messages.len(), 3);
    assert_eq!(
        outcome.messages[0],
        Message::user("I run a coffee shop, what can I hedge with?")
    );
    match &outcome.messages[1] {
        Message::Tool {
            tool,
            args,
            result_count,
            ..
        } => {
            assert_eq!(tool, "search_markets");
            assert_eq!(args.provider, ProviderSelector::All);
            assert_eq!(args.query, "coffee");
            assert_eq!(*result_count, 3);
        }
        other => panic!("expected tool message, got {:?}", other),
    }
    assert_eq!(
        outcome.messages[2],
        Message::assistant("Here are the best hedges")
    );

    // Ranked by traded volume across both providers.
    let ids: Vec<&str> = outcome.markets.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["kalshi:KC3", "polymarket:42", "kalshi:KC4"]);

    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(outcome.tool_calls[0].result_count, 3);
}

#[tokio::test]
async fn tool_messages_follow_intent_order() {
    let advisor = ScriptedAdvisor::searching(
        vec![
            SearchIntent::new(ProviderSelector::Only(Provider::Kalshi), ""),
            SearchIntent::new(ProviderSelector::Only(Provider::Polymarket), ""),
        ],
        "Done",
    );
    let adapters: Vec<Arc<dyn MarketAdapter>> = vec![
        StubAdapter::slow(Provider::Kalshi, Duration::from_millis(80), kalshi_markets()),
        StubAdapter::new(Provider::Polymarket, poly_markets()),
    ];
    let (_store, service) = build(advisor, adapters);

    let outcome = service
        .run_turn("s1", Vec::new(), "check both")
        .await
        .unwrap();

    // Kalshi finished last but was asked first, so its record comes first.
    assert_eq!(outcome.messages.len(), 4);
    match (&outcome.messages[1], &outcome.messages[2]) {
        (Message::Tool { args: first, .. }, Message::Tool { args: second, .. }) => {
            assert_eq!(first.provider, ProviderSelector::Only(Provider::Kalshi));
            assert_eq!(second.provider, ProviderSelector::Only(Provider::Polymarket));
        }
        other => panic!("expected two tool messages, got {:?}", other),
    }

    // The market union re-ranks by volume across both dispatches.
    let ids: Vec<&str> = outcome.markets.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["kalshi:KC3", "polymarket:42", "kalshi:KC4"]);
}

#[tokio::test]
async fn turn_survives_provider_timeout() {
    let advisor = ScriptedAdvisor::searching(vec![coffee_intent()], "Partial but useful");
    let adapters: Vec<Arc<dyn MarketAdapter>> = vec![
        StubAdapter::slow(Provider::Kalshi, Duration::from_millis(200), kalshi_markets()),
        StubAdapter::new(Provider::Polymarket, poly_markets()),
    ];
    let store = Arc::new(SessionStore::new(DEFAULT_SESSION_TTL_SECS));
    let dispatcher = Arc::new(
        ToolDispatcher::new(adapters, MarketAggregator::new()).with_config(DispatchConfig {
            provider_timeout: Duration::from_millis(50),
            intent_timeout: Duration::from_millis(500),
        }),
    );
    let service = ConversationService::new(store, dispatcher, advisor);

    let outcome = service
        .run_turn("s1", Vec::new(), "coffee risk")
        .await
        .unwrap();

    assert_eq!(outcome.markets.len(), 1);
    assert_eq!(outcome.markets[0].id, "polymarket:42");
    assert_eq!(outcome.tool_calls[0].result_count, 1);
    assert_eq!(outcome.messages.len(), 3);
}

#[tokio::test]
async fn transcript_grows_across_turns() {
    let advisor = ScriptedAdvisor::searching(vec![coffee_intent()], "Found some");
    let (_store, service) = build(advisor, both_adapters());

    let first = service
        .run_turn("s1", Vec::new(), "I run a coffee shop")
        .await
        .unwrap();
    assert_eq!(first.messages.len(), 3);

    let second = service
        .run_turn("s1", Vec::new(), "anything about shipping?")
        .await
        .unwrap();
    assert_eq!(second.messages.len(), 6);
    assert_eq!(second.messages[3], Message::user("anything about shipping?"));
}

#[tokio::test]
async fn client_history_seeds_only_fresh_sessions() {
    let advisor = ScriptedAdvisor::searching(vec![coffee_intent()], "Noted");
    let (_store, service) = build(advisor, both_adapters());

    let seed = vec![Message::user("earlier"), Message::assistant("noted")];
    let first = service.run_turn("s1", seed, "search coffee").await.unwrap();
    assert_eq!(first.messages.len(), 5);
    assert_eq!(first.messages[0], Message::user("earlier"));

    // A different client copy loses to the stored transcript.
    let stale_seed = vec![Message::user("bogus")];
    let second = service.run_turn("s1", stale_seed, "again").await.unwrap();
    assert_eq!(second.messages.len(), 8);
    assert_eq!(second.messages[0], Message::user("earlier"));
}

#[tokio::test]
async fn clarifying_turn_runs_no_searches() {
    let advisor = ScriptedAdvisor::direct("What does your business depend on most?");
    let (_store, service) = build(advisor, both_adapters());

    let outcome = service.run_turn("s1", Vec::new(), "hi").await.unwrap();

    assert_eq!(outcome.messages.len(), 2);
    assert_eq!(
        outcome.messages[1],
        Message::assistant("What does your business depend on most?")
    );
    assert!(outcome.markets.is_empty());
    assert!(outcome.tool_calls.is_empty());
}

#[tokio::test]
async fn intent_flood_is_capped() {
    let intents = vec![coffee_intent(); 7];
    let advisor = ScriptedAdvisor::searching(intents, "Plenty of coffee hedges");
    let (_store, service) = build(advisor, both_adapters());

    let outcome = service
        .run_turn("s1", Vec::new(), "search everything")
        .await
        .unwrap();

    assert_eq!(outcome.tool_calls.len(), 5);
    // user + five tool records + assistant
    assert_eq!(outcome.messages.len(), 7);
}

#[tokio::test]
async fn failed_compose_degrades_to_fallback() {
    let advisor = ScriptedAdvisor::broken_compose(vec![coffee_intent()]);
    let (_store, service) = build(advisor, both_adapters());

    let outcome = service
        .run_turn("s1", Vec::new(), "coffee risk")
        .await
        .unwrap();

    assert_eq!(outcome.messages.len(), 3);
    assert_eq!(outcome.messages[2], Message::assistant(FALLBACK_REPLY));
    // The search results still count even though the reply degraded.
    assert_eq!(outcome.markets.len(), 3);
}

#[tokio::test]
async fn failed_plan_unwinds_user_message() {
    let (store, service) = build(Arc::new(FailingAdvisor), both_adapters());

    let err = service
        .run_turn("s1", Vec::new(), "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, PaperError::Advisor(_)));

    // A retry starts from a clean transcript instead of doubling the message.
    assert!(store.transcript("s1").await.is_empty());
}

#[tokio::test]
async fn unservable_intent_is_dropped() {
    let advisor = ScriptedAdvisor::searching(
        vec![SearchIntent::new(
            ProviderSelector::Only(Provider::Polymarket),
            "coffee",
        )],
        "Nothing to show",
    );
    let adapters: Vec<Arc<dyn MarketAdapter>> =
        vec![StubAdapter::new(Provider::Kalshi, kalshi_markets())];
    let (_store, service) = build(advisor, adapters);

    let outcome = service
        .run_turn("s1", Vec::new(), "only polymarket please")
        .await
        .unwrap();

    assert_eq!(outcome.messages.len(), 2);
    assert!(outcome.tool_calls.is_empty());
    assert!(outcome.markets.is_empty());
    assert_eq!(outcome.messages[1], Message::assistant("Nothing to show"));
}

#[tokio::test]
async fn evicted_session_is_reinstated_after_turn() {
    let store = Arc::new(SessionStore::new(DEFAULT_SESSION_TTL_SECS));
    let advisor = Arc::new(EvictingAdvisor {
        store: Arc::clone(&store),
        session_id: "doomed".to_string(),
        intents: vec![coffee_intent()],
    });
    let dispatcher = Arc::new(ToolDispatcher::new(both_adapters(), MarketAggregator::new()));
    let service = ConversationService::new(Arc::clone(&store), dispatcher, advisor);

    let outcome = service
        .run_turn("doomed", Vec::new(), "coffee risk")
        .await
        .unwrap();
    assert_eq!(outcome.messages.len(), 3);

    // The turn survived the eviction and its transcript is reachable again.
    assert!(store.contains("doomed"));
    let slot = store.get("doomed").unwrap();
    assert_eq!(slot.lock().await.messages.len(), 3);
}

#[tokio::test]
async fn session_remembers_latest_markets() {
    let store = Arc::new(SessionStore::new(DEFAULT_SESSION_TTL_SECS));
    let dispatcher = Arc::new(ToolDispatcher::new(both_adapters(), MarketAggregator::new()));

    let searching = ConversationService::new(
        Arc::clone(&store),
        Arc::clone(&dispatcher),
        ScriptedAdvisor::searching(vec![coffee_intent()], "Found"),
    );
    searching
        .run_turn("s1", Vec::new(), "coffee risk")
        .await
        .unwrap();

    let slot = store.get("s1").unwrap();
    assert_eq!(slot.lock().await.latest_markets.len(), 3);

    // A turn without searches leaves the stored markets alone.
    let chatting = ConversationService::new(
        Arc::clone(&store),
        dispatcher,
        ScriptedAdvisor::direct("Sure thing"),
    );
    chatting.run_turn("s1", Vec::new(), "thanks").await.unwrap();
    assert_eq!(slot.lock().await.latest_markets.len(), 3);
}
