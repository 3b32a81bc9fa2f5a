//! Conversation turns: plan, dispatch, reply

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use paper_advisor::{RiskAdvisor, FALLBACK_REPLY, MAX_INTENTS_PER_TURN};
use paper_core::{MarketContract, Message, PaperResult, ToolCallRecord};

use crate::dispatcher::ToolDispatcher;
use crate::session::SessionStore;

/// Everything a finished turn hands back to the caller
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Full transcript including this turn's messages
    pub messages: Vec<Message>,
    /// Markets surfaced by this turn's searches, deduped and ranked
    pub markets: Vec<MarketContract>,
    /// One record per search the turn ran, in intent order
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Runs conversation turns against a session
///
/// A turn advances through fixed stages: append the user message, ask the
/// advisor for a plan, dispatch any search intents, then close with exactly
/// one assistant reply. The session lock is held for the whole turn.
pub struct ConversationService {
    sessions: Arc<SessionStore>,
    dispatcher: Arc<ToolDispatcher>,
    advisor: Arc<dyn RiskAdvisor>,
}

impl ConversationService {
    pub fn new(
        sessions: Arc<SessionStore>,
        dispatcher: Arc<ToolDispatcher>,
        advisor: Arc<dyn RiskAdvisor>,
    ) -> Self {
        ConversationService {
            sessions,
            dispatcher,
            advisor,
        }
    }

    /// Run one turn for a session
    ///
    /// `seed_history` is the client's copy of the transcript; it only counts
    /// when the session has no stored messages yet, otherwise the store wins.
    ///
    /// Tool messages land in intent order regardless of which dispatch
    /// finished first. Provider failures never fail the turn; they surface
    /// through the reply instead.
    #[instrument(skip(self, seed_history, user_message))]
    pub async fn run_turn(
        &self,
        session_id: &str,
        seed_history: Vec<Message>,
        user_message: &str,
    ) -> PaperResult<TurnOutcome> {
        let slot = self.sessions.get_or_create(session_id);
        let mut session = slot.lock().await;

        if session.messages.is_empty() && !seed_history.is_empty() {
            debug!(
                "Seeding session {} with {} client messages",
                session_id,
                seed_history.len()
            );
            session.messages = seed_history;
        }

        session.push(Message::user(user_message));

        let plan = match self.advisor.plan_turn(&session.messages).await {
            Ok(plan) => plan,
            Err(e) => {
                // Unwind the append so a retry does not double the message.
                session.messages.pop();
                return Err(e);
            }
        };

        let mut intents = plan.intents;
        if intents.len() > MAX_INTENTS_PER_TURN {
            warn!(
                "Plan carries {} intents, keeping the first {}",
                intents.len(),
                MAX_INTENTS_PER_TURN
            );
            intents.truncate(MAX_INTENTS_PER_TURN);
        }

        let (reply, markets, tool_calls) = if intents.is_empty() {
            let reply = plan.reply.unwrap_or_else(|| FALLBACK_REPLY.to_string());
            (reply, Vec::new(), Vec::new())
        } else {
            let results = self.dispatcher.dispatch_all(&intents).await;
            let mut outcomes = Vec::with_capacity(results.len());
            for result in results {
                match result {
                    Ok(outcome) => {
                        session.push(Message::tool(&outcome.record));
                        outcomes.push(outcome);
                    }
                    Err(e) => warn!("Dropping undispatchable intent: {}", e),
                }
            }

            let pool: Vec<MarketContract> = outcomes
                .iter()
                .flat_map(|o| o.markets.iter().cloned())
                .collect();
            let markets = self.dispatcher.aggregator().rank(pool);

            let reply = match self.advisor.compose_reply(&session.messages, &outcomes).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Failed to compose reply: {}", e);
                    FALLBACK_REPLY.to_string()
                }
            };

            session.latest_markets = markets.clone();
            let tool_calls = outcomes.into_iter().map(|o| o.record).collect();
            (reply, markets, tool_calls)
        };

        session.push(Message::assistant(reply));

        // The sweeper may have removed the entry mid-turn; the transcript the
        // caller just received must stay reachable for the next turn.
        self.sessions.reinstate(session_id, &slot);

        Ok(TurnOutcome {
            messages: session.messages.clone(),
            markets,
            tool_calls,
        })
    }
}
