//! Executes search intents against provider adapters

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, instrument, warn};

use paper_core::{
    DispatchOutcome, MarketAdapter, PaperError, PaperResult, ProviderSelector, SearchArgs,
    SearchIntent, ToolCallRecord,
};

use crate::aggregator::{MarketAggregator, ProviderResult};

/// Time limits for a single dispatch
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How long one provider may take before it fails alone
    pub provider_timeout: Duration,
    /// Deadline for the whole intent; providers that finished stay in
    pub intent_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            provider_timeout: Duration::from_secs(5),
            intent_timeout: Duration::from_secs(8),
        }
    }
}

/// Routes search intents to matching adapters and aggregates what comes back
pub struct ToolDispatcher {
    adapters: Vec<Arc<dyn MarketAdapter>>,
    aggregator: MarketAggregator,
    config: DispatchConfig,
}

impl ToolDispatcher {
    pub fn new(adapters: Vec<Arc<dyn MarketAdapter>>, aggregator: MarketAggregator) -> Self {
        ToolDispatcher {
            adapters,
            aggregator,
            config: DispatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn aggregator(&self) -> &MarketAggregator {
        &self.aggregator
    }

    /// Adapters matching a provider selector
    fn resolve(&self, selector: ProviderSelector) -> PaperResult<Vec<Arc<dyn MarketAdapter>>> {
        let matched: Vec<_> = self
            .adapters
            .iter()
            .filter(|adapter| match selector {
                ProviderSelector::All => true,
                ProviderSelector::Only(provider) => adapter.provider() == provider,
            })
            .cloned()
            .collect();

        if matched.is_empty() {
            return Err(PaperError::client(format!(
                "No adapter available for provider '{}'",
                selector
            )));
        }
        Ok(matched)
    }

    /// Execute one search intent
    ///
    /// All matching providers run concurrently, each under its own timeout
    /// and all under the intent deadline. A provider missing either limit
    /// fails alone; whatever finished in time is aggregated.
    ///
    /// Returns `Err` only for caller mistakes (no adapter for the selector).
    /// Provider trouble ends up in the outcome: partial failures silently
    /// shrink the result, total failure sets [`DispatchOutcome::failure`].
    #[instrument(skip(self, intent), fields(provider = %intent.provider, query = %intent.query))]
    pub async fn dispatch(&self, intent: &SearchIntent) -> PaperResult<DispatchOutcome> {
        let adapters = self.resolve(intent.provider)?;
        let deadline = Instant::now() + self.config.intent_timeout;

        let mut providers = Vec::with_capacity(adapters.len());
        let mut handles = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let provider = adapter.provider();
            providers.push(provider);

            let query = intent.query.clone();
            let filters = intent.filters.clone();
            let provider_timeout = self.config.provider_timeout;
            handles.push(tokio::spawn(async move {
                match timeout(provider_timeout, adapter.search(&query, &filters)).await {
                    Ok(result) => result,
                    Err(_) => Err(PaperError::provider(
                        provider,
                        format!("No response within {}s", provider_timeout.as_secs()),
                    )),
                }
            }));
        }

        let intent_timeout = self.config.intent_timeout;
        let settled = join_all(handles.into_iter().map(|handle| {
            let abort = handle.abort_handle();
            async move {
                match timeout_at(deadline, handle).await {
                    Ok(joined) => Some(joined),
                    Err(_) => {
                        abort.abort();
                        None
                    }
                }
            }
        }))
        .await;

        let mut results = Vec::with_capacity(settled.len());
        for (provider, joined) in providers.into_iter().zip(settled) {
            let outcome = match joined {
                Some(Ok(result)) => result,
                Some(Err(e)) => Err(PaperError::internal(format!("Search task failed: {}", e))),
                None => Err(PaperError::provider(
                    provider,
                    format!(
                        "No result within the {}s intent deadline",
                        intent_timeout.as_secs()
                    ),
                )),
            };
            results.push(ProviderResult { provider, outcome });
        }

        let record_args = SearchArgs {
            provider: intent.provider,
            query: intent.query.clone(),
        };
        match self.aggregator.merge(results, &intent.query) {
            Ok(markets) => {
                debug!("Dispatch returned {} markets", markets.len());
                let record = ToolCallRecord::search(record_args, markets.len());
                Ok(DispatchOutcome {
                    markets,
                    record,
                    failure: None,
                })
            }
            Err(e @ PaperError::Aggregate(_)) => {
                warn!("Dispatch failed: {}", e);
                let record = ToolCallRecord::search(record_args, 0);
                Ok(DispatchOutcome {
                    markets: Vec::new(),
                    record,
                    failure: Some(e.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Execute several intents concurrently, outcomes in intent order
    pub async fn dispatch_all(
        &self,
        intents: &[SearchIntent],
    ) -> Vec<PaperResult<DispatchOutcome>> {
        join_all(intents.iter().map(|intent| self.dispatch(intent))).await
    }
}
