//! Conversation messages and tool-call records

use serde::{Deserialize, Serialize};

use crate::provider::ProviderSelector;

/// Tool name for market searches, the only tool the advisor can invoke
pub const SEARCH_MARKETS_TOOL: &str = "search_markets";

/// Arguments of one search tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchArgs {
    /// Provider filter ("all" or a single provider)
    #[serde(default)]
    pub provider: ProviderSelector,
    /// Free-text query, empty means "everything the providers list"
    #[serde(default)]
    pub query: String,
}

/// Externally visible summary of one executed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool name, always [`SEARCH_MARKETS_TOOL`]
    pub tool: String,
    pub args: SearchArgs,
    /// Post-aggregation count, the number of markets the user actually sees
    pub result_count: usize,
}

impl ToolCallRecord {
    pub fn search(args: SearchArgs, result_count: usize) -> Self {
        ToolCallRecord {
            tool: SEARCH_MARKETS_TOOL.to_string(),
            args,
            result_count,
        }
    }
}

/// One entry in a conversation transcript
///
/// Tool messages carry only the invocation summary, never the result payload,
/// so transcripts stay compact across long conversations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User {
        content: String,
    },
    Tool {
        content: String,
        tool: String,
        args: SearchArgs,
        result_count: usize,
    },
    Assistant {
        content: String,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
        }
    }

    /// Build a tool message from an executed call record
    pub fn tool(record: &ToolCallRecord) -> Self {
        Message::Tool {
            content: serde_json::to_string(record).unwrap_or_default(),
            tool: record.tool.clone(),
            args: record.args.clone(),
            result_count: record.result_count,
        }
    }

    /// Free-text content of the message
    pub fn content(&self) -> &str {
        match self {
            Message::User { content }
            | Message::Tool { content, .. }
            | Message::Assistant { content } => content,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User { .. })
    }

    pub fn is_tool(&self) -> bool {
        matches!(self, Message::Tool { .. })
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Message::Assistant { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_tag_by_role() {
        let user = serde_json::to_value(Message::user("I run a coffee shop")).unwrap();
        assert_eq!(user["role"], "user");
        assert_eq!(user["content"], "I run a coffee shop");

        let assistant = serde_json::to_value(Message::assistant("Let me search")).unwrap();
        assert_eq!(assistant["role"], "assistant");
    }

    #[test]
    fn tool_message_carries_call_summary() {
        let record = ToolCallRecord::search(
            SearchArgs {
                provider: ProviderSelector::All,
                query: "coffee".to_string(),
            },
            3,
        );
        let value = serde_json::to_value(Message::tool(&record)).unwrap();

        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool"], "search_markets");
        assert_eq!(value["args"]["provider"], "all");
        assert_eq!(value["args"]["query"], "coffee");
        assert_eq!(value["result_count"], 3);
    }

    #[test]
    fn tagged_roles_deserialize_back() {
        let raw = r#"{"role":"user","content":"hello"}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        assert!(message.is_user());
        assert_eq!(message.content(), "hello");
    }
}
