use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Project;
use crate::error::LlmError;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

// Large pages get folded into prompts, so run with a roomy context window.
const NUM_CTX: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Builds the ordered message list: optional system message first, then the
/// optional user message.
pub fn create_messages(system_prompt: Option<&str>, prompt: Option<&str>) -> Vec<Message> {
    let mut messages = Vec::new();

    if let Some(content) = system_prompt {
        messages.push(Message {
            role: Role::System,
            content: content.to_string(),
        });
    }

    if let Some(content) = prompt {
        messages.push(Message {
            role: Role::User,
            content: content.to_string(),
        });
    }

    messages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Object,
    Array,
    Number,
    String,
    Boolean,
}

#[derive(Debug, Clone, Serialize)]
struct FormatProperty {
    #[serde(rename = "type")]
    kind: FormatType,
}

/// JSON-schema-like output constraint: an `object` root with named, typed
/// properties and a required list.
#[derive(Debug, Clone, Serialize)]
pub struct Format {
    #[serde(rename = "type")]
    kind: FormatType,
    properties: BTreeMap<String, FormatProperty>,
    required: Vec<String>,
}

impl Format {
    pub fn object() -> Self {
        Format {
            kind: FormatType::Object,
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: &str, kind: FormatType, required: bool) -> Self {
        self.properties.insert(key.to_string(), FormatProperty { kind });
        if required {
            self.required.push(key.to_string());
        }
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Format>,
}

#[derive(Serialize)]
struct ChatOptions {
    num_ctx: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatReplyMessage>,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: String,
}

/// Chat client for a local Ollama endpoint. When a `Format` is supplied the
/// reply text is expected to parse as JSON conforming to it; callers own
/// that parse.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(host: Option<&str>, port: Option<u16>) -> Self {
        let host = host.unwrap_or(DEFAULT_OLLAMA_HOST);
        let port = port.unwrap_or(DEFAULT_OLLAMA_PORT);

        OllamaClient {
            client: reqwest::Client::new(),
            base_url: format!("{}:{}", host, port),
        }
    }

    /// Endpoint from the project's stored host/port, falling back to the
    /// documented defaults.
    pub fn for_project(project: &Project) -> Self {
        OllamaClient::new(project.ollama_url.as_deref(), project.ollama_port)
    }

    pub async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        format: Option<&Format>,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: ChatOptions { num_ctx: NUM_CTX },
            format,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let body: ChatResponse = response.json().await?;
        match body.message {
            Some(message) if !message.content.is_empty() => Ok(message.content),
            _ => Err(LlmError::EmptyReply),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_messages_orders_system_before_user() {
        let messages = create_messages(Some("be terse"), Some("list gyms"));

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "list gyms");
    }

    #[test]
    fn create_messages_skips_absent_parts() {
        let messages = create_messages(Some("be terse"), None);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
    }

    #[test]
    fn format_serializes_like_the_wire_schema() {
        let format = Format::object()
            .with_property("queries", FormatType::Array, true)
            .with_property("note", FormatType::String, false);

        let json = serde_json::to_value(&format).unwrap();

        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["queries"]["type"], "array");
        assert_eq!(json["properties"]["note"]["type"], "string");
        assert_eq!(json["required"], serde_json::json!(["queries"]));
    }

    #[test]
    fn client_defaults_to_the_documented_endpoint() {
        let client = OllamaClient::new(None, None);
        assert_eq!(client.base_url, "http://localhost:11434");

        let client = OllamaClient::new(Some("http://10.0.0.5"), Some(11500));
        assert_eq!(client.base_url, "http://10.0.0.5:11500");
    }
}
