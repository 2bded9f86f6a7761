//! Chat-completions client for invoice table generation
//!
//! The instruction contract: return only a JSON object over the fixed
//! invoice schema, every value a parallel array sized by the count of
//! distinct non-null item ids. The model is not trusted to honor it; the
//! generator stage validates everything.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::types::invoice::INVOICE_FIELDS;

use super::InvoiceModel;

const SYSTEM_INSTRUCTION: &str = "You are an invoice-to-JSON converter. \
    Your only goal is to transform user-supplied text into one valid JSON object \
    that exactly matches the schema the user provides. \
    Output ONLY that JSON: no prose, no markdown fences, no explanations.";

/// OpenAI-style chat-completions client.
pub struct OpenAiClient {
    client: Client,
    config: ModelConfig,
}

impl OpenAiClient {
    pub fn new(config: ModelConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Build the user prompt: task, input payload, schema, rules.
    fn build_prompt(&self, page_text: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str("## TASK\n");
        prompt.push_str(
            "Convert the text in INPUT into a single JSON object that follows the schema in SCHEMA.\n",
        );
        prompt.push_str(
            "The number of rows equals the count of distinct non-null `item_id` values. \
             Ensure every list has that same length.\n\n",
        );

        prompt.push_str("## INPUT\n");
        prompt.push_str(page_text);
        prompt.push_str("\n\n");

        prompt.push_str("## SCHEMA\n{\n");
        for (index, field) in INVOICE_FIELDS.iter().enumerate() {
            prompt.push_str(&format!("  \"{}\": [<str>, ...]", field));
            if index + 1 < INVOICE_FIELDS.len() {
                prompt.push(',');
            }
            prompt.push('\n');
        }
        prompt.push_str("}\n\n");

        prompt.push_str("## RULES\n");
        prompt.push_str(
            "1. Return only the JSON object above; no extra keys, commentary or markdown.\n",
        );
        prompt.push_str(
            "2. When an item id does not appear as a textual numeric value, \
             list one entry per item found.\n",
        );
        prompt.push_str("3. Use valid UTF-8, standard double quotes, no trailing commas.\n");
        prompt.push_str(
            "4. Extract only the customer's address; ignore email, phone and fax lines.\n",
        );

        prompt
    }
}

#[async_trait]
impl InvoiceModel for OpenAiClient {
    async fn generate_invoice_json(&self, page_text: &str) -> Result<String> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| Error::Config("invalid model API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_completion_tokens: self.config.max_completion_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: self.build_prompt(page_text),
                },
            ],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Service(format!("model request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!(
                "model generation failed ({}): {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("failed to parse model response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Service("no choices in model response".to_string()))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// API request/response types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_completion_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
