//! Azure OpenAI chat-completions client (vision and text).

use std::time::Duration;

use base64::Engine;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{HeadingEntry, ImageClassification, ImageFormat};

use super::prompts::{
    enhanced_classification_prompt, heading_prompt, HEADING_SYSTEM_PROMPT,
    SIMPLE_CLASSIFICATION_PROMPT,
};
use super::response::{parse_classification, parse_headings};
use super::{check_status, HeadingIdentifier, ImageClassifier, PageText};

pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Documents sent for heading identification are cut to this many chars.
const MAX_DOCUMENT_CHARS: usize = 15_000;

/// Azure OpenAI deployment settings.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    pub api_key: String,
    /// Deployment (model) name
    pub deployment: String,
    pub api_version: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AzureConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Read `AZURE_OPENAI_GPT_ENDPOINT`, `AZURE_OPENAI_GPT_KEY` and
    /// `AZURE_OPENAI_GPT_DEPLOYMENT`.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self::new(
            var("AZURE_OPENAI_GPT_ENDPOINT")?,
            var("AZURE_OPENAI_GPT_KEY")?,
            var("AZURE_OPENAI_GPT_DEPLOYMENT")?,
        ))
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Chat-completions URL for the deployment.
    pub fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    /// The key with everything but the last 4 chars hidden.
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("{}{}", "*".repeat(20), tail)
    }
}

/// Blocking Azure OpenAI client.
pub struct AzureVisionClient {
    client: Client,
    config: AzureConfig,
}

impl AzureVisionClient {
    pub fn new(config: AzureConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AzureConfig {
        &self.config
    }

    /// Send a chat request and return the first choice's text.
    fn chat(&self, messages: Vec<ChatMessage>, max_tokens: u32, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            messages,
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(self.config.chat_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()?;
        let response: ChatResponse = check_status(response)?.json()?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::ModelResponse("response has no message content".to_string()))
    }
}

impl ImageClassifier for AzureVisionClient {
    fn is_important(&self, image: &[u8], format: ImageFormat) -> Result<bool> {
        let message = ChatMessage::user_with_image(SIMPLE_CLASSIFICATION_PROMPT, image, format, None);
        let answer = self.chat(vec![message], 10, 0.1)?;
        log::debug!("Simple classification answer: {}", answer.trim());
        Ok(answer.to_lowercase().contains("important"))
    }

    fn classify(&self, image: &[u8], format: ImageFormat, context: &str) -> Result<ImageClassification> {
        let prompt = enhanced_classification_prompt(context);
        let message = ChatMessage::user_with_image(&prompt, image, format, Some("low"));
        let answer = self.chat(vec![message], 300, 0.3)?;
        parse_classification(&answer)
    }
}

impl HeadingIdentifier for AzureVisionClient {
    fn identify_headings(&self, pages: &[PageText]) -> Result<Vec<HeadingEntry>> {
        let document = page_marked_document(pages, MAX_DOCUMENT_CHARS);
        log::info!(
            "Identifying headings over {} pages ({} chars)",
            pages.len(),
            document.chars().count()
        );

        let messages = vec![
            ChatMessage::text("system", HEADING_SYSTEM_PROMPT),
            ChatMessage::text("user", &heading_prompt(&document)),
        ];
        let answer = self.chat(messages, 2000, 0.1)?;
        parse_headings(&answer)
    }
}

/// Join pages behind "=== PAGE n ===" markers, keeping at most `max_chars`.
pub(crate) fn page_marked_document(pages: &[PageText], max_chars: usize) -> String {
    let document: String = pages
        .iter()
        .map(|p| format!("\n\n=== PAGE {} ===\n\n{}", p.page, p.text))
        .collect();
    match document.char_indices().nth(max_chars) {
        Some((cut, _)) => document[..cut].to_string(),
        None => document,
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

impl ChatMessage {
    fn text(role: &'static str, text: &str) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.to_string()),
        }
    }

    fn user_with_image(
        prompt: &str,
        image: &[u8],
        format: ImageFormat,
        detail: Option<&'static str>,
    ) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: prompt.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/{};base64,{}", format.mime_subtype(), encoded),
                        detail,
                    },
                },
            ]),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
