use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

const XAI_API_URL: &str = "https://api.x.ai/v1/chat/completions";
const XAI_MODEL: &str = "grok-beta";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct XaiClient {
    client: Client,
    api_key: String,
}

impl XaiClient {
    pub fn new(api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
        }
    }

    pub async fn generate(
        &self,
        message: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: message.to_string(),
        });

        let request = ChatCompletionRequest {
            model: XAI_MODEL.to_string(),
            messages,
            temperature: 0.7,
            max_tokens: Some(1000),
        };

        let response = self.client
            .post(XAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(format!("xAI API error ({}): {}", status, error_text).into());
        }

        let completion: ChatCompletionResponse = response.json().await?;

        completion.choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| "لم أتمكن من توليد رد من xAI".into())
    }

    pub async fn validate_api_key(&self) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let request = ChatCompletionRequest {
            model: XAI_MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Say 'ok'".to_string(),
            }],
            temperature: 0.0,
            max_tokens: Some(5),
        };

        let response = self.client
            .post(XAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(true)
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err("Invalid xAI API key".into());
            } else if status.as_u16() == 429 {
                return Err("Rate limited - too many requests".into());
            }

            Err(format!("xAI API error ({}): {}", status, error_text).into())
        }
    }
}
