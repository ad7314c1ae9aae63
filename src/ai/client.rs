// src/ai/client.rs

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::AiError;

/// The Generation Collaborator: one prompt in, free-form text out.
///
/// Two interchangeable backends implement this; which one is live is a
/// config decision made at process start. Pipeline code only ever sees
/// the trait.
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, AiError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AiError::Transport(format!("build http client: {}", e)))
}

/// OpenAI-style chat-completions backend (Groq).
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, AiError> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            api_key,
            model: "llama-3.3-70b-versatile".to_string(),
        })
    }
}

#[async_trait]
impl LanguageModelClient for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let resp = self
            .http
            .post("https://api.groq.com/openai/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "temperature": 0.7,
                "max_tokens": 4000,
            }))
            .send()
            .await
            .map_err(|e| AiError::Transport(format!("groq request: {}", e)))?
            .error_for_status()
            .map_err(|e| AiError::Transport(format!("groq status: {}", e)))?;

        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AiError::Transport(format!("groq body: {}", e)))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

/// Gemini `generateContent` backend.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, AiError> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            api_key,
            model: "gemini-2.0-flash".to_string(),
        })
    }
}

#[async_trait]
impl LanguageModelClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let resp = self
            .http
            .post(&url)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
                "generationConfig": {
                    "temperature": 0.7,
                    "maxOutputTokens": 4000,
                },
            }))
            .send()
            .await
            .map_err(|e| AiError::Transport(format!("gemini request: {}", e)))?
            .error_for_status()
            .map_err(|e| AiError::Transport(format!("gemini status: {}", e)))?;

        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AiError::Transport(format!("gemini body: {}", e)))?;

        let content = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}
