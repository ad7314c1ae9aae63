// src/ai/research.rs

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::AiError;

/// The Research Collaborator: a web-search-augmented model call that
/// returns prose to feed into the generation prompt.
///
/// Research is an enhancement, not a requirement; callers go through
/// [`research_learning_path`], which swallows failures and returns an
/// empty string so generation can proceed unaugmented.
#[async_trait]
pub trait ResearchClient: Send + Sync {
    async fn research(&self, current_skills: &str, target_goal: &str) -> Result<String, AiError>;
}

/// Fail-soft wrapper around the Research Collaborator. Never errors.
pub async fn research_learning_path(
    client: &dyn ResearchClient,
    current_skills: &str,
    target_goal: &str,
) -> String {
    match client.research(current_skills, target_goal).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("research failed, proceeding without it: {}", e);
            String::new()
        }
    }
}

/// Used when no research key is configured.
pub struct NoopResearcher;

#[async_trait]
impl ResearchClient for NoopResearcher {
    async fn research(&self, _current_skills: &str, _target_goal: &str) -> Result<String, AiError> {
        Ok(String::new())
    }
}

pub struct PerplexityClient {
    http: reqwest::Client,
    api_key: String,
}

impl PerplexityClient {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AiError::Transport(format!("build http client: {}", e)))?;
        Ok(Self { http, api_key })
    }
}

#[async_trait]
impl ResearchClient for PerplexityClient {
    async fn research(&self, current_skills: &str, target_goal: &str) -> Result<String, AiError> {
        let prompt = format!(
            "I want to create a learning roadmap for someone with the following profile:\n\n\
             Current Skills: {}\n\
             Target Goal: {}\n\n\
             Please research and provide:\n\
             1. The current recommended learning path for this goal\n\
             2. Essential topics and technologies to cover\n\
             3. The optimal order to learn these topics (prerequisites first)\n\
             4. Popular and highly-rated learning resources (courses, books, tutorials)\n\
             5. Typical timeline estimates for each major milestone\n\
             6. Industry trends that might affect what to prioritize\n\
             7. Common mistakes learners make on this path\n\n\
             Focus on practical, actionable information with real resources that exist today.",
            current_skills, target_goal
        );

        let resp = self
            .http
            .post("https://api.perplexity.ai/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": "sonar",
                "messages": [
                    {
                        "role": "system",
                        "content": "You are an expert learning path researcher. Provide comprehensive, current information about learning paths with real resources, accurate timelines, and industry-relevant advice."
                    },
                    { "role": "user", "content": prompt }
                ],
                "max_tokens": 3000,
                "temperature": 0.2,
                "return_citations": true,
            }))
            .send()
            .await
            .map_err(|e| AiError::Transport(format!("perplexity request: {}", e)))?
            .error_for_status()
            .map_err(|e| AiError::Transport(format!("perplexity status: {}", e)))?;

        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AiError::Transport(format!("perplexity body: {}", e)))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        // Fold citations into the prose as a numbered source list.
        let mut result = content;
        if let Some(citations) = body["citations"].as_array() {
            let sources: Vec<String> = citations
                .iter()
                .filter_map(|c| c.as_str())
                .enumerate()
                .map(|(i, url)| format!("{}. {}", i + 1, url))
                .collect();
            if !sources.is_empty() {
                result.push_str("\n\nSources:\n");
                result.push_str(&sources.join("\n"));
            }
        }

        Ok(result)
    }
}
