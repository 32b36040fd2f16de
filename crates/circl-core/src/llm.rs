use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{CirclError, Result};
use crate::retry::with_retry;

/// Anything that can turn a prompt into text. The insight and chat pipelines
/// are generic over this so they can run against canned or failing generators.
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Request body of the Circl AI proxy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub response: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

/// LLM text generation over HTTP.
pub struct LlmService {
    provider: LlmProvider,
    config: LlmConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for LlmService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmService")
            .field("provider", &self.provider)
            .field("model", &self.config.model)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LlmProvider {
    Proxy,
    Ollama,
    OpenAI,
    Anthropic,
    Disabled,
}

impl LlmService {
    /// Create an LLM service from configuration. A disabled config yields a
    /// service whose every call fails, which callers treat as "AI unavailable".
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let provider = if !config.enabled {
            LlmProvider::Disabled
        } else {
            match config.provider.as_str() {
                "proxy" => LlmProvider::Proxy,
                "ollama" => LlmProvider::Ollama,
                "openai" => LlmProvider::OpenAI,
                "anthropic" | "claude" => LlmProvider::Anthropic,
                other => {
                    return Err(CirclError::Config(format!(
                        "unknown LLM provider: '{other}' (expected 'proxy', 'ollama', 'openai', or 'anthropic')"
                    )));
                }
            }
        };

        match provider {
            LlmProvider::Proxy => {
                if config.base_url.as_deref().unwrap_or("").is_empty() {
                    return Err(CirclError::Config(
                        "proxy LLM provider requires llm.base_url".to_string(),
                    ));
                }
            }
            LlmProvider::OpenAI => {
                resolve_api_key(config, "OPENAI_API_KEY")?;
            }
            LlmProvider::Anthropic => {
                resolve_api_key(config, "ANTHROPIC_API_KEY")?;
            }
            LlmProvider::Ollama | LlmProvider::Disabled => {}
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            provider,
            config: config.clone(),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.provider != LlmProvider::Disabled
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate_once(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        match self.provider {
            LlmProvider::Proxy => self.generate_proxy(prompt, system).await,
            LlmProvider::Ollama => self.generate_ollama(prompt, system).await,
            LlmProvider::OpenAI => self.generate_openai(prompt, system).await,
            LlmProvider::Anthropic => self.generate_anthropic(prompt, system).await,
            LlmProvider::Disabled => Err(CirclError::Llm("AI assistant is disabled".into())),
        }
    }

    /// Circl AI proxy: POST {base_url} with `{prompt, systemPrompt, model, maxTokens, temperature}`.
    async fn generate_proxy(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let url = self.config.base_url.as_deref().unwrap_or_default();
        let body = CompletionRequest {
            prompt,
            system_prompt: system,
            model: Some(&self.config.model),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let mut req = self.client.post(url).json(&body);
        if let Some(key) = self.optional_api_key() {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CirclError::Llm(format!("proxy error {status}: {text}")));
        }

        let parsed: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| CirclError::Llm(format!("proxy response parse error: {e}")))?;

        if let Some(ref usage) = parsed.usage {
            tracing::debug!(model = ?parsed.model, %usage, "proxy completion");
        }
        Ok(parsed.response)
    }

    /// Ollama: POST {base_url}/api/generate
    async fn generate_ollama(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("http://localhost:11434");

        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "num_predict": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if let Some(sys) = system {
            body["system"] = serde_json::Value::String(sys.to_string());
        }

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CirclError::Llm(format!("Ollama error {status}: {text}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CirclError::Llm(format!("Ollama response parse error: {e}")))?;

        json["response"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CirclError::Llm("Ollama response missing 'response' field".into()))
    }

    /// OpenAI: POST {base_url}/v1/chat/completions
    async fn generate_openai(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let api_key = resolve_api_key(&self.config, "OPENAI_API_KEY")?;
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com");

        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(serde_json::json!({"role": "system", "content": sys}));
        }
        messages.push(serde_json::json!({"role": "user", "content": prompt}));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CirclError::Llm(format!("OpenAI error {status}: {text}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CirclError::Llm(format!("OpenAI response parse error: {e}")))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CirclError::Llm("OpenAI response missing content".into()))
    }

    /// Anthropic: POST {base_url}/v1/messages
    async fn generate_anthropic(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let api_key = resolve_api_key(&self.config, "ANTHROPIC_API_KEY")?;
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.anthropic.com");

        let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        if let Some(sys) = system {
            body["system"] = serde_json::Value::String(sys.to_string());
        }

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CirclError::Llm(format!("Anthropic error {status}: {text}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CirclError::Llm(format!("Anthropic response parse error: {e}")))?;

        json["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CirclError::Llm("Anthropic response missing text content".into()))
    }

    fn optional_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.config.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        self.config
            .env_var
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
    }
}

impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let text = with_retry(self.config.max_retries, 500, move || {
            self.generate_once(prompt, system)
        })
        .await?;
        if text.trim().is_empty() {
            return Err(CirclError::Llm("empty completion".into()));
        }
        Ok(text)
    }
}

/// Resolve an API key from config, a custom env var, or a default env var.
fn resolve_api_key(config: &LlmConfig, default_env_var: &str) -> Result<String> {
    if let Some(ref key) = config.api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    let env_var_name = config.env_var.as_deref().unwrap_or(default_env_var);

    std::env::var(env_var_name).map_err(|_| {
        CirclError::Config(format!(
            "{} LLM provider requires an API key (set llm.api_key or {})",
            config.provider, env_var_name
        ))
    })
}

/// Strip a surrounding markdown code fence (```json ... ```) if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
