//! AI adapter: the language-model collaborator used by the enhanced stages.
//!
//! Layers:
//! - `Collaborator`: what the pipeline sees (one fallible `complete` call).
//! - `Provider`: a concrete backend (OpenAI, mock).
//! - `CachingClient<P>`: wraps a provider with a file cache and a daily call limit.
//!
//! Having no collaborator at all is a valid setup (pattern-only analysis);
//! `build_collaborator` returns `None` in that case.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::ai::AiConfig;

pub const ENV_AI_TEST_MODE: &str = "AI_TEST_MODE";
pub const MOCK_RESPONSE: &str = "모의 분석 결과 (mock)";

/// Completion budget for `Collaborator::complete`.
pub const DEFAULT_MAX_TOKENS: u32 = 400;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// External language model, as seen by the pipeline stages.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Complete a prompt. Errors are recovered by the calling stage.
    async fn complete(&self, prompt: &str) -> Result<String>;
    /// Complete with an explicit completion budget. Backends without one
    /// ignore it.
    async fn complete_limited(&self, prompt: &str, _max_tokens: u32) -> Result<String> {
        self.complete(prompt).await
    }
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynCollaborator = Arc<dyn Collaborator>;

/// Factory: build a collaborator according to config and environment.
///
/// * `AI_TEST_MODE=mock` returns a deterministic mock (no cache, no network).
/// * No config, a disabled config, or an unsupported provider returns `None`.
/// * Otherwise builds the OpenAI provider wrapped with caching + daily limit.
pub fn build_collaborator(config: Option<&AiConfig>) -> Option<DynCollaborator> {
    if std::env::var(ENV_AI_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        let mock = MockProvider::new(MOCK_RESPONSE);
        let limit = config.map(|c| c.daily_limit).unwrap_or(u32::MAX);
        return Some(Arc::new(CachingClient::uncached(mock, limit)));
    }

    let config = config?;
    if !config.is_usable() {
        tracing::info!(
            provider = %config.provider,
            enabled = config.enabled,
            "AI collaborator not usable; pattern-only analysis"
        );
        return None;
    }

    let provider = match OpenAiProvider::new(&config.api_key, &config.model) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = ?e, "OpenAI provider init failed; pattern-only analysis");
            return None;
        }
    };
    let client = match &config.cache_dir {
        Some(dir) => CachingClient::new(provider, dir.clone(), config.daily_limit),
        None => CachingClient::uncached(provider, config.daily_limit),
    };
    Some(Arc::new(client))
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level backend that does the real call. Separated so the same caching
/// wrapper serves production and tests.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    async fn fetch(&self, prompt: &str, max_tokens: u32) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// OpenAI Chat Completions provider.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("empty OpenAI API key");
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("scam-risk-analyzer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            temperature: 0.3,
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn fetch(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai request")?
            .error_for_status()
            .context("openai non-2xx")?;

        let body: Resp = resp.json().await.context("openai response body")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            bail!("openai returned empty content");
        }
        Ok(content.to_string())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Fixed-response provider for tests and local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl MockProvider {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn fetch(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
        Ok(self.fixed.clone())
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Caching client wrapper (file cache + daily limit)
// ------------------------------------------------------------

/// Counter state is guarded by a `Mutex`; concurrent runs share one client.
pub struct CachingClient<P: Provider> {
    inner: P,
    cache_dir: Option<PathBuf>,
    daily_limit_max: u32,
    counter: Arc<Mutex<DailyCounter>>,
}

impl<P: Provider> CachingClient<P> {
    pub fn new(inner: P, cache_dir: PathBuf, daily_limit_max: u32) -> Self {
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            tracing::warn!(error = ?e, dir = %cache_dir.display(), "AI cache dir unavailable");
        }
        let counter = load_daily_counter(&cache_dir).unwrap_or_default();
        Self {
            inner,
            cache_dir: Some(cache_dir),
            daily_limit_max,
            counter: Arc::new(Mutex::new(counter)),
        }
    }

    /// Daily limit only; nothing touches the filesystem.
    pub fn uncached(inner: P, daily_limit_max: u32) -> Self {
        Self {
            inner,
            cache_dir: None,
            daily_limit_max,
            counter: Arc::new(Mutex::new(DailyCounter::default())),
        }
    }

    /// Real calls made today.
    pub fn calls_today(&self) -> u32 {
        self.counter.lock().map(|g| g.count).unwrap_or(0)
    }

    async fn complete_impl(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        // 1) Cache lookup; hits never count against the limit.
        let key = cache_key(self.inner.name(), max_tokens, prompt);
        if let Some(dir) = &self.cache_dir {
            if let Some(hit) = read_cache_file(dir, &key) {
                tracing::debug!(provider = self.inner.name(), %key, "AI cache hit");
                return Ok(hit.response);
            }
        }

        // 2) Daily limit (reset on UTC day rollover). The slot is reserved
        //    before the call.
        let reserved_on = {
            let mut g = self
                .counter
                .lock()
                .map_err(|_| anyhow!("daily counter lock poisoned"))?;
            if g.is_expired() {
                g.reset_to_today();
            }
            if g.count >= self.daily_limit_max {
                bail!("daily limit reached ({} calls)", self.daily_limit_max);
            }
            g.count += 1;
            self.persist_counter(&g);
            g.date.clone()
        };

        // 3) Real call; a failed call gives its slot back.
        let fresh = match self.inner.fetch(prompt, max_tokens).await {
            Ok(out) => out,
            Err(e) => {
                self.release_slot(&reserved_on);
                return Err(e);
            }
        };

        if let Some(dir) = &self.cache_dir {
            let entry = CacheEntry {
                response: fresh.clone(),
            };
            if let Err(e) = write_cache_file(dir, &key, &entry) {
                tracing::warn!(error = ?e, "AI cache write failed");
            }
        }
        Ok(fresh)
    }

    fn release_slot(&self, reserved_on: &str) {
        if let Ok(mut g) = self.counter.lock() {
            // a day rollover already reset the count
            if g.date == reserved_on {
                g.count = g.count.saturating_sub(1);
                self.persist_counter(&g);
            }
        }
    }

    fn persist_counter(&self, dc: &DailyCounter) {
        if let Some(dir) = &self.cache_dir {
            if let Err(e) = save_daily_counter(dir, dc) {
                tracing::warn!(error = ?e, "AI daily counter write failed");
            }
        }
    }
}

#[async_trait]
impl<P: Provider> Collaborator for CachingClient<P> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.complete_impl(prompt, DEFAULT_MAX_TOKENS).await
    }
    async fn complete_limited(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.complete_impl(prompt, max_tokens).await
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    response: String,
}

fn cache_key(provider: &str, max_tokens: u32, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(provider.as_bytes());
    hasher.update([0u8]);
    hasher.update(max_tokens.to_le_bytes());
    hasher.update(prompt.as_bytes());
    hasher
        .finalize()
        .iter()
        .take(16)
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<CacheEntry> {
    let s = fs::read_to_string(cache_path(dir, key)).ok()?;
    serde_json::from_str(&s).ok()
}

fn write_cache_file(dir: &Path, key: &str, value: &CacheEntry) -> io::Result<()> {
    let path = cache_path(dir, key);
    write_atomic(&path, &serde_json::to_string(value)?)
}

/// Write via a per-writer `.tmp` sibling and rename.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

/// `<name>.<pid>.<seq>.tmp`, unique within and across processes.
fn tmp_path(path: &Path) -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{seq}.tmp", std::process::id()));
    path.with_file_name(name)
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    write_atomic(&counter_path(dir), &serde_json::to_string(dc)?)
}
