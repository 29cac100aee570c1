//! Optional one-line advisor commentary for the winning card.
//!
//! The text is cosmetic. Generators receive plain scalars copied out of a finished
//! ranking and their output is attached to the report as-is; nothing they return can
//! change a number.

use crate::format::format_inr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, PoisonError};

/// Inputs handed to an advisory generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub income: Decimal,
    pub monthly_spend: Decimal,
    pub card_name: String,
    pub net_savings: Decimal,
}

impl AdvisoryRequest {
    pub fn prompt(&self) -> String {
        format!(
            "User spend: {}/month. Salary: {}.\n\
             Best card: {} (saves {}/yr).\n\
             Role: witty financial advisor.\n\
             Task: write ONE punchy sentence reacting to this recommendation.\n\
             Output: a single sentence under 20 words.",
            format_inr(self.monthly_spend),
            format_inr(self.income),
            self.card_name,
            format_inr(self.net_savings),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("advisory generation is disabled")]
    Disabled,
    #[error("advisory request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("advisory response contained no text")]
    EmptyResponse,
    #[error("advisory generation timed out")]
    Timeout,
}

/// Port for the external text generator.
pub trait AdvisoryGenerator: Send + Sync {
    fn advise(
        &self,
        request: &AdvisoryRequest,
    ) -> impl Future<Output = Result<String, AdvisoryError>> + Send;
}

/// Generator used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAdvisor;

impl AdvisoryGenerator for DisabledAdvisor {
    async fn advise(&self, _request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::Disabled)
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiAdvisor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiAdvisor {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash-lite";
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: ResponseContent,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .filter_map(|part| part.text)
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
    }
}

impl AdvisoryGenerator for GeminiAdvisor {
    async fn advise(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        let prompt = request.prompt();
        let body = GenerateContentRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: &prompt }],
            }],
        };

        let response: GenerateContentResponse = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.first_text().ok_or(AdvisoryError::EmptyResponse)
    }
}

/// Memoizes successful responses so repeated identical requests skip the network.
///
/// Holds at most `capacity` entries; the oldest insertion is evicted first.
pub struct CachedAdvisor<A> {
    inner: A,
    capacity: usize,
    cache: Mutex<AdviceCache>,
}

#[derive(Default)]
struct AdviceCache {
    entries: HashMap<AdvisoryRequest, String>,
    order: VecDeque<AdvisoryRequest>,
}

impl AdviceCache {
    fn insert(&mut self, request: AdvisoryRequest, text: String, capacity: usize) {
        if capacity == 0 {
            return;
        }
        if self.entries.insert(request.clone(), text).is_none() {
            self.order.push_back(request);
        }
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

impl<A> CachedAdvisor<A> {
    pub const DEFAULT_CAPACITY: usize = 512;

    pub fn new(inner: A) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: A, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            cache: Mutex::new(AdviceCache::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, request: &AdvisoryRequest) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(request)
            .cloned()
    }
}

impl<A: AdvisoryGenerator> AdvisoryGenerator for CachedAdvisor<A> {
    async fn advise(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryError> {
        if let Some(hit) = self.lookup(request) {
            return Ok(hit);
        }

        let text = self.inner.advise(request).await?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request.clone(), text.clone(), self.capacity);
        Ok(text)
    }
}
