//! Image search requests, result normalisation and stale-response filtering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendResult;
use crate::selection::ImageMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    #[default]
    Pexels,
    Unsplash,
}

impl ImageSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pexels => "pexels",
            Self::Unsplash => "unsplash",
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown image source: {0}")]
pub struct ParseSourceError(String);

impl FromStr for ImageSource {
    type Err = ParseSourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pexels" => Ok(Self::Pexels),
            "unsplash" => Ok(Self::Unsplash),
            _ => Err(ParseSourceError(value.to_string())),
        }
    }
}

/// Minimum-size constraints; `None` means unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeFilter {
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: String,
    pub translated_keywords: String,
    pub source: ImageSource,
    pub filter: SizeFilter,
}

impl SearchQuery {
    /// Query-string pairs; absent filters are sent as empty values.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let optional = |value: Option<u32>| value.map(|v| v.to_string()).unwrap_or_default();
        vec![
            ("keywords", self.keywords.clone()),
            ("translated_keywords", self.translated_keywords.clone()),
            ("source", self.source.as_str().to_string()),
            ("min_width", optional(self.filter.min_width)),
            ("min_height", optional(self.filter.min_height)),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchReply {
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Index-aligned with `image_urls`; entries may be missing or null.
    #[serde(default)]
    pub image_sizes: Option<Vec<Option<[u32; 2]>>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    pub url: String,
    pub size: Option<(u32, u32)>,
    /// Replacement shown after a server-side resize.
    pub resized_url: Option<String>,
}

impl ImageResult {
    pub fn display_url(&self) -> &str {
        self.resized_url.as_deref().unwrap_or(&self.url)
    }

    pub fn metadata(&self) -> ImageMetadata {
        let (width, height) = self.size.unwrap_or((0, 0));
        ImageMetadata { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Results(Vec<ImageResult>),
    /// A valid search that matched nothing.
    Empty,
    Failed(String),
}

pub fn normalize(reply: BackendResult<SearchReply>) -> SearchOutcome {
    let reply = match reply {
        Ok(reply) => reply,
        Err(err) => return SearchOutcome::Failed(err.message().to_string()),
    };
    if let Some(message) = reply.error {
        return SearchOutcome::Failed(message);
    }
    if reply.image_urls.is_empty() {
        return SearchOutcome::Empty;
    }

    let sizes = reply.image_sizes.unwrap_or_default();
    let results = reply
        .image_urls
        .into_iter()
        .enumerate()
        .map(|(index, url)| ImageResult {
            url,
            size: sizes.get(index).copied().flatten().map(|[w, h]| (w, h)),
            resized_url: None,
        })
        .collect();
    SearchOutcome::Results(results)
}

/// What the result grid currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResultGrid {
    #[default]
    Idle,
    Loading,
    Results(Vec<ImageResult>),
    Empty,
    Failed(String),
}

impl ResultGrid {
    pub fn results(&self) -> &[ImageResult] {
        match self {
            Self::Results(results) => results,
            _ => &[],
        }
    }

    pub fn find(&self, url: &str) -> Option<&ImageResult> {
        self.results().iter().find(|result| result.url == url)
    }

    pub fn find_mut(&mut self, url: &str) -> Option<&mut ImageResult> {
        match self {
            Self::Results(results) => results.iter_mut().find(|result| result.url == url),
            _ => None,
        }
    }
}

impl From<SearchOutcome> for ResultGrid {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Results(results) => Self::Results(results),
            SearchOutcome::Empty => Self::Empty,
            SearchOutcome::Failed(message) => Self::Failed(message),
        }
    }
}

/// One keyword evaluation, from debounce firing to its search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchTicket {
    gate: u64,
    seq: u64,
}

/// Hands out increasing tickets so only the newest search may render.
///
/// A search is current when it is the latest issued and belongs to the
/// latest keyword evaluation.
#[derive(Debug, Default)]
pub struct SearchTracker {
    gate: u64,
    latest: u64,
}

impl SearchTracker {
    /// Starts a keyword evaluation; searches of earlier ones stop rendering.
    pub fn begin_gate(&mut self) -> GateTicket {
        self.gate += 1;
        GateTicket(self.gate)
    }

    pub fn is_current_gate(&self, gate: GateTicket) -> bool {
        gate.0 == self.gate
    }

    pub fn issue(&mut self) -> SearchTicket {
        self.latest += 1;
        SearchTicket {
            gate: self.gate,
            seq: self.latest,
        }
    }

    /// Ticket for a search owed to a superseded evaluation. It never
    /// becomes current and does not displace the live one.
    pub fn superseded(&self, gate: GateTicket) -> SearchTicket {
        SearchTicket {
            gate: gate.0,
            seq: self.latest,
        }
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        ticket.gate == self.gate && ticket.seq == self.latest
    }
}
