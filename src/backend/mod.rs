//! Seams to the external HTTP collaborators.
//!
//! Each collaborator gets its own trait so the controller can be exercised
//! with fakes; [`HttpBackend`] implements all of them for production.

mod http;

use crate::resize::{ResizeReply, ResizeRequest};
use crate::search::{SearchQuery, SearchReply};
use crate::submission::{PublishReply, SubmissionPayload};
use crate::template::Template;
use crate::translation::TranslationReply;
use thiserror::Error;

pub use http::HttpBackend;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("{endpoint} unreachable: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },
    #[error("{endpoint} returned an error: {message}")]
    Service {
        endpoint: &'static str,
        message: String,
    },
    #[error("{endpoint} sent an unreadable response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
}

impl BackendError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Message without the endpoint prefix, for user-facing notices.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. }
            | Self::Service { message, .. }
            | Self::Decode { message, .. } => message,
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

pub trait TranslationService {
    fn translate(&self, keywords: &str) -> BackendResult<TranslationReply>;
}

pub trait ImageSearchService {
    fn search(&self, query: &SearchQuery) -> BackendResult<SearchReply>;
}

pub trait ResizeService {
    fn resize(&self, request: &ResizeRequest) -> BackendResult<ResizeReply>;
}

pub trait TemplateStore {
    fn save_template(&self, template: &Template) -> BackendResult<()>;
}

pub trait PublishingBackend {
    fn publish(&self, payload: &SubmissionPayload) -> BackendResult<PublishReply>;
}

pub trait TranslationToggle {
    fn translation_enabled(&self) -> BackendResult<bool>;
    /// Returns the state confirmed by the server.
    fn set_translation_enabled(&self, enabled: bool) -> BackendResult<bool>;
}

/// Everything the controller talks to, shareable with worker threads.
pub trait Services:
    TranslationService
    + ImageSearchService
    + ResizeService
    + TemplateStore
    + PublishingBackend
    + TranslationToggle
    + Send
    + Sync
    + 'static
{
}

impl<T> Services for T where
    T: TranslationService
        + ImageSearchService
        + ResizeService
        + TemplateStore
        + PublishingBackend
        + TranslationToggle
        + Send
        + Sync
        + 'static
{
}
