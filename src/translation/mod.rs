//! Decides whether keywords go through the translation service and folds
//! every possible reply into one of four outcomes.
//!
//! The gate never blocks a search: every resolution carries an effective
//! keyword string, falling back to the raw input on any failure.

use serde::Deserialize;

use crate::backend::{BackendError, BackendResult};

/// Wire shape of the translation service. Exactly one field is expected to
/// be meaningful per reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TranslationReply {
    #[serde(default)]
    pub translated: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub translation_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Disabled,
    /// The keywords were already in the target language.
    Unnecessary,
    Translated(String),
    Failed(String),
}

impl TranslationOutcome {
    pub fn label(&self) -> String {
        match self {
            Self::Disabled => "translation off, using original keywords".to_string(),
            Self::Unnecessary => "already in English".to_string(),
            Self::Translated(text) => text.clone(),
            Self::Failed(_) => "translation failed, using original keywords".to_string(),
        }
    }
}

/// Result of one gate evaluation; the pair handed to image search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub raw_keywords: String,
    pub effective_keywords: String,
    pub outcome: TranslationOutcome,
}

impl SearchState {
    fn untranslated(raw: &str, outcome: TranslationOutcome) -> Self {
        Self {
            raw_keywords: raw.to_string(),
            effective_keywords: raw.to_string(),
            outcome,
        }
    }

    /// The tags field is filled from the raw keywords only after a real
    /// translation, and only while it is still empty.
    pub fn should_autofill_tags(&self, current_tags: &str) -> bool {
        matches!(self.outcome, TranslationOutcome::Translated(_)) && current_tags.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateStart {
    /// Blank input: clear the label, no network call, no search.
    Cleared,
    Resolved(SearchState),
    Translate { raw: String },
}

/// Label state shown next to the keyword field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TranslationStatus {
    #[default]
    Idle,
    InFlight,
    Settled(TranslationOutcome),
}

impl TranslationStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::InFlight => "translating...".to_string(),
            Self::Settled(outcome) => outcome.label(),
        }
    }
}

pub fn begin(raw: &str, translation_enabled: bool) -> GateStart {
    if raw.trim().is_empty() {
        return GateStart::Cleared;
    }
    if !translation_enabled {
        return GateStart::Resolved(SearchState::untranslated(raw, TranslationOutcome::Disabled));
    }
    GateStart::Translate {
        raw: raw.to_string(),
    }
}

pub fn resolve(raw: &str, reply: BackendResult<TranslationReply>) -> SearchState {
    let reply = match reply {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(raw, %err, "translation request failed; using original keywords");
            return SearchState::untranslated(raw, TranslationOutcome::Failed(failure_reason(&err)));
        }
    };

    if reply.translation_disabled {
        return SearchState::untranslated(raw, TranslationOutcome::Disabled);
    }
    if let Some(reason) = reply.error {
        tracing::warn!(raw, %reason, "translation service reported an error");
        return SearchState::untranslated(raw, TranslationOutcome::Failed(reason));
    }

    match reply.translated.filter(|text| !text.trim().is_empty()) {
        Some(text) if text != raw => SearchState {
            raw_keywords: raw.to_string(),
            effective_keywords: text.clone(),
            outcome: TranslationOutcome::Translated(text),
        },
        _ => SearchState::untranslated(raw, TranslationOutcome::Unnecessary),
    }
}

fn failure_reason(err: &BackendError) -> String {
    if err.is_transport() {
        format!("translation service unreachable: {}", err.message())
    } else {
        err.message().to_string()
    }
}
