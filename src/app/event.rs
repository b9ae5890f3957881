use crate::backend::BackendResult;
use crate::resize::ResizeReply;
use crate::search::{GateTicket, ImageSource, SearchQuery, SearchReply, SearchTicket};
use crate::selection::AlignmentKind;
use crate::submission::PublishReply;
use crate::translation::TranslationReply;

/// Discrete user input delivered to [`super::App::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    KeywordsChanged(String),
    SourceChanged(ImageSource),
    MinWidthChanged(Option<u32>),
    MinHeightChanged(Option<u32>),
    ToggleImage(String),
    RemoveImage(String),
    SetImageAlignment {
        url: String,
        alignment: AlignmentKind,
    },
    TitleChanged(String),
    ContentChanged(String),
    TagsChanged(String),
    TemplateChosen(String),
    PublishDateChanged(Option<String>),
    FeaturedAlignmentChanged(AlignmentKind),
    ContentAlignmentChanged(AlignmentKind),
    AlternatingChanged(bool),
    TranslationToggleRequested(bool),
    OpenResize(String),
    ResizeSizeChanged {
        width: u32,
        height: u32,
    },
    ResizeAspectChanged(bool),
    ConfirmResize,
    CloseResize,
    SaveTemplate {
        name: String,
        content: String,
    },
    Submit,
}

/// Result of a finished background job.
#[derive(Debug)]
pub enum Completion {
    Translation {
        gate: GateTicket,
        raw: String,
        result: BackendResult<TranslationReply>,
    },
    Search {
        ticket: SearchTicket,
        query: SearchQuery,
        result: BackendResult<SearchReply>,
    },
    Resize {
        url: String,
        result: BackendResult<ResizeReply>,
    },
    TemplateSaved {
        name: String,
        result: BackendResult<()>,
    },
    Published {
        result: BackendResult<PublishReply>,
    },
    TranslationSetting {
        requested: Option<bool>,
        result: BackendResult<bool>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum DebounceKey {
    Keywords,
    MinWidth,
    MinHeight,
    Preview,
}

impl DebounceKey {
    pub(super) const ALL: [Self; 4] = [
        Self::Keywords,
        Self::MinWidth,
        Self::MinHeight,
        Self::Preview,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DeferredAction {
    TranslateKeywords(String),
    RerunSearch,
    RefreshPreview,
}
