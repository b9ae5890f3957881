use crate::notice::{Notice, NoticeLevel};
use crate::preview::PostPreview;
use crate::resize::ResizeDialog;
use crate::search::{ResultGrid, SearchTracker, SizeFilter};
use crate::selection::SelectionSet;
use crate::submission::FormFields;
use crate::translation::{SearchState, TranslationStatus};

/// Everything the front end can observe. Only the controller mutates it.
#[derive(Debug, Default)]
pub struct AppState {
    pub(super) form: FormFields,
    pub(super) filter: SizeFilter,
    pub(super) selection: SelectionSet,
    pub(super) translation_enabled: bool,
    pub(super) translation_status: TranslationStatus,
    pub(super) search: Option<SearchState>,
    pub(super) tracker: SearchTracker,
    pub(super) results: ResultGrid,
    pub(super) resize: ResizeDialog,
    pub(super) preview: PostPreview,
    pub(super) submitting: bool,
    pub(super) notices: Vec<Notice>,
    pub(super) revision: u64,
}

impl AppState {
    pub fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn filter(&self) -> SizeFilter {
        self.filter
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn translation_enabled(&self) -> bool {
        self.translation_enabled
    }

    pub fn translation_status(&self) -> &TranslationStatus {
        &self.translation_status
    }

    /// Last resolved keyword pair, reused when only filters change.
    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    pub fn results(&self) -> &ResultGrid {
        &self.results
    }

    pub fn resize(&self) -> &ResizeDialog {
        &self.resize
    }

    pub fn preview(&self) -> &PostPreview {
        &self.preview
    }

    pub fn submitting(&self) -> bool {
        self.submitting
    }

    pub fn pending_notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Bumped after every handled event or completion.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(super) fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice::new(level, message);
        tracing::debug!(%notice, "notice queued");
        self.notices.push(notice);
    }

    pub(super) fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
