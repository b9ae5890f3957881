//! Controller tying user input, debounced actions and background jobs to
//! the observable [`AppState`].
//!
//! Everything runs on the caller's thread: [`App::handle`] reacts to input,
//! [`App::tick`] fires due debounced actions and applies finished jobs. Each
//! call runs to completion, so no handler ever sees a half-updated state.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::backend::{BackendResult, Services};
use crate::config::{AppConfig, DebounceTimings};
use crate::debounce::DebounceScheduler;
use crate::notice::{Notice, NoticeLevel};
use crate::preview::PostPreview;
use crate::resize::{self, ResizeOutcome, ResizeReply};
use crate::search::{
    self, GateTicket, ImageResult, ResultGrid, SearchOutcome, SearchQuery, SearchReply,
    SearchTicket,
};
use crate::submission::{self, PublishReply};
use crate::template;
use crate::translation::{self, GateStart, SearchState, TranslationReply, TranslationStatus};

mod event;
mod state;
mod worker;

pub use event::{Completion, UiEvent};
pub use state::AppState;
pub use worker::{Job, JobRunner, ThreadJobRunner};

#[cfg(test)]
pub(crate) use worker::ManualJobRunner;

use self::event::{DebounceKey, DeferredAction};

pub struct App<S: Services, R: JobRunner> {
    timings: DebounceTimings,
    services: Arc<S>,
    runner: R,
    completions_tx: Sender<Completion>,
    completions_rx: Receiver<Completion>,
    scheduler: DebounceScheduler<DebounceKey, DeferredAction>,
    in_flight: usize,
    state: AppState,
}

impl<S: Services, R: JobRunner> App<S, R> {
    pub fn new(config: &AppConfig, services: Arc<S>, runner: R) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel();
        let mut state = AppState {
            translation_enabled: config.translation_enabled,
            ..AppState::default()
        };
        state.form.source = config.default_source;

        Self {
            timings: config.timings(),
            services,
            runner,
            completions_tx,
            completions_rx,
            scheduler: DebounceScheduler::new(),
            in_flight: 0,
            state,
        }
    }

    /// Asks the server for the authoritative translation setting.
    pub fn start(&mut self) {
        let services = Arc::clone(&self.services);
        self.spawn("translation-status", move || Completion::TranslationSetting {
            requested: None,
            result: services.translation_enabled(),
        });
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.state.notices)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// No debounced action pending and no background job outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.scheduler.next_deadline().is_none()
    }

    pub fn handle(&mut self, event: UiEvent, now: Instant) {
        tracing::debug!(?event, "handle ui event");
        match event {
            UiEvent::KeywordsChanged(keywords) => {
                self.state.form.keywords = keywords.clone();
                self.scheduler.schedule(
                    DebounceKey::Keywords,
                    self.timings.keywords,
                    now,
                    DeferredAction::TranslateKeywords(keywords),
                );
            }
            UiEvent::SourceChanged(source) => {
                self.state.form.source = source;
                self.rerun_search();
            }
            UiEvent::MinWidthChanged(min_width) => {
                self.state.filter.min_width = min_width;
                self.schedule_rerun(DebounceKey::MinWidth, now);
            }
            UiEvent::MinHeightChanged(min_height) => {
                self.state.filter.min_height = min_height;
                self.schedule_rerun(DebounceKey::MinHeight, now);
            }
            UiEvent::ToggleImage(url) => self.toggle_image(&url),
            UiEvent::RemoveImage(url) => {
                if self.state.selection.remove(&url) {
                    self.refresh_preview();
                }
            }
            UiEvent::SetImageAlignment { url, alignment } => {
                if self.state.selection.set_alignment(&url, alignment) {
                    self.refresh_preview();
                }
            }
            UiEvent::TitleChanged(title) => {
                self.state.form.title = title;
                self.schedule_preview(now);
            }
            UiEvent::ContentChanged(content) => {
                self.state.form.content = content;
                self.schedule_preview(now);
            }
            UiEvent::TagsChanged(tags) => {
                self.state.form.tags = tags;
                self.schedule_preview(now);
            }
            UiEvent::TemplateChosen(name) => self.state.form.template = name,
            UiEvent::PublishDateChanged(date) => self.state.form.publish_date = date,
            UiEvent::FeaturedAlignmentChanged(alignment) => {
                self.state.form.layout.set_featured_alignment(alignment);
                self.refresh_preview();
            }
            UiEvent::ContentAlignmentChanged(alignment) => {
                self.state.form.layout.set_content_alignment(alignment);
                self.refresh_preview();
            }
            UiEvent::AlternatingChanged(enabled) => {
                if !self.state.form.layout.set_alternating(enabled) {
                    self.state.notify(
                        NoticeLevel::Warning,
                        "alternating alignment is unavailable while content images sit \
                         below the text",
                    );
                }
                self.refresh_preview();
            }
            UiEvent::TranslationToggleRequested(enabled) => {
                let services = Arc::clone(&self.services);
                self.spawn("translation-toggle", move || Completion::TranslationSetting {
                    requested: Some(enabled),
                    result: services.set_translation_enabled(enabled),
                });
            }
            UiEvent::OpenResize(url) => match self.state.results.find(&url) {
                Some(result) => self.state.resize.open(result),
                None => tracing::warn!(%url, "resize requested for an image not in the results"),
            },
            UiEvent::ResizeSizeChanged { width, height } => {
                self.state.resize.set_size(width, height);
            }
            UiEvent::ResizeAspectChanged(maintain) => {
                self.state.resize.set_maintain_aspect(maintain);
            }
            UiEvent::ConfirmResize => self.confirm_resize(),
            UiEvent::CloseResize => {
                self.state.resize.close();
            }
            UiEvent::SaveTemplate { name, content } => self.save_template(&name, &content),
            UiEvent::Submit => self.submit(),
        }
        self.state.bump();
    }

    /// Fires due debounced actions, then applies every finished job.
    /// Returns how many items were processed.
    pub fn tick(&mut self, now: Instant) -> usize {
        let mut processed = 0;
        for (key, action) in self.scheduler.take_due(now) {
            tracing::debug!(?key, "debounced action fired");
            self.run_deferred(action);
            processed += 1;
        }
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply_completion(completion);
            processed += 1;
        }
        if processed > 0 {
            self.state.bump();
        }
        processed
    }

    /// Returns `false` when the job could not be started.
    fn spawn<F>(&mut self, label: &'static str, job: F) -> bool
    where
        F: FnOnce() -> Completion + Send + 'static,
    {
        tracing::debug!(label, "spawning background job");
        match self
            .runner
            .spawn(label, Box::new(job), self.completions_tx.clone())
        {
            Ok(()) => {
                self.in_flight += 1;
                true
            }
            Err(err) => {
                tracing::error!(label, %err, "failed to start background job");
                self.state
                    .notify(NoticeLevel::Error, format!("could not start {label}: {err}"));
                false
            }
        }
    }

    fn run_deferred(&mut self, action: DeferredAction) {
        match action {
            DeferredAction::TranslateKeywords(raw) => self.evaluate_keywords(raw),
            DeferredAction::RerunSearch => self.rerun_search(),
            DeferredAction::RefreshPreview => self.refresh_preview(),
        }
    }

    fn evaluate_keywords(&mut self, raw: String) {
        let gate = self.state.tracker.begin_gate();
        match translation::begin(&raw, self.state.translation_enabled) {
            GateStart::Cleared => {
                self.state.translation_status = TranslationStatus::Idle;
                self.state.search = None;
                if self.state.results == ResultGrid::Loading {
                    self.state.results = ResultGrid::Idle;
                }
            }
            GateStart::Resolved(search) => self.apply_search_state(search),
            GateStart::Translate { raw } => {
                let services = Arc::clone(&self.services);
                let started = self.spawn("translate", move || {
                    let result = services.translate(&raw);
                    Completion::Translation { gate, raw, result }
                });
                if started {
                    self.state.translation_status = TranslationStatus::InFlight;
                }
            }
        }
    }

    fn apply_search_state(&mut self, search: SearchState) {
        if search.should_autofill_tags(&self.state.form.tags) {
            self.state.form.tags = search.raw_keywords.clone();
            self.refresh_preview();
        }
        self.state.translation_status = TranslationStatus::Settled(search.outcome.clone());
        let query = self.query_for(&search);
        self.state.search = Some(search);
        self.issue_search(query);
    }

    fn query_for(&self, search: &SearchState) -> SearchQuery {
        SearchQuery {
            keywords: search.raw_keywords.clone(),
            translated_keywords: search.effective_keywords.clone(),
            source: self.state.form.source,
            filter: self.state.filter,
        }
    }

    fn rerun_search(&mut self) {
        let Some(search) = self.state.search.as_ref() else {
            tracing::debug!("no resolved keywords yet; nothing to re-run");
            return;
        };
        let query = self.query_for(search);
        self.issue_search(query);
    }

    fn schedule_rerun(&mut self, key: DebounceKey, now: Instant) {
        self.scheduler
            .schedule(key, self.timings.filters, now, DeferredAction::RerunSearch);
    }

    fn issue_search(&mut self, query: SearchQuery) {
        let ticket = self.state.tracker.issue();
        if self.spawn_search(ticket, query) {
            self.state.results = ResultGrid::Loading;
        }
    }

    fn spawn_search(&mut self, ticket: SearchTicket, query: SearchQuery) -> bool {
        tracing::debug!(
            ?ticket,
            keywords = %query.keywords,
            translated = %query.translated_keywords,
            source = %query.source,
            "issuing image search"
        );
        let services = Arc::clone(&self.services);
        self.spawn("search", move || {
            let result = services.search(&query);
            Completion::Search {
                ticket,
                query,
                result,
            }
        })
    }

    fn schedule_preview(&mut self, now: Instant) {
        self.scheduler.schedule(
            DebounceKey::Preview,
            self.timings.preview,
            now,
            DeferredAction::RefreshPreview,
        );
    }

    fn refresh_preview(&mut self) {
        self.state.preview = PostPreview::build(&self.state.form, &self.state.selection);
    }

    fn toggle_image(&mut self, url: &str) {
        let metadata = self
            .state
            .results
            .find(url)
            .map(ImageResult::metadata)
            .unwrap_or_default();
        match self.state.selection.toggle(url, metadata) {
            Ok(_) => self.refresh_preview(),
            Err(err) => self.state.notify(NoticeLevel::Error, err.to_string()),
        }
    }

    fn confirm_resize(&mut self) {
        let request = match self.state.resize.request() {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(err) => {
                self.state.notify(NoticeLevel::Error, err.to_string());
                return;
            }
        };
        self.state.resize.close();
        let services = Arc::clone(&self.services);
        self.spawn("resize", move || {
            let result = services.resize(&request);
            Completion::Resize {
                url: request.image_url,
                result,
            }
        });
    }

    fn save_template(&mut self, name: &str, content: &str) {
        let template = match template::prepare(name, content) {
            Ok(template) => template,
            Err(err) => {
                self.state.notify(NoticeLevel::Error, err.to_string());
                return;
            }
        };
        let services = Arc::clone(&self.services);
        self.spawn("save-template", move || {
            let result = services.save_template(&template);
            Completion::TemplateSaved {
                name: template.name,
                result,
            }
        });
    }

    fn submit(&mut self) {
        if self.state.submitting {
            self.state
                .notify(NoticeLevel::Warning, "a submission is already in progress");
            return;
        }
        if let Err(err) = self.state.form.validate() {
            self.state.notify(NoticeLevel::Error, err.to_string());
            return;
        }
        let payload = match submission::assemble(&self.state.selection, &self.state.form) {
            Ok(payload) => payload,
            Err(err) => {
                self.state.notify(NoticeLevel::Error, err.to_string());
                return;
            }
        };

        tracing::info!(
            images = self.state.selection.count(),
            title = %self.state.form.title,
            "submitting post"
        );
        let services = Arc::clone(&self.services);
        self.state.submitting = self.spawn("publish", move || Completion::Published {
            result: services.publish(&payload),
        });
    }

    fn apply_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Translation { gate, raw, result } => {
                self.on_translation(gate, raw, result)
            }
            Completion::Search {
                ticket,
                query,
                result,
            } => self.on_search(ticket, &query, result),
            Completion::Resize { url, result } => self.on_resize(&url, result),
            Completion::TemplateSaved { name, result } => match result {
                Ok(()) => {
                    tracing::info!(%name, "template saved");
                    self.state
                        .notify(NoticeLevel::Success, format!("template \"{name}\" saved"));
                }
                Err(err) => {
                    self.state.notify(
                        NoticeLevel::Error,
                        format!("saving template \"{name}\" failed: {}", err.message()),
                    );
                }
            },
            Completion::Published { result } => self.on_published(result),
            Completion::TranslationSetting { requested, result } => match result {
                Ok(enabled) => {
                    tracing::info!(enabled, "translation setting confirmed");
                    self.state.translation_enabled = enabled;
                }
                Err(err) => {
                    tracing::warn!(?requested, %err, "translation setting unavailable");
                    if requested.is_some() {
                        self.state.notify(
                            NoticeLevel::Warning,
                            format!("could not change translation setting: {}", err.message()),
                        );
                    }
                }
            },
        }
    }

    fn on_translation(
        &mut self,
        gate: GateTicket,
        raw: String,
        result: BackendResult<TranslationReply>,
    ) {
        if !self.state.tracker.is_current_gate(gate) {
            // newer keywords own the label, tags and grid; the owed search
            // still runs but can never render
            tracing::debug!(?gate, %raw, "translation superseded by newer keywords");
            let search = translation::resolve(&raw, result);
            let query = self.query_for(&search);
            let ticket = self.state.tracker.superseded(gate);
            self.spawn_search(ticket, query);
            return;
        }
        if matches!(&result, Err(err) if err.is_transport()) {
            self.state.notify(
                NoticeLevel::Warning,
                "translation service unreachable, searching with the original keywords",
            );
        }
        let search = translation::resolve(&raw, result);
        self.apply_search_state(search);
    }

    fn on_search(
        &mut self,
        ticket: SearchTicket,
        query: &SearchQuery,
        result: BackendResult<SearchReply>,
    ) {
        if !self.state.tracker.is_current(ticket) {
            tracing::debug!(?ticket, keywords = %query.keywords, "dropping stale search response");
            return;
        }
        let outcome = search::normalize(result);
        match &outcome {
            SearchOutcome::Results(results) => {
                tracing::debug!(count = results.len(), "search results applied");
            }
            SearchOutcome::Empty => {
                self.state
                    .notify(NoticeLevel::Info, "no images matched the current criteria");
            }
            SearchOutcome::Failed(message) => {
                self.state
                    .notify(NoticeLevel::Error, format!("image search failed: {message}"));
            }
        }
        self.state.results = ResultGrid::from(outcome);
    }

    fn on_resize(&mut self, url: &str, result: BackendResult<ResizeReply>) {
        match resize::interpret(result) {
            ResizeOutcome::Resized {
                resized_url,
                new_size,
            } => {
                if let Some(image) = self.state.results.find_mut(url) {
                    image.resized_url = Some(resize::cache_busted(&resized_url, now_millis()));
                    if new_size.is_some() {
                        image.size = new_size;
                    }
                }
                self.state.notify(NoticeLevel::Success, "image resized");
            }
            ResizeOutcome::Rejected(message) => {
                self.state
                    .notify(NoticeLevel::Error, format!("resize failed: {message}"));
            }
        }
    }

    fn on_published(&mut self, result: BackendResult<PublishReply>) {
        self.state.submitting = false;
        match result {
            Ok(reply) if reply.is_success() => {
                tracing::info!("post published");
                let message = reply.message.unwrap_or_else(|| "post published".to_string());
                self.state.notify(NoticeLevel::Success, message);
                self.reset_after_publish();
            }
            Ok(reply) => {
                let message = reply.message.unwrap_or(reply.status);
                tracing::warn!(reason = %message, "publishing rejected");
                self.state
                    .notify(NoticeLevel::Error, format!("publishing failed: {message}"));
            }
            Err(err) => {
                tracing::warn!(%err, "publishing failed");
                self.state.notify(
                    NoticeLevel::Error,
                    format!("publishing failed: {}", err.message()),
                );
            }
        }
    }

    fn reset_after_publish(&mut self) {
        for key in DebounceKey::ALL {
            self.scheduler.cancel(key);
        }
        let source = self.state.form.source;
        self.state.form = Default::default();
        self.state.form.source = source;
        self.state.filter = Default::default();
        self.state.selection.clear();
        self.state.search = None;
        self.state.translation_status = TranslationStatus::Idle;
        self.state.results = ResultGrid::Idle;
        self.state.resize.close();
        self.refresh_preview();
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::backend::{
        BackendError, ImageSearchService, PublishingBackend, ResizeService, TemplateStore,
        TranslationService, TranslationToggle,
    };
    use crate::resize::ResizeRequest;
    use crate::search::ImageSource;
    use crate::selection::AlignmentKind;
    use crate::submission::{field, SubmissionPayload};
    use crate::template::Template;
    use crate::translation::TranslationOutcome;

    struct FakeServices {
        translation: Mutex<BackendResult<TranslationReply>>,
        translate_calls: Mutex<Vec<String>>,
        search_calls: Mutex<Vec<SearchQuery>>,
        search_error: Mutex<Option<String>>,
        results_per_search: Mutex<usize>,
        resize_reply: Mutex<BackendResult<ResizeReply>>,
        resize_calls: Mutex<Vec<ResizeRequest>>,
        saved_templates: Mutex<Vec<Template>>,
        published: Mutex<Vec<SubmissionPayload>>,
        publish_reply: Mutex<BackendResult<PublishReply>>,
        translation_flag: Mutex<bool>,
    }

    impl Default for FakeServices {
        fn default() -> Self {
            Self {
                translation: Mutex::new(Ok(TranslationReply::default())),
                translate_calls: Mutex::default(),
                search_calls: Mutex::default(),
                search_error: Mutex::default(),
                results_per_search: Mutex::new(6),
                resize_reply: Mutex::new(Ok(ResizeReply::default())),
                resize_calls: Mutex::default(),
                saved_templates: Mutex::default(),
                published: Mutex::default(),
                publish_reply: Mutex::new(Ok(PublishReply {
                    status: "success".to_string(),
                    message: Some("Post created".to_string()),
                })),
                translation_flag: Mutex::new(true),
            }
        }
    }

    impl FakeServices {
        fn set_translation(&self, reply: BackendResult<TranslationReply>) {
            *self.translation.lock().expect("lock translation") = reply;
        }

        fn translations(&self) -> Vec<String> {
            self.translate_calls.lock().expect("lock translate calls").clone()
        }

        fn searches(&self) -> Vec<SearchQuery> {
            self.search_calls.lock().expect("lock search calls").clone()
        }

        fn published(&self) -> Vec<SubmissionPayload> {
            self.published.lock().expect("lock published").clone()
        }
    }

    impl TranslationService for FakeServices {
        fn translate(&self, keywords: &str) -> BackendResult<TranslationReply> {
            self.translate_calls
                .lock()
                .expect("lock translate calls")
                .push(keywords.to_string());
            self.translation.lock().expect("lock translation").clone()
        }
    }

    impl ImageSearchService for FakeServices {
        fn search(&self, query: &SearchQuery) -> BackendResult<SearchReply> {
            self.search_calls
                .lock()
                .expect("lock search calls")
                .push(query.clone());
            if let Some(message) = self.search_error.lock().expect("lock search error").clone() {
                return Ok(SearchReply {
                    error: Some(message),
                    ..SearchReply::default()
                });
            }
            let count = *self.results_per_search.lock().expect("lock result count");
            let image_urls = (0..count)
                .map(|i| format!("https://img.test/{}/{i}.jpg", query.translated_keywords))
                .collect();
            let sizes = (0..count as u32).map(|i| Some([800 + i * 100, 600])).collect();
            Ok(SearchReply {
                image_urls,
                image_sizes: Some(sizes),
                error: None,
            })
        }
    }

    impl ResizeService for FakeServices {
        fn resize(&self, request: &ResizeRequest) -> BackendResult<ResizeReply> {
            self.resize_calls
                .lock()
                .expect("lock resize calls")
                .push(request.clone());
            self.resize_reply.lock().expect("lock resize reply").clone()
        }
    }

    impl TemplateStore for FakeServices {
        fn save_template(&self, template: &Template) -> BackendResult<()> {
            self.saved_templates
                .lock()
                .expect("lock templates")
                .push(template.clone());
            Ok(())
        }
    }

    impl PublishingBackend for FakeServices {
        fn publish(&self, payload: &SubmissionPayload) -> BackendResult<PublishReply> {
            self.published
                .lock()
                .expect("lock published")
                .push(payload.clone());
            self.publish_reply.lock().expect("lock publish reply").clone()
        }
    }

    impl TranslationToggle for FakeServices {
        fn translation_enabled(&self) -> BackendResult<bool> {
            Ok(*self.translation_flag.lock().expect("lock flag"))
        }

        fn set_translation_enabled(&self, enabled: bool) -> BackendResult<bool> {
            *self.translation_flag.lock().expect("lock flag") = enabled;
            Ok(enabled)
        }
    }

    struct Harness {
        app: App<FakeServices, ManualJobRunner>,
        services: Arc<FakeServices>,
        runner: ManualJobRunner,
        now: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(AppConfig::default())
        }

        fn with_config(config: AppConfig) -> Self {
            let services = Arc::new(FakeServices::default());
            let runner = ManualJobRunner::default();
            let app = App::new(&config, Arc::clone(&services), runner.clone());
            Self {
                app,
                services,
                runner,
                now: Instant::now(),
            }
        }

        fn send(&mut self, event: UiEvent) {
            self.app.handle(event, self.now);
        }

        fn advance(&mut self, millis: u64) {
            self.now += Duration::from_millis(millis);
            self.app.tick(self.now);
        }

        /// Runs every queued job, including ones spawned by completions.
        fn settle(&mut self) {
            loop {
                self.runner.run_all();
                if self.app.tick(self.now) == 0 && self.runner.pending().is_empty() {
                    break;
                }
            }
        }

        fn search(&mut self, keywords: &str) {
            self.send(UiEvent::KeywordsChanged(keywords.to_string()));
            self.advance(500);
            self.settle();
        }

        fn result_url(&self, index: usize) -> String {
            self.app.state().results().results()[index].url.clone()
        }

        fn selected_urls(&self) -> Vec<String> {
            self.app
                .state()
                .selection()
                .images()
                .iter()
                .map(|image| image.url.clone())
                .collect()
        }

        fn notices(&mut self, level: NoticeLevel) -> Vec<String> {
            self.app
                .take_notices()
                .into_iter()
                .filter(|notice| notice.level == level)
                .map(|notice| notice.message)
                .collect()
        }
    }

    fn translated(text: &str) -> BackendResult<TranslationReply> {
        Ok(TranslationReply {
            translated: Some(text.to_string()),
            ..TranslationReply::default()
        })
    }

    #[test]
    fn keyword_burst_translates_and_searches_once_with_last_value() {
        let mut harness = Harness::new();
        harness.send(UiEvent::KeywordsChanged("k".to_string()));
        harness.advance(200);
        harness.send(UiEvent::KeywordsChanged("ke".to_string()));
        harness.advance(200);
        harness.send(UiEvent::KeywordsChanged("kedi".to_string()));
        harness.advance(499);
        assert!(harness.runner.pending().is_empty());

        harness.advance(1);
        assert_eq!(harness.runner.pending(), vec!["translate"]);
        assert_eq!(
            harness.app.state().translation_status(),
            &TranslationStatus::InFlight
        );
        harness.settle();

        assert_eq!(harness.services.translations(), vec!["kedi"]);
        assert_eq!(harness.services.searches().len(), 1);
    }

    #[test]
    fn translated_keywords_drive_search_and_fill_empty_tags() {
        let mut harness = Harness::new();
        harness.services.set_translation(translated("cat"));

        harness.search("kedi");

        let searches = harness.services.searches();
        let query = &searches[0];
        assert_eq!(query.keywords, "kedi");
        assert_eq!(query.translated_keywords, "cat");
        assert_eq!(query.source, ImageSource::Pexels);
        let state = harness.app.state();
        assert_eq!(state.form().tags, "kedi");
        assert_eq!(
            state.translation_status(),
            &TranslationStatus::Settled(TranslationOutcome::Translated("cat".to_string()))
        );
        assert_eq!(state.results().results().len(), 6);
    }

    #[test]
    fn existing_tags_are_not_overwritten_by_translation() {
        let mut harness = Harness::new();
        harness.services.set_translation(translated("cat"));
        harness.send(UiEvent::TagsChanged("pets".to_string()));

        harness.search("kedi");

        assert_eq!(harness.app.state().form().tags, "pets");
    }

    #[test]
    fn translation_error_searches_with_original_keywords() {
        let mut harness = Harness::new();
        harness.services.set_translation(Ok(TranslationReply {
            error: Some("timeout".to_string()),
            ..TranslationReply::default()
        }));

        harness.search("kedi");

        let searches = harness.services.searches();
        let query = &searches[0];
        assert_eq!(query.keywords, "kedi");
        assert_eq!(query.translated_keywords, "kedi");
        assert_eq!(
            harness.app.state().translation_status(),
            &TranslationStatus::Settled(TranslationOutcome::Failed("timeout".to_string()))
        );
        assert_eq!(harness.app.state().form().tags, "");
    }

    #[test]
    fn unreachable_translation_warns_and_still_searches() {
        let mut harness = Harness::new();
        harness.services.set_translation(Err(BackendError::Transport {
            endpoint: "translate_keywords",
            message: "connection refused".to_string(),
        }));

        harness.search("kedi");

        assert_eq!(harness.services.searches()[0].translated_keywords, "kedi");
        assert_eq!(harness.notices(NoticeLevel::Warning).len(), 1);
    }

    #[test]
    fn disabled_translation_skips_the_service() {
        let mut harness = Harness::with_config(AppConfig {
            translation_enabled: false,
            ..AppConfig::default()
        });

        harness.search("kedi");

        assert!(harness.services.translations().is_empty());
        assert_eq!(harness.services.searches()[0].translated_keywords, "kedi");
        assert_eq!(
            harness.app.state().translation_status(),
            &TranslationStatus::Settled(TranslationOutcome::Disabled)
        );
    }

    #[test]
    fn blank_keywords_clear_status_without_network_calls() {
        let mut harness = Harness::new();
        harness.search("   ");

        assert!(harness.services.translations().is_empty());
        assert!(harness.services.searches().is_empty());
        assert_eq!(
            harness.app.state().translation_status(),
            &TranslationStatus::Idle
        );
    }

    #[test]
    fn stale_search_response_is_discarded() {
        let mut harness = Harness::new();
        harness.send(UiEvent::KeywordsChanged("cat".to_string()));
        harness.advance(500);
        harness.runner.run_all();
        harness.advance(0);
        assert_eq!(harness.runner.pending(), vec!["search"]);

        harness.send(UiEvent::KeywordsChanged("dog".to_string()));
        harness.advance(500);
        harness.runner.run_at(1);
        harness.advance(0);
        assert_eq!(harness.runner.pending(), vec!["search", "search"]);

        // newer search finishes first, the older one afterwards
        harness.runner.run_at(1);
        harness.advance(0);
        harness.runner.run_at(0);
        harness.advance(0);

        assert!(harness.result_url(0).contains("/dog/"));
        assert_eq!(harness.services.searches().len(), 2);
    }

    #[test]
    fn late_translation_of_older_keywords_cannot_replace_newer_results() {
        let mut harness = Harness::new();
        harness.send(UiEvent::KeywordsChanged("cat".to_string()));
        harness.advance(500);
        harness.send(UiEvent::KeywordsChanged("dog".to_string()));
        harness.advance(500);
        assert_eq!(harness.runner.pending(), vec!["translate", "translate"]);

        // dog translates and searches first
        harness.runner.run_at(1);
        harness.advance(0);
        harness.runner.run_at(1);
        harness.advance(0);
        assert!(harness.result_url(0).contains("/dog/"));

        // cat's translation straggles in afterwards
        harness.runner.run_at(0);
        harness.advance(0);
        harness.settle();

        let searches = harness.services.searches();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[1].keywords, "cat");
        assert!(harness.result_url(0).contains("/dog/"));
        let state = harness.app.state();
        assert_eq!(
            state.search().map(|search| search.raw_keywords.as_str()),
            Some("dog")
        );
        assert_eq!(
            state.translation_status(),
            &TranslationStatus::Settled(TranslationOutcome::Unnecessary)
        );
    }

    #[test]
    fn cleared_keywords_stop_source_changes_from_searching() {
        let mut harness = Harness::new();
        harness.search("cat");
        harness.search("");

        harness.send(UiEvent::SourceChanged(ImageSource::Unsplash));
        harness.settle();

        assert_eq!(harness.services.searches().len(), 1);
        assert!(harness.app.state().search().is_none());
        assert_eq!(
            harness.app.state().translation_status(),
            &TranslationStatus::Idle
        );
    }

    #[test]
    fn clearing_keywords_retires_search_in_flight() {
        let mut harness = Harness::new();
        harness.send(UiEvent::KeywordsChanged("cat".to_string()));
        harness.advance(500);
        harness.runner.run_all();
        harness.advance(0);
        assert_eq!(harness.runner.pending(), vec!["search"]);

        harness.send(UiEvent::KeywordsChanged(String::new()));
        harness.advance(500);
        harness.settle();

        assert_eq!(harness.app.state().results(), &ResultGrid::Idle);
    }

    #[test]
    fn source_change_reruns_last_keywords_without_translating() {
        let mut harness = Harness::new();
        harness.services.set_translation(translated("cat"));
        harness.search("kedi");

        harness.send(UiEvent::SourceChanged(ImageSource::Unsplash));
        assert_eq!(harness.runner.pending(), vec!["search"]);
        harness.settle();

        assert_eq!(harness.services.translations().len(), 1);
        let searches = harness.services.searches();
        let query = &searches[1];
        assert_eq!(query.keywords, "kedi");
        assert_eq!(query.translated_keywords, "cat");
        assert_eq!(query.source, ImageSource::Unsplash);
    }

    #[test]
    fn size_filter_changes_are_debounced_before_rerunning() {
        let mut harness = Harness::new();
        harness.search("cat");

        harness.send(UiEvent::MinWidthChanged(Some(1200)));
        harness.advance(499);
        assert!(harness.runner.pending().is_empty());
        harness.advance(1);
        harness.settle();

        let searches = harness.services.searches();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[1].filter.min_width, Some(1200));
        assert_eq!(searches[1].filter.min_height, None);
    }

    #[test]
    fn filter_change_before_any_search_does_nothing() {
        let mut harness = Harness::new();
        harness.send(UiEvent::MinHeightChanged(Some(400)));
        harness.advance(500);
        harness.settle();

        assert!(harness.services.searches().is_empty());
        assert_eq!(harness.app.state().filter().min_height, Some(400));
    }

    #[test]
    fn selection_caps_at_four_and_keeps_order_after_removal() {
        let mut harness = Harness::new();
        harness.search("cat");
        let urls: Vec<String> = (0..5).map(|i| harness.result_url(i)).collect();
        for url in &urls[..4] {
            harness.send(UiEvent::ToggleImage(url.clone()));
        }

        harness.send(UiEvent::ToggleImage(urls[4].clone()));
        assert_eq!(harness.selected_urls(), urls[..4].to_vec());
        assert_eq!(
            harness.notices(NoticeLevel::Error),
            vec!["at most 4 images can be selected"]
        );

        harness.send(UiEvent::ToggleImage(urls[0].clone()));
        assert_eq!(harness.selected_urls(), urls[1..4].to_vec());
        harness.send(UiEvent::ToggleImage(urls[4].clone()));

        let selection = harness.app.state().selection();
        assert_eq!(selection.count(), 4);
        let primary = selection.primary().expect("primary image");
        assert_eq!(primary.url, urls[1]);
        assert_eq!((primary.width, primary.height), (900, 600));
        assert_eq!(harness.app.state().preview().images.len(), 4);
    }

    #[test]
    fn failed_search_keeps_selection_and_reports_error() {
        let mut harness = Harness::new();
        harness.search("cat");
        let url = harness.result_url(0);
        harness.send(UiEvent::ToggleImage(url.clone()));
        *harness.services.search_error.lock().expect("lock") = Some("rate limited".to_string());

        harness.send(UiEvent::SourceChanged(ImageSource::Unsplash));
        harness.settle();

        assert_eq!(
            harness.app.state().results(),
            &ResultGrid::Failed("rate limited".to_string())
        );
        assert_eq!(harness.selected_urls(), vec![url]);
        assert_eq!(
            harness.notices(NoticeLevel::Error),
            vec!["image search failed: rate limited"]
        );
    }

    #[test]
    fn empty_search_is_reported_as_information() {
        let mut harness = Harness::new();
        *harness.services.results_per_search.lock().expect("lock") = 0;

        harness.search("zzzz");

        assert_eq!(harness.app.state().results(), &ResultGrid::Empty);
        assert_eq!(harness.notices(NoticeLevel::Info).len(), 1);
    }

    #[test]
    fn submit_requires_title_and_content() {
        let mut harness = Harness::new();
        harness.send(UiEvent::ContentChanged("Body".to_string()));
        harness.send(UiEvent::Submit);

        assert!(harness.runner.pending().is_empty());
        assert!(!harness.app.state().submitting());
        assert_eq!(
            harness.notices(NoticeLevel::Error),
            vec!["missing required field: title"]
        );
    }

    #[test]
    fn successful_publish_sends_payload_and_resets_state() {
        let mut harness = Harness::new();
        harness.send(UiEvent::SourceChanged(ImageSource::Unsplash));
        harness.search("cat");
        let first = harness.result_url(0);
        let second = harness.result_url(1);
        harness.send(UiEvent::ToggleImage(first.clone()));
        harness.send(UiEvent::ToggleImage(second.clone()));
        harness.send(UiEvent::SetImageAlignment {
            url: second.clone(),
            alignment: AlignmentKind::Right,
        });
        harness.send(UiEvent::TitleChanged("Cats".to_string()));
        harness.send(UiEvent::ContentChanged("All about cats".to_string()));

        harness.send(UiEvent::Submit);
        assert!(harness.app.state().submitting());
        assert_eq!(harness.runner.pending(), vec!["publish"]);
        harness.settle();

        let published = harness.services.published();
        let payload = &published[0];
        assert_eq!(payload.get(field::TITLE), Some("Cats"));
        assert_eq!(payload.get(field::SOURCE), Some("unsplash"));
        assert_eq!(payload.get(field::IMAGE_URL), Some(first.as_str()));
        assert_eq!(
            payload.get(field::IMAGE_URLS),
            Some(format!("{first},{second}").as_str())
        );
        assert_eq!(
            payload.get(field::CONTENT_IMAGES),
            Some(format!(r#"[{{"url":"{second}","alignment":"right"}}]"#).as_str())
        );

        let state = harness.app.state();
        assert!(!state.submitting());
        assert!(state.selection().is_empty());
        assert_eq!(state.form().title, "");
        assert_eq!(state.form().source, ImageSource::Unsplash);
        assert_eq!(state.results(), &ResultGrid::Idle);
        assert!(state.search().is_none());
        assert_eq!(harness.notices(NoticeLevel::Success), vec!["Post created"]);
    }

    #[test]
    fn failed_publish_keeps_everything_for_a_retry() {
        let mut harness = Harness::new();
        *harness.services.publish_reply.lock().expect("lock") = Err(BackendError::Service {
            endpoint: "publish",
            message: "wordpress down".to_string(),
        });
        harness.search("cat");
        let url = harness.result_url(0);
        harness.send(UiEvent::ToggleImage(url.clone()));
        harness.send(UiEvent::TitleChanged("Cats".to_string()));
        harness.send(UiEvent::ContentChanged("Body".to_string()));

        harness.send(UiEvent::Submit);
        harness.settle();

        let state = harness.app.state();
        assert!(!state.submitting());
        assert_eq!(state.form().title, "Cats");
        assert_eq!(harness.selected_urls(), vec![url]);
        assert_eq!(
            harness.notices(NoticeLevel::Error),
            vec!["publishing failed: wordpress down"]
        );
    }

    #[test]
    fn second_submit_while_publishing_is_refused() {
        let mut harness = Harness::new();
        harness.send(UiEvent::TitleChanged("Cats".to_string()));
        harness.send(UiEvent::ContentChanged("Body".to_string()));

        harness.send(UiEvent::Submit);
        harness.send(UiEvent::Submit);

        assert_eq!(harness.runner.pending(), vec!["publish"]);
        assert_eq!(harness.notices(NoticeLevel::Warning).len(), 1);
    }

    #[test]
    fn alternating_is_refused_while_content_sits_below_text() {
        let mut harness = Harness::new();
        harness.send(UiEvent::AlternatingChanged(true));
        harness.send(UiEvent::ContentAlignmentChanged(AlignmentKind::BelowText));
        assert!(!harness.app.state().form().layout.alternating());

        harness.send(UiEvent::AlternatingChanged(true));

        assert!(!harness.app.state().form().layout.alternating());
        assert_eq!(harness.notices(NoticeLevel::Warning).len(), 1);
    }

    #[test]
    fn saved_template_uses_current_placeholder_syntax() {
        let mut harness = Harness::new();
        harness.send(UiEvent::SaveTemplate {
            name: " blog ".to_string(),
            content: "<h1>{title}</h1>".to_string(),
        });
        harness.settle();

        let saved = harness.services.saved_templates.lock().expect("lock").clone();
        assert_eq!(
            saved,
            vec![Template {
                name: "blog".to_string(),
                content: "<h1>%title%</h1>".to_string(),
            }]
        );
        assert_eq!(
            harness.notices(NoticeLevel::Success),
            vec![r#"template "blog" saved"#]
        );
    }

    #[test]
    fn blank_template_name_is_rejected_locally() {
        let mut harness = Harness::new();
        harness.send(UiEvent::SaveTemplate {
            name: "  ".to_string(),
            content: "body".to_string(),
        });

        assert!(harness.runner.pending().is_empty());
        assert_eq!(harness.notices(NoticeLevel::Error).len(), 1);
    }

    #[test]
    fn resize_replaces_result_with_cache_busted_url() {
        let mut harness = Harness::new();
        harness.search("cat");
        let url = harness.result_url(0);
        *harness.services.resize_reply.lock().expect("lock") = Ok(ResizeReply {
            status: "success".to_string(),
            resized_url: Some("https://img.test/resized/0.jpg".to_string()),
            new_size: Some([400, 300]),
            message: None,
        });

        harness.send(UiEvent::OpenResize(url.clone()));
        assert_eq!(
            harness.app.state().resize().target().map(|t| (t.width, t.height)),
            Some((800, 600))
        );
        harness.send(UiEvent::ResizeSizeChanged {
            width: 400,
            height: 300,
        });
        harness.send(UiEvent::ConfirmResize);
        assert!(!harness.app.state().resize().is_open());
        harness.settle();

        let request = harness.services.resize_calls.lock().expect("lock")[0].clone();
        assert_eq!((request.width, request.height), (400, 300));
        assert!(request.maintain_aspect);
        let result = harness
            .app
            .state()
            .results()
            .find(&url)
            .expect("result still listed");
        assert_eq!(result.size, Some((400, 300)));
        assert!(result
            .display_url()
            .starts_with("https://img.test/resized/0.jpg?t="));
    }

    #[test]
    fn zero_resize_dimension_keeps_dialog_open() {
        let mut harness = Harness::new();
        harness.search("cat");
        let url = harness.result_url(0);
        harness.send(UiEvent::OpenResize(url));
        harness.send(UiEvent::ResizeSizeChanged {
            width: 0,
            height: 300,
        });

        harness.send(UiEvent::ConfirmResize);

        assert!(harness.app.state().resize().is_open());
        assert!(harness.runner.pending().is_empty());
        assert_eq!(harness.notices(NoticeLevel::Error).len(), 1);
    }

    #[test]
    fn translation_toggle_uses_server_confirmed_value() {
        let mut harness = Harness::with_config(AppConfig {
            translation_enabled: false,
            ..AppConfig::default()
        });
        harness.app.start();
        harness.settle();
        assert!(harness.app.state().translation_enabled());

        harness.send(UiEvent::TranslationToggleRequested(false));
        harness.settle();
        assert!(!harness.app.state().translation_enabled());

        harness.search("kedi");
        assert!(harness.services.translations().is_empty());
    }

    #[test]
    fn preview_refreshes_after_text_settles() {
        let mut harness = Harness::new();
        harness.send(UiEvent::TitleChanged("Hello".to_string()));
        harness.send(UiEvent::ContentChanged("one\n\ntwo".to_string()));
        harness.advance(299);
        assert_eq!(harness.app.state().preview().title, "");

        harness.advance(1);

        let preview = harness.app.state().preview();
        assert_eq!(preview.title, "Hello");
        assert_eq!(preview.paragraphs, vec!["one", "two"]);
    }

    #[test]
    fn idle_only_once_debounces_fire_and_jobs_finish() {
        let mut harness = Harness::new();
        assert!(harness.app.is_idle());

        harness.send(UiEvent::KeywordsChanged("cat".to_string()));
        assert!(!harness.app.is_idle());
        harness.advance(500);
        assert!(!harness.app.is_idle());

        harness.settle();
        assert!(harness.app.is_idle());
    }

    #[test]
    fn revision_advances_on_events_and_completions() {
        let mut harness = Harness::new();
        let initial = harness.app.state().revision();
        harness.send(UiEvent::TitleChanged("Hello".to_string()));
        let after_event = harness.app.state().revision();
        assert!(after_event > initial);

        harness.advance(0);
        assert_eq!(harness.app.state().revision(), after_event);
    }
}
