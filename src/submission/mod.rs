//! Builds the multi-part form the publishing backend expects.
//!
//! Assembly only reads the selection and the form, so it doubles as a
//! preview of what a submit would send.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{require_text, ValidationError};
use crate::layout::LayoutOptions;
use crate::search::ImageSource;
use crate::selection::{AlignmentKind, SelectionSet};

const URL_DELIMITER: &str = ",";
const SUCCESS_STATUS: &str = "success";

pub mod field {
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
    pub const KEYWORDS: &str = "keywords";
    pub const TAGS: &str = "tags";
    pub const TEMPLATE: &str = "template";
    pub const PUBLISH_DATE: &str = "publish_date";
    pub const SOURCE: &str = "source";
    pub const FEATURED_IMAGE_ALIGNMENT: &str = "featured_image_alignment";
    pub const CONTENT_IMAGE_ALIGNMENT: &str = "content_image_alignment";
    pub const ALTERNATING_ALIGNMENT: &str = "alternating_alignment";
    pub const IMAGE_URL: &str = "image_url";
    pub const IMAGE_URLS: &str = "image_urls";
    pub const CONTENT_IMAGES: &str = "content_images";
    pub const CONTENT_IMAGE_URLS: &str = "content_image_urls";

    pub const IMAGE_FIELDS: [&str; 4] = [IMAGE_URL, IMAGE_URLS, CONTENT_IMAGES, CONTENT_IMAGE_URLS];
}

const DEFAULT_TEMPLATE: &str = "default";

/// Values typed into the post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub title: String,
    pub content: String,
    pub keywords: String,
    pub tags: String,
    pub template: String,
    /// `YYYY-MM-DDTHH:MM`, passed through untouched.
    pub publish_date: Option<String>,
    pub source: ImageSource,
    pub layout: LayoutOptions,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            keywords: String::new(),
            tags: String::new(),
            template: DEFAULT_TEMPLATE.to_string(),
            publish_date: None,
            source: ImageSource::default(),
            layout: LayoutOptions::default(),
        }
    }
}

impl FormFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(field::TITLE, &self.title)?;
        require_text(field::CONTENT, &self.content)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ContentImageEntry<'a> {
    url: &'a str,
    alignment: AlignmentKind,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("failed to encode content image list: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Ordered `(name, value)` text parts of the multi-part body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPayload {
    fields: Vec<(String, String)>,
}

impl SubmissionPayload {
    fn push(&mut self, name: &str, value: impl Into<String>) {
        self.fields.push((name.to_string(), value.into()));
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_image_fields(&self) -> bool {
        field::IMAGE_FIELDS
            .iter()
            .any(|name| self.get(name).is_some())
    }
}

pub fn assemble(
    selection: &SelectionSet,
    form: &FormFields,
) -> Result<SubmissionPayload, SubmissionError> {
    let mut payload = SubmissionPayload::default();
    payload.push(field::TITLE, form.title.as_str());
    payload.push(field::CONTENT, form.content.as_str());
    payload.push(field::KEYWORDS, form.keywords.as_str());
    payload.push(field::TAGS, form.tags.as_str());
    payload.push(field::TEMPLATE, form.template.as_str());
    if let Some(date) = form.publish_date.as_deref().filter(|date| !date.is_empty()) {
        payload.push(field::PUBLISH_DATE, date);
    }
    payload.push(field::SOURCE, form.source.as_str());
    payload.push(
        field::FEATURED_IMAGE_ALIGNMENT,
        form.layout.featured_alignment().as_str(),
    );
    payload.push(
        field::CONTENT_IMAGE_ALIGNMENT,
        form.layout.content_alignment().as_str(),
    );
    payload.push(
        field::ALTERNATING_ALIGNMENT,
        if form.layout.alternating() { "1" } else { "0" },
    );

    let Some(primary) = selection.primary() else {
        return Ok(payload);
    };
    payload.push(field::IMAGE_URL, primary.url.as_str());
    payload.push(field::IMAGE_URLS, join_urls(selection.images().iter().map(|i| i.url.as_str())));

    let content = selection.content_images();
    if !content.is_empty() {
        let entries: Vec<ContentImageEntry<'_>> = content
            .iter()
            .map(|image| ContentImageEntry {
                url: &image.url,
                alignment: image.alignment,
            })
            .collect();
        payload.push(field::CONTENT_IMAGES, serde_json::to_string(&entries)?);
        payload.push(
            field::CONTENT_IMAGE_URLS,
            join_urls(content.iter().map(|i| i.url.as_str())),
        );
    }

    Ok(payload)
}

fn join_urls<'a>(urls: impl Iterator<Item = &'a str>) -> String {
    urls.collect::<Vec<_>>().join(URL_DELIMITER)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublishReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl PublishReply {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}
