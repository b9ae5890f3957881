//! Read-only model of how the post will look.

use crate::selection::{ImageRole, SelectionSet};
use crate::submission::FormFields;

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const TAG_SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub url: String,
    pub role: ImageRole,
    pub align_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPreview {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub tags: Vec<String>,
    pub images: Vec<PreviewImage>,
}

impl PostPreview {
    pub fn build(form: &FormFields, selection: &SelectionSet) -> Self {
        let paragraphs = form
            .content
            .split(PARAGRAPH_SEPARATOR)
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .map(str::to_string)
            .collect();

        let tags = if form.tags.is_empty() {
            Vec::new()
        } else {
            form.tags
                .split(TAG_SEPARATOR)
                .map(|tag| tag.trim().to_string())
                .collect()
        };

        let images = selection
            .ordered_view()
            .map(|(role, image)| PreviewImage {
                url: image.url.clone(),
                role,
                align_class: image.alignment.css_class(),
            })
            .collect();

        Self {
            title: form.title.clone(),
            paragraphs,
            tags,
            images,
        }
    }
}
