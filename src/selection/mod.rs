//! Ordered, capacity-bounded selection of search results.
//!
//! Index 0 is the featured image of the post; every later entry is a content
//! image, kept in insertion order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_SELECTED_IMAGES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentKind {
    #[default]
    None,
    Left,
    Center,
    Right,
    BelowText,
}

impl AlignmentKind {
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Left,
        Self::Center,
        Self::Right,
        Self::BelowText,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::BelowText => "below_text",
        }
    }

    /// Block-editor class applied in the preview, `None` for unaligned images.
    pub fn css_class(self) -> Option<String> {
        match self {
            Self::None => None,
            other => Some(format!("align{}", other.as_str().replace('_', ""))),
        }
    }
}

impl fmt::Display for AlignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown alignment: {0}")]
pub struct ParseAlignmentError(String);

impl FromStr for AlignmentKind {
    type Err = ParseAlignmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseAlignmentError(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Featured,
    Content,
}

impl ImageRole {
    const fn for_index(index: usize) -> Self {
        if index == 0 {
            Self::Featured
        } else {
            Self::Content
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Content => "content",
        }
    }
}

/// Known pixel size of a result; zero when the provider did not report one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub url: String,
    pub alignment: AlignmentKind,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added { index: usize },
    Removed { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("at most {capacity} images can be selected")]
    CapacityExceeded { capacity: usize },
}

pub type SelectionResult<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    images: Vec<SelectedImage>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, url: &str, metadata: ImageMetadata) -> SelectionResult<ToggleOutcome> {
        if let Some(index) = self.position(url) {
            self.images.remove(index);
            tracing::debug!(url, index, "image deselected");
            return Ok(ToggleOutcome::Removed { index });
        }

        if self.images.len() >= MAX_SELECTED_IMAGES {
            tracing::warn!(url, "selection full; toggle rejected");
            return Err(SelectionError::CapacityExceeded {
                capacity: MAX_SELECTED_IMAGES,
            });
        }

        self.images.push(SelectedImage {
            url: url.to_string(),
            alignment: AlignmentKind::None,
            width: metadata.width,
            height: metadata.height,
        });
        let index = self.images.len() - 1;
        tracing::debug!(url, index, "image selected");
        Ok(ToggleOutcome::Added { index })
    }

    /// Returns `false` when `url` is not selected.
    pub fn set_alignment(&mut self, url: &str, alignment: AlignmentKind) -> bool {
        match self.images.iter_mut().find(|image| image.url == url) {
            Some(image) => {
                image.alignment = alignment;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, url: &str) -> bool {
        match self.position(url) {
            Some(index) => {
                self.images.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn count(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= MAX_SELECTED_IMAGES
    }

    pub fn contains(&self, url: &str) -> bool {
        self.position(url).is_some()
    }

    pub fn position(&self, url: &str) -> Option<usize> {
        self.images.iter().position(|image| image.url == url)
    }

    pub fn get(&self, index: usize) -> Option<&SelectedImage> {
        self.images.get(index)
    }

    pub fn images(&self) -> &[SelectedImage] {
        &self.images
    }

    pub fn primary(&self) -> Option<&SelectedImage> {
        self.images.first()
    }

    /// Every selected image after the primary one.
    pub fn content_images(&self) -> &[SelectedImage] {
        self.images.get(1..).unwrap_or(&[])
    }

    pub fn ordered_view(&self) -> impl Iterator<Item = (ImageRole, &SelectedImage)> + '_ {
        self.images
            .iter()
            .enumerate()
            .map(|(index, image)| (ImageRole::for_index(index), image))
    }
}
