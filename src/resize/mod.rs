use serde::{Deserialize, Serialize};

use crate::backend::BackendResult;
use crate::error::ValidationError;
use crate::search::ImageResult;

const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeRequest {
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    pub maintain_aspect: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResizeReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub resized_url: Option<String>,
    #[serde(default)]
    pub new_size: Option<[u32; 2]>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeOutcome {
    Resized {
        resized_url: String,
        new_size: Option<(u32, u32)>,
    },
    Rejected(String),
}

pub fn interpret(reply: BackendResult<ResizeReply>) -> ResizeOutcome {
    match reply {
        Ok(reply) if reply.status == SUCCESS_STATUS => match reply.resized_url {
            Some(resized_url) => ResizeOutcome::Resized {
                resized_url,
                new_size: reply.new_size.map(|[w, h]| (w, h)),
            },
            None => ResizeOutcome::Rejected("resize succeeded without a resized url".to_string()),
        },
        Ok(reply) => ResizeOutcome::Rejected(
            reply
                .message
                .unwrap_or_else(|| format!("unexpected status {:?}", reply.status)),
        ),
        Err(err) => ResizeOutcome::Rejected(err.message().to_string()),
    }
}

/// Appends a timestamp so the browser-side cache never serves the old bytes.
pub fn cache_busted(url: &str, stamp_millis: u128) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={stamp_millis}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeTarget {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub maintain_aspect: bool,
}

/// The single open resize dialog, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResizeDialog {
    target: Option<ResizeTarget>,
}

impl ResizeDialog {
    pub fn open(&mut self, result: &ImageResult) {
        let (width, height) = result.size.unwrap_or((0, 0));
        self.target = Some(ResizeTarget {
            url: result.url.clone(),
            width,
            height,
            maintain_aspect: true,
        });
    }

    pub fn close(&mut self) -> Option<ResizeTarget> {
        self.target.take()
    }

    pub fn target(&self) -> Option<&ResizeTarget> {
        self.target.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        if let Some(target) = self.target.as_mut() {
            target.width = width;
            target.height = height;
        }
    }

    pub fn set_maintain_aspect(&mut self, maintain_aspect: bool) {
        if let Some(target) = self.target.as_mut() {
            target.maintain_aspect = maintain_aspect;
        }
    }

    /// `Ok(None)` when no dialog is open.
    pub fn request(&self) -> Result<Option<ResizeRequest>, ValidationError> {
        let Some(target) = self.target.as_ref() else {
            return Ok(None);
        };
        for (field, value) in [("width", target.width), ("height", target.height)] {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field,
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(Some(ResizeRequest {
            image_url: target.url.clone(),
            width: target.width,
            height: target.height,
            maintain_aspect: target.maintain_aspect,
        }))
    }
}
