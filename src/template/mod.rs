//! Reusable post templates.
//!
//! Placeholders are written `%name%`. Older templates used `{name}`; those
//! tokens are rewritten before a template is stored. Braces that do not wrap
//! a bare identifier, such as block-comment JSON `{"level":1}`, are kept.

use serde::Serialize;

use crate::error::{require_text, ValidationError};

pub const TOKEN_MARKER: char = '%';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub name: String,
    pub content: String,
}

/// Validates the editor input and migrates legacy tokens.
pub fn prepare(name: &str, content: &str) -> Result<Template, ValidationError> {
    require_text("template name", name)?;
    require_text("template content", content)?;

    let migrated = migrate_legacy_tokens(content);
    if migrated != content {
        tracing::debug!(name, "migrated legacy template placeholders");
    }
    Ok(Template {
        name: name.trim().to_string(),
        content: migrated,
    })
}

pub fn migrate_legacy_tokens(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) if is_identifier(&after_open[..close]) => {
                output.push(TOKEN_MARKER);
                output.push_str(&after_open[..close]);
                output.push(TOKEN_MARKER);
                rest = &after_open[close + 1..];
            }
            _ => {
                output.push('{');
                rest = after_open;
            }
        }
    }
    output.push_str(rest);
    output
}

/// Distinct current-syntax placeholder names, in order of first use.
pub fn placeholders(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find(TOKEN_MARKER) {
        let after_open = &rest[open + 1..];
        match after_open.find(TOKEN_MARKER) {
            Some(close) if is_identifier(&after_open[..close]) => {
                let name = &after_open[..close];
                if !names.iter().any(|known| known == name) {
                    names.push(name.to_string());
                }
                rest = &after_open[close + 1..];
            }
            Some(_) => rest = after_open,
            None => break,
        }
    }
    names
}

fn is_identifier(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
