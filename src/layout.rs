use crate::selection::AlignmentKind;

/// Post-wide alignment choices.
///
/// `BelowText` as the content alignment and the alternating toggle are
/// coupled one way only: choosing `BelowText` switches alternating off and
/// locks it, while enabling alternating leaves the content alignment alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    featured_alignment: AlignmentKind,
    content_alignment: AlignmentKind,
    alternating: bool,
}

impl LayoutOptions {
    pub fn featured_alignment(&self) -> AlignmentKind {
        self.featured_alignment
    }

    pub fn content_alignment(&self) -> AlignmentKind {
        self.content_alignment
    }

    pub fn alternating(&self) -> bool {
        self.alternating
    }

    pub fn alternating_disabled(&self) -> bool {
        self.content_alignment == AlignmentKind::BelowText
    }

    pub fn set_featured_alignment(&mut self, alignment: AlignmentKind) {
        self.featured_alignment = alignment;
    }

    pub fn set_content_alignment(&mut self, alignment: AlignmentKind) {
        self.content_alignment = alignment;
        if self.alternating_disabled() && self.alternating {
            self.alternating = false;
            tracing::debug!("below-text content alignment switched alternating alignment off");
        }
    }

    /// Returns whether the request was applied.
    pub fn set_alternating(&mut self, enabled: bool) -> bool {
        if enabled && self.alternating_disabled() {
            tracing::warn!("alternating alignment is locked by below-text content alignment");
            return false;
        }
        self.alternating = enabled;
        true
    }
}
