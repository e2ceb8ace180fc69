#![forbid(unsafe_code)]

//! Tour step descriptors.
//!
//! A [`Step`] is immutable once the tour is opened. The controller only ever
//! reads it; hosts build the sequence up front (in code or from JSON).

use std::time::Duration;

use coachmark_layout::placement::Side;

/// One unit of the tour: a target, explanatory copy, preferred side, and
/// interaction requirement.
///
/// `title` and `content` are opaque keys for the host's localization layer.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct Step {
    /// Optional stable name used in logs and events.
    #[cfg_attr(feature = "config", serde(skip_serializing_if = "Option::is_none"))]
    pub id: Option<String>,
    /// Selector for the anchor element. Empty means "no anchor".
    pub target: String,
    pub title: String,
    pub content: String,
    pub side: Side,
    /// Progression requires acting on the target itself.
    pub interactive: bool,
    /// Overrides the configured settle delay, in milliseconds.
    #[cfg_attr(
        feature = "config",
        serde(rename = "settleDelay", skip_serializing_if = "Option::is_none")
    )]
    pub settle_delay_ms: Option<u64>,
}

impl Step {
    /// Create a step anchored to `target`.
    #[must_use]
    pub fn new(target: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Create an unanchored step shown in the middle of the viewport.
    #[must_use]
    pub fn centered(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            side: Side::Center,
            ..Self::default()
        }
    }

    /// Set the step id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the content key.
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the preferred side.
    #[must_use]
    pub fn side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Require the user to act on the target to progress.
    #[must_use]
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Override the settle delay.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Whether the step has no anchor and is shown centred without a lookup.
    #[must_use]
    pub fn is_unanchored(&self) -> bool {
        self.target.trim().is_empty()
    }

    /// Whether navigation controls are locked for this step.
    ///
    /// Only steps with a target can gate progression; an interactive step
    /// without one would have nothing to click.
    #[must_use]
    pub fn gates_navigation(&self) -> bool {
        self.interactive && !self.is_unanchored()
    }

    /// Name used in logs: the id when present, otherwise the selector.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.id.as_deref() {
            Some(id) => id,
            None if self.is_unanchored() => "<centered>",
            None => self.target.as_str(),
        }
    }
}
