#![forbid(unsafe_code)]

//! Tour configuration as data.
//!
//! [`TourConfig`] collects every tunable of the runtime and can be loaded
//! from TOML or JSON with the `config` feature:
//!
//! ```toml
//! # coachmark.toml
//! settle_delay_ms = 50
//! skip_unresolved = true
//! highlight_padding = 4.0
//!
//! [placement]
//! gap = 16.0
//! margin = 16.0
//!
//! [keys]
//! cancel = ["Escape"]
//! ```
//!
//! ```rust,ignore
//! let config = TourConfig::from_toml_file("coachmark.toml")?;
//! let steps = steps_from_json_file("tour.json")?;
//! ```
//!
//! Defaults match the stock behaviour, so `TourConfig::default()` needs no
//! file at all.

#[cfg(feature = "config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use coachmark_core::event::{KeyCode, KeyEvent};
use coachmark_layout::placement::PlacementConfig;

use crate::error::ConfigError;
#[cfg(feature = "config")]
use crate::step::Step;

/// Default delay between activating a step and measuring its target.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 50;
/// Default distance between the anchor and the highlight cut-out edge.
pub const DEFAULT_HIGHLIGHT_PADDING: f64 = 4.0;

/// Runtime configuration for a [`TourController`](crate::TourController).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TourConfig {
    /// Delay before a step's target is measured, giving the host time to
    /// scroll it into view.
    pub settle_delay_ms: u64,
    /// Skip steps whose target cannot be found. When false the step stays
    /// active with a centred tooltip.
    pub skip_unresolved: bool,
    /// Padding around the anchor for the highlight cut-out.
    pub highlight_padding: f64,
    /// Whether next/previous keys navigate. The cancel keys always work.
    pub keyboard_navigation: bool,
    pub placement: PlacementConfig,
    pub keys: KeyConfig,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            skip_unresolved: true,
            highlight_padding: DEFAULT_HIGHLIGHT_PADDING,
            keyboard_navigation: true,
            placement: PlacementConfig::default(),
            keys: KeyConfig::default(),
        }
    }
}

impl TourConfig {
    /// Set the settle delay.
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set whether unresolvable steps are skipped.
    #[must_use]
    pub fn skip_unresolved(mut self, skip: bool) -> Self {
        self.skip_unresolved = skip;
        self
    }

    /// Set the highlight padding.
    #[must_use]
    pub fn highlight_padding(mut self, padding: f64) -> Self {
        self.highlight_padding = padding;
        self
    }

    /// Enable or disable keyboard navigation.
    #[must_use]
    pub fn keyboard_navigation(mut self, enabled: bool) -> Self {
        self.keyboard_navigation = enabled;
        self
    }

    /// Replace the placement tunables.
    #[must_use]
    pub fn placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Replace the key bindings.
    #[must_use]
    pub fn keys(mut self, keys: KeyConfig) -> Self {
        self.keys = keys;
        self
    }

    /// Default settle delay as a [`Duration`].
    #[must_use]
    pub fn settle_delay_duration(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::parse("TOML", e))
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::parse("JSON", e))
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.placement.validate();

        if !self.highlight_padding.is_finite() || self.highlight_padding < 0.0 {
            errors.push(format!(
                "highlight_padding must be finite and >= 0, got {}",
                self.highlight_padding
            ));
        }
        if self.keys.cancel.is_empty() {
            errors.push("keys.cancel must name at least one key".to_string());
        }
        for key in &self.keys.cancel {
            if self.keys.next.contains(key) || self.keys.prev.contains(key) {
                errors.push(format!("key {key:?} is bound to cancel and navigation"));
            }
        }
        for key in &self.keys.next {
            if self.keys.prev.contains(key) {
                errors.push(format!("key {key:?} is bound to both next and prev"));
            }
        }
        errors
    }

    /// Return `self` if valid, otherwise the collected validation errors.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Keyboard bindings for an open tour.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct KeyConfig {
    pub cancel: Vec<KeyCode>,
    pub next: Vec<KeyCode>,
    pub prev: Vec<KeyCode>,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            cancel: vec![KeyCode::Escape],
            next: vec![KeyCode::Right, KeyCode::Enter],
            prev: vec![KeyCode::Left],
        }
    }
}

/// What a key press means to the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Cancel,
    Next,
    Prev,
}

impl KeyConfig {
    /// Map a key press to an action. Releases and repeats map to nothing,
    /// as does any key carrying modifiers.
    #[must_use]
    pub fn action_for(&self, key: &KeyEvent) -> Option<KeyAction> {
        if !key.is_press() || !key.modifiers.is_empty() {
            return None;
        }
        if self.cancel.contains(&key.code) {
            Some(KeyAction::Cancel)
        } else if self.next.contains(&key.code) {
            Some(KeyAction::Next)
        } else if self.prev.contains(&key.code) {
            Some(KeyAction::Prev)
        } else {
            None
        }
    }
}

/// Parse a step sequence from a JSON array.
#[cfg(feature = "config")]
pub fn steps_from_json_str(s: &str) -> Result<Vec<Step>, ConfigError> {
    serde_json::from_str(s).map_err(|e| ConfigError::parse("JSON", e))
}

/// Parse a step sequence from a JSON file on disk.
#[cfg(feature = "config")]
pub fn steps_from_json_file(path: impl AsRef<Path>) -> Result<Vec<Step>, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    steps_from_json_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachmark_core::event::{KeyEventKind, Modifiers};

    #[test]
    fn defaults_are_valid() {
        let config = TourConfig::default();
        assert!(config.validate().is_empty(), "{:?}", config.validate());
        assert_eq!(config.settle_delay_ms, 50);
        assert!(config.skip_unresolved);
        assert_eq!(config.highlight_padding, 4.0);
    }

    #[test]
    fn negative_padding_rejected() {
        let config = TourConfig::default().highlight_padding(-1.0);
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("highlight_padding"));
    }

    #[test]
    fn placement_errors_are_included() {
        let config = TourConfig::default().placement(PlacementConfig::default().gap(f64::NAN));
        assert!(config.validate().iter().any(|e| e.contains("placement.gap")));
    }

    #[test]
    fn overlapping_keys_rejected() {
        let keys = KeyConfig {
            cancel: vec![KeyCode::Escape],
            next: vec![KeyCode::Escape, KeyCode::Right],
            prev: vec![KeyCode::Right],
        };
        let errors = TourConfig::default().keys(keys).validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn validated_reports_all_errors() {
        let keys = KeyConfig {
            cancel: Vec::new(),
            ..KeyConfig::default()
        };
        let result = TourConfig::default()
            .highlight_padding(f64::INFINITY)
            .keys(keys)
            .validated();
        match result {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn key_actions() {
        let keys = KeyConfig::default();
        assert_eq!(
            keys.action_for(&KeyEvent::new(KeyCode::Escape)),
            Some(KeyAction::Cancel)
        );
        assert_eq!(
            keys.action_for(&KeyEvent::new(KeyCode::Enter)),
            Some(KeyAction::Next)
        );
        assert_eq!(
            keys.action_for(&KeyEvent::new(KeyCode::Left)),
            Some(KeyAction::Prev)
        );
        assert_eq!(keys.action_for(&KeyEvent::new(KeyCode::Char('x'))), None);
    }

    #[test]
    fn releases_and_modified_keys_ignored() {
        let keys = KeyConfig::default();
        let release = KeyEvent::new(KeyCode::Escape).with_kind(KeyEventKind::Release);
        assert_eq!(keys.action_for(&release), None);
        let ctrl = KeyEvent::new(KeyCode::Right).with_modifiers(Modifiers::CTRL);
        assert_eq!(keys.action_for(&ctrl), None);
    }

    #[test]
    fn settle_delay_builder() {
        let config = TourConfig::default().settle_delay(Duration::from_millis(250));
        assert_eq!(config.settle_delay_ms, 250);
        assert_eq!(config.settle_delay_duration(), Duration::from_millis(250));
    }

    #[cfg(feature = "config")]
    mod loading {
        use super::*;

        #[test]
        fn toml_partial_overrides() {
            let config = TourConfig::from_toml_str(
                "settle_delay_ms = 120\nskip_unresolved = false\n[placement]\ngap = 8.0\n",
            )
            .expect("parse");
            assert_eq!(config.settle_delay_ms, 120);
            assert!(!config.skip_unresolved);
            assert_eq!(config.placement.gap, 8.0);
            assert_eq!(config.placement.margin, 16.0);
            assert_eq!(config.highlight_padding, 4.0);
        }

        #[test]
        fn toml_keys() {
            let config =
                TourConfig::from_toml_str("[keys]\ncancel = [\"Escape\", { Char = \"q\" }]\n")
                    .expect("parse");
            assert_eq!(
                config.keys.cancel,
                vec![KeyCode::Escape, KeyCode::Char('q')]
            );
            assert_eq!(config.keys.next, KeyConfig::default().next);
        }

        #[test]
        fn json_round_trip() {
            let config = TourConfig::default().highlight_padding(6.0);
            let json = serde_json::to_string(&config).expect("serialize");
            assert_eq!(TourConfig::from_json_str(&json).expect("parse"), config);
        }

        #[test]
        fn malformed_toml_is_parse_error() {
            let err = TourConfig::from_toml_str("settle_delay_ms = \"soon\"").unwrap_err();
            assert!(matches!(err, ConfigError::Parse { format: "TOML", .. }));
        }

        #[test]
        fn missing_file_is_io_error() {
            let err = TourConfig::from_json_file("/nonexistent/coachmark.json").unwrap_err();
            assert!(matches!(err, ConfigError::Io(_)));
        }

        #[test]
        fn steps_parse_camel_case() {
            let steps = steps_from_json_str(
                r##"[
                    {"target": "#nav", "title": "tour.nav", "side": "right", "settleDelay": 200},
                    {"title": "tour.done", "interactive": true}
                ]"##,
            )
            .expect("parse");
            assert_eq!(steps.len(), 2);
            assert_eq!(steps[0].target, "#nav");
            assert_eq!(steps[0].side, coachmark_layout::Side::Right);
            assert_eq!(steps[0].settle_delay_ms, Some(200));
            assert!(steps[1].is_unanchored());
            assert!(steps[1].interactive);
            assert!(!steps[1].gates_navigation());
        }
    }
}
