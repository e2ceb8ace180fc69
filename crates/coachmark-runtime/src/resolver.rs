#![forbid(unsafe_code)]

//! Target geometry lookup.
//!
//! The runtime never touches a document. A host supplies a
//! [`GeometryResolver`] that turns a selector into a viewport-space [`Rect`],
//! bringing the element into view first if it can. The DOM resolver lives in
//! `coachmark-web`; [`StaticResolver`] serves tests, scripted replays, and the
//! CLI.

use std::collections::HashMap;

use coachmark_core::geometry::Rect;

/// Resolves a step target selector to its current bounding box.
pub trait GeometryResolver {
    /// Bring the target into view and measure it.
    ///
    /// Returns `None` when the selector matches nothing. Must not panic on
    /// malformed selectors.
    fn resolve(&mut self, selector: &str) -> Option<Rect>;
}

impl<F> GeometryResolver for F
where
    F: FnMut(&str) -> Option<Rect>,
{
    fn resolve(&mut self, selector: &str) -> Option<Rect> {
        self(selector)
    }
}

/// Fixed selector-to-rect table.
///
/// Records every lookup so tests can assert on how often (and in which
/// order) targets were measured.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    rects: HashMap<String, Rect>,
    lookups: Vec<String>,
}

impl StaticResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a target.
    #[must_use]
    pub fn with(mut self, selector: impl Into<String>, rect: Rect) -> Self {
        self.insert(selector, rect);
        self
    }

    pub fn insert(&mut self, selector: impl Into<String>, rect: Rect) {
        self.rects.insert(selector.into(), rect);
    }

    /// Remove a target, simulating an element leaving the document.
    pub fn remove(&mut self, selector: &str) -> Option<Rect> {
        self.rects.remove(selector)
    }

    /// Selectors looked up so far, in order.
    #[must_use]
    pub fn lookups(&self) -> &[String] {
        &self.lookups
    }

    /// Number of lookups for `selector`.
    #[must_use]
    pub fn lookup_count(&self, selector: &str) -> usize {
        self.lookups.iter().filter(|s| s.as_str() == selector).count()
    }

    pub fn clear_lookups(&mut self) {
        self.lookups.clear();
    }
}

impl GeometryResolver for StaticResolver {
    fn resolve(&mut self, selector: &str) -> Option<Rect> {
        self.lookups.push(selector.to_string());
        self.rects.get(selector).copied()
    }
}

impl<S: Into<String>> FromIterator<(S, Rect)> for StaticResolver {
    fn from_iter<I: IntoIterator<Item = (S, Rect)>>(iter: I) -> Self {
        let mut resolver = Self::new();
        for (selector, rect) in iter {
            resolver.insert(selector, rect);
        }
        resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_resolver_hits_and_misses() {
        let mut resolver = StaticResolver::new().with("#a", Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(
            resolver.resolve("#a"),
            Some(Rect::new(10.0, 20.0, 30.0, 40.0))
        );
        assert_eq!(resolver.resolve("#b"), None);
        assert_eq!(resolver.lookups(), ["#a", "#b"]);
        assert_eq!(resolver.lookup_count("#a"), 1);
    }

    #[test]
    fn removal_makes_target_unresolvable() {
        let mut resolver: StaticResolver = [("#a", Rect::new(0.0, 0.0, 1.0, 1.0))]
            .into_iter()
            .collect();
        assert!(resolver.resolve("#a").is_some());
        assert!(resolver.remove("#a").is_some());
        assert!(resolver.resolve("#a").is_none());
        resolver.clear_lookups();
        assert!(resolver.lookups().is_empty());
    }

    #[test]
    fn closures_resolve() {
        let mut calls = 0;
        let mut resolver = |selector: &str| {
            calls += 1;
            (selector == "#ok").then(|| Rect::new(0.0, 0.0, 5.0, 5.0))
        };
        assert!(GeometryResolver::resolve(&mut resolver, "#ok").is_some());
        assert!(GeometryResolver::resolve(&mut resolver, "#nope").is_none());
        assert_eq!(calls, 2);
    }
}
