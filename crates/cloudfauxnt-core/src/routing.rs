//! Path-to-origin resolution.
//!
//! [`OriginTable::resolve`] picks the origin whose matching pattern is the
//! longest. Patterns come in three shapes:
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `/exact` | only `/exact` |
//! | `/s3/*` | any path starting with `/s3` (including `/s3` itself) |
//! | `/img*` | any path starting with `/img` |
//!
//! Resolution is order-sensitive: when two patterns of the same length match,
//! the rule that appears first in the configuration wins.

use tracing::trace;

use crate::origin::OriginRule;

/// No configured origin claims the request path.
///
/// This is a routing miss, not a security failure, and is reported to clients
/// differently from an authorization denial.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no origin found for path: {path}")]
pub struct RouteNotFound {
    /// The path that failed to match.
    pub path: String,
}

/// Immutable, ordered set of origin rules.
#[derive(Debug, Clone)]
pub struct OriginTable {
    rules: Vec<OriginRule>,
}

impl OriginTable {
    /// Create a table from rules in configuration order.
    #[must_use]
    pub fn new(rules: Vec<OriginRule>) -> Self {
        Self { rules }
    }

    /// The rules in configuration order.
    #[must_use]
    pub fn rules(&self) -> &[OriginRule] {
        &self.rules
    }

    /// Resolve a request path to the best-matching origin rule.
    ///
    /// # Errors
    ///
    /// Returns [`RouteNotFound`] if no pattern of any rule matches `path`.
    pub fn resolve(&self, path: &str) -> Result<&OriginRule, RouteNotFound> {
        let mut best: Option<(&OriginRule, usize)> = None;

        for rule in &self.rules {
            for pattern in &rule.path_patterns {
                if !pattern_matches(pattern, path) {
                    continue;
                }
                // Strictly longer only, so ties stay with the earlier rule.
                if best.is_none_or(|(_, len)| pattern.len() > len) {
                    best = Some((rule, pattern.len()));
                }
            }
        }

        match best {
            Some((rule, len)) => {
                trace!(path, origin = %rule.name, pattern_len = len, "resolved origin");
                Ok(rule)
            }
            None => Err(RouteNotFound {
                path: path.to_owned(),
            }),
        }
    }
}

/// Test whether a single pattern matches a path.
///
/// # Examples
///
/// ```
/// use cloudfauxnt_core::pattern_matches;
///
/// assert!(pattern_matches("/health", "/health"));
/// assert!(pattern_matches("/s3/*", "/s3/bucket/key"));
/// assert!(pattern_matches("/s3/*", "/s3"));
/// assert!(pattern_matches("/img*", "/imgs/a.png"));
/// assert!(!pattern_matches("/img*", "/images/a.png"));
/// assert!(!pattern_matches("/s3/*", "/other"));
/// ```
#[must_use]
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern == path {
        return true;
    }

    if let Some(stem) = pattern.strip_suffix("/*") {
        return path.starts_with(stem);
    }

    if let Some(stem) = pattern.strip_suffix('*') {
        return path.starts_with(stem);
    }

    false
}
