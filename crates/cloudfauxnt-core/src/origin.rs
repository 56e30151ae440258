//! Origin rules.
//!
//! An [`OriginRule`] describes one upstream backend: where it lives, which
//! request paths it claims, how the path is rewritten before forwarding, and
//! whether requests routed to it must carry a signature.

use serde::{Deserialize, Serialize};

/// Per-origin override of the global signature requirement.
///
/// In YAML this is the optional boolean `require_signature`: absent or `null`
/// is [`Inherit`](Self::Inherit), `true` is [`Require`](Self::Require), and
/// `false` is [`Exempt`](Self::Exempt).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum SignatureRequirement {
    /// Use the global signing default.
    #[default]
    Inherit,
    /// Always require a valid signature.
    Require,
    /// Never require a signature.
    Exempt,
}

impl SignatureRequirement {
    /// Resolve the effective requirement against the global default.
    #[must_use]
    pub fn resolve(self, global_default: bool) -> bool {
        match self {
            Self::Inherit => global_default,
            Self::Require => true,
            Self::Exempt => false,
        }
    }
}

impl From<Option<bool>> for SignatureRequirement {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Inherit,
            Some(true) => Self::Require,
            Some(false) => Self::Exempt,
        }
    }
}

impl From<SignatureRequirement> for Option<bool> {
    fn from(value: SignatureRequirement) -> Self {
        match value {
            SignatureRequirement::Inherit => None,
            SignatureRequirement::Require => Some(true),
            SignatureRequirement::Exempt => Some(false),
        }
    }
}

/// A configured upstream origin and the paths it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRule {
    /// Human-readable origin name, used in logs.
    pub name: String,
    /// Upstream base URL (e.g. `http://localhost:9000`).
    pub url: String,
    /// Path patterns in match order: exact, `prefix/*`, or `prefix*`.
    pub path_patterns: Vec<String>,
    /// Literal prefix removed from the request path before forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<String>,
    /// Prefix prepended to the forwarded path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_prefix: Option<String>,
    /// Signature requirement override for this origin.
    #[serde(default)]
    pub require_signature: SignatureRequirement,
    /// Object served when the rewritten path is the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_root_object: Option<String>,
}

impl OriginRule {
    /// Create a rule with the given name, upstream, and patterns and no rewrites.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        path_patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            path_patterns: path_patterns.into_iter().map(Into::into).collect(),
            strip_prefix: None,
            target_prefix: None,
            require_signature: SignatureRequirement::Inherit,
            default_root_object: None,
        }
    }

    /// Set the strip prefix.
    #[must_use]
    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    /// Set the target prefix.
    #[must_use]
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = Some(prefix.into());
        self
    }

    /// Set the signature requirement override.
    #[must_use]
    pub fn with_requirement(mut self, requirement: SignatureRequirement) -> Self {
        self.require_signature = requirement;
        self
    }

    /// Set the per-origin default root object.
    #[must_use]
    pub fn with_default_root_object(mut self, object: impl Into<String>) -> Self {
        self.default_root_object = Some(object.into());
        self
    }

    /// The strip prefix, treating an empty string as unset.
    #[must_use]
    pub fn strip_prefix(&self) -> Option<&str> {
        non_empty(self.strip_prefix.as_deref())
    }

    /// The target prefix, treating an empty string as unset.
    #[must_use]
    pub fn target_prefix(&self) -> Option<&str> {
        non_empty(self.target_prefix.as_deref())
    }

    /// The per-origin default root object, treating an empty string as unset.
    #[must_use]
    pub fn default_root_object(&self) -> Option<&str> {
        non_empty(self.default_root_object.as_deref())
    }

    /// Whether requests routed to this origin need a signature.
    #[must_use]
    pub fn requires_signature(&self, global_default: bool) -> bool {
        self.require_signature.resolve(global_default)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
