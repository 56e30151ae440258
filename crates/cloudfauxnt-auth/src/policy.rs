//! Canned policy documents.
//!
//! A signed cookie carries a JSON policy of the shape
//!
//! ```json
//! {"Statement":[{"Resource":"http://host/path/*","Condition":{"DateLessThan":{"AWS:EpochTime":1700000000}}}]}
//! ```
//!
//! Only the first statement's expiration is enforced. The resource is parsed
//! and kept for logging but not matched against the request.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

#[derive(Debug, Serialize, Deserialize)]
struct PolicyDocument {
    #[serde(rename = "Statement", default)]
    statements: Vec<Statement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Statement {
    #[serde(rename = "Resource", default, skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    #[serde(rename = "Condition", default)]
    condition: Condition,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Condition {
    #[serde(rename = "DateLessThan", default)]
    date_less_than: DateLessThan,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DateLessThan {
    #[serde(rename = "AWS:EpochTime", default)]
    epoch_time: i64,
}

/// The parts of a canned policy the verifier uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedPolicy {
    /// Resource the policy grants, if stated.
    pub resource: Option<String>,
    /// Expiration of the first statement, seconds since the epoch.
    pub expires: i64,
}

impl CannedPolicy {
    /// Create a policy granting `resource` until `expires`.
    #[must_use]
    pub fn new(resource: impl Into<String>, expires: i64) -> Self {
        Self {
            resource: Some(resource.into()),
            expires,
        }
    }

    /// Parse a decoded policy document.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedProof`] if the bytes are not a policy
    /// document, the document has no statements, or the first statement has
    /// a missing or zero `AWS:EpochTime`. Negative times decode and are left to
    /// the expiration check.
    pub fn decode(bytes: &[u8]) -> Result<Self, AuthError> {
        let document: PolicyDocument = serde_json::from_slice(bytes)
            .map_err(|e| AuthError::MalformedProof(format!("invalid policy JSON: {e}")))?;

        let Some(statement) = document.statements.into_iter().next() else {
            return Err(AuthError::MalformedProof(
                "policy has no statements".to_owned(),
            ));
        };

        let expires = statement.condition.date_less_than.epoch_time;
        if expires == 0 {
            return Err(AuthError::MalformedProof(
                "policy has no expiration".to_owned(),
            ));
        }

        Ok(Self {
            resource: statement.resource,
            expires,
        })
    }

    /// Serialize the policy to the compact JSON CloudFront signs.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which cannot occur for these types in
    /// practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let document = PolicyDocument {
            statements: vec![Statement {
                resource: self.resource.clone(),
                condition: Condition {
                    date_less_than: DateLessThan {
                        epoch_time: self.expires,
                    },
                },
            }],
        };
        serde_json::to_string(&document)
    }
}
