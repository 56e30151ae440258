//! Forwarded path computation.

use crate::origin::OriginRule;

/// Compute the path forwarded to the origin for an inbound request path.
///
/// The steps run in a fixed order:
///
/// 1. Remove the rule's strip prefix, if configured and present.
/// 2. If the result is empty or `/`, substitute `/` + the default root object
///    (the rule's own, else `global_default_root_object`).
/// 3. Prepend the rule's target prefix, if configured.
///
/// The default root object is applied before the target prefix, so a root
/// request becomes `{target_prefix}/{object}` rather than the bare prefix.
///
/// # Examples
///
/// ```
/// use cloudfauxnt_core::{OriginRule, forwarded_path};
///
/// let rule = OriginRule::new("s3", "http://localhost:9000", ["/s3/*"])
///     .with_strip_prefix("/s3")
///     .with_target_prefix("/bucket")
///     .with_default_root_object("index.html");
///
/// assert_eq!(forwarded_path("/s3/", &rule, None), "/bucket/index.html");
/// assert_eq!(forwarded_path("/s3/file.txt", &rule, None), "/bucket/file.txt");
/// ```
#[must_use]
pub fn forwarded_path(
    path: &str,
    rule: &OriginRule,
    global_default_root_object: Option<&str>,
) -> String {
    let stripped = match rule.strip_prefix() {
        Some(prefix) => path.strip_prefix(prefix).unwrap_or(path),
        None => path,
    };

    let mut forwarded = if stripped.is_empty() || stripped == "/" {
        let root_object = rule
            .default_root_object()
            .or(global_default_root_object.filter(|o| !o.is_empty()));
        match root_object {
            Some(object) => format!("/{object}"),
            None => stripped.to_owned(),
        }
    } else {
        stripped.to_owned()
    };

    if let Some(prefix) = rule.target_prefix() {
        forwarded.insert_str(0, prefix);
    }

    forwarded
}
