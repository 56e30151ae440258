//! The canonical message a canned-policy signed URL signs.

/// Build the message a canned-policy signed URL signs.
///
/// The message is `{scheme}://{host}{path}?Expires={expires}`. Only the
/// `Expires` parameter participates; every other query parameter the client
/// sent is ignored. `expires` is used exactly as received, so a value like
/// `0100` must have been signed as `0100`.
///
/// # Examples
///
/// ```
/// use cloudfauxnt_auth::canned_url_message;
///
/// assert_eq!(
///     canned_url_message("http", "localhost:9001", "/s3/a.txt", "1700000000"),
///     "http://localhost:9001/s3/a.txt?Expires=1700000000"
/// );
/// ```
#[must_use]
pub fn canned_url_message(scheme: &str, host: &str, path: &str, expires: &str) -> String {
    format!("{scheme}://{host}{path}?Expires={expires}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_keep_path_and_host_verbatim() {
        assert_eq!(
            canned_url_message("https", "cdn.example.com", "/a%20b/c", "42"),
            "https://cdn.example.com/a%20b/c?Expires=42"
        );
    }
}
