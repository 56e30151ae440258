//! CloudFront's URL-safe base64 variant.
//!
//! CloudFront encodes signatures and policies with standard base64 and then
//! substitutes `+` with `-`, `/` with `_`, and `=` with `~`. Decoding
//! reverses the substitution first, so text in either alphabet is accepted.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encode bytes in CloudFront's URL-safe alphabet.
#[must_use]
pub fn encode_cloudfront_base64(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            '=' => '~',
            c => c,
        })
        .collect()
}

/// Decode text in CloudFront's URL-safe alphabet or the standard one.
///
/// # Errors
///
/// Returns the underlying [`base64::DecodeError`] when the text is not valid
/// base64 after translation.
pub fn decode_cloudfront_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let translated: String = text
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            '~' => '=',
            c => c,
        })
        .collect();
    STANDARD.decode(translated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_use_url_safe_substitutions() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet.
        assert_eq!(encode_cloudfront_base64(&[0xfb, 0xff]), "-_8~");
    }

    #[test]
    fn test_should_decode_both_alphabets() {
        assert_eq!(decode_cloudfront_base64("-_8~").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_cloudfront_base64("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_should_reject_invalid_text() {
        assert!(decode_cloudfront_base64("not base64!").is_err());
    }
}
