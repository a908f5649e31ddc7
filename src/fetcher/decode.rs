//! Charset detection and decoding for fetched pages.
//!
//! Sogou serves UTF-8 but older WeChat mirrors still answer in GBK, so the
//! body is decoded via header charset, then `<meta>` declarations, then a
//! chardetng guess over the first few KB.

use crate::fetcher::errors::FetchError;
use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

static HEADER_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

pub fn decode_body(content_type: &str, body: &[u8]) -> Result<(String, &'static str), FetchError> {
    let encoding = detect_encoding(content_type, body);
    let (decoded, used, had_errors) = encoding.decode(body);
    if had_errors {
        return Err(FetchError::Decode(format!(
            "body is not valid {}",
            used.name()
        )));
    }
    Ok((decoded.into_owned(), used.name()))
}

fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(enc) = HEADER_CHARSET_RE
        .captures(content_type)
        .and_then(|c| Encoding::for_label(c[1].to_lowercase().as_bytes()))
    {
        return enc;
    }

    // Meta declarations live in the first few KB if they exist at all.
    let head = &body[..body.len().min(4096)];
    let head_str = String::from_utf8_lossy(head);
    if let Some(enc) = META_CHARSET_RE
        .captures(&head_str)
        .and_then(|c| Encoding::for_label(c[1].to_lowercase().as_bytes()))
    {
        return enc;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, false);
    detector.guess(None, true)
}
