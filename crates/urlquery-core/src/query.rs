//! The query-string layer: escaping of individual tokens and splitting/joining
//! of `key=value` pairs on `&`.
//!
//! The walkers never escape bytes themselves. They produce or consume
//! already-segmented pairs and delegate escaping to a [`QueryCodec`].

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{QueryError, Result};
use crate::types::EncodedPair;

/// Everything but the RFC 3986 unreserved characters is escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Lossless escaping of one key or value token.
///
/// `unescape(escape(s)) == s` must hold for every string.
pub trait QueryCodec {
    fn escape<'a>(&self, raw: &'a str) -> Cow<'a, str>;

    fn unescape<'a>(&self, token: &'a str) -> Result<Cow<'a, str>>;
}

/// Percent-encoding codec. Escapes with `%XX`; on decode `+` is also read as
/// a space, as HTML forms produce it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentCodec;

impl QueryCodec for PercentCodec {
    fn escape<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        utf8_percent_encode(raw, COMPONENT).into()
    }

    fn unescape<'a>(&self, token: &'a str) -> Result<Cow<'a, str>> {
        let invalid = || QueryError::InvalidEncoding {
            token: token.to_string(),
        };
        if token.contains('+') {
            let spaced = token.replace('+', " ");
            let decoded = percent_decode_str(&spaced)
                .decode_utf8()
                .map_err(|_| invalid())?;
            Ok(Cow::Owned(decoded.into_owned()))
        } else {
            percent_decode_str(token).decode_utf8().map_err(|_| invalid())
        }
    }
}

/// Append `k1=v1&k2=v2...` to `out`, escaping every token.
pub fn join_pairs<C>(pairs: &[EncodedPair], codec: &C, out: &mut String)
where
    C: QueryCodec + ?Sized,
{
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(&codec.escape(key));
        out.push('=');
        out.push_str(&codec.escape(value));
    }
}

/// Split a query string into unescaped pairs, appending them to `out`.
///
/// A leading `?` is ignored, empty tokens are skipped, and a token without
/// `=` is a key with an empty value.
pub fn split_pairs<C>(text: &str, codec: &C, out: &mut Vec<EncodedPair>) -> Result<()>
where
    C: QueryCodec + ?Sized,
{
    let text = text.strip_prefix('?').unwrap_or(text);
    for token in text.split('&').filter(|t| !t.is_empty()) {
        let (key, value) = token.split_once('=').unwrap_or((token, ""));
        out.push((
            codec.unescape(key)?.into_owned(),
            codec.unescape(value)?.into_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_reserved_characters() {
        let codec = PercentCodec;
        assert_eq!(codec.escape("a=b&c d"), "a%3Db%26c%20d");
        assert_eq!(codec.escape("child[desc]"), "child%5Bdesc%5D");
        assert_eq!(codec.escape("safe-._~"), "safe-._~");
        assert_eq!(codec.escape("测试"), "%E6%B5%8B%E8%AF%95");
    }

    #[test]
    fn unescape_reads_plus_as_space() {
        let codec = PercentCodec;
        assert_eq!(codec.unescape("a+b%2Bc").unwrap(), "a b+c");
    }

    #[test]
    fn unescape_rejects_invalid_utf8() {
        let err = PercentCodec.unescape("%FF").unwrap_err();
        assert!(matches!(err, QueryError::InvalidEncoding { .. }));
    }

    #[test]
    fn split_and_join() {
        let mut pairs = Vec::new();
        split_pairs("?a=1&&b&c=x%3Dy", &PercentCodec, &mut pairs).unwrap();
        assert_eq!(
            pairs,
            [
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), String::new()),
                ("c".to_string(), "x=y".to_string()),
            ]
        );

        let mut out = String::new();
        join_pairs(&pairs, &PercentCodec, &mut out);
        assert_eq!(out, "a=1&b=&c=x%3Dy");
    }
}
