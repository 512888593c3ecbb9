//! Reusable encoding and decoding sessions.
//!
//! A session keeps its buffers between calls, but every call starts by
//! clearing them, so its result depends only on its own argument. Sessions
//! are not internally synchronised; use one per thread.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::de;
use crate::error::Result;
use crate::query::{self, PercentCodec, QueryCodec};
use crate::ser::PairWriter;
use crate::types::{EncodedPair, QueryNode};

/// Encodes values into query strings.
///
/// ```
/// use serde::Serialize;
/// use urlquery_core::Encoder;
///
/// #[derive(Serialize)]
/// struct Page {
///     #[serde(rename = "q")]
///     query: String,
///     #[serde(rename = "page,vip")]
///     page: u32,
/// }
///
/// let mut encoder = Encoder::new();
/// let page = Page { query: "rust serde".into(), page: 0 };
/// assert_eq!(encoder.marshal(&page).unwrap(), "q=rust%20serde&page=0");
/// ```
#[derive(Debug)]
pub struct Encoder<C = PercentCodec> {
    config: Config,
    codec: C,
    writer: PairWriter,
    buf: String,
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            writer: PairWriter::new(config.key_style),
            config,
            codec: PercentCodec,
            buf: String::new(),
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: QueryCodec> Encoder<C> {
    /// Replace the token escaper.
    pub fn with_codec<D: QueryCodec>(self, codec: D) -> Encoder<D> {
        Encoder {
            config: self.config,
            codec,
            writer: self.writer,
            buf: self.buf,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Encode `value` into an escaped query string.
    ///
    /// The returned text borrows the session buffer and is overwritten by the
    /// next call.
    pub fn marshal<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&str> {
        self.buf.clear();
        self.walk(value)?;
        query::join_pairs(&self.writer.pairs, &self.codec, &mut self.buf);
        Ok(&self.buf)
    }

    /// Encode `value` into unescaped pairs in traversal order.
    pub fn marshal_pairs<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&[EncodedPair]> {
        self.buf.clear();
        self.walk(value)?;
        Ok(&self.writer.pairs)
    }

    fn walk<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.writer.reset();
        let result = self.writer.write(value);
        if result.is_err() {
            self.writer.reset();
        }
        result?;
        debug!(pairs = self.writer.pairs.len(), "encoded value");
        Ok(())
    }
}

/// Decodes query strings into values.
///
/// ```
/// use serde::Deserialize;
/// use urlquery_core::Decoder;
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Page {
///     q: String,
///     page: u32,
///     tags: Vec<String>,
/// }
///
/// let mut decoder = Decoder::new();
/// let page: Page = decoder.unmarshal("q=rust&tags[1]=b&tags[0]=a").unwrap();
/// assert_eq!(
///     page,
///     Page { q: "rust".into(), page: 0, tags: vec!["a".into(), "b".into()] }
/// );
/// ```
#[derive(Debug)]
pub struct Decoder<C = PercentCodec> {
    config: Config,
    codec: C,
    pairs: Vec<EncodedPair>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            codec: PercentCodec,
            pairs: Vec::new(),
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: QueryCodec> Decoder<C> {
    /// Replace the token unescaper.
    pub fn with_codec<D: QueryCodec>(self, codec: D) -> Decoder<D> {
        Decoder {
            config: self.config,
            codec,
            pairs: self.pairs,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode an escaped query string into a new `T`.
    pub fn unmarshal<T: DeserializeOwned>(&mut self, text: &str) -> Result<T> {
        self.pairs.clear();
        query::split_pairs(text, &self.codec, &mut self.pairs)?;
        let root = QueryNode::from_pairs(self.pairs.drain(..), self.config.key_style);
        debug!(groups = root.children().count(), "decoding query string");
        de::from_node(&root, &self.config)
    }

    /// Decode into an existing value. `dest` is only replaced on success.
    pub fn unmarshal_into<T: DeserializeOwned>(&mut self, text: &str, dest: &mut T) -> Result<()> {
        *dest = self.unmarshal(text)?;
        Ok(())
    }

    /// Decode already unescaped pairs.
    pub fn unmarshal_pairs<T, I, K, V>(&mut self, pairs: I) -> Result<T>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let root = QueryNode::from_pairs(pairs, self.config.key_style);
        debug!(groups = root.children().count(), "decoding query pairs");
        de::from_node(&root, &self.config)
    }
}
