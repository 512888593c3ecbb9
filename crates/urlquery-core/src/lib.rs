//! # urlquery-core
//!
//! A serde codec between structured Rust values and flat URL query strings.
//!
//! Records, sequences, maps and options are flattened into `key=value` pairs
//! whose keys spell out the path to each scalar, and rebuilt from them on
//! decode:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use std::collections::BTreeMap;
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Child {
//!     #[serde(rename = "desc")]
//!     description: String,
//!     #[serde(rename = "Long,vip")]
//!     long: u16,
//!     #[serde(rename = "-")]
//!     height: i32,
//! }
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Info {
//!     name: String,
//!     child: Child,
//!     children: Vec<Child>,
//!     params: Option<BTreeMap<String, u32>>,
//! }
//!
//! let info = Info {
//!     name: "n".into(),
//!     child: Child { description: "c1".into(), long: 0, height: 20 },
//!     children: vec![Child { description: "d1".into(), long: 14, height: 0 }],
//!     params: None,
//! };
//!
//! let text = urlquery_core::to_string(&info).unwrap();
//! assert_eq!(
//!     text,
//!     "name=n&child%5Bdesc%5D=c1&child%5BLong%5D=0\
//!      &children%5B0%5D%5Bdesc%5D=d1&children%5B0%5D%5BLong%5D=14"
//! );
//!
//! let back: Info = urlquery_core::from_str(&text).unwrap();
//! assert_eq!(back.child.height, 0);
//! assert_eq!(back.params, None);
//! ```
//!
//! ## Field rules
//!
//! The serde name of a field is read as a directive, `name[,option]*`:
//! `#[serde(rename = "desc")]` renames, `#[serde(rename = "Long,vip")]`
//! keeps the field even when it is zero, and `#[serde(rename = "-")]`
//! excludes it. Fields at their zero value are otherwise omitted.
//! `#[serde(skip)]` fields are invisible in both directions, and
//! `#[serde(flatten)]` promotes an embedded struct's fields to the parent.
//!
//! serde decodes a struct holding a flatten field as a map and reports any
//! of its own fields that are missing from the input, so zero fields the
//! encoder omitted fail to decode unless that struct and every flattened
//! struct carry a container-level `#[serde(default)]`. Inside such a
//! struct:
//!
//! - its own fields are still read as directives on encode, but decode
//!   matches wire keys against the full serde name, so a field renamed
//!   `"Long,vip"` also needs `#[serde(alias = "Long")]` to be read back
//! - the flattened struct's values are typed by inference, so a `String`
//!   field whose text looks like a number or a bool needs
//!   `#[serde(with = "urlquery_core::text")]`
//!
//! ## Modules
//!
//! - [`session`] — [`Encoder`] and [`Decoder`], reusable across calls
//! - [`directive`] — field directive parsing and caching
//! - [`path`] — key building and splitting
//! - [`scalar`] — scalar formatting and parsing
//! - [`query`] — token escaping and pair splitting
//! - [`types`] — flat pairs and the grouped decode tree
//! - [`text`] — `String` fields under a flattened container
//! - [`config`] — key style and decode limits
//! - [`error`] — error types

mod de;
mod ser;

pub mod config;
pub mod directive;
pub mod error;
pub mod path;
pub mod query;
pub mod scalar;
pub mod session;
pub mod text;
pub mod types;

pub use config::{Config, KeyStyle};
pub use directive::FieldDirective;
pub use error::{QueryError, Result};
pub use path::PathSegment;
pub use query::{PercentCodec, QueryCodec};
pub use session::{Decoder, Encoder};
pub use types::{EncodedPair, QueryNode};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value into an escaped query string with the default [`Config`].
pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Encoder::new().marshal(value).map(str::to_owned)
}

/// Encode a value into unescaped pairs with the default [`Config`].
pub fn to_pairs<T: Serialize + ?Sized>(value: &T) -> Result<Vec<EncodedPair>> {
    Encoder::new().marshal_pairs(value).map(<[EncodedPair]>::to_vec)
}

/// Decode an escaped query string with the default [`Config`].
pub fn from_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    Decoder::new().unmarshal(text)
}

/// Decode already unescaped pairs with the default [`Config`].
pub fn from_pairs<T, I, K, V>(pairs: I) -> Result<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    Decoder::new().unmarshal_pairs(pairs)
}
