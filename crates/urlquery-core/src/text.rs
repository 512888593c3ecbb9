//! `#[serde(with = "urlquery_core::text")]` for `String` fields that are
//! decoded through a `#[serde(flatten)]` container.
//!
//! serde buffers a flattened container's entries by asking for any value, so
//! a token such as `12` or `true` reaches the field as a number or a bool
//! rather than as text. Inference only types a token that formats back to
//! itself, so turning the scalar into a string again recovers the token
//! exactly.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
//! #[serde(default)]
//! struct Named {
//!     #[serde(with = "urlquery_core::text")]
//!     name: String,
//! }
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
//! #[serde(default)]
//! struct Plain {
//!     #[serde(flatten)]
//!     named: Named,
//!     r: u8,
//! }
//!
//! let back: Plain = urlquery_core::from_str("name=12&r=1").unwrap();
//! assert_eq!(back.named.name, "12");
//! ```

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value)
}

/// Accept text, or any scalar a self-describing decode inferred from text.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    deserializer.deserialize_any(TextVisitor)
}

struct TextVisitor;

impl Visitor<'_> for TextVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or a scalar inferred from one")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    // An absent field outside a flattened container.
    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }
}
