//! Decode reconstructor — a `serde::Deserializer` over the grouped
//! [`QueryNode`] tree.
//!
//! Every declared struct field is offered to the visitor. A field with no
//! wire keys under its name decodes from an absent node, which yields the
//! zero value of its type: `0`, `""`, `false`, `None`, an empty sequence or
//! map, a struct of zero fields, or the first variant of an enum. Excluded
//! fields always decode from an absent node; `#[serde(skip)]` fields are
//! never seen at all.
//!
//! Wire keys that no destination field claims are dropped (logged at
//! `trace`). Errors are fail-fast: the first token that does not parse
//! aborts the whole call.

use std::fmt;
use std::sync::Arc;

use serde::de::value::StrDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, Deserializer as _, Visitor};
use tracing::{trace, Level};

use crate::config::Config;
use crate::directive::{DirectiveCache, FieldDirective};
use crate::error::{QueryError, Result};
use crate::path;
use crate::scalar::{self, Scalar, ScalarError};
use crate::types::QueryNode;

/// Decode `T` from an already grouped tree.
pub(crate) fn from_node<T: DeserializeOwned>(root: &QueryNode, config: &Config) -> Result<T> {
    T::deserialize(NodeDeserializer {
        node: Some(root).filter(|n| !n.is_empty()),
        trail: Trail::Root,
        config,
    })
}

/// Path from the root to the value being decoded, kept for error messages.
#[derive(Clone, Copy)]
enum Trail<'a> {
    Root,
    Child(&'a Trail<'a>, Step<'a>),
}

#[derive(Clone, Copy)]
enum Step<'a> {
    Key(&'a str),
    Index(usize),
}

impl fmt::Display for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(k) => f.write_str(k),
            Step::Index(i) => write!(f, "{i}"),
        }
    }
}

impl<'a> Trail<'a> {
    fn is_root(&self) -> bool {
        matches!(self, Trail::Root)
    }

    fn render(&self, config: &Config) -> String {
        let mut steps = Vec::new();
        let mut cursor = self;
        while let Trail::Child(parent, step) = cursor {
            steps.push(*step);
            cursor = *parent;
        }
        path::describe(steps.into_iter().rev(), config.key_style)
    }
}

/// Parses a scalar for a method, falling back to `$zero` when the value is absent.
macro_rules! deserialize_scalars {
    ($($method:ident => $visit:ident($kind:literal, $parse:expr, $zero:expr);)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            let value = self.parse($kind, $parse, $zero)?;
            visitor.$visit(value)
        }
    )*};
}

macro_rules! scalar_methods {
    () => {
        deserialize_scalars! {
            deserialize_bool => visit_bool("bool", scalar::parse_bool, false);
            deserialize_i8 => visit_i8("i8", scalar::parse_int::<i8>, 0);
            deserialize_i16 => visit_i16("i16", scalar::parse_int::<i16>, 0);
            deserialize_i32 => visit_i32("i32", scalar::parse_int::<i32>, 0);
            deserialize_i64 => visit_i64("i64", scalar::parse_int::<i64>, 0);
            deserialize_i128 => visit_i128("i128", scalar::parse_int::<i128>, 0);
            deserialize_u8 => visit_u8("u8", scalar::parse_int::<u8>, 0);
            deserialize_u16 => visit_u16("u16", scalar::parse_int::<u16>, 0);
            deserialize_u32 => visit_u32("u32", scalar::parse_int::<u32>, 0);
            deserialize_u64 => visit_u64("u64", scalar::parse_int::<u64>, 0);
            deserialize_u128 => visit_u128("u128", scalar::parse_int::<u128>, 0);
            deserialize_f32 => visit_f32("f32", scalar::parse_float::<f32>, 0.0);
            deserialize_f64 => visit_f64("f64", scalar::parse_float::<f64>, 0.0);
            deserialize_char => visit_char("char", scalar::parse_char, '\0');
        }
    };
}

/// Deserializer for the (possibly absent) node at one path.
struct NodeDeserializer<'a> {
    node: Option<&'a QueryNode>,
    trail: Trail<'a>,
    config: &'a Config,
}

impl<'a> NodeDeserializer<'a> {
    fn key(&self) -> String {
        self.trail.render(self.config)
    }

    fn unsupported(&self, what: String) -> QueryError {
        QueryError::UnsupportedType {
            key: self.key(),
            what,
        }
    }

    /// The leaf text at this node, or `None` when the node is absent.
    fn leaf(&self, expected: &'static str) -> Result<Option<&'a str>> {
        if self.trail.is_root() {
            return Err(self.unsupported(format!("cannot decode a bare {expected} without a key")));
        }
        match self.node {
            None => Ok(None),
            Some(node) => match node.value() {
                Some(text) => Ok(Some(text)),
                None => Err(QueryError::TypeMismatch {
                    key: self.key(),
                    expected,
                    found: "nested keys".to_string(),
                }),
            },
        }
    }

    fn parse<T>(
        &self,
        kind: &'static str,
        parse: impl FnOnce(&str) -> std::result::Result<T, ScalarError>,
        zero: T,
    ) -> Result<T> {
        match self.leaf(kind)? {
            None => Ok(zero),
            Some(text) => parse(text).map_err(|e| e.at(self.key(), kind, text)),
        }
    }

    /// Children keyed by index. With `fixed`, exactly that many slots and
    /// larger indices are ignored; otherwise the length grows to the largest
    /// index seen, bounded by `max_sequence_len`.
    fn elements(&self, fixed: Option<usize>) -> Result<Vec<Option<&'a QueryNode>>> {
        let mut elements = vec![None; fixed.unwrap_or(0)];
        let Some(node) = self.node else {
            return Ok(elements);
        };
        for (segment, child) in node.children() {
            let Ok(index) = segment.parse::<usize>() else {
                trace!(key = %self.key(), segment, "ignoring non-index key in sequence");
                continue;
            };
            match fixed {
                Some(len) if index >= len => {
                    trace!(key = %self.key(), index, "ignoring index past fixed length");
                    continue;
                }
                Some(_) => {}
                None if index >= self.config.max_sequence_len => {
                    return Err(QueryError::SequenceTooLong {
                        key: self.key(),
                        index,
                        limit: self.config.max_sequence_len,
                    });
                }
                None if index >= elements.len() => elements.resize(index + 1, None),
                None => {}
            }
            elements[index] = Some(child);
        }
        Ok(elements)
    }

    fn trace_unknown_fields(&self, node: &QueryNode, fields: &'static [&'static str]) {
        let cache = DirectiveCache::global();
        for (segment, _) in node.children() {
            let claimed = fields.iter().any(|&field| {
                let directive = cache.get(field);
                directive.included && directive.name == segment
            });
            if !claimed {
                trace!(key = %self.key(), segment, "ignoring unknown key");
            }
        }
    }
}

impl<'de, 'a> de::Deserializer<'de> for NodeDeserializer<'a> {
    type Error = QueryError;

    /// Self-describing decode: groups become maps, leaves are typed by inference.
    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            None if self.trail.is_root() => self.deserialize_map(visitor),
            None => visitor.visit_unit(),
            Some(node) if node.has_children() => self.deserialize_map(visitor),
            Some(node) => match node.value() {
                None => visitor.visit_unit(),
                Some(text) => visit_inferred(text, visitor),
            },
        }
    }

    scalar_methods!();

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let text = self.leaf("string")?.unwrap_or_default();
        visitor.visit_str(text)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.node {
            None => visitor.visit_none(),
            Some(_) => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let elements = self.elements(None)?;
        visitor.visit_seq(SeqAccess::new(elements, self.trail, self.config))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        let elements = self.elements(Some(len))?;
        visitor.visit_seq(SeqAccess::new(elements, self.trail, self.config))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let entries: Vec<(&'a str, &'a QueryNode)> = self
            .node
            .map(|node| node.children().collect())
            .unwrap_or_default();
        visitor.visit_map(MapAccess {
            entries: entries.into_iter(),
            pending: None,
            trail: self.trail,
            config: self.config,
        })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if let Some(node) = self.node {
            if tracing::enabled!(Level::TRACE) {
                self.trace_unknown_fields(node, fields);
            }
        }
        visitor.visit_map(StructAccess {
            fields: fields.iter(),
            node: self.node,
            pending: None,
            trail: self.trail,
            config: self.config,
        })
    }

    /// `k=Variant` selects a unit variant and `k[Variant]...` a newtype
    /// variant. An absent enum is its first variant with a zero payload.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let (variant, payload) = match self.node {
            None => match variants.first() {
                Some(first) => (*first, None),
                None => return Err(self.unsupported(format!("enum {name} has no variants"))),
            },
            Some(node) => match node.children().next() {
                Some((variant, payload)) => (variant, Some(payload)),
                None => (node.value().unwrap_or_default(), None),
            },
        };
        visitor.visit_enum(EnumAccess {
            variant,
            payload,
            trail: self.trail,
            config: self.config,
        })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

fn visit_inferred<'de, V: Visitor<'de>>(text: &str, visitor: V) -> Result<V::Value> {
    match scalar::infer(text) {
        Scalar::Bool(b) => visitor.visit_bool(b),
        Scalar::Uint(u) => match u64::try_from(u) {
            Ok(u) => visitor.visit_u64(u),
            Err(_) => visitor.visit_u128(u),
        },
        Scalar::Int(i) => match i64::try_from(i) {
            Ok(i) => visitor.visit_i64(i),
            Err(_) => visitor.visit_i128(i),
        },
        Scalar::F32(f) => visitor.visit_f32(f),
        Scalar::F64(f) => visitor.visit_f64(f),
        Scalar::Char(c) => visitor.visit_char(c),
        Scalar::Str(s) => visitor.visit_str(s),
    }
}

struct SeqAccess<'a> {
    elements: std::vec::IntoIter<Option<&'a QueryNode>>,
    index: usize,
    trail: Trail<'a>,
    config: &'a Config,
}

impl<'a> SeqAccess<'a> {
    fn new(elements: Vec<Option<&'a QueryNode>>, trail: Trail<'a>, config: &'a Config) -> Self {
        Self {
            elements: elements.into_iter(),
            index: 0,
            trail,
            config,
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqAccess<'_> {
    type Error = QueryError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        let Some(node) = self.elements.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(NodeDeserializer {
            node,
            trail: Trail::Child(&self.trail, Step::Index(index)),
            config: self.config,
        })
        .map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.elements.len())
    }
}

struct MapAccess<'a> {
    entries: std::vec::IntoIter<(&'a str, &'a QueryNode)>,
    pending: Option<(&'a str, &'a QueryNode)>,
    trail: Trail<'a>,
    config: &'a Config,
}

impl<'de> de::MapAccess<'de> for MapAccess<'_> {
    type Error = QueryError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some((key, node)) = self.entries.next() else {
            return Ok(None);
        };
        self.pending = Some((key, node));
        seed.deserialize(KeyDeserializer {
            text: key,
            trail: Trail::Child(&self.trail, Step::Key(key)),
            config: self.config,
        })
        .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (key, node) = self
            .pending
            .take()
            .ok_or_else(|| QueryError::Message("map value requested before its key".into()))?;
        seed.deserialize(NodeDeserializer {
            node: Some(node),
            trail: Trail::Child(&self.trail, Step::Key(key)),
            config: self.config,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

/// Walks the declared fields of a struct, pairing each with its wire group.
struct StructAccess<'a> {
    fields: std::slice::Iter<'static, &'static str>,
    node: Option<&'a QueryNode>,
    pending: Option<(Arc<FieldDirective>, Option<&'a QueryNode>)>,
    trail: Trail<'a>,
    config: &'a Config,
}

impl<'de> de::MapAccess<'de> for StructAccess<'_> {
    type Error = QueryError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some(&field) = self.fields.next() else {
            return Ok(None);
        };
        let directive = DirectiveCache::global().get(field);
        let child = if directive.included {
            self.node.and_then(|node| node.child(&directive.name))
        } else {
            None
        };
        self.pending = Some((directive, child));
        seed.deserialize(StrDeserializer::<QueryError>::new(field))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (directive, node) = self
            .pending
            .take()
            .ok_or_else(|| QueryError::Message("field value requested before its name".into()))?;
        seed.deserialize(NodeDeserializer {
            node,
            trail: Trail::Child(&self.trail, Step::Key(&directive.name)),
            config: self.config,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

struct EnumAccess<'a> {
    variant: &'a str,
    payload: Option<&'a QueryNode>,
    trail: Trail<'a>,
    config: &'a Config,
}

impl EnumAccess<'_> {
    fn unsupported(&self, kind: &str) -> QueryError {
        QueryError::UnsupportedType {
            key: self.trail.render(self.config),
            what: format!("{kind} variant {}", self.variant),
        }
    }
}

impl<'de, 'a> de::EnumAccess<'de> for EnumAccess<'a> {
    type Error = QueryError;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self)> {
        let value = seed.deserialize(StrDeserializer::<QueryError>::new(self.variant))?;
        Ok((value, self))
    }
}

impl<'de> de::VariantAccess<'de> for EnumAccess<'_> {
    type Error = QueryError;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(NodeDeserializer {
            node: self.payload,
            trail: Trail::Child(&self.trail, Step::Key(self.variant)),
            config: self.config,
        })
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value> {
        Err(self.unsupported("tuple"))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        Err(self.unsupported("struct"))
    }
}

/// Deserializer for a map key: the key text parsed as a scalar.
struct KeyDeserializer<'a> {
    text: &'a str,
    trail: Trail<'a>,
    config: &'a Config,
}

impl KeyDeserializer<'_> {
    fn parse<T>(
        &self,
        kind: &'static str,
        parse: impl FnOnce(&str) -> std::result::Result<T, ScalarError>,
        _zero: T,
    ) -> Result<T> {
        parse(self.text).map_err(|e| e.at(self.trail.render(self.config), kind, self.text))
    }

    fn reject<T>(&self, what: &str) -> Result<T> {
        Err(QueryError::UnsupportedType {
            key: self.trail.render(self.config),
            what: format!("map keys must be scalars, found {what}"),
        })
    }
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'_> {
    type Error = QueryError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_str(self.text)
    }

    scalar_methods!();

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_str(self.text)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_str(self.text)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        self.reject("bytes")
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        self.reject("bytes")
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        self.reject("unit")
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _visitor: V,
    ) -> Result<V::Value> {
        self.reject(name)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        self.reject("a sequence")
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value> {
        self.reject("a tuple")
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value> {
        self.reject(name)
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
        self.reject("a map")
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        self.reject(name)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(EnumAccess {
            variant: self.text,
            payload: None,
            trail: self.trail,
            config: self.config,
        })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_str(self.text)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}
