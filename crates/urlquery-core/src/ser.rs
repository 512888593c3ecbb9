//! Encode walker — a `serde::Serializer` that flattens a value into ordered
//! `(key, value)` pairs.
//!
//! Dispatch by shape:
//!
//! - **Scalar**: one pair at the current path, unless it is zero and the
//!   enclosing field is not force-included
//! - **Option**: `None` contributes nothing; `Some` recurses at the same path
//!   and counts as present, so a present zero scalar is still written
//! - **Struct**: each field in declaration order under its directive name;
//!   excluded fields are skipped
//! - **Seq / tuple**: each element under its zero-based index
//! - **Map**: each entry under its scalar-formatted key. `#[serde(flatten)]`
//!   containers arrive here too, with no length, which is what promotes
//!   embedded fields to the parent's own path; their keys are field
//!   directives and follow the struct rules
//!
//! Tuple and struct enum variants, non-scalar map keys, and scalars with no
//! key at all are rejected with [`QueryError::UnsupportedType`].

use serde::ser::{self, Impossible, Serialize, Serializer as _};

use crate::config::KeyStyle;
use crate::directive::{DirectiveCache, FieldDirective};
use crate::error::{QueryError, Result};
use crate::path::{self, PathSegment};
use crate::scalar::Scalar;
use crate::types::EncodedPair;

/// Reusable output state for one encoding session.
#[derive(Debug, Default)]
pub(crate) struct PairWriter {
    pub(crate) pairs: Vec<EncodedPair>,
    path: Vec<PathSegment>,
    style: KeyStyle,
}

impl PairWriter {
    pub(crate) fn new(style: KeyStyle) -> Self {
        Self {
            pairs: Vec::new(),
            path: Vec::new(),
            style,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.pairs.clear();
        self.path.clear();
    }

    /// Serialize `value` from the root, appending its pairs.
    pub(crate) fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(ValueSerializer {
            writer: self,
            force: false,
        })
    }

    fn key(&self) -> String {
        path::describe(&self.path, self.style)
    }

    fn unsupported(&self, what: impl Into<String>) -> QueryError {
        QueryError::UnsupportedType {
            key: self.key(),
            what: what.into(),
        }
    }

    fn emit(&mut self, scalar: Scalar<'_>, force: bool) -> Result<()> {
        if self.path.is_empty() {
            return Err(self.unsupported("a scalar needs an enclosing record, sequence or map"));
        }
        if !force && scalar.is_zero() {
            return Ok(());
        }
        let key = path::render(&self.path, self.style);
        self.pairs.push((key, scalar.format().into_owned()));
        Ok(())
    }

    /// Run `f` with `segment` pushed onto the path.
    fn nested<F>(&mut self, segment: PathSegment, f: F) -> Result<()>
    where
        F: FnOnce(&mut PairWriter) -> Result<()>,
    {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }
}

/// Serializer for the value at the writer's current path.
///
/// `force` is the force-include flag inherited from the nearest enclosing
/// field; nested structs reset it from their own field directives.
struct ValueSerializer<'a> {
    writer: &'a mut PairWriter,
    force: bool,
}

impl<'a> ser::Serializer for ValueSerializer<'a> {
    type Ok = ();
    type Error = QueryError;

    type SerializeSeq = SeqSerializer<'a>;
    type SerializeTuple = SeqSerializer<'a>;
    type SerializeTupleStruct = SeqSerializer<'a>;
    type SerializeTupleVariant = Impossible<(), QueryError>;
    type SerializeMap = MapSerializer<'a>;
    type SerializeStruct = StructSerializer<'a>;
    type SerializeStructVariant = Impossible<(), QueryError>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.writer.emit(Scalar::Bool(v), self.force)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i128(i128::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i128(i128::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i128(i128::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.serialize_i128(i128::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.writer.emit(Scalar::Int(v), self.force)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u128(u128::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u128(u128::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u128(u128::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.serialize_u128(u128::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.writer.emit(Scalar::Uint(v), self.force)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.writer.emit(Scalar::F32(v), self.force)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.writer.emit(Scalar::F64(v), self.force)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.writer.emit(Scalar::Char(v), self.force)
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.writer.emit(Scalar::Str(v), self.force)
    }

    /// Bytes are a sequence of `u8`.
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        let force = self.force;
        for (i, byte) in v.iter().enumerate() {
            self.writer.nested(PathSegment::Index(i), |w| {
                w.emit(Scalar::Uint(u128::from(*byte)), force)
            })?;
        }
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        value.serialize(ValueSerializer {
            writer: self.writer,
            force: true,
        })
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.writer.emit(Scalar::Str(variant), self.force)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        let force = self.force;
        self.writer
            .nested(PathSegment::Name(variant.to_string()), |writer| {
                value.serialize(ValueSerializer { writer, force })
            })
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<SeqSerializer<'a>> {
        Ok(SeqSerializer {
            writer: self.writer,
            force: self.force,
            index: 0,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer<'a>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqSerializer<'a>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self
            .writer
            .unsupported(format!("tuple variant {name}::{variant}")))
    }

    /// serde's derive opens a `#[serde(flatten)]` container with no length,
    /// while real maps report theirs, so an unsized map reads its keys as
    /// field directives.
    fn serialize_map(self, len: Option<usize>) -> Result<MapSerializer<'a>> {
        Ok(MapSerializer {
            writer: self.writer,
            force: self.force,
            directives: len.is_none(),
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<StructSerializer<'a>> {
        Ok(StructSerializer {
            writer: self.writer,
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self
            .writer
            .unsupported(format!("struct variant {name}::{variant}")))
    }
}

struct SeqSerializer<'a> {
    writer: &'a mut PairWriter,
    force: bool,
    index: usize,
}

impl SeqSerializer<'_> {
    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let force = self.force;
        let index = self.index;
        self.index += 1;
        self.writer.nested(PathSegment::Index(index), |writer| {
            value.serialize(ValueSerializer { writer, force })
        })
    }
}

impl ser::SerializeSeq for SeqSerializer<'_> {
    type Ok = ();
    type Error = QueryError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTuple for SeqSerializer<'_> {
    type Ok = ();
    type Error = QueryError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for SeqSerializer<'_> {
    type Ok = ();
    type Error = QueryError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

struct MapSerializer<'a> {
    writer: &'a mut PairWriter,
    force: bool,
    directives: bool,
    key: Option<PendingKey>,
}

/// Key of the entry whose value comes next.
enum PendingKey {
    Entry(PathSegment, bool),
    Excluded,
}

impl ser::SerializeMap for MapSerializer<'_> {
    type Ok = ();
    type Error = QueryError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        let key = key.serialize(MapKeySerializer {
            writer: &*self.writer,
        })?;
        self.key = Some(if self.directives {
            let directive = FieldDirective::from_serde_name(&key);
            if directive.included {
                let force = directive.force_include();
                PendingKey::Entry(PathSegment::Name(directive.name), force)
            } else {
                PendingKey::Excluded
            }
        } else {
            PendingKey::Entry(PathSegment::MapKey(key), self.force)
        });
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let key = self
            .key
            .take()
            .ok_or_else(|| QueryError::Message("map value serialized before its key".into()))?;
        match key {
            PendingKey::Entry(segment, force) => self
                .writer
                .nested(segment, |writer| value.serialize(ValueSerializer { writer, force })),
            PendingKey::Excluded => Ok(()),
        }
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

struct StructSerializer<'a> {
    writer: &'a mut PairWriter,
}

impl ser::SerializeStruct for StructSerializer<'_> {
    type Ok = ();
    type Error = QueryError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        let directive = DirectiveCache::global().get(key);
        if !directive.included {
            return Ok(());
        }
        let force = directive.force_include();
        self.writer
            .nested(PathSegment::Name(directive.name.clone()), |writer| {
                value.serialize(ValueSerializer { writer, force })
            })
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Formats a map key as a scalar. Anything that is not a scalar is rejected.
struct MapKeySerializer<'a> {
    writer: &'a PairWriter,
}

impl MapKeySerializer<'_> {
    fn scalar(self, scalar: Scalar<'_>) -> Result<String> {
        Ok(scalar.format().into_owned())
    }

    fn reject(self, what: &str) -> QueryError {
        self.writer
            .unsupported(format!("map keys must be scalars, found {what}"))
    }
}

impl ser::Serializer for MapKeySerializer<'_> {
    type Ok = String;
    type Error = QueryError;

    type SerializeSeq = Impossible<String, QueryError>;
    type SerializeTuple = Impossible<String, QueryError>;
    type SerializeTupleStruct = Impossible<String, QueryError>;
    type SerializeTupleVariant = Impossible<String, QueryError>;
    type SerializeMap = Impossible<String, QueryError>;
    type SerializeStruct = Impossible<String, QueryError>;
    type SerializeStructVariant = Impossible<String, QueryError>;

    fn serialize_bool(self, v: bool) -> Result<String> {
        self.scalar(Scalar::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        self.scalar(Scalar::Int(i128::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        self.scalar(Scalar::Int(i128::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        self.scalar(Scalar::Int(i128::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        self.scalar(Scalar::Int(i128::from(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<String> {
        self.scalar(Scalar::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        self.scalar(Scalar::Uint(u128::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        self.scalar(Scalar::Uint(u128::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        self.scalar(Scalar::Uint(u128::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        self.scalar(Scalar::Uint(u128::from(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<String> {
        self.scalar(Scalar::Uint(v))
    }

    fn serialize_f32(self, v: f32) -> Result<String> {
        self.scalar(Scalar::F32(v))
    }

    fn serialize_f64(self, v: f64) -> Result<String> {
        self.scalar(Scalar::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<String> {
        self.scalar(Scalar::Char(v))
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(self.reject("bytes"))
    }

    fn serialize_none(self) -> Result<String> {
        Err(self.reject("an absent option"))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String> {
        Err(self.reject("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<String> {
        Err(self.reject(name))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String> {
        Err(self.reject(name))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(self.reject("a sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(self.reject("a tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(self.reject(name))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.reject(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(self.reject("a map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(self.reject(name))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.reject(name))
    }
}
