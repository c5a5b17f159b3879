use std::fmt::Display;

use serde::de::value::{BorrowedStrDeserializer, Error, SeqDeserializer};
use serde::de::{self, DeserializeSeed, IntoDeserializer, MapAccess, Unexpected, Visitor};
use serde::{Deserializer, forward_to_deserialize_any};
use serde_json::{Map, Value};

use crate::FormValues;

/// Deserialize a map-like target from form values, falling back to the target's
/// current state (as JSON) for the fields that don't appear in the form values.
///
/// For each key:
///
/// - a sequence gets all the values, in order
/// - anything else gets the first value
pub(super) struct FormDeserializer<'de> {
    values: &'de FormValues,
    current: Option<&'de Map<String, Value>>,
}

impl<'de> FormDeserializer<'de> {
    pub(super) fn new(values: &'de FormValues, current: Option<&'de Map<String, Value>>) -> Self {
        Self { values, current }
    }
}

impl<'de> Deserializer<'de> for FormDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let values = self.values;
        let mut fields: Vec<(&'de str, Field<'de>)> = values
            .iter()
            .map(|(key, values)| (key, Field::Incoming(values)))
            .collect();
        if let Some(current) = self.current {
            fields.extend(
                current
                    .iter()
                    .filter(|(key, _)| !values.contains_key(key))
                    .map(|(key, value)| (key.as_str(), Field::Preserved(value))),
            );
        }
        visitor.visit_map(FieldsAccess {
            fields: fields.into_iter(),
            value: None,
        })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

enum Field<'de> {
    /// The values received with the request.
    Incoming(&'de [String]),
    /// The current value of a field that wasn't part of the request.
    Preserved(&'de Value),
}

struct FieldsAccess<'de> {
    fields: std::vec::IntoIter<(&'de str, Field<'de>)>,
    value: Option<Field<'de>>,
}

impl<'de> MapAccess<'de> for FieldsAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.fields.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(BorrowedStrDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(Field::Incoming(values)) => seed.deserialize(ValuesDeserializer { values }),
            Some(Field::Preserved(value)) => seed.deserialize(value).map_err(custom),
            None => Err(custom("value is missing")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

fn custom(msg: impl Display) -> Error {
    de::Error::custom(msg)
}

/// All the values received for a single key.
struct ValuesDeserializer<'de> {
    values: &'de [String],
}

impl<'de> ValuesDeserializer<'de> {
    fn first(&self) -> ValueDeserializer<'de> {
        ValueDeserializer {
            value: self.values.first().map(String::as_str).unwrap_or_default(),
        }
    }
}

macro_rules! forward_to_first {
    ($($trait_fn:ident)*) => {
        $(
            fn $trait_fn<V>(self, visitor: V) -> Result<V::Value, Self::Error>
            where
                V: Visitor<'de>,
            {
                self.first().$trait_fn(visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ValuesDeserializer<'de> {
    type Error = Error;

    forward_to_first! {
        deserialize_any deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32
        deserialize_i64 deserialize_i128 deserialize_u8 deserialize_u16 deserialize_u32
        deserialize_u64 deserialize_u128 deserialize_f32 deserialize_f64 deserialize_char
        deserialize_str deserialize_string deserialize_bytes deserialize_byte_buf
        deserialize_option deserialize_unit deserialize_map deserialize_identifier
        deserialize_ignored_any
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let values = self
            .values
            .iter()
            .map(|value| ValueDeserializer { value: value.as_str() });
        visitor.visit_seq(SeqDeserializer::new(values))
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_unit_struct<V>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.first().deserialize_unit_struct(name, visitor)
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.first().deserialize_struct(name, fields, visitor)
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.first().deserialize_enum(name, variants, visitor)
    }
}

macro_rules! parse_value {
    ($trait_fn:ident, $visit_fn:ident) => {
        fn $trait_fn<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: Visitor<'de>,
        {
            match self.value.parse() {
                Ok(v) => visitor.$visit_fn(v),
                Err(_) => Err(de::Error::invalid_value(
                    Unexpected::Str(self.value),
                    &visitor,
                )),
            }
        }
    };
}

/// A single value.
struct ValueDeserializer<'de> {
    value: &'de str,
}

impl<'de> IntoDeserializer<'de, Error> for ValueDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

impl<'de> Deserializer<'de> for ValueDeserializer<'de> {
    type Error = Error;

    parse_value!(deserialize_bool, visit_bool);
    parse_value!(deserialize_i8, visit_i8);
    parse_value!(deserialize_i16, visit_i16);
    parse_value!(deserialize_i32, visit_i32);
    parse_value!(deserialize_i64, visit_i64);
    parse_value!(deserialize_i128, visit_i128);
    parse_value!(deserialize_u8, visit_u8);
    parse_value!(deserialize_u16, visit_u16);
    parse_value!(deserialize_u32, visit_u32);
    parse_value!(deserialize_u64, visit_u64);
    parse_value!(deserialize_u128, visit_u128);
    parse_value!(deserialize_f32, visit_f32);
    parse_value!(deserialize_f64, visit_f64);
    parse_value!(deserialize_char, visit_char);

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.value)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_bytes(self.value.as_bytes())
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    /// An empty value is treated as a missing one.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        if self.value.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    /// Only unit variants can be expressed as a form value.
    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        BorrowedStrDeserializer::<Error>::new(self.value).deserialize_enum(name, variants, visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        str string identifier seq tuple tuple_struct map struct
    }
}
