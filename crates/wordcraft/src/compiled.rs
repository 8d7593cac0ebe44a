use std::ops::Range;

use crate::{
    bits::{self, REGISTER_BITS, REGISTER_BYTES},
    concurrent,
    errors::{Location, SchemaError, ValueError},
    field::{BitFieldDecl, WordDecl, WordType},
    schema::Validation,
    value::{Kind, Value, WordValue},
};

/// Word lengths must be a multiple of this many bits.
pub const WORD_LENGTH_FACTOR: usize = 8;
pub const WORD_LENGTH_MIN: usize = 8;
pub const WORD_LENGTH_MAX: usize = REGISTER_BITS;

/// Parses a length tag: a non-negative decimal integer, optionally padded with ASCII whitespace.
///
/// Anything after the digits is rejected rather than ignored, so `"4bits"` is malformed.
fn parse_length(tag: Option<&str>, at: &Location) -> Result<usize, SchemaError> {
    let tag = tag.ok_or_else(|| SchemaError::NoTag { at: at.clone() })?;
    let digits = tag.trim_matches(|c: char| c.is_ascii_whitespace());

    let malformed = || SchemaError::MalformedTag {
        at: at.clone(),
        tag: tag.to_string(),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    digits.parse().map_err(|_| malformed())
}

/// One bit field of a compiled word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFieldMetadata {
    name: String,
    kind: Kind,
    length: usize,
    /// Position of the field's least-significant bit in the working register.
    offset: usize,
}

impl BitFieldMetadata {
    /// Validates a bit field declaration. `at` locates the owning word.
    ///
    /// The offset is left at 0; the owning word assigns it.
    pub fn compile(decl: &BitFieldDecl, at: &Location) -> Result<Self, SchemaError> {
        let at = at.clone().bit_field(&decl.name);

        let kind =
            Kind::from_type_name(&decl.type_name).ok_or_else(|| SchemaError::UnsupportedType {
                at: at.clone(),
                type_name: decl.type_name.clone(),
            })?;

        let length = parse_length(decl.tag.as_deref(), &at)?;

        if length > kind.capacity() {
            return Err(SchemaError::LengthOverflow {
                at,
                length,
                kind,
                capacity: kind.capacity(),
            });
        }

        Ok(BitFieldMetadata {
            name: decl.name.clone(),
            kind,
            length,
            offset: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Register bits this field occupies.
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// Returns the field's contribution to the register: `value` masked to
    /// `length` bits and shifted up to `offset`. Excess high bits are dropped.
    pub fn marshal(&self, value: Value) -> u64 {
        bits::place(value.to_bits(), self.length, self.offset)
    }

    /// Reads this field out of an 8-byte big-endian register buffer.
    pub fn unmarshal(&self, register: &[u8; REGISTER_BYTES]) -> Value {
        let raw = bits::extract(u64::from_be_bytes(*register), self.length, self.offset);
        Value::from_bits(self.kind, raw)
    }
}

/// A compiled word: bit fields that exactly tile `length_in_bits`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordMetadata {
    name: String,
    length_in_bits: usize,
    length_in_bytes: usize,
    bit_fields: Vec<BitFieldMetadata>,
}

impl WordMetadata {
    /// Validates a word declaration and lays out its bit fields, first declared
    /// field in the most-significant bits. `at` locates the owning format.
    pub fn compile(
        decl: &WordDecl,
        at: &Location,
        validation: Validation,
    ) -> Result<Self, SchemaError> {
        let at = at.clone().word(&decl.name);

        let fields = match &decl.ty {
            WordType::Struct(fields) => fields,
            WordType::Other(type_name) => {
                return Err(SchemaError::NotStruct {
                    at,
                    type_name: type_name.clone(),
                });
            }
        };

        let length_in_bits = parse_length(decl.tag.as_deref(), &at)?;

        if length_in_bits % WORD_LENGTH_FACTOR != 0
            || !(WORD_LENGTH_MIN..=WORD_LENGTH_MAX).contains(&length_in_bits)
        {
            return Err(SchemaError::IncompatibleLength {
                at,
                length: length_in_bits,
            });
        }

        if fields.is_empty() {
            return Err(SchemaError::NoBitFields { at });
        }

        let mut bit_fields = match validation {
            Validation::FailFast => fields
                .iter()
                .map(|field| BitFieldMetadata::compile(field, &at))
                .collect::<Result<Vec<_>, _>>()?,
            Validation::CollectAll => {
                concurrent::compile_each(fields, |field| BitFieldMetadata::compile(field, &at))?
            }
        };

        let sum: usize = bit_fields.iter().map(|field| field.length).sum();
        if sum != length_in_bits {
            return Err(SchemaError::LengthMismatch {
                at,
                declared: length_in_bits,
                sum,
            });
        }

        let mut remaining = length_in_bits;
        for field in &mut bit_fields {
            remaining -= field.length;
            field.offset = remaining;
        }

        Ok(WordMetadata {
            name: decl.name.clone(),
            length_in_bits,
            length_in_bytes: length_in_bits / WORD_LENGTH_FACTOR,
            bit_fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length_in_bits(&self) -> usize {
        self.length_in_bits
    }

    pub fn length_in_bytes(&self) -> usize {
        self.length_in_bytes
    }

    pub fn bit_fields(&self) -> &[BitFieldMetadata] {
        &self.bit_fields
    }

    /// Index of the bit field called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.bit_fields.iter().position(|field| field.name == name)
    }

    /// Packs `value` into exactly `length_in_bytes` bytes.
    pub fn marshal<W: WordValue + ?Sized>(&self, value: &W) -> Result<Vec<u8>, ValueError> {
        self.marshal_at(value, &Location::default())
    }

    /// Unpacks one word from `bytes` into `target`.
    ///
    /// A window shorter than 8 bytes is left-padded with zeros; a longer one
    /// contributes its first 8 bytes.
    pub fn unmarshal<W: WordValue + ?Sized>(
        &self,
        bytes: &[u8],
        target: &mut W,
    ) -> Result<(), ValueError> {
        self.unmarshal_at(bytes, target, &Location::default())
    }

    pub(crate) fn marshal_at<W: WordValue + ?Sized>(
        &self,
        value: &W,
        at: &Location,
    ) -> Result<Vec<u8>, ValueError> {
        let mut register = 0u64;

        for (index, field) in self.bit_fields.iter().enumerate() {
            let v = value.get(index).ok_or_else(|| ValueError::MissingField {
                at: at.clone().word(&self.name),
                index,
            })?;

            if v.kind() != field.kind {
                return Err(ValueError::KindMismatch {
                    at: at.clone().word(&self.name).bit_field(&field.name),
                    expected: field.kind,
                    actual: v.kind(),
                });
            }

            register |= field.marshal(v);
        }

        Ok(bits::low_bytes(register, self.length_in_bytes))
    }

    pub(crate) fn unmarshal_at<W: WordValue + ?Sized>(
        &self,
        bytes: &[u8],
        target: &mut W,
        at: &Location,
    ) -> Result<(), ValueError> {
        let register = bits::pad_register(bytes);

        for (index, field) in self.bit_fields.iter().enumerate() {
            if !target.set(index, field.unmarshal(&register)) {
                return Err(ValueError::Rejected {
                    at: at.clone().word(&self.name).bit_field(&field.name),
                    kind: field.kind,
                });
            }
        }

        Ok(())
    }
}
