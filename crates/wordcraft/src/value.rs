//! Bit field kinds, the values they hold, and the accessor traits the codec reads and writes through.

use std::fmt;

/// Logical type of a bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    /// Platform-width unsigned integer.
    Usize,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Bool,
        Kind::U8,
        Kind::U16,
        Kind::U32,
        Kind::U64,
        Kind::Usize,
    ];

    /// Maximum bit length a field of this kind can declare.
    pub const fn capacity(self) -> usize {
        match self {
            Kind::Bool => 1,
            Kind::U8 => 8,
            Kind::U16 => 16,
            Kind::U32 => 32,
            Kind::U64 => 64,
            Kind::Usize => usize::BITS as usize,
        }
    }

    /// Rust type name, as used in declarations.
    pub const fn type_name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::Usize => "usize",
        }
    }

    /// Looks up a kind by Rust type name. `None` for anything unsupported.
    pub fn from_type_name(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|kind| kind.type_name() == name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A bit field value as read from or written to a caller's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::U8(_) => Kind::U8,
            Value::U16(_) => Kind::U16,
            Value::U32(_) => Kind::U32,
            Value::U64(_) => Kind::U64,
            Value::Usize(_) => Kind::Usize,
        }
    }

    /// Widens the value to 64 bits; `true` is 1.
    pub fn to_bits(self) -> u64 {
        match self {
            Value::Bool(v) => u64::from(v),
            Value::U8(v) => u64::from(v),
            Value::U16(v) => u64::from(v),
            Value::U32(v) => u64::from(v),
            Value::U64(v) => v,
            Value::Usize(v) => v as u64,
        }
    }

    /// Narrows `bits` to `kind`, truncating high bits. A bool is `true` only for exactly 1.
    pub fn from_bits(kind: Kind, bits: u64) -> Value {
        match kind {
            Kind::Bool => Value::Bool(bits == 1),
            Kind::U8 => Value::U8(bits as u8),
            Kind::U16 => Value::U16(bits as u16),
            Kind::U32 => Value::U32(bits as u32),
            Kind::U64 => Value::U64(bits),
            Kind::Usize => Value::Usize(bits as usize),
        }
    }

    pub fn zero(kind: Kind) -> Value {
        Value::from_bits(kind, 0)
    }
}

macro_rules! impl_from_primitive {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                Value::$variant(value)
            }
        }
    };
}

impl_from_primitive!(bool, Bool);
impl_from_primitive!(u8, U8);
impl_from_primitive!(u16, U16);
impl_from_primitive!(u32, U32);
impl_from_primitive!(u64, U64);
impl_from_primitive!(usize, Usize);

/// Positional access to the bit fields of one word value.
///
/// Positions follow the declared field order of the word.
pub trait WordValue {
    /// Current value of the bit field at `index`, or `None` if there is none.
    fn get(&self, index: usize) -> Option<Value>;

    /// Stores `value` into the bit field at `index`. Returns `false` if the
    /// position does not exist or the value's kind is not accepted there.
    fn set(&mut self, index: usize, value: Value) -> bool;
}

/// Positional access to the words of one format value.
pub trait FormatValue {
    fn word(&self, index: usize) -> Option<&dyn WordValue>;

    fn word_mut(&mut self, index: usize) -> Option<&mut dyn WordValue>;
}

impl WordValue for Vec<Value> {
    fn get(&self, index: usize) -> Option<Value> {
        self.as_slice().get(index).copied()
    }

    fn set(&mut self, index: usize, value: Value) -> bool {
        match self.as_mut_slice().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// A format value held as plain data: one `Vec<Value>` per word.
///
/// Useful when the record layout is only known at runtime. See
/// [`crate::schema::FormatMetadata::zeroed`] and [`crate::schema::FormatMetadata::decode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    words: Vec<Vec<Value>>,
}

impl Record {
    pub fn new(words: Vec<Vec<Value>>) -> Self {
        Record { words }
    }

    pub fn get(&self, word: usize, field: usize) -> Option<Value> {
        self.words.get(word)?.as_slice().get(field).copied()
    }

    /// Replaces one bit field value. Returns `false` if the position does not exist.
    pub fn set(&mut self, word: usize, field: usize, value: impl Into<Value>) -> bool {
        match self.words.get_mut(word) {
            Some(values) => WordValue::set(values, field, value.into()),
            None => false,
        }
    }

    pub fn words(&self) -> &[Vec<Value>] {
        &self.words
    }

    pub fn into_words(self) -> Vec<Vec<Value>> {
        self.words
    }
}

impl FormatValue for Record {
    fn word(&self, index: usize) -> Option<&dyn WordValue> {
        self.words.get(index).map(|w| w as &dyn WordValue)
    }

    fn word_mut(&mut self, index: usize) -> Option<&mut dyn WordValue> {
        self.words.get_mut(index).map(|w| w as &mut dyn WordValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        assert_eq!(Kind::Bool.capacity(), 1);
        assert_eq!(Kind::U8.capacity(), 8);
        assert_eq!(Kind::U16.capacity(), 16);
        assert_eq!(Kind::U32.capacity(), 32);
        assert_eq!(Kind::U64.capacity(), 64);
        assert_eq!(Kind::Usize.capacity(), usize::BITS as usize);
    }

    #[test]
    fn test_from_type_name() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_type_name(kind.type_name()), Some(kind));
        }

        assert_eq!(Kind::from_type_name("i32"), None);
        assert_eq!(Kind::from_type_name("U8"), None);
        assert_eq!(Kind::from_type_name(""), None);
    }

    #[test]
    fn test_to_bits() {
        assert_eq!(Value::Bool(true).to_bits(), 1);
        assert_eq!(Value::Bool(false).to_bits(), 0);
        assert_eq!(Value::U8(0xAB).to_bits(), 0xAB);
        assert_eq!(Value::U64(u64::MAX).to_bits(), u64::MAX);
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(Value::from_bits(Kind::Bool, 1), Value::Bool(true));
        assert_eq!(Value::from_bits(Kind::Bool, 0), Value::Bool(false));
        assert_eq!(Value::from_bits(Kind::Bool, 2), Value::Bool(false));
        assert_eq!(Value::from_bits(Kind::U8, 0x1FF), Value::U8(0xFF));
        assert_eq!(Value::from_bits(Kind::U32, 7), Value::U32(7));
    }

    #[test]
    fn test_record_access() {
        let mut record = Record::new(vec![
            vec![Value::U8(1), Value::Bool(false)],
            vec![Value::U16(2)],
        ]);

        assert_eq!(record.get(0, 1), Some(Value::Bool(false)));
        assert!(record.set(0, 1, true));
        assert_eq!(record.get(0, 1), Some(Value::Bool(true)));

        assert!(!record.set(0, 2, 1u8));
        assert!(!record.set(2, 0, 1u8));
        assert_eq!(record.get(1, 1), None);

        let word = record.word(1).unwrap();
        assert_eq!(word.get(0), Some(Value::U16(2)));
        assert!(record.word(2).is_none());
    }
}
