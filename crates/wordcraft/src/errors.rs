//! Error types for schema compilation and for marshaling values.

use std::fmt;

use thiserror::Error;

use crate::value::Kind;

/// Names the part of a declaration an error refers to.
///
/// Built at the error's creation site, outermost name first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub format: Option<String>,
    pub word: Option<String>,
    pub bit_field: Option<String>,
}

impl Location {
    pub fn format(name: impl Into<String>) -> Self {
        Location {
            format: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn word(mut self, name: impl Into<String>) -> Self {
        self.word = Some(name.into());
        self
    }

    pub fn bit_field(mut self, name: impl Into<String>) -> Self {
        self.bit_field = Some(name.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            ("format", &self.format),
            ("word", &self.word),
            ("bit field", &self.bit_field),
        ];

        let mut first = true;
        for (label, name) in parts {
            if let Some(name) = name {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{label} \"{name}\"")?;
                first = false;
            }
        }

        if first {
            f.write_str("schema")?;
        }

        Ok(())
    }
}

/// Errors produced when compiling declarations into metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Bit field type is not one of `bool`, `u8`, `u16`, `u32`, `u64`, `usize`.
    #[error("{at}: unsupported type \"{type_name}\"; a bit field must be bool, u8, u16, u32, u64 or usize")]
    UnsupportedType { at: Location, type_name: String },

    /// Declaration carries no length tag.
    #[error("{at}: missing length tag")]
    NoTag { at: Location },

    /// Length tag is not a non-negative decimal integer.
    #[error("{at}: malformed length tag \"{tag}\"; expected a non-negative decimal integer")]
    MalformedTag { at: Location, tag: String },

    /// Bit field is longer than its type can hold.
    #[error("{at}: length {length} overflows type \"{kind}\" of {capacity} bits")]
    LengthOverflow {
        at: Location,
        length: usize,
        kind: Kind,
        capacity: usize,
    },

    /// Word is declared over something other than a struct of bit fields.
    #[error("{at}: word of type \"{type_name}\" is not a struct of bit fields")]
    NotStruct { at: Location, type_name: String },

    /// Word length is not a multiple of 8 within [8, 64].
    #[error("{at}: word length {length} is not a multiple of 8 between 8 and 64")]
    IncompatibleLength { at: Location, length: usize },

    /// Word struct declares no bit fields.
    #[error("{at}: word has no bit fields")]
    NoBitFields { at: Location },

    /// Bit fields do not exactly tile the word.
    #[error("{at}: word length {declared} is not equal to the sum of its bit field lengths {sum}")]
    LengthMismatch {
        at: Location,
        declared: usize,
        sum: usize,
    },

    /// Format declares no words.
    #[error("{at}: format has no words")]
    NoWords { at: Location },

    /// Several independent failures collected in one pass.
    #[error("{0}")]
    Multiple(ErrorList),
}

/// Ordered error slots filled by independent validation units.
///
/// Renders every present error joined by [`ErrorList::SEPARATOR`]; empty slots are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    slots: Vec<Option<SchemaError>>,
}

impl ErrorList {
    pub const SEPARATOR: &'static str = "; ";

    /// Collects `slots` in order. A slot holding [`SchemaError::Multiple`] is
    /// spliced in place, so the list only ever holds individual failures.
    pub fn from_slots(slots: Vec<Option<SchemaError>>) -> Self {
        let mut flat = Vec::with_capacity(slots.len());

        for slot in slots {
            match slot {
                Some(SchemaError::Multiple(list)) => flat.extend(list.slots),
                slot => flat.push(slot),
            }
        }

        ErrorList { slots: flat }
    }

    /// Present errors in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaError> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Ok` when no slot holds an error, the error itself when exactly one does,
    /// [`SchemaError::Multiple`] otherwise.
    pub fn into_result(self) -> Result<(), SchemaError> {
        if self.len() > 1 {
            return Err(SchemaError::Multiple(self));
        }

        match self.slots.into_iter().flatten().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(Self::SEPARATOR)?;
            }
            write!(f, "{e}")?;
        }

        Ok(())
    }
}

/// Errors produced when a value does not have the shape its metadata describes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Value has no word at the position the format declares.
    #[error("{at}: value has no word at position {index}")]
    MissingWord { at: Location, index: usize },

    /// Word value has no bit field at the position the word declares.
    #[error("{at}: value has no bit field at position {index}")]
    MissingField { at: Location, index: usize },

    /// Bit field holds a value of another kind.
    #[error("{at}: expected a {expected} value, got {actual}")]
    KindMismatch {
        at: Location,
        expected: Kind,
        actual: Kind,
    },

    /// Word value refused to store a decoded bit field.
    #[error("{at}: value rejected a decoded {kind}")]
    Rejected { at: Location, kind: Kind },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let at = Location::format("Packet").word("header").bit_field("version");
        assert_eq!(
            at.to_string(),
            "format \"Packet\", word \"header\", bit field \"version\""
        );

        assert_eq!(Location::default().to_string(), "schema");
        assert_eq!(
            Location::default().word("header").to_string(),
            "word \"header\""
        );
    }

    #[test]
    fn test_unsupported_type_message() {
        let e = SchemaError::UnsupportedType {
            at: Location::format("Format").word("Word").bit_field("BitField"),
            type_name: "i32".to_string(),
        };

        assert_eq!(
            e.to_string(),
            "format \"Format\", word \"Word\", bit field \"BitField\": \
             unsupported type \"i32\"; a bit field must be bool, u8, u16, u32, u64 or usize"
        );
    }

    #[test]
    fn test_length_overflow_message() {
        let e = SchemaError::LengthOverflow {
            at: Location::format("Format").word("Word").bit_field("BitField"),
            length: 9,
            kind: Kind::U8,
            capacity: 8,
        };

        assert_eq!(
            e.to_string(),
            "format \"Format\", word \"Word\", bit field \"BitField\": \
             length 9 overflows type \"u8\" of 8 bits"
        );
    }

    #[test]
    fn test_error_list_skips_empty_slots() {
        let list = ErrorList::from_slots(vec![
            Some(SchemaError::NoTag {
                at: Location::format("F").word("a"),
            }),
            None,
            Some(SchemaError::NoBitFields {
                at: Location::format("F").word("b"),
            }),
            None,
        ]);

        assert_eq!(list.len(), 2);
        assert_eq!(
            list.to_string(),
            "format \"F\", word \"a\": missing length tag; \
             format \"F\", word \"b\": word has no bit fields"
        );
    }

    #[test]
    fn test_error_list_into_result() {
        assert_eq!(ErrorList::from_slots(vec![None, None]).into_result(), Ok(()));

        let single = SchemaError::NoWords {
            at: Location::format("F"),
        };
        assert_eq!(
            ErrorList::from_slots(vec![None, Some(single.clone())]).into_result(),
            Err(single.clone())
        );

        let many = ErrorList::from_slots(vec![Some(single.clone()), Some(single)]);
        assert!(matches!(
            many.into_result(),
            Err(SchemaError::Multiple(list)) if list.len() == 2
        ));
    }

    #[test]
    fn test_error_list_flattens_nested_lists() {
        let field = |name: &str| SchemaError::NoTag {
            at: Location::format("F").word("a").bit_field(name),
        };
        let inner = ErrorList::from_slots(vec![Some(field("x")), None, Some(field("y"))]);
        let word = SchemaError::NoBitFields {
            at: Location::format("F").word("b"),
        };

        let list = ErrorList::from_slots(vec![Some(SchemaError::Multiple(inner)), Some(word.clone())]);

        assert_eq!(list.len(), 3);
        assert!(list.iter().all(|e| !matches!(e, SchemaError::Multiple(_))));
        assert_eq!(list.iter().last(), Some(&word));
        assert_eq!(
            list.to_string(),
            "format \"F\", word \"a\", bit field \"x\": missing length tag; \
             format \"F\", word \"a\", bit field \"y\": missing length tag; \
             format \"F\", word \"b\": word has no bit fields"
        );
    }
}
