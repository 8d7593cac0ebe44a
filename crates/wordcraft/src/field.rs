//! Declarations of formats, words and bit fields, compiled by [crate::schema::FormatMetadata].

use crate::value::Kind;

/// A single named bit field inside a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFieldDecl {
    /// Name used in diagnostics and in [crate::schema::FormatMetadata::position].
    pub name: String,
    /// Rust type name of the field, e.g. `"u8"` or `"bool"`.
    pub type_name: String,
    /// Bit length as a decimal string. `None` means the field was declared without one.
    pub tag: Option<String>,
}

impl BitFieldDecl {
    pub fn new(name: impl Into<String>, kind: Kind, length: usize) -> Self {
        BitFieldDecl {
            name: name.into(),
            type_name: kind.type_name().to_string(),
            tag: Some(length.to_string()),
        }
    }

    /// Declares a field by type name with no length tag. The type is checked at compile time.
    pub fn of_type(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        BitFieldDecl {
            name: name.into(),
            type_name: type_name.into(),
            tag: None,
        }
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.set_tag(tag);
        self
    }
}

/// What a word is declared over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordType {
    /// A struct whose fields are the word's bit fields, most significant first.
    Struct(Vec<BitFieldDecl>),
    /// Any other type, named for diagnostics. Never compiles.
    Other(String),
}

/// A fixed-width group of bit fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDecl {
    pub name: String,
    pub ty: WordType,
    /// Word length in bits as a decimal string.
    pub tag: Option<String>,
}

impl WordDecl {
    pub fn new(name: impl Into<String>, length: usize, fields: Vec<BitFieldDecl>) -> Self {
        WordDecl {
            name: name.into(),
            ty: WordType::Struct(fields),
            tag: Some(length.to_string()),
        }
    }

    /// Declares a word over a non-struct type. Only useful for describing foreign schemas.
    pub fn of_type(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        WordDecl {
            name: name.into(),
            ty: WordType::Other(type_name.into()),
            tag: None,
        }
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.set_tag(tag);
        self
    }

    /// Appends a bit field. A non-struct word becomes a struct word first.
    pub fn push(&mut self, field: BitFieldDecl) -> &mut Self {
        match &mut self.ty {
            WordType::Struct(fields) => fields.push(field),
            WordType::Other(_) => self.ty = WordType::Struct(vec![field]),
        }
        self
    }
}

/// An ordered sequence of words forming one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDecl {
    pub name: String,
    pub words: Vec<WordDecl>,
}

impl FormatDecl {
    pub fn new(name: impl Into<String>, words: Vec<WordDecl>) -> Self {
        FormatDecl {
            name: name.into(),
            words,
        }
    }

    pub fn push(&mut self, word: WordDecl) -> &mut Self {
        self.words.push(word);
        self
    }
}

/// Implemented by record types that know their own layout.
///
/// ```
/// use wordcraft::field::{BitFieldDecl, Declared, FormatDecl, WordDecl};
/// use wordcraft::value::Kind;
///
/// struct Flags;
///
/// impl Declared for Flags {
///     fn declare() -> FormatDecl {
///         FormatDecl::new(
///             "Flags",
///             vec![WordDecl::new(
///                 "bits",
///                 8,
///                 vec![
///                     BitFieldDecl::new("ready", Kind::Bool, 1),
///                     BitFieldDecl::new("level", Kind::U8, 7),
///                 ],
///             )],
///         )
///     }
/// }
///
/// let format = wordcraft::schema::FormatMetadata::of::<Flags>().unwrap();
/// assert_eq!(format.length_in_bytes(), 1);
/// ```
pub trait Declared {
    fn declare() -> FormatDecl;
}

#[cfg(feature = "serde")]
impl From<crate::serde::BitFieldDef> for BitFieldDecl {
    fn from(value: crate::serde::BitFieldDef) -> Self {
        BitFieldDecl {
            name: value.name,
            type_name: value.type_name,
            tag: value.length.map(crate::serde::LengthDef::into_tag),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::WordDef> for WordDecl {
    fn from(value: crate::serde::WordDef) -> Self {
        let ty = match value.type_name {
            Some(type_name) if type_name != crate::serde::STRUCT_TYPE => WordType::Other(type_name),
            _ => WordType::Struct(
                value
                    .bit_fields
                    .unwrap_or_default()
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            ),
        };

        WordDecl {
            name: value.name,
            ty,
            tag: value.length.map(crate::serde::LengthDef::into_tag),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FormatDef> for FormatDecl {
    fn from(value: crate::serde::FormatDef) -> Self {
        FormatDecl {
            name: value.name,
            words: value.words.into_iter().map(Into::into).collect(),
        }
    }
}
