//! Format metadata: the compiled form of a [FormatDecl], used to marshal values to bytes and back.

use tracing::{debug, trace};

use crate::{
    compiled::WordMetadata,
    concurrent,
    errors::{Location, SchemaError, ValueError},
    field::{Declared, FormatDecl},
    value::{FormatValue, Record, Value, WordValue},
};

/// How declaration errors are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validation {
    /// Validate sequentially and stop at the first error.
    #[default]
    FailFast,
    /// Validate sibling words and bit fields concurrently and report every error.
    CollectAll,
}

/// Options for [FormatMetadata::compile_with].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub validation: Validation,
}

impl CompileOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_validation(&mut self, validation: Validation) -> &mut Self {
        self.validation = validation;
        self
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::CompileOptionsDef> for CompileOptions {
    fn from(value: crate::serde::CompileOptionsDef) -> Self {
        CompileOptions {
            validation: match value.validation {
                crate::serde::ValidationDef::FailFast => Validation::FailFast,
                crate::serde::ValidationDef::CollectAll => Validation::CollectAll,
            },
        }
    }
}

/// A compiled record layout: words in declared order.
///
/// Compile once with [FormatMetadata::compile], then call [FormatMetadata::marshal]
/// and [FormatMetadata::unmarshal] as often as needed. The metadata is immutable
/// and can be shared between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatMetadata {
    name: String,
    length_in_bytes: usize,
    words: Vec<WordMetadata>,
}

impl FormatMetadata {
    /// Compiles `decl`, stopping at the first error.
    pub fn compile(decl: &FormatDecl) -> Result<Self, SchemaError> {
        Self::compile_with(decl, &CompileOptions::default())
    }

    pub fn compile_with(decl: &FormatDecl, options: &CompileOptions) -> Result<Self, SchemaError> {
        let result = Self::build(decl, options.validation);

        match &result {
            Ok(format) => debug!(
                format = %format.name,
                words = format.words.len(),
                bytes = format.length_in_bytes,
                "compiled format"
            ),
            Err(e) => debug!(format = %decl.name, error = %e, "format failed to compile"),
        }

        result
    }

    /// Compiles the layout a [Declared] type publishes.
    pub fn of<T: Declared>() -> Result<Self, SchemaError> {
        Self::compile(&T::declare())
    }

    fn build(decl: &FormatDecl, validation: Validation) -> Result<Self, SchemaError> {
        let at = Location::format(&decl.name);

        if decl.words.is_empty() {
            return Err(SchemaError::NoWords { at });
        }

        let words = match validation {
            Validation::FailFast => decl
                .words
                .iter()
                .map(|word| WordMetadata::compile(word, &at, validation))
                .collect::<Result<Vec<_>, _>>()?,
            Validation::CollectAll => concurrent::compile_each(&decl.words, |word| {
                WordMetadata::compile(word, &at, validation)
            })?,
        };

        Ok(FormatMetadata {
            name: decl.name.clone(),
            length_in_bytes: words.iter().map(WordMetadata::length_in_bytes).sum(),
            words,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of a marshaled record.
    pub fn length_in_bytes(&self) -> usize {
        self.length_in_bytes
    }

    pub fn words(&self) -> &[WordMetadata] {
        &self.words
    }

    pub fn word(&self, name: &str) -> Option<&WordMetadata> {
        self.words.iter().find(|word| word.name() == name)
    }

    /// Resolves a word and bit field name to `(word index, field index)`.
    pub fn position(&self, word: &str, bit_field: &str) -> Option<(usize, usize)> {
        let index = self.words.iter().position(|w| w.name() == word)?;
        let field = self.words[index].position(bit_field)?;
        Some((index, field))
    }

    /// Encodes `value` word by word. Values wider than their field are truncated.
    pub fn marshal<V: FormatValue + ?Sized>(&self, value: &V) -> Result<Vec<u8>, ValueError> {
        let at = Location::format(&self.name);
        let mut bytes = Vec::with_capacity(self.length_in_bytes);

        for (index, word) in self.words.iter().enumerate() {
            let word_value = value.word(index).ok_or_else(|| ValueError::MissingWord {
                at: at.clone().word(word.name()),
                index,
            })?;

            bytes.extend(word.marshal_at(word_value, &at)?);
        }

        trace!(format = %self.name, bytes = bytes.len(), "marshaled record");

        Ok(bytes)
    }

    /// Decodes `bytes` into `target`, each word taking its own bytes from the front.
    ///
    /// Short input is not an error: a word that runs out of bytes decodes what
    /// is left, zero-padded on the left. Bytes past the record are ignored.
    ///
    /// A `target` missing a word or bit field is rejected before anything is
    /// written. If the accessor refuses a decoded value, the words before the
    /// failing one have already been updated.
    pub fn unmarshal<V: FormatValue + ?Sized>(
        &self,
        bytes: &[u8],
        target: &mut V,
    ) -> Result<(), ValueError> {
        let at = Location::format(&self.name);
        self.check_shape(target, &at)?;

        let mut rest = bytes;

        for (index, word) in self.words.iter().enumerate() {
            let (window, tail) = rest.split_at(word.length_in_bytes().min(rest.len()));

            let word_value = target.word_mut(index).ok_or_else(|| ValueError::MissingWord {
                at: at.clone().word(word.name()),
                index,
            })?;

            word.unmarshal_at(window, word_value, &at)?;
            rest = tail;
        }

        trace!(
            format = %self.name,
            bytes = bytes.len(),
            expected = self.length_in_bytes,
            "unmarshaled record"
        );

        Ok(())
    }

    fn check_shape<V: FormatValue + ?Sized>(&self, value: &V, at: &Location) -> Result<(), ValueError> {
        for (index, word) in self.words.iter().enumerate() {
            let word_value = value.word(index).ok_or_else(|| ValueError::MissingWord {
                at: at.clone().word(word.name()),
                index,
            })?;

            let fields = word.bit_fields().len();
            if let Some(field) = (0..fields).find(|&i| word_value.get(i).is_none()) {
                return Err(ValueError::MissingField {
                    at: at.clone().word(word.name()),
                    index: field,
                });
            }
        }

        Ok(())
    }

    /// A [Record] shaped like this format with every field zero or `false`.
    pub fn zeroed(&self) -> Record {
        Record::new(
            self.words
                .iter()
                .map(|word| {
                    word.bit_fields()
                        .iter()
                        .map(|field| Value::zero(field.kind()))
                        .collect()
                })
                .collect(),
        )
    }

    /// Unmarshals `bytes` into a fresh [Record].
    pub fn decode(&self, bytes: &[u8]) -> Result<Record, ValueError> {
        let mut record = self.zeroed();
        self.unmarshal(bytes, &mut record)?;
        Ok(record)
    }
}

#[cfg(feature = "serde")]
impl TryFrom<crate::serde::FormatDef> for FormatMetadata {
    type Error = SchemaError;

    fn try_from(value: crate::serde::FormatDef) -> Result<Self, Self::Error> {
        let options: CompileOptions = value.options.clone().map(Into::into).unwrap_or_default();
        FormatMetadata::compile_with(&value.into(), &options)
    }
}
