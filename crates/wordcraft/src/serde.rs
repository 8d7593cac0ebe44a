//! Serde-deserializable format description.
//!
//! These types mirror [crate::field::FormatDecl] in a shape that reads
//! naturally as JSON (or any other serde format). Convert them with `Into`,
//! or compile straight to [crate::schema::FormatMetadata] with `TryFrom`.
//!
//! ```json
//! {
//!   "name": "Packet",
//!   "words": [
//!     {
//!       "name": "header",
//!       "length": 16,
//!       "bit_fields": [
//!         { "name": "version", "type": "u8", "length": 4 },
//!         { "name": "urgent", "type": "bool", "length": 1 },
//!         { "name": "size", "type": "u16", "length": "11" }
//!       ]
//!     }
//!   ],
//!   "options": { "validation": "CollectAll" }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Word type name that denotes a struct of bit fields.
pub const STRUCT_TYPE: &str = "struct";

/// A length, either as a number or as a raw tag string checked at compile time.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LengthDef {
    Bits(u64),
    Tag(String),
}

impl LengthDef {
    pub fn into_tag(self) -> String {
        match self {
            LengthDef::Bits(bits) => bits.to_string(),
            LengthDef::Tag(tag) => tag,
        }
    }
}

/// Top-level format definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FormatDef {
    pub name: String,
    /// Words in record order.
    pub words: Vec<WordDef>,
    #[serde(default)]
    pub options: Option<CompileOptionsDef>,
}

/// Description of one word.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WordDef {
    pub name: String,
    /// Word length in bits.
    #[serde(default)]
    pub length: Option<LengthDef>,
    /// Defaults to [STRUCT_TYPE]. Any other value describes a word that will not compile.
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    /// Bit fields, most significant first.
    #[serde(default)]
    pub bit_fields: Option<Vec<BitFieldDef>>,
}

/// Description of one bit field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BitFieldDef {
    pub name: String,
    /// Rust type name: `bool`, `u8`, `u16`, `u32`, `u64` or `usize`.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub length: Option<LengthDef>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub enum ValidationDef {
    #[default]
    FailFast,
    CollectAll,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct CompileOptionsDef {
    #[serde(default)]
    pub validation: ValidationDef,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::SchemaError,
        field::{BitFieldDecl, FormatDecl, WordDecl, WordType},
        schema::FormatMetadata,
        value::{Kind, Record, Value},
    };

    const PACKET: &str = r#"{
        "name": "Packet",
        "words": [
            {
                "name": "header",
                "length": 16,
                "bit_fields": [
                    { "name": "version", "type": "u8", "length": 4 },
                    { "name": "urgent", "type": "bool", "length": 1 },
                    { "name": "size", "type": "u16", "length": "11" }
                ]
            },
            {
                "name": "crc",
                "length": 8,
                "bit_fields": [{ "name": "value", "type": "u8", "length": 8 }]
            }
        ]
    }"#;

    #[test]
    fn test_format_def_into_decl() {
        let def: FormatDef = serde_json::from_str(PACKET).unwrap();
        let decl: FormatDecl = def.into();

        assert_eq!(decl.name, "Packet");
        assert_eq!(
            decl.words[0],
            WordDecl::new(
                "header",
                16,
                vec![
                    BitFieldDecl::new("version", Kind::U8, 4),
                    BitFieldDecl::new("urgent", Kind::Bool, 1),
                    BitFieldDecl::new("size", Kind::U16, 11),
                ],
            )
        );
    }

    #[test]
    fn test_compile_from_json() {
        let def: FormatDef = serde_json::from_str(PACKET).unwrap();
        let format = FormatMetadata::try_from(def).unwrap();

        let record = Record::new(vec![
            vec![Value::U8(0b1010), Value::Bool(true), Value::U16(0x5A5)],
            vec![Value::U8(0x7E)],
        ]);
        assert_eq!(format.marshal(&record).unwrap(), vec![0xAD, 0xA5, 0x7E]);
    }

    #[test]
    fn test_non_struct_word_type() {
        let def: WordDef =
            serde_json::from_str(r#"{ "name": "raw", "type": "u32", "length": 32 }"#).unwrap();
        let decl: WordDecl = def.into();
        assert_eq!(decl.ty, WordType::Other("u32".to_string()));
    }

    #[test]
    fn test_missing_length_is_no_tag() {
        let def: FormatDef = serde_json::from_str(
            r#"{
                "name": "F",
                "words": [{ "name": "w", "bit_fields": [{ "name": "a", "type": "u8", "length": 8 }] }]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            FormatMetadata::try_from(def),
            Err(SchemaError::NoTag { .. })
        ));
    }

    #[test]
    fn test_options_collect_all() {
        let def: FormatDef = serde_json::from_str(
            r#"{
                "name": "F",
                "words": [
                    { "name": "a", "length": 8, "bit_fields": [{ "name": "x", "type": "i8", "length": 8 }] },
                    { "name": "b", "length": "wide", "bit_fields": [] }
                ],
                "options": { "validation": "CollectAll" }
            }"#,
        )
        .unwrap();

        let Err(SchemaError::Multiple(list)) = FormatMetadata::try_from(def) else {
            panic!("expected aggregated error");
        };
        assert_eq!(list.len(), 2);
    }
}
