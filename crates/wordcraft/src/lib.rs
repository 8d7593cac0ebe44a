//! # wordcraft
//!
//! A declarative codec for fixed-width binary records packed at the bit level.
//!
//! A record (a *format*) is a sequence of *words*; each word is 8 to 64 bits
//! wide and is exactly tiled by *bit fields* of type `bool`, `u8`, `u16`,
//! `u32`, `u64` or `usize`. The first declared bit field occupies the most
//! significant bits of its word. Declarations are validated once, when they
//! are compiled into metadata; marshaling and unmarshaling afterwards are
//! plain bit arithmetic. Values wider than their field are truncated.
//!
//! ## Example
//!
//! ```
//! use wordcraft::field::{BitFieldDecl, FormatDecl, WordDecl};
//! use wordcraft::schema::FormatMetadata;
//! use wordcraft::value::{Kind, Record, Value};
//!
//! let decl = FormatDecl::new(
//!     "Status",
//!     vec![WordDecl::new(
//!         "flags",
//!         8,
//!         vec![
//!             BitFieldDecl::new("high", Kind::U8, 4),
//!             BitFieldDecl::new("low", Kind::U8, 4),
//!         ],
//!     )],
//! );
//! let format = FormatMetadata::compile(&decl).unwrap();
//!
//! let record = Record::new(vec![vec![Value::U8(0b1111), Value::U8(0)]]);
//! let bytes = format.marshal(&record).unwrap();
//! assert_eq!(bytes, vec![0xF0]);
//! assert_eq!(format.decode(&bytes).unwrap(), record);
//! ```

pub mod bits;
pub mod compiled;
mod concurrent;
pub mod errors;
pub mod field;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;
