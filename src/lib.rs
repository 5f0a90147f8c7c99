//! # textproto2json
//!
//! Converts protobuf text-format conformance fixtures into JSON files.
//!
//! The parser reads the text format without generated bindings; the JSON
//! encoder applies protobuf JSON conventions (lowerCamelCase field names,
//! repeated fields as arrays, enums as name strings, bytes as base64) so the
//! output can be decoded back against the fixture schema.
//!
//! ```
//! use textproto2json::{parse, JsonMessage, Schema};
//!
//! let msg = parse("name: \"basic\"").unwrap();
//! let json = JsonMessage::new(&msg, Schema::conformance())
//!     .to_pretty()
//!     .unwrap();
//! assert_eq!(json, "{\n  \"name\": \"basic\"\n}");
//! ```

mod convert;
mod error;
mod json;
mod lexer;
mod message;
mod parser;
mod schema;

pub use convert::{convert_all, FIXTURE_EXTENSION};
pub use error::{ConvertError, ParseError};
pub use json::JsonMessage;
pub use message::{Field, FieldValue, Message};
pub use parser::parse;
pub use schema::Schema;
