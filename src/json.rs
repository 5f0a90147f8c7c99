use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::message::{FieldValue, Message};
use crate::schema::Schema;

/// Serializes a decoded fixture with protobuf JSON conventions: lowerCamelCase
/// field names, repeated fields as arrays, enums as name strings, bytes as
/// base64, non-finite doubles as `"Infinity"` / `"-Infinity"` / `"NaN"`.
pub struct JsonMessage<'a> {
    msg: &'a Message,
    schema: &'a Schema,
}

impl<'a> JsonMessage<'a> {
    pub fn new(msg: &'a Message, schema: &'a Schema) -> Self {
        Self { msg, schema }
    }

    /// pretty-printed JSON text, matching the output format the consumer
    /// decodes fixtures back from
    pub fn to_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for JsonMessage<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // group occurrences by field name, first-appearance order
        let mut groups: Vec<(&str, Vec<&FieldValue>)> = Vec::new();
        for field in &self.msg.fields {
            match groups.iter_mut().find(|(name, _)| *name == field.name) {
                Some((_, vals)) => vals.push(&field.value),
                None => groups.push((field.name.as_str(), vec![&field.value])),
            }
        }

        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for (name, vals) in groups {
            let key = json_name(name);
            if self.schema.is_repeated(name) || vals.len() > 1 {
                map.serialize_entry(
                    &key,
                    &JsonList {
                        vals,
                        field: name,
                        schema: self.schema,
                    },
                )?;
            } else {
                map.serialize_entry(
                    &key,
                    &JsonValue {
                        val: vals[0],
                        field: name,
                        schema: self.schema,
                    },
                )?;
            }
        }
        map.end()
    }
}

struct JsonList<'a> {
    vals: Vec<&'a FieldValue>,
    field: &'a str,
    schema: &'a Schema,
}

impl Serialize for JsonList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.vals.len()))?;
        for &val in &self.vals {
            seq.serialize_element(&JsonValue {
                val,
                field: self.field,
                schema: self.schema,
            })?;
        }
        seq.end()
    }
}

struct JsonValue<'a> {
    val: &'a FieldValue,
    field: &'a str,
    schema: &'a Schema,
}

impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.val {
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Uint(v) => serializer.serialize_u64(*v),
            FieldValue::Float(v) if v.is_nan() => serializer.serialize_str("NaN"),
            FieldValue::Float(v) if *v == f64::INFINITY => serializer.serialize_str("Infinity"),
            FieldValue::Float(v) if *v == f64::NEG_INFINITY => {
                serializer.serialize_str("-Infinity")
            }
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Enum(v) => serializer.serialize_str(v),
            FieldValue::Bytes(b) => {
                if self.schema.is_bytes(self.field) {
                    serializer.serialize_str(&STANDARD.encode(b))
                } else {
                    match std::str::from_utf8(b) {
                        Ok(text) => serializer.serialize_str(text),
                        // string literal decoded to non-UTF-8 bytes
                        Err(_) => serializer.serialize_str(&STANDARD.encode(b)),
                    }
                }
            }
            FieldValue::Message(m) => JsonMessage::new(m, self.schema).serialize(serializer),
        }
    }
}

/// protobuf JSON name rule: drop underscores, uppercase the letter after each;
/// bracketed extension names pass through verbatim
fn json_name(name: &str) -> String {
    if name.starts_with('[') {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::Value;

    fn to_json(src: &str) -> Value {
        let msg = parse(src).expect("fixture parses");
        let text = JsonMessage::new(&msg, Schema::conformance())
            .to_pretty()
            .expect("serializes");
        serde_json::from_str(&text).expect("output is valid JSON")
    }

    #[test]
    fn field_names_are_camel_cased() {
        assert_eq!(json_name("int64_value"), "int64Value");
        assert_eq!(json_name("disable_macros"), "disableMacros");
        assert_eq!(json_name("name"), "name");
        assert_eq!(json_name("[cel.expr.ext]"), "[cel.expr.ext]");
    }

    #[test]
    fn repeated_singleton_renders_as_array() {
        let json = to_json(r#"section { name: "s" }"#);
        assert_eq!(json["section"][0]["name"], "s");
        assert_eq!(json["section"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn multiple_occurrences_render_as_array() {
        let json = to_json("unknown_field: 1 unknown_field: 2");
        assert_eq!(json["unknownField"], serde_json::json!([1, 2]));
    }

    #[test]
    fn enums_render_as_strings() {
        let json = to_json("primitive: INT64");
        assert_eq!(json["primitive"], "INT64");
    }

    #[test]
    fn non_finite_doubles_render_as_strings() {
        let json = to_json("a: inf b: -inf c: nan");
        assert_eq!(json["a"], "Infinity");
        assert_eq!(json["b"], "-Infinity");
        assert_eq!(json["c"], "NaN");
    }

    #[test]
    fn bytes_fields_are_base64() {
        let json = to_json("bytes_value: \"\\x00\\x01\"");
        assert_eq!(json["bytesValue"], "AAE=");
    }

    #[test]
    fn non_utf8_payload_falls_back_to_base64() {
        let json = to_json("blob: \"\\xff\"");
        assert_eq!(json["blob"], "/w==");
    }

    #[test]
    fn field_order_is_first_appearance() {
        let msg = parse("b: 1 a: 2").unwrap();
        let text = JsonMessage::new(&msg, Schema::conformance())
            .to_pretty()
            .unwrap();
        assert_eq!(text, "{\n  \"b\": 1,\n  \"a\": 2\n}");
    }
}
