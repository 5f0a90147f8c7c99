/// A decoded text-format message: an ordered list of fields.
///
/// Field order is kept as read so the JSON encoding comes out deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// bare identifier, i.e. an enum value
    Enum(String),
    /// string literal payload, kept as raw bytes since escapes may encode
    /// non-UTF-8 bytes-field content
    Bytes(Vec<u8>),
    Message(Message),
}

impl Message {
    /// all values recorded for `name`, in input order
    pub fn get<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldValue> {
        self.fields
            .iter()
            .filter(move |f| f.name == name)
            .map(|f| &f.value)
    }
}
