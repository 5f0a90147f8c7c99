/// JSON-encoding hints for the conformance fixture shape.
///
/// The converter only needs two things from the fixture schema: which fields
/// are repeated, so a single occurrence still renders as a JSON array, and
/// which fields hold bytes, so their payload is base64-encoded. The test
/// payload is otherwise passed through structurally.
pub struct Schema {
    repeated: &'static [&'static str],
    bytes: &'static [&'static str],
}

static CONFORMANCE: Schema = Schema {
    repeated: &[
        "section",
        "test",
        "type_env",
        "overloads",
        "values",
        "entries",
        "errors",
        "exprs",
        "arg_types",
        "parameter_types",
    ],
    bytes: &["bytes_value"],
};

impl Schema {
    /// the SimpleTestFile conformance fixture shape
    pub fn conformance() -> &'static Schema {
        &CONFORMANCE
    }

    pub fn is_repeated(&self, field: &str) -> bool {
        self.repeated.contains(&field)
    }

    pub fn is_bytes(&self, field: &str) -> bool {
        self.bytes.contains(&field)
    }
}
