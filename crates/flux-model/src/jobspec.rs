//! Jobspec encodings.
//!
//! Jobspecs are usually authored as YAML and submitted as compact JSON: no whitespace,
//! `,` between elements and `:` between keys and values, every non-ASCII character escaped as
//! `\uXXXX` (UTF-16, lowercase hex). Mapping order of the source document is preserved so that
//! the same document always encodes to the same bytes.
//!
//! YAML is read with 1.2 core schema rules: only `true`/`false` are booleans, so a plain
//! `yes`, `no`, `on` or `off` stays a string.

use std::io;

use serde::Serialize;
use serde_json::{Serializer, Value, ser::Formatter};

use crate::ModelError;

/// Parse a YAML document and re-encode it as compact JSON.
pub fn yaml_to_json(yaml: &str) -> Result<String, ModelError> {
    let doc: Value = serde_yaml::from_str(yaml)?;
    encode(&doc)
}

/// Compact, ASCII-only JSON encoding of a structured jobspec.
pub fn encode(doc: &Value) -> Result<String, ModelError> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, AsciiFormatter);
    doc.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

/// Parse an encoded jobspec back into a document.
pub fn decode(encoded: &[u8]) -> Result<Value, ModelError> {
    Ok(serde_json::from_slice(encoded)?)
}

/// Compact formatter that escapes everything outside ASCII.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
