use crate::domain::{AcwfError, AcwfResult};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::Path;

const JSON_INDENT: &[u8] = b"    ";

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

/// Renders `value` as JSON indented by four spaces.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> AcwfResult<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer).map_err(|source| {
        AcwfError::internal("SYS.JSON_SERIALIZE", format!("failed to serialize JSON: {}", source))
    })?;
    String::from_utf8(buffer).map_err(|source| {
        AcwfError::internal("SYS.JSON_SERIALIZE", format!("serialized JSON is not UTF-8: {}", source))
    })
}

pub fn write_json_artifact<T: Serialize + ?Sized>(path: &Path, value: &T) -> AcwfResult<()> {
    let content = to_pretty_json(value)?;
    write_text_artifact(path, &content).map_err(|source| {
        AcwfError::io_system(
            "IO.JSON_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

pub fn read_json_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> AcwfResult<T> {
    let content = fs::read_to_string(path).map_err(|source| {
        AcwfError::io_system(
            "IO.JSON_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    serde_json::from_str(&content).map_err(|source| {
        AcwfError::input_validation(
            "INPUT.JSON_PARSE",
            format!("failed to parse '{}': {}", path.display(), source),
        )
    })
}
