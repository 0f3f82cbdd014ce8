use crate::errors::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// The file name used by [`write_example`].
pub const EXAMPLE_FILE_NAME: &str = "exampleDict.json";

const EXAMPLE_CONTENT: &str = r#"{
    "target1":"replacement1",
    "target2":"replacement2"
}"#;

/// A source of `(pattern, replacement)` entries, merged into a rule set in the
/// order they are yielded.
pub trait MappingSource {
    /// A human-readable name used in warnings.
    fn name(&self) -> String;

    /// Loads every entry from the source.
    fn load(&self) -> Result<Vec<(String, String)>>;
}

/// A JSON dictionary file: a flat object mapping pattern strings to
/// replacement strings.
#[derive(Debug, Clone)]
pub struct JsonDictionary {
    path: PathBuf,
}

impl JsonDictionary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fail(&self, reason: impl Into<String>) -> Error {
        Error::DictionaryLoad {
            source_name: self.name(),
            reason: reason.into(),
        }
    }
}

impl MappingSource for JsonDictionary {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<(String, String)>> {
        let is_json = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "json");
        if !is_json {
            return Err(self.fail("expected a .json file"));
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.fail(e.to_string()))?;
        parse_dictionary(&content).map_err(|reason| self.fail(reason))
    }
}

/// Entries given directly in memory, such as those collected from the
/// command line or tests.
#[derive(Debug, Clone, Default)]
pub struct InlineMapping {
    label: String,
    entries: Vec<(String, String)>,
}

impl InlineMapping {
    pub fn new(label: impl Into<String>, entries: Vec<(String, String)>) -> Self {
        Self {
            label: label.into(),
            entries,
        }
    }
}

impl MappingSource for InlineMapping {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn load(&self) -> Result<Vec<(String, String)>> {
        Ok(self.entries.clone())
    }
}

/// Parses dictionary JSON, keeping the key order of the document.
fn parse_dictionary(content: &str) -> std::result::Result<Vec<(String, String)>, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let Value::Object(map) = value else {
        return Err("top level must be a JSON object".to_string());
    };

    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            other => Err(format!("value for '{key}' must be a string, found {other}")),
        })
        .collect()
}

/// Writes the two-entry example dictionary into `dir`, overwriting any
/// existing file of the same name.
pub fn write_example(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(EXAMPLE_FILE_NAME);
    fs::write(&path, EXAMPLE_CONTENT).map_err(|e| Error::file_access(&path, e))?;
    Ok(path)
}
