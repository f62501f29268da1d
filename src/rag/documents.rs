//! Passage store aligned with the vector index: passage `i` belongs to vector `i`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::core::errors::RagError;

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    passages: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PassageLine {
    Text(String),
    Record { text: String },
}

impl From<PassageLine> for String {
    fn from(line: PassageLine) -> Self {
        match line {
            PassageLine::Text(text) | PassageLine::Record { text } => text,
        }
    }
}

impl DocumentStore {
    pub fn new(passages: Vec<String>) -> Self {
        Self { passages }
    }

    /// Load a JSON array of strings, or JSON Lines when the file ends in `.jsonl`.
    pub fn load(path: &Path) -> Result<Self, RagError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| RagError::ResourceUnavailable(format!("{}: {}", path.display(), e)))?;

        let is_jsonl = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

        let passages = if is_jsonl {
            parse_json_lines(&contents)
        } else {
            parse_json_array(&contents)
        }
        .map_err(|e| RagError::ResourceUnavailable(format!("{}: {}", path.display(), e)))?;

        Ok(Self { passages })
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passage for a neighbor id. Negative and past-the-end ids are out of range.
    pub fn get(&self, id: i64) -> Result<&str, RagError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.passages.get(idx))
            .map(String::as_str)
            .ok_or(RagError::IndexOutOfRange {
                id,
                len: self.passages.len(),
            })
    }
}

fn parse_json_array(contents: &str) -> Result<Vec<String>, RagError> {
    let lines: Vec<PassageLine> = serde_json::from_str(contents).map_err(RagError::unavailable)?;
    Ok(lines.into_iter().map(String::from).collect())
}

fn parse_json_lines(contents: &str) -> Result<Vec<String>, RagError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<PassageLine>(line)
                .map(String::from)
                .map_err(|e| RagError::ResourceUnavailable(format!("line {}: {}", number + 1, e)))
        })
        .collect()
}
