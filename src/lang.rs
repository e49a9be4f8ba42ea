//! Language catalog shared by the extension resolver and the content classifier.
//!
//! Every language the detector can report lives here exactly once, with its
//! display name and the file extensions that map to it. Display names are
//! cosmetic and never used as lookup keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// Identifier reported when neither the file name nor the content says anything.
pub const TEXT: &str = "text";

/// Built-in languages: (id, display name, extensions).
const BUILTIN_LANGUAGES: &[(&str, &str, &[&str])] = &[
    ("javascript", "JavaScript", &["js", "mjs", "cjs"]),
    ("jsx", "JSX", &["jsx"]),
    ("typescript", "TypeScript", &["ts", "mts", "cts"]),
    ("tsx", "TSX", &["tsx"]),
    ("python", "Python", &["py", "pyi"]),
    ("java", "Java", &["java"]),
    ("c", "C", &["c", "h"]),
    ("cpp", "C++", &["cpp", "cc", "cxx", "hpp"]),
    ("csharp", "C#", &["cs"]),
    ("ruby", "Ruby", &["rb"]),
    ("rust", "Rust", &["rs"]),
    ("go", "Go", &["go"]),
    ("php", "PHP", &["php"]),
    ("html", "HTML", &["html", "htm"]),
    ("css", "CSS", &["css"]),
    ("json", "JSON", &["json"]),
    ("markdown", "Markdown", &["md", "markdown"]),
    ("sql", "SQL", &["sql"]),
    (TEXT, "Plain Text", &[]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// A language identifier is a non-empty lowercase token.
pub fn is_language_id(id: &str) -> bool {
    !id.is_empty()
        && id.bytes().all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'+' | b'#' | b'-')
        })
}

/// Text after the last `.` of `file_name`, lower-cased. Empty when there is no dot.
pub fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Ordered set of languages with id and extension indexes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<LanguageEntry>,
    by_id: HashMap<String, usize>,
    by_extension: HashMap<String, usize>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for (id, name, extensions) in BUILTIN_LANGUAGES {
            catalog.upsert(LanguageEntry {
                id: id.to_string(),
                name: name.to_string(),
                extensions: extensions.iter().map(|e| e.to_string()).collect(),
            });
        }
        catalog
    }

    /// Add a language, or update an existing one.
    ///
    /// For a known id the display name is replaced and the extensions are
    /// added. An extension already owned by another language moves to this one.
    pub fn insert(&mut self, entry: LanguageEntry) -> Result<(), DetectError> {
        if !is_language_id(&entry.id) {
            return Err(DetectError::InvalidLanguageId(entry.id));
        }
        self.upsert(entry);
        Ok(())
    }

    fn upsert(&mut self, entry: LanguageEntry) {
        let LanguageEntry { id, name, extensions } = entry;

        let index = match self.by_id.get(&id) {
            Some(&index) => {
                self.entries[index].name = name;
                index
            }
            None => {
                let index = self.entries.len();
                self.by_id.insert(id.clone(), index);
                self.entries.push(LanguageEntry {
                    id,
                    name,
                    extensions: Vec::new(),
                });
                index
            }
        };

        for ext in extensions {
            let ext = ext.trim_start_matches('.').to_lowercase();
            if ext.is_empty() {
                continue;
            }
            if let Some(previous) = self.by_extension.insert(ext.clone(), index) {
                if previous != index {
                    self.entries[previous].extensions.retain(|e| e != &ext);
                }
            }
            if !self.entries[index].extensions.contains(&ext) {
                self.entries[index].extensions.push(ext);
            }
        }
    }

    /// Map a file name to a language id by its extension.
    ///
    /// Absence is a normal outcome: no dot, an empty extension and unknown
    /// extensions all return `None`.
    pub fn resolve(&self, file_name: &str) -> Option<&str> {
        let ext = extension_of(file_name);
        if ext.is_empty() {
            return None;
        }
        self.by_extension
            .get(&ext)
            .map(|&index| self.entries[index].id.as_str())
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.by_id
            .get(id)
            .map(|&index| self.entries[index].name.as_str())
    }

    /// Display name for `id`, or the id itself when none is registered.
    pub fn name_or_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.display_name(id).unwrap_or(id)
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
