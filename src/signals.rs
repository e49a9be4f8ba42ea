//! Weighted regex signals used by the content classifier.
//!
//! Each signal ties a pattern to one language. The list is ordered: when two
//! languages end up with the same score, the one whose first signal fired
//! earlier in the list wins.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::lang::is_language_id;

/// Compiled program size cap for a single signal pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Built-in signals: (pattern, language, weight, case-insensitive).
///
/// Word characters are spelled `[0-9A-Za-z_]` so identifiers are matched on
/// ASCII only; `\w` would also accept non-ASCII letters.
const BUILTIN_SIGNALS: &[(&str, &str, u32, bool)] = &[
    (r#"import\s+[{]?[0-9A-Za-z_\s,]*[}]?\s+from\s+['"][0-9A-Za-z_/@-]+['"]"#, "javascript", 5, false),
    (r"function\s+[0-9A-Za-z_]+\s*\([^)]*\)\s*\{", "javascript", 3, false),
    (r"const\s+[0-9A-Za-z_]+\s*=\s*\([^)]*\)\s*=>", "javascript", 4, false),
    (r"import\s+React", "jsx", 6, false),
    (r"<[A-Z][A-Za-z]*\s+[^>]*>", "jsx", 5, false),
    (r"interface\s+[0-9A-Za-z_]+\s*\{", "typescript", 6, false),
    (r":\s*[0-9A-Za-z_]+\[\]", "typescript", 5, false),
    (r"<[0-9A-Za-z_]+[^>]*>[\s\S]*</[0-9A-Za-z_]+>", "html", 3, false),
    (r#"class="[^"]*""#, "html", 3, false),
    (r"def\s+[0-9A-Za-z_]+\s*\([^)]*\):", "python", 6, false),
    (r"import\s+[0-9A-Za-z_.]+", "python", 4, false),
    (r"public\s+class\s+[0-9A-Za-z_]+", "java", 6, false),
    (r"public\s+static\s+void\s+main", "java", 7, false),
    (r"#include\s+<[0-9A-Za-z_.]+>", "cpp", 6, false),
    (r"int\s+main\s*\(\s*\)", "c", 6, false),
    (r"namespace\s+[0-9A-Za-z_]+", "csharp", 5, false),
    (r"func\s+[0-9A-Za-z_]+\s*\([^)]*\)\s*\{", "go", 6, false),
    (r"package\s+[0-9A-Za-z_]+", "go", 5, false),
    (r"SELECT\s+[0-9A-Za-z_*]+\s+FROM\s+[0-9A-Za-z_]+", "sql", 6, true),
    (r"CREATE\s+TABLE\s+[0-9A-Za-z_]+", "sql", 6, true),
    (r"\$[0-9A-Za-z_]+\s*=", "php", 5, false),
    (r"<\?php", "php", 7, false),
    (r"^\s*\{[\s\S]*\}\s*$", "json", 5, false),
    (r"fn\s+[0-9A-Za-z_]+\s*\([^)]*\)\s*->", "rust", 6, false),
    (r"let\s+mut\s+[0-9A-Za-z_]+", "rust", 5, false),
    (r#"require ['"][0-9A-Za-z_/.-]+['"]"#, "ruby", 5, false),
    (r"def\s+[0-9A-Za-z_]+(\(.+\))?\s+do", "ruby", 6, false),
];

/// Uncompiled signal, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSpec {
    pub pattern: String,
    pub language: String,
    pub weight: u32,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl SignalSpec {
    pub fn new(pattern: impl Into<String>, language: impl Into<String>, weight: u32) -> Self {
        Self {
            pattern: pattern.into(),
            language: language.into(),
            weight,
            case_insensitive: false,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn compile(&self) -> Result<Signal, DetectError> {
        if !is_language_id(&self.language) {
            return Err(DetectError::InvalidLanguageId(self.language.clone()));
        }
        if self.weight == 0 {
            return Err(DetectError::ZeroWeight(self.language.clone()));
        }
        let pattern = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.case_insensitive)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|source| DetectError::InvalidPattern {
                language: self.language.clone(),
                source,
            })?;

        Ok(Signal {
            pattern,
            language: self.language.clone(),
            weight: self.weight,
        })
    }
}

/// A compiled signal. Immutable once built.
#[derive(Debug, Clone)]
pub struct Signal {
    pattern: Regex,
    language: String,
    weight: u32,
}

impl Signal {
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Number of non-overlapping matches in `code`.
    pub fn count(&self, code: &str) -> usize {
        self.pattern.find_iter(code).count()
    }

    /// `count × weight`, zero when the signal does not fire.
    pub fn score(&self, code: &str) -> u64 {
        (self.count(code) as u64).saturating_mul(u64::from(self.weight))
    }
}

pub fn builtin_specs() -> Vec<SignalSpec> {
    BUILTIN_SIGNALS
        .iter()
        .map(|&(pattern, language, weight, case_insensitive)| SignalSpec {
            pattern: pattern.to_string(),
            language: language.to_string(),
            weight,
            case_insensitive,
        })
        .collect()
}

/// Compile a list of specs, keeping their order.
pub fn compile_all<'a>(
    specs: impl IntoIterator<Item = &'a SignalSpec>,
) -> Result<Vec<Signal>, DetectError> {
    specs.into_iter().map(SignalSpec::compile).collect()
}
