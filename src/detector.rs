//! Detection façade.
//!
//! A recognized file extension always wins; content is only classified when
//! there is no file name or its extension is unknown.

use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::classifier;
use crate::error::DetectError;
use crate::lang::{Catalog, LanguageEntry};
use crate::signals::{self, Signal, SignalSpec};

/// The only value callers see: a language id and its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Detection {
    pub language: String,
    pub name: String,
}

impl Detection {
    pub fn new(language: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            name: name.into(),
        }
    }
}

/// Extra languages and signals layered over the built-in tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOverlay {
    #[serde(default)]
    pub languages: Vec<LanguageEntry>,
    #[serde(default)]
    pub signals: Vec<SignalSpec>,
}

impl CatalogOverlay {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| DetectError::OverlayIo {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| DetectError::OverlayFormat {
            path: display,
            source,
        })
    }
}

static BUILTIN: LazyLock<Detector> =
    LazyLock::new(|| Detector::standard().expect("built-in signal table must compile"));

/// Immutable detector configuration: a catalog plus an ordered signal list.
#[derive(Debug, Clone)]
pub struct Detector {
    catalog: Catalog,
    signals: Vec<Signal>,
}

impl Detector {
    pub fn new(catalog: Catalog, signals: Vec<Signal>) -> Self {
        Self { catalog, signals }
    }

    /// Fresh detector over the built-in catalog and signal list.
    pub fn standard() -> Result<Self, DetectError> {
        let signals = signals::compile_all(&signals::builtin_specs())?;
        Ok(Self::new(Catalog::builtin(), signals))
    }

    /// Shared built-in detector, compiled on first use.
    pub fn builtin() -> &'static Detector {
        &BUILTIN
    }

    /// Apply an overlay. Its signals run after the existing ones, so they
    /// lose ties against them.
    pub fn with_overlay(mut self, overlay: CatalogOverlay) -> Result<Self, DetectError> {
        for entry in overlay.languages {
            self.catalog.insert(entry)?;
        }
        let extra = signals::compile_all(&overlay.signals)?;
        self.signals.extend(extra);
        Ok(self)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn resolve(&self, file_name: &str) -> Option<&str> {
        self.catalog.resolve(file_name)
    }

    pub fn classify(&self, code: &str) -> Detection {
        classifier::classify(code, &self.signals, &self.catalog)
    }

    pub fn detect(&self, code: &str, file_name: Option<&str>) -> Detection {
        if let Some(language) = file_name.and_then(|name| self.resolve(name)) {
            tracing::trace!(language, path = "extension", "language detected");
            return Detection::new(language, self.catalog.name_or_id(language));
        }

        let detection = self.classify(code);
        tracing::trace!(language = %detection.language, path = "content", "language detected");
        detection
    }
}

/// Resolve a file name against the built-in extension table.
pub fn resolve(file_name: &str) -> Option<&'static str> {
    Detector::builtin().resolve(file_name)
}

/// Classify content with the built-in signals.
pub fn classify(code: &str) -> Detection {
    Detector::builtin().classify(code)
}

/// Detect with the built-in detector.
pub fn detect(code: &str, file_name: Option<&str>) -> Detection {
    Detector::builtin().detect(code, file_name)
}
