//! Persistent template archive.
//!
//! An archive is a JSON document mapping template names to markup bodies:
//!
//! ```json
//! { "version": 1, "templates": { "shipping": "^XA{% ll %}^FO20,20^FD{{ name }}^FS^XZ" } }
//! ```
//!
//! Bodies may contain `{{ key }}` substitutions and the `{% ll %}` tag, which
//! expands to the length placeholder consumed by the render engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::label::SourceError;
use crate::render::DEFAULT_LENGTH_PLACEHOLDER;

const CURRENT_VERSION: u32 = 1;
const LENGTH_TAG: &str = "ll";

fn default_version() -> u32 {
    CURRENT_VERSION
}

/// Named markup templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateArchive {
    /// Archive format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Template bodies keyed by name.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

impl Default for TemplateArchive {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            templates: BTreeMap::new(),
        }
    }
}

impl TemplateArchive {
    /// Parse an archive from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load an archive from `path`. A missing file is an empty archive.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "template archive missing, starting empty");
                Ok(Self::default())
            }
            Err(e) => Err(SourceError::io(path, e)),
        }
    }

    /// Write the archive to `path` through a sibling temporary file so a
    /// reader never observes a partial document.
    pub fn save(&self, path: &Path, pretty: bool) -> Result<(), SourceError> {
        let text = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        let tmp = tmp_path(path);
        std::fs::write(&tmp, text).map_err(|e| SourceError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| SourceError::io(path, e))?;
        debug!(path = %path.display(), templates = self.templates.len(), "saved template archive");
        Ok(())
    }

    /// Template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Raw body of template `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Add or replace a template, returning the previous body.
    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) -> Option<String> {
        self.templates.insert(name.into(), body.into())
    }

    /// Remove a template, returning its body.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.templates.remove(name)
    }

    /// Expand template `name` with the default length placeholder.
    pub fn render(
        &self,
        name: &str,
        context: &BTreeMap<String, String>,
    ) -> Result<String, SourceError> {
        self.render_with_placeholder(name, context, DEFAULT_LENGTH_PLACEHOLDER)
    }

    /// Expand template `name`, writing `placeholder` for each `{% ll %}`.
    pub fn render_with_placeholder(
        &self,
        name: &str,
        context: &BTreeMap<String, String>,
        placeholder: &str,
    ) -> Result<String, SourceError> {
        let body = self
            .get(name)
            .ok_or_else(|| SourceError::TemplateNotFound(name.to_owned()))?;
        expand(body, context, placeholder)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

fn expand(
    body: &str,
    context: &BTreeMap<String, String>,
    placeholder: &str,
) -> Result<String, SourceError> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    let mut offset = 0usize;

    while let Some(open) = rest.find('{') {
        let (close, is_var) = match rest[open..].get(..2) {
            Some("{{") => ("}}", true),
            Some("{%") => ("%}", false),
            _ => {
                out.push_str(&rest[..=open]);
                offset += open + 1;
                rest = &rest[open + 1..];
                continue;
            }
        };
        out.push_str(&rest[..open]);
        let inner_start = open + 2;
        let Some(len) = rest[inner_start..].find(close) else {
            return Err(SourceError::UnterminatedTag {
                offset: offset + open,
            });
        };
        let inner = rest[inner_start..inner_start + len].trim();
        if is_var {
            if let Some(value) = context.get(inner) {
                out.push_str(value);
            }
        } else if inner == LENGTH_TAG {
            out.push_str(placeholder);
        } else {
            return Err(SourceError::UnknownTag {
                tag: inner.to_owned(),
            });
        }
        let consumed = inner_start + len + close.len();
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}
