//! Label sources: anything that can produce a markup document on demand.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::template::TemplateArchive;

/// Failure while producing markup from a [`LabelSource`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The named template is not in the archive.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// A `{{` or `{%` tag has no closing delimiter.
    #[error("unterminated template tag at byte {offset}")]
    UnterminatedTag {
        /// Byte offset of the opening delimiter in the template body.
        offset: usize,
    },

    /// A `{% ... %}` tag that the expander does not know.
    #[error("unknown template tag '{tag}'")]
    UnknownTag {
        /// Tag text with surrounding whitespace removed.
        tag: String,
    },

    /// Reading or writing a file failed.
    #[error("failed to access '{}': {source}", .path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A template archive document is not valid JSON of the expected shape.
    #[error("invalid template archive: {0}")]
    Archive(#[from] serde_json::Error),

    /// Free-form failure reported by a generator.
    #[error("{0}")]
    Message(String),
}

impl SourceError {
    /// Convenience constructor for [`SourceError::Message`].
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Produces a label markup document.
///
/// Implementations may fail; the render engine propagates the error
/// unchanged.
pub trait LabelSource {
    /// Produce the raw markup for this label.
    fn produce_markup(&self) -> Result<String, SourceError>;
}

impl LabelSource for str {
    fn produce_markup(&self) -> Result<String, SourceError> {
        Ok(self.to_owned())
    }
}

impl LabelSource for String {
    fn produce_markup(&self) -> Result<String, SourceError> {
        Ok(self.clone())
    }
}

impl<T: LabelSource + ?Sized> LabelSource for &T {
    fn produce_markup(&self) -> Result<String, SourceError> {
        (**self).produce_markup()
    }
}

/// Markup read from a file each time it is produced.
#[derive(Debug, Clone)]
pub struct FileLabel {
    path: PathBuf,
}

impl FileLabel {
    /// Label backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this label reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LabelSource for FileLabel {
    fn produce_markup(&self) -> Result<String, SourceError> {
        std::fs::read_to_string(&self.path).map_err(|e| SourceError::io(&self.path, e))
    }
}

/// Markup produced by a closure.
pub struct FnLabel<F> {
    generate: F,
}

impl<F> FnLabel<F>
where
    F: Fn() -> Result<String, SourceError>,
{
    /// Wrap a generator closure.
    pub fn new(generate: F) -> Self {
        Self { generate }
    }
}

impl<F> fmt::Debug for FnLabel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLabel").finish_non_exhaustive()
    }
}

impl<F> LabelSource for FnLabel<F>
where
    F: Fn() -> Result<String, SourceError>,
{
    fn produce_markup(&self) -> Result<String, SourceError> {
        (self.generate)()
    }
}

/// A named template from an archive, expanded with a fixed context.
#[derive(Debug, Clone)]
pub struct TemplateLabel<'a> {
    archive: &'a TemplateArchive,
    name: String,
    context: BTreeMap<String, String>,
    placeholder: String,
}

impl<'a> TemplateLabel<'a> {
    /// Label for template `name` with an empty context.
    pub fn new(archive: &'a TemplateArchive, name: impl Into<String>) -> Self {
        Self {
            archive,
            name: name.into(),
            context: BTreeMap::new(),
            placeholder: crate::render::DEFAULT_LENGTH_PLACEHOLDER.to_owned(),
        }
    }

    /// Set one context variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Replace the whole context.
    pub fn with_context(mut self, context: BTreeMap<String, String>) -> Self {
        self.context = context;
        self
    }

    /// Text that `{% ll %}` expands to. Must match the render
    /// configuration's placeholder for length injection to happen.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

impl LabelSource for TemplateLabel<'_> {
    fn produce_markup(&self) -> Result<String, SourceError> {
        self.archive
            .render_with_placeholder(&self.name, &self.context, &self.placeholder)
    }
}
