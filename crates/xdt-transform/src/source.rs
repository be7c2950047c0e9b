//! Where a transformation document comes from.
//!
//! Every [`TransformSource`] can be opened any number of times; each call
//! returns a fresh stream positioned at the start of the document.

use std::fmt;
use std::io::{Cursor, Read};

use tracing::debug;
use xdt_engine::{XDT_NAMESPACE, is_well_formed};

use crate::error::{Result, TransformError};
use crate::fs::FileHandle;

/// A readable stream over a transformation document.
pub type TransformStream = Box<dyn Read>;

/// Produces the bytes of a transformation document.
pub trait TransformSource {
    fn open(&self) -> Result<TransformStream>;
}

/// A transformation document stored in a file.
pub struct FileSource {
    file: Box<dyn FileHandle>,
}

impl FileSource {
    pub fn new(file: Box<dyn FileHandle>) -> Self {
        Self { file }
    }

    pub fn file(&self) -> &dyn FileHandle {
        self.file.as_ref()
    }
}

impl TransformSource for FileSource {
    fn open(&self) -> Result<TransformStream> {
        self.file
            .open_read()
            .map_err(|err| TransformError::from_io(self.file.path(), err))
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource")
            .field("path", &self.file.path())
            .finish()
    }
}

/// A complete transformation document held as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    document_xml: String,
}

impl DocumentSource {
    pub fn new(document_xml: impl Into<String>) -> Result<Self> {
        let document_xml = document_xml.into();
        require_text("document_xml", &document_xml)?;
        Ok(Self { document_xml })
    }

    pub fn as_str(&self) -> &str {
        &self.document_xml
    }
}

impl TransformSource for DocumentSource {
    fn open(&self) -> Result<TransformStream> {
        Ok(Box::new(Cursor::new(self.document_xml.clone().into_bytes())))
    }
}

/// A transformation given either as a full document or as the elements that
/// belong under its root.
///
/// Fragments are wrapped in a `<configuration>` root that declares the
/// `xdt` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSource {
    document_fragment: String,
}

impl FragmentSource {
    pub fn new(document_fragment: impl Into<String>) -> Result<Self> {
        let document_fragment = document_fragment.into();
        require_text("document_fragment", &document_fragment)?;
        Ok(Self { document_fragment })
    }

    pub fn as_str(&self) -> &str {
        &self.document_fragment
    }

    /// Returns the document this fragment stands for: the text itself if it
    /// is well-formed, otherwise the wrapped text if that is well-formed.
    pub fn resolve(&self) -> Result<DocumentSource> {
        if is_well_formed(&self.document_fragment) {
            debug!("fragment is a complete document");
            return DocumentSource::new(self.document_fragment.as_str());
        }
        let wrapped = wrap_fragment(&self.document_fragment);
        if is_well_formed(&wrapped) {
            debug!("fragment wrapped in configuration root");
            return DocumentSource::new(wrapped);
        }
        Err(TransformError::InvalidDocument)
    }
}

impl TransformSource for FragmentSource {
    fn open(&self) -> Result<TransformStream> {
        self.resolve()?.open()
    }
}

fn wrap_fragment(fragment: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<configuration xmlns:xdt=\"{XDT_NAMESPACE}\">\n  {fragment}\n</configuration>"
    )
}

fn require_text(parameter: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TransformError::InvalidArgument { parameter });
    }
    Ok(())
}
