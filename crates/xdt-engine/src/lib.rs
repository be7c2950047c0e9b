//! XML document model and XDT transformation engine.
//!
//! - **Document** (`document`): whitespace-preserving parse and save of XML
//!   documents, built on `quick-xml`
//! - **Logging contract** (`logger`): the [`TransformLogger`] trait the engine
//!   reports through, and the [`LogEvent`] it produces
//! - **Directives** (`directive`): `xdt:Transform` and `xdt:Locator` values
//! - **Transformation** (`transformation`): applies a transformation document
//!   to a target document
//!
//! # Example
//!
//! ```ignore
//! use xdt_engine::{XmlDocument, XmlTransformation};
//!
//! let mut target = XmlDocument::parse(source_xml)?;
//! let applied = XmlTransformation::parse(transform_xml, None)?.apply(&mut target)?;
//! ```

pub mod directive;
pub mod document;
pub mod error;
pub mod logger;
pub mod transformation;

pub use error::{EngineError, Result};

pub use directive::{Directive, Locator};
pub use document::{
    Attribute, Declaration, Element, Node, XDT_NAMESPACE, XmlDocument, is_well_formed,
};
pub use logger::{
    CapturedError, LogEvent, MessageArg, MessageCategory, MessageVerbosity, TransformLogger,
};
pub use transformation::{DEFAULT_SOURCE_NAME, XmlTransformation};
