//! XDT configuration transforms with recorded diagnostics.
//!
//! This crate wraps the `xdt-engine` transformation engine with:
//!
//! - **Sources** (`source`): a transformation document from a file, a string,
//!   or a fragment that is wrapped into a full document
//! - **Diagnostics** (`diagnostics`): a sink that records every engine log
//!   call, with severity flags and a canonical text rendering
//! - **Settings** (`settings`): which logger a run uses
//! - **File system** (`fs`): physical and in-memory file access
//! - **Transformer** (`transformer`): load, transform, and save
//!
//! # Example
//!
//! ```ignore
//! use xdt_transform::{PhysicalFileSystem, Transformer};
//!
//! let sink = Transformer::transform_config_with_default_logger(
//!     &PhysicalFileSystem,
//!     "web.config",
//!     "web.release.config",
//!     "web.config",
//! )?;
//! for line in sink.render_all(&Default::default())? {
//!     println!("{line}");
//! }
//! ```

pub mod diagnostics;
pub mod error;
pub mod fs;
pub mod settings;
pub mod source;
pub mod transformer;

pub use error::{Result, TransformError};

pub use diagnostics::{DiagnosticsEntry, DiagnosticsSink, FormatError, TimestampFormat};
pub use fs::{FILE_NOT_FOUND_MESSAGE, FileHandle, FileSystem, MemoryFileSystem, PhysicalFileSystem};
pub use settings::TransformSettings;
pub use source::{DocumentSource, FileSource, FragmentSource, TransformSource, TransformStream};
pub use transformer::Transformer;

// Logging contract, re-exported for callers that implement their own logger.
pub use xdt_engine::{
    CapturedError, LogEvent, MessageArg, MessageCategory, MessageVerbosity, TransformLogger,
};
