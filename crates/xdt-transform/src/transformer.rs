//! Load, transform, and persist a configuration file.
//!
//! Each run validates its paths, loads the source document (releasing the
//! source stream once parsed), applies the transformation in memory, and
//! only then opens the target for writing. Source and target may be the
//! same file.

use std::io::Write;
use std::path::Path;

use tracing::{debug, error, info, info_span};
use xdt_engine::{TransformLogger, XmlDocument, XmlTransformation};

use crate::diagnostics::DiagnosticsSink;
use crate::error::{Result, TransformError};
use crate::fs::{FileSystem, PhysicalFileSystem};
use crate::settings::TransformSettings;
use crate::source::TransformSource;

/// Runs transformations against files resolved through a [`FileSystem`].
pub struct Transformer<'fs> {
    file_system: &'fs dyn FileSystem,
}

impl<'fs> Transformer<'fs> {
    pub fn new(file_system: &'fs dyn FileSystem) -> Self {
        Self { file_system }
    }

    /// Transforms files on disk without a logger, so engine errors are returned.
    ///
    /// The paths are opened directly with `std::fs` through
    /// [`PhysicalFileSystem`], which adds no lookup of its own.
    pub fn transform_config(
        source_file: impl AsRef<Path>,
        transform_file: impl AsRef<Path>,
        target_file: impl AsRef<Path>,
    ) -> Result<()> {
        Self::transform_config_with(
            &PhysicalFileSystem,
            source_file,
            transform_file,
            target_file,
            None,
        )
    }

    /// Transforms files resolved through `file_system`, logging to `logger` if given.
    pub fn transform_config_with(
        file_system: &dyn FileSystem,
        source_file: impl AsRef<Path>,
        transform_file: impl AsRef<Path>,
        target_file: impl AsRef<Path>,
        logger: Option<&mut dyn TransformLogger>,
    ) -> Result<()> {
        let mut settings = TransformSettings::new().use_logger(logger);
        Transformer::new(file_system).transform(
            source_file,
            transform_file,
            target_file,
            &mut settings,
        )
    }

    /// Transforms with a fresh [`DiagnosticsSink`] and returns it.
    pub fn transform_config_with_default_logger(
        file_system: &dyn FileSystem,
        source_file: impl AsRef<Path>,
        transform_file: impl AsRef<Path>,
        target_file: impl AsRef<Path>,
    ) -> Result<DiagnosticsSink> {
        let mut settings = TransformSettings::new().use_default_logger();
        Transformer::new(file_system).transform(
            source_file,
            transform_file,
            target_file,
            &mut settings,
        )?;
        Ok(settings.into_diagnostics().unwrap_or_default())
    }

    /// Applies the transformation file `transform_file` to `source_file` and
    /// writes the result to `target_file`.
    pub fn transform(
        &self,
        source_file: impl AsRef<Path>,
        transform_file: impl AsRef<Path>,
        target_file: impl AsRef<Path>,
        settings: &mut TransformSettings<'_>,
    ) -> Result<()> {
        let source_file = require_path("source_file", source_file.as_ref())?;
        let transform_file = require_path("transform_file", transform_file.as_ref())?;
        let target_file = require_path("target_file", target_file.as_ref())?;

        let span = info_span!(
            "transform",
            source = %source_file.display(),
            transform = %transform_file.display(),
            target = %target_file.display(),
        );
        let _guard = span.enter();

        let applied = self.run(source_file, target_file, |document| {
            let stream = self
                .file_system
                .file(transform_file)
                .open_read()
                .map_err(|err| TransformError::from_io(transform_file, err))?;
            let mut transformation = XmlTransformation::from_reader(stream, settings.logger())?
                .with_source_name(transform_file.display().to_string());
            Ok(transformation.apply(document)?)
        })?;

        if !applied {
            error!("transformation did not apply cleanly");
            return Err(TransformError::TransformFailed {
                source_file: source_file.to_path_buf(),
                transform: Some(transform_file.to_path_buf()),
                target: target_file.to_path_buf(),
            });
        }
        info!("transformation applied");
        Ok(())
    }

    /// Applies the document produced by `transformation` to `source_file` and
    /// writes the result to `target_file`.
    pub fn transform_source(
        &self,
        source_file: impl AsRef<Path>,
        target_file: impl AsRef<Path>,
        transformation: &dyn TransformSource,
        settings: &mut TransformSettings<'_>,
    ) -> Result<()> {
        let source_file = require_path("source_file", source_file.as_ref())?;
        let target_file = require_path("target_file", target_file.as_ref())?;

        let span = info_span!(
            "transform",
            source = %source_file.display(),
            target = %target_file.display(),
        );
        let _guard = span.enter();

        let applied = self.run(source_file, target_file, |document| {
            let stream = transformation.open()?;
            let mut engine = XmlTransformation::from_reader(stream, settings.logger())?;
            Ok(engine.apply(document)?)
        })?;

        if !applied {
            error!("transformation did not apply cleanly");
            return Err(TransformError::TransformFailed {
                source_file: source_file.to_path_buf(),
                transform: None,
                target: target_file.to_path_buf(),
            });
        }
        info!("transformation applied");
        Ok(())
    }

    /// Loads `source_file`, runs `apply` on the document, and saves it to
    /// `target_file` when `apply` reports success.
    fn run<F>(&self, source_file: &Path, target_file: &Path, apply: F) -> Result<bool>
    where
        F: FnOnce(&mut XmlDocument) -> Result<bool>,
    {
        debug!("loading source document");
        let mut document = {
            let stream = self
                .file_system
                .file(source_file)
                .open_read()
                .map_err(|err| TransformError::from_io(source_file, err))?;
            XmlDocument::load(stream)?
        };

        debug!("applying transformation");
        if !apply(&mut document)? {
            return Ok(false);
        }

        debug!("writing target document");
        let mut stream = self
            .file_system
            .file(target_file)
            .open_write()
            .map_err(|err| TransformError::from_io(target_file, err))?;
        document.save(&mut stream)?;
        stream
            .flush()
            .map_err(|err| TransformError::from_io(target_file, err))?;
        Ok(true)
    }
}

/// Rejects empty and whitespace-only paths.
fn require_path<'p>(parameter: &'static str, path: &'p Path) -> Result<&'p Path> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(TransformError::InvalidArgument { parameter });
    }
    Ok(path)
}
