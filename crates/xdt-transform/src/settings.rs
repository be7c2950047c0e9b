//! Per-run logger selection.

use std::fmt;

use xdt_engine::TransformLogger;

use crate::diagnostics::DiagnosticsSink;

enum LoggerChoice<'a> {
    None,
    Borrowed(&'a mut dyn TransformLogger),
    Default(DiagnosticsSink),
}

/// Selects the logger the engine reports to during a transform.
///
/// Without a logger, engine errors are returned directly instead of logged.
///
/// ```ignore
/// let mut settings = TransformSettings::new().use_default_logger();
/// transformer.transform("web.config", "web.release.config", "out.config", &mut settings)?;
/// let sink = settings.into_diagnostics();
/// ```
pub struct TransformSettings<'a> {
    logger: LoggerChoice<'a>,
}

impl<'a> TransformSettings<'a> {
    pub fn new() -> Self {
        Self {
            logger: LoggerChoice::None,
        }
    }

    /// Uses the given logger, or none.
    #[must_use]
    pub fn use_logger(mut self, logger: Option<&'a mut dyn TransformLogger>) -> Self {
        self.logger = match logger {
            Some(logger) => LoggerChoice::Borrowed(logger),
            None => LoggerChoice::None,
        };
        self
    }

    /// Uses a fresh [`DiagnosticsSink`], readable afterwards through
    /// [`diagnostics`](Self::diagnostics).
    #[must_use]
    pub fn use_default_logger(mut self) -> Self {
        self.logger = LoggerChoice::Default(DiagnosticsSink::new());
        self
    }

    pub fn has_logger(&self) -> bool {
        !matches!(self.logger, LoggerChoice::None)
    }

    pub fn logger(&mut self) -> Option<&mut dyn TransformLogger> {
        match &mut self.logger {
            LoggerChoice::None => None,
            LoggerChoice::Borrowed(logger) => Some(&mut **logger),
            LoggerChoice::Default(sink) => Some(sink),
        }
    }

    /// The default sink, if one was selected.
    pub fn diagnostics(&self) -> Option<&DiagnosticsSink> {
        match &self.logger {
            LoggerChoice::Default(sink) => Some(sink),
            _ => None,
        }
    }

    pub fn into_diagnostics(self) -> Option<DiagnosticsSink> {
        match self.logger {
            LoggerChoice::Default(sink) => Some(sink),
            _ => None,
        }
    }
}

impl Default for TransformSettings<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformSettings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let logger = match &self.logger {
            LoggerChoice::None => "none",
            LoggerChoice::Borrowed(_) => "custom",
            LoggerChoice::Default(_) => "default",
        };
        f.debug_struct("TransformSettings")
            .field("logger", &logger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_logger() {
        let mut settings = TransformSettings::default();
        assert!(!settings.has_logger());
        assert!(settings.logger().is_none());
        assert!(settings.into_diagnostics().is_none());
    }

    #[test]
    fn test_default_logger_is_readable_back() {
        let mut settings = TransformSettings::new().use_default_logger();
        if let Some(logger) = settings.logger() {
            logger.log_warning("careful", &[]);
        }
        let sink = settings.diagnostics().unwrap();
        assert!(sink.has_warning());
        assert_eq!(settings.into_diagnostics().unwrap().len(), 1);
    }

    #[test]
    fn test_borrowed_logger_receives_events() {
        let mut sink = DiagnosticsSink::new();
        {
            let mut settings = TransformSettings::new().use_logger(Some(&mut sink));
            assert!(settings.diagnostics().is_none());
            if let Some(logger) = settings.logger() {
                logger.log_error("broken", &[]);
            }
        }
        assert!(sink.has_error());
    }

    #[test]
    fn test_use_logger_none_clears_selection() {
        let settings = TransformSettings::new().use_default_logger().use_logger(None);
        assert!(!settings.has_logger());
    }
}
