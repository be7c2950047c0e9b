use std::fs;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, info_span, warn};
use xdt_engine::XmlDocument;
use xdt_transform::{
    DocumentSource, FragmentSource, PhysicalFileSystem, TransformError, TransformSettings,
    Transformer,
};

use crate::cli::{ApplyArgs, CheckArgs};
use xdt_cli::types::ApplyResult;

pub fn run_apply(args: &ApplyArgs) -> Result<ApplyResult> {
    let span = info_span!(
        "apply",
        source = %args.source.display(),
        target = %args.target.display(),
    );
    let _guard = span.enter();
    let started = Instant::now();

    let file_system = PhysicalFileSystem;
    let transformer = Transformer::new(&file_system);
    let mut settings = TransformSettings::new().use_default_logger();
    let selection = &args.transformation;

    let outcome = if let Some(path) = &selection.transform {
        debug!(transform = %path.display(), "transformation from file");
        transformer.transform(&args.source, path, &args.target, &mut settings)
    } else if let Some(path) = &selection.document {
        debug!(document = %path.display(), "transformation from document text");
        let text = fs::read_to_string(path)
            .with_context(|| format!("read transformation document {}", path.display()))?;
        let document = DocumentSource::new(text)?;
        transformer.transform_source(&args.source, &args.target, &document, &mut settings)
    } else if let Some(fragment) = &selection.fragment {
        debug!("transformation from fragment");
        let fragment = FragmentSource::new(fragment.as_str())?;
        transformer.transform_source(&args.source, &args.target, &fragment, &mut settings)
    } else {
        return Err(anyhow!(
            "one of --transform, --document or --fragment is required"
        ));
    };

    let failure = match outcome {
        Ok(()) => None,
        Err(error @ TransformError::TransformFailed { .. }) => {
            warn!(%error, "transformation reported failure");
            Some(error.to_string())
        }
        Err(error) => {
            return Err(error)
                .with_context(|| format!("transform {}", args.source.display()));
        }
    };

    let diagnostics = settings.into_diagnostics().unwrap_or_default();
    info!(
        entries = diagnostics.len(),
        failed = failure.is_some(),
        elapsed_ms = started.elapsed().as_millis(),
        "apply finished"
    );
    Ok(ApplyResult {
        source: args.source.clone(),
        target: args.target.clone(),
        diagnostics,
        failure,
    })
}

/// Returns the text to print: the resolved document for a fragment, or a
/// confirmation line for a document file.
pub fn run_check(args: &CheckArgs) -> Result<String> {
    if let Some(fragment) = &args.input.fragment {
        let document = FragmentSource::new(fragment.as_str())?
            .resolve()
            .context("fragment is not well formed, even when wrapped")?;
        return Ok(document.as_str().to_string());
    }
    let path = args
        .input
        .document
        .as_ref()
        .ok_or_else(|| anyhow!("one of --document or --fragment is required"))?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("read transformation document {}", path.display()))?;
    XmlDocument::parse(&text)
        .with_context(|| format!("{} is not well formed", path.display()))?;
    Ok(format!("{}: well formed", path.display()))
}
