//! Applies a transformation document to a target document.
//!
//! The transformation mirrors the target: elements without `xdt:Transform`
//! are containers that select matching target elements by name (and by
//! `xdt:Locator`, when present) and descend into them. Elements carrying
//! `xdt:Transform` run their directive against the matching children of the
//! current target element.

use std::io::Read;

use tracing::{debug, warn};

use crate::directive::{Directive, Locator};
use crate::document::{Element, Node, XmlDocument};
use crate::error::{EngineError, Result};
use crate::logger::{CapturedError, MessageArg, MessageVerbosity, TransformLogger};

/// Name used in log events when no source name was given.
pub const DEFAULT_SOURCE_NAME: &str = "transformation";

/// A parsed transformation document, bound to an optional logger.
pub struct XmlTransformation<'l> {
    document: XmlDocument,
    logger: Option<&'l mut dyn TransformLogger>,
    source_name: Option<String>,
}

impl<'l> XmlTransformation<'l> {
    pub fn parse(text: &str, logger: Option<&'l mut dyn TransformLogger>) -> Result<Self> {
        Ok(Self {
            document: XmlDocument::parse(text)?,
            logger,
            source_name: None,
        })
    }

    pub fn from_reader<R: Read>(
        reader: R,
        logger: Option<&'l mut dyn TransformLogger>,
    ) -> Result<Self> {
        Ok(Self {
            document: XmlDocument::load(reader)?,
            logger,
            source_name: None,
        })
    }

    /// Sets the file name reported in log events.
    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    /// Applies the transformation to `target` in place.
    ///
    /// With a logger, directive errors are logged as exceptions and the
    /// result is `Ok(false)`. Without one, the first error is returned.
    pub fn apply(&mut self, target: &mut XmlDocument) -> Result<bool> {
        let XmlTransformation {
            document,
            logger,
            source_name,
        } = self;
        let mut applier = Applier {
            logger: match logger {
                Some(logger) => Some(&mut **logger),
                None => None,
            },
            source_name: source_name.as_deref().unwrap_or(DEFAULT_SOURCE_NAME),
            failed: false,
        };

        let (Some(transform_root), Some(target_root)) = (document.root(), target.root_mut())
        else {
            return Ok(true);
        };
        if transform_root.name != target_root.name {
            applier.root_mismatch(transform_root, target_root)?;
            return Ok(false);
        }

        let path = format!("/{}", target_root.name);
        applier.process_children(transform_root, target_root, &path)?;
        debug!(failed = applier.failed, "transformation finished");
        Ok(!applier.failed)
    }
}

struct Applier<'a> {
    logger: Option<&'a mut dyn TransformLogger>,
    source_name: &'a str,
    failed: bool,
}

impl Applier<'_> {
    fn process_children(
        &mut self,
        transform_parent: &Element,
        target_parent: &mut Element,
        path: &str,
    ) -> Result<()> {
        for child in transform_parent.child_elements() {
            match child.transform_attribute("Transform") {
                Some(text) => self.execute(child, text, target_parent, path)?,
                None => self.descend(child, target_parent, path)?,
            }
        }
        Ok(())
    }

    fn descend(&mut self, child: &Element, target_parent: &mut Element, path: &str) -> Result<()> {
        let locator = match Locator::for_element(child) {
            Ok(locator) => locator,
            Err(error) => return self.report(error, child),
        };
        let path = step(path, child, locator.as_ref());
        let mut matched = false;
        for node in &mut target_parent.children {
            if let Node::Element(candidate) = node {
                if selects(child, locator.as_ref(), candidate) {
                    matched = true;
                    self.process_children(child, candidate, &path)?;
                }
            }
        }
        if !matched {
            self.no_match(child, &path);
        }
        Ok(())
    }

    fn execute(
        &mut self,
        child: &Element,
        text: &str,
        target_parent: &mut Element,
        path: &str,
    ) -> Result<()> {
        let directive = match Directive::parse(text) {
            Ok(directive) => directive,
            Err(error) => return self.report(error, child),
        };
        let locator = match Locator::for_element(child) {
            Ok(locator) => locator,
            Err(error) => return self.report(error, child),
        };
        let path = step(path, child, locator.as_ref());
        debug!(directive = %directive, path = %path, "executing transform");

        let matches: Vec<usize> = target_parent
            .children
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                node.as_element()
                    .filter(|candidate| selects(child, locator.as_ref(), candidate))
                    .map(|_| index)
            })
            .collect();

        if matches.is_empty() && !directive.is_insert() {
            self.no_match(child, &path);
            return Ok(());
        }

        if let Some(logger) = self.logger.as_deref_mut() {
            logger.start_section_with(
                MessageVerbosity::Verbose,
                "Executing {0} (transform line {1}, {2})",
                &[directive.name().into(), child.line.into(), child.column.into()],
            );
            logger.log_message_with(MessageVerbosity::Verbose, "on {0}", &[path.as_str().into()]);
        }

        match &directive {
            Directive::Insert => self.insert(child, target_parent),
            Directive::InsertIfMissing if matches.is_empty() => self.insert(child, target_parent),
            Directive::InsertIfMissing => self.verbose(
                "Element '{0}' already exists, skipping insert",
                &[child.name.as_str().into()],
            ),
            Directive::Replace => {
                for &index in &matches {
                    self.applying_to(&target_parent.children[index]);
                    target_parent.children[index] = Node::Element(child.without_transform_markup());
                }
            }
            Directive::Remove => {
                self.applying_to(&target_parent.children[matches[0]]);
                target_parent.children.remove(matches[0]);
            }
            Directive::RemoveAll => {
                for &index in matches.iter().rev() {
                    self.applying_to(&target_parent.children[index]);
                    target_parent.children.remove(index);
                }
            }
            Directive::SetAttributes(names) => {
                for &index in &matches {
                    self.applying_to(&target_parent.children[index]);
                    if let Node::Element(target) = &mut target_parent.children[index] {
                        let count = set_attributes(child, target, names);
                        self.verbose("Set {0} attributes", &[count.into()]);
                    }
                }
            }
            Directive::RemoveAttributes(names) => {
                for &index in &matches {
                    self.applying_to(&target_parent.children[index]);
                    if let Node::Element(target) = &mut target_parent.children[index] {
                        let count = names
                            .iter()
                            .filter(|name| target.remove_attribute(name))
                            .count();
                        self.verbose("Removed {0} attributes", &[count.into()]);
                    }
                }
            }
        }

        if let Some(logger) = self.logger.as_deref_mut() {
            logger.end_section_with(
                MessageVerbosity::Verbose,
                "Done executing {0}",
                &[directive.name().into()],
            );
        }
        Ok(())
    }

    /// Inserts after the last child element so trailing whitespace stays last.
    fn insert(&mut self, child: &Element, target_parent: &mut Element) {
        let position = target_parent
            .children
            .iter()
            .rposition(|node| matches!(node, Node::Element(_)))
            .map_or(target_parent.children.len(), |index| index + 1);
        target_parent
            .children
            .insert(position, Node::Element(child.without_transform_markup()));
        target_parent.self_closing = false;
        self.verbose(
            "Inserted '{0}' into '{1}'",
            &[child.name.as_str().into(), target_parent.name.as_str().into()],
        );
    }

    fn applying_to(&mut self, node: &Node) {
        if let Node::Element(element) = node {
            self.verbose(
                "Applying to '{0}' element (source line {1}, {2})",
                &[element.name.as_str().into(), element.line.into(), element.column.into()],
            );
        }
    }

    fn verbose(&mut self, message: &str, args: &[MessageArg]) {
        if let Some(logger) = self.logger.as_deref_mut() {
            logger.log_message_with(MessageVerbosity::Verbose, message, args);
        }
    }

    fn no_match(&mut self, child: &Element, path: &str) {
        const MESSAGE: &str = "No element in the source document matches '{0}'";
        match self.logger.as_deref_mut() {
            Some(logger) => logger.log_warning_at(
                self.source_name,
                child.line,
                child.column,
                MESSAGE,
                &[path.into()],
            ),
            None => warn!(
                file = self.source_name,
                line = child.line,
                column = child.column,
                "No element in the source document matches '{path}'"
            ),
        }
    }

    /// Logs `error` as an exception at the transform element and marks the
    /// run as failed, or returns it when there is no logger.
    fn report(&mut self, error: EngineError, at: &Element) -> Result<()> {
        let Some(logger) = self.logger.as_deref_mut() else {
            return Err(error);
        };
        debug!(error = %error, line = at.line, "transform error logged");
        logger.log_exception_at(CapturedError::new(error), self.source_name, at.line, at.column);
        self.failed = true;
        Ok(())
    }

    fn root_mismatch(&mut self, transform_root: &Element, target_root: &Element) -> Result<()> {
        let Some(logger) = self.logger.as_deref_mut() else {
            return Err(EngineError::RootMismatch {
                transform: transform_root.name.clone(),
                source_root: target_root.name.clone(),
            });
        };
        logger.log_error_at(
            self.source_name,
            transform_root.line,
            transform_root.column,
            "The transformation root <{0}> does not match the source root <{1}>",
            &[
                transform_root.name.as_str().into(),
                target_root.name.as_str().into(),
            ],
        );
        self.failed = true;
        Ok(())
    }
}

fn selects(child: &Element, locator: Option<&Locator>, candidate: &Element) -> bool {
    candidate.name == child.name && locator.is_none_or(|locator| locator.matches(candidate))
}

fn step(path: &str, child: &Element, locator: Option<&Locator>) -> String {
    match locator {
        Some(locator) => format!("{path}/{}{}", child.name, locator.predicate()),
        None => format!("{path}/{}", child.name),
    }
}

/// Copies the transform element's plain attributes onto `target`.
fn set_attributes(source: &Element, target: &mut Element, names: &[String]) -> usize {
    let mut count = 0;
    for attribute in &source.attributes {
        if attribute.is_transform_markup() || attribute.is_namespace_declaration() {
            continue;
        }
        if !names.is_empty() && !names.iter().any(|name| *name == attribute.name) {
            continue;
        }
        target.set_attribute(&attribute.name, &attribute.value);
        count += 1;
    }
    count
}
