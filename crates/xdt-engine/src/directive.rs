//! `xdt:Transform` directives and `xdt:Locator` expressions.

use std::fmt;

use crate::document::Element;
use crate::error::{EngineError, Result};

/// A transform directive read from an `xdt:Transform` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Replace,
    Insert,
    InsertIfMissing,
    Remove,
    RemoveAll,
    /// Copies attributes from the transform element. An empty list copies all of them.
    SetAttributes(Vec<String>),
    RemoveAttributes(Vec<String>),
}

impl Directive {
    /// Parses `Name` or `Name(arg, arg, ...)`.
    pub fn parse(text: &str) -> Result<Self> {
        let (name, arguments) = split_call(text).ok_or_else(|| EngineError::UnknownTransform {
            name: text.trim().to_string(),
        })?;
        let directive = match (name, arguments) {
            ("Replace", None) => Directive::Replace,
            ("Insert", None) => Directive::Insert,
            ("InsertIfMissing", None) => Directive::InsertIfMissing,
            ("Remove", None) => Directive::Remove,
            ("RemoveAll", None) => Directive::RemoveAll,
            ("SetAttributes", arguments) => Directive::SetAttributes(arguments.unwrap_or_default()),
            ("RemoveAttributes", Some(arguments)) if !arguments.is_empty() => {
                Directive::RemoveAttributes(arguments)
            }
            ("RemoveAttributes", _) => {
                return Err(EngineError::MissingArgument {
                    directive: "RemoveAttributes".to_string(),
                });
            }
            _ => {
                return Err(EngineError::UnknownTransform {
                    name: text.trim().to_string(),
                });
            }
        };
        Ok(directive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Directive::Replace => "Replace",
            Directive::Insert => "Insert",
            Directive::InsertIfMissing => "InsertIfMissing",
            Directive::Remove => "Remove",
            Directive::RemoveAll => "RemoveAll",
            Directive::SetAttributes(_) => "SetAttributes",
            Directive::RemoveAttributes(_) => "RemoveAttributes",
        }
    }

    /// Insert directives add content and never warn when nothing matches.
    pub fn is_insert(&self) -> bool {
        matches!(self, Directive::Insert | Directive::InsertIfMissing)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::SetAttributes(names) | Directive::RemoveAttributes(names)
                if !names.is_empty() =>
            {
                write!(f, "{}({})", self.name(), names.join(","))
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// A resolved `Match(...)` locator: attribute values the source element must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    conditions: Vec<(String, String)>,
}

impl Locator {
    /// Reads the `xdt:Locator` attribute of a transform element, if any.
    ///
    /// The attribute names listed in `Match` are looked up on the same
    /// transform element to obtain the values to match.
    pub fn for_element(element: &Element) -> Result<Option<Self>> {
        element
            .transform_attribute("Locator")
            .map(|text| Self::parse(text, element))
            .transpose()
    }

    pub fn parse(text: &str, element: &Element) -> Result<Self> {
        let (name, arguments) = split_call(text).ok_or_else(|| EngineError::UnknownLocator {
            name: text.trim().to_string(),
        })?;
        if name != "Match" {
            return Err(EngineError::UnknownLocator {
                name: name.to_string(),
            });
        }
        let keys = arguments.filter(|keys| !keys.is_empty()).ok_or_else(|| {
            EngineError::MissingArgument {
                directive: "Match".to_string(),
            }
        })?;
        let conditions = keys
            .into_iter()
            .map(|key| match element.attribute(&key) {
                Some(value) => Ok((key, value.to_string())),
                None => Err(EngineError::MissingLocatorAttribute {
                    attribute: key,
                    element: element.name.clone(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { conditions })
    }

    pub fn matches(&self, candidate: &Element) -> bool {
        self.conditions
            .iter()
            .all(|(key, value)| candidate.attribute(key) == Some(value.as_str()))
    }

    /// XPath-style predicate, e.g. `[@key='a' and @name='b']`.
    pub fn predicate(&self) -> String {
        let terms: Vec<String> = self
            .conditions
            .iter()
            .map(|(key, value)| format!("@{key}='{value}'"))
            .collect();
        format!("[{}]", terms.join(" and "))
    }
}

/// Splits `Name(a, b)` into its name and trimmed arguments.
///
/// Returns `None` for unbalanced parentheses or an empty name.
fn split_call(text: &str) -> Option<(&str, Option<Vec<String>>)> {
    let text = text.trim();
    let Some(open) = text.find('(') else {
        let valid = !text.is_empty() && !text.contains(')');
        return valid.then_some((text, None));
    };
    let name = text[..open].trim();
    let inner = text[open + 1..].strip_suffix(')')?;
    if name.is_empty() || inner.contains(['(', ')']) {
        return None;
    }
    let arguments = inner
        .split(',')
        .map(str::trim)
        .filter(|argument| !argument.is_empty())
        .map(str::to_string)
        .collect();
    Some((name, Some(arguments)))
}
