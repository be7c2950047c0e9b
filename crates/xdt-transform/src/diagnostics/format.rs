//! Positional message templates (`"Set {0} on {1,-8}"`).

use thiserror::Error;
use xdt_engine::MessageArg;

/// Errors raised while rendering a template or building a timestamp format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("placeholder index {index} is out of range for {count} argument(s)")]
    MissingArgument { index: usize, count: usize },

    #[error("malformed placeholder at byte {position}")]
    Malformed { position: usize },

    #[error("invalid timestamp format '{pattern}'")]
    InvalidTimestampFormat { pattern: String },
}

/// Substitutes `args` into `template`.
///
/// Supports `{index}`, `{index,alignment}` and `{index:format}`; the format
/// part is accepted and ignored. `{{` and `}}` produce literal braces.
pub fn interpolate(template: &str, args: &[MessageArg]) -> Result<String, FormatError> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((position, ch)) = chars.next() {
        match ch {
            '{' if chars.next_if(|&(_, next)| next == '{').is_some() => output.push('{'),
            '}' if chars.next_if(|&(_, next)| next == '}').is_some() => output.push('}'),
            '}' => return Err(FormatError::Malformed { position }),
            '{' => {
                let mut spec = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(FormatError::Malformed { position }),
                        Some((_, other)) => spec.push(other),
                    }
                }
                let placeholder =
                    Placeholder::parse(&spec).ok_or(FormatError::Malformed { position })?;
                let arg = args
                    .get(placeholder.index)
                    .ok_or(FormatError::MissingArgument {
                        index: placeholder.index,
                        count: args.len(),
                    })?;
                placeholder.write(&mut output, arg);
            }
            other => output.push(other),
        }
    }
    Ok(output)
}

/// Largest accepted `{index,alignment}` magnitude.
const MAX_ALIGNMENT: u32 = 1_000_000;

struct Placeholder {
    index: usize,
    alignment: i32,
}

impl Placeholder {
    fn parse(spec: &str) -> Option<Self> {
        let head = spec.split_once(':').map_or(spec, |(head, _)| head);
        let (index, alignment): (&str, i32) = match head.split_once(',') {
            Some((index, alignment)) => (index, alignment.trim().parse().ok()?),
            None => (head, 0),
        };
        if alignment.unsigned_abs() > MAX_ALIGNMENT {
            return None;
        }
        let index = index.trim();
        if index.is_empty() || !index.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            index: index.parse().ok()?,
            alignment,
        })
    }

    fn write(&self, output: &mut String, arg: &MessageArg) {
        let text = arg.to_string();
        let width = usize::try_from(self.alignment.unsigned_abs()).unwrap_or(0);
        let padding = " ".repeat(width.saturating_sub(text.chars().count()));
        if self.alignment < 0 {
            output.push_str(&text);
            output.push_str(&padding);
        } else {
            output.push_str(&padding);
            output.push_str(&text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Vec<MessageArg> {
        vec![MessageArg::from("1"), MessageArg::from(2)]
    }

    #[test]
    fn test_positional_placeholders() {
        assert_eq!(interpolate("Message {0} {1}", &args()).unwrap(), "Message 1 2");
        assert_eq!(interpolate("{1}{0}{1}", &args()).unwrap(), "212");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(interpolate("{{{0}}}", &args()).unwrap(), "{1}");
    }

    #[test]
    fn test_alignment_and_ignored_format() {
        assert_eq!(interpolate("[{0,3}]", &args()).unwrap(), "[  1]");
        assert_eq!(interpolate("[{0,-3}]", &args()).unwrap(), "[1  ]");
        assert_eq!(interpolate("{1:D4}", &args()).unwrap(), "2");
    }

    #[test]
    fn test_wide_alignment_pads_without_panicking() {
        let output = interpolate("{0,70000}", &args()).unwrap();
        assert_eq!(output.len(), 70_000);
        assert!(output.ends_with(" 1"));

        let output = interpolate("{0,-70000}|", &args()).unwrap();
        assert!(output.starts_with("1 "));
        assert!(output.ends_with(" |"));
    }

    #[test]
    fn test_alignment_beyond_limit_is_malformed() {
        assert_eq!(
            interpolate("x {0,1000001}", &args()),
            Err(FormatError::Malformed { position: 2 })
        );
        assert!(interpolate("{0,-2147483648}", &args()).is_err());
        assert!(interpolate("{0,1000000}", &args()).is_ok());
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(
            interpolate("{2}", &args()),
            Err(FormatError::MissingArgument { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_malformed_placeholders() {
        assert_eq!(
            interpolate("oops {", &args()),
            Err(FormatError::Malformed { position: 5 })
        );
        assert!(interpolate("a } b", &args()).is_err());
        assert!(interpolate("{x}", &args()).is_err());
        assert!(interpolate("{}", &args()).is_err());
    }

    #[test]
    fn test_template_without_placeholders() {
        assert_eq!(interpolate("plain", &[]).unwrap(), "plain");
        assert_eq!(interpolate("", &[]).unwrap(), "");
    }
}
