//! Shared error utilities used across the compilation pipeline.
//!
//! Reader diagnostics keep the caret style: the offending line of the command
//! description is echoed with a marker under the byte that triggered the
//! error. Structural violations carry the command's label and description
//! instead, since the forest builder works on records rather than text.

use std::fmt;
use std::path::PathBuf;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Ways a command record can break the branch-or-dispatch rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
  /// Nested sub-commands and a dispatch directive on the same command.
  MixedBody,
  /// Neither nested sub-commands nor a dispatch directive.
  EmptyBody,
  /// More than one dispatch directive.
  MultipleDirectives,
  /// A gateway without the parameter that selects its endpoint.
  ParameterlessGateway,
}

impl fmt::Display for Violation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let message = match self {
      Violation::MixedBody => {
        "command must be followed by either sub-commands or one dispatch directive, but not both"
      }
      Violation::EmptyBody => "command has neither sub-commands nor a dispatch directive",
      Violation::MultipleDirectives => "command declares more than one dispatch directive",
      Violation::ParameterlessGateway => "gateway must declare at least one parameter",
    };
    f.write_str(message)
  }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CompileError {
  #[snafu(display("{line_text}\n{marker} {message}"))]
  WithLocation {
    line_text: String,
    marker: String,
    message: String,
  },

  #[snafu(display("{violation}\n  command: {label}\n  description: {description}"))]
  Structural {
    violation: Violation,
    label: String,
    description: String,
  },

  #[snafu(display("malformed console description: {source}"))]
  Xml { source: roxmltree::Error },

  #[snafu(display("template {name}: {message}"))]
  Template { name: String, message: String },

  #[snafu(display("{}: {source}", path.display()))]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
}

impl CompileError {
  /// Construct an error anchored at a specific byte offset in the source.
  pub fn at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let mut safe_loc = loc.min(source.len());
    while !source.is_char_boundary(safe_loc) {
      safe_loc -= 1;
    }
    let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[safe_loc..]
      .find('\n')
      .map_or(source.len(), |i| safe_loc + i);
    let line_no = source[..line_start].matches('\n').count() + 1;

    let prefix = format!("{line_no}: ");
    let line_text = format!("{prefix}{}", source[line_start..line_end].trim_end());
    let char_offset = prefix.len() + source[line_start..safe_loc].chars().count();
    let marker = format!("{}^", " ".repeat(char_offset));
    Self::WithLocation {
      line_text,
      marker,
      message: message.into(),
    }
  }

  /// Build a structural violation for the offending command.
  pub fn structural(violation: Violation, label: &str, description: &str) -> Self {
    Self::Structural {
      violation,
      label: label.to_string(),
      description: description.to_string(),
    }
  }
}
