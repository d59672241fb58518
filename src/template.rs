//! Template assembly: splice the generated fragment streams into the output
//! documents.
//!
//! The console document is always produced. With externalized stubs, forward
//! declarations and implementations move to a header/source pair and the
//! console only includes the header. Nothing touches the filesystem until
//! every document has rendered.

use std::fs;
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::error::{CompileError, CompileResult, IoSnafu};

pub const CONSOLE_TEMPLATE: &str = include_str!("../templates/console.c.liquid");
pub const STUB_HEADER_TEMPLATE: &str = include_str!("../templates/stubs.h.liquid");
pub const STUB_SOURCE_TEMPLATE: &str = include_str!("../templates/stubs.c.liquid");

/// The four fragment streams of one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
  pub strings: Vec<String>,
  pub forward_declarations: Vec<String>,
  pub node_declarations: Vec<String>,
  pub implementations: Vec<String>,
  /// Node the console starts walking from.
  pub root_node: String,
}

#[derive(Debug, Clone)]
pub struct AssembleOptions {
  pub output: PathBuf,
  /// Defaults to `<output stem>_stubs.h` next to the output.
  pub header: Option<PathBuf>,
  /// Defaults to `<output stem>_stubs.c` next to the output.
  pub source: Option<PathBuf>,
  /// Replaces the built-in console template.
  pub template: Option<String>,
  pub generated_at: String,
}

impl AssembleOptions {
  pub fn new(output: impl Into<PathBuf>) -> Self {
    Self {
      output: output.into(),
      header: None,
      source: None,
      template: None,
      generated_at: String::new(),
    }
  }

  fn stub_path(&self, explicit: Option<&PathBuf>, extension: &str) -> PathBuf {
    if let Some(path) = explicit {
      return path.clone();
    }
    let stem = self
      .output
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_else(|| "console".to_string());
    self
      .output
      .with_file_name(format!("{stem}_stubs.{extension}"))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  pub path: PathBuf,
  pub contents: String,
}

/// Rendered documents, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
  pub console: Document,
  pub header: Option<Document>,
  pub source: Option<Document>,
}

impl Output {
  pub fn documents(&self) -> impl Iterator<Item = &Document> {
    std::iter::once(&self.console)
      .chain(self.header.as_ref())
      .chain(self.source.as_ref())
  }

  pub fn write_all(&self) -> CompileResult<()> {
    for document in self.documents() {
      fs::write(&document.path, &document.contents).context(IoSnafu {
        path: document.path.clone(),
      })?;
    }
    Ok(())
  }
}

/// Render every output document for `fragments`.
pub fn assemble(
  fragments: &Fragments,
  externalize: bool,
  options: &AssembleOptions,
) -> CompileResult<Output> {
  let parser = liquid::ParserBuilder::with_stdlib()
    .build()
    .map_err(|err| template_error("parser", err))?;

  let header_path = options.stub_path(options.header.as_ref(), "h");
  let header_name = file_name(&header_path);
  let globals = liquid::object!({
    "generated_at": options.generated_at.clone(),
    "externalize": externalize,
    "header_name": header_name.clone(),
    "header_guard": header_guard(&header_name),
    "root_node": fragments.root_node.clone(),
    "string_declarations": fragments.strings.join("\n"),
    "forward_declarations": fragments.forward_declarations.join("\n"),
    "node_declarations": fragments.node_declarations.join("\n"),
    "implementations": fragments.implementations.join("\n")
  });

  let render = |name: &str, source: &str| -> CompileResult<String> {
    parser
      .parse(source)
      .map_err(|err| template_error(name, err))?
      .render(&globals)
      .map_err(|err| template_error(name, err))
  };

  let console_template = options.template.as_deref().unwrap_or(CONSOLE_TEMPLATE);
  let console = Document {
    path: options.output.clone(),
    contents: render("console", console_template)?,
  };
  if !externalize {
    return Ok(Output {
      console,
      header: None,
      source: None,
    });
  }

  let header = Document {
    contents: render("stub header", STUB_HEADER_TEMPLATE)?,
    path: header_path,
  };
  let source = Document {
    path: options.stub_path(options.source.as_ref(), "c"),
    contents: render("stub source", STUB_SOURCE_TEMPLATE)?,
  };
  Ok(Output {
    console,
    header: Some(header),
    source: Some(source),
  })
}

fn template_error(name: &str, err: liquid::Error) -> CompileError {
  CompileError::Template {
    name: name.to_string(),
    message: err.to_string(),
  }
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}

fn header_guard(header_name: &str) -> String {
  let guard: String = header_name
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() {
        c.to_ascii_uppercase()
      } else {
        '_'
      }
    })
    .collect();
  format!("{guard}_")
}
