//! Crate root: wires together the console compilation pipeline.
//!
//! The stages are small and run strictly in order:
//! - `reader` turns the XML console description into command records.
//! - `forest` validates the records and builds the command trees, interning
//!   literals (`intern`) and emitting method stubs (`stub`) as it goes.
//! - `codegen` lowers the forest into dependency-ordered C declarations.
//! - `template` splices the fragment streams into the output documents.
//! - `error` centralises reporting utilities shared by the other modules.

pub mod codegen;
pub mod command;
pub mod error;
pub mod forest;
pub mod intern;
pub mod reader;
pub mod stub;
pub mod template;

pub use command::{CommandSpec, Directive, Endpoint, GatewayCall, MethodCall, Parameter};
pub use error::{CompileError, CompileResult, Violation};
pub use forest::{Forest, NodeId, NodeKind, TreeOrigin};
pub use intern::{Interner, Namespace, Symbol};
pub use stub::Stub;
pub use template::{AssembleOptions, Fragments, Output};

use forest::ForestBuilder;
use stub::StubEmitter;
use tracing::debug;

/// Settings that reach the compiler core.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
  /// Stubs go to a separate header/source pair; forward declarations become
  /// `extern`.
  pub externalize_stubs: bool,
}

/// Everything one compilation pass produced.
#[derive(Debug, Clone)]
pub struct Compilation {
  pub forest: Forest,
  pub interner: Interner,
  pub stubs: Vec<Stub>,
}

impl Compilation {
  /// The fragment streams handed to the template assembler.
  pub fn fragments(&self) -> Fragments {
    let root_node = self
      .forest
      .trees()
      .first()
      .map(|tree| tree.root.to_string())
      .unwrap_or_default();
    Fragments {
      strings: self.interner.declarations(),
      forward_declarations: self.stubs.iter().map(|stub| stub.forward.clone()).collect(),
      node_declarations: codegen::emit(&self.forest)
        .iter()
        .map(ToString::to_string)
        .collect(),
      implementations: self
        .stubs
        .iter()
        .map(|stub| stub.implementation.clone())
        .collect(),
      root_node,
    }
  }
}

/// Build the command forest for `commands`.
pub fn compile(commands: &[CommandSpec], options: &CompileOptions) -> CompileResult<Compilation> {
  let mut builder = ForestBuilder::new(StubEmitter::new(options.externalize_stubs));
  builder.build(commands, None)?;
  let (forest, interner, stubs) = builder.finish();
  debug!(
    nodes = forest.len(),
    trees = forest.trees().len(),
    stubs = stubs.len(),
    "compiled command forest"
  );
  Ok(Compilation {
    forest,
    interner,
    stubs,
  })
}

/// Compile an XML console description into rendered output documents.
pub fn generate_console(
  source: &str,
  options: &CompileOptions,
  assemble: &AssembleOptions,
) -> CompileResult<Output> {
  let commands = reader::read_spec(source)?;
  let compilation = compile(&commands, options)?;
  template::assemble(&compilation.fragments(), options.externalize_stubs, assemble)
}
