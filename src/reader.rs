//! Reading the XML console description into command records.
//!
//! The reader is purely structural. It insists on the attributes and
//! elements every record needs and reports them against the source line, but
//! it does not judge how sub-commands and directives are combined; that is
//! the forest builder's call.

use roxmltree::{Document, Node};
use snafu::ResultExt;
use tracing::debug;

use crate::command::{CommandSpec, Directive, Endpoint, GatewayCall, MethodCall, Parameter};
use crate::error::{CompileError, CompileResult, XmlSnafu};

/// Parse a console description. The document element's `<command>` children
/// are the top-level commands.
pub fn read_spec(source: &str) -> CompileResult<Vec<CommandSpec>> {
  let document = Document::parse(source).context(XmlSnafu)?;
  let reader = SpecReader { source };
  let commands = reader.commands(document.root_element())?;
  debug!(commands = commands.len(), "read console description");
  Ok(commands)
}

struct SpecReader<'a> {
  source: &'a str,
}

impl SpecReader<'_> {
  fn commands(&self, parent: Node<'_, '_>) -> CompileResult<Vec<CommandSpec>> {
    elements(parent, "command")
      .map(|node| self.command(node))
      .collect()
  }

  fn command(&self, node: Node<'_, '_>) -> CompileResult<CommandSpec> {
    let label = self.attribute(node, "text")?;
    let description = self.child_text(node, "description")?;
    let sub_commands = self.commands(node)?;

    let mut directives = Vec::new();
    for child in node.children().filter(Node::is_element) {
      match child.tag_name().name() {
        "callMethod" => directives.push(Directive::Method(MethodCall {
          function: self.attribute(child, "function")?,
          parameters: self.parameters(child)?,
        })),
        "gateway" => directives.push(Directive::Gateway(self.gateway(child)?)),
        _ => {}
      }
    }

    Ok(CommandSpec {
      label,
      description,
      sub_commands,
      directives,
    })
  }

  fn gateway(&self, node: Node<'_, '_>) -> CompileResult<GatewayCall> {
    let endpoints = elements(node, "endpoint")
      .map(|endpoint| {
        Ok(Endpoint {
          name: self.attribute(endpoint, "name")?,
          commands: self.commands(endpoint)?,
        })
      })
      .collect::<CompileResult<Vec<_>>>()?;

    Ok(GatewayCall {
      function: self.attribute(node, "function")?,
      parameters: self.parameters(node)?,
      endpoints,
    })
  }

  fn parameters(&self, node: Node<'_, '_>) -> CompileResult<Vec<Parameter>> {
    elements(node, "param")
      .map(|param| {
        Ok(Parameter {
          ty: self.child_text(param, "type")?,
          name: self.child_text(param, "name")?,
          description: self.child_text(param, "description")?,
          format: elements(param, "format").next().map(element_text),
        })
      })
      .collect()
  }

  fn attribute(&self, node: Node<'_, '_>, name: &str) -> CompileResult<String> {
    node.attribute(name).map(str::to_string).ok_or_else(|| {
      CompileError::at(
        self.source,
        node.range().start,
        format!(
          "<{}> is missing the \"{name}\" attribute",
          node.tag_name().name()
        ),
      )
    })
  }

  fn child_text(&self, node: Node<'_, '_>, tag: &str) -> CompileResult<String> {
    elements(node, tag).next().map(element_text).ok_or_else(|| {
      CompileError::at(
        self.source,
        node.range().start,
        format!("<{}> is missing a <{tag}> element", node.tag_name().name()),
      )
    })
  }
}

fn elements<'a, 'input>(
  parent: Node<'a, 'input>,
  tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
  parent
    .children()
    .filter(move |child| child.is_element() && child.has_tag_name(tag))
}

fn element_text(node: Node<'_, '_>) -> String {
  node.text().unwrap_or_default().trim().to_string()
}
