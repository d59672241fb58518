//! Command records handed from the reader to the forest builder.
//!
//! Records mirror the markup one-to-one: a command keeps every nested
//! sub-command and every dispatch directive it was given, so the builder can
//! judge the combination and report the offending command.

/// One typed argument of a method or gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
  pub ty: String,
  pub name: String,
  pub description: String,
  pub format: Option<String>,
}

impl Parameter {
  pub fn new(
    ty: impl Into<String>,
    name: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    Self {
      ty: ty.into(),
      name: name.into(),
      description: description.into(),
      format: None,
    }
  }

  pub fn with_format(mut self, format: impl Into<String>) -> Self {
    self.format = Some(format.into());
    self
  }

  /// One line of the help text shown by the console for this argument.
  pub fn help_line(&self) -> String {
    match &self.format {
      Some(format) => format!(
        "Name: {}, Type: {}, Format: {format}",
        self.name, self.ty
      ),
      None => format!("Name: {}, Type: {}", self.name, self.ty),
    }
  }
}

/// Plain method dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
  pub function: String,
  pub parameters: Vec<Parameter>,
}

/// Named entry point of a gateway, holding the commands of its own tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
  pub name: String,
  pub commands: Vec<CommandSpec>,
}

impl Endpoint {
  pub fn new(name: impl Into<String>, commands: Vec<CommandSpec>) -> Self {
    Self {
      name: name.into(),
      commands,
    }
  }
}

/// Parameterized dispatch that selects among endpoint trees at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
  pub function: String,
  pub parameters: Vec<Parameter>,
  pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
  Method(MethodCall),
  Gateway(GatewayCall),
}

/// A command as written in the console description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub label: String,
  pub description: String,
  pub sub_commands: Vec<CommandSpec>,
  pub directives: Vec<Directive>,
}

impl CommandSpec {
  pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      description: description.into(),
      sub_commands: Vec::new(),
      directives: Vec::new(),
    }
  }

  pub fn branch(
    label: impl Into<String>,
    description: impl Into<String>,
    sub_commands: Vec<CommandSpec>,
  ) -> Self {
    Self {
      sub_commands,
      ..Self::new(label, description)
    }
  }

  pub fn method(
    label: impl Into<String>,
    description: impl Into<String>,
    function: impl Into<String>,
    parameters: Vec<Parameter>,
  ) -> Self {
    Self::new(label, description).with_directive(Directive::Method(MethodCall {
      function: function.into(),
      parameters,
    }))
  }

  pub fn gateway(
    label: impl Into<String>,
    description: impl Into<String>,
    function: impl Into<String>,
    parameters: Vec<Parameter>,
    endpoints: Vec<Endpoint>,
  ) -> Self {
    Self::new(label, description).with_directive(Directive::Gateway(GatewayCall {
      function: function.into(),
      parameters,
      endpoints,
    }))
  }

  pub fn with_sub_command(mut self, command: CommandSpec) -> Self {
    self.sub_commands.push(command);
    self
  }

  pub fn with_directive(mut self, directive: Directive) -> Self {
    self.directives.push(directive);
    self
  }
}

/// Help text for a parameter list: one line per parameter, or `None` when
/// the list is empty.
pub fn parameter_help(parameters: &[Parameter]) -> Option<String> {
  if parameters.is_empty() {
    return None;
  }
  let lines: Vec<String> = parameters.iter().map(Parameter::help_line).collect();
  Some(lines.join("\n"))
}
