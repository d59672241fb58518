//! Callable stubs for leaf nodes.
//!
//! Every method or gateway gets a forward declaration plus a skeleton
//! implementation the console author fills in. Gateways only receive
//! commented dispatch hints; no selection logic is generated.

use crate::command::Parameter;
use crate::forest::EndpointTarget;
use crate::intern::escape_c_string;

/// Appended to a gateway's description in its stub documentation.
pub const GATEWAY_MARKER: &str = " [GATEWAY]";

const VOID_CHECK: &str = "    if ( NULL != userInput )\n    {\n        return false;\n    }";

/// Generated declaration and body for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stub {
  pub method: String,
  pub forward: String,
  pub implementation: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StubEmitter {
  externalize: bool,
}

impl StubEmitter {
  /// `externalize` marks forward declarations `extern` for a separate
  /// translation unit.
  pub fn new(externalize: bool) -> Self {
    Self { externalize }
  }

  pub fn emit(
    &self,
    method: &str,
    description: &str,
    parameters: &[Parameter],
    endpoints: Option<&[EndpointTarget]>,
  ) -> Stub {
    let qualifier = if self.externalize { "extern " } else { "" };
    let forward = format!("{qualifier}bool {method} (const char *userInput);");

    let mut documented = description.to_string();
    if endpoints.is_some() {
      documented.push_str(GATEWAY_MARKER);
    }

    let mut scaffold = if parameters.is_empty() {
      VOID_CHECK.to_string()
    } else {
      validation_scaffold(parameters)
    };
    if let Some(endpoints) = endpoints {
      scaffold.push('\n');
      scaffold.push_str(&dispatch_hints(endpoints));
    }

    let implementation = format!(
      "// DESCRIPTION:\n\
       {}\n\
       // PARAMS:\n\
       {}\n\
       bool {method} (const char *userInput)\n\
       {{\n\
       {scaffold}\n\
       \n    printf(\"You have called: {method}\\n\");\n    return true;\n\
       }}\n",
      comment_block(&documented),
      parameter_notes(parameters),
    );

    Stub {
      method: method.to_string(),
      forward,
      implementation,
    }
  }
}

fn comment_block(text: &str) -> String {
  let lines: Vec<String> = text.lines().map(|line| format!("//   {line}")).collect();
  if lines.is_empty() {
    "//".to_string()
  } else {
    lines.join("\n")
  }
}

fn parameter_notes(parameters: &[Parameter]) -> String {
  if parameters.is_empty() {
    return "//    VOID".to_string();
  }

  let notes: Vec<String> = parameters
    .iter()
    .map(|param| {
      let description = param.description.lines().collect::<Vec<_>>().join(" ");
      match &param.format {
        Some(format) => format!(
          "//    {} {} format: {format} - {description}",
          param.ty, param.name
        ),
        None => format!("//    {} {} - {description}", param.ty, param.name),
      }
    })
    .collect();
  notes.join("\n")
}

fn validation_scaffold(parameters: &[Parameter]) -> String {
  let mut lines = vec!["    // TODO:".to_string()];
  for param in parameters {
    lines.push(match &param.format {
      Some(format) => format!(
        "    //   Validate user input and convert to name: {}, type: {}, format: {format}",
        param.name, param.ty
      ),
      None => format!(
        "    //   Validate user input and convert to name: {}, type: {}",
        param.name, param.ty
      ),
    });
  }
  lines.join("\n")
}

fn dispatch_hints(endpoints: &[EndpointTarget]) -> String {
  let Some(first) = endpoints.first() else {
    return "    //   Gateway dispatch targets: none".to_string();
  };

  let mut lines = vec![
    "    //".to_string(),
    "    //   Gateway dispatch targets:".to_string(),
  ];
  for endpoint in endpoints {
    lines.push(format!(
      "    //     \"{}\" -> {}",
      escape_c_string(&endpoint.name),
      endpoint.root
    ));
  }
  // The console upper-cases input before matching, so compare against the
  // upper-cased endpoint name.
  lines.push("    //   Example dispatch on the selected endpoint:".to_string());
  lines.push(format!(
    "    //     if (0 == strcmp(userInput, \"{}\"))",
    escape_c_string(&first.name.to_uppercase())
  ));
  lines.push("    //     {".to_string());
  lines.push(format!("    //         currentRoot = &{};", first.root));
  lines.push("    //     }".to_string());
  lines.join("\n")
}
