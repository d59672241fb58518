//! Forest construction: turn command records into independent command trees.
//!
//! Nodes live in one arena in creation order. That order is the ledger the
//! declaration emitter walks, so it must stay a pre-order traversal of every
//! tree: a node is created right after its parent and all of its descendants
//! are created before its next sibling. Parents are only ever passed down the
//! recursion, never stored.
//!
//! A gateway forks the forest: each of its endpoints becomes a new tree with
//! a synthetic root, and the gateway itself stays a leaf of the tree it was
//! declared in.

use std::fmt::{self, Write as _};

use tracing::debug;

use crate::command::{CommandSpec, Directive, GatewayCall, MethodCall, Parameter, parameter_help};
use crate::error::{CompileError, CompileResult, Violation};
use crate::intern::{Interner, Namespace, Symbol};
use crate::stub::{Stub, StubEmitter};

/// Process-unique node identity, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
  pub(crate) fn new(raw: u32) -> Self {
    Self(raw)
  }

  pub fn get(self) -> u32 {
    self.0
  }

  fn index(self) -> usize {
    (self.0 - 1) as usize
  }
}

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "node{}", self.0)
  }
}

/// Name of the child-pointer array owned by a branch node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchArray(NodeId);

impl BranchArray {
  pub fn owner(self) -> NodeId {
    self.0
  }
}

impl fmt::Display for BranchArray {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "arrNode{}", self.0.0)
  }
}

/// Dispatch data of a method or gateway node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
  pub method_name: String,
  pub parameters: Vec<Parameter>,
  /// Parameter help, interned only when there is at least one parameter.
  pub help: Option<Symbol>,
}

/// A gateway endpoint and the root of the tree built for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTarget {
  pub name: String,
  pub root: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
  Branch,
  Method(Leaf),
  Gateway {
    leaf: Leaf,
    endpoints: Vec<EndpointTarget>,
  },
}

impl NodeKind {
  pub fn leaf(&self) -> Option<&Leaf> {
    match self {
      NodeKind::Branch => None,
      NodeKind::Method(leaf) | NodeKind::Gateway { leaf, .. } => Some(leaf),
    }
  }

  pub fn is_branch(&self) -> bool {
    matches!(self, NodeKind::Branch)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  pub id: NodeId,
  /// `None` for synthetic roots.
  pub label: Option<Symbol>,
  /// `None` for synthetic roots.
  pub description: Option<Symbol>,
  pub kind: NodeKind,
  pub children: Vec<NodeId>,
  /// Assigned when the first child is attached.
  pub branch_array: Option<BranchArray>,
}

impl Node {
  fn new(id: NodeId, label: Option<Symbol>, description: Option<Symbol>) -> Self {
    Self {
      id,
      label,
      description,
      kind: NodeKind::Branch,
      children: Vec::new(),
      branch_array: None,
    }
  }
}

/// Where a tree came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOrigin {
  /// The top-level commands of the description.
  Main,
  /// Commands reachable through one endpoint of a gateway.
  Endpoint { name: String, gateway: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
  pub root: NodeId,
  pub origin: TreeOrigin,
}

/// All trees of one compilation plus the creation-ordered node ledger.
#[derive(Debug, Clone, Default)]
pub struct Forest {
  nodes: Vec<Node>,
  trees: Vec<Tree>,
}

impl Forest {
  /// Look up a node of this forest.
  ///
  /// Panics if `id` was produced by a different forest.
  pub fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.index()]
  }

  pub fn get(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(id.index())
  }

  /// Every node in creation order.
  pub fn ledger(&self) -> &[Node] {
    &self.nodes
  }

  pub fn trees(&self) -> &[Tree] {
    &self.trees
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// `root` and everything below it, in pre-order.
  pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
      out.push(id);
      stack.extend(self.node(id).children.iter().rev().copied());
    }
    out
  }

  /// Indented outline of every tree, for debugging a console description.
  pub fn outline(&self, interner: &Interner) -> String {
    let mut out = String::new();
    for (index, tree) in self.trees.iter().enumerate() {
      let origin = match &tree.origin {
        TreeOrigin::Main => "main".to_string(),
        TreeOrigin::Endpoint { name, gateway } => format!("endpoint \"{name}\" via {gateway}"),
      };
      let _ = writeln!(out, "tree {index} ({origin}) {}", tree.root);
      for child in &self.node(tree.root).children {
        self.outline_node(*child, 1, interner, &mut out);
      }
    }
    out
  }

  fn outline_node(&self, id: NodeId, depth: usize, interner: &Interner, out: &mut String) {
    let node = self.node(id);
    let resolve = |symbol: Option<Symbol>| {
      symbol
        .and_then(|symbol| interner.resolve(symbol))
        .unwrap_or("~")
    };
    let _ = write!(
      out,
      "{}{id} {} - {}",
      "  ".repeat(depth),
      resolve(node.label),
      resolve(node.description)
    );
    match &node.kind {
      NodeKind::Branch => {}
      NodeKind::Method(leaf) => {
        let _ = write!(out, " -> {}()", leaf.method_name);
      }
      NodeKind::Gateway { leaf, endpoints } => {
        let targets: Vec<String> = endpoints
          .iter()
          .map(|endpoint| format!("{}={}", endpoint.name, endpoint.root))
          .collect();
        let _ = write!(
          out,
          " -> {}() [gateway: {}]",
          leaf.method_name,
          targets.join(", ")
        );
      }
    }
    out.push('\n');
    for child in &node.children {
      self.outline_node(*child, depth + 1, interner, out);
    }
  }

  fn node_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.index()]
  }

  fn attach(&mut self, parent: NodeId, child: NodeId) {
    let parent = self.node_mut(parent);
    if parent.branch_array.is_none() {
      parent.branch_array = Some(BranchArray(parent.id));
    }
    parent.children.push(child);
  }
}

/// How a validated command record is to be built.
enum Body<'a> {
  Branch(&'a [CommandSpec]),
  Method(&'a MethodCall),
  Gateway(&'a GatewayCall),
}

fn classify(command: &CommandSpec) -> CompileResult<Body<'_>> {
  let violation = match (command.sub_commands.is_empty(), command.directives.as_slice()) {
    (false, []) => return Ok(Body::Branch(&command.sub_commands)),
    (true, [Directive::Method(call)]) => return Ok(Body::Method(call)),
    (true, [Directive::Gateway(call)]) if !call.parameters.is_empty() => {
      return Ok(Body::Gateway(call));
    }
    (true, [Directive::Gateway(_)]) => Violation::ParameterlessGateway,
    (false, _) => Violation::MixedBody,
    (true, []) => Violation::EmptyBody,
    (true, _) => Violation::MultipleDirectives,
  };
  Err(CompileError::structural(
    violation,
    &command.label,
    &command.description,
  ))
}

/// Single-pass builder owning the forest, both literal tables and the
/// stubs emitted along the way.
#[derive(Debug)]
pub struct ForestBuilder {
  forest: Forest,
  interner: Interner,
  emitter: StubEmitter,
  stubs: Vec<Stub>,
  last_id: u32,
}

impl ForestBuilder {
  pub fn new(emitter: StubEmitter) -> Self {
    Self {
      forest: Forest::default(),
      interner: Interner::new(),
      emitter,
      stubs: Vec::new(),
      last_id: 0,
    }
  }

  /// Build `commands` under `parent`, or under a new main-tree root when
  /// `parent` is `None`. Returns the node the commands were attached to.
  pub fn build(
    &mut self,
    commands: &[CommandSpec],
    parent: Option<NodeId>,
  ) -> CompileResult<NodeId> {
    let parent = match parent {
      Some(parent) => parent,
      None => self.create_root(TreeOrigin::Main),
    };

    for command in commands {
      self.build_command(command, parent)?;
    }
    Ok(parent)
  }

  pub fn finish(self) -> (Forest, Interner, Vec<Stub>) {
    (self.forest, self.interner, self.stubs)
  }

  fn build_command(&mut self, command: &CommandSpec, parent: NodeId) -> CompileResult<()> {
    let body = classify(command)?;

    let label = self.interner.intern(Namespace::Command, &command.label);
    let description = self
      .interner
      .intern(Namespace::Description, &command.description);
    let node = self.create_node(Some(parent), Some(label), Some(description));

    match body {
      Body::Branch(sub_commands) => {
        self.build(sub_commands, Some(node))?;
      }
      Body::Method(call) => {
        let leaf = self.leaf(&call.function, &call.parameters);
        self.forest.node_mut(node).kind = NodeKind::Method(leaf);
        self.push_stub(&call.function, &command.description, &call.parameters, None);
      }
      Body::Gateway(call) => {
        let leaf = self.leaf(&call.function, &call.parameters);

        let mut endpoints = Vec::with_capacity(call.endpoints.len());
        for endpoint in &call.endpoints {
          let root = self.create_root(TreeOrigin::Endpoint {
            name: endpoint.name.clone(),
            gateway: node,
          });
          self.build(&endpoint.commands, Some(root))?;
          endpoints.push(EndpointTarget {
            name: endpoint.name.clone(),
            root,
          });
        }

        self.push_stub(
          &call.function,
          &command.description,
          &call.parameters,
          Some(&endpoints),
        );
        self.forest.node_mut(node).kind = NodeKind::Gateway { leaf, endpoints };
      }
    }
    Ok(())
  }

  fn leaf(&mut self, method_name: &str, parameters: &[Parameter]) -> Leaf {
    let help = parameter_help(parameters)
      .map(|help| self.interner.intern(Namespace::Description, &help));
    debug!(method = method_name, help = ?help.map(|symbol| symbol.to_string()), "converted node to leaf");
    Leaf {
      method_name: method_name.to_string(),
      parameters: parameters.to_vec(),
      help,
    }
  }

  fn push_stub(
    &mut self,
    method: &str,
    description: &str,
    parameters: &[Parameter],
    endpoints: Option<&[EndpointTarget]>,
  ) {
    let stub = self.emitter.emit(method, description, parameters, endpoints);
    debug!(method, "emitted stub");
    self.stubs.push(stub);
  }

  fn create_root(&mut self, origin: TreeOrigin) -> NodeId {
    let root = self.create_node(None, None, None);
    debug!(%root, ?origin, "started tree");
    self.forest.trees.push(Tree { root, origin });
    root
  }

  fn create_node(
    &mut self,
    parent: Option<NodeId>,
    label: Option<Symbol>,
    description: Option<Symbol>,
  ) -> NodeId {
    self.last_id += 1;
    let id = NodeId(self.last_id);
    self.forest.nodes.push(Node::new(id, label, description));
    if let Some(parent) = parent {
      self.forest.attach(parent, id);
    }
    debug!(node = %id, parent = ?parent.map(NodeId::get), "created node");
    id
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::command::Endpoint;

  fn build(commands: &[CommandSpec]) -> CompileResult<(Forest, Interner, Vec<Stub>)> {
    let mut builder = ForestBuilder::new(StubEmitter::default());
    builder.build(commands, None)?;
    Ok(builder.finish())
  }

  fn violation_of(result: CompileResult<(Forest, Interner, Vec<Stub>)>) -> Violation {
    match result {
      Err(CompileError::Structural { violation, .. }) => violation,
      Err(other) => panic!("expected a structural violation, got {other}"),
      Ok(_) => panic!("expected a structural violation, but the build succeeded"),
    }
  }

  fn status() -> CommandSpec {
    CommandSpec::method("status", "Report status", "statusCmd", vec![])
  }

  fn bus_param() -> Vec<Parameter> {
    vec![Parameter::new("char*", "bus", "Bus to select")]
  }

  #[test]
  fn identities_follow_creation_order_from_one() {
    let commands = vec![
      CommandSpec::branch(
        "config",
        "Configuration",
        vec![
          CommandSpec::method("get", "Read", "cfgGet", vec![]),
          CommandSpec::method("set", "Write", "cfgSet", vec![]),
        ],
      ),
      status(),
    ];
    let (forest, _, _) = build(&commands).unwrap();

    let ids: Vec<u32> = forest.ledger().iter().map(|node| node.id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(forest.trees().len(), 1);

    let root = forest.node(NodeId(1));
    assert_eq!(root.label, None);
    assert_eq!(root.children, vec![NodeId(2), NodeId(5)]);
    assert_eq!(forest.node(NodeId(2)).children, vec![NodeId(3), NodeId(4)]);
  }

  #[test]
  fn branch_arrays_are_named_after_their_owner_and_only_when_needed() {
    let (forest, _, _) = build(&[status()]).unwrap();

    assert_eq!(
      forest.node(NodeId(1)).branch_array.map(|a| a.to_string()),
      Some("arrNode1".to_string())
    );
    assert_eq!(forest.node(NodeId(2)).branch_array, None);

    let (empty, _, _) = build(&[]).unwrap();
    assert_eq!(empty.len(), 1);
    assert_eq!(empty.node(NodeId(1)).branch_array, None);
  }

  #[test]
  fn method_leaf_interns_help_only_with_parameters() {
    let commands = vec![
      status(),
      CommandSpec::method(
        "peek",
        "Read memory",
        "peekCmd",
        vec![Parameter::new("uint32_t", "addr", "Address").with_format("HEX")],
      ),
    ];
    let (forest, interner, stubs) = build(&commands).unwrap();

    let status = forest.node(NodeId(2)).kind.leaf().unwrap();
    assert_eq!(status.help, None);

    let peek = forest.node(NodeId(3)).kind.leaf().unwrap();
    let help = peek.help.unwrap();
    assert_eq!(help.to_string(), "strDesc3");
    assert_eq!(
      interner.resolve(help),
      Some("Name: addr, Type: uint32_t, Format: HEX")
    );
    assert_eq!(stubs.len(), 2);
    assert_eq!(stubs[1].method, "peekCmd");
  }

  #[test]
  fn repeated_labels_share_a_symbol() {
    let commands = vec![
      CommandSpec::branch("a", "First", vec![CommandSpec::method("get", "Read", "aGet", vec![])]),
      CommandSpec::branch("b", "Second", vec![CommandSpec::method("get", "Read", "bGet", vec![])]),
    ];
    let (forest, interner, _) = build(&commands).unwrap();

    let first = forest.node(NodeId(3)).label;
    let second = forest.node(NodeId(5)).label;
    assert_eq!(first, second);
    assert_eq!(interner.table(Namespace::Command).len(), 3);
    assert_eq!(interner.table(Namespace::Description).len(), 3);
  }

  #[test]
  fn sub_commands_and_a_method_together_are_rejected() {
    let mixed = status().with_sub_command(CommandSpec::method("x", "y", "z", vec![]));
    assert_eq!(violation_of(build(&[mixed])), Violation::MixedBody);
  }

  #[test]
  fn command_without_body_is_rejected_regardless_of_description() {
    for description in ["", "Report status", "has <callMethod> in text"] {
      let empty = CommandSpec::new("status", description);
      assert_eq!(violation_of(build(&[empty])), Violation::EmptyBody);
    }
  }

  #[test]
  fn two_directives_are_rejected() {
    let twice = status().with_directive(Directive::Method(MethodCall {
      function: "again".to_string(),
      parameters: vec![],
    }));
    assert_eq!(violation_of(build(&[twice])), Violation::MultipleDirectives);
  }

  #[test]
  fn parameterless_gateway_is_rejected() {
    let gateway = CommandSpec::gateway(
      "route",
      "Pick a bus",
      "routeTo",
      vec![],
      vec![Endpoint::new("A", vec![status()])],
    );
    assert_eq!(violation_of(build(&[gateway])), Violation::ParameterlessGateway);
  }

  #[test]
  fn nested_violation_reports_the_inner_command() {
    let commands = vec![CommandSpec::branch(
      "config",
      "Configuration",
      vec![CommandSpec::new("broken", "No body here")],
    )];
    match build(&commands) {
      Err(CompileError::Structural {
        label, description, ..
      }) => {
        assert_eq!(label, "broken");
        assert_eq!(description, "No body here");
      }
      other => panic!("unexpected result: {other:?}"),
    }
  }

  #[test]
  fn gateway_endpoints_become_disjoint_trees() {
    let gateway = CommandSpec::gateway(
      "route",
      "Pick a bus",
      "routeTo",
      bus_param(),
      vec![
        Endpoint::new("A", vec![CommandSpec::method("read", "Read A", "aRead", vec![])]),
        Endpoint::new(
          "B",
          vec![CommandSpec::branch(
            "reg",
            "Registers",
            vec![CommandSpec::method("dump", "Dump B", "bDump", vec![])],
          )],
        ),
      ],
    );
    let (forest, _, stubs) = build(&[gateway]).unwrap();

    let trees = forest.trees();
    assert_eq!(trees.len(), 3);
    assert_eq!(trees[0].origin, TreeOrigin::Main);
    let gateway_id = NodeId(2);
    assert_eq!(
      trees[1].origin,
      TreeOrigin::Endpoint {
        name: "A".to_string(),
        gateway: gateway_id
      }
    );

    let main: Vec<NodeId> = forest.descendants(trees[0].root);
    assert_eq!(main, vec![NodeId(1), gateway_id]);
    for endpoint_tree in &trees[1..] {
      let members = forest.descendants(endpoint_tree.root);
      assert!(members.iter().all(|id| !main.contains(id)));
      assert_eq!(forest.node(endpoint_tree.root).label, None);
      assert_eq!(forest.node(endpoint_tree.root).description, None);
    }
    assert_eq!(forest.descendants(trees[2].root).len(), 3);

    let NodeKind::Gateway { leaf, endpoints } = &forest.node(gateway_id).kind else {
      panic!("expected a gateway node");
    };
    assert_eq!(leaf.method_name, "routeTo");
    assert!(leaf.help.is_some());
    assert_eq!(
      endpoints,
      &vec![
        EndpointTarget {
          name: "A".to_string(),
          root: trees[1].root
        },
        EndpointTarget {
          name: "B".to_string(),
          root: trees[2].root
        },
      ]
    );
    assert!(forest.node(gateway_id).children.is_empty());

    let gateway_stub = stubs.last().unwrap();
    assert_eq!(gateway_stub.method, "routeTo");
    assert_eq!(stubs.len(), 3);
  }

  #[test]
  fn outline_lists_trees_and_leaves() {
    let gateway = CommandSpec::gateway(
      "route",
      "Pick a bus",
      "routeTo",
      bus_param(),
      vec![Endpoint::new("A", vec![status()])],
    );
    let (forest, interner, _) = build(&[gateway]).unwrap();

    assert_eq!(
      forest.outline(&interner),
      "tree 0 (main) node1\n\
       \x20 node2 route - Pick a bus -> routeTo() [gateway: A=node3]\n\
       tree 1 (endpoint \"A\" via node2) node3\n\
       \x20 node4 status - Report status -> statusCmd()\n"
    );
  }
}
