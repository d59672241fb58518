//! Declaration emission: lower the forest into static C node records and
//! branch arrays.
//!
//! C forbids forward references between these static objects, so every child
//! record and every branch array has to be declared before the record that
//! points at it. The ledger is a pre-order walk (parent first, then all of its
//! descendants, then its next sibling), so emitting each node's record
//! followed by its branch array and reversing the whole sequence puts every
//! dependency ahead of its dependent.

use std::fmt;

use crate::forest::{BranchArray, Forest, Node, NodeId, NodeKind};
use crate::intern::Symbol;

/// The half of a node record that depends on its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
  Leaf {
    method: String,
    help: Option<Symbol>,
  },
  Branch {
    child_count: usize,
    children: Option<BranchArray>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
  Node {
    id: NodeId,
    label: Option<Symbol>,
    description: Option<Symbol>,
    body: RecordBody,
  },
  BranchArray {
    array: BranchArray,
    children: Vec<NodeId>,
  },
}

impl Declaration {
  /// Every node this declaration takes the address of.
  pub fn references(&self) -> &[NodeId] {
    match self {
      Declaration::Node { .. } => &[],
      Declaration::BranchArray { children, .. } => children,
    }
  }
}

struct OrNull<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrNull<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.0 {
      Some(value) => fmt::Display::fmt(value, f),
      None => f.write_str("NULL"),
    }
  }
}

impl fmt::Display for Declaration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Declaration::Node {
        id,
        label,
        description,
        body,
      } => {
        let (method, help, count, children) = match body {
          RecordBody::Leaf { method, help } => {
            (Some(method.as_str()), *help, 0, None)
          }
          RecordBody::Branch {
            child_count,
            children,
          } => (None, None, *child_count, *children),
        };
        write!(
          f,
          "static const commandTreeNode_t  {id} = {{ .name={}, .desc={}, .method={}, .argDesc={}, .childCount={count}, .children={} }};",
          OrNull(*label),
          OrNull(*description),
          OrNull(method),
          OrNull(help),
          OrNull(children),
        )
      }
      Declaration::BranchArray { array, children } => {
        let refs: Vec<String> = children.iter().map(|child| format!("&{child}")).collect();
        write!(
          f,
          "static const commandTreeNode_t* {array}[] = {{{}}};",
          refs.join(", ")
        )
      }
    }
  }
}

/// Emit declarations for every node of the forest in dependency order.
pub fn emit(forest: &Forest) -> Vec<Declaration> {
  let mut declarations = Vec::with_capacity(forest.len() * 2);

  for node in forest.ledger() {
    declarations.push(node_record(node));
    if let Some(array) = node.branch_array {
      declarations.push(Declaration::BranchArray {
        array,
        children: node.children.clone(),
      });
    }
  }

  declarations.reverse();
  declarations
}

fn node_record(node: &Node) -> Declaration {
  let body = match &node.kind {
    NodeKind::Branch => RecordBody::Branch {
      child_count: node.children.len(),
      children: node.branch_array,
    },
    NodeKind::Method(leaf) | NodeKind::Gateway { leaf, .. } => RecordBody::Leaf {
      method: leaf.method_name.clone(),
      help: leaf.help,
    },
  };
  Declaration::Node {
    id: node.id,
    label: node.label,
    description: node.description,
    body,
  }
}
