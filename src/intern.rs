//! String interning for the literal tables emitted ahead of the node
//! declarations.
//!
//! Each namespace owns an append-only table: the entry sequence doubles as
//! the symbol numbering, so names are dense and ordered by first occurrence.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

/// The two literal tables. They never share symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
  /// Command words matched against (upper-cased) user input.
  Command,
  /// Descriptions and parameter help shown by the console's help printer.
  Description,
}

impl Namespace {
  pub fn prefix(self) -> &'static str {
    match self {
      Namespace::Command => "strCmd",
      Namespace::Description => "strDesc",
    }
  }
}

/// Generated name standing in for one interned literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
  namespace: Namespace,
  ordinal: usize,
}

impl Symbol {
  pub fn namespace(self) -> Namespace {
    self.namespace
  }

  /// 1-based position of the literal within its table.
  pub fn ordinal(self) -> usize {
    self.ordinal
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.namespace.prefix(), self.ordinal)
  }
}

/// Append-only literal table for a single namespace.
///
/// Keys are the literals exactly as supplied; values are the rendered
/// declarations. Re-interning a known literal returns the existing symbol.
#[derive(Debug, Clone)]
pub struct SymbolTable {
  namespace: Namespace,
  entries: IndexMap<String, String>,
}

impl SymbolTable {
  pub fn new(namespace: Namespace) -> Self {
    Self {
      namespace,
      entries: IndexMap::new(),
    }
  }

  pub fn namespace(&self) -> Namespace {
    self.namespace
  }

  pub fn intern(&mut self, literal: &str) -> Symbol {
    if let Some(index) = self.entries.get_index_of(literal) {
      return self.symbol_at(index);
    }

    let symbol = self.symbol_at(self.entries.len());
    let text = match self.namespace {
      Namespace::Command => literal.to_uppercase(),
      Namespace::Description => literal.to_string(),
    };
    let declaration = format!(
      "static const char {symbol}[] = \"{}\";",
      escape_c_string(&text)
    );
    debug!(%symbol, literal, "interned literal");
    self.entries.insert(literal.to_string(), declaration);
    symbol
  }

  /// Symbol previously assigned to `literal`, if any.
  pub fn get(&self, literal: &str) -> Option<Symbol> {
    self
      .entries
      .get_index_of(literal)
      .map(|index| self.symbol_at(index))
  }

  /// The literal a symbol of this table stands for.
  pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
    if symbol.namespace != self.namespace || symbol.ordinal == 0 {
      return None;
    }
    self
      .entries
      .get_index(symbol.ordinal - 1)
      .map(|(literal, _)| literal.as_str())
  }

  /// Rendered declarations in first-insertion order.
  pub fn declarations(&self) -> impl Iterator<Item = &str> {
    self.entries.values().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  fn symbol_at(&self, index: usize) -> Symbol {
    Symbol {
      namespace: self.namespace,
      ordinal: index + 1,
    }
  }
}

/// Both literal tables of one compilation.
#[derive(Debug, Clone)]
pub struct Interner {
  commands: SymbolTable,
  descriptions: SymbolTable,
}

impl Interner {
  pub fn new() -> Self {
    Self {
      commands: SymbolTable::new(Namespace::Command),
      descriptions: SymbolTable::new(Namespace::Description),
    }
  }

  pub fn intern(&mut self, namespace: Namespace, literal: &str) -> Symbol {
    self.table_mut(namespace).intern(literal)
  }

  pub fn table(&self, namespace: Namespace) -> &SymbolTable {
    match namespace {
      Namespace::Command => &self.commands,
      Namespace::Description => &self.descriptions,
    }
  }

  pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
    self.table(symbol.namespace).resolve(symbol)
  }

  /// Command-label declarations followed by description declarations.
  pub fn declarations(&self) -> Vec<String> {
    self
      .commands
      .declarations()
      .chain(self.descriptions.declarations())
      .map(str::to_string)
      .collect()
  }

  fn table_mut(&mut self, namespace: Namespace) -> &mut SymbolTable {
    match namespace {
      Namespace::Command => &mut self.commands,
      Namespace::Description => &mut self.descriptions,
    }
  }
}

impl Default for Interner {
  fn default() -> Self {
    Self::new()
  }
}

/// Escape text for use inside a C string literal.
pub fn escape_c_string(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '\\' => escaped.push_str("\\\\"),
      '"' => escaped.push_str("\\\""),
      '\n' => escaped.push_str("\\n"),
      '\r' => escaped.push_str("\\r"),
      '\t' => escaped.push_str("\\t"),
      _ => escaped.push(c),
    }
  }
  escaped
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn symbols_are_dense_in_first_occurrence_order() {
    let mut table = SymbolTable::new(Namespace::Command);

    let first = table.intern("status");
    let second = table.intern("config");
    let third = table.intern("reset");

    assert_eq!(first.to_string(), "strCmd1");
    assert_eq!(second.to_string(), "strCmd2");
    assert_eq!(third.to_string(), "strCmd3");
    assert_eq!(table.len(), 3);
  }

  #[test]
  fn reinterning_returns_the_same_symbol_without_a_new_entry() {
    let mut table = SymbolTable::new(Namespace::Description);

    let first = table.intern("Report status");
    table.intern("Something else");
    let again = table.intern("Report status");

    assert_eq!(first, again);
    assert_eq!(table.len(), 2);
    assert_eq!(table.declarations().count(), 2);
  }

  #[test]
  fn namespaces_number_independently() {
    let mut interner = Interner::new();

    interner.intern(Namespace::Description, "first description");
    let description = interner.intern(Namespace::Description, "GET");
    let command = interner.intern(Namespace::Command, "GET");

    assert_eq!(command.to_string(), "strCmd1");
    assert_eq!(description.to_string(), "strDesc2");
    assert_ne!(command, description);
  }

  #[test]
  fn labels_differing_only_in_case_are_distinct() {
    let mut table = SymbolTable::new(Namespace::Command);

    let lower = table.intern("get");
    let upper = table.intern("GET");

    assert_ne!(lower, upper);
    let declarations: Vec<_> = table.declarations().collect();
    assert_eq!(
      declarations,
      vec![
        "static const char strCmd1[] = \"GET\";",
        "static const char strCmd2[] = \"GET\";",
      ]
    );
  }

  #[test]
  fn descriptions_keep_their_case_and_are_escaped() {
    let mut table = SymbolTable::new(Namespace::Description);
    table.intern("Name: addr, Type: uint32_t\nSay \"hi\"");

    let declaration = table.declarations().next().unwrap();
    assert_eq!(
      declaration,
      "static const char strDesc1[] = \"Name: addr, Type: uint32_t\\nSay \\\"hi\\\"\";"
    );
  }

  #[test]
  fn resolve_maps_symbols_back_to_literals() {
    let mut interner = Interner::new();
    let symbol = interner.intern(Namespace::Command, "config");

    assert_eq!(interner.resolve(symbol), Some("config"));
    assert_eq!(interner.table(Namespace::Command).get("config"), Some(symbol));
    assert_eq!(interner.table(Namespace::Description).resolve(symbol), None);
  }

  #[test]
  fn declarations_list_commands_before_descriptions() {
    let mut interner = Interner::new();
    interner.intern(Namespace::Description, "Report status");
    interner.intern(Namespace::Command, "status");

    assert_eq!(
      interner.declarations(),
      vec![
        "static const char strCmd1[] = \"STATUS\";".to_string(),
        "static const char strDesc1[] = \"Report status\";".to_string(),
      ]
    );
  }
}
