// Copyright (c) 2018 Fabian Schuiki

//! Derivation trees reconstructed from the output of a parser.
//!
//! A left parse lists rules in the order of a leftmost derivation, so the
//! tree is grown by always expanding the leftmost open nonterminal. A right
//! parse lists the reductions of a shift-reduce parser; read backwards it is
//! a rightmost derivation, and the tree is grown by always expanding the
//! rightmost open nonterminal.

use std::fmt;

use thiserror::Error;

use crate::grammar::{Grammar, RuleId, Symbol, TerminalId};
use crate::Pretty;

/// An error that occurs when a rule sequence does not form a derivation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// No rules were given.
    #[error("empty parse")]
    Empty,
    /// A rule does not expand the nonterminal that is next in line.
    #[error("rule {index} expands `{found}`, but `{expected}` is next")]
    Mismatch {
        /// The index of the offending rule in the parse.
        index: usize,
        /// The nonterminal that is next in line.
        expected: String,
        /// The nonterminal the rule expands.
        found: String,
    },
    /// The rules ran out with nonterminals left unexpanded.
    #[error("{remaining} nonterminals left unexpanded")]
    Incomplete {
        /// The number of unexpanded nonterminals.
        remaining: usize,
    },
    /// Rules are left over after the tree is complete.
    #[error("derivation is complete after {index} rules")]
    Excess {
        /// The index of the first rule left over.
        index: usize,
    },
}

/// The index of a node within a derivation tree.
pub type NodeId = usize;

/// A node of a derivation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    symbol: Symbol,
    rule: Option<RuleId>,
    children: Vec<NodeId>,
}

impl Node {
    /// The symbol at this node.
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// The rule that expanded this node. `None` for terminals.
    pub fn rule(&self) -> Option<RuleId> {
        self.rule
    }

    /// The children of this node, left to right.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A derivation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationTree {
    nodes: Vec<Node>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Order {
    Leftmost,
    Rightmost,
}

impl DerivationTree {
    /// Build the tree of a leftmost derivation.
    pub fn from_left_parse(
        grammar: &Grammar,
        rules: &[RuleId],
    ) -> Result<DerivationTree, DerivationError> {
        DerivationTree::derive(grammar, rules.iter().cloned(), Order::Leftmost)
    }

    /// Build the tree of the reductions of a shift-reduce parser.
    pub fn from_right_parse(
        grammar: &Grammar,
        reductions: &[RuleId],
    ) -> Result<DerivationTree, DerivationError> {
        DerivationTree::derive(grammar, reductions.iter().rev().cloned(), Order::Rightmost)
    }

    fn derive<I>(grammar: &Grammar, rules: I, order: Order) -> Result<DerivationTree, DerivationError>
    where
        I: Iterator<Item = RuleId>,
    {
        let mut rules = rules.enumerate().peekable();
        let root = match rules.peek() {
            Some(&(_, rule)) => grammar[rule].name(),
            None => return Err(DerivationError::Empty),
        };
        let mut tree = DerivationTree {
            nodes: vec![Node {
                symbol: Symbol::Nonterminal(root),
                rule: None,
                children: Vec::new(),
            }],
        };
        // Open nonterminals; the one to expand next is on top.
        let mut open: Vec<NodeId> = vec![0];

        for (index, rule) in rules {
            let node = open.pop().ok_or(DerivationError::Excess { index: index })?;
            let name = grammar[rule].name();
            if tree.nodes[node].symbol != Symbol::Nonterminal(name) {
                return Err(DerivationError::Mismatch {
                    index: index,
                    expected: grammar.symbol_name(tree.nodes[node].symbol).to_string(),
                    found: grammar.nonterminal_name(name).to_string(),
                });
            }
            let mut children = Vec::with_capacity(grammar[rule].symbols().len());
            for &symbol in grammar[rule].symbols() {
                children.push(tree.nodes.len());
                tree.nodes.push(Node {
                    symbol: symbol,
                    rule: None,
                    children: Vec::new(),
                });
            }
            let nonterminals = children
                .iter()
                .cloned()
                .filter(|&c| tree.nodes[c].symbol.is_nonterminal());
            match order {
                Order::Leftmost => {
                    let pending: Vec<NodeId> = nonterminals.collect();
                    open.extend(pending.into_iter().rev());
                }
                Order::Rightmost => {
                    let pending: Vec<NodeId> = nonterminals.collect();
                    open.extend(pending);
                }
            }
            tree.nodes[node].rule = Some(rule);
            tree.nodes[node].children = children;
        }

        if !open.is_empty() {
            return Err(DerivationError::Incomplete {
                remaining: open.len(),
            });
        }
        Ok(tree)
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        0
    }

    /// Access a node of the tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// The number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The terminals at the leaves of the tree, left to right.
    pub fn frontier(&self) -> Vec<TerminalId> {
        let mut result = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if let Symbol::Terminal(t) = node.symbol {
                result.push(t);
            }
            stack.extend(node.children.iter().rev());
        }
        result
    }

    /// Get a pretty printer that renders the tree with one node per line.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a DerivationTree> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tree = self.item;
        let mut stack = vec![(tree.root(), 0)];
        let mut first = true;
        while let Some((id, depth)) = stack.pop() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            let node = &tree.nodes[id];
            write!(f, "{:indent$}{}", "", node.symbol.pretty(self.ctx), indent = depth * 2)?;
            if node.rule.is_some() && node.children.is_empty() {
                write!(f, "\n{:indent$}ε", "", indent = depth * 2 + 2)?;
            }
            stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;

    // S : a S b | epsilon ;
    fn nested() -> (Grammar, RuleId, RuleId) {
        let mut g = Grammar::new();
        let s = g.add_nonterminal("S");
        let (a, b) = (g.add_terminal("a"), g.add_terminal("b"));
        let wrap = g.add_rule(Rule::new(s, vec![a.into(), s.into(), b.into()]));
        let empty = g.add_rule(Rule::new(s, vec![]));
        (g, wrap, empty)
    }

    #[test]
    fn left_and_right_agree() {
        let (g, wrap, empty) = nested();
        let left = DerivationTree::from_left_parse(&g, &[wrap, wrap, empty]).unwrap();
        let right = DerivationTree::from_right_parse(&g, &[empty, wrap, wrap]).unwrap();
        assert_eq!(left, right);
        let (a, b) = (g.get_terminal("a").unwrap(), g.get_terminal("b").unwrap());
        assert_eq!(left.frontier(), vec![a, a, b, b]);
        assert_eq!(left.len(), 7);
    }

    #[test]
    fn render() {
        let (g, wrap, empty) = nested();
        let tree = DerivationTree::from_left_parse(&g, &[wrap, empty]).unwrap();
        assert_eq!(tree.pretty(&g).to_string(), "S\n  a\n  S\n    ε\n  b");
    }

    #[test]
    fn invalid_parses() {
        let (g, wrap, empty) = nested();
        assert_eq!(
            DerivationTree::from_left_parse(&g, &[]),
            Err(DerivationError::Empty)
        );
        assert_eq!(
            DerivationTree::from_left_parse(&g, &[wrap]),
            Err(DerivationError::Incomplete { remaining: 1 })
        );
        assert_eq!(
            DerivationTree::from_left_parse(&g, &[empty, empty]),
            Err(DerivationError::Excess { index: 1 })
        );
    }
}
