// Copyright (c) 2018 Fabian Schuiki

//! A grammar analyzer and parser table generator for context-free languages.
//!
//! The crate computes first and follow sets of a grammar, builds LR(0),
//! LR(1), and LALR(1) automata, derives LL(1) and shift-reduce parsing tables
//! from them, and drives table-based parsers over a token stream. Grammars
//! that cannot be parsed deterministically are reported as conflicts, for
//! which concrete witness inputs can be generated.
//!
//! ```
//! use parsetab::grammar::{Grammar, Rule};
//! use parsetab::analysis::LrAnalysis;
//! use parsetab::table::Method;
//! use parsetab::tokens::tokenize;
//!
//! let mut g = Grammar::new();
//! let list = g.add_nonterminal("list");
//! let item = g.add_terminal("item");
//! g.add_rule(Rule::new(list, vec![list.into(), item.into()]));
//! g.add_rule(Rule::new(list, vec![item.into()]));
//!
//! let analysis = LrAnalysis::compute(&g, Method::Lalr1).unwrap();
//! assert!(analysis.table().conflicts().is_empty());
//! let tokens = tokenize(analysis.grammar(), "item item item").unwrap();
//! let parse = analysis.parser().parse(&tokens).unwrap();
//! assert_eq!(parse.reductions.len(), 3);
//! ```

#![deny(missing_docs)]

pub mod analysis;
pub mod automaton;
pub mod derivation;
pub mod first;
pub mod follow;
pub mod grammar;
pub mod item_set;
pub mod lexer;
pub mod ll;
pub mod parser;
pub mod reader;
pub mod semantics;
pub mod table;
pub mod tokens;
pub mod witness;

/// A pretty printer.
pub struct Pretty<C, T> {
    ctx: C,
    item: T,
}

impl<C, T> Pretty<C, T> {
    pub(crate) fn new(ctx: C, item: T) -> Pretty<C, T> {
        Pretty { ctx, item }
    }
}
