// Copyright (c) 2018 Fabian Schuiki

//! First set computation.
//!
//! This module implements computation of the first sets for a grammar. The
//! first set of a symbol states all terminals that can appear as the first
//! symbol of something derived from it. Since rules may contain other rules
//! and epsilon productions, computation is a fixed-point iteration: all rules
//! are visited over and over until a full pass leaves every set unchanged.
//! This terminates since the sets only ever grow and are bounded by the
//! number of terminals.

use std::iter::repeat;
use std::ops::Index;

use bit_set::BitSet;
use log::trace;

use crate::grammar::{Grammar, NonterminalId, Symbol, TerminalId};

/// All first sets of a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FirstSets(Vec<FirstSet>);

/// The first set of a nonterminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FirstSet {
    /// The first symbols.
    symbols: BitSet,
    /// Whether one of the productions is empty.
    has_epsilon: bool,
}

impl FirstSets {
    /// Compute the first sets of a grammar.
    pub fn compute(grammar: &Grammar) -> FirstSets {
        compute(grammar)
    }

    /// Get the first set of a nonterminal.
    pub fn get(&self, id: NonterminalId) -> &FirstSet {
        &self.0[id.as_usize()]
    }

    /// Compute the first set of a single symbol.
    pub fn of_symbol(&self, symbol: Symbol) -> FirstSet {
        match symbol {
            Symbol::Terminal(id) => FirstSet::terminal(id),
            Symbol::Nonterminal(id) => self.0[id.as_usize()].clone(),
        }
    }

    /// Compute the first set of a sequence of symbols.
    ///
    /// The first sets of the symbols are accumulated from left to right until
    /// one of them does not contain epsilon. If all of them do, or the
    /// sequence is empty, the result contains epsilon.
    pub fn of_sequence(&self, symbols: &[Symbol]) -> FirstSet {
        let mut result = FirstSet::default();
        for &symbol in symbols {
            match symbol {
                Symbol::Terminal(id) => {
                    result.symbols.insert(id.as_usize());
                    return result;
                }
                Symbol::Nonterminal(id) => {
                    let fs = &self.0[id.as_usize()];
                    result.symbols.union_with(&fs.symbols);
                    if !fs.has_epsilon {
                        return result;
                    }
                }
            }
        }
        result.has_epsilon = true;
        result
    }

    /// Compute the terminals that can start the sequence `symbols` followed
    /// by any terminal in `lookahead`.
    ///
    /// This is First(βL) as used to propagate lookaheads in LR(1) items. The
    /// result never contains epsilon.
    pub fn of_sequence_then(&self, symbols: &[Symbol], lookahead: &BitSet) -> BitSet {
        let fs = self.of_sequence(symbols);
        let mut result = fs.symbols;
        if fs.has_epsilon {
            result.union_with(lookahead);
        }
        result
    }
}

impl Index<NonterminalId> for FirstSets {
    type Output = FirstSet;

    fn index(&self, index: NonterminalId) -> &FirstSet {
        self.get(index)
    }
}

impl FirstSet {
    /// The first set of a single terminal.
    pub fn terminal(id: TerminalId) -> FirstSet {
        let mut symbols = BitSet::new();
        symbols.insert(id.as_usize());
        FirstSet {
            symbols: symbols,
            has_epsilon: false,
        }
    }

    /// The terminals in the set.
    pub fn symbols(&self) -> impl Iterator<Item = TerminalId> + '_ {
        self.symbols.iter().map(TerminalId::from_usize)
    }

    /// The terminals in the set, as a bit set indexed by terminal id.
    pub fn bits(&self) -> &BitSet {
        &self.symbols
    }

    /// Check whether a terminal is in the set.
    pub fn contains(&self, id: TerminalId) -> bool {
        self.symbols.contains(id.as_usize())
    }

    /// Whether epsilon is in the set.
    pub fn has_epsilon(&self) -> bool {
        self.has_epsilon
    }

    /// Add all terminals and the epsilon flag of another set. Returns whether
    /// anything changed.
    fn union_with(&mut self, other: &FirstSet) -> bool {
        let before = self.symbols.len();
        self.symbols.union_with(&other.symbols);
        let changed = self.symbols.len() != before || (other.has_epsilon && !self.has_epsilon);
        self.has_epsilon |= other.has_epsilon;
        changed
    }
}

/// The meat of this module. Computes the first set for each nonterminal in a
/// grammar.
fn compute(grammar: &Grammar) -> FirstSets {
    let num_nonterm = grammar.nonterminal_id_bound();
    let mut fs = FirstSets(
        repeat(FirstSet::default())
            .take(num_nonterm)
            .collect(),
    );

    // Keep visiting all rules until a full pass yields no change.
    let mut pass = 0;
    loop {
        pass += 1;
        let mut changed = false;
        for rule in grammar.rules() {
            let local = fs.of_sequence(rule.symbols());
            changed |= fs.0[rule.name().as_usize()].union_with(&local);
        }
        trace!("first sets pass {}: changed = {}", pass, changed);
        if !changed {
            break;
        }
    }

    fs
}
