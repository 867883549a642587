// Copyright (c) 2018 Fabian Schuiki

//! Follow set computation.
//!
//! The follow set of a nonterminal `X` contains all terminals that can appear
//! immediately after `X` in some sentential form. The start symbol is always
//! followed by `$end`. For every rule `A -> α X β` the terminals in First(β)
//! are added to Follow(X), and if β can derive epsilon, all of Follow(A) is
//! added as well. Like the first sets, this is iterated until a full pass
//! over the rules changes nothing.

use std::iter::repeat;
use std::ops::Index;

use bit_set::BitSet;
use log::trace;

use crate::first::FirstSets;
use crate::grammar::{Grammar, NonterminalId, Symbol, TerminalId, END};

/// All follow sets of a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FollowSets(Vec<BitSet>);

impl FollowSets {
    /// Compute the follow sets of a grammar.
    pub fn compute(grammar: &Grammar, first_sets: &FirstSets) -> FollowSets {
        let mut follow = FollowSets(
            repeat(BitSet::with_capacity(grammar.terminal_id_bound()))
                .take(grammar.nonterminal_id_bound())
                .collect(),
        );
        if grammar.nonterminal_id_bound() == 0 {
            return follow;
        }
        follow.0[grammar.start().as_usize()].insert(END.as_usize());

        let mut pass = 0;
        loop {
            pass += 1;
            let mut changed = false;
            for rule in grammar.rules() {
                let head = rule.name().as_usize();
                let symbols = rule.symbols();
                for (i, &symbol) in symbols.iter().enumerate() {
                    let id = match symbol {
                        Symbol::Nonterminal(id) => id.as_usize(),
                        Symbol::Terminal(_) => continue,
                    };
                    let rest = first_sets.of_sequence(&symbols[i + 1..]);
                    let before = follow.0[id].len();
                    follow.0[id].union_with(rest.bits());
                    if rest.has_epsilon() && head != id {
                        let head_follow = follow.0[head].clone();
                        follow.0[id].union_with(&head_follow);
                    }
                    changed |= follow.0[id].len() != before;
                }
            }
            trace!("follow sets pass {}: changed = {}", pass, changed);
            if !changed {
                break;
            }
        }

        follow
    }

    /// Get the follow set of a nonterminal as a bit set indexed by terminal
    /// id.
    pub fn get(&self, id: NonterminalId) -> &BitSet {
        &self.0[id.as_usize()]
    }

    /// Iterate over the terminals that may follow a nonterminal.
    pub fn terminals(&self, id: NonterminalId) -> impl Iterator<Item = TerminalId> + '_ {
        self.0[id.as_usize()].iter().map(TerminalId::from_usize)
    }

    /// Check whether a terminal may follow a nonterminal.
    pub fn contains(&self, id: NonterminalId, terminal: TerminalId) -> bool {
        self.0[id.as_usize()].contains(terminal.as_usize())
    }
}

impl Index<NonterminalId> for FollowSets {
    type Output = BitSet;

    fn index(&self, index: NonterminalId) -> &BitSet {
        self.get(index)
    }
}
