// Copyright (c) 2018 Fabian Schuiki

//! Construction of the canonical LR automata of a grammar.
//!
//! All three constructions share the same shape: a worklist of states, each
//! of which is expanded by computing the kernels reachable over every symbol
//! and closing them. They differ in the items they track:
//!
//! - LR(0) items carry no lookahead; states are identified by their kernel.
//! - LR(1) items carry lookaheads; states are identified by their kernel
//!   including the lookaheads.
//! - LALR(1) states are identified by the cores of their kernel. Lookaheads
//!   arriving at an existing state are merged into it, and the state is
//!   processed again whenever that merge changes anything.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::ops::Index;

use bit_set::BitSet;
use log::{debug, trace};
use thiserror::Error;

use crate::first::FirstSets;
use crate::grammar::{Grammar, RuleId, Symbol, END};
use crate::item_set::{closure_lr0, closure_lr1, Core, Item, ItemSet};
use crate::Pretty;

/// The kind of items an automaton was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Canonical LR(0) collection.
    Lr0,
    /// Canonical LR(1) collection.
    Lr1,
    /// LR(0) collection with merged LR(1) lookaheads.
    Lalr1,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Kind::Lr0 => write!(f, "LR(0)"),
            Kind::Lr1 => write!(f, "LR(1)"),
            Kind::Lalr1 => write!(f, "LALR(1)"),
        }
    }
}

/// An error that occurs while building an automaton or parsing table.
///
/// These indicate that the caller violated a precondition, or that an
/// internal invariant of the construction broke. They are never caused by
/// conflicts in the grammar, which are reported separately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The grammar has not been augmented.
    #[error("grammar must be augmented (start symbol `{start}` needs exactly one rule)")]
    NotAugmented {
        /// The start symbol of the grammar.
        start: String,
    },
    /// The grammar has no nonterminals to start from.
    #[error("grammar has no nonterminals")]
    EmptyGrammar,
    /// A state was given two different successors for the same symbol.
    #[error("bad build: state {state} goes to both {existing} and {target} on `{symbol}`")]
    InconsistentTransition {
        /// The state with the transition.
        state: StateId,
        /// The symbol of the transition.
        symbol: String,
        /// The successor registered first.
        existing: StateId,
        /// The conflicting successor.
        target: StateId,
    },
    /// An item expects a transition that the state does not have.
    #[error("state {state} has no transition on `{symbol}`")]
    MissingTransition {
        /// The state missing the transition.
        state: StateId,
        /// The symbol of the transition.
        symbol: String,
    },
}

/// An LR automaton.
#[derive(Debug, Clone)]
pub struct Automaton {
    kind: Kind,
    states: Vec<State>,
}

/// A state of an LR automaton.
#[derive(Debug, Clone)]
pub struct State {
    id: StateId,
    kernel: ItemSet,
    items: ItemSet,
    transitions: BTreeMap<Symbol, StateId>,
    is_final: bool,
}

impl Automaton {
    /// Build the canonical LR(0) automaton of an augmented grammar.
    pub fn lr0(grammar: &Grammar) -> Result<Automaton, BuildError> {
        let rule = start_rule(grammar)?;
        let kernel = ItemSet::new(vec![Item::new(rule, 0)]);
        build_canonical(grammar, Kind::Lr0, kernel, |k| closure_lr0(grammar, k))
    }

    /// Build the canonical LR(1) automaton of an augmented grammar.
    pub fn lr1(grammar: &Grammar, first_sets: &FirstSets) -> Result<Automaton, BuildError> {
        let rule = start_rule(grammar)?;
        let kernel = ItemSet::new(vec![Item::with_lookahead(rule, 0, end_lookahead())]);
        build_canonical(grammar, Kind::Lr1, kernel, |k| {
            closure_lr1(grammar, first_sets, k)
        })
    }

    /// Build the LALR(1) automaton of an augmented grammar.
    pub fn lalr1(grammar: &Grammar, first_sets: &FirstSets) -> Result<Automaton, BuildError> {
        let rule = start_rule(grammar)?;
        let kernel = ItemSet::new(vec![Item::with_lookahead(rule, 0, end_lookahead())]);
        build_lalr1(grammar, first_sets, kernel)
    }

    /// Build an automaton of the given kind.
    pub fn build(
        grammar: &Grammar,
        first_sets: &FirstSets,
        kind: Kind,
    ) -> Result<Automaton, BuildError> {
        match kind {
            Kind::Lr0 => Automaton::lr0(grammar),
            Kind::Lr1 => Automaton::lr1(grammar, first_sets),
            Kind::Lalr1 => Automaton::lalr1(grammar, first_sets),
        }
    }

    /// The kind of construction that built this automaton.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// All states in the automaton, ordered by id.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the automaton has no states. Never true for a built automaton.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The initial state.
    pub fn initial(&self) -> StateId {
        StateId(0)
    }

    /// The successor of a state over a symbol.
    pub fn transition(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self[state].transitions.get(&symbol).cloned()
    }

    /// Follow a sequence of symbols from a state.
    ///
    /// Returns the visited states, starting with `state`, or `None` if one of
    /// the transitions does not exist.
    pub fn walk(&self, state: StateId, symbols: &[Symbol]) -> Option<Vec<StateId>> {
        let mut path = Vec::with_capacity(symbols.len() + 1);
        path.push(state);
        let mut current = state;
        for &symbol in symbols {
            current = self.transition(current, symbol)?;
            path.push(current);
        }
        Some(path)
    }

    /// Get a pretty printer for this automaton.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl Index<StateId> for Automaton {
    type Output = State;

    fn index(&self, index: StateId) -> &State {
        &self.states[index.as_usize()]
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Automaton> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, state) in self.item.states.iter().enumerate() {
            if index > 0 {
                write!(f, "\n\n")?;
            }
            write!(f, "{}", state.pretty(self.ctx))?;
        }
        Ok(())
    }
}

impl State {
    /// Get the unique identifier of this state.
    pub fn id(&self) -> StateId {
        self.id
    }

    /// The kernel items of this state.
    pub fn kernel(&self) -> &ItemSet {
        &self.kernel
    }

    /// All items of this state, i.e. the closure of the kernel.
    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    /// The outgoing transitions of this state.
    pub fn transitions(&self) -> impl Iterator<Item = (Symbol, StateId)> + '_ {
        self.transitions.iter().map(|(&s, &t)| (s, t))
    }

    /// Whether the state contains a reduce item.
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Find the reduce item of a rule in this state.
    pub fn reduce_item(&self, grammar: &Grammar, rule: RuleId) -> Option<&Item> {
        self.items.get(Core {
            rule: rule,
            marker: grammar[rule].symbols().len(),
        })
    }

    /// Get a pretty printer for this state.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a State> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "state {}", self.item.id)?;
        if self.item.is_final {
            write!(f, " (final)")?;
        }
        write!(f, ":")?;
        for item in self.item.items.items() {
            write!(f, "\n    {}", item.pretty(self.ctx))?;
        }
        for (symbol, target) in self.item.transitions() {
            write!(f, "\n    {} -> {}", symbol.pretty(self.ctx), target)?;
        }
        Ok(())
    }
}

/// A unique state identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(usize);

impl StateId {
    /// Create a state id from a usize.
    pub fn from_usize(id: usize) -> StateId {
        StateId(id)
    }

    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check the augmentation precondition and return the start rule.
fn start_rule(grammar: &Grammar) -> Result<RuleId, BuildError> {
    if grammar.nonterminal_id_bound() == 0 {
        return Err(BuildError::EmptyGrammar);
    }
    grammar
        .start_rule()
        .ok_or_else(|| BuildError::NotAugmented {
            start: grammar.nonterminal_name(grammar.start()).to_string(),
        })
}

fn end_lookahead() -> BitSet {
    let mut la = BitSet::new();
    la.insert(END.as_usize());
    la
}

fn new_state(grammar: &Grammar, id: usize, kernel: ItemSet, items: ItemSet) -> State {
    let is_final = items.has_reduce(grammar);
    trace!("state {}:\n{}", id, items.pretty(grammar));
    State {
        id: StateId(id),
        kernel: kernel,
        items: items,
        transitions: BTreeMap::new(),
        is_final: is_final,
    }
}

/// Build a canonical collection where states are identified by their full
/// kernel, lookaheads included.
fn build_canonical<F>(
    grammar: &Grammar,
    kind: Kind,
    initial: ItemSet,
    closure: F,
) -> Result<Automaton, BuildError>
where
    F: Fn(&ItemSet) -> ItemSet,
{
    let mut states = vec![new_state(grammar, 0, initial.clone(), closure(&initial))];
    let mut visited: HashMap<ItemSet, StateId> = HashMap::new();
    visited.insert(initial, StateId(0));
    let mut todo: VecDeque<StateId> = VecDeque::new();
    todo.push_back(StateId(0));

    while let Some(id) = todo.pop_front() {
        for (symbol, kernel) in states[id.0].items.successors(grammar) {
            let target = match visited.get(&kernel) {
                Some(&target) => target,
                None => {
                    let target = StateId(states.len());
                    let items = closure(&kernel);
                    states.push(new_state(grammar, target.0, kernel.clone(), items));
                    visited.insert(kernel, target);
                    todo.push_back(target);
                    target
                }
            };
            states[id.0].transitions.insert(symbol, target);
        }
    }

    debug!("built {} automaton with {} states", kind, states.len());
    Ok(Automaton {
        kind: kind,
        states: states,
    })
}

/// Build the LALR(1) collection where states are identified by the cores of
/// their kernel, and lookaheads are propagated until nothing changes.
fn build_lalr1(
    grammar: &Grammar,
    first_sets: &FirstSets,
    initial: ItemSet,
) -> Result<Automaton, BuildError> {
    let items = closure_lr1(grammar, first_sets, &initial);
    let mut visited: HashMap<Vec<Core>, StateId> = HashMap::new();
    visited.insert(initial.cores(), StateId(0));
    let mut states = vec![new_state(grammar, 0, initial, items)];
    let mut todo: VecDeque<StateId> = VecDeque::new();
    let mut queued = BitSet::new();
    todo.push_back(StateId(0));
    queued.insert(0);

    while let Some(id) = todo.pop_front() {
        queued.remove(id.0);
        for (symbol, kernel) in states[id.0].items.successors(grammar) {
            let closure = closure_lr1(grammar, first_sets, &kernel);
            let target = match visited.get(&kernel.cores()) {
                Some(&target) => {
                    let state = &mut states[target.0];
                    let mut changed = state.kernel.merge(&kernel);
                    changed |= state.items.merge(&closure);
                    if changed && queued.insert(target.0) {
                        trace!("lookaheads of state {} grew, revisiting", target);
                        todo.push_back(target);
                    }
                    target
                }
                None => {
                    let target = StateId(states.len());
                    visited.insert(kernel.cores(), target);
                    states.push(new_state(grammar, target.0, kernel, closure));
                    queued.insert(target.0);
                    todo.push_back(target);
                    target
                }
            };
            match states[id.0].transitions.get(&symbol).cloned() {
                Some(existing) if existing != target => {
                    return Err(BuildError::InconsistentTransition {
                        state: id,
                        symbol: grammar.symbol_name(symbol).to_string(),
                        existing: existing,
                        target: target,
                    });
                }
                Some(_) => (),
                None => {
                    states[id.0].transitions.insert(symbol, target);
                }
            }
        }
    }

    debug!("built {} automaton with {} states", Kind::Lalr1, states.len());
    Ok(Automaton {
        kind: Kind::Lalr1,
        states: states,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;

    // S : C C ; C : c C | d ;
    fn dragon() -> Grammar {
        let mut g = Grammar::new();
        let (s, c) = (g.add_nonterminal("S"), g.add_nonterminal("C"));
        let (tc, td) = (g.add_terminal("c"), g.add_terminal("d"));
        g.add_rule(Rule::new(s, vec![c.into(), c.into()]));
        g.add_rule(Rule::new(c, vec![tc.into(), c.into()]));
        g.add_rule(Rule::new(c, vec![td.into()]));
        g.augmented()
    }

    fn assert_deterministic(a: &Automaton) {
        for state in a.states() {
            let symbols: Vec<_> = state.transitions().map(|(s, _)| s).collect();
            let mut dedup = symbols.clone();
            dedup.dedup();
            assert_eq!(symbols, dedup);
            for (_, target) in state.transitions() {
                assert!(target.as_usize() < a.len());
            }
        }
    }

    #[test]
    fn requires_augmented_grammar() {
        let mut g = Grammar::new();
        let s = g.add_nonterminal("S");
        let a = g.add_terminal("a");
        g.add_rule(Rule::new(s, vec![a.into()]));
        g.add_rule(Rule::new(s, vec![a.into(), s.into()]));
        match Automaton::lr0(&g) {
            Err(BuildError::NotAugmented { start }) => assert_eq!(start, "S"),
            x => panic!("unexpected {:?}", x),
        }
        assert_eq!(
            Automaton::lr0(&Grammar::new()).unwrap_err(),
            BuildError::EmptyGrammar
        );
    }

    #[test]
    fn state_counts() {
        let g = dragon();
        let fs = FirstSets::compute(&g);
        let lr0 = Automaton::lr0(&g).unwrap();
        let lr1 = Automaton::lr1(&g, &fs).unwrap();
        let lalr1 = Automaton::lalr1(&g, &fs).unwrap();
        assert_eq!(lr0.len(), 7);
        assert_eq!(lr1.len(), 10);
        assert_eq!(lalr1.len(), 7);
        assert_eq!(lr1.kind(), Kind::Lr1);
        assert_deterministic(&lr0);
        assert_deterministic(&lr1);
        assert_deterministic(&lalr1);
    }

    #[test]
    fn lalr_merges_lookaheads() {
        let g = dragon();
        let fs = FirstSets::compute(&g);
        let lalr1 = Automaton::lalr1(&g, &fs).unwrap();
        let td = Symbol::Terminal(g.get_terminal("d").unwrap());
        let target = lalr1.transition(lalr1.initial(), td).unwrap();
        let state = &lalr1[target];
        assert!(state.is_final());
        let rule = state.kernel().items()[0].rule();
        let item = state.reduce_item(&g, rule).unwrap();
        // C -> d . is followed by c, d (first C) and $end (second C).
        assert_eq!(item.lookahead().unwrap().len(), 3);
    }

    #[test]
    fn walk_follows_transitions() {
        let g = dragon();
        let lr0 = Automaton::lr0(&g).unwrap();
        let c = Symbol::Terminal(g.get_terminal("c").unwrap());
        let d = Symbol::Terminal(g.get_terminal("d").unwrap());
        let path = lr0.walk(lr0.initial(), &[c, c, d]).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path[1], path[2]);
        assert!(lr0.walk(lr0.initial(), &[Symbol::Terminal(END)]).is_none());
    }
}
