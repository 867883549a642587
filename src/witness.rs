// Copyright (c) 2018 Fabian Schuiki

//! Example inputs that exhibit a conflict.
//!
//! For an LL(1) conflict the generator finds a sentential form in which the
//! conflicting nonterminal is the next symbol to expand, substitutes each of
//! the competing rules for it, and derives a terminal sentence from each
//! result such that the conflicting terminal is the lookahead at that point.
//!
//! For a shift-reduce conflict the generator finds a path through the
//! automaton from the initial state to the state where the handle of the
//! conflicting reduction begins, follows the handle to the conflicting state,
//! and appends the conflicting terminal. The symbols along the path are then
//! expanded into terminals from right to left, preferring expansions whose
//! reduction is triggered by the terminal that follows them.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use log::{debug, trace};
use thiserror::Error;

use crate::automaton::{Automaton, StateId};
use crate::follow::FollowSets;
use crate::grammar::{
    write_sentence, write_terminals, Grammar, NonterminalId, RuleId, Symbol, TerminalId, END,
};
use crate::item_set::Core;
use crate::ll::LlConflict;
use crate::table::Conflict;
use crate::Pretty;

/// An error that occurs while generating a witness.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WitnessError {
    /// The conflicting nonterminal does not occur in any derivation from the
    /// start symbol.
    #[error("`{nonterminal}` is not reachable from the start symbol")]
    Unreachable {
        /// The conflicting nonterminal.
        nonterminal: String,
    },
    /// No state that begins the conflicting handle is reachable.
    #[error("no path to the handle of the conflict in state {state}")]
    NoPath {
        /// The conflicting state.
        state: StateId,
    },
    /// The conflict involves no reduction.
    #[error("conflict in state {state} has no reduction")]
    NoReduction {
        /// The conflicting state.
        state: StateId,
    },
    /// No sentential form puts the conflicting terminal right after the
    /// nonterminal.
    #[error("`{terminal}` never follows `{nonterminal}` in a derivation from the start symbol")]
    NoContext {
        /// The conflicting nonterminal.
        nonterminal: String,
        /// The conflicting terminal.
        terminal: String,
    },
    /// The conflict names fewer than two rules.
    #[error("conflict needs at least two competing rules")]
    NotEnoughRules,
    /// A symbol derives no terminal sentence.
    #[error("`{symbol}` derives no terminal sentence")]
    Underivable {
        /// The offending symbol.
        symbol: String,
    },
}

/// Short terminal sentences derivable from each nonterminal.
#[derive(Debug, Clone)]
pub struct Sentences {
    shortest: Vec<Option<Vec<TerminalId>>>,
    starting: Vec<BTreeMap<TerminalId, Vec<TerminalId>>>,
}

impl Sentences {
    /// Compute the sentences of a grammar.
    ///
    /// Both tables are least fixed points: a rule contributes a sentence as
    /// soon as all of its symbols have one, and an entry is only ever
    /// replaced by a shorter one.
    pub fn compute(grammar: &Grammar) -> Sentences {
        let mut sentences = Sentences {
            shortest: vec![None; grammar.nonterminal_id_bound()],
            starting: vec![BTreeMap::new(); grammar.nonterminal_id_bound()],
        };

        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                let candidate = match sentences.sequence(rule.symbols()) {
                    Some(c) => c,
                    None => continue,
                };
                let slot = &mut sentences.shortest[rule.name().as_usize()];
                if slot.as_ref().map(|s| candidate.len() < s.len()).unwrap_or(true) {
                    *slot = Some(candidate);
                    changed = true;
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                let symbols = rule.symbols();
                let mut candidates = Vec::new();
                for (i, &symbol) in symbols.iter().enumerate() {
                    let rest = match sentences.sequence(&symbols[i + 1..]) {
                        Some(rest) => rest,
                        None => break,
                    };
                    for (t, mut sentence) in sentences.starts(symbol) {
                        sentence.extend(rest.iter().cloned());
                        candidates.push((t, sentence));
                    }
                    if !sentences.is_nullable(symbol) {
                        break;
                    }
                }
                let slots = &mut sentences.starting[rule.name().as_usize()];
                for (t, candidate) in candidates {
                    let better = slots
                        .get(&t)
                        .map(|s| candidate.len() < s.len())
                        .unwrap_or(true);
                    if better {
                        slots.insert(t, candidate);
                        changed = true;
                    }
                }
            }
        }

        sentences
    }

    /// The shortest terminal sentence derivable from a symbol.
    pub fn shortest(&self, symbol: Symbol) -> Option<Vec<TerminalId>> {
        match symbol {
            Symbol::Terminal(t) => Some(vec![t]),
            Symbol::Nonterminal(nt) => self.shortest[nt.as_usize()].clone(),
        }
    }

    /// The shortest terminal sentence derivable from a symbol that begins
    /// with a given terminal.
    pub fn starting_with(&self, symbol: Symbol, terminal: TerminalId) -> Option<Vec<TerminalId>> {
        match symbol {
            Symbol::Terminal(t) if t == terminal => Some(vec![t]),
            Symbol::Terminal(_) => None,
            Symbol::Nonterminal(nt) => self.starting[nt.as_usize()].get(&terminal).cloned(),
        }
    }

    /// Whether a symbol derives the empty sentence.
    pub fn is_nullable(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::Terminal(_) => false,
            Symbol::Nonterminal(nt) => self.shortest[nt.as_usize()]
                .as_ref()
                .map(|s| s.is_empty())
                .unwrap_or(false),
        }
    }

    /// Concatenate the shortest sentences of a sequence of symbols.
    pub fn sequence(&self, symbols: &[Symbol]) -> Option<Vec<TerminalId>> {
        let mut result = Vec::new();
        for &symbol in symbols {
            result.extend(self.shortest(symbol)?);
        }
        Some(result)
    }

    fn starts(&self, symbol: Symbol) -> Vec<(TerminalId, Vec<TerminalId>)> {
        match symbol {
            Symbol::Terminal(t) => vec![(t, vec![t])],
            Symbol::Nonterminal(nt) => self.starting[nt.as_usize()]
                .iter()
                .map(|(&t, s)| (t, s.clone()))
                .collect(),
        }
    }

    fn require(&self, grammar: &Grammar, symbol: Symbol) -> Result<Vec<TerminalId>, WitnessError> {
        self.shortest(symbol).ok_or_else(|| WitnessError::Underivable {
            symbol: grammar.symbol_name(symbol).to_string(),
        })
    }
}

/// Two or more inputs that show an LL(1) conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlWitness {
    /// The conflicting nonterminal.
    pub nonterminal: NonterminalId,
    /// The conflicting terminal.
    pub terminal: TerminalId,
    /// The sentential form in which the nonterminal is expanded.
    pub context: Vec<Symbol>,
    /// The competing rules.
    pub rules: Vec<RuleId>,
    /// One sentence per competing rule, derived through that rule.
    pub sentences: Vec<Vec<TerminalId>>,
}

impl LlWitness {
    /// Generate witnesses for an LL(1) conflict.
    pub fn generate(grammar: &Grammar, conflict: &LlConflict) -> Result<LlWitness, WitnessError> {
        let sentences = Sentences::compute(grammar);
        LlWitness::with_sentences(grammar, &sentences, conflict)
    }

    /// Generate witnesses for an LL(1) conflict from precomputed sentences.
    pub fn with_sentences(
        grammar: &Grammar,
        sentences: &Sentences,
        conflict: &LlConflict,
    ) -> Result<LlWitness, WitnessError> {
        if conflict.rules().len() < 2 {
            return Err(WitnessError::NotEnoughRules);
        }
        let nonterminal = conflict.nonterminal();
        let terminal = conflict.terminal();
        // Rules that cannot begin with the terminal need it from the context.
        let owed = conflict.rules().iter().any(|&r| {
            lookahead_in(sentences, grammar[r].symbols(), terminal) != Lookahead::Found
        });
        let need = if owed { Some(terminal) } else { None };
        let (context, hole) = context_of(grammar, sentences, nonterminal, need)?;
        trace!("context of `{}`: hole {} in {:?}", nonterminal.pretty(grammar), hole, context);

        let mut result = Vec::new();
        for &rule in conflict.rules() {
            let mut form = context[..hole].to_vec();
            form.extend(grammar[rule].symbols().iter().cloned());
            form.extend(context[hole + 1..].iter().cloned());
            result.push(expand_with_lookahead(grammar, sentences, &form, hole, terminal)?);
        }

        Ok(LlWitness {
            nonterminal: nonterminal,
            terminal: terminal,
            context: context,
            rules: conflict.rules().to_vec(),
            sentences: result,
        })
    }

    /// Get a pretty printer for this witness.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a LlWitness> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "in context `")?;
        write_sentence(f, self.ctx, &self.item.context)?;
        write!(f, "` on `{}`:", self.item.terminal.pretty(self.ctx))?;
        for (rule, sentence) in self.item.rules.iter().zip(&self.item.sentences) {
            write!(f, "\n    {}: ", rule.pretty(self.ctx))?;
            write_terminals(f, self.ctx, sentence)?;
        }
        Ok(())
    }
}

/// How a sequence of symbols relates to a lookahead terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookahead {
    /// The sequence can begin with the terminal, after erasing nullable
    /// symbols.
    Found,
    /// The sequence can be erased entirely.
    Nullable,
    /// Neither.
    Blocked,
}

fn lookahead_in(sentences: &Sentences, symbols: &[Symbol], terminal: TerminalId) -> Lookahead {
    for &symbol in symbols {
        if sentences.starting_with(symbol, terminal).is_some() {
            return Lookahead::Found;
        }
        if !sentences.is_nullable(symbol) {
            return Lookahead::Blocked;
        }
    }
    Lookahead::Nullable
}

/// Find a sentential form derivable from the start symbol that contains the
/// nonterminal. Returns the form and the position of the nonterminal in it.
///
/// If a terminal is given, the symbols after the nonterminal must be able to
/// begin with it, or be nullable with `$end` as the terminal. The search runs
/// breadth first upwards through the rules in which a nonterminal occurs,
/// tracking whether the terminal is still owed by the part of the form above,
/// so the form is built from as few rules as possible.
fn context_of(
    grammar: &Grammar,
    sentences: &Sentences,
    nonterminal: NonterminalId,
    terminal: Option<TerminalId>,
) -> Result<(Vec<Symbol>, usize), WitnessError> {
    let start = grammar.start();
    let bound = grammar.nonterminal_id_bound();
    let mut uses: Vec<Vec<(RuleId, usize)>> = vec![Vec::new(); bound];
    for id in grammar.rule_ids() {
        for (pos, &symbol) in grammar[id].symbols().iter().enumerate() {
            if let Symbol::Nonterminal(nt) = symbol {
                uses[nt.as_usize()].push((id, pos));
            }
        }
    }
    let index = |nt: NonterminalId, owed: bool| nt.as_usize() * 2 + owed as usize;

    // For each (nonterminal, owed) reached, the rule and position through
    // which it leads down to the pair below it.
    let mut via: Vec<Option<(RuleId, usize, NonterminalId, bool)>> = vec![None; bound * 2];
    let mut seen = vec![false; bound * 2];
    let mut queue = VecDeque::new();
    let owed_initially = terminal.is_some();
    seen[index(nonterminal, owed_initially)] = true;
    queue.push_back((nonterminal, owed_initially));
    let mut goal = None;
    while let Some((current, owed)) = queue.pop_front() {
        if current == start && (!owed || terminal == Some(END)) {
            goal = Some((current, owed));
            break;
        }
        for &(rule, pos) in &uses[current.as_usize()] {
            let head = grammar[rule].name();
            let head_owed = match terminal {
                Some(t) if owed => {
                    match lookahead_in(sentences, &grammar[rule].symbols()[pos + 1..], t) {
                        Lookahead::Found => false,
                        Lookahead::Nullable => true,
                        Lookahead::Blocked => continue,
                    }
                }
                _ => false,
            };
            let key = index(head, head_owed);
            if !seen[key] {
                seen[key] = true;
                via[key] = Some((rule, pos, current, owed));
                queue.push_back((head, head_owed));
            }
        }
    }

    let (mut current, mut owed) = match goal {
        Some(goal) => goal,
        None => match terminal {
            Some(t) if context_of(grammar, sentences, nonterminal, None).is_ok() => {
                return Err(WitnessError::NoContext {
                    nonterminal: grammar.nonterminal_name(nonterminal).to_string(),
                    terminal: grammar.terminal_name(t).to_string(),
                })
            }
            _ => {
                return Err(WitnessError::Unreachable {
                    nonterminal: grammar.nonterminal_name(nonterminal).to_string(),
                })
            }
        },
    };
    let mut form = vec![Symbol::Nonterminal(start)];
    let mut hole = 0;
    while (current, owed) != (nonterminal, owed_initially) {
        let (rule, pos, below, below_owed) = match via[index(current, owed)] {
            Some(v) => v,
            None => {
                return Err(WitnessError::Unreachable {
                    nonterminal: grammar.nonterminal_name(nonterminal).to_string(),
                })
            }
        };
        form.splice(hole..hole + 1, grammar[rule].symbols().iter().cloned());
        hole += pos;
        current = below;
        owed = below_owed;
    }
    Ok((form, hole))
}

/// Expand a sentential form into terminals such that the terminal seen when
/// the parser arrives at position `at` is `terminal`.
///
/// Nullable symbols from `at` onwards are erased until one is found that can
/// begin with the terminal. If there is none, the plain shortest expansion is
/// returned.
fn expand_with_lookahead(
    grammar: &Grammar,
    sentences: &Sentences,
    form: &[Symbol],
    at: usize,
    terminal: TerminalId,
) -> Result<Vec<TerminalId>, WitnessError> {
    let mut fixed = None;
    for (j, &symbol) in form.iter().enumerate().skip(at) {
        if let Some(s) = sentences.starting_with(symbol, terminal) {
            fixed = Some((j, s));
            break;
        }
        if !sentences.is_nullable(symbol) {
            break;
        }
    }

    let mut result = Vec::new();
    match fixed {
        Some((j, s)) => {
            for &symbol in &form[..at] {
                result.extend(sentences.require(grammar, symbol)?);
            }
            result.extend(s);
            for &symbol in &form[j + 1..] {
                result.extend(sentences.require(grammar, symbol)?);
            }
        }
        None => {
            for &symbol in form {
                result.extend(sentences.require(grammar, symbol)?);
            }
        }
    }
    Ok(result)
}

/// An input that drives a shift-reduce parser into a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrWitness {
    /// The reduction involved in the conflict.
    pub rule: RuleId,
    /// The conflicting state.
    pub state: StateId,
    /// The conflicting terminal.
    pub terminal: TerminalId,
    /// The transitions from the initial state to the conflicting state, as
    /// pairs of source state and symbol.
    pub path: Vec<(StateId, Symbol)>,
    /// A terminal sentence that follows the path, ending in the conflicting
    /// terminal.
    pub sentence: Vec<TerminalId>,
}

impl LrWitness {
    /// Generate a witness for a conflict of a shift-reduce table.
    ///
    /// The automaton must be the one the table was built from, and the
    /// follow sets are used for items without lookahead.
    pub fn generate(
        grammar: &Grammar,
        automaton: &Automaton,
        follow_sets: &FollowSets,
        conflict: &Conflict,
    ) -> Result<LrWitness, WitnessError> {
        let sentences = Sentences::compute(grammar);
        LrWitness::with_sentences(grammar, automaton, follow_sets, &sentences, conflict)
    }

    /// Generate a witness from precomputed sentences.
    pub fn with_sentences(
        grammar: &Grammar,
        automaton: &Automaton,
        follow_sets: &FollowSets,
        sentences: &Sentences,
        conflict: &Conflict,
    ) -> Result<LrWitness, WitnessError> {
        let state = conflict.state();
        let terminal = conflict.terminal();
        let rule = conflict
            .reductions()
            .next()
            .ok_or(WitnessError::NoReduction { state: state })?;
        let body = grammar[rule].symbols();

        let (distance, parent) = shortest_paths(automaton);
        let origin = find_origin(grammar, automaton, state, terminal, rule)
            .into_iter()
            .filter(|o| distance[o.as_usize()].is_some())
            .min_by_key(|o| (distance[o.as_usize()], o.as_usize()))
            .ok_or(WitnessError::NoPath { state: state })?;
        debug!(
            "handle of {} for conflict in state {} begins in state {}",
            rule.pretty(grammar),
            state,
            origin
        );

        let mut path = Vec::new();
        let mut current = origin;
        while let Some((from, symbol)) = parent[current.as_usize()] {
            path.push((from, symbol));
            current = from;
        }
        path.reverse();
        let walk = automaton
            .walk(origin, body)
            .ok_or(WitnessError::NoPath { state: state })?;
        path.extend(walk.iter().cloned().zip(body.iter().cloned()));

        let sentence = expand_path(grammar, automaton, follow_sets, sentences, &path, terminal)?;
        Ok(LrWitness {
            rule: rule,
            state: state,
            terminal: terminal,
            path: path,
            sentence: sentence,
        })
    }

    /// The symbols along the path, i.e. the stack contents of the parser in
    /// the conflicting state.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.path.iter().map(|&(_, s)| s).collect()
    }

    /// Get a pretty printer for this witness.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a LrWitness> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "reduce {} in state {} on `{}`",
            self.item.rule.pretty(self.ctx),
            self.item.state,
            self.item.terminal.pretty(self.ctx)
        )?;
        write!(f, "\n    stack: ")?;
        write_sentence(f, self.ctx, &self.item.symbols())?;
        write!(f, "\n    input: ")?;
        write_terminals(f, self.ctx, &self.item.sentence)
    }
}

/// Breadth first search from the initial state. Returns the distance of each
/// state and the transition it was first reached through.
fn shortest_paths(automaton: &Automaton) -> (Vec<Option<usize>>, Vec<Option<(StateId, Symbol)>>) {
    let mut distance = vec![None; automaton.len()];
    let mut parent = vec![None; automaton.len()];
    let mut queue = VecDeque::new();
    let initial = automaton.initial();
    distance[initial.as_usize()] = Some(0);
    queue.push_back(initial);
    while let Some(id) = queue.pop_front() {
        let d = distance[id.as_usize()].unwrap_or(0);
        for (symbol, target) in automaton[id].transitions() {
            if distance[target.as_usize()].is_none() {
                distance[target.as_usize()] = Some(d + 1);
                parent[target.as_usize()] = Some((id, symbol));
                queue.push_back(target);
            }
        }
    }
    (distance, parent)
}

/// Find the states in which the handle of `rule` can begin such that reading
/// its body leads to `state`, and the lookahead admits `terminal`.
fn find_origin(
    grammar: &Grammar,
    automaton: &Automaton,
    state: StateId,
    terminal: TerminalId,
    rule: RuleId,
) -> Vec<StateId> {
    let body = grammar[rule].symbols();
    let mut targets: HashSet<StateId> = Some(state).into_iter().collect();
    for &symbol in body.iter().rev() {
        targets = automaton
            .states()
            .iter()
            .filter(|s| {
                automaton
                    .transition(s.id(), symbol)
                    .map(|t| targets.contains(&t))
                    .unwrap_or(false)
            })
            .map(|s| s.id())
            .collect();
    }
    let start = Core {
        rule: rule,
        marker: 0,
    };
    let mut origins: Vec<StateId> = targets
        .into_iter()
        .filter(|&o| match automaton[o].items().get(start) {
            Some(item) => item
                .lookahead()
                .map(|la| la.contains(terminal.as_usize()))
                .unwrap_or(true),
            None => false,
        })
        .collect();
    origins.sort();
    origins
}

/// Expand the symbols along a path into terminals, right to left.
///
/// Each nonterminal is expanded with the cheapest rule whose reduction is
/// triggered by the terminal that follows it, tracing the rule through the
/// automaton from the state the nonterminal is read in. A rule is tried at
/// most once per state, which bounds the expansion of recursive rules; a
/// nonterminal without a suitable rule falls back to its shortest sentence.
fn expand_path(
    grammar: &Grammar,
    automaton: &Automaton,
    follow_sets: &FollowSets,
    sentences: &Sentences,
    path: &[(StateId, Symbol)],
    terminal: TerminalId,
) -> Result<Vec<TerminalId>, WitnessError> {
    let cost = |rule: RuleId| {
        sentences
            .sequence(grammar[rule].symbols())
            .map(|s| s.len())
    };
    let mut used: HashSet<(StateId, RuleId)> = HashSet::new();
    let mut todo: Vec<(StateId, Symbol)> = path.to_vec();
    let mut reversed = vec![terminal];

    while let Some((state, symbol)) = todo.pop() {
        let nt = match symbol {
            Symbol::Terminal(t) => {
                reversed.push(t);
                continue;
            }
            Symbol::Nonterminal(nt) => nt,
        };
        let next = reversed.last().cloned().unwrap_or(terminal);

        let mut candidates: Vec<(usize, RuleId)> = grammar
            .rules_for_nonterminal(nt)
            .filter_map(|&r| cost(r).map(|c| (c, r)))
            .collect();
        candidates.sort();
        let mut chosen = None;
        for (_, rule) in candidates {
            if used.contains(&(state, rule)) {
                continue;
            }
            let body = grammar[rule].symbols();
            let walk = match automaton.walk(state, body) {
                Some(walk) => walk,
                None => continue,
            };
            let end = walk[walk.len() - 1];
            let admits = match automaton[end].reduce_item(grammar, rule) {
                Some(item) => match item.lookahead() {
                    Some(la) => la.contains(next.as_usize()),
                    None => follow_sets.contains(nt, next),
                },
                None => false,
            };
            if admits {
                chosen = Some((rule, walk));
                break;
            }
        }

        match chosen {
            Some((rule, walk)) => {
                trace!("expand {} in state {}", rule.pretty(grammar), state);
                used.insert((state, rule));
                todo.extend(walk.into_iter().zip(grammar[rule].symbols().iter().cloned()));
            }
            None => {
                let fallback = sentences.require(grammar, symbol)?;
                reversed.extend(fallback.into_iter().rev());
            }
        }
    }

    reversed.reverse();
    Ok(reversed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;

    #[test]
    fn shortest_sentences() {
        // S : A b | c ; A : a A | epsilon ; U : U u ;
        let mut g = Grammar::new();
        let (s, nt_a, u) = (
            g.add_nonterminal("S"),
            g.add_nonterminal("A"),
            g.add_nonterminal("U"),
        );
        let (a, b, c, tu) = (
            g.add_terminal("a"),
            g.add_terminal("b"),
            g.add_terminal("c"),
            g.add_terminal("u"),
        );
        g.add_rule(Rule::new(s, vec![nt_a.into(), b.into()]));
        g.add_rule(Rule::new(s, vec![c.into()]));
        g.add_rule(Rule::new(nt_a, vec![a.into(), nt_a.into()]));
        g.add_rule(Rule::new(nt_a, vec![]));
        g.add_rule(Rule::new(u, vec![u.into(), tu.into()]));

        let sen = Sentences::compute(&g);
        assert_eq!(sen.shortest(s.into()).map(|s| s.len()), Some(1));
        assert_eq!(sen.shortest(nt_a.into()), Some(vec![]));
        assert_eq!(sen.shortest(u.into()), None);
        assert!(sen.is_nullable(nt_a.into()));
        assert_eq!(sen.starting_with(s.into(), a), Some(vec![a, b]));
        assert_eq!(sen.starting_with(s.into(), b), Some(vec![b]));
        assert_eq!(sen.starting_with(nt_a.into(), b), None);
    }

    #[test]
    fn context_admits_terminal() {
        // S : A b | c A c ; A : c | epsilon ;
        let mut g = Grammar::new();
        let (s, a) = (g.add_nonterminal("S"), g.add_nonterminal("A"));
        let (b, c) = (g.add_terminal("b"), g.add_terminal("c"));
        g.add_rule(Rule::new(s, vec![a.into(), b.into()]));
        g.add_rule(Rule::new(s, vec![c.into(), a.into(), c.into()]));
        g.add_rule(Rule::new(a, vec![c.into()]));
        g.add_rule(Rule::new(a, vec![]));
        let sen = Sentences::compute(&g);
        assert_eq!(
            context_of(&g, &sen, a, None).unwrap(),
            (vec![a.into(), b.into()], 0)
        );
        assert_eq!(
            context_of(&g, &sen, a, Some(c)).unwrap(),
            (vec![c.into(), a.into(), c.into()], 1)
        );
        // `$end` follows the start symbol itself.
        assert_eq!(
            context_of(&g, &sen, s, Some(END)).unwrap(),
            (vec![s.into()], 0)
        );
    }

    #[test]
    fn context_through_rules() {
        // S : x T ; T : y U z ; U : u ;
        let mut g = Grammar::new();
        let (s, t, u) = (
            g.add_nonterminal("S"),
            g.add_nonterminal("T"),
            g.add_nonterminal("U"),
        );
        let (x, y, z, tu) = (
            g.add_terminal("x"),
            g.add_terminal("y"),
            g.add_terminal("z"),
            g.add_terminal("u"),
        );
        g.add_rule(Rule::new(s, vec![x.into(), t.into()]));
        g.add_rule(Rule::new(t, vec![y.into(), u.into(), z.into()]));
        g.add_rule(Rule::new(u, vec![tu.into()]));
        let sen = Sentences::compute(&g);
        let (form, hole) = context_of(&g, &sen, u, None).unwrap();
        assert_eq!(form, vec![x.into(), y.into(), u.into(), z.into()]);
        assert_eq!(hole, 2);
        assert_eq!(context_of(&g, &sen, u, Some(z)).unwrap(), (form, hole));
        assert_eq!(
            context_of(&g, &sen, u, Some(x)),
            Err(WitnessError::NoContext {
                nonterminal: "U".to_string(),
                terminal: "x".to_string(),
            })
        );

        let orphan = g.add_nonterminal("V");
        g.add_rule(Rule::new(orphan, vec![x.into()]));
        let sen = Sentences::compute(&g);
        assert_eq!(
            context_of(&g, &sen, orphan, None),
            Err(WitnessError::Unreachable {
                nonterminal: "V".to_string()
            })
        );
    }
}
