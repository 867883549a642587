// Copyright (c) 2018 Fabian Schuiki

//! Shift-reduce parsing tables.
//!
//! The table is synthesized by walking the states of an automaton. Reduce
//! items register reductions for their lookahead terminals, which depend on
//! the construction method; items with the marker in front of a symbol
//! register a shift or goto entry towards the state's successor. Registering
//! a second, different action for the same state and terminal is a conflict.
//! The first registered action stays in the table, and the conflict is
//! recorded alongside it.

use std::fmt;
use std::str::FromStr;

use bit_set::BitSet;
use indexmap::map::Entry;
use indexmap::IndexMap;
use log::{debug, warn};
use thiserror::Error;

use crate::automaton::{Automaton, BuildError, Kind, StateId};
use crate::first::FirstSets;
use crate::follow::FollowSets;
use crate::grammar::{Grammar, NonterminalId, RuleId, Symbol, TerminalId, END};
use crate::item_set::Item;
use crate::Pretty;

/// The method used to construct a shift-reduce table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// LR(0): reduce on every terminal.
    Lr0,
    /// SLR(1): LR(0) automaton, reduce on the follow set of the rule.
    Slr1,
    /// Canonical LR(1).
    Lr1,
    /// LALR(1).
    Lalr1,
}

impl Method {
    /// The kind of automaton this method builds on.
    pub fn automaton_kind(self) -> Kind {
        match self {
            Method::Lr0 | Method::Slr1 => Kind::Lr0,
            Method::Lr1 => Kind::Lr1,
            Method::Lalr1 => Kind::Lalr1,
        }
    }

    /// Build the automaton for this method.
    pub fn build_automaton(
        self,
        grammar: &Grammar,
        first_sets: &FirstSets,
    ) -> Result<Automaton, BuildError> {
        Automaton::build(grammar, first_sets, self.automaton_kind())
    }

    /// The terminals on which a reduce item triggers a reduction.
    pub fn lookaheads(self, grammar: &Grammar, item: &Item, follow_sets: &FollowSets) -> BitSet {
        match self {
            Method::Lr0 => grammar.terminals().map(TerminalId::as_usize).collect(),
            Method::Slr1 => follow_sets[grammar[item.rule()].name()].clone(),
            Method::Lr1 | Method::Lalr1 => item.lookahead().cloned().unwrap_or_default(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Method::Lr0 => write!(f, "LR(0)"),
            Method::Slr1 => write!(f, "SLR(1)"),
            Method::Lr1 => write!(f, "LR(1)"),
            Method::Lalr1 => write!(f, "LALR(1)"),
        }
    }
}

/// A construction method name that is not known.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown table construction method `{0}`")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Method, UnknownMethod> {
        match s.to_lowercase().as_str() {
            "lr0" | "lr(0)" => Ok(Method::Lr0),
            "slr" | "slr1" | "slr(1)" => Ok(Method::Slr1),
            "lr1" | "lr(1)" => Ok(Method::Lr1),
            "lalr" | "lalr1" | "lalr(1)" => Ok(Method::Lalr1),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// An action to be taken upon encountering a terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Shift the terminal and go to the given state.
    Shift(StateId),
    /// Reduce with the given rule.
    Reduce(RuleId),
    /// Accept the input.
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Action::Shift(s) => write!(f, "s{}", s),
            Action::Reduce(r) => write!(f, "r{}", r.as_usize()),
            Action::Accept => write!(f, "acc"),
        }
    }
}

/// The kind of a table conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// A state may both shift and reduce on a terminal.
    ShiftReduce,
    /// A state may reduce with two different rules on a terminal.
    ReduceReduce,
    /// Two rules of a nonterminal can start with the same terminal.
    FirstFirst,
    /// Two rules of a nonterminal apply on a terminal that follows it.
    FollowFollow,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConflictKind::ShiftReduce => write!(f, "shift/reduce"),
            ConflictKind::ReduceReduce => write!(f, "reduce/reduce"),
            ConflictKind::FirstFirst => write!(f, "first/first"),
            ConflictKind::FollowFollow => write!(f, "follow/follow"),
        }
    }
}

/// A conflict between multiple actions triggered by the same terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    state: StateId,
    terminal: TerminalId,
    kind: ConflictKind,
    actions: Vec<Action>,
}

impl Conflict {
    /// The state in which the conflict occurs.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// The terminal that triggers the conflicting actions.
    pub fn terminal(&self) -> TerminalId {
        self.terminal
    }

    /// The kind of conflict.
    pub fn kind(&self) -> ConflictKind {
        self.kind
    }

    /// The competing actions. The first one is the one kept in the table.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// The rules of all competing reductions.
    pub fn reductions(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.actions.iter().filter_map(|a| match *a {
            Action::Reduce(r) => Some(r),
            _ => None,
        })
    }

    /// Get a pretty printer for this conflict.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Conflict> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} conflict in state {} on `{}`:",
            self.item.kind,
            self.item.state,
            self.item.terminal.pretty(self.ctx)
        )?;
        for action in &self.item.actions {
            match *action {
                Action::Reduce(r) => write!(f, "\n    reduce {}", r.pretty(self.ctx))?,
                Action::Shift(s) => write!(f, "\n    shift and go to {}", s)?,
                Action::Accept => write!(f, "\n    accept")?,
            }
        }
        Ok(())
    }
}

fn classify(actions: &[Action]) -> ConflictKind {
    if actions.iter().all(|a| matches!(a, Action::Reduce(_))) {
        ConflictKind::ReduceReduce
    } else {
        ConflictKind::ShiftReduce
    }
}

/// A shift-reduce parsing table.
#[derive(Debug, Clone)]
pub struct ParsingTable {
    method: Method,
    num_states: usize,
    action: IndexMap<(StateId, TerminalId), Action>,
    goto: IndexMap<(StateId, NonterminalId), StateId>,
    conflicts: Vec<Conflict>,
}

impl ParsingTable {
    /// Build the parsing table of a grammar.
    ///
    /// Computes the first and follow sets and the automaton required by the
    /// method. Use `LrAnalysis` to keep these around. The grammar is augmented
    /// first if necessary; all ids of `grammar` remain valid for the table.
    pub fn build(grammar: &Grammar, method: Method) -> Result<ParsingTable, BuildError> {
        if grammar.nonterminal_id_bound() == 0 {
            return Err(BuildError::EmptyGrammar);
        }
        let augmented;
        let grammar = if grammar.is_augmented() {
            grammar
        } else {
            augmented = grammar.augmented();
            &augmented
        };
        let first_sets = FirstSets::compute(grammar);
        let follow_sets = FollowSets::compute(grammar, &first_sets);
        let automaton = method.build_automaton(grammar, &first_sets)?;
        ParsingTable::from_automaton(grammar, &automaton, method, &follow_sets)
    }

    /// Build the parsing table from an existing automaton.
    pub fn from_automaton(
        grammar: &Grammar,
        automaton: &Automaton,
        method: Method,
        follow_sets: &FollowSets,
    ) -> Result<ParsingTable, BuildError> {
        let mut table = ParsingTable {
            method: method,
            num_states: automaton.len(),
            action: IndexMap::new(),
            goto: IndexMap::new(),
            conflicts: Vec::new(),
        };
        let start = grammar.start();

        for state in automaton.states() {
            let id = state.id();
            for item in state.items().items() {
                match item.next_symbol(grammar) {
                    None if grammar[item.rule()].name() == start => {
                        table.register(id, END, Action::Accept);
                    }
                    None => {
                        let action = Action::Reduce(item.rule());
                        for t in method.lookaheads(grammar, item, follow_sets).iter() {
                            table.register(id, TerminalId::from_usize(t), action);
                        }
                    }
                    Some(symbol) => {
                        let target = automaton.transition(id, symbol).ok_or_else(|| {
                            BuildError::MissingTransition {
                                state: id,
                                symbol: grammar.symbol_name(symbol).to_string(),
                            }
                        })?;
                        match symbol {
                            Symbol::Terminal(t) => table.register(id, t, Action::Shift(target)),
                            Symbol::Nonterminal(nt) => {
                                table.goto.insert((id, nt), target);
                            }
                        }
                    }
                }
            }
        }

        debug!(
            "{} table: {} actions, {} gotos, {} conflicts",
            method,
            table.action.len(),
            table.goto.len(),
            table.conflicts.len()
        );
        for conflict in &table.conflicts {
            warn!("{}", conflict.pretty(grammar));
        }
        Ok(table)
    }

    fn register(&mut self, state: StateId, terminal: TerminalId, action: Action) {
        let existing = match self.action.entry((state, terminal)) {
            Entry::Vacant(e) => {
                e.insert(action);
                return;
            }
            Entry::Occupied(e) => *e.get(),
        };
        if existing == action {
            return;
        }
        let found = self
            .conflicts
            .iter_mut()
            .find(|c| c.state == state && c.terminal == terminal);
        match found {
            Some(conflict) => {
                if !conflict.actions.contains(&action) {
                    conflict.actions.push(action);
                    conflict.kind = classify(&conflict.actions);
                }
            }
            None => {
                let actions = vec![existing, action];
                self.conflicts.push(Conflict {
                    state: state,
                    terminal: terminal,
                    kind: classify(&actions),
                    actions: actions,
                });
            }
        }
    }

    /// The method that was used to build the table.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The number of states, i.e. rows, of the table.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Look up the action for a state and terminal.
    pub fn action(&self, state: StateId, terminal: TerminalId) -> Option<Action> {
        self.action.get(&(state, terminal)).cloned()
    }

    /// Look up the goto entry for a state and nonterminal.
    pub fn goto(&self, state: StateId, nonterminal: NonterminalId) -> Option<StateId> {
        self.goto.get(&(state, nonterminal)).cloned()
    }

    /// Iterate over all action entries.
    pub fn actions(&self) -> impl Iterator<Item = ((StateId, TerminalId), Action)> + '_ {
        self.action.iter().map(|(&k, &v)| (k, v))
    }

    /// Iterate over all goto entries.
    pub fn gotos(&self) -> impl Iterator<Item = ((StateId, NonterminalId), StateId)> + '_ {
        self.goto.iter().map(|(&k, &v)| (k, v))
    }

    /// The conflicts found while building the table.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Whether the table has no conflicts.
    pub fn is_conflict_free(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Find the conflict registered for a state and terminal.
    pub fn conflict(&self, state: StateId, terminal: TerminalId) -> Option<&Conflict> {
        self.conflicts
            .iter()
            .find(|c| c.state == state && c.terminal == terminal)
    }

    /// The contents of a single cell, with all candidates if it conflicts.
    pub fn cell(&self, state: StateId, terminal: TerminalId) -> Vec<Action> {
        match self.conflict(state, terminal) {
            Some(conflict) => conflict.actions.clone(),
            None => self.action(state, terminal).into_iter().collect(),
        }
    }

    /// Get a pretty printer that renders the table with one row per state.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a ParsingTable> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let grammar = self.ctx;
        let table = self.item;
        let hidden = grammar.start_rule().map(|r| grammar[r].name());
        let terms: Vec<TerminalId> = grammar.terminals().collect();
        let nonterms: Vec<NonterminalId> = grammar
            .nonterminals()
            .filter(|&nt| Some(nt) != hidden)
            .collect();

        let mut header = vec![String::new()];
        header.extend(terms.iter().map(|&t| t.pretty(grammar).to_string()));
        header.extend(nonterms.iter().map(|&nt| nt.pretty(grammar).to_string()));
        let mut rows = vec![header];
        for s in 0..table.num_states {
            let state = StateId::from_usize(s);
            let mut row = vec![state.to_string()];
            for &t in &terms {
                let cell: Vec<String> = table.cell(state, t).iter().map(Action::to_string).collect();
                row.push(cell.join("/"));
            }
            for &nt in &nonterms {
                row.push(table.goto(state, nt).map(|s| s.to_string()).unwrap_or_default());
            }
            rows.push(row);
        }
        write_rows(f, &rows)
    }
}

/// Write rows of cells as aligned columns.
pub(crate) fn write_rows(f: &mut fmt::Formatter, rows: &[Vec<String>]) -> fmt::Result {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|r| r.get(c))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        let mut line = String::new();
        for (&width, cell) in widths.iter().zip(row) {
            if !line.is_empty() {
                line.push_str(" | ");
            }
            line.push_str(cell);
            for _ in cell.chars().count()..width {
                line.push(' ');
            }
        }
        write!(f, "{}", line.trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;

    // E : E + T | T ; T : T * F | F ; F : ( E ) | num ;
    fn expr() -> Grammar {
        let mut g = Grammar::new();
        let (e, t, f) = (
            g.add_nonterminal("E"),
            g.add_nonterminal("T"),
            g.add_nonterminal("F"),
        );
        let (plus, star, lp, rp, num) = (
            g.add_terminal("+"),
            g.add_terminal("*"),
            g.add_terminal("("),
            g.add_terminal(")"),
            g.add_terminal("num"),
        );
        g.add_rule(Rule::new(e, vec![e.into(), plus.into(), t.into()]));
        g.add_rule(Rule::new(e, vec![t.into()]));
        g.add_rule(Rule::new(t, vec![t.into(), star.into(), f.into()]));
        g.add_rule(Rule::new(t, vec![f.into()]));
        g.add_rule(Rule::new(f, vec![lp.into(), e.into(), rp.into()]));
        g.add_rule(Rule::new(f, vec![num.into()]));
        g.augmented()
    }

    #[test]
    fn method_names() {
        assert_eq!("lalr1".parse::<Method>(), Ok(Method::Lalr1));
        assert_eq!("SLR".parse::<Method>(), Ok(Method::Slr1));
        assert_eq!("lr(0)".parse::<Method>(), Ok(Method::Lr0));
        assert!("ll1".parse::<Method>().is_err());
    }

    #[test]
    fn expression_tables() {
        let g = expr();
        for &method in &[Method::Slr1, Method::Lr1, Method::Lalr1] {
            let table = ParsingTable::build(&g, method).unwrap();
            assert!(table.is_conflict_free(), "{} has conflicts", method);
        }
        let lalr = ParsingTable::build(&g, Method::Lalr1).unwrap();
        let slr = ParsingTable::build(&g, Method::Slr1).unwrap();
        assert_eq!(lalr.num_states(), 12);
        assert_eq!(slr.num_states(), 12);
        let accepts = lalr.actions().filter(|&(_, a)| a == Action::Accept).count();
        assert_eq!(accepts, 1);
    }

    #[test]
    fn lr0_conflicts() {
        let g = expr();
        let table = ParsingTable::build(&g, Method::Lr0).unwrap();
        assert!(!table.is_conflict_free());
        let star = g.get_terminal("*").unwrap();
        let conflict = table
            .conflicts()
            .iter()
            .find(|c| c.terminal() == star)
            .expect("conflict on `*`");
        assert_eq!(conflict.kind(), ConflictKind::ShiftReduce);
        assert_eq!(conflict.reductions().count(), 1);
        // The table keeps the first action.
        assert_eq!(
            table.action(conflict.state(), star),
            Some(conflict.actions()[0])
        );
        assert_eq!(table.cell(conflict.state(), star).len(), 2);
    }

    #[test]
    fn reduce_reduce() {
        // S : A | B ; A : x ; B : x ;
        let mut g = Grammar::new();
        let (s, a, b) = (
            g.add_nonterminal("S"),
            g.add_nonterminal("A"),
            g.add_nonterminal("B"),
        );
        let x = g.add_terminal("x");
        g.add_rule(Rule::new(s, vec![a.into()]));
        g.add_rule(Rule::new(s, vec![b.into()]));
        g.add_rule(Rule::new(a, vec![x.into()]));
        g.add_rule(Rule::new(b, vec![x.into()]));
        let table = ParsingTable::build(&g.augmented(), Method::Lalr1).unwrap();
        assert_eq!(table.conflicts().len(), 1);
        assert_eq!(table.conflicts()[0].kind(), ConflictKind::ReduceReduce);
        assert_eq!(table.conflicts()[0].terminal(), END);
    }

    #[test]
    fn render() {
        let g = expr();
        let table = ParsingTable::build(&g, Method::Slr1).unwrap();
        let text = table.pretty(&g).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 13);
        assert!(lines[0].contains("$end"));
        assert!(lines[0].contains("num"));
        assert!(!lines[0].contains("E'"));
        assert!(text.contains("acc"));
    }
}
