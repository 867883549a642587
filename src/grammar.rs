// Copyright (c) 2018 Fabian Schuiki

//! Data structures representing a grammar.
//!
//! A grammar is an arena of terminals, nonterminals, and rules. Everything
//! else in the crate refers to these through the lightweight `TerminalId`,
//! `NonterminalId`, and `RuleId` handles.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use crate::Pretty;

/// A grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    rules: Vec<Rule>,
    nonterms: HashMap<String, NonterminalId>,
    terms: HashMap<String, TerminalId>,
    nonterm_names: Vec<String>,
    nonterm_rules: Vec<Vec<RuleId>>,
    term_names: Vec<String>,
    start: Option<NonterminalId>,
    accept: Option<RuleId>,
}

/// A single rule within a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    name: NonterminalId,
    symbols: Vec<Symbol>,
}

/// A symbol of a production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// A terminal.
    Terminal(TerminalId),
    /// A nonterminal.
    Nonterminal(NonterminalId),
}

/// A unique nonterminal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonterminalId(usize);

/// A unique terminal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerminalId(usize);

/// A unique rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(usize);

/// The special end of input terminal `$end`.
pub const END: TerminalId = TerminalId(0);

/// The name of the end of input terminal.
pub const END_NAME: &str = "$end";

/// An iterator over the rules of a grammar.
pub type RulesIter<'a> = std::slice::Iter<'a, Rule>;

/// an iterator over the rule IDs of a grammar.
pub type RuleIdsIter<'a> = std::slice::Iter<'a, RuleId>;

impl Grammar {
    /// Create a new empty grammar.
    pub fn new() -> Grammar {
        Grammar {
            rules: Vec::new(),
            nonterms: HashMap::new(),
            terms: HashMap::new(),
            nonterm_names: Vec::new(),
            nonterm_rules: Vec::new(),
            term_names: Vec::new(),
            start: None,
            accept: None,
        }
    }

    /// Add a nonterminal.
    ///
    /// Adding a name twice returns the existing id.
    pub fn add_nonterminal<S: Into<String>>(&mut self, name: S) -> NonterminalId {
        let name = name.into();
        let next_id = NonterminalId(self.nonterm_names.len());
        if let Some(&id) = self.nonterms.get(&name) {
            id
        } else {
            self.nonterms.insert(name.clone(), next_id);
            self.nonterm_names.push(name);
            self.nonterm_rules.push(Vec::new());
            next_id
        }
    }

    /// Add a terminal.
    ///
    /// Adding a name twice returns the existing id. The name `$end` always
    /// refers to the builtin `END` terminal.
    pub fn add_terminal<S: Into<String>>(&mut self, name: S) -> TerminalId {
        let name = name.into();
        if name == END_NAME {
            return END;
        }
        let next_id = TerminalId(self.term_names.len() + 1);
        if let Some(&id) = self.terms.get(&name) {
            id
        } else {
            self.terms.insert(name.clone(), next_id);
            self.term_names.push(name);
            next_id
        }
    }

    /// Find a nonterminal by name.
    pub fn get_nonterminal(&self, name: &str) -> Option<NonterminalId> {
        self.nonterms.get(name).cloned()
    }

    /// Find a terminal by name.
    pub fn get_terminal(&self, name: &str) -> Option<TerminalId> {
        if name == END_NAME {
            Some(END)
        } else {
            self.terms.get(name).cloned()
        }
    }

    /// Get the name of a nonterminal.
    pub fn nonterminal_name(&self, id: NonterminalId) -> &str {
        &self.nonterm_names[id.as_usize()]
    }

    /// Get the name of a terminal.
    pub fn terminal_name(&self, id: TerminalId) -> &str {
        if id == END {
            END_NAME
        } else {
            &self.term_names[id.as_usize() - 1]
        }
    }

    /// Get the name of a symbol.
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        match symbol {
            Symbol::Terminal(id) => self.terminal_name(id),
            Symbol::Nonterminal(id) => self.nonterminal_name(id),
        }
    }

    /// The upper bound on nonterminal IDs.
    ///
    /// Basically returns the largest nonterminal ID + 1. Can be used as
    /// capacity for containers that will hold terminals.
    pub fn nonterminal_id_bound(&self) -> usize {
        self.nonterm_names.len()
    }

    /// The upper bound on terminal IDs.
    ///
    /// Basically returns the largest terminal ID + 1. Can be used as capacity
    /// for containers that will hold terminals.
    pub fn terminal_id_bound(&self) -> usize {
        self.term_names.len() + 1
    }

    /// All terminals of the grammar, starting with `END`.
    pub fn terminals(&self) -> impl Iterator<Item = TerminalId> {
        (0..self.terminal_id_bound()).map(TerminalId)
    }

    /// All nonterminals of the grammar.
    pub fn nonterminals(&self) -> impl Iterator<Item = NonterminalId> {
        (0..self.nonterminal_id_bound()).map(NonterminalId)
    }

    /// All symbols of the grammar, terminals first.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> {
        self.terminals()
            .map(Symbol::Terminal)
            .chain(self.nonterminals().map(Symbol::Nonterminal))
    }

    /// Add a rule to the grammar.
    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        let id = RuleId::from_usize(self.rules.len());
        self.nonterm_rules[rule.name().as_usize()].push(id);
        self.rules.push(rule);
        id
    }

    /// The rules in this grammar.
    pub fn rules(&self) -> RulesIter {
        self.rules.iter()
    }

    /// The ids of all rules in this grammar.
    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.rules.len()).map(RuleId)
    }

    /// The rules for a specific nonterminal in the grammar.
    pub fn rules_for_nonterminal(&self, id: NonterminalId) -> RuleIdsIter {
        self.nonterm_rules[id.as_usize()].iter()
    }

    /// Access a single rule of this grammar.
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.as_usize()]
    }

    /// The start symbol of the grammar.
    ///
    /// Unless set explicitly, this is the first nonterminal added to the
    /// grammar. Panics if the grammar has no nonterminals.
    pub fn start(&self) -> NonterminalId {
        match self.start {
            Some(id) => id,
            None if !self.nonterm_names.is_empty() => NonterminalId(0),
            None => panic!("start() called on grammar without nonterminals"),
        }
    }

    /// Change the start symbol of the grammar.
    ///
    /// Moving the start symbol away from the one added by `augmented()`
    /// makes the grammar non-augmented again.
    pub fn set_start(&mut self, id: NonterminalId) {
        self.start = Some(id);
        if let Some(rule) = self.accept {
            if self.rules[rule.as_usize()].name != id {
                self.accept = None;
            }
        }
    }

    /// Check whether the grammar was produced by `augmented()`.
    ///
    /// A grammar whose start symbol merely has a single rule `S -> X` is not
    /// augmented; that rule is still an ordinary reduction.
    pub fn is_augmented(&self) -> bool {
        self.accept.is_some()
    }

    /// Derive the augmented grammar.
    ///
    /// Adds a new start symbol `S'` together with the single rule `S' -> S`,
    /// where `S` is the current start symbol. All ids of this grammar remain
    /// valid in the augmented grammar.
    pub fn augmented(&self) -> Grammar {
        let mut grammar = self.clone();
        let start = self.start();
        let mut name = format!("{}'", self.nonterminal_name(start));
        while grammar.get_nonterminal(&name).is_some() {
            name.push('\'');
        }
        let accept = grammar.add_nonterminal(name);
        let rule = grammar.add_rule(Rule::new(accept, vec![start.into()]));
        grammar.set_start(accept);
        grammar.accept = Some(rule);
        grammar
    }

    /// The rule `S' -> S` added by `augmented()`.
    ///
    /// Returns `None` if the grammar is not augmented.
    pub fn start_rule(&self) -> Option<RuleId> {
        self.accept
    }

    /// Get a pretty printer for this grammar.
    pub fn pretty(&self) -> Pretty<&Grammar, &Grammar> {
        Pretty::new(self, self)
    }
}

impl Default for Grammar {
    fn default() -> Grammar {
        Grammar::new()
    }
}

impl Index<RuleId> for Grammar {
    type Output = Rule;

    fn index(&self, index: RuleId) -> &Rule {
        self.rule(index)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Grammar> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for nt in self.ctx.nonterminals() {
            let mut rules = self.ctx.rules_for_nonterminal(nt);
            if let Some(&first) = rules.next() {
                write!(f, "{} : {}", nt.pretty(self.ctx), Body(self.ctx, &self.ctx[first]))?;
                for &rule in rules {
                    write!(f, " | {}", Body(self.ctx, &self.ctx[rule]))?;
                }
                writeln!(f, " ;")?;
            }
        }
        Ok(())
    }
}

impl Rule {
    /// Create a new empty rule.
    pub fn new(name: NonterminalId, symbols: Vec<Symbol>) -> Rule {
        Rule {
            name: name,
            symbols: symbols,
        }
    }

    /// The name of this rule.
    pub fn name(&self) -> NonterminalId {
        self.name
    }

    /// The symbols in this production.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Whether this is an epsilon rule.
    pub fn is_epsilon(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get a pretty printer for this rule.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

/// The body of a rule, with `ε` standing in for the empty sequence.
struct Body<'a>(&'a Grammar, &'a Rule);

impl<'a> fmt::Display for Body<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_sentence(f, self.0, self.1.symbols())
    }
}

/// Write a sequence of symbols separated by spaces, or `ε` if it is empty.
pub(crate) fn write_sentence(
    f: &mut fmt::Formatter,
    grammar: &Grammar,
    symbols: &[Symbol],
) -> fmt::Result {
    let mut iter = symbols.iter();
    if let Some(symbol) = iter.next() {
        write!(f, "{}", symbol.pretty(grammar))?;
        for symbol in iter {
            write!(f, " {}", symbol.pretty(grammar))?;
        }
        Ok(())
    } else {
        write!(f, "ε")
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Rule> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.item.name.pretty(self.ctx),
            Body(self.ctx, self.item)
        )
    }
}

impl Symbol {
    /// Whether this is a terminal.
    pub fn is_terminal(&self) -> bool {
        match *self {
            Symbol::Terminal(_) => true,
            Symbol::Nonterminal(_) => false,
        }
    }

    /// Whether this is a nonterminal.
    pub fn is_nonterminal(&self) -> bool {
        !self.is_terminal()
    }

    /// Get a pretty printer for this symbol.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl From<TerminalId> for Symbol {
    fn from(id: TerminalId) -> Symbol {
        Symbol::Terminal(id)
    }
}

impl From<NonterminalId> for Symbol {
    fn from(id: NonterminalId) -> Symbol {
        Symbol::Nonterminal(id)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Symbol> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.item {
            Symbol::Terminal(id) => write!(f, "{}", id.pretty(self.ctx)),
            Symbol::Nonterminal(id) => write!(f, "{}", id.pretty(self.ctx)),
        }
    }
}

impl NonterminalId {
    /// Create a nonterminal id from a usize.
    pub fn from_usize(id: usize) -> NonterminalId {
        NonterminalId(id)
    }

    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Get a pretty printer for this nonterminal.
    pub fn pretty(self, grammar: &Grammar) -> Pretty<&Grammar, Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, NonterminalId> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ctx.nonterminal_name(self.item))
    }
}

impl TerminalId {
    /// Create a terminal id from a usize.
    pub fn from_usize(id: usize) -> TerminalId {
        TerminalId(id)
    }

    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Get a pretty printer for this terminal.
    pub fn pretty(self, grammar: &Grammar) -> Pretty<&Grammar, Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, TerminalId> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ctx.terminal_name(self.item))
    }
}

impl RuleId {
    /// Create a rule id from a usize.
    pub fn from_usize(id: usize) -> RuleId {
        RuleId(id)
    }

    /// Obtain the id as a usize.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Get a pretty printer for this rule.
    pub fn pretty(self, grammar: &Grammar) -> Pretty<&Grammar, Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, RuleId> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ctx[self.item].pretty(self.ctx))
    }
}

/// Write a sequence of terminals separated by spaces.
pub(crate) fn write_terminals(
    f: &mut fmt::Formatter,
    grammar: &Grammar,
    terminals: &[TerminalId],
) -> fmt::Result {
    for (i, &t) in terminals.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", t.pretty(grammar))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Grammar, NonterminalId, TerminalId) {
        let mut g = Grammar::new();
        let nt_s = g.add_nonterminal("S");
        let t_a = g.add_terminal("a");
        g.add_rule(Rule::new(nt_s, vec![t_a.into(), nt_s.into()]));
        g.add_rule(Rule::new(nt_s, vec![]));
        (g, nt_s, t_a)
    }

    #[test]
    fn names_are_unique() {
        let mut g = Grammar::new();
        let a = g.add_terminal("a");
        assert_eq!(g.add_terminal("a"), a);
        assert_eq!(g.add_terminal("$end"), END);
        assert_eq!(g.terminal_name(END), "$end");
        let x = g.add_nonterminal("X");
        assert_eq!(g.add_nonterminal("X"), x);
        assert_eq!(g.get_terminal("a"), Some(a));
        assert_eq!(g.get_nonterminal("Y"), None);
    }

    #[test]
    fn augment() {
        let (g, nt_s, _) = sample();
        assert!(!g.is_augmented());
        let aug = g.augmented();
        assert!(aug.is_augmented());
        assert_eq!(aug.nonterminal_name(aug.start()), "S'");
        assert_eq!(aug.rules_for_nonterminal(aug.start()).count(), 1);
        let rule = aug.start_rule().unwrap();
        assert_eq!(aug[rule].symbols(), &[Symbol::Nonterminal(nt_s)]);
        // Original ids survive augmentation.
        assert_eq!(aug.nonterminal_name(nt_s), "S");
        assert_eq!(aug.rules().count(), g.rules().count() + 1);
    }

    #[test]
    fn single_start_rule_is_not_augmentation() {
        // P : E ; E : n ;
        let mut g = Grammar::new();
        let (p, e) = (g.add_nonterminal("P"), g.add_nonterminal("E"));
        let n = g.add_terminal("n");
        g.add_rule(Rule::new(p, vec![e.into()]));
        g.add_rule(Rule::new(e, vec![n.into()]));
        assert!(!g.is_augmented());
        assert_eq!(g.start_rule(), None);

        let mut aug = g.augmented();
        assert_eq!(aug.nonterminal_name(aug.start()), "P'");
        assert_eq!(aug.start_rule(), Some(RuleId::from_usize(2)));
        aug.set_start(p);
        assert!(!aug.is_augmented());
    }

    #[test]
    fn augmented_name_avoids_clashes() {
        let mut g = Grammar::new();
        let s = g.add_nonterminal("S");
        let s2 = g.add_nonterminal("S'");
        let t = g.add_terminal("t");
        g.add_rule(Rule::new(s, vec![s2.into()]));
        g.add_rule(Rule::new(s2, vec![t.into()]));
        let aug = g.augmented();
        assert_eq!(aug.nonterminal_name(aug.start()), "S''");
    }

    #[test]
    fn pretty_rules() {
        let (g, _, _) = sample();
        let lines: Vec<String> = g.rules().map(|r| format!("{}", r.pretty(&g))).collect();
        assert_eq!(lines, vec!["S -> a S", "S -> ε"]);
        assert_eq!(format!("{}", g.pretty()), "S : a S | ε ;\n");
    }
}
