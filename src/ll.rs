// Copyright (c) 2018 Fabian Schuiki

//! LL(1) parsing tables and the predictive parser driven by them.
//!
//! For every rule `X -> α` the table maps `(X, a)` to the rule for each
//! terminal `a` in First(α). If α can derive epsilon, the rule is also entered
//! for every terminal in Follow(X). A cell that receives two different rules
//! is a conflict: First/First when the second rule was entered through its
//! first set, Follow/Follow when it was entered through the follow set.

use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::first::FirstSets;
use crate::follow::FollowSets;
use crate::grammar::{Grammar, NonterminalId, RuleId, Symbol, TerminalId, END};
use crate::parser::{check_end, ParseError};
use crate::table::{write_rows, ConflictKind};
use crate::tokens::Token;
use crate::Pretty;

/// A conflict between rules of a nonterminal on the same terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlConflict {
    nonterminal: NonterminalId,
    terminal: TerminalId,
    kind: ConflictKind,
    rules: Vec<RuleId>,
}

impl LlConflict {
    /// The nonterminal whose rules compete.
    pub fn nonterminal(&self) -> NonterminalId {
        self.nonterminal
    }

    /// The terminal on which the rules compete.
    pub fn terminal(&self) -> TerminalId {
        self.terminal
    }

    /// Either `FirstFirst` or `FollowFollow`.
    pub fn kind(&self) -> ConflictKind {
        self.kind
    }

    /// The competing rules. The first one is the one kept in the table.
    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }

    /// Get a pretty printer for this conflict.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a LlConflict> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} conflict for `{}` on `{}`:",
            self.item.kind,
            self.item.nonterminal.pretty(self.ctx),
            self.item.terminal.pretty(self.ctx)
        )?;
        for &rule in &self.item.rules {
            write!(f, "\n    {}", rule.pretty(self.ctx))?;
        }
        Ok(())
    }
}

/// An LL(1) parsing table.
#[derive(Debug, Clone)]
pub struct LlTable {
    entries: IndexMap<(NonterminalId, TerminalId), RuleId>,
    conflicts: Vec<LlConflict>,
}

impl LlTable {
    /// Build the LL(1) table of a grammar.
    pub fn build(grammar: &Grammar) -> LlTable {
        let first_sets = FirstSets::compute(grammar);
        let follow_sets = FollowSets::compute(grammar, &first_sets);
        LlTable::from_sets(grammar, &first_sets, &follow_sets)
    }

    /// Build the LL(1) table from precomputed first and follow sets.
    pub fn from_sets(
        grammar: &Grammar,
        first_sets: &FirstSets,
        follow_sets: &FollowSets,
    ) -> LlTable {
        let mut table = LlTable {
            entries: IndexMap::new(),
            conflicts: Vec::new(),
        };
        for id in grammar.rule_ids() {
            let rule = &grammar[id];
            let first = first_sets.of_sequence(rule.symbols());
            for t in first.symbols() {
                table.register(rule.name(), t, id, ConflictKind::FirstFirst);
            }
            if first.has_epsilon() {
                for t in follow_sets.terminals(rule.name()) {
                    table.register(rule.name(), t, id, ConflictKind::FollowFollow);
                }
            }
        }
        debug!(
            "LL(1) table: {} entries, {} conflicts",
            table.entries.len(),
            table.conflicts.len()
        );
        for conflict in &table.conflicts {
            warn!("{}", conflict.pretty(grammar));
        }
        table
    }

    fn register(
        &mut self,
        nonterminal: NonterminalId,
        terminal: TerminalId,
        rule: RuleId,
        kind: ConflictKind,
    ) {
        let existing = match self.entries.entry((nonterminal, terminal)) {
            Entry::Vacant(e) => {
                trace!("LL(1) entry ({:?}, {:?}) = {:?}", nonterminal, terminal, rule);
                e.insert(rule);
                return;
            }
            Entry::Occupied(e) => *e.get(),
        };
        if existing == rule {
            return;
        }
        let found = self
            .conflicts
            .iter_mut()
            .find(|c| c.nonterminal == nonterminal && c.terminal == terminal);
        match found {
            Some(conflict) => {
                if !conflict.rules.contains(&rule) {
                    conflict.rules.push(rule);
                }
            }
            None => self.conflicts.push(LlConflict {
                nonterminal: nonterminal,
                terminal: terminal,
                kind: kind,
                rules: vec![existing, rule],
            }),
        }
    }

    /// Look up the rule to expand a nonterminal with on a terminal.
    pub fn get(&self, nonterminal: NonterminalId, terminal: TerminalId) -> Option<RuleId> {
        self.entries.get(&(nonterminal, terminal)).cloned()
    }

    /// Iterate over all entries of the table.
    pub fn entries(&self) -> impl Iterator<Item = ((NonterminalId, TerminalId), RuleId)> + '_ {
        self.entries.iter().map(|(&k, &v)| (k, v))
    }

    /// The conflicts found while building the table.
    pub fn conflicts(&self) -> &[LlConflict] {
        &self.conflicts
    }

    /// Whether the grammar is LL(1).
    pub fn is_conflict_free(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// The contents of a single cell, with all candidates if it conflicts.
    pub fn cell(&self, nonterminal: NonterminalId, terminal: TerminalId) -> Vec<RuleId> {
        let conflict = self
            .conflicts
            .iter()
            .find(|c| c.nonterminal == nonterminal && c.terminal == terminal);
        match conflict {
            Some(c) => c.rules.clone(),
            None => self.get(nonterminal, terminal).into_iter().collect(),
        }
    }

    /// Get a pretty printer that renders the table with one row per
    /// nonterminal.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a LlTable> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let grammar = self.ctx;
        let terms: Vec<TerminalId> = grammar.terminals().collect();
        let mut header = vec![String::new()];
        header.extend(terms.iter().map(|&t| t.pretty(grammar).to_string()));
        let mut rows = vec![header];
        for nt in grammar.nonterminals() {
            let mut row = vec![nt.pretty(grammar).to_string()];
            for &t in &terms {
                let cell: Vec<String> = self
                    .item
                    .cell(nt, t)
                    .iter()
                    .map(|r| format!("r{}", r.as_usize()))
                    .collect();
                row.push(cell.join("/"));
            }
            rows.push(row);
        }
        write_rows(f, &rows)
    }
}

/// A predictive parser for a grammar and its LL(1) table.
#[derive(Debug, Clone, Copy)]
pub struct LlParser<'a> {
    grammar: &'a Grammar,
    table: &'a LlTable,
}

impl<'a> LlParser<'a> {
    /// Create a new parser.
    pub fn new(grammar: &'a Grammar, table: &'a LlTable) -> LlParser<'a> {
        LlParser {
            grammar: grammar,
            table: table,
        }
    }

    /// Parse a token stream and return the left parse, i.e. the rules in the
    /// order a leftmost derivation applies them.
    ///
    /// The parse succeeds only if the stack empties exactly when the input is
    /// down to the `$end` token.
    pub fn parse(&self, tokens: &[Token]) -> Result<Vec<RuleId>, ParseError> {
        check_end(tokens)?;
        let grammar = self.grammar;
        if grammar.nonterminal_id_bound() == 0 {
            return Err(ParseError::EmptyGrammar);
        }
        let mut stack = vec![Symbol::Nonterminal(grammar.start())];
        let mut cursor = 0;
        let mut output = Vec::new();

        while let Some(top) = stack.pop() {
            let token = tokens.get(cursor).ok_or(ParseError::MissingEnd)?;
            match top {
                Symbol::Terminal(t) => {
                    if t != token.terminal {
                        return Err(ParseError::Mismatch {
                            expected: grammar.terminal_name(t).to_string(),
                            found: grammar.terminal_name(token.terminal).to_string(),
                            position: cursor,
                        });
                    }
                    cursor += 1;
                }
                Symbol::Nonterminal(nt) => {
                    let rule = self.table.get(nt, token.terminal).ok_or_else(|| {
                        ParseError::UnexpectedLlToken {
                            nonterminal: grammar.nonterminal_name(nt).to_string(),
                            terminal: grammar.terminal_name(token.terminal).to_string(),
                            position: cursor,
                        }
                    })?;
                    trace!("expand {} on `{}`", rule.pretty(grammar), token);
                    output.push(rule);
                    stack.extend(grammar[rule].symbols().iter().rev().cloned());
                }
            }
        }

        match tokens.get(cursor) {
            Some(t) if t.terminal == END => {
                debug!("LL(1) parse done after {} expansions", output.len());
                Ok(output)
            }
            _ => Err(ParseError::TrailingInput { position: cursor }),
        }
    }
}
