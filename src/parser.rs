// Copyright (c) 2018 Fabian Schuiki

//! A table-driven shift-reduce parser.
//!
//! The parser keeps a stack of symbols, each paired with the state the
//! automaton was in after pushing it, and the attribute synthesized for it.
//! The bottom of the stack is the implicit initial state 0. In every step the
//! action for the current state and the next token decides whether to shift
//! the token, reduce the tail of the stack to a nonterminal, or accept.
//!
//! The sequence of rules reduced is the right parse of the input, in reverse
//! order of a rightmost derivation. The reduction of the augmented start rule
//! is signalled by the accept action and is not part of it.

use std::fmt;

use log::{debug, error, trace};
use thiserror::Error;

use crate::automaton::StateId;
use crate::derivation::{DerivationError, DerivationTree};
use crate::grammar::{Grammar, RuleId, Symbol, END};
use crate::semantics::{Attr, Semantics};
use crate::table::{Action, ParsingTable};
use crate::tokens::Token;

/// An error that occurs while parsing a token stream.
///
/// Parse errors leave the grammar and table untouched; the same parser can be
/// used again on different input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The token stream is not terminated by `$end`.
    #[error("token stream must end with `$end`")]
    MissingEnd,
    /// The table has no action for the current state and token.
    #[error("unexpected `{lexeme}` ({terminal}) at token {position} in state {state}")]
    UnexpectedToken {
        /// The state the parser was in.
        state: StateId,
        /// The name of the terminal of the token.
        terminal: String,
        /// The text of the token.
        lexeme: String,
        /// The index of the token in the input.
        position: usize,
    },
    /// The LL(1) table has no rule for the nonterminal and token.
    #[error("no rule of `{nonterminal}` starts with `{terminal}` at token {position}")]
    UnexpectedLlToken {
        /// The nonterminal on top of the stack.
        nonterminal: String,
        /// The name of the terminal of the token.
        terminal: String,
        /// The index of the token in the input.
        position: usize,
    },
    /// The terminal on top of the LL(1) stack does not match the token.
    #[error("expected `{expected}`, found `{found}` at token {position}")]
    Mismatch {
        /// The terminal on top of the stack.
        expected: String,
        /// The terminal of the token.
        found: String,
        /// The index of the token in the input.
        position: usize,
    },
    /// The start symbol was recognized before the end of the input.
    #[error("trailing input at token {position}")]
    TrailingInput {
        /// The index of the first token not consumed.
        position: usize,
    },
    /// The grammar has no start symbol.
    #[error("grammar has no nonterminals")]
    EmptyGrammar,
    /// The stack contradicts the table. Indicates a table that was not built
    /// for this grammar.
    #[error("corrupt parsing table in state {state}: {reason}")]
    CorruptTable {
        /// The state the parser was in.
        state: StateId,
        /// What went wrong.
        reason: String,
    },
}

/// Check that a token stream ends in `$end` and contains no other `$end`.
pub(crate) fn check_end(tokens: &[Token]) -> Result<(), ParseError> {
    match tokens.last() {
        Some(t) if t.terminal == END => (),
        _ => return Err(ParseError::MissingEnd),
    }
    match tokens.iter().position(|t| t.terminal == END) {
        Some(i) if i + 1 < tokens.len() => Err(ParseError::TrailingInput { position: i + 1 }),
        _ => Ok(()),
    }
}

/// The result of a successful parse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parse {
    /// The rules reduced, in order. This is the right parse of the input.
    pub reductions: Vec<RuleId>,
}

impl Parse {
    /// Reconstruct the derivation tree of the parse.
    pub fn tree(&self, grammar: &Grammar) -> Result<DerivationTree, DerivationError> {
        DerivationTree::from_right_parse(grammar, &self.reductions)
    }
}

/// A shift-reduce parser for a grammar and one of its tables.
#[derive(Debug, Clone, Copy)]
pub struct LrParser<'a> {
    grammar: &'a Grammar,
    table: &'a ParsingTable,
}

impl<'a> LrParser<'a> {
    /// Create a new parser.
    pub fn new(grammar: &'a Grammar, table: &'a ParsingTable) -> LrParser<'a> {
        LrParser {
            grammar: grammar,
            table: table,
        }
    }

    /// Parse a token stream and return the right parse.
    pub fn parse(&self, tokens: &[Token]) -> Result<Parse, ParseError> {
        let mut machine = LrMachine::<()>::new(self.grammar, self.table, tokens)?;
        machine.run().map(|(parse, _)| parse)
    }

    /// Parse a token stream and evaluate the synthesis functions along the
    /// way. Returns the right parse and the value synthesized for the start
    /// symbol, if its rule has a function.
    pub fn parse_with<V>(
        &self,
        tokens: &[Token],
        semantics: &Semantics<V>,
    ) -> Result<(Parse, Option<V>), ParseError> {
        let mut machine = LrMachine::new(self.grammar, self.table, tokens)?;
        machine.set_semantics(semantics);
        machine.run()
    }

    /// Create a state machine to step through the parse of a token stream.
    pub fn machine<V>(&self, tokens: &'a [Token]) -> Result<LrMachine<'a, V>, ParseError> {
        LrMachine::new(self.grammar, self.table, tokens)
    }
}

/// A single step taken by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A token was shifted and the parser moved to a state.
    Shift(StateId),
    /// The tail of the stack was reduced with a rule.
    Reduce(RuleId),
    /// The input was accepted.
    Accept,
}

/// An entry on the parser stack.
struct StackEntry<V> {
    symbol: Symbol,
    attr: Attr<V>,
    state: StateId,
}

/// The parse stack and driver of a shift-reduce parser.
pub struct LrMachine<'a, V> {
    grammar: &'a Grammar,
    table: &'a ParsingTable,
    semantics: Option<&'a Semantics<V>>,
    tokens: &'a [Token],
    position: usize,
    stack: Vec<StackEntry<V>>,
    reductions: Vec<RuleId>,
    result: Option<Option<V>>,
}

impl<'a, V> LrMachine<'a, V> {
    /// Create a new parser state machine.
    ///
    /// Fails if the token stream is not terminated by `$end`.
    pub fn new(
        grammar: &'a Grammar,
        table: &'a ParsingTable,
        tokens: &'a [Token],
    ) -> Result<LrMachine<'a, V>, ParseError> {
        check_end(tokens)?;
        Ok(LrMachine {
            grammar: grammar,
            table: table,
            semantics: None,
            tokens: tokens,
            position: 0,
            stack: Vec::new(),
            reductions: Vec::new(),
            result: None,
        })
    }

    /// Evaluate synthesis functions during the parse.
    pub fn set_semantics(&mut self, semantics: &'a Semantics<V>) {
        self.semantics = Some(semantics);
    }

    /// The state the parser is currently in.
    pub fn state(&self) -> StateId {
        self.stack
            .last()
            .map(|e| e.state)
            .unwrap_or_else(|| StateId::from_usize(0))
    }

    /// The next token of the input.
    pub fn lookahead(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    /// The index of the next token of the input.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The symbols currently on the stack, bottom first.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.stack.iter().map(|e| e.symbol).collect()
    }

    /// The rules reduced so far.
    pub fn reductions(&self) -> &[RuleId] {
        &self.reductions
    }

    /// Whether the input has been accepted.
    pub fn is_accepted(&self) -> bool {
        self.result.is_some()
    }

    /// Perform a single action of the parser.
    pub fn step(&mut self) -> Result<Step, ParseError> {
        if self.result.is_some() {
            return Ok(Step::Accept);
        }
        let state = self.state();
        let token = self.lookahead().ok_or(ParseError::MissingEnd)?;
        let action = self
            .table
            .action(state, token.terminal)
            .ok_or_else(|| ParseError::UnexpectedToken {
                state: state,
                terminal: self.grammar.terminal_name(token.terminal).to_string(),
                lexeme: token.lexeme.clone(),
                position: self.position,
            })?;
        trace!("state {}, lookahead `{}`: {}", state, token, action);
        match action {
            Action::Shift(target) => {
                self.stack.push(StackEntry {
                    symbol: Symbol::Terminal(token.terminal),
                    attr: Attr::Terminal(token.clone()),
                    state: target,
                });
                self.position += 1;
                Ok(Step::Shift(target))
            }
            Action::Reduce(rule) => {
                self.reduce(state, rule)?;
                Ok(Step::Reduce(rule))
            }
            Action::Accept => {
                let value = self.stack.pop().and_then(|e| e.attr.into_value());
                self.result = Some(value);
                debug!("accepted after {} reductions", self.reductions.len());
                Ok(Step::Accept)
            }
        }
    }

    fn reduce(&mut self, state: StateId, rule: RuleId) -> Result<(), ParseError> {
        let grammar = self.grammar;
        let body = grammar[rule].symbols();
        if self.stack.len() < body.len() {
            return Err(self.corrupt(state, format!(
                "stack too short to reduce {}",
                rule.pretty(grammar)
            )));
        }
        let at = self.stack.len() - body.len();
        for (entry, &expected) in self.stack[at..].iter().zip(body) {
            if entry.symbol != expected {
                let reason = format!(
                    "found `{}` on the stack while reducing {}",
                    entry.symbol.pretty(grammar),
                    rule.pretty(grammar)
                );
                return Err(self.corrupt(state, reason));
            }
        }
        let attrs: Vec<Attr<V>> = self.stack.drain(at..).map(|e| e.attr).collect();
        let name = grammar[rule].name();
        let below = self.state();
        let target = match self.table.goto(below, name) {
            Some(target) => target,
            None => {
                let reason = format!("no goto on `{}`", name.pretty(grammar));
                return Err(self.corrupt(below, reason));
            }
        };
        let value = self.semantics.and_then(|s| s.apply(rule, attrs));
        debug!("reduce {}, goto {}", rule.pretty(grammar), target);
        self.reductions.push(rule);
        self.stack.push(StackEntry {
            symbol: Symbol::Nonterminal(name),
            attr: Attr::Nonterminal(value),
            state: target,
        });
        Ok(())
    }

    fn corrupt(&self, state: StateId, reason: String) -> ParseError {
        error!("corrupt parsing table in state {}: {}", state, reason);
        ParseError::CorruptTable {
            state: state,
            reason: reason,
        }
    }

    /// Run the parser to completion.
    ///
    /// Returns the right parse and the value synthesized for the start
    /// symbol.
    pub fn run(&mut self) -> Result<(Parse, Option<V>), ParseError> {
        while self.result.is_none() {
            self.step()?;
        }
        let value = self.result.take().and_then(|v| v);
        let reductions = std::mem::replace(&mut self.reductions, Vec::new());
        Ok((
            Parse {
                reductions: reductions,
            },
            value,
        ))
    }
}

impl<'a, V> fmt::Debug for LrMachine<'a, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LrMachine")
            .field("state", &self.state())
            .field("position", &self.position)
            .field("depth", &self.stack.len())
            .field("reductions", &self.reductions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;
    use crate::table::Method;
    use crate::tokens::tokenize;

    // L : L item | item ;
    fn list() -> (Grammar, RuleId, RuleId) {
        let mut g = Grammar::new();
        let l = g.add_nonterminal("L");
        let item = g.add_terminal("item");
        let more = g.add_rule(Rule::new(l, vec![l.into(), item.into()]));
        let one = g.add_rule(Rule::new(l, vec![item.into()]));
        (g.augmented(), more, one)
    }

    #[test]
    fn right_parse() {
        let (g, more, one) = list();
        let table = ParsingTable::build(&g, Method::Lalr1).unwrap();
        let parser = LrParser::new(&g, &table);
        let tokens = tokenize(&g, "item item item").unwrap();
        let parse = parser.parse(&tokens).unwrap();
        assert_eq!(parse.reductions, vec![one, more, more]);
    }

    #[test]
    fn count_with_semantics() {
        let (g, more, one) = list();
        let table = ParsingTable::build(&g, Method::Slr1).unwrap();
        let mut sem = Semantics::new();
        sem.add(one, |_| 1usize);
        sem.add(more, |mut attrs: Vec<Attr<usize>>| {
            attrs.remove(0).unwrap_nonterminal() + 1
        });
        let tokens = tokenize(&g, "item item item item").unwrap();
        let (_, value) = LrParser::new(&g, &table).parse_with(&tokens, &sem).unwrap();
        assert_eq!(value, Some(4));
    }

    #[test]
    fn errors() {
        let (g, _, _) = list();
        let table = ParsingTable::build(&g, Method::Lalr1).unwrap();
        let parser = LrParser::new(&g, &table);
        let item = g.get_terminal("item").unwrap();
        assert_eq!(
            parser.parse(&[Token::new("item", item)]),
            Err(ParseError::MissingEnd)
        );
        assert_eq!(parser.parse(&[]), Err(ParseError::MissingEnd));
        match parser.parse(&[Token::end()]) {
            Err(ParseError::UnexpectedToken {
                state,
                terminal,
                position,
                ..
            }) => {
                assert_eq!(state, StateId::from_usize(0));
                assert_eq!(terminal, "$end");
                assert_eq!(position, 0);
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn end_only_at_the_end() {
        let (g, _, _) = list();
        let table = ParsingTable::build(&g, Method::Lalr1).unwrap();
        let parser = LrParser::new(&g, &table);
        let item = g.get_terminal("item").unwrap();
        let tokens = [
            Token::new("item", item),
            Token::end(),
            Token::new("item", item),
            Token::end(),
        ];
        assert_eq!(
            parser.parse(&tokens),
            Err(ParseError::TrailingInput { position: 2 })
        );
        assert_eq!(
            parser.machine::<()>(&tokens[..2]).map(|m| m.position()),
            Ok(0)
        );
    }

    #[test]
    fn step_by_step() {
        let (g, _, one) = list();
        let table = ParsingTable::build(&g, Method::Lr1).unwrap();
        let parser = LrParser::new(&g, &table);
        let tokens = tokenize(&g, "item").unwrap();
        let mut machine = parser.machine::<()>(&tokens).unwrap();
        assert!(matches!(machine.step(), Ok(Step::Shift(_))));
        assert_eq!(machine.position(), 1);
        assert_eq!(machine.step(), Ok(Step::Reduce(one)));
        assert_eq!(machine.symbols(), vec![Symbol::Nonterminal(g[one].name())]);
        assert_eq!(machine.step(), Ok(Step::Accept));
        assert!(machine.is_accepted());
    }
}
