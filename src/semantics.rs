// Copyright (c) 2018 Fabian Schuiki

//! Synthesis functions attached to the rules of a grammar.
//!
//! Each rule may carry a function that computes the attribute of the rule's
//! nonterminal from the attributes of its body, left to right. Terminals
//! contribute the token that was shifted, nonterminals the value their own
//! rule synthesized. Rules without a function synthesize nothing.

use std::collections::HashMap;
use std::fmt;

use crate::grammar::RuleId;
use crate::tokens::Token;

/// The attribute of a single body symbol passed to a synthesis function.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr<V> {
    /// A terminal, carrying the shifted token.
    Terminal(Token),
    /// A nonterminal, carrying the value its rule synthesized, if any.
    Nonterminal(Option<V>),
}

impl<V> Attr<V> {
    /// Return the token wrapped in this attribute.
    ///
    /// Panics if the attribute belongs to a nonterminal.
    pub fn unwrap_terminal(self) -> Token {
        match self {
            Attr::Terminal(x) => x,
            _ => panic!("attribute is not a terminal"),
        }
    }

    /// Return the value wrapped in this attribute.
    ///
    /// Panics if the attribute belongs to a terminal, or the nonterminal's
    /// rule synthesized no value.
    pub fn unwrap_nonterminal(self) -> V {
        match self {
            Attr::Nonterminal(Some(x)) => x,
            Attr::Nonterminal(None) => panic!("nonterminal has no synthesized value"),
            _ => panic!("attribute is not a nonterminal"),
        }
    }

    /// Return the value of a nonterminal attribute, or `None` for terminals.
    pub fn into_value(self) -> Option<V> {
        match self {
            Attr::Nonterminal(x) => x,
            Attr::Terminal(_) => None,
        }
    }
}

type Synth<V> = Box<dyn Fn(Vec<Attr<V>>) -> V>;

/// A registry of synthesis functions, keyed by rule.
pub struct Semantics<V> {
    functions: HashMap<RuleId, Synth<V>>,
}

impl<V> Semantics<V> {
    /// Create an empty registry.
    pub fn new() -> Semantics<V> {
        Semantics {
            functions: HashMap::new(),
        }
    }

    /// Attach a synthesis function to a rule, replacing any previous one.
    pub fn add<F>(&mut self, rule: RuleId, f: F) -> &mut Self
    where
        F: Fn(Vec<Attr<V>>) -> V + 'static,
    {
        self.functions.insert(rule, Box::new(f));
        self
    }

    /// Whether a rule has a synthesis function.
    pub fn has(&self, rule: RuleId) -> bool {
        self.functions.contains_key(&rule)
    }

    /// Apply the function of a rule to the attributes of its body.
    ///
    /// Returns `None` if the rule has no function.
    pub fn apply(&self, rule: RuleId, attrs: Vec<Attr<V>>) -> Option<V> {
        self.functions.get(&rule).map(|f| f(attrs))
    }
}

impl<V> Default for Semantics<V> {
    fn default() -> Semantics<V> {
        Semantics::new()
    }
}

impl<V> fmt::Debug for Semantics<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut rules: Vec<_> = self.functions.keys().map(|r| r.as_usize()).collect();
        rules.sort();
        f.debug_struct("Semantics").field("rules", &rules).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::TerminalId;

    #[test]
    fn apply_registered() {
        let rule = RuleId::from_usize(3);
        let mut sem = Semantics::new();
        sem.add(rule, |attrs: Vec<Attr<i64>>| {
            let mut iter = attrs.into_iter();
            let lhs = iter.next().unwrap().unwrap_nonterminal();
            let num: i64 = iter.next().unwrap().unwrap_terminal().lexeme.parse().unwrap();
            lhs + num
        });
        assert!(sem.has(rule));
        assert!(!sem.has(RuleId::from_usize(0)));
        let attrs = vec![
            Attr::Nonterminal(Some(40)),
            Attr::Terminal(Token::new("2", TerminalId::from_usize(1))),
        ];
        assert_eq!(sem.apply(rule, attrs), Some(42));
        assert_eq!(sem.apply(RuleId::from_usize(0), vec![]), None);
    }

    #[test]
    #[should_panic]
    fn missing_value_panics() {
        Attr::<u8>::Nonterminal(None).unwrap_nonterminal();
    }
}
