// Copyright (c) 2018 Fabian Schuiki

//! Item sets derived from a grammar.
//!
//! An item is a rule with a marker that tracks how much of the rule has been
//! recognized so far, and optionally a set of lookahead terminals. The rule
//! and marker together form the *core* of the item. Item sets hold each core
//! at most once; adding two items with the same core merges their
//! lookaheads.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bit_set::BitSet;

use crate::first::FirstSets;
use crate::grammar::{Grammar, RuleId, Symbol, TerminalId};
use crate::Pretty;

/// An item set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ItemSet {
    /// The items in the set, sorted by core.
    items: Vec<Item>,
}

/// A single item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item {
    /// The rule of the item.
    pub(crate) rule: RuleId,
    /// The position of the marker within the rule.
    pub(crate) marker: usize,
    /// The lookahead terminals, if this is an LR(1) item.
    pub(crate) lookahead: Option<BitSet>,
}

/// The core of an item, i.e. the item without its lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Core {
    /// The rule of the item.
    pub rule: RuleId,
    /// The position of the marker within the rule.
    pub marker: usize,
}

impl Item {
    /// Create a new LR(0) item.
    pub fn new(rule: RuleId, marker: usize) -> Item {
        Item {
            rule: rule,
            marker: marker,
            lookahead: None,
        }
    }

    /// Create a new LR(1) item.
    pub fn with_lookahead(rule: RuleId, marker: usize, lookahead: BitSet) -> Item {
        Item {
            rule: rule,
            marker: marker,
            lookahead: Some(lookahead),
        }
    }

    /// Get the rule this item represents.
    pub fn rule(&self) -> RuleId {
        self.rule
    }

    /// Get the position of the marker within the rule.
    pub fn marker(&self) -> usize {
        self.marker
    }

    /// Get the lookahead terminals of this item.
    ///
    /// Returns `None` for LR(0) items.
    pub fn lookahead(&self) -> Option<&BitSet> {
        self.lookahead.as_ref()
    }

    /// Iterate over the lookahead terminals of this item.
    pub fn lookahead_terminals(&self) -> impl Iterator<Item = TerminalId> + '_ {
        self.lookahead
            .iter()
            .flat_map(|la| la.iter())
            .map(TerminalId::from_usize)
    }

    /// Get the core of this item.
    pub fn core(&self) -> Core {
        Core {
            rule: self.rule,
            marker: self.marker,
        }
    }

    /// Whether the marker is at the end of the rule.
    pub fn is_reduce(&self, grammar: &Grammar) -> bool {
        self.core().is_reduce(grammar)
    }

    /// The symbol right after the marker, if any.
    pub fn next_symbol(&self, grammar: &Grammar) -> Option<Symbol> {
        self.core().next_symbol(grammar)
    }

    /// The item with the marker advanced by one symbol.
    ///
    /// Returns `None` if this is a reduce item.
    pub fn advance(&self, grammar: &Grammar) -> Option<Item> {
        if self.is_reduce(grammar) {
            None
        } else {
            Some(Item {
                rule: self.rule,
                marker: self.marker + 1,
                lookahead: self.lookahead.clone(),
            })
        }
    }

    /// Get a pretty printer for this item.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl Core {
    /// Whether the marker is at the end of the rule.
    pub fn is_reduce(&self, grammar: &Grammar) -> bool {
        self.marker == grammar[self.rule].symbols().len()
    }

    /// The symbol right after the marker, if any.
    pub fn next_symbol(&self, grammar: &Grammar) -> Option<Symbol> {
        grammar[self.rule].symbols().get(self.marker).cloned()
    }

    /// The symbols after the one right after the marker.
    fn rest<'a>(&self, grammar: &'a Grammar) -> &'a [Symbol] {
        let symbols = grammar[self.rule].symbols();
        &symbols[(self.marker + 1).min(symbols.len())..]
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a Item> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rule = &self.ctx[self.item.rule];
        write!(f, "[{} ->", rule.name().pretty(self.ctx))?;
        let symbols = rule.symbols();
        for symbol in &symbols[0..self.item.marker] {
            write!(f, " {}", symbol.pretty(self.ctx))?;
        }
        write!(f, " .")?;
        for symbol in &symbols[self.item.marker..] {
            write!(f, " {}", symbol.pretty(self.ctx))?;
        }
        if let Some(ref la) = self.item.lookahead {
            write!(f, ",")?;
            for (i, t) in la.iter().enumerate() {
                write!(
                    f,
                    "{}{}",
                    if i == 0 { " " } else { "/" },
                    TerminalId::from_usize(t).pretty(self.ctx)
                )?;
            }
        }
        write!(f, "]")?;
        Ok(())
    }
}

impl ItemSet {
    /// Create an item set from a list of items.
    ///
    /// Items with the same core are merged into one, with the union of their
    /// lookaheads.
    pub fn new<I: IntoIterator<Item = Item>>(items: I) -> ItemSet {
        let mut merged: BTreeMap<Core, Option<BitSet>> = BTreeMap::new();
        for item in items {
            let core = item.core();
            match merged.get_mut(&core) {
                Some(existing) => merge_lookahead(existing, item.lookahead.as_ref()),
                None => {
                    merged.insert(core, item.lookahead);
                }
            }
        }
        ItemSet {
            items: merged
                .into_iter()
                .map(|(core, lookahead)| Item {
                    rule: core.rule,
                    marker: core.marker,
                    lookahead: lookahead,
                })
                .collect(),
        }
    }

    /// Get the items in the set.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The number of items in the set.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// The cores of all items in the set, in order.
    pub fn cores(&self) -> Vec<Core> {
        self.items.iter().map(Item::core).collect()
    }

    /// Find the item with the given core.
    pub fn get(&self, core: Core) -> Option<&Item> {
        self.items
            .binary_search_by(|item| item.core().cmp(&core))
            .ok()
            .map(|i| &self.items[i])
    }

    /// Merge the lookaheads of another item set into this one.
    ///
    /// Items are matched up by their core; items of `other` whose core is not
    /// present yet are added. Returns whether the set changed.
    pub fn merge(&mut self, other: &ItemSet) -> bool {
        let mut changed = false;
        let mut added = Vec::new();
        for item in &other.items {
            match self
                .items
                .binary_search_by(|other| other.core().cmp(&item.core()))
            {
                Ok(i) => {
                    let before = self.items[i].lookahead.clone();
                    merge_lookahead(&mut self.items[i].lookahead, item.lookahead.as_ref());
                    changed |= self.items[i].lookahead != before;
                }
                Err(_) => added.push(item.clone()),
            }
        }
        if !added.is_empty() {
            let items = std::mem::replace(&mut self.items, Vec::new());
            *self = ItemSet::new(items.into_iter().chain(added));
            changed = true;
        }
        changed
    }

    /// Whether the set contains a reduce item.
    pub fn has_reduce(&self, grammar: &Grammar) -> bool {
        self.items.iter().any(|item| item.is_reduce(grammar))
    }

    /// Compute the kernels of all successor sets.
    ///
    /// Groups the items by the symbol after their marker and advances the
    /// marker over that symbol. The result is ordered by symbol, which puts
    /// terminals before nonterminals.
    pub fn successors(&self, grammar: &Grammar) -> BTreeMap<Symbol, ItemSet> {
        let mut groups: BTreeMap<Symbol, Vec<Item>> = BTreeMap::new();
        for item in &self.items {
            if let Some(symbol) = item.next_symbol(grammar) {
                if let Some(next) = item.advance(grammar) {
                    groups.entry(symbol).or_insert_with(Vec::new).push(next);
                }
            }
        }
        groups
            .into_iter()
            .map(|(symbol, items)| (symbol, ItemSet::new(items)))
            .collect()
    }

    /// Get a pretty printer for this item set.
    pub fn pretty<'a>(&'a self, grammar: &'a Grammar) -> Pretty<&'a Grammar, &'a Self> {
        Pretty::new(grammar, self)
    }
}

impl<'a> fmt::Display for Pretty<&'a Grammar, &'a ItemSet> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, item) in self.item.items.iter().enumerate() {
            if index > 0 {
                write!(f, "\n")?;
            }
            write!(f, "{} {}", index, item.pretty(self.ctx))?;
        }
        if self.item.items.is_empty() {
            write!(f, "<empty>")?;
        }
        Ok(())
    }
}

fn merge_lookahead(into: &mut Option<BitSet>, other: Option<&BitSet>) {
    match (into.as_mut(), other) {
        (Some(into), Some(other)) => into.union_with(other),
        (None, Some(other)) => *into = Some(other.clone()),
        (_, None) => (),
    }
}

/// Compute the LR(0) closure of a set of items.
///
/// For every item with the marker in front of a nonterminal `B`, all rules of
/// `B` are added with the marker at the beginning, until nothing changes.
/// Lookaheads of the kernel items are preserved, the added items have none.
pub fn closure_lr0(grammar: &Grammar, kernel: &ItemSet) -> ItemSet {
    let mut seen: BTreeSet<Core> = kernel.items.iter().map(Item::core).collect();
    let mut pending: Vec<Core> = seen.iter().cloned().collect();
    let mut added = Vec::new();
    while let Some(core) = pending.pop() {
        if let Some(Symbol::Nonterminal(nt)) = core.next_symbol(grammar) {
            for &rule in grammar.rules_for_nonterminal(nt) {
                let new = Core {
                    rule: rule,
                    marker: 0,
                };
                if seen.insert(new) {
                    pending.push(new);
                    added.push(Item::new(rule, 0));
                }
            }
        }
    }
    ItemSet::new(kernel.items.iter().cloned().chain(added))
}

/// Compute the LR(1) closure of a set of items.
///
/// Like the LR(0) closure, but for an item `[A -> α . B β, L]` the added
/// items of `B` receive the lookaheads First(βL). Lookaheads of items with
/// the same core are merged, and an item is revisited whenever its
/// lookaheads grow, so the result is a fixed point.
pub fn closure_lr1(grammar: &Grammar, first_sets: &FirstSets, kernel: &ItemSet) -> ItemSet {
    let mut items: BTreeMap<Core, BitSet> = BTreeMap::new();
    for item in &kernel.items {
        let la = items.entry(item.core()).or_insert_with(BitSet::new);
        if let Some(ref lookahead) = item.lookahead {
            la.union_with(lookahead);
        }
    }
    let mut pending: Vec<Core> = items.keys().cloned().collect();
    while let Some(core) = pending.pop() {
        let nt = match core.next_symbol(grammar) {
            Some(Symbol::Nonterminal(nt)) => nt,
            _ => continue,
        };
        let lookahead = first_sets.of_sequence_then(core.rest(grammar), &items[&core]);
        for &rule in grammar.rules_for_nonterminal(nt) {
            let new = Core {
                rule: rule,
                marker: 0,
            };
            let mut fresh = false;
            let la = items.entry(new).or_insert_with(|| {
                fresh = true;
                BitSet::new()
            });
            let before = la.len();
            la.union_with(&lookahead);
            if fresh || la.len() != before {
                pending.push(new);
            }
        }
    }
    ItemSet {
        items: items
            .into_iter()
            .map(|(core, la)| Item::with_lookahead(core.rule, core.marker, la))
            .collect(),
    }
}

/// Compute the kernel reached from a set of items over a symbol.
///
/// Advances the marker of every item that is in front of `symbol`. The
/// result is not closed.
pub fn goto(grammar: &Grammar, items: &ItemSet, symbol: Symbol) -> ItemSet {
    ItemSet::new(
        items
            .items
            .iter()
            .filter(|item| item.next_symbol(grammar) == Some(symbol))
            .filter_map(|item| item.advance(grammar)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{NonterminalId, Rule, TerminalId, END};

    struct Expr {
        g: Grammar,
        e: NonterminalId,
        plus: TerminalId,
        id: TerminalId,
    }

    // E : E + T | T ; T : ( E ) | id ;
    fn expr() -> Expr {
        let mut g = Grammar::new();
        let (e, t) = (g.add_nonterminal("E"), g.add_nonterminal("T"));
        let (plus, lp, rp, id) = (
            g.add_terminal("+"),
            g.add_terminal("("),
            g.add_terminal(")"),
            g.add_terminal("id"),
        );
        g.add_rule(Rule::new(e, vec![e.into(), plus.into(), t.into()]));
        g.add_rule(Rule::new(e, vec![t.into()]));
        g.add_rule(Rule::new(t, vec![lp.into(), e.into(), rp.into()]));
        g.add_rule(Rule::new(t, vec![id.into()]));
        Expr {
            g: g.augmented(),
            e,
            plus,
            id,
        }
    }

    fn start_kernel(g: &Grammar, lookahead: bool) -> ItemSet {
        let rule = g.start_rule().unwrap();
        if lookahead {
            let mut la = BitSet::new();
            la.insert(END.as_usize());
            ItemSet::new(vec![Item::with_lookahead(rule, 0, la)])
        } else {
            ItemSet::new(vec![Item::new(rule, 0)])
        }
    }

    #[test]
    fn lr0_closure() {
        let x = expr();
        let closure = closure_lr0(&x.g, &start_kernel(&x.g, false));
        // S' -> .E, E -> .E+T, E -> .T, T -> .(E), T -> .id
        assert_eq!(closure.len(), 5);
        assert!(closure.items().iter().all(|i| i.marker() == 0));
        assert_eq!(closure_lr0(&x.g, &closure), closure);
    }

    #[test]
    fn lr1_closure() {
        let x = expr();
        let fs = FirstSets::compute(&x.g);
        let closure = closure_lr1(&x.g, &fs, &start_kernel(&x.g, true));
        assert_eq!(closure.len(), 5);
        assert_eq!(closure_lr1(&x.g, &fs, &closure), closure);

        // The E items see both `$end` and `+` as lookahead.
        for &rule in x.g.rules_for_nonterminal(x.e) {
            let item = closure.get(Core { rule, marker: 0 }).unwrap();
            let la: Vec<_> = item.lookahead_terminals().collect();
            assert_eq!(la, vec![END, x.plus]);
        }
    }

    #[test]
    fn goto_advances_marker() {
        let x = expr();
        let closure = closure_lr0(&x.g, &start_kernel(&x.g, false));
        let kernel = goto(&x.g, &closure, Symbol::Nonterminal(x.e));
        // S' -> E., E -> E.+T
        assert_eq!(kernel.len(), 2);
        assert!(kernel.has_reduce(&x.g));
        let kernel = goto(&x.g, &closure, Symbol::Terminal(x.id));
        assert_eq!(kernel.len(), 1);
        assert!(kernel.items()[0].is_reduce(&x.g));
        assert!(goto(&x.g, &closure, Symbol::Terminal(x.plus)).is_empty());

        let successors = closure.successors(&x.g);
        assert_eq!(successors[&Symbol::Nonterminal(x.e)], goto(&x.g, &closure, x.e.into()));
        let symbols: Vec<_> = successors.keys().cloned().collect();
        assert!(symbols.windows(2).all(|w| w[0] < w[1]));
        assert!(symbols[0].is_terminal());
    }

    #[test]
    fn merge_by_core() {
        let x = expr();
        let rule = x.g.start_rule().unwrap();
        let mut a = BitSet::new();
        a.insert(1);
        let mut b = BitSet::new();
        b.insert(2);
        let set = ItemSet::new(vec![
            Item::with_lookahead(rule, 0, a.clone()),
            Item::with_lookahead(rule, 0, b.clone()),
        ]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.items()[0].lookahead().unwrap().len(), 2);

        let mut target = ItemSet::new(vec![Item::with_lookahead(rule, 0, a)]);
        assert!(target.merge(&ItemSet::new(vec![Item::with_lookahead(rule, 0, b)])));
        assert_eq!(target, set);
        assert!(!target.merge(&set));
    }

    #[test]
    fn pretty_item() {
        let x = expr();
        let rule = x.g.rules_for_nonterminal(x.e).next().cloned().unwrap();
        let mut la = BitSet::new();
        la.insert(END.as_usize());
        la.insert(x.plus.as_usize());
        let item = Item::with_lookahead(rule, 1, la);
        assert_eq!(format!("{}", item.pretty(&x.g)), "[E -> E . + T, $end/+]");
        assert_eq!(
            format!("{}", Item::new(rule, 3).pretty(&x.g)),
            "[E -> E + T .]"
        );
    }
}
