// Copyright (c) 2018 Fabian Schuiki

//! Complete analyses of a grammar, bundling everything derived from it.

use log::info;

use crate::automaton::{Automaton, BuildError};
use crate::first::FirstSets;
use crate::follow::FollowSets;
use crate::grammar::Grammar;
use crate::ll::{LlConflict, LlParser, LlTable};
use crate::parser::LrParser;
use crate::table::{Conflict, Method, ParsingTable};
use crate::witness::{LlWitness, LrWitness, Sentences, WitnessError};

/// The shift-reduce analysis of a grammar.
#[derive(Debug, Clone)]
pub struct LrAnalysis {
    grammar: Grammar,
    first_sets: FirstSets,
    follow_sets: FollowSets,
    automaton: Automaton,
    table: ParsingTable,
}

impl LrAnalysis {
    /// Analyze a grammar with the given method.
    ///
    /// The grammar is augmented unless it already is. All ids of the input
    /// grammar remain valid in `grammar()`.
    pub fn compute(grammar: &Grammar, method: Method) -> Result<LrAnalysis, BuildError> {
        if grammar.nonterminal_id_bound() == 0 {
            return Err(BuildError::EmptyGrammar);
        }
        let grammar = if grammar.is_augmented() {
            grammar.clone()
        } else {
            grammar.augmented()
        };
        let first_sets = FirstSets::compute(&grammar);
        let follow_sets = FollowSets::compute(&grammar, &first_sets);
        let automaton = method.build_automaton(&grammar, &first_sets)?;
        let table = ParsingTable::from_automaton(&grammar, &automaton, method, &follow_sets)?;
        info!(
            "{} analysis: {} states, {} conflicts",
            method,
            automaton.len(),
            table.conflicts().len()
        );
        Ok(LrAnalysis {
            grammar: grammar,
            first_sets: first_sets,
            follow_sets: follow_sets,
            automaton: automaton,
            table: table,
        })
    }

    /// The augmented grammar the analysis was built on.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The first sets of the augmented grammar.
    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    /// The follow sets of the augmented grammar.
    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow_sets
    }

    /// The automaton the table was built from.
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// The parsing table.
    pub fn table(&self) -> &ParsingTable {
        &self.table
    }

    /// A parser driven by the table.
    pub fn parser(&self) -> LrParser {
        LrParser::new(&self.grammar, &self.table)
    }

    /// Generate a witness for one of the table's conflicts.
    pub fn witness(&self, conflict: &Conflict) -> Result<LrWitness, WitnessError> {
        LrWitness::generate(&self.grammar, &self.automaton, &self.follow_sets, conflict)
    }

    /// Generate a witness for each of the table's conflicts.
    pub fn witnesses(&self) -> Vec<Result<LrWitness, WitnessError>> {
        let sentences = Sentences::compute(&self.grammar);
        self.table
            .conflicts()
            .iter()
            .map(|c| {
                LrWitness::with_sentences(
                    &self.grammar,
                    &self.automaton,
                    &self.follow_sets,
                    &sentences,
                    c,
                )
            })
            .collect()
    }
}

/// The LL(1) analysis of a grammar.
#[derive(Debug, Clone)]
pub struct LlAnalysis {
    grammar: Grammar,
    first_sets: FirstSets,
    follow_sets: FollowSets,
    table: LlTable,
}

impl LlAnalysis {
    /// Analyze a grammar.
    pub fn compute(grammar: &Grammar) -> LlAnalysis {
        let first_sets = FirstSets::compute(grammar);
        let follow_sets = FollowSets::compute(grammar, &first_sets);
        let table = LlTable::from_sets(grammar, &first_sets, &follow_sets);
        info!("LL(1) analysis: {} conflicts", table.conflicts().len());
        LlAnalysis {
            grammar: grammar.clone(),
            first_sets: first_sets,
            follow_sets: follow_sets,
            table: table,
        }
    }

    /// The grammar the analysis was built on.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The first sets of the grammar.
    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    /// The follow sets of the grammar.
    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow_sets
    }

    /// The parsing table.
    pub fn table(&self) -> &LlTable {
        &self.table
    }

    /// A parser driven by the table.
    pub fn parser(&self) -> LlParser {
        LlParser::new(&self.grammar, &self.table)
    }

    /// Generate witnesses for one of the table's conflicts.
    pub fn witness(&self, conflict: &LlConflict) -> Result<LlWitness, WitnessError> {
        LlWitness::generate(&self.grammar, conflict)
    }
}
