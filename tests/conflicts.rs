// Copyright (c) 2018 Fabian Schuiki

//! Conflict detection and witness generation on ambiguous grammars.

use parsetab::analysis::{LlAnalysis, LrAnalysis};
use parsetab::derivation::DerivationTree;
use parsetab::grammar::{Grammar, RuleId, Symbol};
use parsetab::parser::{ParseError, Step};
use parsetab::reader::read_grammar;
use parsetab::table::{Action, ConflictKind, Method};
use parsetab::tokens::{from_terminals, tokenize};

fn dangling_else() -> Grammar {
    read_grammar(
        "token if cond then else other;
         S : if cond then S | if cond then S else S | other ;",
    )
    .unwrap()
}

#[test]
fn dangling_else_witness() {
    let analysis = LrAnalysis::compute(&dangling_else(), Method::Slr1).unwrap();
    let g = analysis.grammar();
    let else_ = g.get_terminal("else").unwrap();
    let conflicts = analysis.table().conflicts();
    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.kind(), ConflictKind::ShiftReduce);
    assert_eq!(conflict.terminal(), else_);
    assert_eq!(
        analysis.table().action(conflict.state(), else_),
        Some(conflict.actions()[0])
    );

    let witness = analysis.witness(conflict).unwrap();
    assert_eq!(witness.rule, RuleId::from_usize(0));
    assert!(!witness.sentence.is_empty());
    assert_eq!(witness.sentence.last(), Some(&else_));

    // The stack contents lead from the initial state into the conflict.
    let automaton = analysis.automaton();
    let states = automaton
        .walk(automaton.initial(), &witness.symbols())
        .unwrap();
    assert_eq!(states.last(), Some(&conflict.state()));

    // Feeding the sentence to the parser reaches the conflicting state with
    // the conflicting terminal as lookahead.
    let tokens = from_terminals(g, &witness.sentence);
    let parser = analysis.parser();
    let mut machine = parser.machine::<()>(&tokens).unwrap();
    let mut reached = false;
    for _ in 0..100 {
        if machine.position() == witness.sentence.len() - 1 && machine.state() == conflict.state() {
            reached = true;
            break;
        }
        match machine.step() {
            Ok(Step::Accept) | Err(_) => break,
            Ok(_) => (),
        }
    }
    assert!(reached, "parser never reached state {}", conflict.state());
    assert_eq!(machine.lookahead().map(|t| t.terminal), Some(else_));
}

#[test]
fn dangling_else_is_ambiguous() {
    for &method in &[Method::Lr0, Method::Lr1, Method::Lalr1] {
        let analysis = LrAnalysis::compute(&dangling_else(), method).unwrap();
        let conflicts = analysis.table().conflicts();
        assert!(!conflicts.is_empty(), "{} has no conflicts", method);
        assert!(conflicts
            .iter()
            .all(|c| c.kind() == ConflictKind::ShiftReduce));
    }
}

#[test]
fn kept_action_is_first_registered() {
    // The reduction is registered before the shift of `else`, so the parser
    // closes the inner `if` and then has nowhere to put the `else`.
    let analysis = LrAnalysis::compute(&dangling_else(), Method::Lalr1).unwrap();
    let g = analysis.grammar();
    let conflict = &analysis.table().conflicts()[0];
    assert!(matches!(conflict.actions()[0], Action::Reduce(_)));
    assert!(matches!(conflict.actions()[1], Action::Shift(_)));

    let tokens = tokenize(g, "if cond then if cond then other").unwrap();
    let parse = analysis.parser().parse(&tokens).unwrap();
    let rules: Vec<usize> = parse.reductions.iter().map(|r| r.as_usize()).collect();
    assert_eq!(rules, vec![2, 0, 0]);

    let tokens = tokenize(g, "if cond then other else other").unwrap();
    match analysis.parser().parse(&tokens) {
        Err(ParseError::UnexpectedToken {
            terminal, position, ..
        }) => {
            assert_eq!(terminal, "else");
            assert_eq!(position, 4);
        }
        other => panic!("expected unexpected token error, got {:?}", other),
    }
}

#[test]
fn ll_first_first() {
    let g = read_grammar("token id '+'; E : E '+' E | id ;").unwrap();
    let id = g.get_terminal("id").unwrap();
    let plus = g.get_terminal("+").unwrap();
    let e = g.get_nonterminal("E").unwrap();
    let analysis = LlAnalysis::compute(&g);
    let conflicts = analysis.table().conflicts();
    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert_eq!(conflict.kind(), ConflictKind::FirstFirst);
    assert_eq!(conflict.nonterminal(), e);
    assert_eq!(conflict.terminal(), id);

    let witness = analysis.witness(conflict).unwrap();
    assert_eq!(witness.context, vec![Symbol::Nonterminal(e)]);
    assert_eq!(witness.sentences.len(), 2);
    assert_ne!(witness.sentences[0], witness.sentences[1]);
    assert_eq!(witness.sentences[0], vec![id, plus, id]);
    assert_eq!(witness.sentences[1], vec![id]);
}

#[test]
fn ll_epsilon_sets_and_parse() {
    let g = read_grammar(
        "token a b c;
         X : b A c ;
         A : a A | epsilon ;",
    )
    .unwrap();
    let a = g.get_terminal("a").unwrap();
    let c = g.get_terminal("c").unwrap();
    let na = g.get_nonterminal("A").unwrap();
    let analysis = LlAnalysis::compute(&g);

    let first = &analysis.first_sets()[na];
    assert_eq!(first.symbols().collect::<Vec<_>>(), vec![a]);
    assert!(first.has_epsilon());
    assert!(analysis.follow_sets().contains(na, c));
    assert!(analysis.table().is_conflict_free());

    let tokens = tokenize(&g, "b a a c").unwrap();
    let left = analysis.parser().parse(&tokens).unwrap();
    let rules: Vec<usize> = left.iter().map(|r| r.as_usize()).collect();
    assert_eq!(rules, vec![0, 1, 1, 2]);
    let tree = DerivationTree::from_left_parse(&g, &left).unwrap();
    let frontier: Vec<&str> = tree.frontier().into_iter().map(|t| g.terminal_name(t)).collect();
    assert_eq!(frontier, vec!["b", "a", "a", "c"]);
}

fn lalr_only_conflict() -> Grammar {
    read_grammar(
        "token a b c d e;
         S : a A d | b B d | a B e | b A e ;
         A : c ;
         B : c ;",
    )
    .unwrap()
}

#[test]
fn merged_states_reduce_reduce_witness() {
    let lr1 = LrAnalysis::compute(&lalr_only_conflict(), Method::Lr1).unwrap();
    assert!(lr1.table().is_conflict_free());

    let analysis = LrAnalysis::compute(&lalr_only_conflict(), Method::Lalr1).unwrap();
    let g = analysis.grammar();
    let c = g.get_terminal("c").unwrap();
    let conflicts = analysis.table().conflicts();
    let mut terminals: Vec<&str> = conflicts
        .iter()
        .map(|x| g.terminal_name(x.terminal()))
        .collect();
    terminals.sort();
    assert_eq!(terminals, vec!["d", "e"]);

    let automaton = analysis.automaton();
    for conflict in conflicts {
        assert_eq!(conflict.kind(), ConflictKind::ReduceReduce);
        let witness = analysis.witness(conflict).unwrap();
        let states = automaton
            .walk(automaton.initial(), &witness.symbols())
            .unwrap();
        assert_eq!(states.last(), Some(&conflict.state()));
        assert_eq!(witness.sentence.len(), 3);
        assert_eq!(witness.sentence[1], c);
        assert_eq!(witness.sentence.last(), Some(&conflict.terminal()));
    }
}

#[test]
fn canonical_dangling_else_witness() {
    let analysis = LrAnalysis::compute(&dangling_else(), Method::Lr1).unwrap();
    let g = analysis.grammar();
    let else_ = g.get_terminal("else").unwrap();
    let automaton = analysis.automaton();
    for conflict in analysis.table().conflicts() {
        assert_eq!(conflict.terminal(), else_);
        let witness = analysis.witness(conflict).unwrap();
        let states = automaton
            .walk(automaton.initial(), &witness.symbols())
            .unwrap();
        assert_eq!(states.last(), Some(&conflict.state()));
        assert_eq!(witness.sentence.last(), Some(&else_));
    }
}

#[test]
fn ll_follow_follow_context() {
    let g = read_grammar(
        "token b c;
         S : A b | c A c ;
         A : c | epsilon ;",
    )
    .unwrap();
    let c = g.get_terminal("c").unwrap();
    let na = g.get_nonterminal("A").unwrap();
    let analysis = LlAnalysis::compute(&g);
    let conflict = analysis
        .table()
        .conflicts()
        .iter()
        .find(|x| x.nonterminal() == na && x.terminal() == c)
        .unwrap();
    assert_eq!(conflict.kind(), ConflictKind::FollowFollow);

    // Only `c A c` lets `c` follow `A`.
    let witness = analysis.witness(conflict).unwrap();
    assert_eq!(
        witness.context,
        vec![Symbol::Terminal(c), Symbol::Nonterminal(na), Symbol::Terminal(c)]
    );
    assert_eq!(witness.sentences, vec![vec![c, c, c], vec![c, c]]);
    for sentence in &witness.sentences {
        assert_eq!(sentence[1], c);
    }
}
