// Copyright (c) 2018 Fabian Schuiki

//! Reading grammars from their textual description.

use parsetab::analysis::LrAnalysis;
use parsetab::grammar::Symbol;
use parsetab::reader::{read_grammar, ReadError};
use parsetab::table::Method;
use parsetab::tokens::{tokenize, TokenizeError};

#[test]
fn quoted_and_commented() {
    let g = read_grammar(
        "/* JSON-ish lists */
         token '[' ']' ',' value;
         start list;
         items : items ',' value | value ; // left recursive
         list : '[' ']' | '[' items ']' ;",
    )
    .unwrap();
    let list = g.get_nonterminal("list").unwrap();
    let items = g.get_nonterminal("items").unwrap();
    assert_eq!(g.start(), list);
    assert_eq!(g.rules_for_nonterminal(items).count(), 2);
    let comma = g.get_terminal(",").unwrap();
    assert_eq!(
        g.rule(*g.rules_for_nonterminal(items).next().unwrap()).symbols()[1],
        Symbol::Terminal(comma)
    );

    let analysis = LrAnalysis::compute(&g, Method::Lalr1).unwrap();
    assert!(analysis.table().is_conflict_free());
    let tokens = tokenize(analysis.grammar(), "[ value , value , value ]").unwrap();
    let parse = analysis.parser().parse(&tokens).unwrap();
    assert_eq!(parse.reductions.len(), 4);
}

#[test]
fn error_messages() {
    let err = read_grammar("token x; A : x y ;").unwrap_err();
    assert_eq!(err.to_string(), "unknown token or rule `y` at offset 15");
    let err = read_grammar("token x; A : 'x").unwrap_err();
    assert_eq!(err, ReadError::Unterminated { offset: 13 });
    assert_eq!(read_grammar("").unwrap_err(), ReadError::NoRules);
}

#[test]
fn unknown_words() {
    let g = read_grammar("token a; S : a ;").unwrap();
    assert_eq!(
        tokenize(&g, "a b"),
        Err(TokenizeError::UnknownTerminal {
            word: "b".into(),
            position: 1,
        })
    );
    // An explicit end marker stops the input.
    assert_eq!(tokenize(&g, "a $end a").unwrap().len(), 2);
}
