// Copyright (c) 2018 Fabian Schuiki

//! A reader for grammar descriptions.
//!
//! A description is a sequence of declarations:
//!
//! ```text
//! token num '+' '*' '(' ')';   // terminals
//! start E;                     // optional, defaults to the first rule
//! E : E '+' T | T;
//! T : T '*' F | F;
//! F : '(' E ')' | num;
//! L : L F | epsilon;           // empty alternatives
//! ```
//!
//! The description is first parsed into the syntax tree in `ast`, which is
//! then converted into a `Grammar`.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;

use crate::grammar::{Grammar, NonterminalId, Rule, Symbol, TerminalId};
use crate::lexer::{Keyword, Lexer, Token};

/// An error that occurs while reading a grammar description. Offsets are in
/// bytes from the beginning of the description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// A quoted name is missing its closing quote.
    #[error("unterminated quoted name at offset {offset}")]
    Unterminated {
        /// The offset of the opening quote.
        offset: usize,
    },
    /// A token appeared where it is not allowed.
    #[error("expected {expected}, found {found} at offset {offset}")]
    Unexpected {
        /// The offset of the token.
        offset: usize,
        /// A description of the token.
        found: String,
        /// A description of what was expected instead.
        expected: &'static str,
    },
    /// The description ended in the middle of a declaration.
    #[error("expected {expected}, found end of input")]
    UnexpectedEnd {
        /// A description of what was expected.
        expected: &'static str,
    },
    /// A rule refers to a name that is neither a token nor a rule.
    #[error("unknown token or rule `{name}` at offset {offset}")]
    UnknownSymbol {
        /// The name.
        name: String,
        /// The offset of the name.
        offset: usize,
    },
    /// A rule has the same name as a token.
    #[error("rule name `{name}` at offset {offset} conflicts with a token")]
    NameClash {
        /// The name.
        name: String,
        /// The offset of the rule.
        offset: usize,
    },
    /// The start symbol is not a rule.
    #[error("start symbol `{name}` at offset {offset} is not a rule")]
    UnknownStart {
        /// The name.
        name: String,
        /// The offset of the name.
        offset: usize,
    },
    /// The start symbol is declared more than once.
    #[error("start symbol declared again at offset {offset}")]
    DuplicateStart {
        /// The offset of the second declaration.
        offset: usize,
    },
    /// The description declares no rules.
    #[error("grammar has no rules")]
    NoRules,
}

/// The abstract syntax tree of a grammar description.
pub mod ast {
    /// A name and the offset at which it appears.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct Name {
        /// The name.
        pub name: String,
        /// The byte offset of the name.
        pub offset: usize,
    }

    /// The root node of a grammar description.
    #[derive(Debug, Default, PartialEq, Eq, Hash)]
    pub struct Desc {
        /// The token declarations.
        pub tokens: Vec<Name>,
        /// The rule declarations.
        pub rules: Vec<RuleDecl>,
        /// The start symbol declarations.
        pub start: Vec<Name>,
    }

    /// A rule declaration.
    #[derive(Debug, PartialEq, Eq, Hash)]
    pub struct RuleDecl {
        /// The name of the rule.
        pub name: Name,
        /// The different variants of the rule.
        pub variants: Vec<Vec<Name>>,
    }
}

type Tokens<'a> = Lexer<std::str::CharIndices<'a>>;

fn next_token(tokens: &mut Tokens, expected: &'static str) -> Result<(usize, Token), ReadError> {
    match tokens.next() {
        Some(Ok((offset, _, token))) => Ok((offset, token)),
        Some(Err(e)) => Err(e),
        None => Err(ReadError::UnexpectedEnd { expected: expected }),
    }
}

fn unexpected(offset: usize, token: &Token, expected: &'static str) -> ReadError {
    ReadError::Unexpected {
        offset: offset,
        found: token.describe(),
        expected: expected,
    }
}

/// Parse a grammar description into its syntax tree.
pub fn parse_desc(input: &str) -> Result<ast::Desc, ReadError> {
    let mut tokens = Lexer::for_str(input);
    let mut desc = ast::Desc::default();
    while let Some(result) = tokens.next() {
        let (offset, token) = result.map(|(offset, _, token)| (offset, token))?;
        match token {
            Token::Semicolon => (),
            Token::Keyword(Keyword::Token) => {
                loop {
                    match next_token(&mut tokens, "token name or `;`")? {
                        (_, Token::Semicolon) => break,
                        (offset, Token::Ident(name)) => desc.tokens.push(ast::Name {
                            name: name,
                            offset: offset,
                        }),
                        (offset, token) => {
                            return Err(unexpected(offset, &token, "token name or `;`"))
                        }
                    }
                }
            }
            Token::Keyword(Keyword::Start) => {
                let name = match next_token(&mut tokens, "start symbol")? {
                    (offset, Token::Ident(name)) => ast::Name {
                        name: name,
                        offset: offset,
                    },
                    (offset, token) => return Err(unexpected(offset, &token, "start symbol")),
                };
                match next_token(&mut tokens, "`;`")? {
                    (_, Token::Semicolon) => (),
                    (offset, token) => return Err(unexpected(offset, &token, "`;`")),
                }
                desc.start.push(name);
            }
            Token::Ident(name) => {
                match next_token(&mut tokens, "`:`")? {
                    (_, Token::Colon) => (),
                    (offset, token) => return Err(unexpected(offset, &token, "`:`")),
                }
                let variants = parse_variants(&mut tokens)?;
                desc.rules.push(ast::RuleDecl {
                    name: ast::Name {
                        name: name,
                        offset: offset,
                    },
                    variants: variants,
                });
            }
            token => return Err(unexpected(offset, &token, "declaration")),
        }
    }
    Ok(desc)
}

/// Parse the `|` separated variants of a rule, up to and including the
/// terminating `;`.
fn parse_variants(tokens: &mut Tokens) -> Result<Vec<Vec<ast::Name>>, ReadError> {
    let mut variants = Vec::new();
    let mut current = Vec::new();
    let mut epsilon = false;
    loop {
        let expected = "name, `epsilon`, `|`, or `;`";
        match next_token(tokens, expected)? {
            (_, Token::Semicolon) => {
                variants.push(current);
                return Ok(variants);
            }
            (_, Token::Pipe) => {
                variants.push(std::mem::replace(&mut current, Vec::new()));
                epsilon = false;
            }
            (offset, Token::Keyword(Keyword::Epsilon)) => {
                if epsilon || !current.is_empty() {
                    let token = Token::Keyword(Keyword::Epsilon);
                    return Err(unexpected(offset, &token, "`|` or `;`"));
                }
                epsilon = true;
            }
            (offset, Token::Ident(name)) => {
                if epsilon {
                    return Err(unexpected(offset, &Token::Ident(name), "`|` or `;`"));
                }
                current.push(ast::Name {
                    name: name,
                    offset: offset,
                });
            }
            (offset, token) => return Err(unexpected(offset, &token, expected)),
        }
    }
}

/// Convert the grammar description into an actual grammar.
pub fn make_grammar(desc: &ast::Desc) -> Result<Grammar, ReadError> {
    let mut grammar = Grammar::new();
    if desc.rules.is_empty() {
        return Err(ReadError::NoRules);
    }

    // Declare the terminals and nonterminals.
    let mut token_map: HashMap<&str, TerminalId> = HashMap::new();
    let mut rule_map: HashMap<&str, NonterminalId> = HashMap::new();
    for d in &desc.tokens {
        token_map.insert(&d.name, grammar.add_terminal(d.name.as_str()));
    }
    for d in &desc.rules {
        if token_map.contains_key(d.name.name.as_str()) {
            return Err(ReadError::NameClash {
                name: d.name.name.clone(),
                offset: d.name.offset,
            });
        }
        rule_map.insert(&d.name.name, grammar.add_nonterminal(d.name.name.as_str()));
    }

    // Create a unified symbol lookup table.
    let mut symbol_map: HashMap<&str, Symbol> = HashMap::new();
    for (&n, &i) in &token_map {
        symbol_map.insert(n, i.into());
    }
    for (&n, &i) in &rule_map {
        symbol_map.insert(n, i.into());
    }

    // Add the rules to the grammar.
    for d in &desc.rules {
        let id = rule_map[d.name.name.as_str()];
        for v in &d.variants {
            let seq = v
                .iter()
                .map(|v| match symbol_map.get(v.name.as_str()) {
                    Some(&s) => Ok(s),
                    None => Err(ReadError::UnknownSymbol {
                        name: v.name.clone(),
                        offset: v.offset,
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            grammar.add_rule(Rule::new(id, seq));
        }
    }

    // Pick the start symbol.
    if let Some(extra) = desc.start.get(1) {
        return Err(ReadError::DuplicateStart {
            offset: extra.offset,
        });
    }
    if let Some(start) = desc.start.first() {
        match rule_map.get(start.name.as_str()) {
            Some(&id) => grammar.set_start(id),
            None => {
                return Err(ReadError::UnknownStart {
                    name: start.name.clone(),
                    offset: start.offset,
                })
            }
        }
    }

    debug!(
        "read grammar with {} terminals, {} nonterminals, {} rules",
        grammar.terminal_id_bound() - 1,
        grammar.nonterminal_id_bound(),
        grammar.rules().count()
    );
    Ok(grammar)
}

/// Read a grammar from its description.
pub fn read_grammar(input: &str) -> Result<Grammar, ReadError> {
    make_grammar(&parse_desc(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple1() {
        let res = parse_desc("token hello;").unwrap();
        assert_eq!(
            res,
            ast::Desc {
                tokens: vec![ast::Name {
                    name: "hello".into(),
                    offset: 6,
                }],
                rules: vec![],
                start: vec![],
            }
        );
    }

    #[test]
    fn rules_and_epsilon() {
        let g = read_grammar(
            "token a b; // balanced\n\
             S : a S b | epsilon ;\n\
             S : | b ;",
        )
        .unwrap();
        assert_eq!(
            g.pretty().to_string(),
            "S : a S b | ε | ε | b ;\n"
        );
        assert_eq!(g.nonterminal_name(g.start()), "S");
    }

    #[test]
    fn start_symbol() {
        let g = read_grammar("token x; A : B ; B : x ; start B;").unwrap();
        assert_eq!(g.nonterminal_name(g.start()), "B");
        assert_eq!(
            read_grammar("token x; A : x ; start C;"),
            Err(ReadError::UnknownStart {
                name: "C".into(),
                offset: 23,
            })
        );
        assert!(matches!(
            read_grammar("token x; A : x ; start A; start A;"),
            Err(ReadError::DuplicateStart { .. })
        ));
    }

    #[test]
    fn errors() {
        assert_eq!(
            read_grammar("token x; A : x y ;"),
            Err(ReadError::UnknownSymbol {
                name: "y".into(),
                offset: 15,
            })
        );
        assert_eq!(
            read_grammar("token x; x : x ;"),
            Err(ReadError::NameClash {
                name: "x".into(),
                offset: 9,
            })
        );
        assert_eq!(read_grammar("token x;"), Err(ReadError::NoRules));
        assert_eq!(
            read_grammar("A : x"),
            Err(ReadError::UnexpectedEnd {
                expected: "name, `epsilon`, `|`, or `;`"
            })
        );
        assert!(matches!(
            read_grammar("A : epsilon x ;"),
            Err(ReadError::Unexpected { offset: 12, .. })
        ));
        assert!(matches!(
            read_grammar(": A ;"),
            Err(ReadError::Unexpected { offset: 0, .. })
        ));
    }
}
