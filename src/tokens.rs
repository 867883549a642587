// Copyright (c) 2018 Fabian Schuiki

//! Token streams fed into the parsers.

use std::fmt;

use thiserror::Error;

use crate::grammar::{Grammar, TerminalId, END, END_NAME};

/// A token of the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// The text of the token.
    pub lexeme: String,
    /// The terminal the token was classified as.
    pub terminal: TerminalId,
}

impl Token {
    /// Create a new token.
    pub fn new<S: Into<String>>(lexeme: S, terminal: TerminalId) -> Token {
        Token {
            lexeme: lexeme.into(),
            terminal: terminal,
        }
    }

    /// The end of input token.
    pub fn end() -> Token {
        Token::new(END_NAME, END)
    }

    /// Whether this is the end of input token.
    pub fn is_end(&self) -> bool {
        self.terminal == END
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

/// An error that occurs while splitting text into tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// A word that does not name a terminal of the grammar.
    #[error("`{word}` at word {position} is not a terminal")]
    UnknownTerminal {
        /// The offending word.
        word: String,
        /// The index of the word in the input.
        position: usize,
    },
}

/// Split a text on whitespace and map each word to the terminal of that name.
///
/// The returned stream is terminated by the `$end` token. Writing `$end`
/// explicitly is allowed and ends the input early.
pub fn tokenize(grammar: &Grammar, text: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    for (position, word) in text.split_whitespace().enumerate() {
        let terminal = grammar
            .get_terminal(word)
            .ok_or_else(|| TokenizeError::UnknownTerminal {
                word: word.to_string(),
                position: position,
            })?;
        if terminal == END {
            break;
        }
        tokens.push(Token::new(word, terminal));
    }
    tokens.push(Token::end());
    Ok(tokens)
}

/// Build a token stream directly from terminals, using their names as
/// lexemes. The `$end` token is appended.
pub fn from_terminals(grammar: &Grammar, terminals: &[TerminalId]) -> Vec<Token> {
    terminals
        .iter()
        .filter(|&&t| t != END)
        .map(|&t| Token::new(grammar.terminal_name(t), t))
        .chain(Some(Token::end()))
        .collect()
}
