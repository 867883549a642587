// Copyright (c) 2018 Fabian Schuiki

//! A lexer for grammar descriptions.

use std::iter::Peekable;

use crate::reader::ReadError;

/// The tokens that may appear in a grammar description.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Keyword(Keyword),
    Ident(String),
    Colon,
    Semicolon,
    Pipe,
}

impl Token {
    /// Return the identifier.
    ///
    /// Panics if the token is not an identifier.
    pub fn unwrap_ident(self) -> String {
        match self {
            Token::Ident(i) => i,
            _ => panic!("token {:?} is not an identifier", self),
        }
    }

    /// A short description of the token for error messages.
    pub fn describe(&self) -> String {
        match *self {
            Token::Keyword(Keyword::Token) => "`token`".into(),
            Token::Keyword(Keyword::Epsilon) => "`epsilon`".into(),
            Token::Keyword(Keyword::Start) => "`start`".into(),
            Token::Ident(ref name) => format!("name `{}`", name),
            Token::Colon => "`:`".into(),
            Token::Semicolon => "`;`".into(),
            Token::Pipe => "`|`".into(),
        }
    }
}

/// The keywords that may appear in a grammar description.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Token,
    Epsilon,
    Start,
}

/// A lexer for grammar descriptions.
///
/// Yields each token together with its start and end byte offset. Names are
/// sequences of anything but whitespace, `:`, `;`, and `|`; names that need
/// those characters or clash with a keyword are written in single quotes,
/// which are not part of the name.
pub struct Lexer<T: Iterator<Item = (usize, char)>> {
    input: Peekable<T>,
}

impl<T: Iterator<Item = (usize, char)>> Lexer<T> {
    /// Create a new lexer.
    pub fn new(input: T) -> Lexer<T> {
        Lexer {
            input: input.peekable(),
        }
    }
}

impl<'a> Lexer<std::str::CharIndices<'a>> {
    /// Create a lexer over a string.
    pub fn for_str(input: &'a str) -> Lexer<std::str::CharIndices<'a>> {
        Lexer::new(input.char_indices())
    }
}

/// Return the next non-whitespace input character, skipping comments.
fn next_relevant<I: Iterator<Item = (usize, char)>>(
    input: &mut Peekable<I>,
) -> Option<(usize, char)> {
    'outer: while let Some((p, c)) = input.next() {
        if c == '/' {
            match input.peek() {
                Some(&(_, '/')) => {
                    input.next();
                    while let Some((_, c)) = input.next() {
                        if c == '\n' {
                            continue 'outer;
                        }
                    }
                    return None; // end of input reached
                }
                Some(&(_, '*')) => {
                    input.next();
                    while let Some((_, c)) = input.next() {
                        if c != '*' {
                            continue;
                        }
                        if let Some(&(_, c)) = input.peek() {
                            if c == '/' {
                                input.next();
                                continue 'outer;
                            }
                        }
                    }
                    return None; // end of input reached
                }
                _ => (),
            }
        }
        if !c.is_whitespace() {
            return Some((p, c));
        }
    }
    None
}

/// Checks whether a character is punctuation in the grammar description.
fn is_symbol(c: char) -> bool {
    match c {
        ':' | ';' | '|' => true,
        _ => false,
    }
}

impl<T: Iterator<Item = (usize, char)>> Iterator for Lexer<T> {
    type Item = Result<(usize, usize, Token), ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Fetch the first character and see what we can do with it.
        let (sp, sc) = next_relevant(&mut self.input)?;
        let mut sl = sp + sc.len_utf8();
        let tkn = match sc {
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            '|' => Token::Pipe,
            '\'' => {
                let mut buffer = String::new();
                let mut escaped = false;
                let mut closed = false;
                while let Some((ep, ec)) = self.input.next() {
                    sl = ep + ec.len_utf8();
                    if escaped {
                        buffer.push(ec);
                        escaped = false;
                    } else if ec == '\\' {
                        escaped = true;
                    } else if ec == '\'' {
                        closed = true;
                        break;
                    } else {
                        buffer.push(ec);
                    }
                }
                if !closed {
                    return Some(Err(ReadError::Unterminated { offset: sp }));
                }
                Token::Ident(buffer)
            }
            _ => {
                let mut buffer = String::new();
                buffer.push(sc);
                while let Some(&(ep, ec)) = self.input.peek() {
                    if ec.is_whitespace() || is_symbol(ec) {
                        break;
                    }
                    buffer.push(ec);
                    sl = ep + ec.len_utf8();
                    self.input.next();
                }
                match buffer.as_str() {
                    "token" => Token::Keyword(Keyword::Token),
                    "epsilon" => Token::Keyword(Keyword::Epsilon),
                    "start" => Token::Keyword(Keyword::Start),
                    _ => Token::Ident(buffer),
                }
            }
        };
        Some(Ok((sp, sl, tkn)))
    }
}
