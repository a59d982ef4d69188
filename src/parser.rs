//! The parser takes a sequence of tokens, mapping it into a bracket tree.
//!
//! Bracket balance is not checked: unmatched brackets yield a malformed
//! tree and the phase that consumes the shape reports the failure.

use thiserror::Error;

use crate::ast::Element;
use crate::lexer::Token;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("numeric literal '{0}' does not fit in 32 bits")]
    IntOutOfRange(String),
    #[error("malformed float literal '{0}'")]
    BadFloat(String),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, pos: 0 }
    }

    /// Parse the whole token stream into the implicit program root list.
    pub fn parse_program(&mut self) -> Result<Element, ParseError> {
        let mut stack: Vec<Vec<Element>> = vec![Vec::new()];

        while let Some(token) = self.advance() {
            let node = match token {
                Token::Whitespace => continue,
                Token::Bracket('[') => {
                    stack.push(Vec::new());
                    continue;
                }
                Token::Bracket(_) => {
                    if stack.len() > 1 {
                        let items = stack.pop().unwrap_or_default();
                        Element::List(items)
                    } else {
                        continue; // stray close, leaves a malformed shape
                    }
                }
                Token::Word(word) => Element::Word(word),
                Token::Str(text) => Element::Str(text),
                Token::Char(text) => Element::Char(text.chars().next().unwrap_or('\0')),
                Token::Int(text) => Element::Int(read_int(&text)?),
                Token::Float(text) => Element::Float(read_float(&text)?),
                Token::Hex(text) => Element::Int(read_based(&text, 'x', 16)?),
                Token::Bin(text) => Element::Int(read_based(&text, 'b', 2)?),
            };
            match stack.last_mut() {
                Some(top) => top.push(node),
                None => break,
            }
        }

        // Stray opens fold up into their parent, again as malformed shapes.
        while stack.len() > 1 {
            let items = stack.pop().unwrap_or_default();
            if let Some(top) = stack.last_mut() {
                top.push(Element::List(items));
            }
        }
        Ok(Element::List(stack.pop().unwrap_or_default()))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

/// Numeric reader for decimal literals; underscores are separators.
pub fn read_int(text: &str) -> Result<i32, ParseError> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    cleaned
        .parse::<i32>()
        .map_err(|_| ParseError::IntOutOfRange(text.to_string()))
}

pub fn read_float(text: &str) -> Result<f32, ParseError> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    cleaned
        .parse::<f32>()
        .map_err(|_| ParseError::BadFloat(text.to_string()))
}

/// Numeric reader for `<digits><marker><body>` literals; the body is read
/// in the given base with two's-complement wrap, so `0xFFFFFFFF` is -1.
pub fn read_based(text: &str, marker: char, base: u32) -> Result<i32, ParseError> {
    let body = match text.split_once(marker) {
        Some((_, body)) => body,
        None => return Err(ParseError::IntOutOfRange(text.to_string())),
    };
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    u32::from_str_radix(&cleaned, base)
        .map(|bits| bits as i32)
        .map_err(|_| ParseError::IntOutOfRange(text.to_string()))
}
