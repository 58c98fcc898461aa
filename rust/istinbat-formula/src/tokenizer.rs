//! Tokenizer for formula source text.
//!
//! Token types:
//! - **Number**: `3`, `0.25`, `.5`, `1e-3`
//! - **Name**: a letter or `_` followed by letters, digits or `_`; any script
//!   is accepted so attribute keys need not be ASCII
//! - **Operators**: `+ - * / **`
//! - **Punctuation**: `(`, `)`, `,`

use std::fmt;

use crate::error::{ParseError, ParseResult};

/// A classified token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    /// `**`
    Power,
    LeftParen,
    RightParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Name(name) => write!(f, "'{name}'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Power => write!(f, "'**'"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
        }
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_name_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Split `input` into tokens, skipping whitespace.
pub fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let len = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        let (offset, ch) = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let single = match ch {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push(token);
            i += 1;
            continue;
        }

        if ch == '*' {
            if matches!(chars.get(i + 1), Some((_, '*'))) {
                tokens.push(Token::Power);
                i += 2;
            } else {
                tokens.push(Token::Star);
                i += 1;
            }
            continue;
        }

        let starts_number = ch.is_ascii_digit()
            || (ch == '.' && matches!(chars.get(i + 1), Some((_, next)) if next.is_ascii_digit()));
        if starts_number {
            let start = i;
            while i < len && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                i += 1;
            }
            // Exponent: e, E, optionally signed
            if i < len && matches!(chars[i].1, 'e' | 'E') {
                let mut j = i + 1;
                if j < len && matches!(chars[j].1, '+' | '-') {
                    j += 1;
                }
                if j < len && chars[j].1.is_ascii_digit() {
                    i = j;
                    while i < len && chars[i].1.is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().map(|(_, c)| c).collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidNumber { text: text.clone() })?;
            tokens.push(Token::Number(value));
            continue;
        }

        if is_name_start(ch) {
            let start = i;
            while i < len && is_name_continue(chars[i].1) {
                i += 1;
            }
            tokens.push(Token::Name(chars[start..i].iter().map(|(_, c)| c).collect()));
            continue;
        }

        return Err(ParseError::UnexpectedCharacter { character: ch, offset });
    }

    Ok(tokens)
}
