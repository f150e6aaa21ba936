use std::fmt;

use thiserror::Error;

use crate::ast::{Token, TokenKind};

/// A location in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the start of the input
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors raised while turning query text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Illegal character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: Position },

    #[error("Unterminated string starting at {position}")]
    UnterminatedString { position: Position },

    #[error("Unterminated comment starting at {position}")]
    UnterminatedComment { position: Position },

    #[error("Invalid numeric literal '{literal}' at {position}")]
    InvalidNumber { literal: String, position: Position },
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    offset: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn here(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            self.offset += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Skips whitespace and both comment styles. Newlines inside comments
    /// still count towards the line number.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (Some(ch), _) if ch.is_whitespace() => self.advance(),
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.here();
                    self.advance();
                    self.advance();
                    loop {
                        match (self.current_char(), self.peek_char(1)) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            (Some(_), _) => self.advance(),
                            (None, _) => {
                                return Err(LexError::UnterminatedComment { position: start });
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.here();
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        // Unknown escapes stay verbatim
                        Some(ch) => {
                            result.push('\\');
                            result.push(ch);
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_digits(&mut self, text: &mut String, radix: u32) {
        while let Some(ch) = self.current_char() {
            if ch.is_digit(radix) {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.here();

        if self.current_char() == Some('0')
            && matches!(self.peek_char(1), Some('x') | Some('X'))
            && self.peek_char(2).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.advance();
            self.advance();
            let mut digits = String::new();
            self.read_digits(&mut digits, 16);
            return i64::from_str_radix(&digits, 16)
                .map(TokenKind::Integer)
                .map_err(|_| LexError::InvalidNumber {
                    literal: format!("0x{}", digits),
                    position: start,
                });
        }

        let mut number = String::new();
        let mut is_float = false;
        self.read_digits(&mut number, 10);

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            number.push('.');
            self.advance();
            self.read_digits(&mut number, 10);
        }

        if matches!(self.current_char(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_char(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                number.push('e');
                self.advance();
                if sign {
                    number.push(self.current_char().unwrap_or('+'));
                    self.advance();
                }
                self.read_digits(&mut number, 10);
            }
        }

        let invalid = |literal: &str| LexError::InvalidNumber {
            literal: literal.to_string(),
            position: start,
        };

        if is_float {
            number
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| invalid(&number))
        } else if number.len() > 1 && number.starts_with('0') {
            i64::from_str_radix(&number, 8)
                .map(TokenKind::Integer)
                .map_err(|_| invalid(&number))
        } else {
            number
                .parse::<i64>()
                .map(TokenKind::Integer)
                .map_err(|_| invalid(&number))
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Consumes `second` if it follows, choosing between a two-character and
    /// a one-character operator.
    fn pair(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let position = self.here();

        let kind = match self.current_char() {
            None => TokenKind::Eof,
            Some('=') => self.pair('=', TokenKind::EqEq, TokenKind::Eq),
            Some('<') => self.pair('=', TokenKind::LtEq, TokenKind::LAngle),
            Some('>') => self.pair('=', TokenKind::GtEq, TokenKind::RAngle),
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(LexError::UnexpectedChar { ch: '!', position });
                }
            }
            Some('+') => self.single(TokenKind::Plus),
            Some('-') => self.single(TokenKind::Minus),
            Some('*') => self.single(TokenKind::Star),
            Some('/') => self.single(TokenKind::Slash),
            Some('|') => self.single(TokenKind::Pipe),
            Some('&') => self.single(TokenKind::Ampersand),
            Some(',') => self.single(TokenKind::Comma),
            Some(':') => self.single(TokenKind::Colon),
            Some('(') => self.single(TokenKind::LParen),
            Some(')') => self.single(TokenKind::RParen),
            Some('[') => self.single(TokenKind::LBracket),
            Some(']') => self.single(TokenKind::RBracket),
            Some('{') => self.single(TokenKind::LBrace),
            Some('}') => self.single(TokenKind::RBrace),
            Some('.') => {
                if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.read_number()?
                } else {
                    self.single(TokenKind::Dot)
                }
            }
            Some('"') => TokenKind::String(self.read_string('"')?),
            Some('\'') => TokenKind::String(self.read_string('\'')?),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                TokenKind::keyword(&ident).unwrap_or(TokenKind::Name(ident))
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) => return Err(LexError::UnexpectedChar { ch, position }),
        };

        Ok(Token::new(kind, position))
    }
}

/// Tokenizes the whole input. The returned stream always ends with an
/// [`TokenKind::Eof`] token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("some every satisfies ascd desc"),
            vec![
                TokenKind::Some,
                TokenKind::Every,
                TokenKind::Satisfies,
                TokenKind::Ascd,
                TokenKind::Desc,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_path_with_predicate() {
        assert_eq!(
            kinds("o/x[self.q >= 5]"),
            vec![
                TokenKind::Name("o".into()),
                TokenKind::Slash,
                TokenKind::Name("x".into()),
                TokenKind::LBracket,
                TokenKind::Name("self".into()),
                TokenKind::Dot,
                TokenKind::Name("q".into()),
                TokenKind::GtEq,
                TokenKind::Integer(5),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comment_lines_are_counted() {
        let tokens = tokenize("a /* one\ntwo */\n// three\nb").unwrap();
        assert_eq!(tokens[0].position.line, 1);
        assert_eq!(tokens[1].kind, TokenKind::Name("b".into()));
        assert_eq!(tokens[1].position.line, 4);
        assert_eq!(tokens[1].position.column, 1);
    }
}
