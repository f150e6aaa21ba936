use std::fmt;

use crate::lexer::Position;

/// The terminal symbols of the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (decimal, leading-zero octal or `0x` hexadecimal)
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 017
    /// 0xff
    /// ```
    Integer(i64),

    /// Floating-point literal
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// .5
    /// 1e10
    /// 2.5E-3
    /// ```
    Float(f64),

    /// String literal in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'world'
    /// ```
    String(String),

    /// Any identifier that is not a reserved word
    ///
    /// Must start with a letter or underscore, followed by letters, digits or
    /// underscores.
    Name(String),

    // Reserved words
    Some,
    Every,
    In,
    Not,
    Satisfies,
    And,
    Or,
    Subset,
    Superset,
    Proper,
    Is,
    For,
    Let,
    Return,
    Where,
    Order,
    By,
    Ascd,
    Desc,
    Function,
    If,
    Then,
    Else,
    Flatten,
    Collect,
    As,
    With,

    // Operators
    /// Binding operator in `let` clauses (`=`)
    Eq,
    /// Equality (`==`)
    EqEq,
    /// Inequality (`!=`)
    NotEq,
    /// Less than, also opens a set expression (`<`)
    LAngle,
    /// Greater than, also closes a set expression (`>`)
    RAngle,
    /// Less than or equal (`<=`)
    LtEq,
    /// Greater than or equal (`>=`)
    GtEq,
    /// Addition (`+`)
    Plus,
    /// Subtraction, negation and set difference (`-`)
    Minus,
    /// Multiplication (`*`)
    Star,
    /// Division and path step separator (`/`)
    Slash,
    /// Set union (`|`)
    Pipe,
    /// Set intersection (`&`)
    Ampersand,

    // Delimiters
    Dot,
    Comma,
    Colon,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Maps an identifier to its reserved word, if it is one.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "some" => TokenKind::Some,
            "every" => TokenKind::Every,
            "in" => TokenKind::In,
            "not" => TokenKind::Not,
            "satisfies" => TokenKind::Satisfies,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "subset" => TokenKind::Subset,
            "superset" => TokenKind::Superset,
            "proper" => TokenKind::Proper,
            "is" => TokenKind::Is,
            "for" => TokenKind::For,
            "let" => TokenKind::Let,
            "return" => TokenKind::Return,
            "where" => TokenKind::Where,
            "order" => TokenKind::Order,
            "by" => TokenKind::By,
            "ascd" => TokenKind::Ascd,
            "desc" => TokenKind::Desc,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "flatten" => TokenKind::Flatten,
            "collect" => TokenKind::Collect,
            "as" => TokenKind::As,
            "with" => TokenKind::With,
            _ => return None,
        };
        Some(kind)
    }

    /// True for the words that can open a FLWOR expression.
    pub fn starts_flwor(&self) -> bool {
        matches!(
            self,
            TokenKind::For
                | TokenKind::Let
                | TokenKind::Where
                | TokenKind::Order
                | TokenKind::Return
                | TokenKind::Collect
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Integer(n) => return write!(f, "{}", n),
            TokenKind::Float(n) => return write!(f, "{}", n),
            TokenKind::String(s) => return write!(f, "{:?}", s),
            TokenKind::Name(s) => return write!(f, "'{}'", s),
            TokenKind::Some => "'some'",
            TokenKind::Every => "'every'",
            TokenKind::In => "'in'",
            TokenKind::Not => "'not'",
            TokenKind::Satisfies => "'satisfies'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Subset => "'subset'",
            TokenKind::Superset => "'superset'",
            TokenKind::Proper => "'proper'",
            TokenKind::Is => "'is'",
            TokenKind::For => "'for'",
            TokenKind::Let => "'let'",
            TokenKind::Return => "'return'",
            TokenKind::Where => "'where'",
            TokenKind::Order => "'order'",
            TokenKind::By => "'by'",
            TokenKind::Ascd => "'ascd'",
            TokenKind::Desc => "'desc'",
            TokenKind::Function => "'function'",
            TokenKind::If => "'if'",
            TokenKind::Then => "'then'",
            TokenKind::Else => "'else'",
            TokenKind::Flatten => "'flatten'",
            TokenKind::Collect => "'collect'",
            TokenKind::As => "'as'",
            TokenKind::With => "'with'",
            TokenKind::Eq => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::LAngle => "'<'",
            TokenKind::RAngle => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Pipe => "'|'",
            TokenKind::Ampersand => "'&'",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// A token together with where it was found in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Token { kind, position }
    }
}
