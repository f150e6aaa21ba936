use std::{mem, sync::Arc};

use thiserror::Error;

use crate::{
    ast::{
        ArithOp, Attr, AttributeChain, BoolOp, Call, CmpOp, Collector, Direction, Expr, Flwor,
        ForBinding, FunctionDef, LetBinding, MembershipOp, OrderBy, OrderKey, Output, Quantifier,
        ReturnSpec, SetCmpOp, SetOp, Step, Token, TokenKind,
    },
    lexer::{LexError, Position, tokenize},
    value::Value,
};

/// Errors raised while compiling query text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Syntax error at {position}: unexpected {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        position: Position,
    },

    #[error("Syntax error at {position}: unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String, position: Position },

    #[error("Syntax error at {position}: {message}")]
    Invalid { message: String, position: Position },

    /// An operator token with no operation behind it
    #[error("Undefined operator {token} at {position}")]
    UndefinedOperator { token: String, position: Position },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    /// Where in the query text the error was detected.
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEof { position, .. }
            | ParseError::Invalid { position, .. }
            | ParseError::UndefinedOperator { position, .. } => *position,
            ParseError::Lex(err) => match err {
                LexError::UnexpectedChar { position, .. }
                | LexError::UnterminatedString { position }
                | LexError::UnterminatedComment { position }
                | LexError::InvalidNumber { position, .. } => *position,
            },
        }
    }
}

/// Recursive-descent compiler from tokens to an expression tree.
///
/// A query is either a set expression (paths combined with `|`, `&` and `-`)
/// or a FLWOR expression. Inside predicates and FLWOR clauses the usual
/// boolean, comparison and arithmetic operators apply, with `* /` binding
/// tighter than `+ -` and both left-associative.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Tokenizes `input` and prepares a parser over it.
    pub fn new(input: &str) -> Result<Self, ParseError> {
        Ok(Parser::from_tokens(tokenize(input)?))
    }

    /// Builds a parser over an already tokenized query.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(token) if token.kind == TokenKind::Eof) {
            let position = tokens.last().map(|t| t.position).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, position));
        }
        Parser { tokens, pos: 0 }
    }

    /// Parses the whole input as a single query.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = if self.current().kind.starts_flwor() {
            Expr::Flwor(Box::new(self.parse_flwor()?))
        } else {
            self.parse_set()?
        };
        if !self.check(&TokenKind::Eof) {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self) -> &TokenKind {
        let next = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[next].kind
    }

    /// Consumes the current token. The trailing `Eof` is never consumed.
    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.current().kind) == mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_name(&mut self, expected: &str) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Name(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        match token.kind {
            TokenKind::Eof => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                position: token.position,
            },
            ref kind => ParseError::UnexpectedToken {
                found: kind.to_string(),
                expected: expected.to_string(),
                position: token.position,
            },
        }
    }

    fn undefined_operator(token: &Token) -> ParseError {
        ParseError::UndefinedOperator {
            token: token.kind.to_string(),
            position: token.position,
        }
    }

    // Set expressions

    fn parse_set(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_union()?;
        while self.check(&TokenKind::Minus) {
            left = self.set_algebra(left, Self::parse_union)?;
        }
        Ok(left)
    }

    fn parse_union(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_intersection()?;
        while self.check(&TokenKind::Pipe) {
            left = self.set_algebra(left, Self::parse_intersection)?;
        }
        Ok(left)
    }

    fn parse_intersection(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_collection()?;
        while self.check(&TokenKind::Ampersand) {
            left = self.set_algebra(left, Self::parse_collection)?;
        }
        Ok(left)
    }

    fn set_algebra(
        &mut self,
        left: Expr,
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let token = self.advance();
        let op = SetOp::from_token(&token.kind).ok_or_else(|| Self::undefined_operator(&token))?;
        let right = operand(self)?;
        Ok(Expr::SetAlgebra {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_collection(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::LParen) {
            let inner = self.parse_set()?;
            self.expect(TokenKind::RParen)?;
            return Ok(Expr::Collection(Box::new(inner)));
        }
        self.parse_path()
    }

    /// `name[predicate]/name/...`
    fn parse_path(&mut self) -> Result<Expr, ParseError> {
        let mut steps = Vec::new();
        loop {
            let name = self.expect_name("a path step")?;
            let predicate = if self.eat(&TokenKind::LBracket) {
                let predicate = self.parse_where()?;
                self.expect(TokenKind::RBracket)?;
                Some(predicate)
            } else {
                None
            };
            steps.push(Step { name, predicate });

            if !self.eat(&TokenKind::Slash) {
                break;
            }
        }
        Ok(Expr::Path(steps))
    }

    // Predicates

    fn parse_where(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expr::Boolean {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Expr::Boolean {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::Not) {
            let inner = self.parse_comparison()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    /// Comparisons, membership tests, set comparisons and quantifiers.
    /// None of these chain: `a < b < c` is a syntax error.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Every) || self.check(&TokenKind::Some) {
            return self.parse_quantified();
        }

        let left = self.parse_additive()?;
        let kind = self.current().kind.clone();
        match kind {
            TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::LAngle
            | TokenKind::RAngle
            | TokenKind::LtEq
            | TokenKind::GtEq => {
                let token = self.advance();
                let op = CmpOp::from_token(&token.kind).ok_or_else(|| Self::undefined_operator(&token))?;
                let right = self.parse_additive()?;
                Ok(Expr::Compare {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                })
            }
            TokenKind::In => {
                self.advance();
                self.membership(left, MembershipOp::In)
            }
            TokenKind::Not if *self.peek() == TokenKind::In => {
                self.advance();
                self.advance();
                self.membership(left, MembershipOp::NotIn)
            }
            TokenKind::Subset => {
                self.advance();
                self.set_compare(left, SetCmpOp::Subset)
            }
            TokenKind::Superset => {
                self.advance();
                self.set_compare(left, SetCmpOp::Superset)
            }
            TokenKind::Proper => {
                self.advance();
                let op = if self.eat(&TokenKind::Subset) {
                    SetCmpOp::ProperSubset
                } else if self.eat(&TokenKind::Superset) {
                    SetCmpOp::ProperSuperset
                } else {
                    return Err(self.unexpected("'subset' or 'superset'"));
                };
                self.set_compare(left, op)
            }
            TokenKind::Is => {
                self.advance();
                let op = if self.eat(&TokenKind::Not) {
                    SetCmpOp::IsNot
                } else {
                    SetCmpOp::Is
                };
                self.set_compare(left, op)
            }
            _ => Ok(left),
        }
    }

    fn membership(&mut self, value: Expr, op: MembershipOp) -> Result<Expr, ParseError> {
        let set = self.parse_additive()?;
        Ok(Expr::Membership {
            value: Box::new(value),
            op,
            set: Box::new(set),
        })
    }

    fn set_compare(&mut self, left: Expr, op: SetCmpOp) -> Result<Expr, ParseError> {
        let right = self.parse_additive()?;
        Ok(Expr::SetCompare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// `every x in <set> satisfies (predicate)`
    fn parse_quantified(&mut self) -> Result<Expr, ParseError> {
        let mode = match self.advance().kind {
            TokenKind::Every => Quantifier::Every,
            _ => Quantifier::Some,
        };
        let name = self.expect_name("a variable name")?;
        self.expect(TokenKind::In)?;
        let source = self.parse_additive()?;
        self.expect(TokenKind::Satisfies)?;
        let predicate = self.parse_not()?;
        Ok(Expr::Quantified {
            mode,
            name,
            source: Box::new(source),
            predicate: Box::new(predicate),
        })
    }

    // Arithmetic

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while self.check(&TokenKind::Plus) || self.check(&TokenKind::Minus) {
            let token = self.advance();
            let op = ArithOp::from_token(&token.kind).ok_or_else(|| Self::undefined_operator(&token))?;
            let right = self.parse_multiplicative()?;
            left = Expr::arith(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while self.check(&TokenKind::Star) || self.check(&TokenKind::Slash) {
            let token = self.advance();
            let op = ArithOp::from_token(&token.kind).ok_or_else(|| Self::undefined_operator(&token))?;
            let right = self.parse_unary()?;
            left = Expr::arith(op, left, right);
        }
        Ok(left)
    }

    /// Negative number literals fold into the literal, any other operand
    /// becomes `0 - operand`.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if !self.eat(&TokenKind::Minus) {
            return self.parse_primary();
        }
        let operand = self.parse_unary()?;
        Ok(match operand {
            Expr::Literal(Value::Integer(n)) if n != i64::MIN => Expr::Literal(Value::Integer(-n)),
            Expr::Literal(Value::Float(f)) => Expr::Literal(Value::Float(-f)),
            operand => Expr::arith(ArithOp::Subtract, Expr::Literal(Value::Integer(0)), operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current().kind.clone() {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Integer(n)))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Float(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::Name(_) => self.parse_attribute_chain(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_where()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LAngle => {
                self.advance();
                let inner = self.parse_set()?;
                self.expect(TokenKind::RAngle)?;
                Ok(Expr::Collection(Box::new(inner)))
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_list_items(&TokenKind::RBracket)?;
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::List(items))
            }
            TokenKind::LBrace if self.peek().starts_flwor() => {
                self.advance();
                let flwor = self.parse_flwor()?;
                self.expect(TokenKind::RBrace)?;
                Ok(Expr::Flwor(Box::new(flwor)))
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_dict_literal()
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Function => self.parse_function_def(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Comma separated expressions up to (not including) `close`.
    fn parse_list_items(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.check(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_where()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_dict_literal(&mut self) -> Result<Expr, ParseError> {
        let mut pairs = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let key = self.parse_where()?;
                self.expect(TokenKind::Colon)?;
                let value = self.parse_where()?;
                pairs.push((key, value));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Dict(pairs))
    }

    /// `if cond then a else b`, only the chosen branch is evaluated.
    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_where()?;
        self.expect(TokenKind::Then)?;
        let then = self.parse_additive()?;
        self.expect(TokenKind::Else)?;
        let otherwise = self.parse_additive()?;
        Ok(Expr::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// `function(a, b) { body }`
    fn parse_function_def(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::Function)?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_name("a parameter name")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;
        let body = if self.current().kind.starts_flwor() {
            Expr::Flwor(Box::new(self.parse_flwor()?))
        } else {
            self.parse_where()?
        };
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Function(FunctionDef {
            params,
            body: Arc::new(body),
        }))
    }

    /// `a.b(1)[2].c`
    fn parse_attribute_chain(&mut self) -> Result<Expr, ParseError> {
        let mut attrs = Vec::new();
        loop {
            let name = self.expect_name("an attribute name")?;
            let mut calls = Vec::new();
            loop {
                if self.eat(&TokenKind::LParen) {
                    let args = self.parse_list_items(&TokenKind::RParen)?;
                    self.expect(TokenKind::RParen)?;
                    calls.push(Call::Invoke(args));
                } else if self.eat(&TokenKind::LBracket) {
                    let key = self.parse_where()?;
                    self.expect(TokenKind::RBracket)?;
                    calls.push(Call::Index(Box::new(key)));
                } else {
                    break;
                }
            }
            attrs.push(Attr { name, calls });

            if !self.eat(&TokenKind::Dot) {
                break;
            }
        }
        Ok(Expr::Attribute(AttributeChain { attrs }))
    }

    // FLWOR

    fn parse_flwor(&mut self) -> Result<Flwor, ParseError> {
        let mut for_bindings = Vec::new();
        if self.eat(&TokenKind::For) {
            loop {
                let name = self.expect_name("a variable name")?;
                self.expect(TokenKind::In)?;
                let source = self.parse_where()?;
                for_bindings.push(ForBinding { name, source });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut let_bindings = Vec::new();
        while self.eat(&TokenKind::Let) {
            loop {
                let name = self.expect_name("a variable name")?;
                self.expect(TokenKind::Eq)?;
                let value = self.parse_where()?;
                let_bindings.push(LetBinding { name, value });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let where_clause = if self.eat(&TokenKind::Where) {
            Some(self.parse_where()?)
        } else {
            None
        };

        let order_position = self.current().position;
        let order_by = if self.eat(&TokenKind::Order) {
            Some(self.parse_order_by()?)
        } else {
            None
        };

        let output = if self.eat(&TokenKind::Return) {
            if self.eat(&TokenKind::Flatten) {
                Output::Flatten(self.parse_where()?)
            } else {
                Output::Return(self.parse_return_spec()?)
            }
        } else if self.check(&TokenKind::Collect) {
            let mut collectors = Vec::new();
            while self.eat(&TokenKind::Collect) {
                let value = self.parse_return_spec()?;
                self.expect(TokenKind::As)?;
                let key = self.parse_where()?;
                self.expect(TokenKind::With)?;
                let with = self.parse_where()?;
                collectors.push(Collector { value, key, with });
            }
            Output::Collect(collectors)
        } else {
            return Err(self.unexpected("'return' or 'collect'"));
        };

        if order_by.is_some() && !matches!(output, Output::Return(_)) {
            return Err(ParseError::Invalid {
                message: "'order by' cannot be combined with 'flatten' or 'collect'".into(),
                position: order_position,
            });
        }

        Ok(Flwor {
            for_bindings,
            let_bindings,
            where_clause,
            order_by,
            output,
        })
    }

    /// `by 1 ascd` or `by "name" desc`, after `order` was consumed.
    fn parse_order_by(&mut self) -> Result<OrderBy, ParseError> {
        self.expect(TokenKind::By)?;
        let key = match self.current().kind.clone() {
            TokenKind::Integer(n) => OrderKey::Position(n),
            TokenKind::String(s) => OrderKey::Name(s),
            TokenKind::Float(_) => {
                return Err(ParseError::Invalid {
                    message: "order by position must be an integer".into(),
                    position: self.current().position,
                });
            }
            _ => return Err(self.unexpected("a position or a quoted name")),
        };
        self.advance();

        let direction = if self.eat(&TokenKind::Ascd) {
            Direction::Ascending
        } else if self.eat(&TokenKind::Desc) {
            Direction::Descending
        } else {
            return Err(self.unexpected("'ascd' or 'desc'"));
        };
        Ok(OrderBy { key, direction })
    }

    /// Either `"k": v, ...` or `v, ...`.
    fn parse_return_spec(&mut self) -> Result<ReturnSpec, ParseError> {
        let named = matches!(self.current().kind, TokenKind::String(_)) && *self.peek() == TokenKind::Colon;
        if !named {
            let mut values = Vec::new();
            loop {
                values.push(self.parse_where()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            return Ok(ReturnSpec::Positional(values));
        }

        let mut pairs = Vec::new();
        loop {
            let key = match self.current().kind.clone() {
                TokenKind::String(s) => s,
                _ => return Err(self.unexpected("a quoted name")),
            };
            self.advance();
            self.expect(TokenKind::Colon)?;
            pairs.push((key, self.parse_where()?));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(ReturnSpec::Named(pairs))
    }
}
