use rpds::Stack;
use thiserror::Error;
use tracing::debug;

use crate::{
    church,
    context::Context,
    lexer::{Lexer, Token, TokenKind},
    operator::{Fixity, OperatorError},
    prelude::*,
    term::Term,
};

#[derive(PartialEq, Eq, Clone, Debug, Error)]
pub enum ParseError {
    #[error("Unexpected {found}, expected {expected}")]
    Unexpected {
        span: Span,
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("Integer literal {literal} is too large")]
    Literal { span: Span, literal: Identifier },
    #[error("{source}")]
    Operator { span: Span, source: OperatorError },
    #[error("{message}")]
    Lex { span: Span, message: String },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Unexpected { span, .. }
            | ParseError::Literal { span, .. }
            | ParseError::Operator { span, .. }
            | ParseError::Lex { span, .. } => span.clone(),
        }
    }
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Names of the enclosing binders, innermost on top.
pub type Scope = Stack<Identifier>;

/// What a successfully processed statement amounts to.
#[derive(Debug)]
pub enum Statement {
    /// A term to be reduced by the caller.
    Expression(Term),
    Definition(Identifier),
    Operator { name: Identifier, level: usize },
    Exit,
}

/// A parsed statement whose effect on the context is still pending.
#[derive(Debug)]
enum Command {
    Term(Term),
    Definition(Identifier, Term),
    Operator {
        name: Identifier,
        level: Spanned<usize>,
        function: Term,
    },
    Exit,
}

struct Parser<'c> {
    lexer: Lexer,
    token: Spanned<Token>,
    context: &'c Context,
}

impl<'c> Parser<'c> {
    fn new(input: &str, context: &'c Context) -> Result<Self> {
        let mut lexer = Lexer::new(input)?;
        let token = lexer.next_token();
        Ok(Parser {
            lexer,
            token,
            context,
        })
    }

    fn advance(&mut self) -> Spanned<Token> {
        std::mem::replace(&mut self.token, self.lexer.next_token())
    }

    fn unexpected(&self, expected: TokenKind) -> ParseError {
        ParseError::Unexpected {
            span: self.token.span(),
            expected,
            found: self.token.value.kind(),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Spanned<Token>> {
        if self.token.value.kind() == expected {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn ident(&mut self) -> Result<Spanned<Identifier>> {
        match &self.token.value {
            Token::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok(Spanned { span, value: name })
            }
            _ => Err(self.unexpected(TokenKind::Ident)),
        }
    }

    fn nat<N: std::str::FromStr>(&mut self) -> Result<Spanned<N>> {
        match &self.token.value {
            Token::Nat(digits) => {
                let literal = digits.clone();
                let span = self.advance().span;
                match literal.parse() {
                    Ok(value) => Ok(Spanned { span, value }),
                    Err(_) => Err(ParseError::Literal { span, literal }),
                }
            }
            _ => Err(self.unexpected(TokenKind::Nat)),
        }
    }

    fn keyword(&self) -> Option<&str> {
        match &self.token.value {
            Token::Ident(name) => Some(name.as_str()),
            _ => None,
        }
    }

    fn statement(&mut self) -> Result<Command> {
        let command = match self.keyword() {
            Some("def") => {
                self.advance();
                let name = self.ident()?.forget_span();
                self.expect(TokenKind::Equal)?;
                Command::Definition(name, self.expr(&Scope::new())?)
            }
            Some("opdef") => {
                self.advance();
                let name = self.ident()?.forget_span();
                let level = self.nat()?;
                self.expect(TokenKind::Equal)?;
                let function = self.expr(&Scope::new())?;
                Command::Operator {
                    name,
                    level,
                    function,
                }
            }
            Some("exit") => {
                self.advance();
                Command::Exit
            }
            _ => Command::Term(self.expr(&Scope::new())?),
        };
        self.expect(TokenKind::End)?;
        Ok(command)
    }

    fn expr(&mut self, scope: &Scope) -> Result<Term> {
        self.level(self.context.operators.height(), scope)
    }

    /// The function of the operator under the cursor, if it is registered at `level`.
    fn operator_at(&self, level: usize) -> Option<Term> {
        let Token::Ident(name) = &self.token.value else {
            return None;
        };
        self.context.operators.level(level)?.lookup(name).cloned()
    }

    /// `level(k)`: operands are `level(k - 1)`, and level 0 is plain application.
    fn level(&mut self, k: usize, scope: &Scope) -> Result<Term> {
        let context = self.context;
        let Some(level) = context.operators.level(k) else {
            return self.application(scope);
        };
        match level.fixity() {
            Fixity::InfixLeft => {
                let mut lhs = self.level(k - 1, scope)?;
                while let Some(function) = self.operator_at(k) {
                    self.advance();
                    let rhs = self.level(k - 1, scope)?;
                    lhs = Term::apply(Term::apply(function, lhs), rhs);
                }
                Ok(lhs)
            }
            Fixity::InfixRight => {
                let lhs = self.level(k - 1, scope)?;
                match self.operator_at(k) {
                    Some(function) => {
                        self.advance();
                        let rhs = self.level(k, scope)?;
                        Ok(Term::apply(Term::apply(function, lhs), rhs))
                    }
                    None => Ok(lhs),
                }
            }
            Fixity::Prefix | Fixity::Suffix => self.level(k - 1, scope),
        }
    }

    fn starts_value(&self) -> bool {
        match &self.token.value {
            Token::LParen | Token::Nat(_) | Token::Lambda => true,
            Token::Ident(name) => !self.context.operators.is_infix_operator(name),
            _ => false,
        }
    }

    fn application(&mut self, scope: &Scope) -> Result<Term> {
        let mut term = self.value(scope)?;
        while self.starts_value() {
            let arg = self.value(scope)?;
            term = Term::apply(term, arg);
        }
        Ok(term)
    }

    fn value(&mut self, scope: &Scope) -> Result<Term> {
        match &self.token.value {
            Token::LParen => {
                self.advance();
                let term = self.expr(scope)?;
                self.expect(TokenKind::RParen)?;
                Ok(term)
            }
            Token::Nat(_) => Ok(church::encode(self.nat()?.forget_span())),
            Token::Lambda => {
                self.advance();
                let name = self.ident()?.forget_span();
                self.abstraction(name, scope)
            }
            Token::Ident(_) => {
                let name = self.ident()?.forget_span();
                Ok(self.resolve(&name, scope))
            }
            _ => Err(self.unexpected(TokenKind::Ident)),
        }
    }

    /// The part of `\x y. body` after the binder `name`.
    fn abstraction(&mut self, name: Identifier, scope: &Scope) -> Result<Term> {
        let scope = scope.push(name.clone());
        let body = match &self.token.value {
            Token::Dot => {
                self.advance();
                self.application(&scope)?
            }
            Token::Ident(_) => {
                let next = self.ident()?.forget_span();
                self.abstraction(next, &scope)?
            }
            _ => return Err(self.unexpected(TokenKind::Dot)),
        };
        Ok(Term::lambda(Some(name), body))
    }

    fn resolve(&self, name: &Identifier, scope: &Scope) -> Term {
        if let Some(index) = scope.iter().position(|bound| bound == name) {
            return Term::Variable(index);
        }
        self.context
            .definitions
            .lookup(name)
            .unwrap_or_else(|| Term::Free(name.clone()))
    }
}

/// Parses one statement and applies its effect on `context`. On failure the context is left as
/// it was.
pub fn parse_statement(input: &str, context: &mut Context) -> Result<Statement> {
    let command = Parser::new(input, context)?.statement()?;
    Ok(match command {
        Command::Term(term) => Statement::Expression(term),
        Command::Definition(name, term) => {
            context.definitions.define(name.clone(), term);
            Statement::Definition(name)
        }
        Command::Operator {
            name,
            level,
            function,
        } => {
            context
                .operators
                .register(level.value, name.clone(), function)
                .map_err(|source| ParseError::Operator {
                    span: level.span(),
                    source,
                })?;
            debug!(%name, level = level.value, "operator registered");
            Statement::Operator {
                name,
                level: level.value,
            }
        }
        Command::Exit => Statement::Exit,
    })
}
