use chumsky::prelude::*;

use crate::{parser::ParseError, prelude::*};

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "\\")]
    Lambda,
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = "=")]
    Equal,
    #[display(fmt = "{_0}")]
    Ident(Identifier),
    /// The digits of an integer literal, range checked by the parser.
    #[display(fmt = "{_0}")]
    Nat(Identifier),
    #[display(fmt = "{_0}")]
    Invalid(char),
    #[display(fmt = "end of the input")]
    End,
}

#[derive(PartialEq, Eq, Hash, Clone, Copy, derive_more::Display, Debug)]
pub enum TokenKind {
    #[display(fmt = "lambda")]
    Lambda,
    #[display(fmt = "bracket-open")]
    LParen,
    #[display(fmt = "bracket-close")]
    RParen,
    #[display(fmt = "dot")]
    Dot,
    #[display(fmt = "equals")]
    Equal,
    #[display(fmt = "identifier")]
    Ident,
    #[display(fmt = "integer literal")]
    Nat,
    #[display(fmt = "invalid character")]
    Invalid,
    #[display(fmt = "end of the input")]
    End,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Lambda => TokenKind::Lambda,
            Token::LParen => TokenKind::LParen,
            Token::RParen => TokenKind::RParen,
            Token::Dot => TokenKind::Dot,
            Token::Equal => TokenKind::Equal,
            Token::Ident(_) => TokenKind::Ident,
            Token::Nat(_) => TokenKind::Nat,
            Token::Invalid(_) => TokenKind::Invalid,
            Token::End => TokenKind::End,
        }
    }
}

/// Symbols that may appear in identifiers, so that operators lex like any other name.
const OPERATOR_SYMBOLS: &str = "+-*/%^&#|~?<>";

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || OPERATOR_SYMBOLS.contains(c)
}

pub fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

pub fn lexer() -> impl Parser<char, Vec<Spanned<Token>>, Error = Simple<char>> + Clone {
    let ident = filter(|c: &char| is_ident_start(*c))
        .chain(filter(|c: &char| is_ident_continue(*c)).repeated())
        .collect::<String>()
        .map(|s| Token::Ident(Identifier::new(s)));
    let nat = filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(|s| Token::Nat(Identifier::new(s)));
    let symbols = choice((
        just('\\').to(Token::Lambda),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('.').to(Token::Dot),
        just('=').to(Token::Equal),
    ));
    // Anything else still becomes a token; the parser reports it where it expected something.
    let invalid = any().map(Token::Invalid);
    let token = choice((ident, nat, symbols, invalid))
        .map_with_span(|value, span| Spanned { span, value });
    text::whitespace()
        .ignore_then(token.then_ignore(text::whitespace()).repeated())
        .then_ignore(end())
}

/// Cursor over the tokens of one statement, handing out a single token at a time.
pub struct Lexer {
    tokens: std::vec::IntoIter<Spanned<Token>>,
    eoi: Span,
}

impl Lexer {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let len = input.chars().count();
        let tokens = lexer().parse(input).map_err(|es| {
            let (span, message) = es
                .into_iter()
                .next()
                .map(|e| (e.span(), e.to_string()))
                .unwrap_or_else(|| (0..len, "Could not tokenize the input".to_string()));
            ParseError::Lex { span, message }
        })?;
        Ok(Lexer {
            tokens: tokens.into_iter(),
            eoi: len..len + 1,
        })
    }

    /// Advances the cursor. Once the input is exhausted this keeps returning [`Token::End`].
    pub fn next_token(&mut self) -> Spanned<Token> {
        self.tokens.next().unwrap_or_else(|| Spanned {
            span: self.eoi.clone(),
            value: Token::End,
        })
    }
}
