use logos::{Logos, SpannedIter};

use crate::token::{Span, Token, TokenKind};

fn unescape_string(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars();

    chars.next();
    chars.next_back();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                match escaped {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '"' => result.push('"'),
                    '\\' => result.push('\\'),
                    _ => {
                        result.push('\\');
                        result.push(escaped);
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Lexeme {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("=")]
    Equal,

    #[token("!")]
    Bang,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("==")]
    EqualEqual,

    #[token("!=")]
    BangEqual,

    #[token("fn")]
    Fn,

    #[token("macro")]
    Macro,

    #[token("let")]
    Let,

    #[token("return")]
    Return,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,
}

impl Lexeme {
    fn kind(self) -> TokenKind {
        match self {
            Lexeme::LeftParen => TokenKind::LeftParen,
            Lexeme::RightParen => TokenKind::RightParen,
            Lexeme::LeftBrace => TokenKind::LeftBrace,
            Lexeme::RightBrace => TokenKind::RightBrace,
            Lexeme::LeftBracket => TokenKind::LeftBracket,
            Lexeme::RightBracket => TokenKind::RightBracket,
            Lexeme::Semicolon => TokenKind::Semicolon,
            Lexeme::Colon => TokenKind::Colon,
            Lexeme::Comma => TokenKind::Comma,
            Lexeme::Plus => TokenKind::Plus,
            Lexeme::Minus => TokenKind::Minus,
            Lexeme::Star => TokenKind::Asterisk,
            Lexeme::Slash => TokenKind::Slash,
            Lexeme::Equal => TokenKind::Assign,
            Lexeme::Bang => TokenKind::Bang,
            Lexeme::Less => TokenKind::Less,
            Lexeme::Greater => TokenKind::Greater,
            Lexeme::EqualEqual => TokenKind::EqualEqual,
            Lexeme::BangEqual => TokenKind::BangEqual,
            Lexeme::Fn => TokenKind::Function,
            Lexeme::Macro => TokenKind::Macro,
            Lexeme::Let => TokenKind::Let,
            Lexeme::Return => TokenKind::Return,
            Lexeme::True => TokenKind::True,
            Lexeme::False => TokenKind::False,
            Lexeme::If => TokenKind::If,
            Lexeme::Else => TokenKind::Else,
            Lexeme::Int => TokenKind::Int,
            Lexeme::String => TokenKind::String,
            Lexeme::Identifier => TokenKind::Identifier,
        }
    }
}

/// Pull-style token source for the parser.
///
/// Yields every token of the input followed by exactly one `Eof` token.
/// Input the scanner does not recognize comes out as `Illegal` tokens rather
/// than stopping the scan.
pub struct Lexer<'source> {
    inner: SpannedIter<'source, Lexeme>,
    source: &'source str,
    finished: bool,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Lexer {
            inner: Lexeme::lexer(source).spanned(),
            source,
            finished: false,
        }
    }

    pub fn next_token(&mut self) -> Token {
        match self.inner.next() {
            Some((Ok(lexeme), range)) => {
                let slice = &self.source[range.clone()];
                let literal = match lexeme {
                    Lexeme::String => unescape_string(slice),
                    _ => slice.to_owned(),
                };
                Token::new(lexeme.kind(), literal, Span(range.start, range.end))
            }
            Some((Err(()), range)) => {
                let slice = &self.source[range.clone()];
                Token::new(TokenKind::Illegal, slice, Span(range.start, range.end))
            }
            None => Token::eof(self.source.len()),
        }
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            self.finished = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|token| token.kind).collect()
    }

    #[test]
    fn operators_and_delimiters() {
        assert_eq!(
            kinds("=+-!*/<>==!=,;:(){}[]"),
            vec![
                TokenKind::Assign,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Bang,
                TokenKind::Asterisk,
                TokenKind::Slash,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(
            kinds("let letter fn macro return if else true false"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Function,
                TokenKind::Macro,
                TokenKind::Return,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn literals_carry_their_text() {
        let tokens: Vec<Token> = Lexer::new(r#"let five = 5; "foo bar" "a\"b""#).collect();
        let literals: Vec<&str> = tokens.iter().map(|token| token.literal.as_str()).collect();
        assert_eq!(literals, vec!["let", "five", "=", "5", ";", "foo bar", "a\"b", ""]);
        assert_eq!(tokens[5].kind, TokenKind::String);
        assert_eq!(tokens[1].span, Span(4, 8));
    }

    #[test]
    fn unknown_characters_become_illegal() {
        let tokens: Vec<Token> = Lexer::new("1 @ 2").collect();
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
        assert_eq!(tokens[1].literal, "@");
        assert_eq!(tokens[2].kind, TokenKind::Int);
    }

    #[test]
    fn eof_is_emitted_once() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Identifier));
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Eof));
        assert_eq!(lexer.next(), None);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}
