//! A conventional hand-written scanner. An external collaborator of the parser:
//! produces a flat token stream terminated by `Eof`, tracking 1-based line/column.

use crate::token::{lookup_ident, Token, TokenKind};
use log::trace;

pub struct Lexer {
    input: Vec<u8>,
    position: usize,
    read_position: usize,
    ch: u8,
    line: usize,
    column: usize,
}

const NUL: u8 = 0;

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer {
            input: source.as_bytes().to_vec(),
            position: 0,
            read_position: 0,
            ch: NUL,
            line: 1,
            column: 0,
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        if self.ch == b'\n' {
            self.line += 1;
            self.column = 0;
        }
        self.ch = if self.read_position >= self.input.len() {
            NUL
        } else {
            self.input[self.read_position]
        };
        self.position = self.read_position;
        self.read_position += 1;
        self.column += 1;
    }

    fn peek_char(&self) -> u8 {
        if self.read_position >= self.input.len() {
            NUL
        } else {
            self.input[self.read_position]
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, b' ' | b'\t' | b'\r' | b'\n') {
            self.read_char();
        }
    }

    fn skip_line(&mut self) -> String {
        let start = self.position;
        while self.ch != b'\n' && self.ch != NUL {
            self.read_char();
        }
        String::from_utf8_lossy(&self.input[start..self.position]).into_owned()
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while self.ch.is_ascii_alphanumeric() || self.ch == b'_' {
            self.read_char();
        }
        String::from_utf8_lossy(&self.input[start..self.position]).into_owned()
    }

    fn read_number(&mut self) -> String {
        let start = self.position;
        while self.ch.is_ascii_digit() {
            self.read_char();
        }
        String::from_utf8_lossy(&self.input[start..self.position]).into_owned()
    }

    fn read_string(&mut self) -> String {
        let start = self.position + 1;
        loop {
            self.read_char();
            if self.ch == b'"' || self.ch == NUL {
                break;
            }
        }
        String::from_utf8_lossy(&self.input[start..self.position]).into_owned()
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let line = self.line;
        let column = self.column;
        let tok = |kind, literal: &str| Token::new(kind, literal, line, column);

        let token = match self.ch {
            b'=' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    tok(TokenKind::Eq, "==")
                } else {
                    tok(TokenKind::Assign, "=")
                }
            }
            b'+' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    tok(TokenKind::PlusAssign, "+=")
                } else {
                    tok(TokenKind::Plus, "+")
                }
            }
            b'-' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    tok(TokenKind::MinusAssign, "-=")
                } else if self.peek_char() == b'>' {
                    self.read_char();
                    tok(TokenKind::Arrow, "->")
                } else {
                    tok(TokenKind::Minus, "-")
                }
            }
            b'!' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    tok(TokenKind::NotEq, "!=")
                } else {
                    tok(TokenKind::Bang, "!")
                }
            }
            b'*' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    tok(TokenKind::AsteriskAssign, "*=")
                } else {
                    tok(TokenKind::Asterisk, "*")
                }
            }
            b'/' => {
                if self.peek_char() == b'/' {
                    let text = self.skip_line();
                    return tok(TokenKind::Comment, text.as_str());
                } else if self.peek_char() == b'=' {
                    self.read_char();
                    tok(TokenKind::SlashAssign, "/=")
                } else {
                    tok(TokenKind::Slash, "/")
                }
            }
            b'<' => tok(TokenKind::Lt, "<"),
            b'>' => tok(TokenKind::Gt, ">"),
            b',' => tok(TokenKind::Comma, ","),
            b';' => tok(TokenKind::Semicolon, ";"),
            b':' => tok(TokenKind::Colon, ":"),
            b'(' => tok(TokenKind::Lparen, "("),
            b')' => tok(TokenKind::Rparen, ")"),
            b'{' => tok(TokenKind::Lbrace, "{"),
            b'}' => tok(TokenKind::Rbrace, "}"),
            b'[' => tok(TokenKind::Lbracket, "["),
            b']' => tok(TokenKind::Rbracket, "]"),
            b'"' => {
                let s = self.read_string();
                tok(TokenKind::String, s.as_str())
            }
            NUL => tok(TokenKind::Eof, ""),
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let ident = self.read_identifier();
                let kind = lookup_ident(&ident);
                return Token::new(kind, ident, line, column);
            }
            c if c.is_ascii_digit() => {
                let num = self.read_number();
                return Token::new(TokenKind::Int, num, line, column);
            }
            c => {
                let literal = (c as char).to_string();
                tok(TokenKind::Illegal, literal.as_str())
            }
        };

        self.read_char();
        trace!("lexed {:?} '{}' at {}:{}", token.kind, token.literal, line, column);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn single_char_operators() {
        assert_eq!(
            kinds("+-*/!<>,;:(){}[]"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Asterisk,
                TokenKind::Slash,
                TokenKind::Bang,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::Lparen,
                TokenKind::Rparen,
                TokenKind::Lbrace,
                TokenKind::Rbrace,
                TokenKind::Lbracket,
                TokenKind::Rbracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("== != += -= *= /= ->"),
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::PlusAssign,
                TokenKind::MinusAssign,
                TokenKind::AsteriskAssign,
                TokenKind::SlashAssign,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        let mut lexer = Lexer::new("let x = function if else return for in break true false foo_bar");
        let expected = vec![
            TokenKind::Let,
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Function,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Return,
            TokenKind::For,
            TokenKind::In,
            TokenKind::Break,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Ident,
        ];
        for want in expected {
            assert_eq!(lexer.next_token().kind, want);
        }
    }

    #[test]
    fn integers_and_strings() {
        let mut lexer = Lexer::new(r#"42 "hello world""#);
        let int_tok = lexer.next_token();
        assert_eq!(int_tok.kind, TokenKind::Int);
        assert_eq!(int_tok.literal, "42");
        let str_tok = lexer.next_token();
        assert_eq!(str_tok.kind, TokenKind::String);
        assert_eq!(str_tok.literal, "hello world");
    }

    #[test]
    fn comments_are_emitted_as_tokens() {
        let mut lexer = Lexer::new("// a comment\nlet");
        let comment = lexer.next_token();
        assert_eq!(comment.kind, TokenKind::Comment);
        assert!(comment.literal.contains("a comment"));
        let next = lexer.next_token();
        assert_eq!(next.kind, TokenKind::Let);
        assert_eq!(next.line, 2);
    }

    #[test]
    fn line_and_column_tracking() {
        let mut lexer = Lexer::new("let\nx");
        let let_tok = lexer.next_token();
        assert_eq!(let_tok.line, 1);
        let x_tok = lexer.next_token();
        assert_eq!(x_tok.line, 2);
    }

    #[test]
    fn illegal_character() {
        let mut lexer = Lexer::new("&");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Illegal);
        assert_eq!(tok.literal, "&");
    }

    #[test]
    fn arrow_access_operator() {
        assert_eq!(kinds("m->AddNote"), vec![TokenKind::Ident, TokenKind::Arrow, TokenKind::Ident, TokenKind::Eof]);
    }
}
