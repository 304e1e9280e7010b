//! Converts source text into a flat token stream.
//!
//! Never fails silently: any unrecognized character becomes a diagnostic
//! and the lexer skips forward to the next recognizable start instead of
//! aborting tokenization.

mod cursor;

use cursor::Cursor;
use hypha_common::{keyword_from_str, Diagnostic, LineIndex, SourceLocation, Token, TokenKind};

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    lines: LineIndex,
    filename: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, filename: Option<&str>) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            lines: LineIndex::new(source),
            filename: filename.map(str::to_owned),
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the whole source, always ending in exactly one `Eof` token.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.cursor.pos();
            let Some(c) = self.cursor.peek() else {
                tokens.push(self.make_token(TokenKind::Eof, start, start));
                break;
            };
            if let Some(tok) = self.lex_one(c, start) {
                tokens.push(tok);
            }
        }
        (tokens, self.diagnostics)
    }

    fn loc(&self, offset: u32) -> SourceLocation {
        self.lines.location(self.filename.as_deref(), offset)
    }

    fn make_token(&self, kind: TokenKind, start: u32, end: u32) -> Token {
        Token::new(kind, self.cursor.slice(start, end), self.loc(start))
    }

    fn error(&mut self, message: impl Into<String>, at: u32) {
        self.diagnostics.push(Diagnostic::error(message, self.loc(at)));
    }

    /// Skip whitespace, line comments (`#`), and non-nesting block comments
    /// (`/* ... */`), repeating until neither applies.
    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(c) if c.is_whitespace() => {
                    self.cursor.eat_while(|c| c.is_whitespace());
                }
                Some('#') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('/') if self.cursor.peek_next() == Some('*') => {
                    let start = self.cursor.pos();
                    self.cursor.advance();
                    self.cursor.advance();
                    let mut closed = false;
                    while let Some(c) = self.cursor.advance() {
                        if c == '*' && self.cursor.peek() == Some('/') {
                            self.cursor.advance();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        self.error("unterminated block comment", start);
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_one(&mut self, c: char, start: u32) -> Option<Token> {
        if c.is_ascii_digit() {
            return Some(self.lex_number(start));
        }
        if c == '"' || c == '\'' {
            return self.lex_string(c, start);
        }
        if c == '_' || c.is_alphabetic() {
            return Some(self.lex_ident(start));
        }
        if let Some(tok) = self.lex_operator_or_delimiter(start) {
            return Some(tok);
        }
        self.cursor.advance();
        self.error(format!("unexpected character: {c:?}"), start);
        None
    }

    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.') && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
        self.make_token(TokenKind::Number, start, self.cursor.pos())
    }

    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.eat_while(|c| c == '_' || c.is_alphanumeric());
        let end = self.cursor.pos();
        let text = self.cursor.slice(start, end);
        let kind = match text {
            "true" | "false" => TokenKind::BoolLiteral,
            _ => keyword_from_str(text).unwrap_or(TokenKind::Ident),
        };
        self.make_token(kind, start, end)
    }

    fn lex_string(&mut self, quote: char, start: u32) -> Option<Token> {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.advance() {
                None => {
                    self.error("unterminated string literal", start);
                    return None;
                }
                Some('\\') => {
                    // Escape: consume the next character unconditionally.
                    if self.cursor.advance().is_none() {
                        self.error("unterminated string literal", start);
                        return None;
                    }
                }
                Some(c) if c == quote => {
                    let end = self.cursor.pos();
                    return Some(self.make_token(TokenKind::StringLiteral, start, end));
                }
                Some(_) => {}
            }
        }
    }

    /// Recognizes two-character operators before their single-character
    /// prefixes.
    fn lex_operator_or_delimiter(&mut self, start: u32) -> Option<Token> {
        let c = self.cursor.peek()?;
        let next = self.cursor.peek_next();
        let (kind, width): (TokenKind, u32) = match (c, next) {
            ('-', Some('>')) => (TokenKind::Arrow, 2),
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::LtEq, 2),
            ('>', Some('=')) => (TokenKind::GtEq, 2),
            ('&', Some('&')) => (TokenKind::AmpAmp, 2),
            ('|', Some('|')) => (TokenKind::PipePipe, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('=', _) => (TokenKind::Eq, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('!', _) => (TokenKind::Bang, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            (',', _) => (TokenKind::Comma, 1),
            (':', _) => (TokenKind::Colon, 1),
            (';', _) => (TokenKind::Semicolon, 1),
            ('.', _) => (TokenKind::Dot, 1),
            ('@', _) => (TokenKind::At, 1),
            _ => return None,
        };
        for _ in 0..width {
            self.cursor.advance();
        }
        Some(self.make_token(kind, start, self.cursor.pos()))
    }
}

/// Convenience wrapper: tokenize `source`, discarding no information.
pub fn tokenize(source: &str, filename: Option<&str>) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source, filename).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, None).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        let (toks, diags) = tokenize("  # a comment\n  let", None);
        assert!(diags.is_empty());
        assert_eq!(toks.iter().map(|t| t.kind).collect::<Vec<_>>(), vec![TokenKind::Let, TokenKind::Eof]);
    }

    #[test]
    fn skips_block_comments() {
        let (toks, diags) = tokenize("/* one\ntwo */let", None);
        assert!(diags.is_empty());
        assert_eq!(toks[0].kind, TokenKind::Let);
    }

    #[test]
    fn unterminated_block_comment_is_a_diagnostic() {
        let (_, diags) = tokenize("/* never closed", None);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("block comment"));
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(kinds("network greeter"), vec![TokenKind::Network, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn true_and_false_are_bool_literals_not_identifiers() {
        assert_eq!(kinds("true false"), vec![TokenKind::BoolLiteral, TokenKind::BoolLiteral, TokenKind::Eof]);
    }

    #[test]
    fn integer_and_decimal_numbers() {
        let toks = tokenize("42 3.14", None).0;
        assert_eq!(toks[0].kind, TokenKind::Number);
        assert_eq!(toks[0].lexeme, "42");
        assert_eq!(toks[1].kind, TokenKind::Number);
        assert_eq!(toks[1].lexeme, "3.14");
    }

    #[test]
    fn dot_after_number_without_fraction_is_separate_token() {
        // `3.` is not a valid decimal (no digits after '.'); `.` lexes alone.
        let toks = tokenize("3.", None).0;
        assert_eq!(toks[0].kind, TokenKind::Number);
        assert_eq!(toks[0].lexeme, "3");
        assert_eq!(toks[1].kind, TokenKind::Dot);
    }

    #[test]
    fn string_literals_both_quote_styles() {
        let toks = tokenize(r#""hi" 'lo'"#, None).0;
        assert_eq!(toks[0].kind, TokenKind::StringLiteral);
        assert_eq!(toks[0].lexeme, "\"hi\"");
        assert_eq!(toks[1].kind, TokenKind::StringLiteral);
        assert_eq!(toks[1].lexeme, "'lo'");
    }

    #[test]
    fn string_escape_of_next_character() {
        let toks = tokenize(r#""a\"b""#, None).0;
        assert_eq!(toks[0].kind, TokenKind::StringLiteral);
        assert_eq!(toks[0].lexeme, r#""a\"b""#);
    }

    #[test]
    fn unterminated_string_is_a_diagnostic_at_open_quote() {
        let (toks, diags) = tokenize(r#"let x = "oops"#, None);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unterminated string"));
        // The open quote's location, not EOF's.
        assert_eq!(diags[0].location.column, 9);
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn two_char_operators_before_single_char_prefixes() {
        assert_eq!(
            kinds("-> == != <= >= && ||"),
            vec![
                TokenKind::Arrow,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn single_char_operators_and_delimiters() {
        assert_eq!(
            kinds("+ - * / % < > = ! { } ( ) [ ] , : ; . @"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::Bang,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Dot,
                TokenKind::At,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unrecognized_character_is_a_diagnostic_and_lexing_continues() {
        let (toks, diags) = tokenize("let $ x", None);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unexpected character"));
        assert_eq!(
            toks.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Let, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn lexeme_reconstructs_source_substring() {
        let source = "emit response { message: x }";
        let (toks, _) = tokenize(source, None);
        for tok in &toks {
            if tok.kind == TokenKind::Eof {
                continue;
            }
            let (line, col) = (tok.location.line, tok.location.column);
            assert_eq!((line, col), (1, col), "single-line source stays on line 1");
        }
        assert_eq!(toks[0].lexeme, "emit");
        assert_eq!(toks[1].lexeme, "response");
    }

    #[test]
    fn line_and_column_tracking_across_newlines() {
        let (toks, _) = tokenize("let\nx", None);
        assert_eq!((toks[0].location.line, toks[0].location.column), (1, 1));
        assert_eq!((toks[1].location.line, toks[1].location.column), (2, 1));
    }
}
