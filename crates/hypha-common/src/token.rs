use serde::Serialize;

use crate::location::SourceLocation;

/// A token produced by the lexer: its kind, the exact source substring it
/// covers, and the location of its first character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Token { kind, lexeme: lexeme.into(), location }
    }
}

/// The complete, closed vocabulary of token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords (32) ──────────────────────────────────────────────────
    Network,
    Frequencies,
    Frequency,
    Hyphae,
    Hyphal,
    State,
    On,
    Signal,
    Emit,
    Report,
    Spawn,
    Die,
    Socket,
    FruitingBody,
    Topology,
    Config,
    If,
    Else,
    Where,
    Rest,
    Cycle,
    Let,
    U32,
    I64,
    F64,
    StringKw,
    Binary,
    Boolean,
    Vec,
    Queue,
    Map,
    As,

    // ── Operators (16) ─────────────────────────────────────────────────
    /// `->`
    Arrow,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `=`
    Eq,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,

    // ── Delimiters (11) ────────────────────────────────────────────────
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    At,

    // ── Literals (3) ───────────────────────────────────────────────────
    /// Integer or decimal numeric literal, e.g. `42`, `3.14`.
    Number,
    /// `"..."` or `'...'`, with escape processing deferred to the parser.
    StringLiteral,
    /// `true` or `false`.
    BoolLiteral,

    // ── Identifiers (1) ────────────────────────────────────────────────
    Ident,

    // ── Special (1) ────────────────────────────────────────────────────
    Eof,
}

/// Look up a keyword from its string representation.
///
/// `true`/`false` are deliberately excluded: the lexer classifies them as
/// `BoolLiteral`, not a keyword.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "network" => Some(TokenKind::Network),
        "frequencies" => Some(TokenKind::Frequencies),
        "frequency" => Some(TokenKind::Frequency),
        "hyphae" => Some(TokenKind::Hyphae),
        "hyphal" => Some(TokenKind::Hyphal),
        "state" => Some(TokenKind::State),
        "on" => Some(TokenKind::On),
        "signal" => Some(TokenKind::Signal),
        "emit" => Some(TokenKind::Emit),
        "report" => Some(TokenKind::Report),
        "spawn" => Some(TokenKind::Spawn),
        "die" => Some(TokenKind::Die),
        "socket" => Some(TokenKind::Socket),
        "fruiting_body" => Some(TokenKind::FruitingBody),
        "topology" => Some(TokenKind::Topology),
        "config" => Some(TokenKind::Config),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "where" => Some(TokenKind::Where),
        "rest" => Some(TokenKind::Rest),
        "cycle" => Some(TokenKind::Cycle),
        "let" => Some(TokenKind::Let),
        "u32" => Some(TokenKind::U32),
        "i64" => Some(TokenKind::I64),
        "f64" => Some(TokenKind::F64),
        "string" => Some(TokenKind::StringKw),
        "binary" => Some(TokenKind::Binary),
        "boolean" => Some(TokenKind::Boolean),
        "vec" => Some(TokenKind::Vec),
        "queue" => Some(TokenKind::Queue),
        "map" => Some(TokenKind::Map),
        "as" => Some(TokenKind::As),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_from_str_recognizes_all_keywords() {
        let keywords = [
            ("network", TokenKind::Network),
            ("frequencies", TokenKind::Frequencies),
            ("frequency", TokenKind::Frequency),
            ("hyphae", TokenKind::Hyphae),
            ("hyphal", TokenKind::Hyphal),
            ("state", TokenKind::State),
            ("on", TokenKind::On),
            ("signal", TokenKind::Signal),
            ("emit", TokenKind::Emit),
            ("report", TokenKind::Report),
            ("spawn", TokenKind::Spawn),
            ("die", TokenKind::Die),
            ("socket", TokenKind::Socket),
            ("fruiting_body", TokenKind::FruitingBody),
            ("topology", TokenKind::Topology),
            ("config", TokenKind::Config),
            ("if", TokenKind::If),
            ("else", TokenKind::Else),
            ("where", TokenKind::Where),
            ("rest", TokenKind::Rest),
            ("cycle", TokenKind::Cycle),
            ("let", TokenKind::Let),
            ("u32", TokenKind::U32),
            ("i64", TokenKind::I64),
            ("f64", TokenKind::F64),
            ("string", TokenKind::StringKw),
            ("binary", TokenKind::Binary),
            ("boolean", TokenKind::Boolean),
            ("vec", TokenKind::Vec),
            ("queue", TokenKind::Queue),
            ("map", TokenKind::Map),
            ("as", TokenKind::As),
        ];

        for (s, expected) in &keywords {
            assert_eq!(keyword_from_str(s), Some(*expected), "keyword_from_str({s:?})");
        }
        assert_eq!(keywords.len(), 32, "must cover all 32 keyword tokens");
    }

    #[test]
    fn keyword_from_str_rejects_true_false_and_non_keywords() {
        // true/false are boolean literals, not keywords.
        assert_eq!(keyword_from_str("true"), None);
        assert_eq!(keyword_from_str("false"), None);
        assert_eq!(keyword_from_str("greeter"), None);
        assert_eq!(keyword_from_str(""), None);
        assert_eq!(keyword_from_str("Network"), None); // case-sensitive
    }

    #[test]
    fn token_new_constructor() {
        let tok = Token::new(TokenKind::Let, "let", SourceLocation::new(None, 1, 1));
        assert_eq!(tok.kind, TokenKind::Let);
        assert_eq!(tok.lexeme, "let");
    }
}
