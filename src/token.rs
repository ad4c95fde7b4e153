//! Token types produced by the [`lexer`](crate::lexer) and consumed by the
//! [`parser`](crate::parser).

use hoser_base::{Interner, Symbol};

use crate::position::Pos;

/// The fixed set of token kinds Hoser source text lexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Invalid,
    Comment,

    // Keywords
    Module,
    Import,
    Pipe,
    Stub,
    Return,

    // Literals
    Ident,
    String,
    Integer,
    Float,

    // Operators / punctuation
    Equals,
    Period,
    Comma,
    Colon,
    Semicolon,
    LBrace,
    RBrace,
    LParen,
    RParen,

    Eof,
}

impl TokenKind {
    /// A human-readable name for error messages.
    ///
    /// Prefers the operator's literal spelling; falls back to a descriptive
    /// phrase for tokens that have no fixed spelling (`Ident`, literals, and
    /// the auto-inserted semicolon, which is reported as `"newline"`).
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Invalid => "invalid token",
            Comment => "comment",
            Module => "'module'",
            Import => "'import'",
            Pipe => "'pipe'",
            Stub => "'stub'",
            Return => "'return'",
            Ident => "identifier",
            String => "string literal",
            Integer => "integer literal",
            Float => "float literal",
            Equals => "'='",
            Period => "'.'",
            Comma => "','",
            Colon => "':'",
            Semicolon => "newline",
            LBrace => "'{'",
            RBrace => "'}'",
            LParen => "'('",
            RParen => "')'",
            Eof => "end of file",
        }
    }

    /// `true` for the keyword set matched by exact identifier spelling.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        Some(match s {
            "module" => TokenKind::Module,
            "import" => TokenKind::Import,
            "pipe" => TokenKind::Pipe,
            "stub" => TokenKind::Stub,
            "return" => TokenKind::Return,
            _ => return None,
        })
    }

    /// Inverse of `{:?}` formatting, for [`Token::decode`].
    fn from_debug_name(name: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match name {
            "Invalid" => Invalid,
            "Comment" => Comment,
            "Module" => Module,
            "Import" => Import,
            "Pipe" => Pipe,
            "Stub" => Stub,
            "Return" => Return,
            "Ident" => Ident,
            "String" => String,
            "Integer" => Integer,
            "Float" => Float,
            "Equals" => Equals,
            "Period" => Period,
            "Comma" => Comma,
            "Colon" => Colon,
            "Semicolon" => Semicolon,
            "LBrace" => LBrace,
            "RBrace" => RBrace,
            "LParen" => LParen,
            "RParen" => RParen,
            "Eof" => Eof,
            _ => return None,
        })
    }
}

/// A lexed token: its kind, position, and verbatim literal text.
///
/// `literal` is interned: for punctuation and keywords it resolves to the
/// canonical spelling, for `Ident`/`String`/`Integer`/`Float` it resolves to
/// the decoded lexeme (quotes stripped and escapes decoded for strings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub pos: Pos,
    pub kind: TokenKind,
    pub literal: Symbol,
}

impl Token {
    pub fn new(pos: Pos, kind: TokenKind, literal: Symbol) -> Self {
        Token { pos, kind, literal }
    }

    /// A compact `"<Kind>:<literal>"` golden-fixture encoding, paired with
    /// [`Token::decode`]. Mirrors the original Go lexer's JSON-lines token
    /// dump (`lexer.MarshalTo`/`UnmarshalFrom`) used to golden-test scanner
    /// output, but as plain text rather than JSON lines: a single scalar
    /// pair doesn't justify pulling in `serde` for one debug helper. Source
    /// position is deliberately not part of the encoding — a golden fixture
    /// only needs to pin down the token *stream*, and `Pos` can't be
    /// resolved back to a byte offset without the originating `File`.
    pub fn encode(&self, interner: &Interner) -> String {
        format!("{:?}:{}", self.kind, interner.resolve(self.literal))
    }

    /// Inverse of [`Token::encode`]. The returned token always carries
    /// `Pos::NONE`, since no position was encoded.
    pub fn decode(encoded: &str, interner: &mut Interner) -> Option<Token> {
        let (kind_str, literal) = encoded.split_once(':')?;
        let kind = TokenKind::from_debug_name(kind_str)?;
        let sym = interner.intern(literal);
        Some(Token::new(Pos::NONE, kind, sym))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let mut interner = Interner::new();
        let lit = interner.intern("foo");
        let tok = Token::new(Pos::NONE, TokenKind::Ident, lit);
        let encoded = tok.encode(&interner);
        assert_eq!(encoded, "Ident:foo");

        let mut decode_interner = Interner::new();
        let decoded = Token::decode(&encoded, &mut decode_interner).unwrap();
        assert_eq!(decoded.kind, TokenKind::Ident);
        assert_eq!(decode_interner.resolve(decoded.literal), "foo");
    }

    #[test]
    fn decode_rejects_unknown_kind() {
        let mut interner = Interner::new();
        assert!(Token::decode("NotAKind:x", &mut interner).is_none());
    }

    #[test]
    fn keyword_from_str_matches_exact_spelling() {
        assert_eq!(TokenKind::keyword_from_str("pipe"), Some(TokenKind::Pipe));
        assert_eq!(TokenKind::keyword_from_str("Pipe"), None);
        assert_eq!(TokenKind::keyword_from_str("piped"), None);
    }

    #[test]
    fn describe_prefers_literal_spelling_for_operators() {
        assert_eq!(TokenKind::LParen.describe(), "'('");
        assert_eq!(TokenKind::Semicolon.describe(), "newline");
    }
}
