//! Context-sensitive tokenizer with automatic semicolon insertion.
//!
//! The lexer consumes a byte buffer (a null terminator is appended if
//! missing, so `next` always has a sentinel to stop on) and yields
//! `(Pos, TokenKind, literal)` triples one at a time via [`Lexer::next`].
//! Lexical errors never propagate as a `Result` from `next` — they are
//! appended to the enclosing [`File`]'s error list and scanning simply
//! continues with the next token, matching the "never surfaces the error
//! inline" contract in `spec.md` §4.2.
//!
//! ## Automatic semicolon insertion
//!
//! A newline only terminates a statement if the token immediately before it
//! could plausibly end one: an identifier, a literal, or a closing `)`/`}`.
//! Otherwise the newline is purely cosmetic and the line is just recorded
//! for position-mapping purposes.

use hoser_base::{Interner, Symbol};

use crate::position::{File, Pos};
use crate::token::{Token, TokenKind};

/// Tokenizes a byte buffer against a [`File`] for position tracking.
pub struct Lexer<'f, 'i> {
    file: &'f mut File,
    interner: &'i mut Interner,
    bytes: Vec<u8>,
    cursor: usize,
    token_start: usize,
    /// Kind of the most recent non-comment token, or `Invalid` if none yet.
    prev: TokenKind,
}

impl<'f, 'i> Lexer<'f, 'i> {
    pub fn new(file: &'f mut File, interner: &'i mut Interner, source: &[u8]) -> Self {
        let mut bytes = source.to_vec();
        if bytes.last() != Some(&0) {
            bytes.push(0);
        }
        Lexer {
            file,
            interner,
            bytes,
            cursor: 0,
            token_start: 0,
            prev: TokenKind::Invalid,
        }
    }

    fn byte_at(&self, offset: usize) -> u8 {
        self.bytes.get(offset).copied().unwrap_or(0)
    }

    fn cur(&self) -> u8 {
        self.byte_at(self.cursor)
    }

    fn error(&mut self, pos: Pos, message: impl Into<String>) {
        let resolved = self.file.position(pos);
        self.file.errors_mut().add(resolved, message);
    }

    /// Resolves a position, for callers (the parser) that need to inspect
    /// line numbers to implement their own diagnostic policy.
    pub fn position(&self, pos: Pos) -> crate::position::Position {
        self.file.position(pos)
    }

    pub fn file(&self) -> &File {
        self.file
    }

    pub fn file_mut(&mut self) -> &mut File {
        self.file
    }

    pub fn interner(&self) -> &Interner {
        self.interner
    }

    pub fn interner_mut(&mut self) -> &mut Interner {
        self.interner
    }

    fn finish(&mut self, pos: Pos, kind: TokenKind, literal: Symbol) -> Token {
        if kind != TokenKind::Comment {
            self.prev = kind;
        }
        Token::new(pos, kind, literal)
    }

    fn intern_slice(&mut self, start: usize, end: usize) -> Symbol {
        // Source bytes are valid UTF-8 (the caller constructed them from a
        // `&str` or an equivalent buffer); slicing at token boundaries (which
        // always land on ASCII delimiters) can never split a multi-byte
        // sequence.
        let text = std::str::from_utf8(&self.bytes[start..end]).unwrap_or("");
        self.interner.intern(text)
    }

    /// `true` if a newline right after the most recent token should be
    /// turned into an automatically inserted `Semicolon`.
    fn insert_semi(&self) -> bool {
        matches!(
            self.prev,
            TokenKind::Ident | TokenKind::RParen | TokenKind::RBrace
                | TokenKind::String | TokenKind::Integer | TokenKind::Float
        )
    }

    /// Returns the next token. Never fails: lexical errors are recorded on
    /// the file's error list and scanning continues transparently.
    pub fn next(&mut self) -> Token {
        loop {
            self.token_start = self.cursor;
            let pos = self.file.pos(self.cursor);
            match self.cur() {
                0 => {
                    self.cursor += 1;
                    let empty = self.interner.intern("");
                    return self.finish(pos, TokenKind::Eof, empty);
                }
                b' ' | b'\t' => {
                    self.cursor += 1;
                }
                b'\r' | b'\n' => {
                    let nl_start = self.cursor;
                    if self.cur() == b'\r' {
                        self.cursor += 1;
                        if self.cur() != b'\n' {
                            self.error(pos, "bad token");
                            continue;
                        }
                    }
                    self.cursor += 1; // consume '\n'
                    if self.insert_semi() {
                        self.cursor = nl_start; // no column advance
                        let empty = self.interner.intern("");
                        return self.finish(pos, TokenKind::Semicolon, empty);
                    } else {
                        let line_start = self.cursor;
                        self.file.add_line(line_start);
                    }
                }
                b'#' => {
                    while !matches!(self.cur(), b'\n' | b'\r' | 0) {
                        self.cursor += 1;
                    }
                    let lit = self.intern_slice(self.token_start, self.cursor);
                    return self.finish(pos, TokenKind::Comment, lit);
                }
                b'"' => {
                    if let Some(tok) = self.scan_string(pos) {
                        return tok;
                    }
                }
                b'(' => {
                    self.cursor += 1;
                    let lit = self.interner.intern("(");
                    return self.finish(pos, TokenKind::LParen, lit);
                }
                b')' => {
                    self.cursor += 1;
                    let lit = self.interner.intern(")");
                    return self.finish(pos, TokenKind::RParen, lit);
                }
                b'{' => {
                    self.cursor += 1;
                    let lit = self.interner.intern("{");
                    return self.finish(pos, TokenKind::LBrace, lit);
                }
                b'}' => {
                    self.cursor += 1;
                    let lit = self.interner.intern("}");
                    return self.finish(pos, TokenKind::RBrace, lit);
                }
                b',' => {
                    self.cursor += 1;
                    let lit = self.interner.intern(",");
                    return self.finish(pos, TokenKind::Comma, lit);
                }
                b':' => {
                    self.cursor += 1;
                    let lit = self.interner.intern(":");
                    return self.finish(pos, TokenKind::Colon, lit);
                }
                b';' => {
                    self.cursor += 1;
                    let lit = self.interner.intern(";");
                    return self.finish(pos, TokenKind::Semicolon, lit);
                }
                b'=' => {
                    self.cursor += 1;
                    let lit = self.interner.intern("=");
                    return self.finish(pos, TokenKind::Equals, lit);
                }
                b'.' => {
                    self.cursor += 1;
                    let lit = self.interner.intern(".");
                    return self.finish(pos, TokenKind::Period, lit);
                }
                b'0'..=b'9' => {
                    return self.scan_number(pos);
                }
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                    return self.scan_ident(pos);
                }
                _ => {
                    self.cursor += 1;
                    self.error(pos, "bad token");
                }
            }
        }
    }

    fn scan_ident(&mut self, pos: Pos) -> Token {
        while matches!(self.cur(), b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_') {
            self.cursor += 1;
        }
        let text = std::str::from_utf8(&self.bytes[self.token_start..self.cursor]).unwrap_or("");
        let kind = TokenKind::keyword_from_str(text).unwrap_or(TokenKind::Ident);
        let lit = self.intern_slice(self.token_start, self.cursor);
        self.finish(pos, kind, lit)
    }

    fn scan_number(&mut self, pos: Pos) -> Token {
        while self.cur().is_ascii_digit() {
            self.cursor += 1;
        }
        let mut is_float = false;
        if self.cur() == b'.' && self.byte_at(self.cursor + 1).is_ascii_digit() {
            is_float = true;
            self.cursor += 1;
            while self.cur().is_ascii_digit() {
                self.cursor += 1;
            }
            if matches!(self.cur(), b'e' | b'E') {
                let save = self.cursor;
                self.cursor += 1;
                if matches!(self.cur(), b'+' | b'-') {
                    self.cursor += 1;
                }
                if self.cur().is_ascii_digit() {
                    while self.cur().is_ascii_digit() {
                        self.cursor += 1;
                    }
                } else {
                    self.cursor = save;
                }
            }
        }
        let lit = self.intern_slice(self.token_start, self.cursor);
        let kind = if is_float { TokenKind::Float } else { TokenKind::Integer };
        self.finish(pos, kind, lit)
    }

    /// Scans a double-quoted string, decoding escapes. Returns `None` (no
    /// token produced, caller should keep scanning) if the string was
    /// unterminated at a newline.
    fn scan_string(&mut self, pos: Pos) -> Option<Token> {
        self.cursor += 1; // opening quote
        let mut decoded: Vec<u8> = Vec::new();
        loop {
            match self.cur() {
                b'"' => {
                    self.cursor += 1;
                    let text = std::str::from_utf8(&decoded).unwrap_or("").to_string();
                    let sym = self.interner.intern(&text);
                    return Some(self.finish(pos, TokenKind::String, sym));
                }
                b'\n' | 0 => {
                    self.error(pos, "unexpected end to string");
                    return None;
                }
                b'\\' => {
                    self.cursor += 1;
                    let esc = self.cur();
                    self.cursor += 1;
                    let decoded_byte = match esc {
                        b'"' => b'"',
                        b'\'' => b'\'',
                        b'?' => b'?',
                        b'\\' => b'\\',
                        b'a' => 0x07,
                        b'b' => 0x08,
                        b'f' => 0x0C,
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        b'v' => 0x0B,
                        other => other,
                    };
                    decoded.push(decoded_byte);
                }
                b => {
                    decoded.push(b);
                    self.cursor += 1;
                }
            }
        }
    }
}

/// Drains `source` to `Eof`, returning the collected token kinds (excluding
/// the trailing `Eof` itself) and the first recorded lexical error, if any.
pub fn scan_all(file: &mut File, interner: &mut Interner, source: &[u8]) -> (Vec<TokenKind>, Option<String>) {
    let mut lexer = Lexer::new(file, interner, source);
    let mut kinds = Vec::new();
    loop {
        let before = lexer.file.errors().len();
        let tok = lexer.next();
        if lexer.file.errors().len() > before {
            let msg = lexer.file.errors().iter().next().map(|e| e.to_string());
            return (kinds, msg);
        }
        if tok.kind == TokenKind::Eof {
            return (kinds, None);
        }
        kinds.push(tok.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<TokenKind> {
        let mut file = File::new("test.hs", source.len());
        let mut interner = Interner::new();
        let (kinds, err) = scan_all(&mut file, &mut interner, source.as_bytes());
        assert!(err.is_none(), "unexpected lex error: {err:?}");
        kinds
    }

    #[test]
    fn semicolon_insertion_after_brace_paren_ident() {
        let kinds = lex_all("}\n)\nA\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn no_semicolon_after_operator() {
        let kinds = lex_all("=\n10\n");
        assert_eq!(kinds, vec![TokenKind::Equals, TokenKind::Integer, TokenKind::Semicolon]);
    }

    #[test]
    fn string_escapes_decode() {
        let source = br#""hello\n\"there""#;
        let mut file = File::new("test.hs", source.len());
        let mut interner = Interner::new();
        let mut lexer = Lexer::new(&mut file, &mut interner, source);
        let tok = lexer.next();
        assert_eq!(tok.kind, TokenKind::String);
        assert_eq!(interner.resolve(tok.literal), "hello\n\"there");
    }

    #[test]
    fn unterminated_string_reports_error() {
        let source = b"\"oops\n";
        let mut file = File::new("test.hs", source.len());
        let mut interner = Interner::new();
        let (_, err) = scan_all(&mut file, &mut interner, source);
        assert!(err.is_some());
        assert!(err.unwrap().contains("unexpected end to string"));
    }

    #[test]
    fn bad_token_reports_error_and_recovers() {
        let source = b"a `b";
        let mut file = File::new("test.hs", source.len());
        let mut interner = Interner::new();
        let (kinds, err) = scan_all(&mut file, &mut interner, source);
        assert!(err.is_some());
        assert!(err.unwrap().contains("bad token"));
        assert_eq!(kinds, vec![TokenKind::Ident]);
    }

    #[test]
    fn integers_and_floats() {
        assert_eq!(lex_all("13509185"), vec![TokenKind::Integer]);
        assert_eq!(lex_all("1.2"), vec![TokenKind::Float]);
        assert_eq!(lex_all("1.2e10"), vec![TokenKind::Float]);
        assert_eq!(lex_all("1.2e+5"), vec![TokenKind::Float]);
    }

    #[test]
    fn bare_period_is_its_own_token() {
        assert_eq!(lex_all("shell.Run"), vec![TokenKind::Ident, TokenKind::Period, TokenKind::Ident]);
    }

    #[test]
    fn keywords_recognized() {
        let kinds = lex_all("module import pipe stub return");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Module,
                TokenKind::Import,
                TokenKind::Pipe,
                TokenKind::Stub,
                TokenKind::Return,
            ]
        );
    }

    #[test]
    fn comment_is_transparent_to_semicolon_insertion() {
        // A comment between an identifier and a newline must not suppress
        // the semicolon that the identifier would otherwise trigger.
        let kinds = lex_all("A # trailing comment\n");
        assert_eq!(kinds, vec![TokenKind::Ident, TokenKind::Comment, TokenKind::Semicolon]);
    }

    #[test]
    fn operators_supported() {
        assert_eq!(
            lex_all("{}()=;:,"),
            vec![
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Equals,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn scan_all_terminates_on_eof_without_including_it() {
        let kinds = lex_all("");
        assert!(kinds.is_empty());
    }
}
