//! Pratt-style recursive-descent parser: turns a token stream into a
//! [`Module`], a single [`BlockDecl`], or a single [`Expr`], recording
//! diagnostics on the enclosing [`File`] instead of failing on the first
//! one.
//!
//! The parser drives the [`Lexer`] with one token of lookahead (`peek`/
//! `eat`) and resolves infix operators through the precedence table in
//! `spec.md` §4.3: `;` binds loosest (it always ends an expression), `(`
//! binds tightest, and everything outside the table ends an expression too.
//! Every comma-delimited list (call arguments, port declarations, field-list
//! literals, and a multi-output `return`) parses each item with `Comma`
//! itself as the "parent" token, so an item's own expression naturally stops
//! at the next separator instead of trying to treat the separator as an
//! infix operator.

use hoser_base::{Interner, Symbol};

use crate::ast::{
    AssignExpr, AstArena, BlockDecl, CallExpr, Expr, Field, FieldList, Ident, ImportDecl,
    LiteralExpr, LiteralKind, LiteralValue, Module, ParenExpr, PipeDecl, ReturnStmt, Stmt,
    StubDecl,
};
use crate::lexer::Lexer;
use crate::position::{CompileError, File, Pos};
use crate::token::{Token, TokenKind};

fn precedence(kind: TokenKind) -> i32 {
    match kind {
        TokenKind::Semicolon => -1,
        TokenKind::Invalid => 0,
        TokenKind::Equals => 1,
        TokenKind::Comma => 3,
        TokenKind::Colon => 4,
        TokenKind::LParen => 5,
        _ => -1,
    }
}

/// Parser state: the token source plus the small amount of bookkeeping
/// needed for error recovery (same-line suppression and the ten-error
/// bailout, mirroring `spec.md` §4.3).
struct Parser<'f, 'i, 'a> {
    lexer: Lexer<'f, 'i>,
    arena: &'a AstArena<'a>,
    peeked: Option<Token>,
    bailed_out: bool,
}

impl<'f, 'i, 'a> Parser<'f, 'i, 'a> {
    fn new(file: &'f mut File, interner: &'i mut Interner, arena: &'a AstArena<'a>, source: &[u8]) -> Self {
        Parser { lexer: Lexer::new(file, interner, source), arena, peeked: None, bailed_out: false }
    }

    fn raw_next(&mut self) -> Token {
        loop {
            let tok = self.lexer.next();
            if tok.kind != TokenKind::Comment {
                return tok;
            }
        }
    }

    fn peek(&mut self) -> Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.raw_next());
        }
        self.peeked.expect("just populated")
    }

    fn eat(&mut self) -> Token {
        let tok = self.peek();
        self.peeked = None;
        tok
    }

    fn eat_all(&mut self, kind: TokenKind) {
        while self.peek().kind == kind {
            self.eat();
        }
    }

    /// Eats the next token, recording `ExpectedToken` if it isn't `kind`.
    /// Returns whatever was actually there so the caller can keep going.
    fn eat_expect(&mut self, kind: TokenKind) -> Token {
        let tok = self.eat();
        if tok.kind != kind {
            let msg = format!("expected {}, got {}", kind.describe(), self.token_repr(tok));
            self.error(tok.pos, msg);
        }
        tok
    }

    /// The spelling to use for a token in a diagnostic: the literal lexeme
    /// for identifiers/literals, `"newline"` for an auto-inserted semicolon,
    /// and the pretty operator name otherwise.
    fn token_repr(&self, tok: Token) -> String {
        match tok.kind {
            TokenKind::Ident | TokenKind::String | TokenKind::Integer | TokenKind::Float => {
                self.lexer.interner().resolve(tok.literal).to_string()
            }
            TokenKind::Semicolon => {
                if self.lexer.interner().resolve(tok.literal).is_empty() {
                    "newline".to_string()
                } else {
                    "';'".to_string()
                }
            }
            _ => tok.kind.describe().to_string(),
        }
    }

    /// Records a diagnostic, honoring the same-line suppression and
    /// ten-error bailout `spec.md` §4.3 describes. Once bailed out, further
    /// calls are no-ops; callers check `self.bailed_out` to unwind the
    /// current production early.
    fn error(&mut self, pos: Pos, message: impl Into<String>) {
        if self.bailed_out {
            return;
        }
        let resolved = self.lexer.position(pos);
        let file = self.lexer.file_mut();
        if let Some(last) = file.errors().last() {
            if last.pos.line == resolved.line {
                return;
            }
        }
        if file.errors().len() > 10 {
            self.bailed_out = true;
            return;
        }
        file.errors_mut().add(resolved, message);
    }

    /// Sorts and dedups the file's error list and returns a snapshot of it.
    fn finish(mut self) -> Vec<CompileError> {
        let file = self.lexer.file_mut();
        file.errors_mut().sort_and_dedup();
        file.errors().iter().cloned().collect()
    }

    // ---- module grammar ----------------------------------------------

    fn parse_module(&mut self) -> Module<'a> {
        self.eat_expect(TokenKind::Module);
        let name_tok = self.eat();
        if name_tok.kind != TokenKind::String {
            let msg = format!("expected module name as a quoted string, got {}", self.token_repr(name_tok));
            self.error(name_tok.pos, msg);
        }

        let mut imports = Vec::new();
        let mut blocks = Vec::new();
        loop {
            self.eat_all(TokenKind::Semicolon);
            if self.bailed_out {
                break;
            }
            let tok = self.peek();
            match tok.kind {
                TokenKind::Import => imports.push(self.parse_import()),
                TokenKind::Pipe => blocks.push(BlockDecl::Pipe(self.parse_pipe())),
                TokenKind::Stub => blocks.push(BlockDecl::Stub(self.parse_stub())),
                TokenKind::Eof => break,
                _ => {
                    let msg = format!("expected 'import', 'pipe', or 'stub', got {}", self.token_repr(tok));
                    self.error(tok.pos, msg);
                    self.eat(); // avoid spinning on the same bad token forever
                }
            }
            if self.bailed_out {
                break;
            }
        }

        Module { name: name_tok.literal, name_pos: name_tok.pos, imports, blocks }
    }

    fn parse_import(&mut self) -> ImportDecl {
        let kw = self.eat();
        let tok = self.eat();
        if tok.kind != TokenKind::String {
            let msg = format!("expected string module path, got {}", self.token_repr(tok));
            self.error(tok.pos, msg);
        }
        ImportDecl { keyword_pos: kw.pos, path: tok.literal, path_pos: tok.pos, end: tok.pos }
    }

    fn parse_stub(&mut self) -> StubDecl<'a> {
        let kw = self.eat();
        let name = self.parse_block_name();
        let inputs = self.parse_port_list();
        let mut end = inputs.rbrace;
        let outputs = if self.peek().kind == TokenKind::LParen {
            let o = self.parse_port_list();
            end = o.rbrace;
            Some(o)
        } else {
            None
        };
        StubDecl { start: kw.pos, end, name, inputs, outputs }
    }

    fn parse_pipe(&mut self) -> PipeDecl<'a> {
        let kw = self.eat();
        let name = self.parse_block_name();
        let inputs = self.parse_port_list();
        let outputs = if self.peek().kind == TokenKind::LParen { Some(self.parse_port_list()) } else { None };
        let lbrace = self.eat_expect(TokenKind::LBrace);
        let body = self.parse_body();
        let rbrace = self.eat_expect(TokenKind::RBrace);
        PipeDecl {
            start: kw.pos,
            end: rbrace.pos,
            name,
            inputs,
            outputs,
            lbrace: lbrace.pos,
            rbrace: rbrace.pos,
            body,
            graph: None,
        }
    }

    fn parse_block_name(&mut self) -> Ident {
        let tok = self.eat_expect(TokenKind::Ident);
        Ident::local(tok.literal, tok.pos)
    }

    /// A parenthesized, comma-separated list of `name: type` fields, used
    /// for both a block's declared inputs and its declared outputs.
    fn parse_port_list(&mut self) -> FieldList<'a> {
        let lparen = self.eat_expect(TokenKind::LParen);
        let mut fields = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RParen | TokenKind::Eof) {
            if self.bailed_out {
                break;
            }
            let entry = self.parse_expression(TokenKind::Comma);
            match entry {
                Expr::Field(f) => fields.push(f),
                other => self.error(other.start(), "expected 'name: type' pair"),
            }
            if !self.consume_list_separator(TokenKind::RParen) {
                break;
            }
        }
        let rparen = self.eat_expect(TokenKind::RParen);
        FieldList { lbrace: lparen.pos, fields: self.arena.fields.alloc_slice(fields), rbrace: rparen.pos }
    }

    /// Eats a trailing `,` if present. Returns `false` (without consuming
    /// anything) once the list's closer is next, or records an error and
    /// returns `false` if neither a separator nor the closer appears —
    /// either way the caller should stop looping.
    fn consume_list_separator(&mut self, closer: TokenKind) -> bool {
        let next = self.peek();
        if next.kind == TokenKind::Comma {
            self.eat();
            true
        } else if next.kind == closer {
            false
        } else {
            let msg = format!("expected ',' or {}, got {}", closer.describe(), self.token_repr(next));
            self.error(next.pos, msg);
            false
        }
    }

    fn parse_body(&mut self) -> &'a [Stmt<'a>] {
        let mut stmts = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace | TokenKind::Eof) {
            if self.bailed_out {
                break;
            }
            stmts.push(self.parse_stmt());
            self.eat_all(TokenKind::Semicolon);
        }
        self.arena.stmts.alloc_slice(stmts)
    }

    fn parse_stmt(&mut self) -> Stmt<'a> {
        if self.peek().kind == TokenKind::Return {
            let tok = self.eat();
            self.parse_return(tok)
        } else {
            Stmt::Expr(self.parse_expression_alloc(TokenKind::Invalid))
        }
    }

    /// `return` with no value, a single expression (`return B(v: a)`), or a
    /// bare comma-separated list of `key: value` fields wiring several
    /// declared outputs at once (`return o: B(), o2: 10.2`) — see
    /// `DESIGN.md` for why this is implemented at all.
    fn parse_return(&mut self, return_tok: Token) -> Stmt<'a> {
        if matches!(self.peek().kind, TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof) {
            return Stmt::Return(ReturnStmt { return_pos: return_tok.pos, value: None, end: return_tok.pos });
        }

        let first = self.parse_expression_alloc(TokenKind::Comma);
        if self.peek().kind != TokenKind::Comma {
            return Stmt::Return(ReturnStmt { return_pos: return_tok.pos, value: Some(first), end: first.end() });
        }

        let mut fields = Vec::new();
        self.expect_return_field(first, &mut fields);
        let mut end = first.end();
        while self.peek().kind == TokenKind::Comma {
            self.eat();
            if self.bailed_out {
                break;
            }
            let next = self.parse_expression_alloc(TokenKind::Comma);
            end = next.end();
            self.expect_return_field(next, &mut fields);
        }

        let synthetic = FieldList { lbrace: return_tok.pos, fields: self.arena.fields.alloc_slice(fields), rbrace: end };
        let value = self.arena.exprs.alloc(Expr::FieldListLit(synthetic));
        Stmt::Return(ReturnStmt { return_pos: return_tok.pos, value: Some(value), end })
    }

    fn expect_return_field(&mut self, expr: &'a Expr<'a>, out: &mut Vec<Field<'a>>) {
        match expr {
            Expr::Field(f) => out.push(*f),
            other => self.error(other.start(), "expected 'key: value' pair in multi-output return"),
        }
    }

    // ---- expression grammar --------------------------------------------

    fn parse_expression_alloc(&mut self, parent: TokenKind) -> &'a Expr<'a> {
        self.arena.exprs.alloc(self.parse_expression(parent))
    }

    fn parse_expression(&mut self, parent: TokenKind) -> Expr<'a> {
        let mut left = self.parse_prefix();
        loop {
            if self.bailed_out {
                return left;
            }
            let next = self.peek();
            if precedence(parent) >= precedence(next.kind) {
                return left;
            }
            left = self.parse_infix(left);
        }
    }

    fn alloc(&self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.arena.exprs.alloc(expr)
    }

    fn parse_prefix(&mut self) -> Expr<'a> {
        let tok = self.eat();
        match tok.kind {
            TokenKind::LParen => self.parse_paren(tok),
            TokenKind::Ident => self.parse_ident_expr(tok),
            TokenKind::String => Expr::Literal(LiteralExpr {
                pos: tok.pos,
                end: tok.pos,
                kind: LiteralKind::String,
                lexeme: tok.literal,
                value: LiteralValue::Str(tok.literal),
            }),
            TokenKind::Integer => self.parse_integer(tok),
            TokenKind::Float => self.parse_float(tok),
            TokenKind::LBrace => self.parse_field_list_literal(tok),
            _ => {
                let msg = format!("expected expression, got {}", self.token_repr(tok));
                self.error(tok.pos, msg);
                Expr::Ident(Ident::local(Symbol::EMPTY, tok.pos))
            }
        }
    }

    fn parse_ident_expr(&mut self, tok: Token) -> Expr<'a> {
        if self.peek().kind == TokenKind::Period {
            self.eat();
            let name_tok = self.eat_expect(TokenKind::Ident);
            Expr::Ident(Ident::qualified(tok.literal, tok.pos, name_tok.literal, name_tok.pos))
        } else {
            Expr::Ident(Ident::local(tok.literal, tok.pos))
        }
    }

    fn parse_integer(&mut self, tok: Token) -> Expr<'a> {
        let text = self.lexer.interner().resolve(tok.literal).to_string();
        let value = match text.parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                let msg = format!("invalid integer literal '{text}'");
                self.error(tok.pos, msg);
                0
            }
        };
        Expr::Literal(LiteralExpr {
            pos: tok.pos,
            end: tok.pos,
            kind: LiteralKind::Integer,
            lexeme: tok.literal,
            value: LiteralValue::Integer(value),
        })
    }

    fn parse_float(&mut self, tok: Token) -> Expr<'a> {
        let text = self.lexer.interner().resolve(tok.literal).to_string();
        let value = match text.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                let msg = format!("invalid float literal '{text}'");
                self.error(tok.pos, msg);
                0.0
            }
        };
        Expr::Literal(LiteralExpr {
            pos: tok.pos,
            end: tok.pos,
            kind: LiteralKind::Float,
            lexeme: tok.literal,
            value: LiteralValue::Float(value),
        })
    }

    fn parse_paren(&mut self, lparen: Token) -> Expr<'a> {
        let inner = self.parse_expression_alloc(TokenKind::Invalid);
        let rparen = self.eat_expect(TokenKind::RParen);
        Expr::Paren(ParenExpr { lparen: lparen.pos, inner, rparen: rparen.pos })
    }

    /// `{ key: value, ... }` — a field-list-literal, used as a bundle
    /// destructuring pattern on an assignment's left-hand side. Entries may
    /// be separated by `,` or `;` (`spec.md` §4.3).
    fn parse_field_list_literal(&mut self, lbrace: Token) -> Expr<'a> {
        let mut fields = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace | TokenKind::Eof) {
            if self.bailed_out {
                break;
            }
            let entry = self.parse_expression(TokenKind::Comma);
            match entry {
                Expr::Field(f) => fields.push(f),
                other => self.error(other.start(), "expected 'key: value' pair"),
            }
            let next = self.peek();
            if matches!(next.kind, TokenKind::Comma | TokenKind::Semicolon) {
                self.eat();
            } else if next.kind != TokenKind::RBrace {
                let msg = format!("expected ',' or '}}', got {}", self.token_repr(next));
                self.error(next.pos, msg);
                break;
            }
        }
        let rbrace = self.eat_expect(TokenKind::RBrace);
        let list = FieldList { lbrace: lbrace.pos, fields: self.arena.fields.alloc_slice(fields), rbrace: rbrace.pos };
        Expr::FieldListLit(list)
    }

    fn parse_infix(&mut self, left: Expr<'a>) -> Expr<'a> {
        let tok = self.eat();
        match tok.kind {
            TokenKind::Equals => self.parse_assign(left, tok),
            TokenKind::Colon => self.parse_field(left, tok),
            TokenKind::LParen => self.parse_call(left, tok),
            _ => {
                let msg = format!("expected expression, got {}", self.token_repr(tok));
                self.error(tok.pos, msg);
                left
            }
        }
    }

    /// Right-associative: the right-hand side is parsed with `=` itself as
    /// the parent precedence, so a chain `a = b = c` nests as `a = (b = c)`.
    fn parse_assign(&mut self, left: Expr<'a>, eq: Token) -> Expr<'a> {
        let lhs = self.alloc(left);
        let rhs = self.parse_expression_alloc(TokenKind::Equals);
        Expr::Assign(AssignExpr { lhs, eq: eq.pos, rhs })
    }

    fn parse_field(&mut self, left: Expr<'a>, colon: Token) -> Expr<'a> {
        let value = self.parse_expression_alloc(TokenKind::Colon);
        let key = match left {
            Expr::Ident(id) => id,
            other => {
                self.error(other.start(), "key of a 'key: value' pair must be a plain name");
                Ident::local(Symbol::EMPTY, colon.pos)
            }
        };
        Expr::Field(Field { key, colon: colon.pos, value })
    }

    fn parse_call(&mut self, left: Expr<'a>, lparen: Token) -> Expr<'a> {
        let callee = match left {
            Expr::Ident(id) => id,
            other => {
                self.error(other.start(), "expected a block name before '('");
                Ident::local(Symbol::EMPTY, lparen.pos)
            }
        };

        let mut args = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RParen | TokenKind::Eof) {
            if self.bailed_out {
                break;
            }
            let arg = self.parse_expression(TokenKind::Comma);
            args.push(arg);
            if !self.consume_list_separator(TokenKind::RParen) {
                break;
            }
        }
        let rparen = self.eat_expect(TokenKind::RParen);
        Expr::Call(CallExpr { callee, lparen: lparen.pos, args: self.arena.exprs.alloc_slice(args), rparen: rparen.pos })
    }
}

/// Parses a whole module: a header plus a sequence of imports, pipes, and
/// stubs. Recovers from errors at statement/declaration boundaries.
pub fn parse_module<'a>(
    file: &mut File,
    interner: &mut Interner,
    arena: &'a AstArena<'a>,
    source: &[u8],
) -> (Module<'a>, Vec<CompileError>) {
    let mut parser = Parser::new(file, interner, arena, source);
    let module = parser.parse_module();
    let errors = parser.finish();
    (module, errors)
}

/// Parses a single `pipe` or `stub` declaration (no module header).
pub fn parse_block<'a>(
    file: &mut File,
    interner: &mut Interner,
    arena: &'a AstArena<'a>,
    source: &[u8],
) -> (BlockDecl<'a>, Vec<CompileError>) {
    let mut parser = Parser::new(file, interner, arena, source);
    let tok = parser.peek();
    let decl = match tok.kind {
        TokenKind::Stub => BlockDecl::Stub(parser.parse_stub()),
        TokenKind::Pipe => BlockDecl::Pipe(parser.parse_pipe()),
        _ => {
            let msg = format!("expected 'pipe' or 'stub', got {}", parser.token_repr(tok));
            parser.error(tok.pos, msg);
            BlockDecl::Stub(StubDecl {
                start: tok.pos,
                end: tok.pos,
                name: Ident::local(Symbol::EMPTY, tok.pos),
                inputs: FieldList { lbrace: Pos::NONE, fields: &[], rbrace: Pos::NONE },
                outputs: None,
            })
        }
    };
    let errors = parser.finish();
    (decl, errors)
}

/// Parses a single expression. Mainly useful for tests and tools that want
/// to inspect how one snippet parses in isolation.
pub fn parse_expression<'a>(
    file: &mut File,
    interner: &mut Interner,
    arena: &'a AstArena<'a>,
    source: &[u8],
) -> (&'a Expr<'a>, Vec<CompileError>) {
    let mut parser = Parser::new(file, interner, arena, source);
    let expr = parser.parse_expression_alloc(TokenKind::Invalid);
    let errors = parser.finish();
    (expr, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LiteralValue;

    fn parse_expr(src: &str) -> (String, Vec<CompileError>) {
        let mut file = File::new("t.hs", src.len());
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (expr, errors) = parse_expression(&mut file, &mut interner, &arena, src.as_bytes());
        (format!("{expr:?}"), errors)
    }

    #[test]
    fn parses_identifier() {
        let (_, errors) = parse_expr("a");
        assert!(errors.is_empty());
    }

    #[test]
    fn parses_qualified_identifier() {
        let mut file = File::new("t.hs", 5);
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (expr, errors) = parse_expression(&mut file, &mut interner, &arena, b"m.f");
        assert!(errors.is_empty());
        match expr {
            Expr::Ident(id) => {
                assert!(!id.is_local());
                assert_eq!(interner.resolve(id.qualifier.unwrap()), "m");
                assert_eq!(interner.resolve(id.name), "f");
            }
            other => panic!("expected ident, got {other:?}"),
        }
    }

    #[test]
    fn parses_integer_and_float_literals() {
        let mut file = File::new("t.hs", 10);
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (expr, errors) = parse_expression(&mut file, &mut interner, &arena, b"12");
        assert!(errors.is_empty());
        match expr {
            Expr::Literal(l) => assert!(matches!(l.value, LiteralValue::Integer(12))),
            other => panic!("expected literal, got {other:?}"),
        }

        let mut file2 = File::new("t2.hs", 10);
        let mut interner2 = Interner::new();
        let arena2 = AstArena::new();
        let (expr2, _) = parse_expression(&mut file2, &mut interner2, &arena2, b"1.5");
        match expr2 {
            Expr::Literal(l) => assert!(matches!(l.value, LiteralValue::Float(f) if f == 1.5)),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn parses_named_call_argument() {
        let mut file = File::new("t.hs", 20);
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (expr, errors) = parse_expression(&mut file, &mut interner, &arena, b"B(a: 10)");
        assert!(errors.is_empty());
        match expr {
            Expr::Call(c) => {
                assert_eq!(interner.resolve(c.callee.name), "B");
                assert_eq!(c.args.len(), 1);
                assert!(matches!(c.args[0], Expr::Field(_)));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn parses_positional_and_nested_call() {
        let mut file = File::new("t.hs", 30);
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (expr, errors) = parse_expression(&mut file, &mut interner, &arena, b"B(10, C())");
        assert!(errors.is_empty());
        match expr {
            Expr::Call(c) => {
                assert_eq!(c.args.len(), 2);
                assert!(matches!(c.args[0], Expr::Literal(_)));
                assert!(matches!(c.args[1], Expr::Call(_)));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn parses_assignment_right_associative() {
        let (repr, errors) = parse_expr("a = b = c");
        assert!(errors.is_empty());
        // `a = (b = c)`: outer assign's rhs is itself an AssignExpr.
        assert!(repr.contains("Assign"));
    }

    #[test]
    fn parses_field_list_literal_pattern() {
        let mut file = File::new("t.hs", 40);
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (expr, errors) = parse_expression(&mut file, &mut interner, &arena, b"{c1: c1, c2: c2}");
        assert!(errors.is_empty());
        match expr {
            Expr::FieldListLit(fl) => assert_eq!(fl.fields.len(), 2),
            other => panic!("expected field list literal, got {other:?}"),
        }
    }

    #[test]
    fn parses_full_module() {
        let src = b"module \"a\"\nstub B(a: int) ()\npipe main() { B(a: 10) }\n";
        let mut file = File::new("t.hs", src.len());
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (module, errors) = parse_module(&mut file, &mut interner, &arena, src);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(interner.resolve(module.name), "a");
        assert_eq!(module.blocks.len(), 2);
    }

    #[test]
    fn reports_unknown_expression_start() {
        let mut file = File::new("t.hs", 2);
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (_, errors) = parse_expression(&mut file, &mut interner, &arena, b"=");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn bails_out_after_ten_errors() {
        // Eleven consecutive lines, each producing its own "expected
        // expression" error so same-line suppression never kicks in.
        let src = "=\n".repeat(20);
        let mut file = File::new("t.hs", src.len());
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (_, errors) = parse_module(&mut file, &mut interner, &arena, src.as_bytes());
        assert!(errors.len() <= 11, "got {} errors", errors.len());
    }

    #[test]
    fn parses_explicit_return_with_single_value() {
        let src = b"pipe main() (o: int) { return 10 }";
        let mut file = File::new("t.hs", src.len());
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (decl, errors) = parse_block(&mut file, &mut interner, &arena, src);
        assert!(errors.is_empty());
        let pipe = decl.as_pipe().unwrap();
        assert_eq!(pipe.body.len(), 1);
        assert!(matches!(pipe.body[0], Stmt::Return(_)));
    }

    #[test]
    fn parses_multi_output_return_as_field_list() {
        let src = b"pipe main() (o: int, o2: float) { return o: 10, o2: 1.5 }";
        let mut file = File::new("t.hs", src.len());
        let mut interner = Interner::new();
        let arena = AstArena::new();
        let (decl, errors) = parse_block(&mut file, &mut interner, &arena, src);
        assert!(errors.is_empty());
        let pipe = decl.as_pipe().unwrap();
        match pipe.body[0] {
            Stmt::Return(r) => match r.value.unwrap() {
                Expr::FieldListLit(fl) => assert_eq!(fl.fields.len(), 2),
                other => panic!("expected field list literal, got {other:?}"),
            },
            other => panic!("expected return, got {other:?}"),
        }
    }
}
