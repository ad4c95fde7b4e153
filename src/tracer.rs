//! Semantic analysis: turns each pipe's body into a typed, index-addressed
//! [`Graph`] by resolving names, matching call arguments to input ports, and
//! wiring typed edges.
//!
//! The tracer walks one pipe at a time with a small amount of state (a
//! growing `Graph` and a symbol table mapping bound names to *output
//! descriptors*). Nothing here ever fails outright: every problem is
//! recorded on the file's error list, the same same-line-suppression and
//! ten-error bailout policy the parser uses, and tracing continues with a
//! best-effort partial graph.

use std::collections::{HashMap, HashSet};

use hoser_base::{Interner, Symbol};

use crate::ast::{AssignExpr, BlockDecl, CallExpr, Expr, Field, FieldList, Ident, LiteralExpr, Module, PipeDecl, ReturnStmt, Stmt};
use crate::graph::{Block, BlockIdx, DeclId, Edge, EdgeType, Graph, Loc};
use crate::module::ModuleSet;
use crate::position::{CompileError, File, Pos};

/// What a traced expression evaluates to: nothing, a single stream, or a
/// named bundle of streams (used when a block declares two or more
/// outputs). Not meaningfully copyable — cloning duplicates the
/// descriptor, not the underlying stream, which is why every read from the
/// symbol table clones rather than moves.
#[derive(Debug, Clone)]
pub enum Output {
    Nil,
    One(Loc),
    Bundle(HashMap<Symbol, Output>),
}

/// Per-pipe tracing state: the graph under construction, the symbol table,
/// and the declared port types/names needed to wire the pipe's own
/// boundary (`Loc::root`).
struct PipeTrace<'a> {
    graph: Graph<'a>,
    symbols: HashMap<Symbol, Output>,
    in_types: Vec<EdgeType>,
    out_types: Vec<EdgeType>,
    out_fields: Option<FieldList<'a>>,
}

/// Traces every `pipe` declaration in `module`, writing each one's
/// resulting graph back into its `PipeDecl::graph` field, and returns the
/// accumulated (sorted, deduplicated) diagnostics.
///
/// `modules` optionally supplies already-parsed sibling modules for
/// resolving a qualified call's callee; per the tracer's contract, cross-
/// module resolution only needs a name-to-module lookup, not a recursive
/// parse-and-trace of the target (that loop is an external collaborator's
/// job).
pub fn trace_module<'a>(
    file: &mut File,
    interner: &Interner,
    module: &mut Module<'a>,
    modules: Option<&ModuleSet<'a>>,
) -> Vec<CompileError> {
    let graphs: Vec<(usize, Graph<'a>)>;
    let errors: Vec<CompileError>;
    {
        let snapshot: &Module<'a> = &*module;
        let mut tracer = Tracer { file, interner, module: snapshot, modules, bailed_out: false };
        let mut collected = Vec::new();
        for (idx, block) in snapshot.blocks.iter().enumerate() {
            if tracer.bailed_out {
                break;
            }
            if let BlockDecl::Pipe(pipe) = block {
                let graph = tracer.trace_pipe(pipe);
                collected.push((idx, graph));
            }
        }
        graphs = collected;
        errors = tracer.finish();
    }
    for (idx, graph) in graphs {
        if let BlockDecl::Pipe(pipe) = &mut module.blocks[idx] {
            pipe.graph = Some(graph);
        }
    }
    errors
}

struct Tracer<'f, 'i, 'm, 'a> {
    file: &'f mut File,
    interner: &'i Interner,
    module: &'m Module<'a>,
    modules: Option<&'m ModuleSet<'a>>,
    bailed_out: bool,
}

impl<'f, 'i, 'm, 'a> Tracer<'f, 'i, 'm, 'a> {
    fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn error(&mut self, pos: Pos, message: impl Into<String>) {
        if self.bailed_out {
            return;
        }
        let resolved = self.file.position(pos);
        if let Some(last) = self.file.errors().last() {
            if last.pos.line == resolved.line {
                return;
            }
        }
        if self.file.errors().len() > 10 {
            self.bailed_out = true;
            return;
        }
        self.file.errors_mut().add(resolved, message);
    }

    fn finish(mut self) -> Vec<CompileError> {
        self.file.errors_mut().sort_and_dedup();
        self.file.errors().iter().cloned().collect()
    }

    fn field_list_types(&self, list: &FieldList<'a>) -> Vec<EdgeType> {
        list.fields.iter().map(|f| self.type_of_field(f)).collect()
    }

    /// A declared port's type name is a plain identifier (`int`, `float`,
    /// `string`); anything else degrades to `Int` rather than panicking —
    /// the grammar only ever hands the tracer well-formed port
    /// declarations, and validating type-name spelling beyond the grammar
    /// is outside the tracer's stated error taxonomy.
    fn type_of_field(&self, field: &Field<'a>) -> EdgeType {
        if let Expr::Ident(id) = field.value {
            if id.is_local() {
                if let Some(t) = EdgeType::from_type_name(self.name(id.name)) {
                    return t;
                }
            }
        }
        EdgeType::Int
    }

    /// Resolves a call's callee to its declaration. A local name is looked
    /// up in the module currently being traced; a qualified name consults
    /// the module set for an already-loaded module of that name.
    fn resolve_callee(&self, callee: Ident) -> Option<(DeclId, &'m BlockDecl<'a>)> {
        if callee.is_local() {
            let idx = self.module.find_block_index(callee.name)?;
            Some((DeclId(idx), &self.module.blocks[idx]))
        } else {
            let cached = self.modules?.lookup(callee.qualifier?)?;
            let target = cached.module.as_ref()?;
            let idx = target.find_block_index(callee.name)?;
            Some((DeclId(idx), &target.blocks[idx]))
        }
    }

    fn trace_pipe(&mut self, pipe: &PipeDecl<'a>) -> Graph<'a> {
        let in_types = self.field_list_types(&pipe.inputs);
        let out_types = pipe.outputs.as_ref().map(|o| self.field_list_types(o)).unwrap_or_default();
        let mut state = PipeTrace {
            graph: Graph::new(),
            symbols: HashMap::new(),
            in_types,
            out_types,
            out_fields: pipe.outputs,
        };
        for (port, field) in pipe.inputs.fields.iter().enumerate() {
            state.symbols.insert(field.key.name, Output::One(Loc::root(port)));
        }

        for stmt in pipe.body {
            if self.bailed_out {
                break;
            }
            self.trace_stmt(*stmt, &mut state);
        }
        if !self.bailed_out {
            self.wire_named_outputs(&mut state);
        }
        state.graph
    }

    fn trace_stmt(&mut self, stmt: Stmt<'a>, state: &mut PipeTrace<'a>) {
        match stmt {
            Stmt::Expr(e) => {
                self.trace_expr(e, state);
            }
            Stmt::Return(r) => self.trace_return(r, state),
        }
    }

    fn trace_expr(&mut self, expr: &'a Expr<'a>, state: &mut PipeTrace<'a>) -> Output {
        if self.bailed_out {
            return Output::Nil;
        }
        match expr {
            Expr::Assign(a) => self.trace_assign(a, state),
            Expr::Call(c) => self.trace_call(expr, c, state),
            Expr::Ident(i) => self.trace_ident(*i, state),
            Expr::Literal(l) => self.trace_lit(expr, l, state),
            _ => Output::Nil,
        }
    }

    fn trace_call(&mut self, created_by: &'a Expr<'a>, call: &'a CallExpr<'a>, state: &mut PipeTrace<'a>) -> Output {
        let Some((decl_id, decl)) = self.resolve_callee(call.callee) else {
            let msg = format!("unable to find local pipe or stub with name {}", self.name(call.callee.name));
            self.error(call.callee.start(), msg);
            return Output::Nil;
        };

        let inputs = *decl.inputs();
        let outputs = decl.outputs().copied();

        if call.args.len() != inputs.fields.len() {
            let msg = format!(
                "wrong number of args for call to {}, expected {}, got {}",
                self.name(call.callee.name),
                inputs.fields.len(),
                call.args.len()
            );
            self.error(created_by.start(), msg);
        }

        let mut incoming: Vec<Option<Loc>> = vec![None; inputs.fields.len()];
        let mut used_ports: HashSet<usize> = HashSet::new();
        let mut named_used = false;
        for arg in call.args {
            if self.bailed_out {
                break;
            }
            let Some((port, value_expr)) = self.match_arg_to_input(arg, &inputs, &mut used_ports, &mut named_used)
            else {
                continue;
            };
            let traced = self.trace_expr(value_expr, state);
            match traced {
                Output::One(loc) => {
                    if port < incoming.len() {
                        incoming[port] = Some(loc);
                    }
                }
                _ => self.error(value_expr.start(), "expected a single output, got a different shape"),
            }
        }

        let in_types = self.field_list_types(&inputs);
        let out_types = outputs.map(|o| self.field_list_types(&o)).unwrap_or_default();
        let block = match decl {
            BlockDecl::Pipe(_) => Block::Pipe { decl: decl_id, in_types, out_types, created_by },
            BlockDecl::Stub(_) => Block::Stub { decl: decl_id, in_types, out_types, created_by },
        };
        let this_block = state.graph.push_block(block);
        for (port, loc) in incoming.into_iter().enumerate() {
            if let Some(src) = loc {
                self.connect(src, Loc::new(this_block, port), state, created_by.start());
            }
        }

        Self::make_output_bundle(this_block, outputs.as_ref())
    }

    /// Matches one call argument to a declared input port. A named arg
    /// (`key: value`) binds to the port whose declared key matches; a
    /// positional arg fills the next unused port left-to-right and may not
    /// follow a named one.
    fn match_arg_to_input(
        &mut self,
        arg: &'a Expr<'a>,
        inputs: &FieldList<'a>,
        used_ports: &mut HashSet<usize>,
        named_used: &mut bool,
    ) -> Option<(usize, &'a Expr<'a>)> {
        if let Expr::Field(field) = arg {
            let Some(idx) = inputs.fields.iter().position(|f| f.key.name == field.key.name) else {
                let msg = format!("no input found with name {}", self.name(field.key.name));
                self.error(field.key.start(), msg);
                return None;
            };
            if !used_ports.insert(idx) {
                let msg = format!("already used argument with name {}", self.name(field.key.name));
                self.error(field.key.start(), msg);
                return None;
            }
            *named_used = true;
            Some((idx, field.value))
        } else {
            if *named_used {
                self.error(arg.start(), "positional arg cannot be after named arg");
                return None;
            }
            let idx = used_ports.len();
            if idx >= inputs.fields.len() {
                let msg = format!("too many arguments, expected {} got {}", inputs.fields.len(), idx + 1);
                self.error(arg.start(), msg);
                return None;
            }
            used_ports.insert(idx);
            Some((idx, arg))
        }
    }

    fn connect(&mut self, src: Loc, dst: Loc, state: &mut PipeTrace<'a>, error_pos: Pos) {
        let src_type = Self::port_type(state, src, false);
        let dst_type = Self::port_type(state, dst, true);
        match (src_type, dst_type) {
            (Some(s), Some(d)) if s == d => state.graph.add_edge(Edge { edge_type: s, src, dst }),
            (Some(s), Some(d)) => {
                let msg = format!("type mismatch: got {}, expected {}", s.type_name(), d.type_name());
                self.error(error_pos, msg);
            }
            _ => self.error(error_pos, "port index out of range"),
        }
    }

    fn port_type(state: &PipeTrace<'a>, loc: Loc, is_dst: bool) -> Option<EdgeType> {
        if loc.is_root() {
            let ports = if is_dst { &state.out_types } else { &state.in_types };
            ports.get(loc.port).copied()
        } else {
            let block = state.graph.block(loc.block)?;
            let ports = if is_dst { block.in_types() } else { block.out_types() };
            ports.get(loc.port).copied()
        }
    }

    fn make_output_bundle(block: BlockIdx, outputs: Option<&FieldList<'_>>) -> Output {
        let Some(out_fields) = outputs else { return Output::Nil };
        match out_fields.fields.len() {
            0 => Output::Nil,
            1 => Output::One(Loc::new(block, 0)),
            _ => {
                let mut bundle = HashMap::new();
                for (port, field) in out_fields.fields.iter().enumerate() {
                    bundle.insert(field.key.name, Output::One(Loc::new(block, port)));
                }
                Output::Bundle(bundle)
            }
        }
    }

    fn trace_ident(&mut self, ident: Ident, state: &PipeTrace<'a>) -> Output {
        match state.symbols.get(&ident.name) {
            Some(out) => out.clone(),
            None => {
                let msg = format!("no symbol found with name {}", self.name(ident.name));
                self.error(ident.start(), msg);
                Output::Nil
            }
        }
    }

    fn trace_lit(&mut self, expr: &'a Expr<'a>, lit: &LiteralExpr, state: &mut PipeTrace<'a>) -> Output {
        let edge_type = EdgeType::from_literal_kind(lit.kind);
        let idx = state.graph.push_block(Block::Literal { expr, out_type: edge_type });
        Output::One(Loc::new(idx, 0))
    }

    fn trace_assign(&mut self, assign: &'a AssignExpr<'a>, state: &mut PipeTrace<'a>) -> Output {
        let rhs = self.trace_expr(assign.rhs, state);
        self.unify_expr(assign.lhs, rhs.clone(), state);
        rhs
    }

    fn unify_expr(&mut self, pattern: &'a Expr<'a>, rhs: Output, state: &mut PipeTrace<'a>) {
        match pattern {
            Expr::Ident(id) => self.unify_one(*id, rhs, state),
            Expr::FieldListLit(fl) => self.unify_bundle(fl, rhs, state),
            other => self.error(other.start(), "expected a variable name or a map of variables"),
        }
    }

    fn unify_one(&mut self, pattern: Ident, rhs: Output, state: &mut PipeTrace<'a>) {
        state.symbols.insert(pattern.name, rhs);
    }

    /// Binds each `key: value` entry's *value* pattern against the matching
    /// output in the bundle named by `key` — not `key` itself, so a rename
    /// like `{a: x, b: y} = C()` binds `x`/`y`, not `a`/`b`.
    fn unify_bundle(&mut self, pattern: &FieldList<'a>, rhs: Output, state: &mut PipeTrace<'a>) {
        let Output::Bundle(mut bundle) = rhs else {
            self.error(pattern.lbrace, "expected more than one output on right side of assignment");
            return;
        };
        for field in pattern.fields {
            match bundle.remove(&field.key.name) {
                Some(found) => self.unify_expr(field.value, found, state),
                None => self.error(field.key.start(), "name does not match any output on right side of assignment"),
            }
        }
    }

    /// Wires every symbol whose name matches one of the pipe's declared
    /// output fields to that output's root port; runs after the whole body
    /// has traced, so an output bound on the last line of the pipe is
    /// picked up the same as one bound on the first.
    fn wire_named_outputs(&mut self, state: &mut PipeTrace<'a>) {
        let Some(out_fields) = state.out_fields else { return };
        for (port, field) in out_fields.fields.iter().enumerate() {
            if let Some(output) = state.symbols.get(&field.key.name).cloned() {
                match output {
                    Output::One(loc) => self.connect(loc, Loc::root(port), state, field.key.start()),
                    Output::Nil => {}
                    Output::Bundle(_) => {
                        self.error(field.key.start(), "expected a single output for a pipe output")
                    }
                }
            }
        }
    }

    /// Supplemented beyond the baseline name-matching wiring above: an
    /// explicit `return <expr>` wires a single output to the pipe's own
    /// (sole) output port, while `return k1: e1, k2: e2, ...` wires each
    /// `ki` by name against the pipe's declared outputs.
    fn trace_return(&mut self, ret: ReturnStmt<'a>, state: &mut PipeTrace<'a>) {
        let Some(value) = ret.value else { return };
        if let Expr::FieldListLit(fl) = value {
            for field in fl.fields {
                let traced = self.trace_expr(field.value, state);
                let Output::One(loc) = traced else {
                    if !matches!(traced, Output::Nil) {
                        self.error(field.value.start(), "expected a single output per named return value");
                    }
                    continue;
                };
                match state.out_fields.and_then(|of| of.fields.iter().position(|f| f.key.name == field.key.name)) {
                    Some(port) => self.connect(loc, Loc::root(port), state, field.value.start()),
                    None => self.error(field.key.start(), "name does not match any declared output"),
                }
            }
        } else {
            let traced = self.trace_expr(value, state);
            match traced {
                Output::One(loc) => self.connect(loc, Loc::root(0), state, ret.return_pos),
                Output::Nil => {}
                Output::Bundle(_) => self.error(value.start(), "expected a single output for return"),
            }
        }
    }
}
