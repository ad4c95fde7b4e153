//! Front-end toolchain for the Hoser dataflow language: turns source text
//! into a typed, index-addressed graph per module.
//!
//! ```text
//! source bytes -> lexer -> parser -> AST -> tracer -> Graph
//! ```
//!
//! Diagnostics accumulate on a [`position::File`]'s error list rather than
//! aborting a pass outright; every public entry point returns whatever
//! partial result it managed alongside the errors collected along the way.

pub mod ast;
pub mod graph;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod position;
pub mod token;
pub mod tracer;

pub use ast::{AstArena, Module};
pub use graph::{Block, BlockIdx, DeclId, EdgeType, Graph, Loc, PortIdx, ROOT_BLOCK};
pub use module::{CachedModule, ModuleSet};
pub use parser::{parse_block, parse_expression, parse_module};
pub use position::{CompileError, File, Pos, Position};
pub use tracer::{trace_module, Output};

pub use hoser_base::{Interner, Symbol};
