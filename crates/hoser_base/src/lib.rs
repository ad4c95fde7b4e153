//! # hoser-base
//!
//! Pure structural atoms for the hoser ecosystem.
//!
//! This crate has no knowledge of the hoser grammar or of file I/O. It
//! provides only generic, reusable infrastructure that the main `hoser`
//! crate builds on top of:
//!
//! - [`Arena`] - bump allocation for stable AST references
//! - [`Interner`]/[`Symbol`] - string interning for O(1) equality

pub mod arena;
pub mod intern;

pub use arena::Arena;
pub use intern::{Interner, Symbol, SymbolEq};
