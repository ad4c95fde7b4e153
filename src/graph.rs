//! The per-pipe dataflow graph the tracer builds: a flat, index-addressed
//! DAG of block instances and typed edges between their ports.
//!
//! Blocks and edges are referenced by index rather than by pointer so a
//! `Graph` can be inspected, serialized, or replayed independently of the
//! AST that produced it (the AST outlives the graph within one compile, but
//! nothing here depends on that beyond the `created_by` back-reference).

use crate::ast::{Expr, LiteralKind};

/// Index into a [`Graph`]'s block vector. `ROOT_BLOCK` is a sentinel
/// standing for the enclosing pipe's own ports: its input ports when used
/// as an edge source, its output ports when used as an edge destination.
pub type BlockIdx = i32;

/// Index into a block's ordered input or output ports.
pub type PortIdx = usize;

pub const ROOT_BLOCK: BlockIdx = -1;

/// An address of one port within a graph: a block (or the sentinel root)
/// plus a port index on that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Loc {
    pub block: BlockIdx,
    pub port: PortIdx,
}

impl Loc {
    pub fn new(block: BlockIdx, port: PortIdx) -> Self {
        Loc { block, port }
    }

    pub fn root(port: PortIdx) -> Self {
        Loc { block: ROOT_BLOCK, port }
    }

    pub fn is_root(self) -> bool {
        self.block == ROOT_BLOCK
    }
}

/// The type carried by one stream. Equality is strict: no implicit widening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    Int,
    Float,
    String,
}

impl EdgeType {
    pub fn from_literal_kind(kind: LiteralKind) -> EdgeType {
        match kind {
            LiteralKind::Integer => EdgeType::Int,
            LiteralKind::Float => EdgeType::Float,
            LiteralKind::String => EdgeType::String,
        }
    }

    /// The spelling used in port-type declarations (`a: int`).
    pub fn type_name(self) -> &'static str {
        match self {
            EdgeType::Int => "int",
            EdgeType::Float => "float",
            EdgeType::String => "string",
        }
    }

    pub fn from_type_name(name: &str) -> Option<EdgeType> {
        Some(match name {
            "int" => EdgeType::Int,
            "float" => EdgeType::Float,
            "string" => EdgeType::String,
            _ => return None,
        })
    }
}

/// A typed, directed connection between two ports.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub edge_type: EdgeType,
    pub src: Loc,
    pub dst: Loc,
}

/// Identity reference to a declaration in a [`crate::ast::Module`]'s flat
/// block-declaration list — an index rather than a pointer, matching the
/// rest of the graph's "indices, never back-pointers" discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclId(pub usize);

/// One instance of a block within a pipe's graph.
pub enum Block<'a> {
    /// Invokes another pipe by declaration identity.
    Pipe {
        decl: DeclId,
        in_types: Vec<EdgeType>,
        out_types: Vec<EdgeType>,
        created_by: &'a Expr<'a>,
    },
    /// Invokes a host-provided stub by declaration identity.
    Stub {
        decl: DeclId,
        in_types: Vec<EdgeType>,
        out_types: Vec<EdgeType>,
        created_by: &'a Expr<'a>,
    },
    /// A constant value; no input ports, exactly one output port.
    Literal {
        expr: &'a Expr<'a>,
        out_type: EdgeType,
    },
}

impl<'a> Block<'a> {
    pub fn in_types(&self) -> &[EdgeType] {
        match self {
            Block::Pipe { in_types, .. } | Block::Stub { in_types, .. } => in_types,
            Block::Literal { .. } => &[],
        }
    }

    pub fn out_types(&self) -> &[EdgeType] {
        match self {
            Block::Pipe { out_types, .. } | Block::Stub { out_types, .. } => out_types,
            Block::Literal { out_type, .. } => std::slice::from_ref(out_type),
        }
    }

    pub fn created_by(&self) -> &'a Expr<'a> {
        match self {
            Block::Pipe { created_by, .. } | Block::Stub { created_by, .. } => created_by,
            Block::Literal { expr, .. } => expr,
        }
    }
}

/// A pipe's dataflow DAG: an ordered list of block instances plus the typed
/// edges wiring their ports together.
#[derive(Default)]
pub struct Graph<'a> {
    pub blocks: Vec<Block<'a>>,
    pub edges: Vec<Edge>,
}

impl<'a> Graph<'a> {
    pub fn new() -> Self {
        Graph { blocks: Vec::new(), edges: Vec::new() }
    }

    /// Appends a block and returns its freshly assigned index.
    pub fn push_block(&mut self, block: Block<'a>) -> BlockIdx {
        self.blocks.push(block);
        (self.blocks.len() - 1) as BlockIdx
    }

    pub fn block(&self, idx: BlockIdx) -> Option<&Block<'a>> {
        if idx < 0 {
            None
        } else {
            self.blocks.get(idx as usize)
        }
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Checks the well-formedness invariants from the graph's contract:
    /// every `Loc` is in range, every edge's source/destination types
    /// agree, and no input port receives more than one edge. Does *not*
    /// check acyclicity — the tracer's evaluation order (children appended
    /// before parents) makes cycles structurally unreachable.
    pub fn is_well_formed(&self, pipe_in_types: &[EdgeType], pipe_out_types: &[EdgeType]) -> bool {
        let port_type = |loc: Loc, is_dst: bool| -> Option<EdgeType> {
            if loc.is_root() {
                let ports = if is_dst { pipe_out_types } else { pipe_in_types };
                ports.get(loc.port).copied()
            } else {
                let block = self.block(loc.block)?;
                let ports = if is_dst { block.in_types() } else { block.out_types() };
                ports.get(loc.port).copied()
            }
        };

        let mut seen_dst: std::collections::HashSet<Loc> = std::collections::HashSet::new();
        for edge in &self.edges {
            let Some(src_ty) = port_type(edge.src, false) else { return false };
            let Some(dst_ty) = port_type(edge.dst, true) else { return false };
            if src_ty != edge.edge_type || dst_ty != edge.edge_type {
                return false;
            }
            if !edge.dst.is_root() && !seen_dst.insert(edge.dst) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loc_root_sentinel() {
        let root_in = Loc::root(0);
        assert!(root_in.is_root());
        let block_loc = Loc::new(2, 0);
        assert!(!block_loc.is_root());
    }

    #[test]
    fn edge_type_from_literal_kind() {
        assert_eq!(EdgeType::from_literal_kind(LiteralKind::Integer), EdgeType::Int);
        assert_eq!(EdgeType::from_literal_kind(LiteralKind::Float), EdgeType::Float);
        assert_eq!(EdgeType::from_literal_kind(LiteralKind::String), EdgeType::String);
    }

    #[test]
    fn empty_graph_is_well_formed() {
        let graph: Graph = Graph::new();
        assert!(graph.is_well_formed(&[], &[]));
    }

    #[test]
    fn out_of_range_root_port_is_not_well_formed() {
        let mut graph: Graph = Graph::new();
        graph.add_edge(Edge { edge_type: EdgeType::Int, src: Loc::root(0), dst: Loc::root(0) });
        assert!(!graph.is_well_formed(&[], &[])); // no root ports declared
    }

    #[test]
    fn matching_root_ports_are_well_formed() {
        let mut graph: Graph = Graph::new();
        graph.add_edge(Edge { edge_type: EdgeType::Int, src: Loc::root(0), dst: Loc::root(0) });
        assert!(graph.is_well_formed(&[EdgeType::Int], &[EdgeType::Int]));
    }
}
