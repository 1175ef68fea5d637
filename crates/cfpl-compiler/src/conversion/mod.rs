//! Implicit conversion graph.
//!
//! A [`ConversionGraph`] stores single-step coercions between scalar types and
//! answers "can A become B, and what has to be emitted to get there" with a
//! [`Chain`] of steps.
//!
//! ## Search
//!
//! Edges are bucketed by destination type. [`ConversionGraph::chain`] runs a
//! breadth-first search that starts at the destination and walks edges
//! backward, so the first time the source is reached the back-links already
//! read in forward order:
//!
//! ```text
//!   chain(BOOL, FLOAT)
//!
//!   depth 0   FLOAT
//!   depth 1   INT    (INT -> FLOAT)
//!   depth 2   CHAR   (CHAR -> INT)
//!   depth 3   BOOL   (BOOL -> CHAR)      found
//!
//!   result    BOOL -> CHAR -> INT -> FLOAT
//! ```
//!
//! The chain always has the minimum number of edges. Among several shortest
//! chains, the one found first wins, which is fixed by the order edges were
//! registered into each bucket.
//!
//! Two graphs are used by the compiler, see [`widening`] and [`permissive`].

mod builtin;

pub use builtin::{permissive, widening};

use cfpl_core::Type;

use crate::emit::{Action, CodeBuffer};

/// One directed, single-step coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionEdge {
    /// Source type.
    pub from: Type,
    /// Destination type.
    pub to: Type,
    /// Code that performs the step.
    pub action: Action,
}

/// A path of coercions from one type to another.
///
/// An empty chain means no conversion is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    steps: Vec<ConversionEdge>,
}

impl Chain {
    /// The empty chain.
    pub fn identity() -> Self {
        Self::default()
    }

    /// The steps in application order.
    pub fn steps(&self) -> &[ConversionEdge] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no conversion is needed.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Emit every step's action in order.
    pub fn apply(&self, code: &mut CodeBuffer) {
        for step in &self.steps {
            step.action.emit(code);
        }
    }
}

/// Directed graph of single-step type coercions.
#[derive(Debug, Clone, Default)]
pub struct ConversionGraph {
    /// Edges bucketed by destination type, in registration order.
    incoming: [Vec<ConversionEdge>; Type::COUNT],
}

impl ConversionGraph {
    /// Create a graph with no edges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a coercion from `from` to `to`.
    ///
    /// Registering the same pair again replaces its action and keeps its
    /// original position. Self edges are ignored; every type converts to
    /// itself through the empty chain.
    pub fn add(&mut self, from: Type, to: Type, action: Action) {
        if from == to {
            return;
        }
        let bucket = &mut self.incoming[to.index()];
        match bucket.iter_mut().find(|edge| edge.from == from) {
            Some(edge) => edge.action = action,
            None => bucket.push(ConversionEdge { from, to, action }),
        }
    }

    /// Edges ending at `to`, in registration order.
    pub fn edges_into(&self, to: Type) -> &[ConversionEdge] {
        &self.incoming[to.index()]
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.incoming.iter().map(Vec::len).sum()
    }

    /// Find the shortest chain converting `from` into `to`.
    ///
    /// Returns `None` when `to` is unreachable from `from`.
    pub fn chain(&self, from: Type, to: Type) -> Option<Chain> {
        if from == to {
            return Some(Chain::identity());
        }

        // Search nodes with a back-link toward `to` and the edge that
        // reached them.
        struct Node {
            ty: Type,
            toward: Option<usize>,
            edge: Option<ConversionEdge>,
        }

        let mut seen = [false; Type::COUNT];
        let mut nodes = vec![Node {
            ty: to,
            toward: None,
            edge: None,
        }];
        seen[to.index()] = true;

        let mut next = 0;
        while next < nodes.len() {
            let current = nodes[next].ty;
            for edge in self.edges_into(current) {
                if seen[edge.from.index()] {
                    continue;
                }
                seen[edge.from.index()] = true;
                nodes.push(Node {
                    ty: edge.from,
                    toward: Some(next),
                    edge: Some(*edge),
                });

                if edge.from == from {
                    let mut steps = Vec::new();
                    let mut at = Some(nodes.len() - 1);
                    while let Some(index) = at {
                        let node = &nodes[index];
                        steps.extend(node.edge);
                        at = node.toward;
                    }
                    tracing::trace!(%from, %to, steps = steps.len(), "conversion chain");
                    return Some(Chain { steps });
                }
            }
            next += 1;
        }

        tracing::trace!(%from, %to, "no conversion chain");
        None
    }

    /// Whether `from` can be converted into `to`.
    pub fn can_convert(&self, from: Type, to: Type) -> bool {
        self.chain(from, to).is_some()
    }
}
