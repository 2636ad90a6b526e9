//! The control-flow graph the fixpoint engine runs over. This is a plain
//! labeled-graph data structure, not a builder: something outside this
//! crate is expected to parse program text and construct one of these.

use crate::error::ShapeError;
use crate::model::Command;

/// A single edge, labeled with the command executed when control flows
/// from `from` to `to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CfgEdge {
    pub from: usize,
    pub to: usize,
    pub command: Command,
}

/// A control-flow graph over `node_count` program points. Incoming and
/// outgoing adjacency is precomputed at construction time since the
/// fixpoint engine walks both repeatedly.
#[derive(Clone, Debug)]
pub struct ControlFlowGraph {
    node_count: usize,
    edges: Vec<CfgEdge>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
}

impl ControlFlowGraph {
    /// Build a graph from its edge list, validating that every edge
    /// references a node within `0..node_count`.
    pub fn new(node_count: usize, edges: Vec<CfgEdge>) -> Result<Self, ShapeError> {
        let mut incoming = vec![Vec::new(); node_count];
        let mut outgoing = vec![Vec::new(); node_count];
        for (idx, edge) in edges.iter().enumerate() {
            if edge.from >= node_count {
                return Err(ShapeError::UnknownNode(edge.from));
            }
            if edge.to >= node_count {
                return Err(ShapeError::UnknownNode(edge.to));
            }
            outgoing[edge.from].push(idx);
            incoming[edge.to].push(idx);
        }
        Ok(ControlFlowGraph { node_count, edges, incoming, outgoing })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edges(&self) -> &[CfgEdge] {
        &self.edges
    }

    pub fn edge(&self, idx: usize) -> &CfgEdge {
        &self.edges[idx]
    }

    /// Indices into `edges()` of every edge ending at `node`.
    pub fn incoming(&self, node: usize) -> &[usize] {
        &self.incoming[node]
    }

    /// Indices into `edges()` of every edge starting at `node`.
    pub fn outgoing(&self, node: usize) -> &[usize] {
        &self.outgoing[node]
    }

    /// The distinct successor nodes reachable directly from `node`.
    pub fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.outgoing[node].iter().map(move |&idx| self.edges[idx].to)
    }

    /// The single node with no incoming edges. A well-formed program has
    /// exactly one; zero or more than one is a shape error.
    pub fn find_entry(&self) -> Result<usize, ShapeError> {
        let candidates: Vec<usize> = (0..self.node_count).filter(|&n| self.incoming[n].is_empty()).collect();
        match candidates.len() {
            0 => Err(ShapeError::NoEntry),
            1 => Ok(candidates[0]),
            _ => Err(ShapeError::MultipleEntries(candidates)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::VarId;

    fn edge(from: usize, to: usize) -> CfgEdge {
        CfgEdge { from, to, command: Command::Skip }
    }

    #[test]
    fn single_entry_is_found() {
        let cfg = ControlFlowGraph::new(3, vec![edge(0, 1), edge(1, 2)]).unwrap();
        assert_eq!(cfg.find_entry().unwrap(), 0);
    }

    #[test]
    fn no_entry_is_rejected() {
        let cfg = ControlFlowGraph::new(2, vec![edge(0, 1), edge(1, 0)]).unwrap();
        assert_eq!(cfg.find_entry(), Err(ShapeError::NoEntry));
    }

    #[test]
    fn multiple_entries_are_rejected() {
        let cfg = ControlFlowGraph::new(3, vec![edge(0, 2), edge(1, 2)]).unwrap();
        match cfg.find_entry() {
            Err(ShapeError::MultipleEntries(mut nodes)) => {
                nodes.sort_unstable();
                assert_eq!(nodes, vec![0, 1]);
            }
            other => panic!("expected MultipleEntries, got {other:?}"),
        }
    }

    #[test]
    fn unknown_node_is_rejected() {
        let err = ControlFlowGraph::new(2, vec![edge(0, 5)]).unwrap_err();
        assert_eq!(err, ShapeError::UnknownNode(5));
    }

    #[test]
    fn successors_follow_outgoing_edges() {
        let cfg = ControlFlowGraph::new(
            3,
            vec![
                CfgEdge { from: 0, to: 1, command: Command::AssignConst { i: VarId(0), k: 4 } },
                CfgEdge { from: 0, to: 2, command: Command::Skip },
            ],
        )
        .unwrap();
        let mut succ: Vec<usize> = cfg.successors(0).collect();
        succ.sort_unstable();
        assert_eq!(succ, vec![1, 2]);
    }
}
