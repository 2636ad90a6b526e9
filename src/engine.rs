//! The chaotic-iteration fixpoint engine: a pure function from a
//! control-flow graph and an [`AbstractDomain`] to a per-node state map,
//! plus the `vanilla`/`chaotic` strategy selector and the top-level
//! `analyze` entry point that wires a domain, a fixpoint strategy and the
//! assertion reporter together the way an external driver would.

use crate::cfg::ControlFlowGraph;
use crate::diagnostics::{discharge_assertions, AssertionReport};
use crate::domain::cartesian::{CartesianAnalyzer, CartesianState};
use crate::domain::linear::{EquationSet, LeAnalyzer, Universe};
use crate::domain::parity::{ParityAnalyzer, ParitySet, ParityTuple};
use crate::domain::relational::{RelationalAnalyzer, RelationalState};
use crate::domain::{AbstractDomain, PairWitness};
use crate::error::{AnalysisError, ShapeError, UniverseError};
use crate::lattice::Variables;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Which fixpoint algorithm to run. Both must agree on every finite
/// monotone input; `chaotic` is the one worth using in practice,
/// `vanilla` is kept as an equally first-class alternative since it is
/// the simplest thing to prove correct against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Vanilla,
    Chaotic,
}

/// Which abstract domain to analyze with, mirroring the recognized
/// `domain` configuration option.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainKind {
    Parity,
    Le,
    Cartesian,
    Relational,
}

/// The recognized analyzer configuration: which variables exist, the
/// bounded universe the linear-equalities domains operate in, which
/// fixpoint strategy to run, and which domain to run it with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub variables: Variables,
    pub coefficient_range: (i64, i64),
    pub integer_range: (i64, i64),
    pub strategy: Strategy,
    pub domain: DomainKind,
}

impl AnalyzerConfig {
    fn universe(&self) -> Result<Universe, UniverseError> {
        let (c_min, c_max) = self.coefficient_range;
        if c_min > c_max {
            return Err(UniverseError::EmptyCoefficientRange { min: c_min, max: c_max });
        }
        let (m_min, m_max) = self.integer_range;
        if m_min > m_max {
            return Err(UniverseError::EmptyIntegerRange { min: m_min, max: m_max });
        }
        Ok(Universe::new(self.variables.clone(), self.coefficient_range, self.integer_range))
    }
}

/// Recompute `node`'s state as the join of `transform(state[pred], cmd)`
/// across every edge incoming to `node`. Returns `None` for a node with no
/// incoming edges (the entry, by the single-entry shape invariant) since
/// such a node's state is seeded externally, never derived from
/// predecessors.
fn recompute<D: AbstractDomain>(cfg: &ControlFlowGraph, domain: &D, states: &[D::State], node: usize) -> Option<D::State> {
    let incoming = cfg.incoming(node);
    if incoming.is_empty() {
        return None;
    }
    let mut acc = domain.bottom();
    for &edge_idx in incoming {
        let edge = cfg.edge(edge_idx);
        let transformed = domain.transform(&states[edge.from], &edge.command);
        acc = domain.join(&acc, &transformed);
    }
    Some(acc)
}

/// Round-robin Kleene iteration: recompute every node on every pass until
/// the whole mapping is unchanged from the previous pass.
pub fn run_vanilla<D: AbstractDomain>(cfg: &ControlFlowGraph, domain: &D) -> Result<Vec<D::State>, ShapeError> {
    let entry = cfg.find_entry()?;
    let n = cfg.node_count();
    let mut states: Vec<D::State> = (0..n).map(|_| domain.bottom()).collect();
    states[entry] = domain.top();

    loop {
        let mut changed = false;
        let mut next = states.clone();
        for node in 0..n {
            if let Some(recomputed) = recompute(cfg, domain, &states, node) {
                if recomputed != states[node] {
                    changed = true;
                }
                next[node] = recomputed;
            }
        }
        states = next;
        if !changed {
            return Ok(states);
        }
    }
}

/// Worklist iteration: seed the worklist with every node, and on each pop
/// only requeue a node's successors if its recomputed state actually
/// changed. Order-independent on a finite monotone system.
pub fn run_chaotic<D: AbstractDomain>(cfg: &ControlFlowGraph, domain: &D) -> Result<Vec<D::State>, ShapeError> {
    let entry = cfg.find_entry()?;
    let n = cfg.node_count();
    let mut states: Vec<D::State> = (0..n).map(|_| domain.bottom()).collect();
    states[entry] = domain.top();

    let mut in_worklist: HashSet<usize> = (0..n).collect();
    let mut worklist: VecDeque<usize> = (0..n).collect();

    while let Some(node) = worklist.pop_front() {
        in_worklist.remove(&node);
        let Some(recomputed) = recompute(cfg, domain, &states, node) else {
            continue;
        };
        if recomputed == states[node] {
            continue;
        }
        states[node] = recomputed;
        for succ in cfg.successors(node) {
            if in_worklist.insert(succ) {
                worklist.push_back(succ);
            }
        }
    }
    Ok(states)
}

/// Run whichever strategy `strategy` names.
pub fn run<D: AbstractDomain>(cfg: &ControlFlowGraph, domain: &D, strategy: Strategy) -> Result<Vec<D::State>, ShapeError> {
    match strategy {
        Strategy::Vanilla => run_vanilla(cfg, domain),
        Strategy::Chaotic => run_chaotic(cfg, domain),
    }
}

/// The converged per-node states plus discharged assertions for whichever
/// domain [`AnalyzerConfig::domain`] named. Each variant's witness type is
/// that domain's own (a parity tuple, an equation set, or a
/// tuple/equation-set pair).
pub enum AnalysisOutput {
    Parity { states: Vec<ParitySet>, assertions: Vec<AssertionReport<ParityTuple>> },
    Le { states: Vec<EquationSet>, assertions: Vec<AssertionReport<EquationSet>>, warnings: Vec<String> },
    Cartesian { states: Vec<CartesianState>, assertions: Vec<AssertionReport<PairWitness>> },
    Relational { states: Vec<RelationalState>, assertions: Vec<AssertionReport<PairWitness>> },
}

/// Build the domain `config` names, run the fixpoint engine, and discharge
/// every `assert` edge against the converged states — the whole
/// parser-to-diagnostics pipeline minus the parser.
pub fn analyze(config: &AnalyzerConfig, cfg: &ControlFlowGraph) -> Result<AnalysisOutput, AnalysisError> {
    match config.domain {
        DomainKind::Parity => {
            let analyzer = ParityAnalyzer::new(config.variables.clone());
            let states = run(cfg, &analyzer, config.strategy)?;
            let assertions = discharge_assertions(cfg, &analyzer, &states, |a, s, o| a.evaluate(s, o));
            Ok(AnalysisOutput::Parity { states, assertions })
        }
        DomainKind::Le => {
            let universe = config.universe()?;
            let analyzer = LeAnalyzer::new(universe);
            let states = run(cfg, &analyzer, config.strategy)?;
            let assertions = discharge_assertions(cfg, &analyzer, &states, |a, s, o| a.evaluate(s, o));
            let warnings = analyzer.warnings();
            Ok(AnalysisOutput::Le { states, assertions, warnings })
        }
        DomainKind::Cartesian => {
            let universe = config.universe()?;
            let analyzer = CartesianAnalyzer::new(config.variables.clone(), universe);
            let states = run(cfg, &analyzer, config.strategy)?;
            let assertions = discharge_assertions(cfg, &analyzer, &states, |a, s, o| a.evaluate(s, o));
            Ok(AnalysisOutput::Cartesian { states, assertions })
        }
        DomainKind::Relational => {
            let universe = config.universe()?;
            let analyzer = RelationalAnalyzer::new(config.variables.clone(), universe);
            let states = run(cfg, &analyzer, config.strategy)?;
            let assertions = discharge_assertions(cfg, &analyzer, &states, |a, s, o| a.evaluate(s, o));
            Ok(AnalysisOutput::Relational { states, assertions })
        }
    }
}
