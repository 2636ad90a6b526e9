//! Assertion discharge: turning a converged state map into pass/fail
//! diagnostics with concrete witnesses backing every verdict.

use crate::cfg::ControlFlowGraph;
use crate::domain::AbstractDomain;
use crate::model::{Command, OrCondition};
use std::fmt;

/// The outcome of discharging one assertion against one abstract state.
/// `W` is the domain's witness type (a parity tuple, an equation set, or
/// a relational-product pair).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssertionOutcome<W> {
    /// Every concrete state consistent with the abstract state satisfies
    /// the condition (including vacuously, on an unreachable/`bottom`
    /// state).
    Verified,
    /// At least one abstract element disproves the condition; the
    /// witnesses are the elements that disprove it, for diagnostics.
    Violated { witnesses: Vec<W> },
    /// The domain cannot decide the condition on its own (e.g. a `Sum`
    /// predicate asked of a pure parity analysis).
    Unverifiable { reason: String },
}

/// An assertion discharged at a specific edge, with its rendered
/// condition for human-readable reporting.
pub struct AssertionReport<W> {
    pub node: usize,
    pub condition: String,
    pub outcome: AssertionOutcome<W>,
}

impl<W: fmt::Debug> fmt::Display for AssertionReport<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AssertionOutcome::Verified => write!(f, "[node {}] assert({}) — verified", self.node, self.condition),
            AssertionOutcome::Violated { witnesses } => {
                write!(f, "[node {}] assert({}) — violated, witnesses: {:?}", self.node, self.condition, witnesses)
            }
            AssertionOutcome::Unverifiable { reason } => {
                write!(f, "[node {}] assert({}) — unverifiable: {}", self.node, self.condition, reason)
            }
        }
    }
}

/// Walk every `Assert` edge in the CFG, evaluating its condition against
/// the state reaching the edge's source node, via `evaluate`.
pub fn discharge_assertions<D, W>(
    cfg: &ControlFlowGraph,
    domain: &D,
    states: &[D::State],
    evaluate: impl Fn(&D, &D::State, &OrCondition) -> AssertionOutcome<W>,
) -> Vec<AssertionReport<W>>
where
    D: AbstractDomain,
{
    let mut reports = Vec::new();
    for edge in cfg.edges() {
        if let Command::Assert(orc) = &edge.command {
            let outcome = evaluate(domain, &states[edge.from], orc);
            reports.push(AssertionReport { node: edge.from, condition: orc.to_string(), outcome });
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::CfgEdge;
    use crate::domain::parity::{Parity, ParityAnalyzer, ParityTuple};
    use crate::lattice::{Lattice, VarId, Variables};
    use crate::model::{AndCondition, BoolCondition};

    #[test]
    fn discharge_collects_only_assert_edges() {
        let vars = Variables::new(vec!["x".into()]);
        let analyzer = ParityAnalyzer::new(vars);
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Even(VarId(0))])]);
        let cfg = ControlFlowGraph::new(
            2,
            vec![
                CfgEdge { from: 0, to: 1, command: Command::AssignConst { i: VarId(0), k: 4 } },
                CfgEdge { from: 1, to: 1, command: Command::Assert(orc.clone()) },
            ],
        )
        .unwrap();
        let states = vec![analyzer.top(), analyzer.transform(&analyzer.top(), &cfg.edge(0).command)];
        let reports = discharge_assertions(&cfg, &analyzer, &states, |a: &ParityAnalyzer, s, o| a.evaluate(s, o));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, AssertionOutcome::<ParityTuple>::Verified);
        let _ = Parity::Even;
    }
}
