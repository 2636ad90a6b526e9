//! The parity domain: tracks whether each variable is even or odd.
//!
//! A single variable's parity carries no top or bottom of its own — those
//! only appear once tuples are lifted into the disjunctive-completion set
//! (`ParitySet`). Commands that are not deterministic at the tuple level
//! (`i := ?`) are modeled as producing *several* result tuples rather than
//! one; the analyzer unions those across every tuple already in the set.

use crate::cfg::ControlFlowGraph;
use crate::diagnostics::AssertionOutcome;
use crate::domain::AbstractDomain;
use crate::lattice::{DisjunctiveCompletion, Finite, Lattice, Tuple, VarId, Variables};
use crate::model::{AndCondition, BoolCondition, Command, ECondition, OrCondition};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumIter, serde::Serialize, serde::Deserialize)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of_const(k: i64) -> Self {
        if k.rem_euclid(2) == 0 { Parity::Even } else { Parity::Odd }
    }

    pub fn flip(self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }
}

impl Finite for Parity {
    type Ctx = ();
    fn all_elements(_ctx: &()) -> Vec<Self> {
        use strum::IntoEnumIterator;
        Parity::iter().collect()
    }
}

/// A total assignment of a parity to every program variable.
pub type ParityTuple = Tuple<Parity>;

/// The shape `Tuple<Parity>::all_elements` needs: a variable list plus the
/// base type's (trivial) context.
pub type TupleCtx = (Variables, ());

/// The disjunctive completion of [`ParityTuple`]: top is all `2^n`
/// assignments, bottom is the empty set (unreachable).
pub type ParitySet = DisjunctiveCompletion<ParityTuple>;

fn eval_econdition(ec: &ECondition, tuple: &ParityTuple) -> bool {
    match ec {
        ECondition::EqVar { i, j } => tuple.get(*i) == tuple.get(*j),
        ECondition::DiffVar { i, j } => tuple.get(*i) != tuple.get(*j),
        ECondition::EqConst { i, k } => *tuple.get(*i) == Parity::of_const(*k),
        ECondition::DiffConst { i, k } => *tuple.get(*i) != Parity::of_const(*k),
        ECondition::True => true,
        ECondition::False => false,
    }
}

/// `None` means the predicate cannot be decided by parity information
/// alone (a `Sum` predicate needs the linear-equalities domain).
fn eval_bool(bc: &BoolCondition, tuple: &ParityTuple) -> Option<bool> {
    match bc {
        BoolCondition::Even(v) => Some(*tuple.get(*v) == Parity::Even),
        BoolCondition::Odd(v) => Some(*tuple.get(*v) == Parity::Odd),
        BoolCondition::Sum { .. } => None,
    }
}

fn eval_and(ac: &AndCondition, tuple: &ParityTuple) -> Option<bool> {
    let mut undecidable = false;
    for bc in &ac.conjuncts {
        match eval_bool(bc, tuple) {
            Some(false) => return Some(false),
            Some(true) => {}
            None => undecidable = true,
        }
    }
    if undecidable { None } else { Some(true) }
}

fn eval_or(orc: &OrCondition, tuple: &ParityTuple) -> Option<bool> {
    let mut undecidable = false;
    for ac in &orc.disjuncts {
        match eval_and(ac, tuple) {
            Some(true) => return Some(true),
            Some(false) => {}
            None => undecidable = true,
        }
    }
    if undecidable { None } else { Some(false) }
}

/// The result of applying a command to a single tuple: zero results means
/// the tuple is filtered out (a failed `assume`), one means a
/// deterministic update, and more than one means the command is
/// nondeterministic at the tuple level (`i := ?`).
pub(crate) fn command_image(tuple: &ParityTuple, command: &Command) -> Vec<ParityTuple> {
    match command {
        Command::Skip | Command::Assert(_) => vec![tuple.clone()],
        Command::AssignVar { i, j } => vec![tuple.with(*i, *tuple.get(*j))],
        Command::AssignConst { i, k } => vec![tuple.with(*i, Parity::of_const(*k))],
        Command::AssignUnknown { i } => vec![tuple.with(*i, Parity::Even), tuple.with(*i, Parity::Odd)],
        Command::Plus1 { i, j } => vec![tuple.with(*i, tuple.get(*j).flip())],
        Command::Minus1 { i, j } => vec![tuple.with(*i, tuple.get(*j).flip())],
        Command::Assume(ec) => {
            if eval_econdition(ec, tuple) {
                vec![tuple.clone()]
            } else {
                vec![]
            }
        }
    }
}

/// Parity analysis over a fixed set of program variables.
pub struct ParityAnalyzer {
    vars: Variables,
}

impl ParityAnalyzer {
    pub fn new(vars: Variables) -> Self {
        ParityAnalyzer { vars }
    }

    fn tuple_ctx(&self) -> TupleCtx {
        (self.vars.clone(), ())
    }

    pub fn variables(&self) -> &Variables {
        &self.vars
    }
}

impl AbstractDomain for ParityAnalyzer {
    type State = ParitySet;

    fn top(&self) -> Self::State {
        ParitySet::top(&self.tuple_ctx())
    }

    fn bottom(&self) -> Self::State {
        ParitySet::bottom(&self.tuple_ctx())
    }

    fn transform(&self, state: &Self::State, command: &Command) -> Self::State {
        let mut result = HashSet::new();
        for tuple in state.iter() {
            result.extend(command_image(tuple, command));
        }
        ParitySet::from_elements(result)
    }

    fn join(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a.join(b)
    }
}

impl ParityAnalyzer {
    pub fn evaluate(&self, state: &ParitySet, orc: &OrCondition) -> AssertionOutcome<ParityTuple> {
        if state.is_empty() {
            return AssertionOutcome::Verified;
        }
        let mut witnesses = Vec::new();
        let mut undecidable = false;
        for tuple in state.iter() {
            match eval_or(orc, tuple) {
                Some(true) => {}
                Some(false) => witnesses.push(tuple.clone()),
                None => undecidable = true,
            }
        }
        if undecidable {
            return AssertionOutcome::Unverifiable {
                reason: "condition references SUM, which the parity domain cannot decide on its own".into(),
            };
        }
        if witnesses.is_empty() {
            AssertionOutcome::Verified
        } else {
            AssertionOutcome::Violated { witnesses }
        }
    }
}

/// Convenience: build a [`ParityAnalyzer`] straight from a CFG's variable
/// count, assuming variables `0..n` in declaration order.
pub fn analyzer_for(cfg: &ControlFlowGraph, vars: Variables) -> ParityAnalyzer {
    let _ = cfg;
    ParityAnalyzer::new(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(n: usize) -> Variables {
        Variables::new((0..n).map(|i| format!("v{i}")).collect())
    }

    #[test]
    fn of_const_matches_parity() {
        assert_eq!(Parity::of_const(4), Parity::Even);
        assert_eq!(Parity::of_const(-3), Parity::Odd);
        assert_eq!(Parity::of_const(0), Parity::Even);
    }

    #[test]
    fn assign_const_narrows_to_one_tuple() {
        let a = ParityAnalyzer::new(vars(1));
        let top = a.top();
        let after = a.transform(&top, &Command::AssignConst { i: VarId(0), k: 2 });
        assert_eq!(after.len(), 1);
        assert_eq!(*after.iter().next().unwrap().get(VarId(0)), Parity::Even);
    }

    #[test]
    fn assign_unknown_restores_both_parities() {
        let a = ParityAnalyzer::new(vars(1));
        let narrowed = a.transform(&a.top(), &Command::AssignConst { i: VarId(0), k: 2 });
        let widened = a.transform(&narrowed, &Command::AssignUnknown { i: VarId(0) });
        assert_eq!(widened, a.top());
    }

    #[test]
    fn plus1_flips_parity() {
        let a = ParityAnalyzer::new(vars(2));
        let top = a.top();
        let after = a.transform(&top, &Command::AssignConst { i: VarId(0), k: 2 });
        let after = a.transform(&after, &Command::Plus1 { i: VarId(1), j: VarId(0) });
        for t in after.iter() {
            assert_eq!(*t.get(VarId(1)), Parity::Odd);
        }
    }

    #[test]
    fn assume_filters_tuples() {
        let a = ParityAnalyzer::new(vars(1));
        let after = a.transform(&a.top(), &Command::Assume(ECondition::EqConst { i: VarId(0), k: 1 }));
        assert_eq!(after.len(), 1);
        assert_eq!(*after.iter().next().unwrap().get(VarId(0)), Parity::Odd);
    }

    #[test]
    fn assume_false_yields_bottom() {
        let a = ParityAnalyzer::new(vars(1));
        let after = a.transform(&a.bottom(), &Command::Assume(ECondition::True));
        assert!(after.is_empty());
    }

    #[test]
    fn assert_even_passes_on_even_only_state() {
        let a = ParityAnalyzer::new(vars(1));
        let state = a.transform(&a.top(), &Command::AssignConst { i: VarId(0), k: 4 });
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Even(VarId(0))])]);
        assert_eq!(a.evaluate(&state, &orc), AssertionOutcome::Verified);
    }

    #[test]
    fn assert_on_bottom_is_vacuously_verified() {
        let a = ParityAnalyzer::new(vars(1));
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Odd(VarId(0))])]);
        assert_eq!(a.evaluate(&a.bottom(), &orc), AssertionOutcome::Verified);
    }

    #[test]
    fn assert_fails_with_witness_on_mixed_state() {
        let a = ParityAnalyzer::new(vars(1));
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Even(VarId(0))])]);
        match a.evaluate(&a.top(), &orc) {
            AssertionOutcome::Violated { witnesses } => assert_eq!(witnesses.len(), 1),
            other => panic!("expected Violated, got {other:?}"),
        }
    }

    #[test]
    fn sum_condition_is_unverifiable_in_pure_parity() {
        let a = ParityAnalyzer::new(vars(2));
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Sum {
            i_vec: vec![VarId(0)],
            j_vec: vec![VarId(1)],
        }])]);
        match a.evaluate(&a.top(), &orc) {
            AssertionOutcome::Unverifiable { .. } => {}
            other => panic!("expected Unverifiable, got {other:?}"),
        }
    }
}
