//! The Parity × LE Cartesian product: each command is applied to each
//! component independently, using the two domains' own transformers. An
//! assertion is discharged by handing each `BoolCondition` to whichever
//! component can answer it, using the one LE element shared by every
//! parity tuple in the set — conservative, since no tuple gets its own
//! witness equations (that precision gain is the relational product's job,
//! see [`crate::domain::relational`]).

use crate::domain::linear::{EquationSet, LeAnalyzer, Universe};
use crate::domain::parity::{ParityAnalyzer, ParitySet, TupleCtx};
use crate::domain::{eval_or_combined, AbstractDomain, PairWitness};
use crate::diagnostics::AssertionOutcome;
use crate::lattice::{Lattice, Pair, Variables};
use crate::model::{Command, OrCondition};
use std::rc::Rc;

/// The Cartesian product's state: a parity set paired with one shared
/// equation set.
pub type CartesianState = Pair<ParitySet, EquationSet>;

/// Context the Cartesian product's `top`/`bottom` need: the parity side's
/// tuple context plus the LE side's universe.
pub type CartesianCtx = (TupleCtx, Rc<Universe>);

/// Parity × LE analysis, delegating to one sub-analyzer per component.
pub struct CartesianAnalyzer {
    parity: ParityAnalyzer,
    le: LeAnalyzer,
}

impl CartesianAnalyzer {
    pub fn new(vars: Variables, universe: Universe) -> Self {
        assert_eq!(vars, universe.variables, "parity and LE components must share a variable list");
        CartesianAnalyzer { parity: ParityAnalyzer::new(vars), le: LeAnalyzer::new(universe) }
    }

    fn ctx(&self) -> CartesianCtx {
        ((self.parity.variables().clone(), ()), Rc::new(self.le.universe().clone()))
    }

    pub fn universe(&self) -> &Universe {
        self.le.universe()
    }

    /// Discharge an assertion against a converged state. The LE component
    /// being bottom means the equations known so far are already
    /// inconsistent, so no concrete state reaches this point regardless of
    /// what the parity component still allows — the product-level analogue
    /// of the original per-variable "bottom means no witness exists"
    /// special case for `DiffVar`/`DiffConst`.
    pub fn evaluate(&self, state: &CartesianState, orc: &OrCondition) -> AssertionOutcome<PairWitness> {
        let le_bottom = EquationSet::bottom(&Rc::new(self.universe().clone()));
        if state.second == le_bottom || state.first.is_empty() {
            return AssertionOutcome::Verified;
        }
        let universe = self.universe();
        let witnesses: Vec<PairWitness> = state
            .first
            .iter()
            .filter(|tuple| !eval_or_combined(orc, tuple, &state.second, universe))
            .map(|tuple| PairWitness { tuple: tuple.clone(), equations: state.second.clone() })
            .collect();
        if witnesses.is_empty() {
            AssertionOutcome::Verified
        } else {
            AssertionOutcome::Violated { witnesses }
        }
    }
}

impl AbstractDomain for CartesianAnalyzer {
    type State = CartesianState;

    fn top(&self) -> Self::State {
        Pair::top(&self.ctx())
    }

    fn bottom(&self) -> Self::State {
        Pair::bottom(&self.ctx())
    }

    fn transform(&self, state: &Self::State, command: &Command) -> Self::State {
        let first = self.parity.transform(&state.first, command);
        let second = self.le.transform(&state.second, command);
        Pair::new(first, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::VarId;
    use crate::model::{AndCondition, BoolCondition, ECondition};

    fn analyzer(n: usize) -> CartesianAnalyzer {
        let vars = Variables::new((0..n).map(|i| format!("v{i}")).collect());
        let universe = Universe::new(vars.clone(), (-1, 1), (-2, 2));
        CartesianAnalyzer::new(vars, universe)
    }

    #[test]
    fn assign_const_narrows_both_components() {
        let a = analyzer(1);
        let after = a.transform(&a.top(), &Command::AssignConst { i: VarId(0), k: 0 });
        assert_eq!(after.first.len(), 1);
        assert!(after.second.contains(&crate::domain::linear::Equation::new(vec![1], 0)));
    }

    #[test]
    fn sum_condition_decidable_from_le_component_alone() {
        let a = analyzer(2);
        let after = a.transform(&a.top(), &Command::AssignVar { i: VarId(0), j: VarId(1) });
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Sum {
            i_vec: vec![VarId(0)],
            j_vec: vec![VarId(1)],
        }])]);
        assert_eq!(a.evaluate(&after, &orc), AssertionOutcome::Verified);
    }

    #[test]
    fn even_condition_decidable_from_parity_component_alone() {
        let a = analyzer(1);
        let after = a.transform(&a.top(), &Command::AssignConst { i: VarId(0), k: 4 });
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Even(VarId(0))])]);
        assert_eq!(a.evaluate(&after, &orc), AssertionOutcome::Verified);
    }

    #[test]
    fn le_bottom_makes_assertion_vacuously_verified() {
        let a = analyzer(1);
        let after = a.transform(&a.top(), &Command::Assume(ECondition::False));
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Odd(VarId(0))])]);
        assert_eq!(a.evaluate(&after, &orc), AssertionOutcome::Verified);
    }

    #[test]
    fn cartesian_product_cannot_prove_branch_specific_sum_equality() {
        // v0 = x, v1 = y, v2 = a constant witness fixed to 1 before the
        // branch. Branch A sets y = x + 1 while x is even; branch B sets
        // y = x - 1 while x is odd. Each branch alone proves its own half
        // of the disjunction via a *different* equation (y - x - one = 0
        // vs. y + one - x = 0); joining intersects the two equation sets
        // and keeps neither, so the shared-equations Cartesian product
        // can't discharge the assertion even though every concrete state
        // satisfies it. The relational product keeps the two equations
        // apart by construction (see the corresponding test there).
        let a = analyzer(3);
        let (x, y, one) = (VarId(0), VarId(1), VarId(2));
        let start = a.transform(&a.top(), &Command::AssignConst { i: one, k: 1 });
        let branch_a = a.transform(&start, &Command::AssignConst { i: x, k: 0 });
        let branch_a = a.transform(&branch_a, &Command::Plus1 { i: y, j: x });
        let branch_b = a.transform(&start, &Command::AssignConst { i: x, k: 1 });
        let branch_b = a.transform(&branch_b, &Command::Minus1 { i: y, j: x });
        let joined = Pair::new(branch_a.first.join(&branch_b.first), branch_a.second.join(&branch_b.second));
        let orc = OrCondition::new(vec![
            AndCondition::new(vec![BoolCondition::Even(x), BoolCondition::Sum { i_vec: vec![y], j_vec: vec![x, one] }]),
            AndCondition::new(vec![BoolCondition::Odd(x), BoolCondition::Sum { i_vec: vec![y, one], j_vec: vec![x] }]),
        ]);
        match a.evaluate(&joined, &orc) {
            AssertionOutcome::Verified => panic!("cartesian join should not retain either branch's witness equation"),
            _ => {}
        }
    }
}
