//! Abstract domains: the engine only ever calls a domain through
//! [`AbstractDomain::transform`] and [`AbstractDomain::join`]; everything
//! else (lattice extremes, comparison) is reached through the domain's
//! associated `State` type, which is itself a [`crate::lattice::Lattice`].

use crate::domain::linear::{sum_equal, EquationSet, Universe};
use crate::domain::parity::ParityTuple;
use crate::lattice::Lattice;
use crate::model::{AndCondition, BoolCondition, Command, OrCondition};

pub mod cartesian;
pub mod linear;
pub mod parity;
pub mod relational;

/// A domain ties a lattice (`State`) to the one operation the fixpoint
/// engine needs from it: advancing a state across a single command.
pub trait AbstractDomain {
    type State: Lattice;

    fn top(&self) -> Self::State;
    fn bottom(&self) -> Self::State;
    fn transform(&self, state: &Self::State, command: &Command) -> Self::State;

    fn join(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a.join(b)
    }
}

/// The witness shape shared by the Cartesian and relational products: a
/// parity tuple paired with the equation set that, together, disprove an
/// assertion. For the Cartesian product `equations` is the one LE element
/// shared by every tuple in the state; for the relational product it is
/// that specific pair's own LE element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairWitness {
    pub tuple: ParityTuple,
    pub equations: EquationSet,
}

/// The condition evaluator shared by both combined domains:
/// `Even`/`Odd` are answered by the parity tuple, `Sum` by the LE element.
/// Unlike the single-domain evaluators, this one is always fully
/// decidable — the two components together can answer every predicate.
fn eval_bool_combined(bc: &BoolCondition, tuple: &ParityTuple, equations: &EquationSet, universe: &Universe) -> bool {
    match bc {
        BoolCondition::Even(v) => *tuple.get(*v) == crate::domain::parity::Parity::Even,
        BoolCondition::Odd(v) => *tuple.get(*v) == crate::domain::parity::Parity::Odd,
        BoolCondition::Sum { i_vec, j_vec } => sum_equal(equations, universe, i_vec, j_vec),
    }
}

fn eval_and_combined(ac: &AndCondition, tuple: &ParityTuple, equations: &EquationSet, universe: &Universe) -> bool {
    ac.conjuncts.iter().all(|bc| eval_bool_combined(bc, tuple, equations, universe))
}

pub(crate) fn eval_or_combined(orc: &OrCondition, tuple: &ParityTuple, equations: &EquationSet, universe: &Universe) -> bool {
    orc.disjuncts.iter().any(|ac| eval_and_combined(ac, tuple, equations, universe))
}
