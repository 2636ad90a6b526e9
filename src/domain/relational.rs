//! The Parity × LE relational product: unlike the plain Cartesian product,
//! each parity tuple carries its *own* equation set, so a tuple-specific
//! fact (e.g. `x = y` on one branch, `x = y + 1` on another) survives a
//! join instead of being smeared across every tuple in the set. This is
//! strictly more precise and strictly more expensive: the LE transformer
//! runs once per *distinct* equation set in the state rather than once per
//! state, and assert specializes its evaluation to each pair individually.

use crate::diagnostics::AssertionOutcome;
use crate::domain::linear::{EquationSet, LeAnalyzer, Universe};
use crate::domain::parity::{command_image, ParityTuple, TupleCtx};
use crate::domain::{eval_or_combined, AbstractDomain, PairWitness};
use crate::lattice::{Lattice, RelationalProduct, Variables};
use crate::model::{Command, OrCondition};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// The relational product's state: a set of `(parity tuple, equation set)`
/// pairs, ordered so that `s1 <= s2` iff every pair in `s1` is dominated by
/// some same-tuple, LE-larger pair in `s2` (see [`RelationalProduct`]).
pub type RelationalState = RelationalProduct<ParityTuple, EquationSet>;

/// Context `RelationalState::top`/`bottom` need: the tuple side's context
/// plus the LE side's universe.
pub type RelationalCtx = (TupleCtx, Rc<Universe>);

/// Parity × LE relational analysis. Holds an [`LeAnalyzer`] purely to
/// reuse its per-command transformer and universe; the parity side has no
/// per-tuple state worth keeping beyond the variable list.
pub struct RelationalAnalyzer {
    vars: Variables,
    le: LeAnalyzer,
}

impl RelationalAnalyzer {
    pub fn new(vars: Variables, universe: Universe) -> Self {
        assert_eq!(vars, universe.variables, "parity and LE components must share a variable list");
        RelationalAnalyzer { vars, le: LeAnalyzer::new(universe) }
    }

    fn tuple_ctx(&self) -> TupleCtx {
        (self.vars.clone(), ())
    }

    fn ctx(&self) -> RelationalCtx {
        (self.tuple_ctx(), Rc::new(self.le.universe().clone()))
    }

    pub fn universe(&self) -> &Universe {
        self.le.universe()
    }

    /// Discharge an assertion against every pair independently: this is
    /// where the relational product's extra precision over the Cartesian
    /// product comes from, since each tuple's own equations answer
    /// `Sum` rather than one equation set shared across every tuple.
    pub fn evaluate(&self, state: &RelationalState, orc: &OrCondition) -> AssertionOutcome<PairWitness> {
        if state.is_empty() {
            return AssertionOutcome::Verified;
        }
        let universe = self.universe();
        let witnesses: Vec<PairWitness> = state
            .iter()
            .filter(|(tuple, equations)| !eval_or_combined(orc, tuple, equations, universe))
            .map(|(tuple, equations)| PairWitness { tuple: tuple.clone(), equations: equations.clone() })
            .collect();
        if witnesses.is_empty() {
            AssertionOutcome::Verified
        } else {
            AssertionOutcome::Violated { witnesses }
        }
    }
}

impl AbstractDomain for RelationalAnalyzer {
    type State = RelationalState;

    fn top(&self) -> Self::State {
        RelationalState::top(&self.ctx())
    }

    fn bottom(&self) -> Self::State {
        RelationalState::bottom(&self.ctx())
    }

    fn transform(&self, state: &Self::State, command: &Command) -> Self::State {
        // Batch the LE transform: apply it once per distinct equation set
        // appearing in the state rather than once per pair, since many
        // tuples typically share the same LE witness.
        let mut le_cache: HashMap<EquationSet, EquationSet> = HashMap::new();
        for (_, equations) in state.iter() {
            le_cache.entry(equations.clone()).or_insert_with(|| self.le.transform(equations, command));
        }
        let mut result: HashSet<(ParityTuple, EquationSet)> = HashSet::new();
        for (tuple, equations) in state.iter() {
            let transformed_le = le_cache.get(equations).expect("every equation set was seeded into the cache above").clone();
            for tuple_image in command_image(tuple, command) {
                result.insert((tuple_image, transformed_le.clone()));
            }
        }
        RelationalState::from_pairs(result)
    }
}
