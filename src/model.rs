//! Typed representation of commands and conditions, as handed to this
//! crate by whatever parses program text (out of this crate's scope).
//! Variables are resolved to [`VarId`]s up front; nothing downstream of
//! the CFG ever looks at a variable name except the diagnostics renderer.

use crate::lattice::VarId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single edge label in the control-flow graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// `skip`
    Skip,
    /// `i := j`
    AssignVar { i: VarId, j: VarId },
    /// `i := k`
    AssignConst { i: VarId, k: i64 },
    /// `i := ?` (nondeterministic assignment, forgets everything about `i`)
    AssignUnknown { i: VarId },
    /// `i := j + 1`
    Plus1 { i: VarId, j: VarId },
    /// `i := j - 1`
    Minus1 { i: VarId, j: VarId },
    /// `assume(EC)`, restricts reachable states without changing variables
    Assume(ECondition),
    /// `assert(ORC)`, identity on the state; discharged separately
    Assert(OrCondition),
}

/// An elementary condition over a pair of variables, or a variable and a
/// constant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ECondition {
    EqVar { i: VarId, j: VarId },
    DiffVar { i: VarId, j: VarId },
    EqConst { i: VarId, k: i64 },
    DiffConst { i: VarId, k: i64 },
    True,
    False,
}

/// A single boolean predicate usable inside an assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolCondition {
    Even(VarId),
    Odd(VarId),
    /// `SUM i_vec == SUM j_vec`
    Sum { i_vec: Vec<VarId>, j_vec: Vec<VarId> },
}

impl fmt::Display for BoolCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolCondition::Even(v) => write!(f, "even({v})"),
            BoolCondition::Odd(v) => write!(f, "odd({v})"),
            BoolCondition::Sum { i_vec, j_vec } => {
                let lhs: Vec<String> = i_vec.iter().map(VarId::to_string).collect();
                let rhs: Vec<String> = j_vec.iter().map(VarId::to_string).collect();
                write!(f, "sum({}) == sum({})", lhs.join(" + "), rhs.join(" + "))
            }
        }
    }
}

/// A conjunction of [`BoolCondition`]s. An empty conjunction is vacuously
/// true.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AndCondition {
    pub conjuncts: Vec<BoolCondition>,
}

impl AndCondition {
    pub fn new(conjuncts: Vec<BoolCondition>) -> Self {
        AndCondition { conjuncts }
    }
}

impl fmt::Display for AndCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conjuncts.is_empty() {
            return write!(f, "true");
        }
        let parts: Vec<String> = self.conjuncts.iter().map(BoolCondition::to_string).collect();
        write!(f, "{}", parts.join(" && "))
    }
}

/// A disjunction of [`AndCondition`]s (a DNF formula). An empty disjunction
/// is vacuously false.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrCondition {
    pub disjuncts: Vec<AndCondition>,
}

impl OrCondition {
    pub fn new(disjuncts: Vec<AndCondition>) -> Self {
        OrCondition { disjuncts }
    }
}

impl fmt::Display for OrCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.disjuncts.is_empty() {
            return write!(f, "false");
        }
        let parts: Vec<String> = self.disjuncts.iter().map(AndCondition::to_string).collect();
        write!(f, "{}", parts.join(" || "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_condition_renders_true() {
        assert_eq!(AndCondition::default().to_string(), "true");
    }

    #[test]
    fn empty_or_condition_renders_false() {
        assert_eq!(OrCondition::default().to_string(), "false");
    }

    #[test]
    fn command_round_trips_through_json() {
        let cmd = Command::Plus1 { i: VarId(0), j: VarId(1) };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, back);
    }

    #[test]
    fn assert_command_round_trips() {
        let orc = OrCondition::new(vec![AndCondition::new(vec![BoolCondition::Even(VarId(0))])]);
        let cmd = Command::Assert(orc.clone());
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, back);
        assert_eq!(orc.to_string(), "even(v0)");
    }
}
