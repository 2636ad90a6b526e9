//! The linear-equalities domain: tracks a finite set of linear equations
//! known to hold exactly, ordered by reversed inclusion (more equations
//! known means a smaller, more precise set of reachable concrete states).
//!
//! Implication (saturation of the known set with everything it entails)
//! is decided by solving an augmented linear system with an auxiliary
//! variable rather than round-tripping through a symbolic solver: this is
//! the direct data-representation replacement for the string-based
//! approach the set of equations was originally specified against.

use crate::diagnostics::AssertionOutcome;
use crate::domain::AbstractDomain;
use crate::lattice::{Lattice, VarId, Variables};
use crate::model::{AndCondition, BoolCondition, Command, ECondition, OrCondition};
use crate::rational::{forced_column, solve, ForcedOutcome, Rational, SolveOutcome};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// The bounds a linear-equalities analysis operates within: which
/// variables exist, and the inclusive ranges coefficients and constants
/// must fall in to be representable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Universe {
    pub variables: Variables,
    pub coeff_range: (i64, i64),
    pub int_range: (i64, i64),
}

impl Universe {
    pub fn new(variables: Variables, coeff_range: (i64, i64), int_range: (i64, i64)) -> Self {
        Universe { variables, coeff_range, int_range }
    }

    pub fn contains_coeff(&self, c: i64) -> bool {
        c >= self.coeff_range.0 && c <= self.coeff_range.1
    }

    pub fn contains_int(&self, m: i64) -> bool {
        m >= self.int_range.0 && m <= self.int_range.1
    }

    /// Every equation representable in this universe, excluding the
    /// always-true zero equation (`0 = 0`).
    pub fn all_equations(&self) -> Vec<Equation> {
        let n = self.variables.len();
        let coeffs_domain: Vec<i64> = (self.coeff_range.0..=self.coeff_range.1).collect();
        let mut coeff_vectors = vec![Vec::new()];
        for _ in 0..n {
            let mut next = Vec::with_capacity(coeff_vectors.len() * coeffs_domain.len());
            for prefix in &coeff_vectors {
                for &c in &coeffs_domain {
                    let mut row = prefix.clone();
                    row.push(c);
                    next.push(row);
                }
            }
            coeff_vectors = next;
        }
        let mut result = Vec::new();
        for coeffs in coeff_vectors {
            for m in self.int_range.0..=self.int_range.1 {
                let eq = Equation::new(coeffs.clone(), m);
                if !eq.is_zero() {
                    result.push(eq);
                }
            }
        }
        result
    }
}

/// A single equation `Σ coeffs[i] * v_i - m = 0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Equation {
    coeffs: Vec<i64>,
    m: i64,
}

impl Equation {
    pub fn new(coeffs: Vec<i64>, m: i64) -> Self {
        Equation { coeffs, m }
    }

    pub fn coefficient(&self, id: VarId) -> i64 {
        self.coeffs[id.0]
    }

    pub fn constant(&self) -> i64 {
        self.m
    }

    pub fn mentions(&self, id: VarId) -> bool {
        self.coeffs[id.0] != 0
    }

    pub fn is_zero(&self) -> bool {
        self.m == 0 && self.coeffs.iter().all(|&c| c == 0)
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote_any = false;
        for (idx, &c) in self.coeffs.iter().enumerate() {
            if c == 0 {
                continue;
            }
            let sign = if c < 0 { "-" } else if wrote_any { "+" } else { "" };
            let mag = c.abs();
            if wrote_any {
                write!(f, " {sign} ")?;
            } else {
                write!(f, "{sign}")?;
            }
            if mag == 1 {
                write!(f, "v{idx}")?;
            } else {
                write!(f, "{mag}*v{idx}")?;
            }
            wrote_any = true;
        }
        if self.m != 0 || !wrote_any {
            let sign = if self.m < 0 { "+" } else { "-" };
            if wrote_any {
                write!(f, " {sign} {}", self.m.abs())?;
            } else {
                write!(f, "{}", -self.m)?;
            }
        }
        Ok(())
    }
}

/// The lattice element: a finite set of equations known to hold,
/// ordered by `S1.le(S2)` iff `S1` is a *superset* of `S2`.
#[derive(Clone, Debug)]
pub struct EquationSet(HashSet<Equation>);

impl EquationSet {
    pub fn from_set(equations: HashSet<Equation>) -> Self {
        EquationSet(equations)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Equation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, eq: &Equation) -> bool {
        self.0.contains(eq)
    }
}

impl PartialEq for EquationSet {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for EquationSet {}

impl Hash for EquationSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let mut codes: Vec<u64> = self
            .0
            .iter()
            .map(|e| {
                use std::hash::Hasher;
                let mut h = std::collections::hash_map::DefaultHasher::new();
                e.hash(&mut h);
                h.finish()
            })
            .collect();
        codes.sort_unstable();
        codes.hash(state);
    }
}

impl Lattice for EquationSet {
    type Ctx = Rc<Universe>;

    fn top(_ctx: &Self::Ctx) -> Self {
        EquationSet(HashSet::new())
    }

    fn bottom(ctx: &Self::Ctx) -> Self {
        EquationSet(ctx.all_equations().into_iter().collect())
    }

    fn le(&self, other: &Self) -> bool {
        self.0.is_superset(&other.0)
    }

    fn join(&self, other: &Self) -> Self {
        EquationSet(self.0.intersection(&other.0).cloned().collect())
    }

    fn meet(&self, other: &Self) -> Self {
        EquationSet(self.0.union(&other.0).cloned().collect())
    }
}

fn rows_for(set: &EquationSet, n: usize) -> (Vec<Vec<Rational>>, Vec<Rational>) {
    let mut rows = Vec::with_capacity(set.len());
    let mut rhs = Vec::with_capacity(set.len());
    for eq in set.iter() {
        let mut row = Vec::with_capacity(n);
        for i in 0..n {
            row.push(Rational::from_int(eq.coeffs[i]));
        }
        rows.push(row);
        rhs.push(Rational::from_int(eq.m));
    }
    (rows, rhs)
}

/// Is `set` itself consistent (does some concrete assignment satisfy
/// every equation in it)?
fn is_consistent(set: &EquationSet, n: usize) -> bool {
    let (rows, rhs) = rows_for(set, n);
    !matches!(solve(&rows, &rhs), SolveOutcome::NoSolution)
}

/// Saturate `set` with every equation of `universe` it implies, via the
/// auxiliary-sigma construction: `E` is implied by `S` iff `S ∪ {σ − E =
/// 0}` forces `σ = 0`, whether or not the variables in `E` are otherwise
/// pinned to constants — the same thing sympy's `solve` reports when it
/// returns `σ = 0` alongside other unknowns left symbolic.
pub fn explicate(set: &EquationSet, universe: &Universe) -> EquationSet {
    let n = universe.variables.len();
    if !is_consistent(set, n) {
        return EquationSet::bottom(&Rc::new(universe.clone()));
    }
    let mut result = set.0.clone();
    for candidate in universe.all_equations() {
        if candidate.is_zero() || result.contains(&candidate) {
            continue;
        }
        let mentioned = (0..n).any(|i| candidate.coeffs[i] != 0 && result.iter().any(|eq| eq.coeffs[i] != 0));
        if !mentioned {
            continue;
        }
        let (mut rows, mut rhs) = rows_for(&EquationSet(result.clone()), n);
        for row in rows.iter_mut() {
            row.insert(0, Rational::zero());
        }
        let mut sigma_row = Vec::with_capacity(n + 1);
        sigma_row.push(Rational::from_int(1));
        for i in 0..n {
            sigma_row.push(Rational::from_int(-candidate.coeffs[i]));
        }
        rows.push(sigma_row);
        rhs.push(Rational::from_int(-candidate.m));
        if let ForcedOutcome::Forced(sigma) = forced_column(&rows, &rhs, 0) {
            if sigma.is_zero() {
                result.insert(candidate);
            }
        }
    }
    EquationSet(result)
}

/// Drop every equation mentioning `var`: the standard "forget what we
/// knew" step before a variable is overwritten.
pub fn clear(set: &EquationSet, var: VarId) -> EquationSet {
    EquationSet(set.0.iter().filter(|eq| !eq.mentions(var)).cloned().collect())
}

/// Rewrite every kept equation so that occurrences of `old` are expressed
/// in terms of `new` instead, by adding `old`'s coefficient onto `new`'s
/// and zeroing `old`'s column. Used when two variables are known to have
/// merged into a single identity.
pub fn replace(set: &EquationSet, new: VarId, old: VarId) -> EquationSet {
    EquationSet(
        set.0
            .iter()
            .map(|eq| {
                if !eq.mentions(old) {
                    return eq.clone();
                }
                let mut coeffs = eq.coeffs.clone();
                coeffs[new.0] += coeffs[old.0];
                coeffs[old.0] = 0;
                Equation::new(coeffs, eq.m)
            })
            .collect(),
    )
}

/// Shift every equation mentioning `var` to account for `var := var +
/// delta` (the `i == j` self-assignment case of `Plus1`/`Minus1`).
/// Equations that would need a constant outside the universe's integer
/// range are dropped, and a message is appended to `warnings`.
pub fn shift_for_self_assign(set: &EquationSet, var: VarId, delta: i64, universe: &Universe, warnings: &mut Vec<String>) -> EquationSet {
    let mut result = HashSet::with_capacity(set.len());
    for eq in set.iter() {
        if !eq.mentions(var) {
            result.insert(eq.clone());
            continue;
        }
        let new_m = eq.m + delta * eq.coefficient(var);
        if universe.contains_int(new_m) {
            result.insert(Equation::new(eq.coeffs.clone(), new_m));
        } else {
            warnings.push(format!("dropped equation {eq} after self-increment: shifted constant {new_m} outside universe"));
        }
    }
    EquationSet(result)
}

fn try_literal(universe: &Universe, coeffs: Vec<i64>, m: i64, warnings: &mut Vec<String>) -> Option<Equation> {
    if !universe.contains_int(m) {
        warnings.push(format!("dropped literal equation with constant {m} outside universe"));
        return None;
    }
    for &c in &coeffs {
        if c != 0 && !universe.contains_coeff(c) {
            warnings.push(format!("dropped literal equation with coefficient {c} outside universe"));
            return None;
        }
    }
    Some(Equation::new(coeffs, m))
}

fn unit_coeffs(n: usize, pos: VarId, neg: Option<VarId>) -> Vec<i64> {
    let mut coeffs = vec![0; n];
    coeffs[pos.0] = 1;
    if let Some(neg) = neg {
        coeffs[neg.0] = -1;
    }
    coeffs
}

/// `σ − (Σ i_vec − Σ j_vec) = 0` decided against `set`: the `Sum`
/// predicate holds iff `σ` is forced to `0`, regardless of whether the
/// variables in `i_vec`/`j_vec` are themselves pinned to constants (e.g.
/// `set` may only know `x = y` with both left free). No solution, or
/// `σ` left undetermined, means the predicate evaluates to `false` —
/// never an error.
pub fn sum_equal(set: &EquationSet, universe: &Universe, i_vec: &[VarId], j_vec: &[VarId]) -> bool {
    let n = universe.variables.len();
    let mut coeffs = vec![0i64; n];
    for v in i_vec {
        coeffs[v.0] += 1;
    }
    for v in j_vec {
        coeffs[v.0] -= 1;
    }
    let (mut rows, mut rhs) = rows_for(set, n);
    for row in rows.iter_mut() {
        row.insert(0, Rational::zero());
    }
    let mut sigma_row = Vec::with_capacity(n + 1);
    sigma_row.push(Rational::from_int(1));
    for &c in &coeffs {
        sigma_row.push(Rational::from_int(-c));
    }
    rows.push(sigma_row);
    rhs.push(Rational::zero());
    matches!(forced_column(&rows, &rhs, 0), ForcedOutcome::Forced(sigma) if sigma.is_zero())
}

fn eval_econdition(ec: &ECondition, set: &EquationSet, universe: &Universe, warnings: &mut Vec<String>) -> EquationSet {
    let n = universe.variables.len();
    match ec {
        ECondition::True => set.clone(),
        ECondition::False => EquationSet::bottom(&Rc::new(universe.clone())),
        ECondition::EqVar { i, j } => {
            let literal = try_literal(universe, unit_coeffs(n, *i, Some(*j)), 0, warnings);
            match literal {
                Some(eq) => {
                    let mut merged = set.0.clone();
                    merged.insert(eq);
                    explicate(&EquationSet(merged), universe)
                }
                None => set.clone(),
            }
        }
        ECondition::EqConst { i, k } => {
            let literal = try_literal(universe, unit_coeffs(n, *i, None), *k, warnings);
            match literal {
                Some(eq) => {
                    let mut merged = set.0.clone();
                    merged.insert(eq);
                    explicate(&EquationSet(merged), universe)
                }
                None => set.clone(),
            }
        }
        ECondition::DiffVar { i, j } => {
            let implied = try_literal(universe, unit_coeffs(n, *i, Some(*j)), 0, &mut Vec::new())
                .map(|eq| explicate(set, universe).contains(&eq))
                .unwrap_or(false);
            if implied { EquationSet::bottom(&Rc::new(universe.clone())) } else { set.clone() }
        }
        ECondition::DiffConst { i, k } => {
            let implied = try_literal(universe, unit_coeffs(n, *i, None), *k, &mut Vec::new())
                .map(|eq| explicate(set, universe).contains(&eq))
                .unwrap_or(false);
            if implied { EquationSet::bottom(&Rc::new(universe.clone())) } else { set.clone() }
        }
    }
}

fn transform_inner(set: &EquationSet, command: &Command, universe: &Universe, warnings: &mut Vec<String>) -> EquationSet {
    let n = universe.variables.len();
    match command {
        Command::Skip | Command::Assert(_) => set.clone(),
        Command::AssignConst { i, k } => {
            let cleared = clear(set, *i);
            match try_literal(universe, unit_coeffs(n, *i, None), *k, warnings) {
                Some(eq) => {
                    let mut merged = cleared.0;
                    merged.insert(eq);
                    explicate(&EquationSet(merged), universe)
                }
                None => cleared,
            }
        }
        Command::AssignVar { i, j } => {
            if i == j {
                return set.clone();
            }
            let cleared = clear(set, *i);
            match try_literal(universe, unit_coeffs(n, *i, Some(*j)), 0, warnings) {
                Some(eq) => {
                    let mut merged = cleared.0;
                    merged.insert(eq);
                    explicate(&EquationSet(merged), universe)
                }
                None => cleared,
            }
        }
        Command::AssignUnknown { i } => explicate(&clear(set, *i), universe),
        Command::Plus1 { i, j } => {
            if i == j {
                shift_for_self_assign(set, *i, 1, universe, warnings)
            } else {
                let cleared = clear(set, *i);
                match try_literal(universe, unit_coeffs(n, *i, Some(*j)), 1, warnings) {
                    Some(eq) => {
                        let mut merged = cleared.0;
                        merged.insert(eq);
                        explicate(&EquationSet(merged), universe)
                    }
                    None => cleared,
                }
            }
        }
        Command::Minus1 { i, j } => {
            if i == j {
                shift_for_self_assign(set, *i, -1, universe, warnings)
            } else {
                let cleared = clear(set, *i);
                match try_literal(universe, unit_coeffs(n, *i, Some(*j)), -1, warnings) {
                    Some(eq) => {
                        let mut merged = cleared.0;
                        merged.insert(eq);
                        explicate(&EquationSet(merged), universe)
                    }
                    None => cleared,
                }
            }
        }
        Command::Assume(ec) => eval_econdition(ec, set, universe, warnings),
    }
}

fn eval_bool(bc: &BoolCondition, set: &EquationSet, universe: &Universe) -> Option<bool> {
    match bc {
        BoolCondition::Even(_) | BoolCondition::Odd(_) => None,
        BoolCondition::Sum { i_vec, j_vec } => Some(sum_equal(set, universe, i_vec, j_vec)),
    }
}

fn eval_and(ac: &AndCondition, set: &EquationSet, universe: &Universe) -> Option<bool> {
    let mut undecidable = false;
    for bc in &ac.conjuncts {
        match eval_bool(bc, set, universe) {
            Some(false) => return Some(false),
            Some(true) => {}
            None => undecidable = true,
        }
    }
    if undecidable { None } else { Some(true) }
}

fn eval_or(orc: &OrCondition, set: &EquationSet, universe: &Universe) -> Option<bool> {
    let mut undecidable = false;
    for ac in &orc.disjuncts {
        match eval_and(ac, set, universe) {
            Some(true) => return Some(true),
            Some(false) => {}
            None => undecidable = true,
        }
    }
    if undecidable { None } else { Some(false) }
}

/// Linear-equalities analysis over a fixed [`Universe`]. Universe
/// overflows encountered while transforming are non-fatal; they are
/// recorded here and can be read back with [`LeAnalyzer::warnings`].
pub struct LeAnalyzer {
    universe: Rc<Universe>,
    warnings: RefCell<Vec<String>>,
}

impl LeAnalyzer {
    pub fn new(universe: Universe) -> Self {
        LeAnalyzer { universe: Rc::new(universe), warnings: RefCell::new(Vec::new()) }
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    pub fn evaluate(&self, state: &EquationSet, orc: &OrCondition) -> AssertionOutcome<EquationSet> {
        if *state == EquationSet::bottom(&self.universe) {
            return AssertionOutcome::Verified;
        }
        match eval_or(orc, state, &self.universe) {
            Some(true) => AssertionOutcome::Verified,
            Some(false) => AssertionOutcome::Violated { witnesses: vec![state.clone()] },
            None => AssertionOutcome::Unverifiable {
                reason: "condition references Even/Odd, which the linear-equalities domain cannot decide on its own".into(),
            },
        }
    }
}

impl AbstractDomain for LeAnalyzer {
    type State = EquationSet;

    fn top(&self) -> Self::State {
        EquationSet::top(&self.universe)
    }

    fn bottom(&self) -> Self::State {
        EquationSet::bottom(&self.universe)
    }

    fn transform(&self, state: &Self::State, command: &Command) -> Self::State {
        let mut warnings = self.warnings.borrow_mut();
        transform_inner(state, command, &self.universe, &mut warnings)
    }
}
