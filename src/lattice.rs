//! Generic lattice algebra: the kernel every abstract domain is built from.
//!
//! Two capabilities are kept deliberately separate, mirroring the way the
//! original analysis distinguished "a lattice" from "a finitely enumerable
//! type": `Lattice` carries the ordering and join/meet; `Finite` carries
//! enumeration. A type can be `Finite` without being a `Lattice` (a bare
//! parity tuple, used only as a key), and the disjunctive-completion
//! constructor below turns a `Finite` base into a full `Lattice`.
//!
//! Every constructor here takes its base domain as a type parameter rather
//! than a trait object: there is no dynamic dispatch and no reference cycle
//! in this module, by construction.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// The ordered list of program variables, shared cheaply across states.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Variables(Rc<Vec<String>>);

impl Variables {
    pub fn new(names: Vec<String>) -> Self {
        Variables(Rc::new(names))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self, id: VarId) -> &str {
        &self.0[id.0]
    }

    pub fn id_of(&self, name: &str) -> Option<VarId> {
        self.0.iter().position(|n| n == name).map(VarId)
    }

    pub fn ids(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.0.len()).map(VarId)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl PartialEq for Variables {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}
impl Eq for Variables {}

/// An index into a `Variables` registry. Resolving names to indices is left
/// to whatever constructs the `ControlFlowGraph`; the analysis core never
/// looks at variable names except when rendering diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct VarId(pub usize);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A finitely enumerable type, parameterized on whatever context its
/// enumeration needs (a variable list, a universe of coefficients, `()`).
pub trait Finite: Clone + PartialEq + Eq + Hash {
    type Ctx: Clone;

    fn all_elements(ctx: &Self::Ctx) -> Vec<Self>;
}

/// A bounded lattice: top, bottom, the order, and join/meet. `Ctx` carries
/// whatever external parameters the element's extremes depend on (a
/// variable list, a coefficient universe); types with context-free extremes
/// use `Ctx = ()`.
pub trait Lattice: Clone + PartialEq {
    type Ctx: Clone;

    fn top(ctx: &Self::Ctx) -> Self;
    fn bottom(ctx: &Self::Ctx) -> Self;
    fn le(&self, other: &Self) -> bool;
    fn join(&self, other: &Self) -> Self;
    fn meet(&self, other: &Self) -> Self;
}

/// Join a non-empty slice of lattice elements; panics on an empty slice
/// since the identity element (`bottom`) needs a `Ctx` the caller should
/// supply explicitly via `L::bottom(ctx)` instead.
pub fn join_all<L: Lattice>(elements: &[L]) -> L {
    let mut it = elements.iter();
    let first = it.next().expect("join_all requires at least one element").clone();
    it.fold(first, |acc, e| acc.join(e))
}

// ── Addressable finite tuple (the "tuple_class" base) ──────────────────

/// A total mapping from the variable list to a finite base type `B`,
/// addressable by `VarId`. This is the base type fed into disjunctive
/// completion (e.g. the parity tuple); it is deliberately *not* a
/// `Lattice` itself, since nothing in this crate orders tuples directly.
#[derive(Clone, Debug)]
pub struct Tuple<B: Finite> {
    vars: Variables,
    values: Vec<B>,
}

impl<B: Finite> Tuple<B> {
    pub fn new(vars: Variables, values: Vec<B>) -> Self {
        assert_eq!(vars.len(), values.len(), "tuple arity must match variable count");
        Tuple { vars, values }
    }

    pub fn get(&self, id: VarId) -> &B {
        &self.values[id.0]
    }

    pub fn with(&self, id: VarId, value: B) -> Self {
        let mut values = self.values.clone();
        values[id.0] = value;
        Tuple { vars: self.vars.clone(), values }
    }

    pub fn variables(&self) -> &Variables {
        &self.vars
    }
}

impl<B: Finite> PartialEq for Tuple<B> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}
impl<B: Finite> Eq for Tuple<B> {}
impl<B: Finite> Hash for Tuple<B> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

impl<B: Finite> Finite for Tuple<B> {
    type Ctx = (Variables, B::Ctx);

    fn all_elements(ctx: &Self::Ctx) -> Vec<Self> {
        let (vars, base_ctx) = ctx;
        let base_values = B::all_elements(base_ctx);
        let n = vars.len();
        if n == 0 {
            return vec![Tuple::new(vars.clone(), Vec::new())];
        }
        let mut result = vec![Vec::new()];
        for _ in 0..n {
            let mut next = Vec::with_capacity(result.len() * base_values.len());
            for prefix in &result {
                for b in &base_values {
                    let mut row = prefix.clone();
                    row.push(b.clone());
                    next.push(row);
                }
            }
            result = next;
        }
        result.into_iter().map(|values| Tuple::new(vars.clone(), values)).collect()
    }
}

// ── Disjunctive completion ──────────────────────────────────────────────

/// The powerset of a finite base type `B`, ordered by subset. Top is the
/// set of all elements of `B`; bottom is the empty set.
#[derive(Clone, Debug)]
pub struct DisjunctiveCompletion<B: Finite> {
    elements: HashSet<B>,
}

impl<B: Finite> DisjunctiveCompletion<B> {
    pub fn from_elements(elements: HashSet<B>) -> Self {
        DisjunctiveCompletion { elements }
    }

    pub fn singleton(element: B) -> Self {
        let mut elements = HashSet::with_capacity(1);
        elements.insert(element);
        DisjunctiveCompletion { elements }
    }

    pub fn iter(&self) -> impl Iterator<Item = &B> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: &B) -> bool {
        self.elements.contains(element)
    }

    pub fn insert(&mut self, element: B) {
        self.elements.insert(element);
    }
}

impl<B: Finite> PartialEq for DisjunctiveCompletion<B> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}
impl<B: Finite> Eq for DisjunctiveCompletion<B> {}

impl<B: Finite> Lattice for DisjunctiveCompletion<B> {
    type Ctx = B::Ctx;

    fn top(ctx: &Self::Ctx) -> Self {
        DisjunctiveCompletion { elements: B::all_elements(ctx).into_iter().collect() }
    }

    fn bottom(_ctx: &Self::Ctx) -> Self {
        DisjunctiveCompletion { elements: HashSet::new() }
    }

    fn le(&self, other: &Self) -> bool {
        self.elements.is_subset(&other.elements)
    }

    fn join(&self, other: &Self) -> Self {
        DisjunctiveCompletion { elements: self.elements.union(&other.elements).cloned().collect() }
    }

    fn meet(&self, other: &Self) -> Self {
        DisjunctiveCompletion { elements: self.elements.intersection(&other.elements).cloned().collect() }
    }
}

impl<B: Finite> Hash for DisjunctiveCompletion<B> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let mut sorted: Vec<u64> = self
            .elements
            .iter()
            .map(|e| {
                use std::hash::Hasher;
                let mut h = std::collections::hash_map::DefaultHasher::new();
                e.hash(&mut h);
                h.finish()
            })
            .collect();
        sorted.sort_unstable();
        sorted.hash(state);
    }
}

impl<B: Finite> Finite for DisjunctiveCompletion<B> {
    type Ctx = B::Ctx;

    fn all_elements(ctx: &Self::Ctx) -> Vec<Self> {
        let base = B::all_elements(ctx);
        // Powerset; only meaningful for small bases (tests, toy universes).
        let mut subsets: Vec<HashSet<B>> = vec![HashSet::new()];
        for b in base {
            let mut extended = Vec::with_capacity(subsets.len() * 2);
            for s in &subsets {
                extended.push(s.clone());
                let mut with_b = s.clone();
                with_b.insert(b.clone());
                extended.push(with_b);
            }
            subsets = extended;
        }
        subsets.into_iter().map(DisjunctiveCompletion::from_elements).collect()
    }
}

// ── Pointwise Cartesian product of a Lattice ────────────────────────────

/// `L` raised to the power of the variable list, with pointwise order,
/// join and meet. Unlike `Tuple<B>`, this requires the base type to
/// already be a `Lattice` (it needs a top/bottom per coordinate).
#[derive(Clone, Debug, PartialEq)]
pub struct CartesianProduct<L: Lattice> {
    vars: Variables,
    values: Vec<L>,
}

impl<L: Lattice> CartesianProduct<L> {
    pub fn get(&self, id: VarId) -> &L {
        &self.values[id.0]
    }

    pub fn with(&self, id: VarId, value: L) -> Self {
        let mut values = self.values.clone();
        values[id.0] = value;
        CartesianProduct { vars: self.vars.clone(), values }
    }
}

impl<L: Lattice> Lattice for CartesianProduct<L> {
    type Ctx = (Variables, L::Ctx);

    fn top(ctx: &Self::Ctx) -> Self {
        let (vars, base_ctx) = ctx;
        CartesianProduct { vars: vars.clone(), values: vec![L::top(base_ctx); vars.len()] }
    }

    fn bottom(ctx: &Self::Ctx) -> Self {
        let (vars, base_ctx) = ctx;
        CartesianProduct { vars: vars.clone(), values: vec![L::bottom(base_ctx); vars.len()] }
    }

    fn le(&self, other: &Self) -> bool {
        self.values.iter().zip(&other.values).all(|(a, b)| a.le(b))
    }

    fn join(&self, other: &Self) -> Self {
        let values = self.values.iter().zip(&other.values).map(|(a, b)| a.join(b)).collect();
        CartesianProduct { vars: self.vars.clone(), values }
    }

    fn meet(&self, other: &Self) -> Self {
        let values = self.values.iter().zip(&other.values).map(|(a, b)| a.meet(b)).collect();
        CartesianProduct { vars: self.vars.clone(), values }
    }
}

// ── Two-lattice Cartesian product ───────────────────────────────────────

/// `(A, B)` with componentwise order, join and meet.
#[derive(Clone, Debug, PartialEq)]
pub struct Pair<A: Lattice, B: Lattice> {
    pub first: A,
    pub second: B,
}

impl<A: Lattice, B: Lattice> Pair<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Pair { first, second }
    }
}

impl<A: Lattice, B: Lattice> Lattice for Pair<A, B> {
    type Ctx = (A::Ctx, B::Ctx);

    fn top(ctx: &Self::Ctx) -> Self {
        Pair { first: A::top(&ctx.0), second: B::top(&ctx.1) }
    }

    fn bottom(ctx: &Self::Ctx) -> Self {
        Pair { first: A::bottom(&ctx.0), second: B::bottom(&ctx.1) }
    }

    fn le(&self, other: &Self) -> bool {
        self.first.le(&other.first) && self.second.le(&other.second)
    }

    fn join(&self, other: &Self) -> Self {
        Pair { first: self.first.join(&other.first), second: self.second.join(&other.second) }
    }

    fn meet(&self, other: &Self) -> Self {
        Pair { first: self.first.meet(&other.first), second: self.second.meet(&other.second) }
    }
}

// ── Relational product ──────────────────────────────────────────────────

/// A set of `(T, E)` pairs where `T` is finite and `E` is itself a
/// lattice. The order is *not* plain subset: `(t1, e1) <= (t2, e2)` iff
/// `t1 == t2` and `e1.le(e2)`, and `self <= other` iff every pair in
/// `self` is dominated by some pair in `other`. `join`/`meet` short-circuit
/// on domination and otherwise fall back to union/intersection, which is
/// sound but not exact (see the combined domain's module docs).
#[derive(Clone, Debug)]
pub struct RelationalProduct<T: Finite, E: Lattice> {
    pairs: HashSet<(T, E)>,
}

impl<T: Finite, E: Lattice + Eq + Hash> RelationalProduct<T, E> {
    pub fn from_pairs(pairs: HashSet<(T, E)>) -> Self {
        RelationalProduct { pairs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(T, E)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<T: Finite, E: Lattice + Eq + Hash> PartialEq for RelationalProduct<T, E> {
    fn eq(&self, other: &Self) -> bool {
        self.pairs == other.pairs
    }
}

fn dominated_by<T: Finite, E: Lattice>(pair: &(T, E), other: &HashSet<(T, E)>) -> bool
where
    E: Eq + Hash,
{
    other.iter().any(|(t2, e2)| pair.0 == *t2 && pair.1.le(e2))
}

impl<T: Finite, E: Lattice + Eq + Hash> Lattice for RelationalProduct<T, E> {
    type Ctx = (T::Ctx, E::Ctx);

    fn top(ctx: &Self::Ctx) -> Self {
        let (t_ctx, e_ctx) = ctx;
        let empty = E::top(e_ctx);
        let pairs = T::all_elements(t_ctx).into_iter().map(|t| (t, empty.clone())).collect();
        RelationalProduct { pairs }
    }

    fn bottom(_ctx: &Self::Ctx) -> Self {
        RelationalProduct { pairs: HashSet::new() }
    }

    fn le(&self, other: &Self) -> bool {
        self.pairs.iter().all(|p| dominated_by(p, &other.pairs))
    }

    fn meet(&self, other: &Self) -> Self {
        if self.le(other) {
            return self.clone();
        }
        if other.le(self) {
            return other.clone();
        }
        RelationalProduct { pairs: self.pairs.intersection(&other.pairs).cloned().collect() }
    }

    fn join(&self, other: &Self) -> Self {
        if self.le(other) {
            return other.clone();
        }
        if other.le(self) {
            return self.clone();
        }
        RelationalProduct { pairs: self.pairs.union(&other.pairs).cloned().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal two-point lattice used only to exercise the generic
    // constructors, independent of the domains the crate actually ships.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Bit {
        Zero,
        One,
    }

    impl Lattice for Bit {
        type Ctx = ();
        fn top(_: &()) -> Self {
            Bit::One
        }
        fn bottom(_: &()) -> Self {
            Bit::Zero
        }
        fn le(&self, other: &Self) -> bool {
            matches!((self, other), (Bit::Zero, _) | (Bit::One, Bit::One))
        }
        fn join(&self, other: &Self) -> Self {
            if matches!((self, other), (Bit::Zero, Bit::Zero)) { Bit::Zero } else { Bit::One }
        }
        fn meet(&self, other: &Self) -> Self {
            if matches!((self, other), (Bit::One, Bit::One)) { Bit::One } else { Bit::Zero }
        }
    }

    impl Finite for Bit {
        type Ctx = ();
        fn all_elements(_: &()) -> Vec<Self> {
            vec![Bit::Zero, Bit::One]
        }
    }

    #[test]
    fn cartesian_product_pointwise_order() {
        let vars = Variables::new(vec!["x".into(), "y".into()]);
        let ctx = (vars.clone(), ());
        let top = CartesianProduct::<Bit>::top(&ctx);
        let bottom = CartesianProduct::<Bit>::bottom(&ctx);
        assert!(bottom.le(&top));
        assert!(!top.le(&bottom));
        let mixed = bottom.with(VarId(0), Bit::One);
        assert!(mixed.le(&top));
        assert!(!mixed.le(&bottom));
    }

    #[test]
    fn disjunctive_completion_top_is_all_elements() {
        let top = DisjunctiveCompletion::<Bit>::top(&());
        assert_eq!(top.len(), 2);
        let bottom = DisjunctiveCompletion::<Bit>::bottom(&());
        assert!(bottom.is_empty());
        assert!(bottom.le(&top));
    }

    #[test]
    fn tuple_all_elements_enumerates_cartesian_space() {
        let vars = Variables::new(vec!["x".into(), "y".into(), "z".into()]);
        let all = Tuple::<Bit>::all_elements(&(vars, ()));
        assert_eq!(all.len(), 8);
    }

    #[test]
    fn pair_is_componentwise() {
        let ctx = ((), ());
        let top: Pair<Bit, Bit> = Pair::top(&ctx);
        let bottom: Pair<Bit, Bit> = Pair::bottom(&ctx);
        assert!(bottom.le(&top));
        let a = Pair::new(Bit::One, Bit::Zero);
        let b = Pair::new(Bit::Zero, Bit::One);
        assert_eq!(a.join(&b), Pair::new(Bit::One, Bit::One));
        assert_eq!(a.meet(&b), Pair::new(Bit::Zero, Bit::Zero));
    }

    #[test]
    fn relational_product_domination_order() {
        let vars = Variables::new(vec!["x".into()]);
        let t_ctx = (vars.clone(), ());
        let e_ctx = ();
        let ctx = (t_ctx.clone(), e_ctx);
        let top: RelationalProduct<Tuple<Bit>, Bit> = RelationalProduct::top(&ctx);
        let bottom: RelationalProduct<Tuple<Bit>, Bit> = RelationalProduct::bottom(&ctx);
        assert!(bottom.le(&top));
        assert_eq!(top.len(), 2);
    }
}
