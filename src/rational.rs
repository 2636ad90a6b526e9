//! Exact rational arithmetic and Gaussian elimination, used by the
//! linear-equalities domain to decide implication without going through a
//! symbolic-algebra round trip.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// An exact rational number in lowest terms, with a strictly positive
/// denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rational {
    num: i64,
    den: i64,
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    if a == 0 { 1 } else { a }
}

impl Rational {
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "rational with zero denominator");
        let sign = if den < 0 { -1 } else { 1 };
        let (num, den) = (num * sign, den * sign);
        let g = gcd(num, den);
        Rational { num: num / g, den: den / g }
    }

    pub fn from_int(n: i64) -> Self {
        Rational { num: n, den: 1 }
    }

    pub fn zero() -> Self {
        Rational { num: 0, den: 1 }
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn reciprocal(&self) -> Option<Self> {
        if self.num == 0 { None } else { Some(Rational::new(self.den, self.num)) }
    }
}

impl Add for Rational {
    type Output = Rational;
    fn add(self, rhs: Self) -> Self {
        Rational::new(self.num * rhs.den + rhs.num * self.den, self.den * rhs.den)
    }
}

impl Sub for Rational {
    type Output = Rational;
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Neg for Rational {
    type Output = Rational;
    fn neg(self) -> Self {
        Rational { num: -self.num, den: self.den }
    }
}

impl Mul for Rational {
    type Output = Rational;
    fn mul(self, rhs: Self) -> Self {
        Rational::new(self.num * rhs.num, self.den * rhs.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// The outcome of solving a linear system `matrix * x = rhs`.
#[derive(Clone, Debug, PartialEq)]
pub enum SolveOutcome {
    /// The system has exactly one solution.
    Unique(Vec<Rational>),
    /// The system is inconsistent.
    NoSolution,
    /// The system is consistent but underdetermined.
    Infinite,
}

/// Whether a single column of `matrix * x = rhs` is pinned to a specific
/// value independent of every other (possibly free) column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ForcedOutcome {
    /// The system is consistent and `col` takes exactly this value no
    /// matter what the remaining free columns are.
    Forced(Rational),
    /// The system is consistent but `col` is not determined on its own.
    NotForced,
    /// The system has no solution at all.
    Inconsistent,
}

/// Row-reduce the augmented matrix `[matrix | rhs]` to reduced row-echelon
/// form. Returns the reduced augmented rows plus, for each pivot row in
/// order, which column it pivoted on. Shared by `solve` and
/// `forced_column` since both need the same elimination.
fn row_reduce(matrix: &[Vec<Rational>], rhs: &[Rational]) -> (Vec<Vec<Rational>>, Vec<usize>) {
    let rows = matrix.len();
    if rows == 0 {
        return (Vec::new(), Vec::new());
    }
    let cols = matrix[0].len();
    let mut aug: Vec<Vec<Rational>> = matrix
        .iter()
        .zip(rhs)
        .map(|(row, &b)| {
            let mut r = row.clone();
            r.push(b);
            r
        })
        .collect();

    let mut pivot_row = 0;
    let mut pivot_cols = Vec::new();
    for col in 0..cols {
        if pivot_row >= rows {
            break;
        }
        let Some(sel) = (pivot_row..rows).find(|&r| !aug[r][col].is_zero()) else {
            continue;
        };
        aug.swap(pivot_row, sel);
        let pivot_val = aug[pivot_row][col];
        let inv = pivot_val.reciprocal().expect("pivot is nonzero by construction");
        for c in col..=cols {
            aug[pivot_row][c] = aug[pivot_row][c] * inv;
        }
        for r in 0..rows {
            if r == pivot_row {
                continue;
            }
            let factor = aug[r][col];
            if factor.is_zero() {
                continue;
            }
            for c in col..=cols {
                let sub = aug[pivot_row][c] * factor;
                aug[r][c] = aug[r][c] - sub;
            }
        }
        pivot_cols.push(col);
        pivot_row += 1;
    }
    (aug, pivot_cols)
}

/// A fully-reduced row of zero coefficients with a nonzero rhs means the
/// system is inconsistent.
fn is_inconsistent(aug: &[Vec<Rational>], cols: usize) -> bool {
    aug.iter().any(|row| row[..cols].iter().all(Rational::is_zero) && !row[cols].is_zero())
}

/// Solve `matrix * x = rhs` by Gauss-Jordan elimination over the
/// rationals. `matrix` has one row per equation; each row has one
/// coefficient per unknown. Rows may outnumber unknowns.
pub fn solve(matrix: &[Vec<Rational>], rhs: &[Rational]) -> SolveOutcome {
    let rows = matrix.len();
    if rows == 0 {
        return SolveOutcome::Infinite;
    }
    let cols = matrix[0].len();
    let (aug, pivot_cols) = row_reduce(matrix, rhs);

    if is_inconsistent(&aug, cols) {
        return SolveOutcome::NoSolution;
    }

    if pivot_cols.len() < cols {
        return SolveOutcome::Infinite;
    }

    let mut solution = vec![Rational::zero(); cols];
    for (row_idx, &col) in pivot_cols.iter().enumerate() {
        solution[col] = aug[row_idx][cols];
    }
    SolveOutcome::Unique(solution)
}

/// Whether `matrix * x = rhs` forces column `col` to one value regardless
/// of every other column, even when those other columns are left free
/// (`solve` would report `Infinite` for such a system). This is the
/// direct analogue of asking sympy to solve for a single auxiliary
/// unknown while leaving the rest of the system symbolic: `col` is
/// pinned iff it is a pivot column whose reduced row has a zero
/// coefficient on every column that did *not* become a pivot.
pub fn forced_column(matrix: &[Vec<Rational>], rhs: &[Rational], col: usize) -> ForcedOutcome {
    let rows = matrix.len();
    if rows == 0 {
        return ForcedOutcome::NotForced;
    }
    let cols = matrix[0].len();
    let (aug, pivot_cols) = row_reduce(matrix, rhs);

    if is_inconsistent(&aug, cols) {
        return ForcedOutcome::Inconsistent;
    }

    let Some(pivot_row) = pivot_cols.iter().position(|&c| c == col) else {
        return ForcedOutcome::NotForced;
    };
    let row = &aug[pivot_row];
    for (c, coeff) in row[..cols].iter().enumerate() {
        if c != col && !pivot_cols.contains(&c) && !coeff.is_zero() {
            return ForcedOutcome::NotForced;
        }
    }
    ForcedOutcome::Forced(row[cols])
}
