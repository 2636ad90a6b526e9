//! Per-stage error types and the crate-level aggregate: one `thiserror`
//! enum per fallible stage, flattened into a single `AnalysisError` for
//! callers that just want "did it work".

use thiserror::Error;

/// Errors in the shape of the control-flow graph itself: these are
/// rejected before any fixpoint computation starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("program has no entry node (every node has at least one incoming edge)")]
    NoEntry,
    #[error("program has multiple candidate entry nodes: {0:?}")]
    MultipleEntries(Vec<usize>),
    #[error("edge references unknown node {0}")]
    UnknownNode(usize),
    #[error("variable `{0}` is not declared in this program")]
    UnknownVariable(String),
}

/// Errors constructing or solving over a bounded linear-equalities
/// universe. Coefficient/constant overflow is recoverable (the offending
/// equation is dropped); this type exists for the cases that are not.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UniverseError {
    #[error("coefficient range {min}..={max} is empty or inverted")]
    EmptyCoefficientRange { min: i64, max: i64 },
    #[error("integer range {min}..={max} is empty or inverted")]
    EmptyIntegerRange { min: i64, max: i64 },
}

/// The crate-level error type. Stage errors convert in via `#[from]`;
/// `Multiple` aggregates independent failures the way a batch validation
/// pass would, and `from_multiple` flattens nested aggregates so callers
/// never have to special-case one error versus many.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),
    #[error("universe error: {0}")]
    Universe(#[from] UniverseError),
    #[error("{0} errors: {1:?}")]
    Multiple(usize, Vec<AnalysisError>),
}

impl AnalysisError {
    /// Flatten a batch of results into a single error, or `None` if the
    /// batch was entirely successful. Nested `Multiple` variants are
    /// flattened so `Multiple` never contains another `Multiple`.
    pub fn from_multiple(errors: Vec<AnalysisError>) -> Option<AnalysisError> {
        if errors.is_empty() {
            return None;
        }
        let mut flat = Vec::with_capacity(errors.len());
        for e in errors {
            match e {
                AnalysisError::Multiple(_, inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.pop()
        } else {
            let count = flat.len();
            Some(AnalysisError::Multiple(count, flat))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_multiple_empty_is_none() {
        assert!(AnalysisError::from_multiple(vec![]).is_none());
    }

    #[test]
    fn from_multiple_single_unwraps() {
        let err = AnalysisError::from_multiple(vec![AnalysisError::Shape(ShapeError::NoEntry)]);
        assert!(matches!(err, Some(AnalysisError::Shape(ShapeError::NoEntry))));
    }

    #[test]
    fn from_multiple_flattens_nested() {
        let inner = AnalysisError::Multiple(
            2,
            vec![AnalysisError::Shape(ShapeError::NoEntry), AnalysisError::Shape(ShapeError::UnknownNode(3))],
        );
        let err = AnalysisError::from_multiple(vec![inner, AnalysisError::Shape(ShapeError::UnknownVariable("x".into()))]);
        match err {
            Some(AnalysisError::Multiple(count, list)) => {
                assert_eq!(count, 3);
                assert_eq!(list.len(), 3);
            }
            other => panic!("expected Multiple, got {other:?}"),
        }
    }
}
