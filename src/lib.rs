//! Saav Analysis
//!
//! Lattices, abstract transformers, and a chaotic-iteration fixpoint
//! engine for a minimal imperative integer-variable language: a parity
//! domain, a linear-equalities domain, their Cartesian and relational
//! products, and an assertion-discharge procedure over the result.

pub mod cfg;
pub mod diagnostics;
pub mod domain;
pub mod engine;
pub mod error;
pub mod lattice;
pub mod model;
pub mod rational;

pub use cfg::{CfgEdge, ControlFlowGraph};
pub use diagnostics::{discharge_assertions, AssertionOutcome, AssertionReport};
pub use domain::AbstractDomain;
pub use engine::{analyze, AnalysisOutput, AnalyzerConfig, DomainKind, Strategy};
pub use error::{AnalysisError, ShapeError, UniverseError};
pub use model::{AndCondition, BoolCondition, Command, ECondition, OrCondition};
