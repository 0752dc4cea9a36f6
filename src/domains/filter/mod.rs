pub mod predicate;
pub mod types;

pub use predicate::{Predicate, PredicateSet};
pub use types::{CohortFilter, CohortRange, Dimension, DEFAULT_COHORT_END, DEFAULT_COHORT_START};
