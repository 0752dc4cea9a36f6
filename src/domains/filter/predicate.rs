use sqlx::{QueryBuilder, Sqlite};

use crate::domains::filter::types::{CohortFilter, Dimension, COHORT_COLUMN};

/// A single column condition. Column names come from closed enums; every
/// value is bound as a parameter when rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    AnyOf { column: &'static str, values: Vec<String> },
    OnOrAfter { column: &'static str, value: String },
    Before { column: &'static str, value: String },
    Equals { column: &'static str, value: i64 },
    Present { column: &'static str },
}

impl Predicate {
    pub fn column(&self) -> &'static str {
        match self {
            Predicate::AnyOf { column, .. }
            | Predicate::OnOrAfter { column, .. }
            | Predicate::Before { column, .. }
            | Predicate::Equals { column, .. }
            | Predicate::Present { column } => column,
        }
    }

    fn push_to(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Predicate::AnyOf { column, values } => {
                builder.push(*column).push(" IN (");
                let mut separated = builder.separated(", ");
                for value in values {
                    separated.push_bind(value.clone());
                }
                separated.push_unseparated(")");
            }
            Predicate::OnOrAfter { column, value } => {
                builder.push(*column).push(" >= ").push_bind(value.clone());
            }
            Predicate::Before { column, value } => {
                builder.push(*column).push(" < ").push_bind(value.clone());
            }
            Predicate::Equals { column, value } => {
                builder.push(*column).push(" = ").push_bind(*value);
            }
            Predicate::Present { column } => {
                builder.push(*column).push(" IS NOT NULL");
            }
        }
    }
}

/// Ordered conjunction of predicates shared by the flow and breakdown queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dimension selection followed by the effective cohort range.
    pub fn from_filter(filter: &CohortFilter) -> Self {
        let mut set = Self::for_dimensions(filter, &Dimension::ALL);
        let range = filter.cohort_range();
        set.push(Predicate::OnOrAfter { column: COHORT_COLUMN, value: range.start });
        set.push(Predicate::Before { column: COHORT_COLUMN, value: range.end });
        set
    }

    /// Only the selections for the given dimensions; no cohort range.
    pub fn for_dimensions(filter: &CohortFilter, dimensions: &[Dimension]) -> Self {
        let mut set = Self::new();
        for dimension in dimensions {
            let values = distinct_values(filter.values_for(*dimension));
            if !values.is_empty() {
                set.push(Predicate::AnyOf { column: dimension.column(), values });
            }
        }
        set
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.push(predicate);
        self
    }

    pub fn extend<I: IntoIterator<Item = Predicate>>(mut self, predicates: I) -> Self {
        self.predicates.extend(predicates);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Values in the order they are bound
    pub fn bound_values(&self) -> Vec<String> {
        let mut bound = Vec::new();
        for predicate in &self.predicates {
            match predicate {
                Predicate::AnyOf { values, .. } => bound.extend(values.iter().cloned()),
                Predicate::OnOrAfter { value, .. } | Predicate::Before { value, .. } => bound.push(value.clone()),
                Predicate::Equals { value, .. } => bound.push(value.to_string()),
                Predicate::Present { .. } => {}
            }
        }
        bound
    }

    /// Append ` WHERE a AND b ...`, or nothing when the set is empty.
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        let mut has_conditions = false;
        for predicate in &self.predicates {
            if has_conditions {
                builder.push(" AND ");
            } else {
                builder.push(" WHERE ");
                has_conditions = true;
            }
            predicate.push_to(builder);
        }
    }
}

fn distinct_values(values: &[String]) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !distinct.contains(value) {
            distinct.push(value.clone());
        }
    }
    distinct
}
