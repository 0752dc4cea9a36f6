use crate::errors::{ValidationError, DomainResult, DomainError};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// A trait that request objects implement for validation.
pub trait Validate {
    /// Validates the object and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

fn iso_date_regex() -> &'static Regex {
    static ISO_DATE_REGEX: OnceLock<Regex> = OnceLock::new();
    ISO_DATE_REGEX.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Failed to compile date regex"))
}

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn validate_with<F>(mut self, validator: F) -> Self
    where F: FnOnce(&T) -> Result<(), ValidationError> {
        // Later checks only make sense once the earlier ones passed
        if !self.errors.is_empty() {
            return self;
        }
        if let Some(value) = &self.value {
            if let Err(err) = validator(value) {
                self.errors.push(err);
            }
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            // Return the first error for simplicity
            Some(err) => Err(DomainError::Validation(err)),
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    pub fn matches_pattern(mut self, pattern: &Regex, message: &str) -> Self {
        if let Some(value) = &self.value {
            if !pattern.is_match(value) {
                self.errors.push(ValidationError::format(&self.field_name, message));
            }
        }
        self
    }
}

// Common validation utilities for request fields
pub mod common {
    use super::*;

    pub fn validate_date_format(date_str: &str, field_name: &str) -> DomainResult<()> {
        ValidationBuilder::new(field_name, Some(date_str.to_string()))
            .matches_pattern(iso_date_regex(), "must be in the format YYYY-MM-DD")
            .validate_with(|value| {
                NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .map(|_| ())
                    .map_err(|_| ValidationError::format(field_name, "is not a valid calendar date"))
            })
            .validate()
    }
}

/// Schema validation of raw JSON request bodies, run before typed parsing
pub mod request {
    use super::*;
    use jsonschema::error::ValidationErrorKind;
    use jsonschema::Validator;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};

    /// Upper bound on values per multi-select filter
    pub const MAX_FILTER_VALUES: usize = 500;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PayloadKind {
        SankeyFilter,
        Breakdown,
    }

    fn filter_properties() -> serde_json::Map<String, Value> {
        let list = json!({
            "type": ["array", "null"],
            "items": { "type": "string" },
            "maxItems": MAX_FILTER_VALUES
        });
        let date = json!({ "type": ["string", "null"] });

        let mut properties = serde_json::Map::new();
        for field in ["County", "SubCounty", "Agency", "Partner", "Gender"] {
            properties.insert(field.to_string(), list.clone());
        }
        properties.insert("CohortYearMonthStart".to_string(), date.clone());
        properties.insert("CohortYearMonthEnd".to_string(), date);
        properties
    }

    pub fn schema_for(kind: PayloadKind) -> Value {
        let mut properties = filter_properties();
        let mut required: Vec<&str> = Vec::new();

        if kind == PayloadKind::Breakdown {
            properties.insert("node".to_string(), json!({ "type": "string" }));
            required.push("node");
        }

        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    fn validator(kind: PayloadKind) -> &'static Validator {
        static SANKEY_VALIDATOR: OnceLock<Validator> = OnceLock::new();
        static BREAKDOWN_VALIDATOR: OnceLock<Validator> = OnceLock::new();

        let cell = match kind {
            PayloadKind::SankeyFilter => &SANKEY_VALIDATOR,
            PayloadKind::Breakdown => &BREAKDOWN_VALIDATOR,
        };
        cell.get_or_init(|| jsonschema::validator_for(&schema_for(kind)).expect("Failed to compile request schema"))
    }

    fn offending_field(error: &jsonschema::ValidationError<'_>) -> String {
        if let ValidationErrorKind::Required { property } = &error.kind {
            if let Some(name) = property.as_str() {
                return name.to_string();
            }
        }

        let path = error.instance_path.to_string();
        path.trim_start_matches('/')
            .split('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or("body")
            .to_string()
    }

    /// Check a body against the payload schema, naming the first bad field.
    pub fn validate_payload(kind: PayloadKind, body: &Value) -> Result<(), ValidationError> {
        let first_error = validator(kind).iter_errors(body).next();

        match first_error {
            None => Ok(()),
            Some(error) => {
                let field = offending_field(&error);
                match &error.kind {
                    ValidationErrorKind::Required { .. } => Err(ValidationError::required(&field)),
                    ValidationErrorKind::MaxItems { limit } => Err(ValidationError::range(&field, 0, *limit)),
                    _ => Err(ValidationError::invalid_value(&field, &error.to_string())),
                }
            }
        }
    }

    /// Schema-check then deserialize a request body.
    pub fn parse_payload<T: DeserializeOwned>(kind: PayloadKind, body: Value) -> Result<T, ValidationError> {
        validate_payload(kind, &body)?;
        serde_json::from_value(body)
            .map_err(|e| ValidationError::invalid_value("body", &e.to_string()))
    }
}
