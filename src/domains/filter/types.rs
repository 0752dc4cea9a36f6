use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{common, Validate};

/// Lower bound applied when no cohort start is supplied (inclusive)
pub const DEFAULT_COHORT_START: &str = "2023-01-01";

/// Upper bound applied when no cohort end is supplied (exclusive)
pub const DEFAULT_COHORT_END: &str = "2024-01-01";

pub const COHORT_COLUMN: &str = "CohortYearMonth";

/// Categorical dimensions shared by the flow and sentinel tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    County,
    SubCounty,
    Agency,
    Partner,
    Gender,
}

impl Dimension {
    /// Order in which dimension predicates are emitted
    pub const ALL: [Dimension; 5] = [
        Dimension::County,
        Dimension::SubCounty,
        Dimension::Agency,
        Dimension::Partner,
        Dimension::Gender,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Dimension::County => "County",
            Dimension::SubCounty => "SubCounty",
            Dimension::Agency => "AgencyName",
            Dimension::Partner => "PartnerName",
            Dimension::Gender => "Gender",
        }
    }

    /// Name of the request field carrying this dimension's selection
    pub fn field_name(&self) -> &'static str {
        match self {
            Dimension::County => "County",
            Dimension::SubCounty => "SubCounty",
            Dimension::Agency => "Agency",
            Dimension::Partner => "Partner",
            Dimension::Gender => "Gender",
        }
    }

    /// Key used for this dimension in report rows
    pub fn row_key(&self) -> &'static str {
        match self {
            Dimension::County => "county",
            Dimension::SubCounty => "subCounty",
            Dimension::Agency => "agency",
            Dimension::Partner => "partner",
            Dimension::Gender => "gender",
        }
    }

    pub fn header_name(&self) -> &'static str {
        match self {
            Dimension::County => "County",
            Dimension::SubCounty => "Sub County",
            Dimension::Agency => "Agency",
            Dimension::Partner => "Partner",
            Dimension::Gender => "Gender",
        }
    }
}

/// Filter selections submitted by the dashboard.
///
/// Absent and empty lists both mean "no restriction" on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortFilter {
    #[serde(rename = "County", default, skip_serializing_if = "Option::is_none")]
    pub counties: Option<Vec<String>>,
    #[serde(rename = "SubCounty", default, skip_serializing_if = "Option::is_none")]
    pub sub_counties: Option<Vec<String>>,
    #[serde(rename = "Agency", default, skip_serializing_if = "Option::is_none")]
    pub agencies: Option<Vec<String>>,
    #[serde(rename = "Partner", default, skip_serializing_if = "Option::is_none")]
    pub partners: Option<Vec<String>>,
    #[serde(rename = "Gender", default, skip_serializing_if = "Option::is_none")]
    pub genders: Option<Vec<String>>,
    #[serde(rename = "CohortYearMonthStart", default, skip_serializing_if = "Option::is_none")]
    pub cohort_start: Option<String>,
    #[serde(rename = "CohortYearMonthEnd", default, skip_serializing_if = "Option::is_none")]
    pub cohort_end: Option<String>,
}

impl CohortFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counties(mut self, counties: Vec<String>) -> Self {
        self.counties = Some(counties);
        self
    }

    pub fn with_sub_counties(mut self, sub_counties: Vec<String>) -> Self {
        self.sub_counties = Some(sub_counties);
        self
    }

    pub fn with_agencies(mut self, agencies: Vec<String>) -> Self {
        self.agencies = Some(agencies);
        self
    }

    pub fn with_partners(mut self, partners: Vec<String>) -> Self {
        self.partners = Some(partners);
        self
    }

    pub fn with_genders(mut self, genders: Vec<String>) -> Self {
        self.genders = Some(genders);
        self
    }

    pub fn with_cohort_range(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.cohort_start = start.map(str::to_string);
        self.cohort_end = end.map(str::to_string);
        self
    }

    /// Selected values for a dimension; empty when unrestricted
    pub fn values_for(&self, dimension: Dimension) -> &[String] {
        let values = match dimension {
            Dimension::County => &self.counties,
            Dimension::SubCounty => &self.sub_counties,
            Dimension::Agency => &self.agencies,
            Dimension::Partner => &self.partners,
            Dimension::Gender => &self.genders,
        };
        values.as_deref().unwrap_or(&[])
    }

    /// Effective half-open cohort range with defaults applied
    pub fn cohort_range(&self) -> CohortRange {
        CohortRange {
            start: non_blank(&self.cohort_start).unwrap_or(DEFAULT_COHORT_START).to_string(),
            end: non_blank(&self.cohort_end).unwrap_or(DEFAULT_COHORT_END).to_string(),
        }
    }

    /// Short human-readable summary for log lines
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Dimension::ALL
            .iter()
            .filter(|dimension| !self.values_for(**dimension).is_empty())
            .map(|dimension| format!("{}={:?}", dimension.field_name(), self.values_for(*dimension)))
            .collect();
        let range = self.cohort_range();
        parts.push(format!("cohort=[{}, {})", range.start, range.end));
        parts.join(" ")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Validate for CohortFilter {
    fn validate(&self) -> DomainResult<()> {
        if let Some(start) = non_blank(&self.cohort_start) {
            common::validate_date_format(start, "CohortYearMonthStart")?;
        }
        if let Some(end) = non_blank(&self.cohort_end) {
            common::validate_date_format(end, "CohortYearMonthEnd")?;
        }

        // A single bound that falls outside the other's default just matches nothing
        if let (Some(start), Some(end)) = (non_blank(&self.cohort_start), non_blank(&self.cohort_end)) {
            if start > end {
                return Err(DomainError::Validation(ValidationError::invalid_value(
                    "CohortYearMonthStart",
                    &format!("must not be after CohortYearMonthEnd ({})", end),
                )));
            }
        }

        Ok(())
    }
}

/// Cohort month range, inclusive start and exclusive end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortRange {
    pub start: String,
    pub end: String,
}
