//! OData query construction for the `Products` endpoint
//!
//! Builds the `$filter` and `$expand` parameters sent with every page
//! request.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::fmt;

/// Label that marks products belonging to the harvested account
pub const DEFAULT_LABEL: &str = "Foreign Accounts";

/// Profile the products are read from
pub const DEFAULT_PROFILE_ID: u64 = 32_001_166;

/// Related collections expanded inline by default
pub const DEFAULT_EXPAND: [&str; 3] = ["Attributes", "Labels", "Images"];

/// Product filter rendered as an OData `$filter` expression
///
/// Predicates are joined with `and`:
/// label, positive available quantity, profile, then the optional
/// `IsParent` and `CreateDateUtc` clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    /// Label name the product must carry
    pub label: String,
    /// Profile (account) the products belong to
    pub profile_id: u64,
    /// Restrict to parent (or non-parent) products
    pub is_parent: Option<bool>,
    /// Only products created on or after this date
    pub created_since: Option<NaiveDate>,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            profile_id: DEFAULT_PROFILE_ID,
            is_parent: None,
            created_since: None,
        }
    }
}

impl ProductFilter {
    /// Create a filter for the given label and profile
    pub fn new(label: impl Into<String>, profile_id: u64) -> Self {
        Self {
            label: label.into(),
            profile_id,
            ..Default::default()
        }
    }

    /// Restrict to parent products
    #[must_use]
    pub fn with_is_parent(mut self, is_parent: Option<bool>) -> Self {
        self.is_parent = is_parent;
        self
    }

    /// Only include products created on or after `date`
    #[must_use]
    pub fn with_created_since(mut self, date: Option<NaiveDate>) -> Self {
        self.created_since = date;
        self
    }

    /// Check that the filter can be rendered
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(Error::missing_field("catalog.label"));
        }
        if self.profile_id == 0 {
            return Err(Error::missing_field("catalog.profile_id"));
        }
        Ok(())
    }

    /// Render the `$filter` expression
    pub fn to_odata(&self) -> String {
        let mut clauses = vec![
            format!("Labels/Any (c: c/Name eq '{}')", escape_literal(&self.label)),
            "TotalAvailableQuantity gt 0".to_string(),
            format!("ProfileID eq {}", self.profile_id),
        ];

        if let Some(is_parent) = self.is_parent {
            clauses.push(format!("IsParent eq {is_parent}"));
        }

        if let Some(date) = self.created_since {
            clauses.push(format!("CreateDateUtc ge {}", date.format("%Y-%m-%d")));
        }

        clauses.join(" and ")
    }
}

impl fmt::Display for ProductFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_odata())
    }
}

/// Render an `$expand` list
pub fn expand_param(fields: &[String]) -> Result<String> {
    let fields: Vec<&str> = fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();

    if fields.is_empty() {
        return Err(Error::missing_field("catalog.expand"));
    }

    Ok(fields.join(","))
}

/// The default `$expand` list as owned strings
pub fn default_expand() -> Vec<String> {
    DEFAULT_EXPAND.iter().map(|s| (*s).to_string()).collect()
}

/// OData string literals escape a single quote by doubling it
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
