//! Portfolio request and response types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum length of an account identifier.
pub const ACCOUNT_ID_MAX_LEN: usize = 50;

/// A validation problem with one request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Raw query parameters of `GET /api/v1/portfolio`, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortfolioQuery {
    pub account_id: Option<String>,
    pub include_positions: Option<String>,
    pub include_summary: Option<String>,
}

/// A validated portfolio request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioRequest {
    account_id: Option<String>,
    include_positions: bool,
    include_summary: bool,
}

impl Default for PortfolioRequest {
    fn default() -> Self {
        Self {
            account_id: None,
            include_positions: true,
            include_summary: true,
        }
    }
}

impl PortfolioRequest {
    /// Build a request, checking the account identifier.
    ///
    /// An empty identifier means "no account selected".
    pub fn new(
        account_id: Option<String>,
        include_positions: bool,
        include_summary: bool,
    ) -> Result<Self, Vec<FieldError>> {
        let account_id = account_id.filter(|id| !id.is_empty());
        let mut errors = Vec::new();
        if let Some(id) = &account_id {
            validate_account_id(id, &mut errors);
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            account_id,
            include_positions,
            include_summary,
        })
    }

    /// Validate raw query parameters. Every bad field is reported.
    pub fn from_query(query: &PortfolioQuery) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let account_id = query.account_id.clone().filter(|id| !id.is_empty());
        if let Some(id) = &account_id {
            validate_account_id(id, &mut errors);
        }

        let include_positions =
            parse_flag("include_positions", query.include_positions.as_deref(), &mut errors);
        let include_summary =
            parse_flag("include_summary", query.include_summary.as_deref(), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            account_id,
            include_positions,
            include_summary,
        })
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn include_positions(&self) -> bool {
        self.include_positions
    }

    pub fn include_summary(&self) -> bool {
        self.include_summary
    }
}

fn validate_account_id(id: &str, errors: &mut Vec<FieldError>) {
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(FieldError::new(
            "account_id",
            "must match ^[A-Za-z0-9_-]*$",
        ));
    }
    if id.chars().count() > ACCOUNT_ID_MAX_LEN {
        errors.push(FieldError::new(
            "account_id",
            format!("must be at most {} characters", ACCOUNT_ID_MAX_LEN),
        ));
    }
}

/// Missing flags default to `true`.
fn parse_flag(field: &'static str, raw: Option<&str>, errors: &mut Vec<FieldError>) -> bool {
    let Some(raw) = raw else {
        return true;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            errors.push(FieldError::new(field, "must be a boolean"));
            true
        }
    }
}

/// Portfolio data as returned by the brokerage, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub account_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,
}
