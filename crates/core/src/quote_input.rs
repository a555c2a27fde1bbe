//! Quote input canonicalization and validation.
//!
//! Several quote fields are accepted under a primary name and a legacy
//! alias. [`QuoteInput::normalize`] folds every alias onto its primary name
//! before the job is created, so the dispatcher and the portal driver only
//! ever see canonical keys.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Field table
// ---------------------------------------------------------------------------

/// A canonical quote field and the legacy name it may arrive under.
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub canonical: &'static str,
    pub alias: &'static str,
    pub required: bool,
}

pub const PERSON_ENTERING_RISK: &str = "person_entering_risk";
pub const PERSON_ENTERING_RISK_EMAIL: &str = "person_entering_risk_email";
pub const COMPANY_NAME: &str = "company_name";
pub const MAILING_ADDRESS: &str = "mailing_address";

/// Every aliased field, in the order the portal form asks for them.
pub const FIELD_ALIASES: &[FieldAlias] = &[
    FieldAlias { canonical: PERSON_ENTERING_RISK, alias: "contact_name", required: true },
    FieldAlias { canonical: PERSON_ENTERING_RISK_EMAIL, alias: "email", required: true },
    FieldAlias { canonical: COMPANY_NAME, alias: "business_name", required: true },
    FieldAlias { canonical: MAILING_ADDRESS, alias: "address", required: true },
    FieldAlias { canonical: "dba", alias: "dba_name", required: false },
    FieldAlias { canonical: "gross_sales", alias: "gross_sales_amount", required: false },
    FieldAlias { canonical: "applicant_is", alias: "applicant_type", required: false },
    FieldAlias { canonical: "construction_year", alias: "original_construction_year", required: false },
    FieldAlias { canonical: "number_of_stories", alias: "stories", required: false },
    FieldAlias { canonical: "square_footage", alias: "square_feet", required: false },
    FieldAlias { canonical: "building_limit", alias: "building_value", required: false },
    FieldAlias { canonical: "bpp_limit", alias: "business_personal_property_limit", required: false },
];

/// Maximum length of a caller-supplied job id.
const MAX_JOB_ID_LEN: usize = 128;

// ---------------------------------------------------------------------------
// QuoteInput
// ---------------------------------------------------------------------------

/// Normalized quote payload. Immutable once the job record is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuoteInput(BTreeMap<String, String>);

impl QuoteInput {
    /// Canonicalize aliased fields and check that required fields are present.
    ///
    /// - The primary name wins when both names are supplied.
    /// - Blank values count as absent.
    /// - Keys that are not in [`FIELD_ALIASES`] pass through unchanged.
    pub fn normalize(raw: BTreeMap<String, String>) -> Result<Self, CoreError> {
        let mut fields: BTreeMap<String, String> = raw
            .into_iter()
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();

        let mut missing = Vec::new();
        for field in FIELD_ALIASES {
            let legacy = fields.remove(field.alias);
            if !fields.contains_key(field.canonical) {
                if let Some(value) = legacy {
                    fields.insert(field.canonical.to_string(), value);
                }
            }
            if field.required && !fields.contains_key(field.canonical) {
                missing.push(format!("{} (or {})", field.canonical, field.alias));
            }
        }

        if !missing.is_empty() {
            return Err(CoreError::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self(fields))
    }

    /// Convert a loosely-typed JSON object into string fields, then normalize.
    ///
    /// Numbers and booleans are stringified, `null` is dropped; nested
    /// arrays or objects are rejected.
    pub fn from_json(raw: serde_json::Map<String, serde_json::Value>) -> Result<Self, CoreError> {
        let mut fields = BTreeMap::new();
        for (key, value) in raw {
            let text = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(CoreError::Validation(format!(
                        "Field \"{key}\" must be a string, number or boolean"
                    )));
                }
            };
            fields.insert(key, text);
        }
        Self::normalize(fields)
    }

    /// Look up a canonical field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// The company name (always present after normalization).
    pub fn company_name(&self) -> &str {
        self.get(COMPANY_NAME).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a caller-supplied job id.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_JOB_ID_LEN` characters.
/// - Must contain only alphanumeric, hyphen, underscore, or dot characters
///   (the id ends up in a URL path and in artifact file names).
pub fn validate_job_id(id: &str) -> Result<(), CoreError> {
    if id.is_empty() {
        return Err(CoreError::Validation("Job id must not be empty".to_string()));
    }
    if id.len() > MAX_JOB_ID_LEN {
        return Err(CoreError::Validation(format!(
            "Job id must not exceed {MAX_JOB_ID_LEN} characters"
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(CoreError::Validation(
            "Job id may only contain alphanumeric, hyphen, underscore, or dot characters"
                .to_string(),
        ));
    }
    if id.chars().all(|c| c == '.') {
        return Err(CoreError::Validation(
            "Job id must contain at least one non-dot character".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
