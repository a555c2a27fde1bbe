//! Job id and trace artifact naming.
//!
//! Trace archives are keyed by a label derived from the company name. The
//! job id is always appended so two jobs for similarly-named companies never
//! write to the same archive.

use crate::types::Timestamp;

/// Prefix of generated job ids.
pub const JOB_ID_PREFIX: &str = "columbia";

/// Maximum length of the company part of a trace label.
const MAX_SLUG_LEN: usize = 40;

/// Fallback slug when the company name has no usable characters.
const EMPTY_SLUG: &str = "quote";

/// Generate a job id for submissions that did not supply one.
///
/// Convention: `columbia_{YYYYmmdd}_{HHMMSS}_{8 hex chars}`. The random
/// suffix keeps ids distinct for submissions within the same second.
///
/// # Examples
///
/// ```
/// use chrono::TimeZone;
/// use columbia_core::naming::generate_job_id;
///
/// let at = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 5).unwrap();
/// assert!(generate_job_id(at).starts_with("columbia_20260301_093005_"));
/// ```
pub fn generate_job_id(at: Timestamp) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{JOB_ID_PREFIX}_{}_{}",
        at.format("%Y%m%d_%H%M%S"),
        &suffix[..8]
    )
}

/// Reduce a company name to a lowercase, underscore-separated slug.
///
/// # Examples
///
/// ```
/// use columbia_core::naming::company_slug;
///
/// assert_eq!(company_slug("Arish LLC"), "arish_llc");
/// assert_eq!(company_slug("  Smith & Sons, Inc. "), "smith_sons_inc");
/// assert_eq!(company_slug("***"), "quote");
/// ```
pub fn company_slug(company_name: &str) -> String {
    let mut slug = String::with_capacity(company_name.len());
    for c in company_name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let mut slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('_') {
        slug.pop();
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// Trace label for a job: `{company_slug}_{job_id}`.
pub fn trace_label(company_name: &str, job_id: &str) -> String {
    format!("{}_{job_id}", company_slug(company_name))
}
