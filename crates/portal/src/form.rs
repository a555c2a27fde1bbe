//! Quote form field map.
//!
//! Pairs canonical input keys with the CSS selector of the portal field they
//! are typed into. Fields absent from the job input are skipped; the
//! effective date falls back to tomorrow in `mm/dd/yyyy` form.

use chrono::{Days, NaiveDate};
use columbia_core::quote_input::QuoteInput;

/// One input key and the selector it is typed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormField {
    pub key: &'static str,
    pub selector: &'static str,
}

pub const EFFECTIVE_DATE: &str = "effective_date";

/// Fields filled on the quote page, in page order.
pub const QUOTE_FIELDS: &[FormField] = &[
    FormField { key: EFFECTIVE_DATE, selector: "#effectiveDate" },
    FormField { key: "person_entering_risk", selector: "#personEnteringRisk" },
    FormField { key: "person_entering_risk_email", selector: "#personEnteringRiskEmail" },
    FormField { key: "company_name", selector: "input[name=\"insuredName.company\"]" },
    FormField { key: "dba", selector: "input[name=\"insuredName.dba\"]" },
    FormField { key: "mailing_address", selector: "input[name=\"address.fullAddress\"]" },
    FormField { key: "gross_sales", selector: "#grossSales" },
    FormField { key: "construction_year", selector: "#constructionYear" },
    FormField { key: "number_of_stories", selector: "#numberOfStories" },
    FormField { key: "square_footage", selector: "#squareFootage" },
    FormField { key: "building_limit", selector: "#buildingLimit" },
    FormField { key: "bpp_limit", selector: "#bppLimit" },
];

/// Login page selectors.
pub const USERNAME_SELECTOR: &str = "#username";
pub const PASSWORD_SELECTOR: &str = "#password";
pub const LOGIN_BUTTON_SELECTOR: &str = "button[type=\"submit\"]";

/// Button that advances the quote wizard.
pub const NEXT_SELECTOR: &str = "button#Next";

/// Resolve the `(selector, value)` pairs to type for `input`.
pub fn plan(input: &QuoteInput, today: NaiveDate) -> Vec<(&'static str, String)> {
    QUOTE_FIELDS
        .iter()
        .filter_map(|field| {
            let value = match input.get(field.key) {
                Some(v) => v.to_string(),
                None if field.key == EFFECTIVE_DATE => default_effective_date(today),
                None => return None,
            };
            Some((field.selector, value))
        })
        .collect()
}

/// Tomorrow as `mm/dd/yyyy`.
pub fn default_effective_date(today: NaiveDate) -> String {
    today
        .checked_add_days(Days::new(1))
        .unwrap_or(today)
        .format("%m/%d/%Y")
        .to_string()
}
