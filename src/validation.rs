//! Input validation for drafts and patches.
//!
//! Runs before any lifecycle rule and reports every failing field at once.
//! Checks that need the store (referenced customer existence) live in the
//! service façade.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::core::{CrmError, FieldError, Result};
use crate::domain::{
    ActivityDraft, ActivityPatch, ContactDraft, ContactPatch, CustomerDraft, CustomerPatch,
    LeadDraft, LeadPatch, OpportunityDraft, OpportunityPatch,
};

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
}

/// Largest accepted money value: twelve digits, two of them after the point.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Accumulates field errors in declaration order.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, "must not be blank");
        }
        self
    }

    /// A present value must not be blank; absence is fine.
    pub fn not_blank(&mut self, field: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.required(field, value);
        }
        self
    }

    pub fn present<T>(&mut self, field: &'static str, value: Option<&T>) -> &mut Self {
        if value.is_none() {
            self.fail(field, "is required");
        }
        self
    }

    pub fn max_len(&mut self, field: &'static str, value: Option<&str>, max: usize) -> &mut Self {
        if value.is_some_and(|v| v.chars().count() > max) {
            self.fail(field, format!("size must be at most {max}"));
        }
        self
    }

    /// Blank addresses pass; anything else must look like `local@domain.tld`.
    pub fn email(&mut self, field: &'static str, value: Option<&str>) -> &mut Self {
        let value = value.map(str::trim).unwrap_or_default();
        if !value.is_empty() && !EMAIL_PATTERN.is_match(value) {
            self.fail(field, "must be a well-formed email address");
        }
        self
    }

    pub fn non_negative(&mut self, field: &'static str, value: Option<Decimal>) -> &mut Self {
        if value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()) {
            self.fail(field, "must be greater than or equal to 0");
        }
        self
    }

    /// A present amount must be between zero and [`MAX_AMOUNT`] with at most
    /// two decimal places.
    pub fn money(&mut self, field: &'static str, value: Option<Decimal>) -> &mut Self {
        self.non_negative(field, value);
        if value.is_some_and(|v| v > MAX_AMOUNT || v.normalize().scale() > 2) {
            self.fail(field, "numeric value out of bounds (<10 digits>.<2 digits> expected)");
        }
        self
    }

    pub fn percentage(&mut self, field: &'static str, value: Option<u8>) -> &mut Self {
        if value.is_some_and(|v| v > 100) {
            self.fail(field, "must be between 0 and 100");
        }
        self
    }

    pub fn fail(&mut self, field: &'static str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CrmError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

impl Validate for CustomerDraft {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .required("companyName", &self.company_name)
            .max_len("companyName", Some(&self.company_name), 100)
            .max_len("industry", self.industry.as_deref(), 50)
            .max_len("companySize", self.company_size.as_deref(), 20)
            .max_len("website", self.website.as_deref(), 100)
            .max_len("phone", self.phone.as_deref(), 20)
            .email("email", self.email.as_deref())
            .max_len("email", self.email.as_deref(), 100)
            .max_len("address", self.address.as_deref(), 200)
            .max_len("city", self.city.as_deref(), 50)
            .max_len("state", self.state.as_deref(), 50)
            .max_len("postalCode", self.postal_code.as_deref(), 20)
            .max_len("country", self.country.as_deref(), 50)
            .finish()
    }
}

impl Validate for CustomerPatch {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .not_blank("companyName", self.company_name.as_deref())
            .max_len("companyName", self.company_name.as_deref(), 100)
            .max_len("industry", self.industry.as_deref(), 50)
            .max_len("companySize", self.company_size.as_deref(), 20)
            .max_len("website", self.website.as_deref(), 100)
            .max_len("phone", self.phone.as_deref(), 20)
            .email("email", self.email.as_deref())
            .max_len("email", self.email.as_deref(), 100)
            .max_len("address", self.address.as_deref(), 200)
            .max_len("city", self.city.as_deref(), 50)
            .max_len("state", self.state.as_deref(), 50)
            .max_len("postalCode", self.postal_code.as_deref(), 20)
            .max_len("country", self.country.as_deref(), 50)
            .finish()
    }
}

impl Validate for ContactDraft {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .required("firstName", &self.first_name)
            .max_len("firstName", Some(&self.first_name), 50)
            .required("lastName", &self.last_name)
            .max_len("lastName", Some(&self.last_name), 50)
            .max_len("jobTitle", self.job_title.as_deref(), 100)
            .email("email", self.email.as_deref())
            .max_len("email", self.email.as_deref(), 100)
            .max_len("phone", self.phone.as_deref(), 20)
            .max_len("mobile", self.mobile.as_deref(), 20)
            .max_len("linkedinUrl", self.linkedin_url.as_deref(), 100)
            .finish()
    }
}

impl Validate for ContactPatch {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .not_blank("firstName", self.first_name.as_deref())
            .max_len("firstName", self.first_name.as_deref(), 50)
            .not_blank("lastName", self.last_name.as_deref())
            .max_len("lastName", self.last_name.as_deref(), 50)
            .max_len("jobTitle", self.job_title.as_deref(), 100)
            .email("email", self.email.as_deref())
            .max_len("email", self.email.as_deref(), 100)
            .max_len("phone", self.phone.as_deref(), 20)
            .max_len("mobile", self.mobile.as_deref(), 20)
            .max_len("linkedinUrl", self.linkedin_url.as_deref(), 100)
            .finish()
    }
}

impl Validate for LeadDraft {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .required("firstName", &self.first_name)
            .max_len("firstName", Some(&self.first_name), 50)
            .required("lastName", &self.last_name)
            .max_len("lastName", Some(&self.last_name), 50)
            .max_len("company", self.company.as_deref(), 100)
            .max_len("jobTitle", self.job_title.as_deref(), 100)
            .email("email", self.email.as_deref())
            .max_len("email", self.email.as_deref(), 100)
            .max_len("phone", self.phone.as_deref(), 20)
            .max_len("notes", self.notes.as_deref(), 500)
            .money("estimatedValue", self.estimated_value)
            .finish()
    }
}

impl Validate for LeadPatch {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .not_blank("firstName", self.first_name.as_deref())
            .max_len("firstName", self.first_name.as_deref(), 50)
            .not_blank("lastName", self.last_name.as_deref())
            .max_len("lastName", self.last_name.as_deref(), 50)
            .max_len("company", self.company.as_deref(), 100)
            .max_len("jobTitle", self.job_title.as_deref(), 100)
            .email("email", self.email.as_deref())
            .max_len("email", self.email.as_deref(), 100)
            .max_len("phone", self.phone.as_deref(), 20)
            .max_len("notes", self.notes.as_deref(), 500)
            .money("estimatedValue", self.estimated_value)
            .finish()
    }
}

impl Validate for OpportunityDraft {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .required("name", &self.name)
            .max_len("name", Some(&self.name), 200)
            .max_len("description", self.description.as_deref(), 500)
            .present("amount", self.amount.as_ref())
            .money("amount", self.amount)
            .percentage("probability", self.probability)
            .max_len("notes", self.notes.as_deref(), 1000)
            .present("customerId", self.customer_id.as_ref())
            .finish()
    }
}

impl Validate for OpportunityPatch {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .not_blank("name", self.name.as_deref())
            .max_len("name", self.name.as_deref(), 200)
            .max_len("description", self.description.as_deref(), 500)
            .money("amount", self.amount)
            .percentage("probability", self.probability)
            .max_len("notes", self.notes.as_deref(), 1000)
            .finish()
    }
}

impl Validate for ActivityDraft {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .required("subject", &self.subject)
            .max_len("subject", Some(&self.subject), 200)
            .max_len("description", self.description.as_deref(), 1000)
            .present("type", self.activity_type.as_ref())
            .max_len("outcome", self.outcome.as_deref(), 1000)
            .finish()
    }
}

impl Validate for ActivityPatch {
    fn validate(&self) -> Result<()> {
        Checks::new()
            .not_blank("subject", self.subject.as_deref())
            .max_len("subject", self.subject.as_deref(), 200)
            .max_len("description", self.description.as_deref(), 1000)
            .max_len("outcome", self.outcome.as_deref(), 1000)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::domain::ActivityType;

    fn fields(err: CrmError) -> Vec<&'static str> {
        err.field_errors().iter().map(|e| e.field).collect()
    }

    #[test]
    fn blank_company_name_is_rejected() {
        let err = CustomerDraft::new("   ").validate().unwrap_err();
        assert_eq!(fields(err), vec!["companyName"]);
    }

    #[test]
    fn every_failing_field_is_reported() {
        let mut draft = ContactDraft::new("", "");
        draft.email = Some("not-an-email".into());
        draft.phone = Some("0".repeat(21));
        let err = draft.validate().unwrap_err();
        assert_eq!(fields(err), vec!["firstName", "lastName", "email", "phone"]);
    }

    #[test]
    fn email_shape() {
        let mut checks = Checks::new();
        checks
            .email("a", Some("jane@acme.io"))
            .email("b", Some(""))
            .email("c", None);
        assert!(checks.is_empty());

        checks.email("d", Some("jane@acme")).email("e", Some("@acme.io"));
        let err = checks.finish().unwrap_err();
        assert_eq!(fields(err), vec!["d", "e"]);
    }

    #[test]
    fn opportunity_requires_amount_and_customer() {
        let mut draft = OpportunityDraft::new("Deal", Decimal::ONE, EntityId(1));
        draft.amount = None;
        draft.customer_id = None;
        let err = draft.validate().unwrap_err();
        assert_eq!(fields(err), vec!["amount", "customerId"]);
    }

    #[test]
    fn opportunity_numeric_ranges() {
        let mut draft = OpportunityDraft::new("Deal", Decimal::NEGATIVE_ONE, EntityId(1));
        draft.probability = Some(101);
        let err = draft.validate().unwrap_err();
        assert_eq!(fields(err), vec!["amount", "probability"]);

        let mut ok = OpportunityDraft::new("Deal", Decimal::ZERO, EntityId(1));
        ok.probability = Some(100);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn money_is_capped_at_twelve_digits() {
        assert_eq!(MAX_AMOUNT, Decimal::new(999_999_999_999, 2));

        let at_cap = OpportunityDraft::new("Deal", MAX_AMOUNT, EntityId(1));
        assert!(at_cap.validate().is_ok());

        let too_big = OpportunityDraft::new("Deal", Decimal::new(1_000_000_000_000, 2), EntityId(1));
        assert_eq!(fields(too_big.validate().unwrap_err()), vec!["amount"]);

        let patch = OpportunityPatch {
            amount: Some(Decimal::MAX),
            ..OpportunityPatch::default()
        };
        assert_eq!(fields(patch.validate().unwrap_err()), vec!["amount"]);

        let fractional = OpportunityDraft::new("Deal", Decimal::new(1_001, 3), EntityId(1));
        assert_eq!(fields(fractional.validate().unwrap_err()), vec!["amount"]);

        let mut lead = LeadDraft::new("Ada", "Lovelace");
        lead.estimated_value = Some(Decimal::MAX);
        assert_eq!(fields(lead.validate().unwrap_err()), vec!["estimatedValue"]);
        let lead_patch = LeadPatch {
            estimated_value: Some(Decimal::new(10_000_000_000, 0)),
            ..LeadPatch::default()
        };
        assert_eq!(fields(lead_patch.validate().unwrap_err()), vec!["estimatedValue"]);
    }

    #[test]
    fn activity_type_is_required() {
        let mut draft = ActivityDraft::new("Call", ActivityType::Call);
        assert!(draft.validate().is_ok());
        draft.activity_type = None;
        assert_eq!(fields(draft.validate().unwrap_err()), vec!["type"]);
    }

    #[test]
    fn empty_patch_is_valid_but_blank_name_is_not() {
        assert!(LeadPatch::default().validate().is_ok());
        let patch = LeadPatch {
            first_name: Some(" ".into()),
            ..LeadPatch::default()
        };
        assert_eq!(fields(patch.validate().unwrap_err()), vec!["firstName"]);
    }

    #[test]
    fn lengths_count_characters() {
        let name = "é".repeat(50);
        assert!(ContactDraft::new(name.clone(), "Doe").validate().is_ok());
        let err = ContactDraft::new(format!("{name}é"), "Doe").validate().unwrap_err();
        assert_eq!(fields(err), vec!["firstName"]);
    }
}
