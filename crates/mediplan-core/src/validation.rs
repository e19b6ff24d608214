//! Field validation for create and update inputs.
//!
//! Validators collect every failing field before returning, so the caller
//! can display all problems at once. A non-empty result rejects the whole
//! operation.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::models::{InvoiceItem, NewPatient, NewUser, User};

/// Longest bookable visit, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Field name → user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Default)]
#[error("{}", summarize(.fields))]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn summarize(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Emails match ignoring surrounding whitespace and case.
pub fn same_email(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// `local@domain.tld`, no whitespace.
pub fn validate_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Moroccan number: `0` or `+212`, then 5, 6 or 7, then eight digits.
/// Whitespace is ignored.
pub fn validate_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    let rest = if let Some(rest) = compact.strip_prefix("+212") {
        rest
    } else if let Some(rest) = compact.strip_prefix('0') {
        rest
    } else {
        return false;
    };
    rest.len() == 9
        && rest.chars().all(|c| c.is_ascii_digit())
        && matches!(rest.as_bytes()[0], b'5'..=b'7')
}

fn check_contact(errors: &mut ValidationErrors, email: &str, phone: &str) {
    if !email.trim().is_empty() && !validate_email(email.trim()) {
        errors.add("email", "Email invalide");
    }
    if !phone.trim().is_empty() && !validate_phone(phone) {
        errors.add("phone", "Téléphone invalide");
    }
}

pub fn validate_new_patient(input: &NewPatient) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_patient_fields(&mut errors, &input.first_name, &input.last_name, &input.email, &input.phone);
    errors.into_result()
}

/// Shared by create and update: the merged patient must still be valid.
pub fn check_patient_fields(
    errors: &mut ValidationErrors,
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: &str,
) {
    if first_name.trim().is_empty() {
        errors.add("firstName", "Prénom requis");
    }
    if last_name.trim().is_empty() {
        errors.add("lastName", "Nom requis");
    }
    check_contact(errors, email, phone);
}

/// Validate a user against the rest of the collection. `exclude_id` skips the
/// user being edited in the uniqueness check.
pub fn check_user_fields(
    errors: &mut ValidationErrors,
    name: &str,
    email: &str,
    phone: &str,
    users: &[User],
    exclude_id: Option<&str>,
) {
    if name.trim().is_empty() {
        errors.add("name", "Nom requis");
    }
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "Email requis");
    } else if !validate_email(email) {
        errors.add("email", "Email invalide");
    } else if users
        .iter()
        .any(|u| Some(u.id.as_str()) != exclude_id && same_email(&u.email, email))
    {
        errors.add("email", "Cet email est déjà utilisé");
    }
    if !phone.trim().is_empty() && !validate_phone(phone) {
        errors.add("phone", "Téléphone invalide");
    }
}

pub fn validate_new_user(input: &NewUser, users: &[User]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_user_fields(&mut errors, &input.name, &input.email, &input.phone, users, None);
    if input.password.is_empty() {
        errors.add("password", "Mot de passe requis");
    }
    errors.into_result()
}

/// Duration and fee of a visit, checked only when given.
pub fn check_visit_terms(errors: &mut ValidationErrors, duration: Option<u32>, fee: Option<f64>) {
    if duration.is_some_and(|minutes| minutes == 0 || minutes > MAX_DURATION_MINUTES) {
        errors.add("duration", "Durée invalide");
    }
    if fee.is_some_and(|fee| !fee.is_finite() || fee < 0.0) {
        errors.add("fee", "Montant invalide");
    }
}

pub fn check_invoice_tax(errors: &mut ValidationErrors, tax: f64) {
    if !tax.is_finite() || tax < 0.0 {
        errors.add("tax", "Montant invalide");
    }
}

pub fn check_invoice_items(errors: &mut ValidationErrors, items: &[InvoiceItem]) {
    if items.is_empty() {
        errors.add("items", "Au moins une ligne requise");
        return;
    }
    if items.iter().any(|item| item.quantity < 1) {
        errors.add("items", "Quantité invalide");
    }
    if items
        .iter()
        .any(|item| !item.unit_price.is_finite() || item.unit_price < 0.0)
    {
        errors.add("items", "Prix unitaire invalide");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@mediplan.ma"));
        assert!(!validate_email("admin@mediplan"));
        assert!(!validate_email("admin mediplan.ma"));
        assert!(!validate_email("@mediplan.ma"));
        assert!(!validate_email("a@b@c.ma"));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0661234567"));
        assert!(validate_phone("06 61 23 45 67"));
        assert!(validate_phone("+212537000000"));
        assert!(!validate_phone("0861234567"));
        assert!(!validate_phone("066123456"));
        assert!(!validate_phone("+33612345678"));
    }

    #[test]
    fn test_patient_requires_names() {
        let errors = validate_new_patient(&NewPatient::named("  ", "")).unwrap_err();
        assert_eq!(errors.get("firstName"), Some("Prénom requis"));
        assert_eq!(errors.get("lastName"), Some("Nom requis"));
    }

    #[test]
    fn test_patient_optional_contact_is_checked_when_present() {
        let mut input = NewPatient::named("Salma", "Chraibi");
        assert!(validate_new_patient(&input).is_ok());
        input.phone = "12345".into();
        let errors = validate_new_patient(&input).unwrap_err();
        assert_eq!(errors.get("phone"), Some("Téléphone invalide"));
    }

    #[test]
    fn test_user_duplicate_email() {
        let existing = User {
            id: "u1".into(),
            name: "Dr. Fatima Alaoui".into(),
            email: "admin@mediplan.ma".into(),
            password_hash: "x".into(),
            role: Role::Admin,
            phone: String::new(),
            specialty: None,
            is_active: true,
            created_at: None,
        };
        let input = NewUser {
            name: "Autre".into(),
            email: "Admin@Mediplan.ma".into(),
            password: String::new(),
            role: Role::Secretary,
            phone: String::new(),
            specialty: None,
        };

        let errors = validate_new_user(&input, std::slice::from_ref(&existing)).unwrap_err();
        assert_eq!(errors.get("email"), Some("Cet email est déjà utilisé"));
        assert_eq!(errors.get("password"), Some("Mot de passe requis"));

        // Editing the owner of the email is not a conflict.
        let mut errors = ValidationErrors::new();
        check_user_fields(&mut errors, "Dr. Fatima", "admin@mediplan.ma", "", &[existing], Some("u1"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_invoice_items() {
        let mut errors = ValidationErrors::new();
        check_invoice_items(&mut errors, &[]);
        assert!(errors.get("items").is_some());

        let mut errors = ValidationErrors::new();
        check_invoice_items(&mut errors, &[InvoiceItem::new("Séance", 0, 300.0)]);
        assert_eq!(errors.get("items"), Some("Quantité invalide"));

        let mut errors = ValidationErrors::new();
        check_invoice_items(&mut errors, &[InvoiceItem::new("Séance", 1, 300.0)]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_visit_terms() {
        let mut errors = ValidationErrors::new();
        check_visit_terms(&mut errors, Some(45), Some(300.0));
        check_visit_terms(&mut errors, None, None);
        assert!(errors.is_empty());

        check_visit_terms(&mut errors, Some(u32::MAX), Some(f64::NAN));
        assert_eq!(errors.get("duration"), Some("Durée invalide"));
        assert_eq!(errors.get("fee"), Some("Montant invalide"));

        let mut errors = ValidationErrors::new();
        check_visit_terms(&mut errors, Some(0), None);
        assert!(errors.get("duration").is_some());
    }

    #[test]
    fn test_same_email_ignores_case() {
        assert!(same_email(" Admin@MediPlan.ma", "admin@mediplan.ma"));
        assert!(!same_email("admin@mediplan.ma", "admin@mediplan.com"));
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "Nom requis");
        errors.add("email", "Email requis");
        errors.add("email", "ignored");
        assert_eq!(errors.to_string(), "email: Email requis, name: Nom requis");
    }
}
