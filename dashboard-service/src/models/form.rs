//! Invoice form schema: coercion of raw form fields and the derived
//! create/update validators.
//!
//! Validation is pure. It never touches the store and reports every
//! invalid field at once, keyed by the form's field names.

use crate::models::InvoiceStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

pub const CUSTOMER_ID_FIELD: &str = "customerId";
pub const AMOUNT_FIELD: &str = "amount";
pub const STATUS_FIELD: &str = "status";

pub const CUSTOMER_ID_MESSAGE: &str = "Please select a customer";
pub const AMOUNT_MESSAGE: &str = "Please enter an amount greater than $0";
pub const STATUS_MESSAGE: &str = "Please select an invoice status";

/// Raw form submission. A missing key is `None`; extra keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFormData {
    pub customer_id: Option<String>,
    pub amount: Option<String>,
    pub status: Option<String>,
}

impl InvoiceFormData {
    pub fn new(customer_id: &str, amount: &str, status: &str) -> Self {
        Self {
            customer_id: Some(customer_id.to_string()),
            amount: Some(amount.to_string()),
            status: Some(status.to_string()),
        }
    }
}

/// Base invoice schema after coercion. `id` and `date` are never part of it:
/// the id comes from the route and the date from the clock.
#[derive(Debug, Validate)]
struct InvoiceFields {
    #[validate(
        required(message = "Please select a customer"),
        length(min = 1, message = "Please select a customer")
    )]
    customer_id: Option<String>,

    #[validate(
        required(message = "Please enter an amount greater than $0"),
        range(exclusive_min = 0.0, message = "Please enter an amount greater than $0")
    )]
    amount: Option<f64>,

    #[validate(required(message = "Please select an invoice status"))]
    status: Option<InvoiceStatus>,
}

impl InvoiceFields {
    fn coerce(form: &InvoiceFormData) -> Self {
        Self {
            customer_id: form.customer_id.as_deref().map(|c| c.trim().to_string()),
            amount: coerce_amount(form.amount.as_deref()),
            status: form.status.as_deref().and_then(InvoiceStatus::parse),
        }
    }
}

/// Text-to-number coercion for the amount field.
///
/// Missing or blank input coerces to `0` (and then fails the `> 0` rule).
/// Only decimal notation is accepted: hex, binary or octal literals and
/// anything that is not a finite number yield `None`.
pub fn coerce_amount(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Converts whole currency units to cents, rounding half away from zero.
///
/// `None` when the result is below one cent or does not fit in an `i64`.
pub fn dollars_to_cents(amount: f64) -> Option<i64> {
    let cents = (amount * 100.0).round();
    if !cents.is_finite() || cents < 1.0 || cents >= i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        let messages = self.0.entry(field.to_string()).or_default();
        if !messages.iter().any(|m| m == message) {
            messages.push(message.to_string());
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let field = field.to_string();
            let wire_name = match field.as_str() {
                "customer_id" => CUSTOMER_ID_FIELD,
                "amount" => AMOUNT_FIELD,
                "status" => STATUS_FIELD,
                other => other,
            };
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(wire_name, &message);
            }
        }
        out
    }
}

/// Invoice data that passed a schema, with the amount already in cents.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInvoice {
    pub customer_id: String,
    pub amount: f64,
    pub amount_in_cents: i64,
    pub status: InvoiceStatus,
}

/// Derived views of the base schema. Both omit `id` and `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceSchema {
    Create,
    Update,
}

impl InvoiceSchema {
    pub fn name(&self) -> &'static str {
        match self {
            InvoiceSchema::Create => "create_invoice",
            InvoiceSchema::Update => "update_invoice",
        }
    }

    pub fn validate(&self, form: &InvoiceFormData) -> Result<ValidatedInvoice, FieldErrors> {
        let fields = InvoiceFields::coerce(form);

        let mut errors = match fields.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        // A positive amount can still round to zero cents (0.004).
        let cents = fields.amount.and_then(dollars_to_cents);
        if cents.is_none() && !errors.contains(AMOUNT_FIELD) {
            errors.add(AMOUNT_FIELD, AMOUNT_MESSAGE);
        }

        match (fields.customer_id, fields.amount, cents, fields.status) {
            (Some(customer_id), Some(amount), Some(amount_in_cents), Some(status))
                if errors.is_empty() =>
            {
                Ok(ValidatedInvoice {
                    customer_id,
                    amount,
                    amount_in_cents,
                    status,
                })
            }
            _ => {
                tracing::debug!(
                    schema = self.name(),
                    fields = ?errors.fields().collect::<Vec<_>>(),
                    "Invoice form rejected"
                );
                Err(errors)
            }
        }
    }
}
