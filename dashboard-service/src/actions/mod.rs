//! Invoice form actions: validate, write once, then revalidate and redirect.
//!
//! Actions return an [`ActionOutcome`] instead of redirecting themselves;
//! the HTTP layer turns the outcome into a response.

use crate::models::{FieldErrors, InvoiceChanges, InvoiceFormData, InvoiceSchema, NewInvoice};
use crate::services::metrics::record_action;
use crate::services::{InvoiceStore, ViewCache, INVOICES_PATH};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

pub const CREATE_VALIDATION_MESSAGE: &str = "Missing Fields. Failed to Create Invoice";
pub const UPDATE_VALIDATION_MESSAGE: &str = "Missing Fields. Failed to Edit Invoice";
pub const CREATE_STORE_MESSAGE: &str = "Database error: Failed to create invoice";
pub const DELETE_FAULT_MESSAGE: &str = "Failed to Delete Invoice";

fn update_store_message(id: &str) -> String {
    format!("Database error. Failed to update invoice id: {}", id)
}

fn delete_store_message(id: &str) -> String {
    format!("Database error. Failed to delete invoice id: {}", id)
}

/// Whether delete performs the deletion or fails before touching anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Every delete fails with [`DELETE_FAULT_MESSAGE`]; nothing is removed.
    #[default]
    Disabled,
    /// Delete by id, then revalidate the listing.
    Enabled,
}

/// State shown back on the form after a failed submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default, skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FormState {
    pub fn invalid(errors: FieldErrors, message: &str) -> Self {
        Self {
            errors,
            message: Some(message.to_string()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            errors: FieldErrors::new(),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Write succeeded and the listing was revalidated; go to `to`.
    Redirect { to: String },
    /// Delete succeeded and the listing was revalidated. No navigation.
    Deleted,
    /// The form did not pass the schema. Nothing was written.
    ValidationFailure(FormState),
    /// The single store statement failed. Nothing was revalidated.
    StoreFailure(FormState),
}

impl ActionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ActionOutcome::Redirect { .. } => "redirect",
            ActionOutcome::Deleted => "deleted",
            ActionOutcome::ValidationFailure(_) => "validation_failure",
            ActionOutcome::StoreFailure(_) => "store_failure",
        }
    }

    pub fn form_state(&self) -> Option<&FormState> {
        match self {
            ActionOutcome::ValidationFailure(state) | ActionOutcome::StoreFailure(state) => {
                Some(state)
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct InvoiceActions {
    store: Arc<dyn InvoiceStore>,
    cache: Arc<dyn ViewCache>,
    delete_mode: DeleteMode,
}

impl InvoiceActions {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        cache: Arc<dyn ViewCache>,
        delete_mode: DeleteMode,
    ) -> Self {
        Self {
            store,
            cache,
            delete_mode,
        }
    }

    pub fn delete_mode(&self) -> DeleteMode {
        self.delete_mode
    }

    #[instrument(skip(self, form))]
    pub async fn create_invoice(&self, form: &InvoiceFormData) -> ActionOutcome {
        let outcome = self.run_create(form).await;
        record_action("create", outcome.label());
        outcome
    }

    async fn run_create(&self, form: &InvoiceFormData) -> ActionOutcome {
        let valid = match InvoiceSchema::Create.validate(form) {
            Ok(valid) => valid,
            Err(errors) => {
                return ActionOutcome::ValidationFailure(FormState::invalid(
                    errors,
                    CREATE_VALIDATION_MESSAGE,
                ))
            }
        };

        let invoice = NewInvoice {
            customer_id: valid.customer_id,
            amount_in_cents: valid.amount_in_cents,
            status: valid.status,
            date: Utc::now().date_naive(),
        };

        match self.store.insert(&invoice).await {
            Ok(row) => {
                tracing::info!(invoice_id = %row.id, amount = row.amount, "Invoice created");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create invoice");
                return ActionOutcome::StoreFailure(FormState::message(CREATE_STORE_MESSAGE));
            }
        }

        self.revalidate_and_redirect()
    }

    /// `id` comes from the route and is trusted: there is no existence
    /// check, so an unknown id still redirects.
    #[instrument(skip(self, form))]
    pub async fn update_invoice(&self, id: &str, form: &InvoiceFormData) -> ActionOutcome {
        let outcome = self.run_update(id, form).await;
        record_action("update", outcome.label());
        outcome
    }

    async fn run_update(&self, id: &str, form: &InvoiceFormData) -> ActionOutcome {
        let valid = match InvoiceSchema::Update.validate(form) {
            Ok(valid) => valid,
            Err(errors) => {
                return ActionOutcome::ValidationFailure(FormState::invalid(
                    errors,
                    UPDATE_VALIDATION_MESSAGE,
                ))
            }
        };

        let changes = InvoiceChanges {
            customer_id: valid.customer_id,
            amount_in_cents: valid.amount_in_cents,
            status: valid.status,
        };

        if let Err(e) = self.store.update(id, &changes).await {
            tracing::error!(error = %e, invoice_id = %id, "Failed to update invoice");
            return ActionOutcome::StoreFailure(FormState::message(update_store_message(id)));
        }

        tracing::info!(invoice_id = %id, "Invoice updated");
        self.revalidate_and_redirect()
    }

    /// With [`DeleteMode::Disabled`] this always fails before any store or
    /// cache interaction, and the failure is an error rather than a form
    /// state.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, id: &str) -> Result<ActionOutcome, AppError> {
        if self.delete_mode == DeleteMode::Disabled {
            record_action("delete", "fault");
            tracing::warn!(invoice_id = %id, "Delete rejected: invoice deletion is disabled");
            return Err(AppError::InternalError(anyhow::anyhow!(DELETE_FAULT_MESSAGE)));
        }

        let outcome = match self.store.delete(id).await {
            Ok(()) => {
                tracing::info!(invoice_id = %id, "Invoice deleted");
                self.cache.revalidate_path(INVOICES_PATH);
                ActionOutcome::Deleted
            }
            Err(e) => {
                tracing::error!(error = %e, invoice_id = %id, "Failed to delete invoice");
                ActionOutcome::StoreFailure(FormState::message(delete_store_message(id)))
            }
        };

        record_action("delete", outcome.label());
        Ok(outcome)
    }

    fn revalidate_and_redirect(&self) -> ActionOutcome {
        self.cache.revalidate_path(INVOICES_PATH);
        ActionOutcome::Redirect {
            to: INVOICES_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceStatus, AMOUNT_FIELD, STATUS_FIELD};
    use crate::services::{MockInvoiceStore, PathCache, StoreCall};

    struct Harness {
        store: Arc<MockInvoiceStore>,
        cache: Arc<PathCache>,
        actions: InvoiceActions,
    }

    fn harness(store: MockInvoiceStore, delete_mode: DeleteMode) -> Harness {
        let store = Arc::new(store);
        let cache = Arc::new(PathCache::new());
        let actions = InvoiceActions::new(store.clone(), cache.clone(), delete_mode);
        Harness {
            store,
            cache,
            actions,
        }
    }

    fn valid_form() -> InvoiceFormData {
        InvoiceFormData::new("cust-1", "12.34", "paid")
    }

    #[tokio::test]
    async fn create_inserts_once_then_revalidates_and_redirects() {
        let h = harness(MockInvoiceStore::recording(), DeleteMode::Disabled);

        let before = Utc::now().date_naive();
        let outcome = h.actions.create_invoice(&valid_form()).await;
        let after = Utc::now().date_naive();

        assert_eq!(
            outcome,
            ActionOutcome::Redirect {
                to: INVOICES_PATH.to_string()
            }
        );

        let calls = h.store.calls();
        assert_eq!(calls.len(), 1);
        let StoreCall::Insert(inserted) = &calls[0] else {
            panic!("expected insert, got {:?}", calls[0]);
        };
        assert_eq!(inserted.customer_id, "cust-1");
        assert_eq!(inserted.amount_in_cents, 1234);
        assert_eq!(inserted.status, InvoiceStatus::Paid);
        assert!(inserted.date == before || inserted.date == after);

        assert_eq!(h.cache.revalidation_count(INVOICES_PATH), 1);
    }

    #[tokio::test]
    async fn create_with_invalid_form_never_reaches_the_store() {
        let h = harness(MockInvoiceStore::recording(), DeleteMode::Disabled);

        let outcome = h
            .actions
            .create_invoice(&InvoiceFormData::new("cust-1", "0", "unknown"))
            .await;

        let ActionOutcome::ValidationFailure(state) = outcome else {
            panic!("expected validation failure");
        };
        assert_eq!(state.message.as_deref(), Some(CREATE_VALIDATION_MESSAGE));
        assert!(state.errors.contains(AMOUNT_FIELD));
        assert!(state.errors.contains(STATUS_FIELD));
        assert!(h.store.calls().is_empty());
        assert_eq!(h.cache.revalidation_count(INVOICES_PATH), 0);
    }

    #[tokio::test]
    async fn create_store_failure_skips_revalidation() {
        let h = harness(MockInvoiceStore::failing(), DeleteMode::Disabled);

        let outcome = h.actions.create_invoice(&valid_form()).await;

        assert_eq!(
            outcome,
            ActionOutcome::StoreFailure(FormState::message(CREATE_STORE_MESSAGE))
        );
        assert_eq!(h.store.write_count(), 1);
        assert_eq!(h.cache.revalidation_count(INVOICES_PATH), 0);
    }

    #[tokio::test]
    async fn update_of_unknown_id_still_redirects() {
        let h = harness(MockInvoiceStore::recording(), DeleteMode::Disabled);
        let id = "99999999-9999-9999-9999-999999999999";

        let outcome = h.actions.update_invoice(id, &valid_form()).await;

        assert!(matches!(outcome, ActionOutcome::Redirect { .. }));
        assert_eq!(
            h.store.calls(),
            vec![StoreCall::Update {
                id: id.to_string(),
                changes: InvoiceChanges {
                    customer_id: "cust-1".to_string(),
                    amount_in_cents: 1234,
                    status: InvoiceStatus::Paid,
                },
            }]
        );
        assert_eq!(h.cache.revalidation_count(INVOICES_PATH), 1);
    }

    #[tokio::test]
    async fn update_validation_uses_edit_message() {
        let h = harness(MockInvoiceStore::recording(), DeleteMode::Disabled);

        let outcome = h
            .actions
            .update_invoice("abc", &InvoiceFormData::default())
            .await;

        assert_eq!(
            outcome.form_state().and_then(|s| s.message.as_deref()),
            Some(UPDATE_VALIDATION_MESSAGE)
        );
        assert!(h.store.calls().is_empty());
    }

    #[tokio::test]
    async fn update_store_failure_names_the_id() {
        let h = harness(MockInvoiceStore::failing(), DeleteMode::Disabled);

        let outcome = h.actions.update_invoice("inv-7", &valid_form()).await;

        assert_eq!(
            outcome,
            ActionOutcome::StoreFailure(FormState::message(
                "Database error. Failed to update invoice id: inv-7"
            ))
        );
        assert_eq!(h.cache.revalidation_count(INVOICES_PATH), 0);
    }

    #[tokio::test]
    async fn disabled_delete_fails_before_touching_anything() {
        let h = harness(MockInvoiceStore::recording(), DeleteMode::Disabled);
        h.actions.create_invoice(&valid_form()).await;
        let id = h.store.rows()[0].id;
        let calls_before = h.store.calls().len();

        let result = h.actions.delete_invoice(&id.to_string()).await;

        match result {
            Err(AppError::InternalError(e)) => assert_eq!(e.to_string(), DELETE_FAULT_MESSAGE),
            other => panic!("expected internal error, got {:?}", other),
        }
        assert_eq!(h.store.calls().len(), calls_before);
        assert!(h.store.get(id).is_some());
        assert_eq!(h.cache.revalidation_count(INVOICES_PATH), 1);
    }

    #[tokio::test]
    async fn enabled_delete_removes_and_revalidates_without_redirect() {
        let h = harness(MockInvoiceStore::recording(), DeleteMode::Enabled);
        h.actions.create_invoice(&valid_form()).await;
        let id = h.store.rows()[0].id;

        let outcome = h.actions.delete_invoice(&id.to_string()).await.unwrap();

        assert_eq!(outcome, ActionOutcome::Deleted);
        assert!(h.store.get(id).is_none());
        assert_eq!(h.cache.revalidation_count(INVOICES_PATH), 2);
    }

    #[tokio::test]
    async fn enabled_delete_reports_store_failure() {
        let h = harness(MockInvoiceStore::failing(), DeleteMode::Enabled);

        let outcome = h.actions.delete_invoice("inv-9").await.unwrap();

        assert_eq!(
            outcome,
            ActionOutcome::StoreFailure(FormState::message(
                "Database error. Failed to delete invoice id: inv-9"
            ))
        );
        assert_eq!(h.cache.revalidation_count(INVOICES_PATH), 0);
    }
}
