//! Domain models for dashboard-service.

mod form;
mod invoice;

pub use form::{
    coerce_amount, dollars_to_cents, FieldErrors, InvoiceFormData, InvoiceSchema,
    ValidatedInvoice, AMOUNT_FIELD, AMOUNT_MESSAGE, CUSTOMER_ID_FIELD, CUSTOMER_ID_MESSAGE,
    STATUS_FIELD, STATUS_MESSAGE,
};
pub use invoice::{Invoice, InvoiceChanges, InvoiceStatus, NewInvoice};
