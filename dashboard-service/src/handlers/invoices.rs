//! Invoice form endpoints.

use crate::actions::ActionOutcome;
use crate::models::InvoiceFormData;
use crate::services::invoices_view;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use service_core::error::AppError;

/// Header telling clients whether the listing came from the view cache.
pub const VIEW_CACHE_HEADER: &str = "x-view-cache";

pub async fn list_invoices(State(state): State<AppState>) -> Result<Response, AppError> {
    let (view, source) = invoices_view(state.store.as_ref(), state.cache.as_ref()).await?;

    let mut response = Json(view.body.as_ref().clone()).into_response();
    response.headers_mut().insert(
        VIEW_CACHE_HEADER,
        HeaderValue::from_static(source.as_str()),
    );
    Ok(response)
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Form(form): Form<InvoiceFormData>,
) -> Response {
    state.actions.create_invoice(&form).await.into_response()
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<InvoiceFormData>,
) -> Response {
    state.actions.update_invoice(&id, &form).await.into_response()
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    Ok(state.actions.delete_invoice(&id).await?.into_response())
}

impl IntoResponse for ActionOutcome {
    fn into_response(self) -> Response {
        match self {
            ActionOutcome::Redirect { to } => {
                let location = match HeaderValue::from_str(&to) {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::error!(error = %e, to = %to, "Unusable redirect target");
                        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                    }
                };
                (
                    StatusCode::SEE_OTHER,
                    [
                        (header::LOCATION, location.clone()),
                        (header::HeaderName::from_static("hx-redirect"), location),
                    ],
                )
                    .into_response()
            }
            ActionOutcome::Deleted => StatusCode::NO_CONTENT.into_response(),
            ActionOutcome::ValidationFailure(state) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(state)).into_response()
            }
            ActionOutcome::StoreFailure(state) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(state)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::FormState;

    #[test]
    fn redirect_sets_location_and_htmx_header() {
        let response = ActionOutcome::Redirect {
            to: "/dashboard/invoices".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/dashboard/invoices");
        assert_eq!(response.headers()["hx-redirect"], "/dashboard/invoices");
    }

    #[test]
    fn failures_map_to_distinct_statuses() {
        let invalid = ActionOutcome::ValidationFailure(FormState::default()).into_response();
        let failed = ActionOutcome::StoreFailure(FormState::message("boom")).into_response();

        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ActionOutcome::Deleted.into_response().status(), StatusCode::NO_CONTENT);
    }
}
