use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::metrics::VALIDATION_FAILURES;
use crate::renderer::capture;
use crate::state::AppState;
use crate::validate::validate;

// GET /take: validate, render, answer with the bytes
pub async fn take_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let request = validate(&params).map_err(|errors| {
        VALIDATION_FAILURES.inc();
        AppError::Validation(errors)
    })?;

    let image = capture(state.renderer.as_ref(), &request).await?;

    Ok((
        [(header::CONTENT_TYPE, request.output_type.content_type())],
        image,
    ))
}
