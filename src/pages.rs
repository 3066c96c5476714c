use actix_web::{body, http::{header::ContentType, StatusCode}, web, HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

use crate::payroll::{generator::GenerateError, records::EditError, store::StoreError, PeriodError};

mod advance;
mod payroll;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(web::scope("/payroll")
            .configure(payroll::config))
        .service(web::scope("/advance")
            .configure(advance::config));
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Edit(#[from] EditError),
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Duplicate | StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for PageError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        let status = self.status_code();

        let body = if status.is_server_error() {
            error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status)
            .insert_header(ContentType::plaintext())
            .body(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PageError::Period(_) => StatusCode::BAD_REQUEST,
            PageError::Generate(GenerateError::Directory(err)) => store_status(err),
            PageError::Store(err) => store_status(err),
            PageError::Edit(EditError::Deleted(_) | EditError::EmptyPatch) => StatusCode::BAD_REQUEST,
            PageError::Edit(EditError::Store(err)) => store_status(err),
            PageError::Edit(EditError::Ledger(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
