//! Error handling for the STACKS HTTP layer

use askama::Template;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::response::HtmlTemplate;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("{service} request failed: {message}")]
    ExternalService {
        service: String,
        message: String,
        code: String,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create an error for a failed call to an upstream service
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
            code: "external_service_error".to_string(),
        }
    }

    /// HTTP status this error renders with
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ExternalService { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Template)]
#[template(path = "page-not-found.html")]
struct NotFoundPage {
    message: String,
    trace_id: String,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage {
    status: u16,
    code: String,
    message: String,
    trace_id: String,
    timestamp: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::now_v7();
        let timestamp = OffsetDateTime::now_utc().to_string();
        let status = self.status();

        let (error_code, message) = match self {
            AppError::NotFound { message, code } => (code, message),
            AppError::ExternalService {
                service,
                message,
                code,
            } => (code, format!("{service}: {message}")),
            AppError::Internal(e) => ("internal_error".to_string(), format!("{e:#}")),
        };

        if status == StatusCode::NOT_FOUND {
            tracing::info!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                %message,
                "Request error"
            );
            return HtmlTemplate::new(NotFoundPage {
                message,
                trace_id: error_id.to_string(),
            })
            .with_status(status)
            .into_response();
        }

        tracing::error!(
            error_id = %error_id,
            error_code = %error_code,
            status_code = %status.as_u16(),
            %message,
            "Request error"
        );

        // Upstream and internal details stay in the logs for release builds
        let message = if cfg!(not(debug_assertions)) {
            "There was an error on the server".to_string()
        } else {
            message
        };

        HtmlTemplate::new(ErrorPage {
            status: status.as_u16(),
            code: error_code,
            message,
            trace_id: error_id.to_string(),
            timestamp,
        })
        .with_status(status)
        .into_response()
    }
}
