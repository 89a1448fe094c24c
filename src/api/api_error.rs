use crate::api::model::ErrorResponse;
use crate::error::Error;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

// google.rpc.Code values used by the upstream API.
const RPC_INVALID_ARGUMENT: u16 = 3;
const RPC_NOT_FOUND: u16 = 5;
const RPC_INTERNAL: u16 = 13;
const RPC_UNAUTHENTICATED: u16 = 16;

pub(crate) struct APIError(anyhow::Error);

impl APIError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<Error>() {
            // Bad tokens, unknown organizations and unknown domains all look the same to
            // callers so tenants can't be enumerated.
            Some(
                Error::Unauthorized
                | Error::InvalidOrganizationId(_)
                | Error::OrganizationNotFound(_)
                | Error::DomainNotFound(_, _),
            ) => StatusCode::UNAUTHORIZED,
            Some(Error::InvalidRecordId(_)) => StatusCode::BAD_REQUEST,
            Some(Error::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Any body that doesn't decode as a record, whatever the reason.
            None if self.0.is::<JsonRejection>() => StatusCode::BAD_REQUEST,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            StatusCode::UNAUTHORIZED => ErrorResponse::new(RPC_UNAUTHENTICATED, "Unauthorized"),
            StatusCode::BAD_REQUEST => ErrorResponse::new(RPC_INVALID_ARGUMENT, format!("{}", self.0)),
            StatusCode::NOT_FOUND => ErrorResponse::new(RPC_NOT_FOUND, format!("{}", self.0)),
            _ => {
                tracing::error!("internal error: {:?}", self.0);
                ErrorResponse::new(RPC_INTERNAL, "Internal error")
            }
        };
        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for APIError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::Unauthorized, StatusCode::UNAUTHORIZED),
            (Error::InvalidOrganizationId("x".into()), StatusCode::UNAUTHORIZED),
            (Error::OrganizationNotFound(1), StatusCode::UNAUTHORIZED),
            (Error::DomainNotFound(1, "a".into()), StatusCode::UNAUTHORIZED),
            (Error::InvalidRecordId("x".into()), StatusCode::BAD_REQUEST),
            (Error::RecordNotFound(1), StatusCode::NOT_FOUND),
            (Error::Conflict(1), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(APIError::from(err).status(), status);
        }
    }
}
