use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use topology::TopologyError;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("Bad Request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Topology(err) => match err {
                TopologyError::UnknownNode(_) => StatusCode::NOT_FOUND,
                TopologyError::AlreadyExists(_) => StatusCode::CONFLICT,
                TopologyError::InvalidWeight(_) | TopologyError::SelfLink(_) => {
                    StatusCode::BAD_REQUEST
                }
                TopologyError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let error_message = match &self {
            ApiError::Topology(err) => err.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
        };

        if status_code.is_server_error() {
            tracing::error!("{}", self);
        }

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[test]
    fn test_topology_errors_map_to_status_codes() {
        let cases = [
            (TopologyError::UnknownNode("Z".into()), StatusCode::NOT_FOUND),
            (TopologyError::AlreadyExists("A".into()), StatusCode::CONFLICT),
            (TopologyError::InvalidWeight(-1.0), StatusCode::BAD_REQUEST),
            (TopologyError::SelfLink("A".into()), StatusCode::BAD_REQUEST),
            (
                TopologyError::InvariantViolation("dangling".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_is_api_response() {
        let response = ApiError::from(TopologyError::UnknownNode("Z".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Router not found: Z" })
        );
    }
}
