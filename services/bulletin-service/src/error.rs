use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bulletin_utils::{BulletinError, ErrorResponse};

/// Handler error rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError(pub BulletinError);

impl From<BulletinError> for ApiError {
    fn from(error: BulletinError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_error_tier() {
        let response = ApiError(BulletinError::no_matching_template("x")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            ApiError(BulletinError::external_service("Yparéo", Some(503), "down")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = ApiError(BulletinError::conversion("soffice")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
