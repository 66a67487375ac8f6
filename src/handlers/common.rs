use crate::errors::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Validate request input, mapping failures onto the closed error taxonomy
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::InvalidInput(format!("Validation failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(range(min = 1))]
        quantity: i32,
    }

    #[test]
    fn validate_input_maps_to_invalid_input() {
        let err = validate_input(&Probe { quantity: 0 }).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        assert!(validate_input(&Probe { quantity: 2 }).is_ok());
    }
}
