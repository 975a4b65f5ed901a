use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid address: {0}")] InvalidAddress(String),

    #[error("Unsupported chain: {0}")] UnsupportedChain(String),

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("RPC error: {0}")] Rpc(String),

    #[error("Chain error: {0}")] Chain(String),

    #[error("External API error: {0}")] External(String),

    #[error("Address is not tracked: {0}")] NotTracked(String),

    #[error("Configuration error: {0}")] Config(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn to_error_response(&self) -> ErrorResponse {
        let (code, field) = match self {
            AppError::InvalidAddress(_) => ("INVALID_ADDRESS", Some("address".to_string())),
            AppError::UnsupportedChain(_) => ("UNSUPPORTED_CHAIN", None),
            AppError::InvalidInput(_) => ("INVALID_INPUT", None),
            AppError::Rpc(_) => ("RPC_ERROR", None),
            AppError::Chain(_) => ("CHAIN_ERROR", None),
            AppError::External(_) => ("EXTERNAL_ERROR", None),
            AppError::NotTracked(_) => ("NOT_TRACKED", Some("address".to_string())),
            AppError::Config(_) => ("CONFIG_ERROR", None),
        };

        ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                field,
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotTracked(_) => axum::http::StatusCode::NOT_FOUND,
            | AppError::InvalidInput(_)
            | AppError::InvalidAddress(_)
            | AppError::UnsupportedChain(_) => {
                axum::http::StatusCode::BAD_REQUEST
            }
            AppError::Rpc(_) | AppError::Chain(_) | AppError::External(_) => {
                axum::http::StatusCode::BAD_GATEWAY
            }
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
