use serde::Serialize;

/// Response of `POST /repo/create-readme`: the full generated reply as a
/// single JSON payload (no streaming on this path).
#[derive(Debug, Serialize)]
pub struct CreateReadmeResponse {
    pub message: String,
}
