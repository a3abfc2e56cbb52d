use may_minihttp::Response;
use serde_json::Value;

use crate::context::HandlerResponse;

/// Value of the `X-Powered-By` header on every response.
pub const POWERED_BY: &str = "X-Powered-By: crudhook";

pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Write a JSON response with the standard headers.
pub fn write_json(res: &mut Response, status: u16, body: &Value) {
    res.status_code(usize::from(status), status_reason(status));
    res.header("Content-Type: application/json");
    res.header(POWERED_BY);
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"null".to_vec());
    res.body_vec(bytes);
}

pub fn write_handler_response(res: &mut Response, response: &HandlerResponse) {
    write_json(res, response.status, &response.body);
}
