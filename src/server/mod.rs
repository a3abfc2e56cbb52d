//! HTTP transport on `may_minihttp`.
//!
//! Each connection is served on its own `may` coroutine. [`AppService`] parses the
//! request, serves `GET /health`, matches the route, and runs the controller
//! operation; every response is JSON and carries `X-Powered-By: crudhook`.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_query_params, parse_request, ParsedRequest};
pub use response::{status_reason, write_handler_response, write_json};
pub use service::{health_response, AppService, HEALTH_PATH};
