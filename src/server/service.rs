use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::request::{parse_request, ParsedRequest};
use super::response::write_handler_response;
use crate::app::App;
use crate::context::{HandlerResponse, RequestContext, ResponseSink};
use crate::error::ErrorBody;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::router::Router;
use crate::wire;

/// Path of the liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

/// `may_minihttp` service serving every wired resource.
///
/// Cloned once per connection; clones share the application and router.
#[derive(Clone)]
pub struct AppService {
    app: Arc<App>,
    router: Arc<Router>,
}

impl AppService {
    #[must_use]
    pub fn new(app: App) -> Self {
        let router = Arc::new(app.router());
        Self {
            app: Arc::new(app),
            router,
        }
    }

    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Produce the single response for one parsed request.
    pub fn handle(&self, req: ParsedRequest) -> HandlerResponse {
        let request_id = RequestId::from_header_or_new(
            req.headers.get(REQUEST_ID_HEADER).map(String::as_str),
        );
        let started = Instant::now();
        let response = self.dispatch(req, request_id);
        info!(
            request_id = %request_id,
            status = response.status,
            duration_us = started.elapsed().as_micros(),
            "Request completed"
        );
        response
    }

    fn dispatch(&self, req: ParsedRequest, request_id: RequestId) -> HandlerResponse {
        if req.method == "GET" && req.path == HEALTH_PATH {
            return health_response();
        }

        let Some((method, route_match)) = Method::from_bytes(req.method.as_bytes())
            .ok()
            .and_then(|m| self.router.route(&m, &req.path).map(|r| (m, r)))
        else {
            return error_response(
                404,
                ErrorBody::new("notfound", format!("No route for {} {}", req.method, req.path)),
            );
        };

        if let Some(reason) = req.body_error {
            warn!(request_id = %request_id, error = %reason, "Request body is not valid JSON");
            return error_response(400, ErrorBody::new("invalidbody", reason));
        }

        let route = route_match.route;
        let Some(controller) = self.app.collection(&route.resource) else {
            error!(
                request_id = %request_id,
                resource = %route.resource,
                "Route refers to an unregistered resource"
            );
            return error_response(500, ErrorBody::new("internal", "Resource not registered"));
        };

        let mut ctx = RequestContext::new(&route.resource, method, &req.path)
            .with_request_id(request_id);
        ctx.path_params = route_match.path_params;
        ctx.query_params = req.query_params;
        ctx.headers = req.headers;
        ctx.body = req.body;

        let mut sink = ResponseSink::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            wire::invoke(controller, route.operation, &mut ctx, &mut sink)
        }));

        match outcome {
            Ok(Ok(())) => sink.into_response().unwrap_or_else(|| {
                error!(
                    request_id = %request_id,
                    resource = %route.resource,
                    operation = %route.operation,
                    "Operation finished without a response"
                );
                error_response(500, ErrorBody::new("internal", "No response produced"))
            }),
            Ok(Err(err)) => match sink.into_response() {
                // A response already went out; the error was a rejected second send.
                Some(first) => {
                    error!(request_id = %request_id, error = %err, "Error after response was sent");
                    first
                }
                None => {
                    let status = err.status();
                    if status >= 500 {
                        error!(request_id = %request_id, status, error = %err, "Request failed");
                    } else {
                        info!(request_id = %request_id, status, error = %err, "Request rejected");
                    }
                    error_response(status, err.body())
                }
            },
            Err(panic) => {
                let panic_message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(
                    request_id = %request_id,
                    resource = %route.resource,
                    operation = %route.operation,
                    panic_message = %panic_message,
                    "Listener or operation panicked"
                );
                error_response(500, ErrorBody::new("internal", "Internal server error"))
            }
        }
    }
}

/// `{ "status": "ok" }`
#[must_use]
pub fn health_response() -> HandlerResponse {
    HandlerResponse::json(200, json!({ "status": "ok" }))
}

fn error_response(status: u16, body: ErrorBody) -> HandlerResponse {
    HandlerResponse::json(status, body.into_value())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let response = self.handle(parse_request(req));
        write_handler_response(res, &response);
        Ok(())
    }
}
