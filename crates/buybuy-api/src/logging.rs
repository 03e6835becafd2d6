//! Access logging with request context.

use http::StatusCode;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::context::RequestContext;

/// One access-log record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccessRecord {
    pub request_id: String,
    pub method: String,
    /// Route pattern, or the raw path when no route matched.
    pub route: String,
    pub status: u16,
    pub elapsed_us: u64,
}

impl AccessRecord {
    /// Capture a record for a finished request.
    pub fn new(ctx: &RequestContext, route: Option<&'static str>, status: StatusCode) -> Self {
        Self {
            request_id: ctx.request_id.to_string(),
            method: ctx.method.to_string(),
            route: route.map(str::to_string).unwrap_or_else(|| ctx.path.clone()),
            status: status.as_u16(),
            elapsed_us: ctx.elapsed_us(),
        }
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        format!(
            "{} {} -> {} ({}us) [{}]",
            self.method, self.route, self.status, self.elapsed_us, self.request_id
        )
    }

    /// Emit the record: info for success, warn for client errors, error for server errors.
    pub fn emit(&self) {
        let Self {
            request_id,
            method,
            route,
            status,
            elapsed_us,
        } = self;
        if *status >= 500 {
            error!(%request_id, %method, %route, status, elapsed_us, "request failed");
        } else if *status >= 400 {
            warn!(%request_id, %method, %route, status, elapsed_us, "request rejected");
        } else {
            info!(%request_id, %method, %route, status, elapsed_us, "request handled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_record_uses_route_pattern() {
        let ctx = RequestContext::new(Method::GET, "/categories/42/?x=1");
        let record = AccessRecord::new(&ctx, Some("/categories/{id}/"), StatusCode::OK);
        assert_eq!(record.route, "/categories/{id}/");
        assert_eq!(record.method, "GET");
        assert_eq!(record.status, 200);
        assert_eq!(record.request_id, ctx.request_id.to_string());
    }

    #[test]
    fn test_record_falls_back_to_path() {
        let ctx = RequestContext::new(Method::GET, "/nowhere");
        let record = AccessRecord::new(&ctx, None, StatusCode::NOT_FOUND);
        assert_eq!(record.route, "/nowhere");
        assert!(record.to_human().starts_with("GET /nowhere -> 404"));
    }
}
