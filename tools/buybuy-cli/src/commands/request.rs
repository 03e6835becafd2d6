//! Run one read request through the HTTP boundary.

use anyhow::{Context as _, Result};
use buybuy_api::CatalogApi;
use http::Request;

use super::RequestArgs;
use crate::context::Context;

/// Run the request command.
pub async fn run(args: RequestArgs, ctx: &Context) -> Result<()> {
    let api = CatalogApi::new(ctx.open_catalog()?);

    let path = if args.path.starts_with('/') {
        args.path.clone()
    } else {
        format!("/{}", args.path)
    };
    let request = Request::get(path.as_str())
        .body(())
        .with_context(|| format!("Invalid request path: {}", path))?;

    let response = api.handle(&request);
    let body: serde_json::Value = serde_json::from_str(response.body())?;

    if !args.body_only && !ctx.output.is_json() {
        let status = response.status();
        let request_id = response
            .headers()
            .get(buybuy_api::REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        if status.is_success() {
            ctx.output.success(&format!("{} ({})", status, request_id));
        } else {
            ctx.output.warn(&format!("{} ({})", status, request_id));
        }
    }

    ctx.output.json(&body);
    Ok(())
}
