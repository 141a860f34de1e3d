use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{convert, health};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(info(
    title = "remux-server",
    description = "MP4 audio remux relay",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(convert::ConvertApi::openapi());
    root
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api-docs/openapi.json", get(|| async { Json(get_docs()) }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn docs_cover_every_route() {
        let docs = get_docs();
        assert!(docs.paths.paths.contains_key("/"));
        assert!(docs.paths.paths.contains_key("/health"));
    }
}
