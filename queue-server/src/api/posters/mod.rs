//! 海报文件服务 (公开)

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use http::header;

use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/posters/{file}", get(serve_poster))
}

/// GET /api/posters/:file
async fn serve_poster(
    State(state): State<ServerState>,
    Path(file): Path<String>,
) -> AppResult<impl IntoResponse> {
    let content = state.posters.read(&file).await?;
    let mime = mime_guess::from_path(&file).first_or(mime_guess::mime::IMAGE_JPEG);

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        Bytes::from(content),
    ))
}
