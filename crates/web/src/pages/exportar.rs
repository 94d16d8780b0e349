use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Redirect, Response};
use reqwest::Url;

use client::schema::ExportFormat;

use crate::AppState;

/// Proxy `/api/exportar/{formato}` as a browser download. On failure the
/// user is sent back to the page the link was on.
pub async fn download(
    State(state): State<AppState>,
    Path(formato): Path<String>,
    headers: HeaderMap,
) -> Response {
    let back = back_to(&headers);

    let Some(formato) = ExportFormat::parse(&formato) else {
        state
            .notifier
            .error(format!("Formato de exportación no soportado: {}", formato));
        return Redirect::to(&back).into_response();
    };

    match state.api.exportar(formato).await {
        Ok(file) => (
            [
                (header::CONTENT_TYPE, file.mime_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.file_name),
                ),
            ],
            file.bytes,
        )
            .into_response(),
        Err(_) => Redirect::to(&back).into_response(),
    }
}

/// Local path (and query) of the referring page, or `/`.
fn back_to(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| match Url::parse(referer) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            }),
            Ok(_) => None,
            Err(_) if referer.starts_with('/') && !referer.starts_with("//") => {
                Some(referer.to_string())
            }
            Err(_) => None,
        })
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_back_to_keeps_local_path_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(back_to(&headers), "/");

        headers.insert(
            header::REFERER,
            HeaderValue::from_static("http://evil.example/reporte?x=1"),
        );
        assert_eq!(back_to(&headers), "/reporte?x=1");

        headers.insert(header::REFERER, HeaderValue::from_static("http://host:8080"));
        assert_eq!(back_to(&headers), "/");

        headers.insert(header::REFERER, HeaderValue::from_static("/horarios"));
        assert_eq!(back_to(&headers), "/horarios");

        headers.insert(header::REFERER, HeaderValue::from_static("//evil.example/x"));
        assert_eq!(back_to(&headers), "/");
    }
}
