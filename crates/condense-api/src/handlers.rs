//! Route handler functions for all API endpoints.
//!
//! Summarization runs on the blocking thread pool; everything else is plain
//! async file I/O against the configured upload and summary directories.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use condense_core::{Provenance, SummarizeOptions, Summary, SummaryMethod};
use condense_summarizer::Summarizer;

use crate::error::ApiError;
use crate::state::AppState;

/// Page served at `/` when the frontend directory has no `index.html`.
pub const FALLBACK_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Condense</title></head>
<body>
<h1>Condense</h1>
<p>The summarization API is running. POST text to <code>/api/summarize</code>
or a document to <code>/api/upload</code>.</p>
</body>
</html>
"#;

// =============================================================================
// Request and response types
// =============================================================================

/// Request body for POST /api/summarize.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: Option<String>,
    /// "extractive" or "abstractive". Defaults to the configured method.
    pub method: Option<String>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    /// Length of the input in characters.
    pub original_length: usize,
    /// Length of the summary in characters.
    pub summary_length: usize,
    pub summary: String,
    pub method: SummaryMethod,
    pub provenance: Provenance,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub summary: String,
    /// Where the summary was written, relative to the working directory
    /// unless the summary directory is absolute.
    pub summary_path: String,
    pub method: SummaryMethod,
    pub provenance: Provenance,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
    pub uptime_secs: u64,
    /// "unloaded", "loaded" or "failed".
    pub model_state: String,
    pub default_method: SummaryMethod,
}

// =============================================================================
// Helpers
// =============================================================================

/// Make a user-supplied filename safe to store.
///
/// Non-ASCII characters are dropped, path separators become spaces,
/// whitespace runs become `_`, anything outside `[A-Za-z0-9_.-]` is removed
/// and leading or trailing `.`/`_` are stripped. May return an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Whether `name` refers to a file directly inside a served directory.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !FsPath::new(name).is_absolute()
}

/// Content type for a served file, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "md" => "text/plain; charset=utf-8",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "html" => "text/html; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Build per-request options on top of the summarizer defaults.
pub fn request_options(
    defaults: SummarizeOptions,
    method: Option<&str>,
    max_length: Option<usize>,
    min_length: Option<usize>,
) -> Result<SummarizeOptions, ApiError> {
    let method = match method {
        Some(m) => m.parse::<SummaryMethod>()?,
        None => defaults.method,
    };
    let opts = SummarizeOptions::new(
        method,
        max_length.unwrap_or(defaults.max_length),
        min_length.unwrap_or(defaults.min_length),
    );
    opts.validate()?;
    Ok(opts)
}

fn parse_length(field: &str, value: Option<&str>) -> Result<Option<usize>, ApiError> {
    value
        .map(|v| {
            v.trim().parse::<usize>().map_err(|_| {
                ApiError::BadRequest(format!("'{}' must be a non-negative integer", field))
            })
        })
        .transpose()
}

async fn run_blocking<F>(summarizer: &Arc<Summarizer>, f: F) -> Result<Summary, ApiError>
where
    F: FnOnce(&Summarizer) -> Summary + Send + 'static,
{
    let summarizer = Arc::clone(summarizer);
    tokio::task::spawn_blocking(move || f(&summarizer))
        .await
        .map_err(|e| ApiError::Internal(format!("Summarization task failed: {}", e)))
}

async fn serve_from(dir: PathBuf, filename: &str) -> Result<Response, ApiError> {
    if !is_safe_filename(filename) {
        return Err(ApiError::BadRequest(format!("Invalid filename '{}'", filename)));
    }
    let path = dir.join(filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type_for(filename))], bytes).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound(format!("File '{}' not found", filename)))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - serve the frontend page.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let path = FsPath::new(&state.config.server.frontend_dir).join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Frontend missing, serving fallback page");
            Html(FALLBACK_INDEX_HTML.to_string())
        }
    }
}

/// GET /api/health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model_state: state.summarizer.model_state().as_str().to_string(),
        default_method: state.summarizer.default_options().method,
    })
}

/// POST /api/summarize - summarize a JSON text payload.
pub async fn summarize(
    State(state): State<AppState>,
    Json(body): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let text = body
        .text
        .ok_or_else(|| ApiError::BadRequest("No text provided".to_string()))?;
    let opts = request_options(
        state.summarizer.default_options(),
        body.method.as_deref(),
        body.max_length,
        body.min_length,
    )?;

    let original_length = text.chars().count();
    let summary = run_blocking(&state.summarizer, move |s| s.summarize(&text, &opts)).await?;

    tracing::info!(
        method = %summary.method,
        provenance = summary.provenance.as_str(),
        original_length,
        "Summarized text"
    );

    Ok(Json(SummarizeResponse {
        original_length,
        summary_length: summary.text.chars().count(),
        summary: summary.text,
        method: summary.method,
        provenance: summary.provenance,
    }))
}

/// POST /api/upload - store an uploaded document and summarize it.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut method: Option<String> = None;
    let mut max_length: Option<String> = None;
    let mut min_length: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            "method" | "max_length" | "min_length" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}': {}", name, e)))?;
                match name.as_str() {
                    "method" => method = Some(value),
                    "max_length" => max_length = Some(value),
                    _ => min_length = Some(value),
                }
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| ApiError::BadRequest("No file part".to_string()))?;
    if filename.is_empty() {
        return Err(ApiError::BadRequest("No selected file".to_string()));
    }
    if !state.config.storage.is_allowed(&filename) {
        return Err(ApiError::BadRequest("File type not allowed".to_string()));
    }

    let opts = request_options(
        state.summarizer.default_options(),
        method.as_deref(),
        parse_length("max_length", max_length.as_deref())?,
        parse_length("min_length", min_length.as_deref())?,
    )?;

    let upload_dir = state.upload_dir();
    let summary_dir = state.summary_dir();
    tokio::fs::create_dir_all(&upload_dir).await?;
    tokio::fs::create_dir_all(&summary_dir).await?;

    let mut safe_name = sanitize_filename(&filename);
    if safe_name.is_empty() {
        safe_name = "upload".to_string();
    }
    let stored_name = format!("{}_{}", Uuid::new_v4(), safe_name);
    let stored_path = upload_dir.join(&stored_name);
    tokio::fs::write(&stored_path, &data).await?;
    tracing::info!(file = %stored_path.display(), bytes = data.len(), "Stored upload");

    let path = stored_path.clone();
    let summary = run_blocking(&state.summarizer, move |s| s.summarize_file(&path, &opts)).await?;

    let stem = stored_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&stored_name);
    let summary_path = summary_dir.join(format!("{}_summary.txt", stem));
    tokio::fs::write(&summary_path, summary.text.as_bytes()).await?;

    tracing::info!(
        summary = %summary_path.display(),
        method = %summary.method,
        provenance = summary.provenance.as_str(),
        "Summarized upload"
    );

    Ok(Json(UploadResponse {
        summary: summary.text,
        summary_path: summary_path.display().to_string(),
        method: summary.method,
        provenance: summary.provenance,
    }))
}

/// GET /api/summaries - list stored summary files, sorted by name.
pub async fn list_summaries(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let mut entries = match tokio::fs::read_dir(state.summary_dir()).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Json(Vec::new())),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(Json(names))
}

/// GET /api/summaries/{filename} - fetch a stored summary.
pub async fn get_summary(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    serve_from(state.summary_dir(), &filename).await
}

/// GET /api/files/{filename} - fetch a stored upload.
pub async fn get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    serve_from(state.upload_dir(), &filename).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(sanitize_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("report (final).txt"), "report_final.txt");
        assert_eq!(sanitize_filename("résumé.txt"), "rsum.txt");
        assert_eq!(sanitize_filename("..."), "");
        assert_eq!(sanitize_filename("C:\\docs\\notes.md"), "C_docs_notes.md");
    }

    #[test]
    fn test_is_safe_filename() {
        assert!(is_safe_filename("abc_summary.txt"));
        assert!(!is_safe_filename(""));
        assert!(!is_safe_filename(".."));
        assert!(!is_safe_filename("../secret.txt"));
        assert!(!is_safe_filename("a\\b.txt"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.TXT"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for("a.pdf"), "application/pdf");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_request_options_defaults() {
        let opts = request_options(SummarizeOptions::default(), None, None, None).unwrap();
        assert_eq!(opts, SummarizeOptions::default());
    }

    #[test]
    fn test_request_options_overrides() {
        let opts =
            request_options(SummarizeOptions::default(), Some("abstractive"), Some(80), Some(20))
                .unwrap();
        assert_eq!(opts, SummarizeOptions::abstractive(80, 20));
    }

    #[test]
    fn test_request_options_rejects_unknown_method() {
        let err = request_options(SummarizeOptions::default(), Some("magic"), None, None)
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_request_options_rejects_inverted_lengths() {
        let err = request_options(SummarizeOptions::default(), None, Some(10), Some(50))
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("max_length", Some(" 120 ")).unwrap(), Some(120));
        assert_eq!(parse_length("max_length", None).unwrap(), None);
        assert!(parse_length("max_length", Some("-3")).is_err());
    }
}
