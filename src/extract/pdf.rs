//! PDF text via `pdf-extract`.

use std::panic;

use tracing::warn;

use super::ExtractError;

pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let result = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "parser panicked".to_string());
            warn!(%reason, "pdf parser panicked");
            ExtractError::Pdf(reason)
        })?;

    let mut text = result.map_err(|e| ExtractError::Pdf(e.to_string()))?;
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}
