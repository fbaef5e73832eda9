//! JSON dump of an assembled document.
//!
//! The dump carries the same sections as the Markdown output, with each
//! section's blocks kept structured and failed pages marked `"missing"`:
//!
//! ```json
//! {
//!   "title": "十二篮",
//!   "generated_at": "2025-05-06T08:00:00Z",
//!   "sections": [
//!     { "group": "第一册", "title": "...", "url": "...",
//!       "body": { "status": "extracted", "content": [ { "kind": "paragraph", ... } ] } }
//!   ]
//! }
//! ```

use crate::models::Document;
use crate::utils::ensure_parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `document` as pretty-printed JSON to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_document(document: &Document, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(document)?;

    if let Err(e) = ensure_parent_dir(path).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    fs::write(path, json).await?;
    info!(sections = document.sections.len(), "Wrote JSON document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, Fragment, Section, SectionBody};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_document_creates_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        let document = Document::new(
            "歌中之歌",
            vec![
                Section {
                    group: None,
                    title: "导言".to_string(),
                    url: "http://www.lightinnj.org/song/00.htm".to_string(),
                    body: SectionBody::Extracted(Fragment::new(vec![Block::paragraph("正文")])),
                },
                Section {
                    group: None,
                    title: "壹".to_string(),
                    url: "http://www.lightinnj.org/song/01.htm".to_string(),
                    body: SectionBody::Missing("HTTP 404".to_string()),
                },
            ],
        );

        write_document(&document, &path).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["title"], "歌中之歌");
        assert_eq!(value["sections"][0]["body"]["status"], "extracted");
        assert_eq!(value["sections"][0]["body"]["content"][0]["text"], "正文");
        assert_eq!(value["sections"][1]["body"]["status"], "missing");
    }
}
