//! PDF → image conversion of a résumé's first page.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::storage::FileUpload;

/// Converts the first page of a PDF into an image.
/// `Ok(None)` means the converter ran but produced no image.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, pdf: &FileUpload) -> Result<Option<FileUpload>>;
}

/// Shells out to poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<String>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
        }
    }
}

/// `resume.pdf` → `resume.png`; names without a `.pdf` suffix get `.png` appended.
pub fn image_name(pdf_name: &str) -> String {
    let stem = Path::new(pdf_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|_| {
            Path::new(pdf_name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .unwrap_or(pdf_name);
    format!("{stem}.png")
}

#[async_trait]
impl Rasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf: &FileUpload) -> Result<Option<FileUpload>> {
        let workdir = tempfile::tempdir().context("Failed to create rasterizer workdir")?;
        let input = workdir.path().join("input.pdf");
        let prefix = workdir.path().join("page");

        tokio::fs::write(&input, &pdf.bytes)
            .await
            .context("Failed to write PDF for rasterization")?;

        let output = Command::new(&self.binary)
            .arg("-png")
            .args(["-f", "1", "-l", "1"])
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-singlefile")
            .arg(&input)
            .arg(&prefix)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            warn!(
                "{} exited with {} for {}: {}",
                self.binary,
                output.status,
                pdf.name,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        let png = prefix.with_extension("png");
        let bytes = match tokio::fs::read(&png).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} produced no image for {}", self.binary, pdf.name);
                return Ok(None);
            }
            Err(e) => return Err(e).context("Failed to read rasterized page"),
        };

        debug!("Rasterized {} to {} bytes of PNG", pdf.name, bytes.len());
        Ok(Some(FileUpload {
            name: image_name(&pdf.name),
            content_type: "image/png".to_string(),
            bytes: Bytes::from(bytes),
        }))
    }
}
