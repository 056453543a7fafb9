//! DOCX to PDF conversion through an external office suite.

use bulletin_utils::{BulletinError, BulletinResult, ConverterConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

pub struct DocumentConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl DocumentConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Converts one file into `out_dir` and removes the source on success.
    pub async fn to_pdf(&self, source: &Path, out_dir: &Path) -> BulletinResult<PathBuf> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| BulletinError::conversion(format!("Bad file name {}", source.display())))?;
        let target = out_dir.join(format!("{}.pdf", stem));

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--outdir")
            .arg(out_dir)
            .arg(source)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                BulletinError::conversion(format!(
                    "{} timed out after {}s on {}",
                    self.program,
                    self.timeout.as_secs(),
                    source.display()
                ))
            })?
            .map_err(|e| BulletinError::conversion(format!("Cannot run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(BulletinError::conversion(format!(
                "{} failed on {}: {}",
                self.program,
                source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(BulletinError::conversion(format!(
                "{} produced no {}",
                self.program,
                target.display()
            )));
        }

        tokio::fs::remove_file(source).await?;
        tracing::debug!(pdf = %target.display(), "Converted document");
        Ok(target)
    }

    /// Converts files one after another, stopping at the first failure.
    pub async fn convert_all(&self, sources: &[PathBuf], out_dir: &Path) -> BulletinResult<Vec<PathBuf>> {
        let mut pdfs = Vec::with_capacity(sources.len());
        for source in sources {
            pdfs.push(self.to_pdf(source, out_dir).await?);
        }
        Ok(pdfs)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Stand-in for the office suite: copies `$3` to `$2/<stem>.pdf`.
    fn copying_converter() -> DocumentConverter {
        DocumentConverter::new(&ConverterConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"cp "$3" "$2/$(basename "$3" .docx).pdf""#.to_string(),
                "convert".to_string(),
            ],
            timeout_seconds: 10,
        })
    }

    #[tokio::test]
    async fn test_converts_and_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("dupont_marie_bulletin.docx");
        std::fs::write(&source, b"docx").unwrap();

        let pdf = copying_converter().to_pdf(&source, dir.path()).await.unwrap();

        assert_eq!(pdf, dir.path().join("dupont_marie_bulletin.pdf"));
        assert!(pdf.exists());
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn test_failing_command_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.docx");
        std::fs::write(&source, b"docx").unwrap();

        let converter = DocumentConverter::new(&ConverterConfig {
            program: "false".to_string(),
            args: vec![],
            timeout_seconds: 10,
        });
        let err = converter.to_pdf(&source, dir.path()).await.unwrap_err();

        assert_eq!(err.error_code(), "CONVERSION_ERROR");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let converter = DocumentConverter::new(&ConverterConfig {
            program: "no-such-office-suite".to_string(),
            args: vec![],
            timeout_seconds: 10,
        });
        let err = converter
            .convert_all(&[dir.path().join("a.docx")], dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 500);
    }
}
