use std::process::Stdio;

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{debug, error};

use super::{join_lines, OcrEngine, OcrError};
use crate::uploads::ImageUpload;

/// Local Tesseract engine driven through its CLI. Image bytes are piped to
/// stdin and text is read back from stdout, so nothing touches the disk.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    bin: String,
    languages: String,
}

impl TesseractOcr {
    /// Checks once that the binary runs and that every requested language
    /// (`kor+eng` style) has trained data installed.
    pub async fn load(bin: &str, languages: &str) -> Result<Self, OcrError> {
        let output = Command::new(bin).arg("--list-langs").output().await?;
        if !output.status.success() {
            return Err(OcrError::Engine(format!(
                "{bin} --list-langs exited with {}",
                output.status
            )));
        }

        // Older releases print the list on stderr.
        let listing = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let available = parse_language_list(&listing);
        let missing = missing_languages(languages, &available);
        if !missing.is_empty() {
            return Err(OcrError::Engine(format!(
                "tesseract has no trained data for: {}",
                missing.join(", ")
            )));
        }

        debug!(%bin, %languages, "tesseract languages verified");
        Ok(Self {
            bin: bin.to_string(),
            languages: languages.to_string(),
        })
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn extract_text(&self, image: &ImageUpload) -> Result<String, OcrError> {
        let mut child = Command::new(&self.bin)
            .args(["stdin", "stdout", "-l", self.languages.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Engine("tesseract stdin unavailable".into()))?;
        let body = image.body.clone();
        let feed = async move {
            stdin.write_all(&body).await?;
            stdin.shutdown().await
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = %output.status, %stderr, "tesseract failed");
            return Err(OcrError::Engine(if stderr.is_empty() {
                format!("tesseract exited with {}", output.status)
            } else {
                stderr
            }));
        }
        fed?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = join_lines(stdout.lines());
        debug!(bytes = image.body.len(), chars = text.chars().count(), "tesseract done");
        Ok(text)
    }
}

fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}

fn missing_languages(requested: &str, available: &[String]) -> Vec<String> {
    requested
        .split('+')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !available.iter().any(|a| a.as_str() == *l))
        .map(str::to_string)
        .collect()
}
