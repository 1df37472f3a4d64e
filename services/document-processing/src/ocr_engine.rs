//! OCR Engine
//!
//! Runs Tesseract over a decoded bitmap and returns its word boxes as
//! parallel text/left/top arrays in the engine's emission order.

use image::{ImageFormat, RgbImage};
use ledgerlens_models::Token;
use ledgerlens_utils::{LedgerError, LedgerResult, OcrConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Command;

#[cfg(windows)]
const PLATFORM_DEFAULT_TESSERACT: &str = r"C:\Program Files\Tesseract-OCR\tesseract.exe";

/// Word-level OCR output, one entry per recognized box.
///
/// Non-word levels come through with empty text; they are kept here and
/// dropped by the row assembler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    pub text: Vec<String>,
    pub left: Vec<i32>,
    pub top: Vec<i32>,
}

impl OcrOutput {
    pub fn push(&mut self, text: impl Into<String>, left: i32, top: i32) {
        self.text.push(text.into());
        self.left.push(left);
        self.top.push(top);
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Zip the parallel arrays into tokens
    pub fn into_tokens(self) -> LedgerResult<Vec<Token>> {
        if self.left.len() != self.text.len() || self.top.len() != self.text.len() {
            return Err(LedgerError::ocr(format!(
                "mismatched OCR arrays: {} texts, {} lefts, {} tops",
                self.text.len(),
                self.left.len(),
                self.top.len()
            )));
        }

        Ok(self
            .text
            .into_iter()
            .zip(self.left)
            .zip(self.top)
            .map(|((text, x), y)| Token::new(x, y, text))
            .collect())
    }
}

/// Anything that can turn a bitmap into positioned words
pub trait OcrEngine: Send + Sync + 'static {
    fn recognize(&self, image: &RgbImage) -> LedgerResult<OcrOutput>;
}

/// Locate the tesseract executable once at start-up.
///
/// An explicit command from configuration wins, then `PATH`, then the
/// platform's default install location.
pub fn resolve_tesseract_cmd(config: &OcrConfig) -> LedgerResult<PathBuf> {
    if let Some(cmd) = &config.tesseract_cmd {
        return which::which(cmd).map_err(|e| {
            LedgerError::configuration(format!("tesseract command '{}' not usable: {}", cmd, e))
        });
    }

    if let Ok(path) = which::which("tesseract") {
        return Ok(path);
    }

    #[cfg(windows)]
    {
        let default = PathBuf::from(PLATFORM_DEFAULT_TESSERACT);
        if default.exists() {
            return Ok(default);
        }
    }

    Err(LedgerError::configuration(
        "tesseract not found; install tesseract-ocr or set ocr.tesseract_cmd",
    ))
}

/// Tesseract invoked as a subprocess with TSV output
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    cmd: PathBuf,
    language: String,
    page_segmentation_mode: Option<u8>,
}

impl TesseractEngine {
    pub fn new(cmd: PathBuf, config: &OcrConfig) -> Self {
        Self {
            cmd,
            language: config.language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }

    pub fn from_config(config: &OcrConfig) -> LedgerResult<Self> {
        let cmd = resolve_tesseract_cmd(config)?;
        tracing::info!(cmd = %cmd.display(), language = %config.language, "Using tesseract");
        Ok(Self::new(cmd, config))
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &RgbImage) -> LedgerResult<OcrOutput> {
        let input = tempfile::Builder::new()
            .prefix("ledgerlens-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), ImageFormat::Png)?;

        let mut command = Command::new(&self.cmd);
        command
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language);
        if let Some(psm) = self.page_segmentation_mode {
            command.arg("--psm").arg(psm.to_string());
        }
        command.arg("tsv");

        let output = command
            .output()
            .map_err(|e| LedgerError::ocr(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LedgerError::ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let result = parse_tsv(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(
            boxes = result.len(),
            width = image.width(),
            height = image.height(),
            "Tesseract finished"
        );
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct TsvRecord {
    left: i32,
    top: i32,
    #[serde(default)]
    text: String,
}

/// Parse tesseract's TSV report into parallel arrays
pub fn parse_tsv(tsv: &str) -> LedgerResult<OcrOutput> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(tsv.as_bytes());

    let mut output = OcrOutput::default();
    for record in reader.deserialize::<TsvRecord>() {
        let record = record?;
        output.push(record.text, record.left, record.top);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t
4\t1\t1\t1\t1\t0\t10\t100\t520\t18\t-1\t
5\t1\t1\t1\t1\t1\t10\t100\t90\t18\t96.1\tDescription
5\t1\t1\t1\t1\t2\t300\t101\t30\t18\t95.4\tQty
5\t1\t1\t1\t1\t3\t400\t100\t40\t18\t93.0\t\"Rate\"
";

    #[test]
    fn test_parse_tsv_keeps_emission_order() {
        let output = parse_tsv(SAMPLE_TSV).unwrap();

        assert_eq!(output.len(), 5);
        assert_eq!(output.text, vec!["", "", "Description", "Qty", "\"Rate\""]);
        assert_eq!(output.left, vec![0, 10, 10, 300, 400]);
        assert_eq!(output.top, vec![0, 100, 100, 101, 100]);
    }

    #[test]
    fn test_parse_tsv_header_only() {
        let output = parse_tsv(
            "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n",
        )
        .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_parse_tsv_rejects_garbage() {
        let error = parse_tsv("left\ttop\ttext\nabc\t1\tword\n").unwrap_err();
        assert_eq!(error.error_code(), "OCR_ENGINE_ERROR");
    }

    #[test]
    fn test_into_tokens() {
        let mut output = OcrOutput::default();
        output.push("Rate", 400, 100);
        output.push("", 0, 0);

        let tokens = output.into_tokens().unwrap();
        assert_eq!(tokens, vec![Token::new(400, 100, "Rate"), Token::new(0, 0, "")]);
    }

    #[test]
    fn test_into_tokens_rejects_mismatched_arrays() {
        let output = OcrOutput {
            text: vec!["a".to_string(), "b".to_string()],
            left: vec![1],
            top: vec![1, 2],
        };
        assert!(output.into_tokens().is_err());
    }

    #[test]
    fn test_explicit_missing_command_is_configuration_error() {
        let config = OcrConfig {
            tesseract_cmd: Some("/nonexistent/ledgerlens/tesseract".to_string()),
            ..Default::default()
        };
        let error = resolve_tesseract_cmd(&config).unwrap_err();
        assert_eq!(error.error_code(), "CONFIGURATION_ERROR");
    }
}
