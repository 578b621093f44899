//! The `Environment` abstraction: every side effect the core pipeline needs
//! (reading bytes, enumerating fonts, decompressing Brotli, getting the
//! current time, logging) is injected by the caller rather than reached for
//! directly. This keeps layout/pagination/PDF emission synchronous and
//! testable, and matches the teacher's convention of routing all I/O through
//! a handful of narrow, swappable entry points rather than scattering
//! `std::fs` calls through business logic.

use std::io::Read;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::PagecraftError;

/// A font discovered by [`Environment::list_fonts`].
#[derive(Debug, Clone)]
pub struct FontListing {
    pub family: String,
    pub weight: u16,
    pub italic: bool,
    /// Filesystem path or URL the font's bytes can be read from.
    pub src: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Wall-clock instant used for `/CreationDate`/`/ModDate` metadata.
/// Seconds since the Unix epoch; precision beyond that is not needed for PDF
/// date strings.
#[derive(Debug, Clone, Copy)]
pub struct DateStamp(pub i64);

impl DateStamp {
    /// UTC calendar date (year, month, day) derived from the Unix timestamp.
    /// Howard Hinnant's days-from-civil inverse.
    pub fn ymd(&self) -> (i64, u32, u32) {
        let days = self.0.max(0) / 86_400;
        let z = days + 719_468;
        let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
        let doe = (z - era * 146_097) as u64;
        let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
        let y = yoe as i64 + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
        let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
        (if m <= 2 { y + 1 } else { y }, m, d)
    }

    /// `YYYY-MM-DD` rendering, used for the `{date}` header/footer token.
    pub fn iso_date(&self) -> String {
        let (y, m, d) = self.ymd();
        format!("{y:04}-{m:02}-{d:02}")
    }
}

/// Caller-injected side effects. One instance is owned by a single render.
pub trait Environment {
    fn read_binary(&self, path_or_url: &str) -> Result<Vec<u8>, PagecraftError>;
    fn list_fonts(&self, dir: &str) -> Result<Vec<FontListing>, PagecraftError>;
    fn decompress_brotli(&self, bytes: &[u8]) -> Result<Vec<u8>, PagecraftError>;
    fn now(&self) -> DateStamp;
    fn log(&self, category: &str, level: LogLevel, message: &str);
}

/// Default blocking implementation backed by `std::fs`, the `brotli` crate,
/// and the `log` crate. Suitable for the CLI and as the FFI default.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEnvironment;

impl Environment for LocalEnvironment {
    fn read_binary(&self, path_or_url: &str) -> Result<Vec<u8>, PagecraftError> {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            return Err(PagecraftError::resource_unavailable(format!(
                "LocalEnvironment cannot fetch network resources: {path_or_url}"
            )));
        }
        std::fs::read(path_or_url)
            .map_err(|e| PagecraftError::resource_unavailable(format!("{path_or_url}: {e}")))
    }

    fn list_fonts(&self, dir: &str) -> Result<Vec<FontListing>, PagecraftError> {
        let path = Path::new(dir);
        let entries = std::fs::read_dir(path)
            .map_err(|e| PagecraftError::resource_unavailable(format!("{dir}: {e}")))?;

        let mut fonts = Vec::new();
        for entry in entries.flatten() {
            let p = entry.path();
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
            if !matches!(ext.as_str(), "ttf" | "otf" | "woff" | "woff2") {
                continue;
            }
            let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("font").to_string();
            let lower = stem.to_ascii_lowercase();
            let italic = lower.contains("italic") || lower.contains("oblique");
            let weight = if lower.contains("bold") { 700 } else { 400 };
            fonts.push(FontListing {
                family: stem,
                weight,
                italic,
                src: p.to_string_lossy().into_owned(),
            });
        }
        Ok(fonts)
    }

    fn decompress_brotli(&self, bytes: &[u8]) -> Result<Vec<u8>, PagecraftError> {
        let mut out = Vec::new();
        let mut reader = brotli::Decompressor::new(bytes, 4096);
        reader
            .read_to_end(&mut out)
            .map_err(|e| PagecraftError::backend(format!("brotli decompression failed: {e}")))?;
        Ok(out)
    }

    fn now(&self) -> DateStamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        DateStamp(secs)
    }

    fn log(&self, category: &str, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => log::debug!(target: "pagecraft::environment", "[{category}] {message}"),
            LogLevel::Info => log::info!(target: "pagecraft::environment", "[{category}] {message}"),
            LogLevel::Warn => log::warn!(target: "pagecraft::environment", "[{category}] {message}"),
            LogLevel::Error => log::error!(target: "pagecraft::environment", "[{category}] {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_binary_missing_file_is_resource_unavailable() {
        let env = LocalEnvironment;
        let err = env.read_binary("/nonexistent/path/does-not-exist.ttf").unwrap_err();
        assert_eq!(err.kind(), "ResourceUnavailable");
    }

    #[test]
    fn read_binary_rejects_urls() {
        let env = LocalEnvironment;
        let err = env.read_binary("https://example.com/font.ttf").unwrap_err();
        assert_eq!(err.kind(), "ResourceUnavailable");
    }

    #[test]
    fn decompress_brotli_empty_input_round_trips_to_empty() {
        // Raw brotli stream for zero bytes of uncompressed content.
        let env = LocalEnvironment;
        let empty_stream = brotli_compress_for_test(&[]);
        let out = env.decompress_brotli(&empty_stream).unwrap();
        assert!(out.is_empty());
    }

    fn brotli_compress_for_test(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let params = brotli::enc::BrotliEncoderParams::default();
        brotli::BrotliCompress(&mut std::io::Cursor::new(data), &mut out, &params).unwrap();
        out
    }
}
