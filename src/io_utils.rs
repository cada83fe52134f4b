//! Encoding and CSV reader plumbing for the loader.
//!
//! Input files are read fully into memory and decoded before parsing so the
//! whole file is judged under one encoding:
//!
//! - **Primary**: strict UTF-8 (a leading byte-order mark is dropped).
//! - **Fallback**: ISO-8859-1, tried only when the primary decode fails.
//!
//! Delimiters follow the usual extension rule (`.tsv` → tab, anything else →
//! comma) unless one is supplied explicitly.

use std::{fmt, io::Read, path::Path};

use anyhow::{Result, anyhow};
use encoding_rs::{Encoding, UTF_8, mem};
use log::debug;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Encoding an input file was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    /// True ISO-8859-1: every byte maps to the code point of the same value,
    /// so 0x80..=0x9F stay C1 controls rather than the windows-1252 glyphs.
    Latin1,
}

impl SourceEncoding {
    pub fn name(self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "UTF-8",
            SourceEncoding::Latin1 => "ISO-8859-1",
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

/// Decodes `bytes` as UTF-8, or as ISO-8859-1 when that fails. Latin-1 maps
/// every byte, so the fallback cannot fail.
pub fn decode_with_fallback(bytes: &[u8]) -> (String, SourceEncoding) {
    match decode_bytes(bytes, UTF_8) {
        Ok(text) => (text, SourceEncoding::Utf8),
        Err(err) => {
            debug!("{err}; falling back to {}", SourceEncoding::Latin1);
            (mem::decode_latin1(bytes).into_owned(), SourceEncoding::Latin1)
        }
    }
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn tsv_extension_selects_tab() {
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("orders.TSV"), None),
            b'\t'
        );
        assert_eq!(resolve_input_delimiter(&PathBuf::from("orders.csv"), None), b',');
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("orders.tsv"), Some(b';')),
            b';'
        );
    }

    #[test]
    fn utf8_is_preferred_and_bom_is_dropped() {
        let (text, encoding) = decode_with_fallback("\u{feff}caf\u{e9}".as_bytes());
        assert_eq!(text, "caf\u{e9}");
        assert_eq!(encoding, SourceEncoding::Utf8);
    }

    #[test]
    fn latin1_bytes_fall_back() {
        let (text, encoding) = decode_with_fallback(b"caf\xe9");
        assert_eq!(text, "caf\u{e9}");
        assert_eq!(encoding, SourceEncoding::Latin1);
        assert_eq!(encoding.name(), "ISO-8859-1");
    }

    #[test]
    fn latin1_fallback_keeps_c1_range_as_code_points() {
        let (text, encoding) = decode_with_fallback(b"\x80 \x9f \xff");
        assert_eq!(encoding, SourceEncoding::Latin1);
        assert_eq!(text, "\u{80} \u{9f} \u{ff}");
    }

    #[test]
    fn strict_decode_reports_encoding_name() {
        let err = decode_bytes(b"ab\xff", UTF_8).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
