// CSV import/export

use std::io::Read;
use std::path::Path;

use erafix_engine::CellValue;

use crate::error::IoError;
use crate::sheet::RawSheet;

/// Import a delimited file as a single sheet named after the file stem.
///
/// Every cell stays text; codes such as `0206` keep their leading zero.
pub fn import(path: &Path) -> Result<RawSheet, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        rows.push(record.iter().map(CellValue::from_input).collect());
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet1".to_string());

    Ok(RawSheet::new(name, rows))
}

const SNIFF_LINES: usize = 10;

/// Pick the delimiter that splits the header widest while the first records
/// keep the header's width. Quoted author lists (`"Gee, A.; Lee, B."`) are
/// parsed as one field, so their `;` and `,` do not count.
fn sniff_delimiter(content: &str) -> u8 {
    // Least preferred first: ties go to the later candidate.
    const CANDIDATES: [u8; 4] = [b'|', b';', b'\t', b','];

    let sample = content.lines().take(SNIFF_LINES).collect::<Vec<_>>().join("\n");

    CANDIDATES
        .into_iter()
        .filter_map(|delim| {
            let widths: Vec<usize> = csv::ReaderBuilder::new()
                .delimiter(delim)
                .has_headers(false)
                .flexible(true)
                .from_reader(sample.as_bytes())
                .records()
                .filter_map(Result::ok)
                .map(|record| record.len())
                .collect();
            let header = *widths.first()?;
            if header < 2 {
                return None;
            }
            let agreeing = widths.iter().filter(|&&w| w == header).count();
            Some((agreeing * header, delim))
        })
        .max_by_key(|&(score, _)| score)
        .map(|(_, delim)| delim)
        .unwrap_or(b',')
}

/// Read a file as UTF-8, falling back to Windows-1252 (older Excel CSV exports).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |e: std::io::Error| IoError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::warn!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Export one sheet as comma-separated text.
pub fn export(sheet: &RawSheet, path: &Path) -> Result<(), IoError> {
    let write_err = |message: String| IoError::Write {
        path: path.to_path_buf(),
        message,
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| write_err(e.to_string()))?;

    for row in &sheet.rows {
        let record: Vec<String> = row.iter().map(CellValue::raw_display).collect();
        writer
            .write_record(&record)
            .map_err(|e| write_err(e.to_string()))?;
    }

    writer.flush().map_err(|e| write_err(e.to_string()))?;
    Ok(())
}
