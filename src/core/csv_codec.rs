use crate::domain::model::{AddressRow, AddressRowSet};
use crate::utils::error::{GeoError, Result};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Decodes upload bytes the way a browser `TextDecoder` does: lossy UTF-8, leading BOM dropped.
pub fn decode_upload(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix(BYTE_ORDER_MARK) {
        Some(rest) => rest.to_string(),
        None => text.into_owned(),
    }
}

/// Parses CSV text with a header row. Blank lines are skipped; ragged records are rejected.
pub fn parse_rows(text: &str) -> Result<AddressRowSet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(String::from)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        rows.push(AddressRow {
            values: record.iter().map(String::from).collect(),
        });
    }

    Ok(AddressRowSet::new(headers, rows))
}

/// Checks the header once against the required columns.
pub fn validate_columns(rows: &AddressRowSet) -> Result<()> {
    if rows.is_empty() {
        return Err(GeoError::invalid_input("CSV contains no data rows"));
    }

    let missing = rows.missing_required_columns();
    if !missing.is_empty() {
        return Err(GeoError::MissingColumns { columns: missing });
    }
    Ok(())
}

pub fn read_address_csv(bytes: &[u8]) -> Result<AddressRowSet> {
    let text = decode_upload(bytes);
    let rows = parse_rows(&text)?;
    validate_columns(&rows)?;
    Ok(rows)
}

pub fn write_csv(rows: &AddressRowSet) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&rows.headers)?;
    for row in &rows.rows {
        writer.write_record(&row.values)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| GeoError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| GeoError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn parse_error(err: csv::Error) -> GeoError {
    GeoError::invalid_input(format!("CSV could not be parsed: {}", err))
}
