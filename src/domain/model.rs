/// Columns every uploaded CSV must carry, in the order they are reported when absent.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Address", "City", "State", "Country"];

pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";

/// Written in place of a coordinate when a row could not be geocoded.
pub const NOT_AVAILABLE: &str = "N/A";

/// One CSV record. Values are addressed by column through the owning [`AddressRowSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRow {
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRowSet {
    pub headers: Vec<String>,
    pub rows: Vec<AddressRow>,
}

impl AddressRowSet {
    pub fn new(headers: Vec<String>, rows: Vec<AddressRow>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with exactly this name. Matching is case-sensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows
            .get(row)
            .and_then(|r| r.values.get(idx))
            .map(String::as_str)
    }

    /// Required columns absent from the header, in [`REQUIRED_COLUMNS`] order.
    pub fn missing_required_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|col| self.column_index(col).is_none())
            .map(|col| col.to_string())
            .collect()
    }

    /// `"{Address}, {City}, {State}, {Country}"` built from raw values, no trimming.
    pub fn full_address(&self, row: usize) -> String {
        let parts: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .map(|col| self.value(row, col).unwrap_or_default())
            .collect();
        parts.join(", ")
    }

    /// Returns the index of `name`, appending an empty column to every row if it is new.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.values.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Writes `Latitude`/`Longitude` for every row. `results` is indexed like `rows`.
    /// Rows shorter than the header are padded with empty values first.
    pub fn apply_results(&mut self, results: &[GeocodeResult]) {
        let lat_idx = self.ensure_column(LATITUDE_COLUMN);
        let lng_idx = self.ensure_column(LONGITUDE_COLUMN);
        let width = self.headers.len();

        for (row, result) in self.rows.iter_mut().zip(results) {
            if row.values.len() < width {
                row.values.resize(width, String::new());
            }
            let (lat, lng) = result.to_columns();
            if let Some(cell) = row.values.get_mut(lat_idx) {
                *cell = lat;
            }
            if let Some(cell) = row.values.get_mut(lng_idx) {
                *cell = lng;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeResult {
    Located { latitude: f64, longitude: f64 },
    NotFound,
}

impl GeocodeResult {
    /// Column text for this result. Coordinates use the shortest exact decimal form.
    pub fn to_columns(&self) -> (String, String) {
        match self {
            GeocodeResult::Located {
                latitude,
                longitude,
            } => (latitude.to_string(), longitude.to_string()),
            GeocodeResult::NotFound => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        }
    }
}

/// The CSV handed back to the uploader.
#[derive(Debug, Clone)]
pub struct ProcessedCsv {
    pub file_name: String,
    pub content: String,
    pub rows: usize,
    pub located: usize,
}
