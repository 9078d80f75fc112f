use std::path::Path;

use tracing::info;

use crate::{
    error::PriceError,
    types::{PriceRow, PriceSeries},
};

/// Header written ahead of the rows, block number first
pub const CSV_HEADER: [&str; 5] = [
    "block_number",
    "coin0_price_in_coin1",
    "coin1_price_in_coin0",
    "coin0_price_in_usd",
    "coin1_price_in_usd",
];

/// Write a series as CSV, one row per block in ascending order
pub fn write_csv(series: &PriceSeries, path: impl AsRef<Path>) -> Result<(), PriceError> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    // Written explicitly so an empty series still gets a header
    writer.write_record(CSV_HEADER)?;
    for row in series.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = series.len(), "wrote price series");
    Ok(())
}

/// Read a file produced by [`write_csv`] back into a series
pub fn read_csv(path: impl AsRef<Path>) -> Result<PriceSeries, PriceError> {
    let mut reader = csv::Reader::from_path(path)?;

    let rows = reader
        .deserialize::<PriceRow>()
        .collect::<Result<Vec<_>, _>>()?;

    PriceSeries::try_from(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_matches_row_fields() {
        let row = PriceRow {
            block_number: 1,
            coin0_price_in_coin1: 0.5,
            coin1_price_in_coin0: 2.0,
            coin0_price_in_usd: 1.0,
            coin1_price_in_usd: 2.0,
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(row).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let header = text.lines().next().unwrap();
        assert_eq!(header, CSV_HEADER.join(","));
    }

    #[test]
    fn test_empty_series_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv(&PriceSeries::new(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), CSV_HEADER.join(","));
        assert!(read_csv(&path).unwrap().is_empty());
    }
}
