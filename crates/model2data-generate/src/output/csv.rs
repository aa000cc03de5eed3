use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::GeneratedTable;

/// Write a table as CSV: header row, then one record per row in column order.
///
/// Returns the number of bytes written.
pub fn write_table_csv(path: &Path, table: &GeneratedTable) -> Result<u64, csv::Error> {
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    write_table_csv_to(writer, table)
}

/// Same as [`write_table_csv`] but into any writer.
pub fn write_table_csv_to<W: Write>(writer: W, table: &GeneratedTable) -> Result<u64, csv::Error> {
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        let record: Vec<String> = table
            .columns
            .iter()
            .enumerate()
            .map(|(index, _)| row.get(index).map(|value| value.to_csv()).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::GeneratedValue;
    use chrono::NaiveDate;

    #[test]
    fn renders_header_and_rows() {
        let table = GeneratedTable {
            name: "users".to_string(),
            columns: vec!["id".to_string(), "name".to_string(), "joined".to_string()],
            rows: vec![
                vec![
                    GeneratedValue::Int(1),
                    GeneratedValue::Text("Ada, Countess".to_string()),
                    GeneratedValue::Date(NaiveDate::from_ymd_opt(2024, 1, 2).expect("date")),
                ],
                vec![
                    GeneratedValue::Int(2),
                    GeneratedValue::Null,
                    GeneratedValue::Null,
                ],
            ],
        };

        let mut out = Vec::new();
        let bytes = write_table_csv_to(&mut out, &table).expect("write csv");
        let text = String::from_utf8(out).expect("utf8");

        assert_eq!(
            text,
            "id,name,joined\n1,\"Ada, Countess\",2024-01-02\n2,,\n"
        );
        assert_eq!(bytes, text.len() as u64);
    }
}
