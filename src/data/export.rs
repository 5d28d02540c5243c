use super::model::Table;

/// Serialise the table to UTF-8, comma-separated text with a header row.
///
/// Columns keep their original order; the derived `year` / `month` fields
/// are not columns and are never emitted. Cells are rendered exactly as the
/// detail table shows them (floats with four decimals, dates ISO, nulls
/// empty), so re-parsing the export yields the same records.
pub fn to_csv(table: &Table) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for rec in &table.records {
        writer.write_record(table.columns.iter().map(|col| rec.display_value(col)))?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
