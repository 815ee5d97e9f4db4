use crate::{
    ContentBuilder, Document, Error, ObjectTable, ReportOptions, ReportText, Result, SummaryInput, SummaryRecord, verify,
};
use chrono::Local;
use log::{info, warn};

/// Validate a summary and produce the finished report.
///
/// Either the complete buffer is returned or an error; nothing is written
/// anywhere on the way.
pub fn generate(input: &SummaryInput, options: &ReportOptions) -> Result<Vec<u8>> {
    let record = input.validate(Local::now().date_naive()).map_err(|err| {
        warn!("rejected summary: {}", err);
        Error::from(err)
    })?;
    let text = ReportText::from_record(&record, options);
    generate_from_record(&record, &text, options)
}

/// Produce the report from already formatted display strings.
pub fn generate_from_record(record: &SummaryRecord, text: &ReportText, options: &ReportOptions) -> Result<Vec<u8>> {
    let content = ContentBuilder::build(text, options)?;
    let table = ObjectTable::new(&content, options)?;
    let document = Document::new(table, options.version.as_str());
    let rendered = document.render()?;

    let layout = verify(&rendered.bytes).inspect_err(|err| warn!("generated document is inconsistent: {}", err))?;
    if layout.xref_start != rendered.xref_start || layout.size != rendered.xref.size {
        return Err(Error::Structure("reader and writer disagree on the xref table".to_string()));
    }

    info!(
        "generated report for {} entries on {}: {} bytes",
        record.entry_count,
        record.generated_on,
        rendered.bytes.len()
    );
    Ok(rendered.bytes)
}
