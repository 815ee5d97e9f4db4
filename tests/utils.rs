use chrono::NaiveDate;
use kpipdf::{SummaryInput, SummaryRecord};

#[allow(dead_code)]
pub fn report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
}

#[allow(dead_code)]
pub fn sample_input() -> SummaryInput {
    let _ = env_logger::builder().is_test(true).try_init();
    SummaryInput::new(12, 34.5)
        .with_average_hours(2.875)
        .with_invalid_count(1)
        .with_generated_on(report_date())
}

#[allow(dead_code)]
pub fn sample_record() -> SummaryRecord {
    sample_input().validate(report_date()).unwrap()
}

/// Byte position of the first occurrence of `needle`.
#[allow(dead_code)]
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
