use crate::{ReportOptions, ValidationError};
use chrono::NaiveDate;

/// Summary values as received from the statistics collaborator.
///
/// Every field is optional here; [`SummaryInput::validate`] decides which
/// absences are fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryInput {
    pub entry_count: Option<u64>,
    pub total_hours: Option<f64>,
    pub average_hours: Option<f64>,
    pub invalid_count: Option<u64>,
    pub generated_on: Option<NaiveDate>,
}

/// Validated, immutable summary for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub entry_count: u64,
    pub total_hours: f64,
    pub average_hours: f64,
    pub invalid_count: u64,
    pub generated_on: NaiveDate,
}

impl SummaryInput {
    pub fn new(entry_count: u64, total_hours: f64) -> SummaryInput {
        SummaryInput {
            entry_count: Some(entry_count),
            total_hours: Some(total_hours),
            ..SummaryInput::default()
        }
    }

    pub fn with_average_hours(mut self, value: f64) -> Self {
        self.average_hours = Some(value);
        self
    }

    pub fn with_invalid_count(mut self, value: u64) -> Self {
        self.invalid_count = Some(value);
        self
    }

    pub fn with_generated_on(mut self, value: NaiveDate) -> Self {
        self.generated_on = Some(value);
        self
    }

    /// Check required fields and fill defaults. `today` stands in for an absent date.
    pub fn validate(&self, today: NaiveDate) -> Result<SummaryRecord, ValidationError> {
        let entry_count = self.entry_count.ok_or(ValidationError::MissingField("entryCount"))?;
        let total_hours = self.total_hours.ok_or(ValidationError::MissingField("totalHours"))?;
        let total_hours = finite("totalHours", total_hours)?;
        let average_hours = match self.average_hours {
            Some(value) => finite("averageHours", value)?,
            None if entry_count == 0 => 0.0,
            None => total_hours / entry_count as f64,
        };
        Ok(SummaryRecord {
            entry_count,
            total_hours,
            average_hours,
            invalid_count: self.invalid_count.unwrap_or(0),
            generated_on: self.generated_on.unwrap_or(today),
        })
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite(field))
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::SummaryInput;
    use crate::ValidationError;
    use chrono::{DateTime, NaiveDate};
    use serde_json::{Map, Value};

    impl SummaryInput {
        /// Read a JSON request body.
        ///
        /// Keys are camelCase; the front-end names `rowsCount`, `sumHours` and
        /// `invalidValues` are accepted as aliases. `null` counts as absent.
        pub fn from_json(body: &[u8]) -> Result<SummaryInput, ValidationError> {
            let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::NotAnObject)?;
            let map = value.as_object().ok_or(ValidationError::NotAnObject)?;
            Ok(SummaryInput {
                entry_count: field(map, &["entryCount", "rowsCount"])
                    .map(|v| count("entryCount", v))
                    .transpose()?,
                total_hours: field(map, &["totalHours", "sumHours"])
                    .map(|v| number("totalHours", v))
                    .transpose()?,
                average_hours: field(map, &["averageHours"])
                    .map(|v| number("averageHours", v))
                    .transpose()?,
                invalid_count: field(map, &["invalidCount", "invalidValues"])
                    .map(|v| count("invalidCount", v))
                    .transpose()?,
                generated_on: field(map, &["generatedOn"]).map(date).transpose()?,
            })
        }
    }

    fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().filter_map(|key| map.get(*key)).find(|value| !value.is_null())
    }

    fn number(field: &'static str, value: &Value) -> Result<f64, ValidationError> {
        value.as_f64().ok_or(ValidationError::WrongType {
            field,
            expected: "a number",
        })
    }

    fn count(field: &'static str, value: &Value) -> Result<u64, ValidationError> {
        if let Some(count) = value.as_u64() {
            return Ok(count);
        }
        let number = number(field, value)?;
        if number < 0.0 {
            Err(ValidationError::Negative(field))
        } else if number.fract() != 0.0 || !number.is_finite() {
            Err(ValidationError::WrongType {
                field,
                expected: "an integer",
            })
        } else if number >= u64::MAX as f64 {
            Err(ValidationError::OutOfRange(field))
        } else {
            Ok(number as u64)
        }
    }

    fn date(value: &Value) -> Result<NaiveDate, ValidationError> {
        let text = value.as_str().ok_or(ValidationError::WrongType {
            field: "generatedOn",
            expected: "a date string",
        })?;
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .or_else(|_| DateTime::parse_from_rfc3339(text).map(|time| time.date_naive()))
            .map_err(|_| ValidationError::InvalidDate(text.to_string()))
    }
}

/// The display strings placed on the page, one per line.
///
/// Formatting numbers is the caller's business; [`ReportText::from_record`]
/// is a plain default that does not know about locales.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportText {
    pub title: String,
    pub generated_on: String,
    pub section_header: String,
    pub total_hours: String,
    pub entry_count: String,
    pub average_hours: String,
    /// Only present when invalid values were dropped upstream.
    pub invalid_count: Option<String>,
    /// Only present when there were no entries at all.
    pub note: Option<String>,
}

impl ReportText {
    pub fn from_record(record: &SummaryRecord, options: &ReportOptions) -> ReportText {
        let hours = |value: f64| format_decimal(value, options.decimals, options.decimal_separator);
        ReportText {
            title: options.title.clone(),
            generated_on: format!("{} {}", options.generated_label, record.generated_on.format("%Y-%m-%d")),
            section_header: options.section_header.clone(),
            total_hours: format!("{}: {}", options.total_hours_label, hours(record.total_hours)),
            entry_count: format!("{}: {}", options.entry_count_label, record.entry_count),
            average_hours: format!("{}: {}", options.average_hours_label, hours(record.average_hours)),
            invalid_count: (record.invalid_count > 0)
                .then(|| format!("{}: {}", options.invalid_count_label, record.invalid_count)),
            note: (record.entry_count == 0).then(|| options.empty_note.clone()),
        }
    }
}

/// Fixed-point rendering with a chosen decimal separator.
pub fn format_decimal(value: f64, decimals: usize, separator: char) -> String {
    let mut text = format!("{:.*}", decimals, value);
    if text.starts_with('-') && text.bytes().skip(1).all(|b| b == b'0' || b == b'.') {
        text.remove(0);
    }
    if separator == '.' {
        text
    } else {
        text.replacen('.', &separator.to_string(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let input = SummaryInput {
            total_hours: Some(1.0),
            ..SummaryInput::default()
        };
        assert_eq!(input.validate(today()), Err(ValidationError::MissingField("entryCount")));

        let input = SummaryInput {
            entry_count: Some(3),
            ..SummaryInput::default()
        };
        assert_eq!(input.validate(today()), Err(ValidationError::MissingField("totalHours")));
    }

    #[test]
    fn defaults_are_filled() {
        let record = SummaryInput::new(4, 10.0).validate(today()).unwrap();
        assert_eq!(record.average_hours, 2.5);
        assert_eq!(record.invalid_count, 0);
        assert_eq!(record.generated_on, today());

        let record = SummaryInput::new(0, 0.0).validate(today()).unwrap();
        assert_eq!(record.average_hours, 0.0);
    }

    #[test]
    fn non_finite_hours_are_rejected() {
        let input = SummaryInput::new(1, f64::NAN);
        assert_eq!(input.validate(today()), Err(ValidationError::NotFinite("totalHours")));
        let input = SummaryInput::new(1, 1.0).with_average_hours(f64::INFINITY);
        assert_eq!(input.validate(today()), Err(ValidationError::NotFinite("averageHours")));
    }

    #[test]
    fn default_text_formats_one_decimal() {
        let record = SummaryInput::new(12, 34.5)
            .with_average_hours(2.875)
            .with_invalid_count(1)
            .validate(today())
            .unwrap();
        let text = ReportText::from_record(&record, &ReportOptions::default());
        assert_eq!(text.total_hours, "Total hours: 34.5");
        assert_eq!(text.entry_count, "Entries: 12");
        assert_eq!(text.average_hours, "Average hours per entry: 2.9");
        assert_eq!(text.generated_on, "Generated on 2024-03-08");
        assert_eq!(text.invalid_count.as_deref(), Some("Invalid values ignored: 1"));
        assert_eq!(text.note, None);
    }

    #[test]
    fn decimal_separator() {
        assert_eq!(format_decimal(34.5, 2, ','), "34,50");
        assert_eq!(format_decimal(-1.26, 1, '.'), "-1.3");
        assert_eq!(format_decimal(7.0, 0, ','), "7");
        assert_eq!(format_decimal(-0.04, 1, '.'), "0.0");
        assert_eq!(format_decimal(-0.0, 0, ','), "0");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_input() {
        let input = SummaryInput::from_json(
            br#"{"entryCount": 12, "totalHours": 34.5, "averageHours": 2.875, "invalidCount": 1, "generatedOn": "2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(input.entry_count, Some(12));
        assert_eq!(input.generated_on, NaiveDate::from_ymd_opt(2024, 3, 1));

        let input = SummaryInput::from_json(br#"{"rowsCount": 3, "sumHours": 7, "invalidValues": 0}"#).unwrap();
        assert_eq!(input.entry_count, Some(3));
        assert_eq!(input.total_hours, Some(7.0));
        assert_eq!(input.invalid_count, Some(0));

        let input = SummaryInput::from_json(br#"{"entryCount": 2, "totalHours": 1, "generatedOn": "2024-03-01T10:00:00+01:00"}"#)
            .unwrap();
        assert_eq!(input.generated_on, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_shape_errors() {
        assert_eq!(SummaryInput::from_json(b"[1, 2]"), Err(ValidationError::NotAnObject));
        assert_eq!(SummaryInput::from_json(b"not json"), Err(ValidationError::NotAnObject));
        assert_eq!(
            SummaryInput::from_json(br#"{"entryCount": "12", "totalHours": 1}"#),
            Err(ValidationError::WrongType {
                field: "entryCount",
                expected: "a number"
            })
        );
        assert_eq!(
            SummaryInput::from_json(br#"{"entryCount": -1, "totalHours": 1}"#),
            Err(ValidationError::Negative("entryCount"))
        );
        assert_eq!(
            SummaryInput::from_json(br#"{"entryCount": 1.5, "totalHours": 1}"#),
            Err(ValidationError::WrongType {
                field: "entryCount",
                expected: "an integer"
            })
        );
        assert_eq!(
            SummaryInput::from_json(br#"{"entryCount": 1, "totalHours": 1, "generatedOn": "yesterday"}"#),
            Err(ValidationError::InvalidDate("yesterday".to_string()))
        );
        assert_eq!(
            SummaryInput::from_json(br#"{"entryCount": 1e20, "totalHours": 1}"#),
            Err(ValidationError::OutOfRange("entryCount"))
        );
        assert_eq!(
            SummaryInput::from_json(br#"{"entryCount": 1, "totalHours": 1, "invalidCount": 5e30}"#),
            Err(ValidationError::OutOfRange("invalidCount"))
        );
        assert_eq!(SummaryInput::from_json(br#"{"entryCount": 1e3, "totalHours": 1}"#).unwrap().entry_count, Some(1000));
        let missing = SummaryInput::from_json(br#"{"entryCount": 1, "totalHours": null}"#).unwrap();
        assert_eq!(missing.validate(today()), Err(ValidationError::MissingField("totalHours")));
    }
}
