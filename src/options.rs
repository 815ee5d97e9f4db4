/// Options controlling how a report page is laid out and saved.
///
/// Everything here is fixed per generation call; the defaults produce an A4
/// page in Helvetica with English labels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default, rename_all = "camelCase"))]
pub struct ReportOptions {
    /// PDF version written into the file header.
    pub version: String,
    /// Page geometry as `[llx lly urx ury]`.
    pub media_box: [i64; 4],
    /// Resource name the content stream uses to select the font.
    pub font_resource: String,
    /// One of the standard 14 fonts; never embedded.
    pub base_font: String,
    pub title: String,
    pub generated_label: String,
    pub section_header: String,
    pub total_hours_label: String,
    pub entry_count_label: String,
    pub average_hours_label: String,
    pub invalid_count_label: String,
    /// Shown instead of a summary sentence when no entries were recorded.
    pub empty_note: String,
    pub title_size: i64,
    pub header_size: i64,
    pub body_size: i64,
    pub small_size: i64,
    /// X position of every line.
    pub left: i64,
    /// Baseline of the title line.
    pub top: i64,
    /// Vertical distance between KPI lines.
    pub leading: i64,
    /// Fraction digits for hour figures.
    pub decimals: usize,
    pub decimal_separator: char,
    /// Suggested download name.
    pub filename: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            version: "1.4".to_string(),
            media_box: [0, 0, 595, 842],
            font_resource: "F1".to_string(),
            base_font: "Helvetica".to_string(),
            title: "Weekly Report".to_string(),
            generated_label: "Generated on".to_string(),
            section_header: "KPIs".to_string(),
            total_hours_label: "Total hours".to_string(),
            entry_count_label: "Entries".to_string(),
            average_hours_label: "Average hours per entry".to_string(),
            invalid_count_label: "Invalid values ignored".to_string(),
            empty_note: "No evaluable entries for the selected period.".to_string(),
            title_size: 20,
            header_size: 14,
            body_size: 12,
            small_size: 10,
            left: 56,
            top: 780,
            leading: 18,
            decimals: 1,
            decimal_separator: '.',
            filename: "weekly-report.pdf".to_string(),
        }
    }
}

impl ReportOptions {
    /// Create a builder for ReportOptions
    pub fn builder() -> ReportOptionsBuilder {
        ReportOptionsBuilder::default()
    }
}

/// Builder for ReportOptions
#[derive(Default)]
pub struct ReportOptionsBuilder {
    options: ReportOptions,
}

impl ReportOptionsBuilder {
    pub fn version<S: Into<String>>(mut self, value: S) -> Self {
        self.options.version = value.into();
        self
    }

    pub fn media_box(mut self, value: [i64; 4]) -> Self {
        self.options.media_box = value;
        self
    }

    pub fn base_font<S: Into<String>>(mut self, value: S) -> Self {
        self.options.base_font = value.into();
        self
    }

    pub fn title<S: Into<String>>(mut self, value: S) -> Self {
        self.options.title = value.into();
        self
    }

    pub fn section_header<S: Into<String>>(mut self, value: S) -> Self {
        self.options.section_header = value.into();
        self
    }

    /// Set the labels of the date line and the KPI lines, in display order.
    pub fn labels<S: Into<String>>(
        mut self, generated: S, total_hours: S, entry_count: S, average_hours: S, invalid_count: S,
    ) -> Self {
        self.options.generated_label = generated.into();
        self.options.total_hours_label = total_hours.into();
        self.options.entry_count_label = entry_count.into();
        self.options.average_hours_label = average_hours.into();
        self.options.invalid_count_label = invalid_count.into();
        self
    }

    pub fn empty_note<S: Into<String>>(mut self, value: S) -> Self {
        self.options.empty_note = value.into();
        self
    }

    pub fn decimals(mut self, value: usize) -> Self {
        self.options.decimals = value;
        self
    }

    pub fn decimal_separator(mut self, value: char) -> Self {
        self.options.decimal_separator = value;
        self
    }

    pub fn filename<S: Into<String>>(mut self, value: S) -> Self {
        self.options.filename = value.into();
        self
    }

    /// Build the ReportOptions
    pub fn build(self) -> ReportOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let options = ReportOptions::builder()
            .title("Wöchentlicher Bericht")
            .decimals(2)
            .decimal_separator(',')
            .media_box([0, 0, 612, 792])
            .build();
        assert_eq!(options.title, "Wöchentlicher Bericht");
        assert_eq!(options.decimals, 2);
        assert_eq!(options.decimal_separator, ',');
        assert_eq!(options.media_box, [0, 0, 612, 792]);
        assert_eq!(options.version, "1.4");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_partial_config() {
        let options: ReportOptions =
            serde_json::from_str(r#"{"title": "Bericht", "decimalSeparator": ",", "filename": "bericht.pdf"}"#)
                .unwrap();
        assert_eq!(options.title, "Bericht");
        assert_eq!(options.decimal_separator, ',');
        assert_eq!(options.filename, "bericht.pdf");
        assert_eq!(options.base_font, "Helvetica");
    }
}
