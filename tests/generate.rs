mod utils;

use kpipdf::{
    ContentBuilder, Document, Error, ObjectKind, ObjectTable, ReportOptions, ReportText, SummaryInput, SummaryRecord,
    ValidationError, XrefEntry, generate, generate_from_record, verify,
};
use utils::*;

fn render(record: &SummaryRecord, options: &ReportOptions) -> kpipdf::Rendered {
    let text = ReportText::from_record(record, options);
    let content = ContentBuilder::build(&text, options).unwrap();
    let table = ObjectTable::new(&content, options).unwrap();
    Document::new(table, options.version.as_str()).render().unwrap()
}

fn records() -> Vec<SummaryRecord> {
    vec![
        sample_record(),
        SummaryInput::new(0, 0.0).validate(report_date()).unwrap(),
        SummaryInput::new(1_000_000, 123_456.789).validate(report_date()).unwrap(),
        SummaryInput::new(3, -4.25).with_invalid_count(17).validate(report_date()).unwrap(),
    ]
}

fn german() -> ReportOptions {
    ReportOptions::builder()
        .title("Wöchentliches Reporting")
        .section_header("KPIs (Übersicht)")
        .labels(
            "Erstellt am",
            "Summe Stunden",
            "Einträge",
            "Durchschnitt Stunden / Eintrag",
            "Ungültige Werte",
        )
        .empty_note("Für den ausgewählten Zeitraum liegen keine auswertbaren Einträge vor.")
        .decimals(2)
        .decimal_separator(',')
        .build()
}

#[test]
fn every_offset_points_at_its_object() {
    for options in [ReportOptions::default(), german()] {
        for record in records() {
            let rendered = render(&record, &options);
            for id in 1..=5u32 {
                let offset = rendered.xref.get(id).and_then(XrefEntry::offset).unwrap() as usize;
                let header = format!("{} 0 obj", id);
                assert_eq!(
                    &rendered.bytes[offset..offset + header.len()],
                    header.as_bytes(),
                    "object {id}"
                );
                assert_eq!(find(&rendered.bytes, format!("\n{} 0 obj", id).as_bytes()), Some(offset - 1));
            }
        }
    }
}

#[test]
fn declared_length_matches_content_bytes() {
    for options in [ReportOptions::default(), german()] {
        for record in records() {
            let rendered = render(&record, &options);
            let layout = verify(&rendered.bytes).unwrap();

            let start = find(&rendered.bytes, b"stream\n").unwrap() + b"stream\n".len();
            let end = find(&rendered.bytes, b"\nendstream").unwrap();
            let declared = format!("<</Length {}>>", end - start);
            assert!(find(&rendered.bytes, declared.as_bytes()).is_some(), "{declared}");
            assert_eq!(layout.content, rendered.bytes[start..end].to_vec());
        }
    }
}

#[test]
fn non_ascii_text_changes_byte_length_not_char_count() {
    // "ä" is one byte in the page encoding and two in UTF-8; the stream must
    // declare the encoded length.
    let rendered = render(&sample_record(), &german());
    let layout = verify(&rendered.bytes).unwrap();
    assert!(find(&layout.content, b"(Eintr\xE4ge: 12) Tj").is_some());
    assert!(layout.text_lines().contains(&"Einträge: 12".to_string()));
    assert!(layout.text_lines().contains(&"Summe Stunden: 34,50".to_string()));
}

#[test]
fn xref_has_one_entry_more_than_objects() {
    let rendered = render(&sample_record(), &ReportOptions::default());
    assert_eq!(rendered.xref.size, 6);
    assert!(find(&rendered.bytes, b"xref\n0 6\n0000000000 65535 f \n").is_some());
    let table_end = find(&rendered.bytes, b"trailer\n").unwrap();
    let entries = &rendered.bytes[rendered.xref_start + b"xref\n0 6\n".len()..table_end];
    assert_eq!(entries.len(), 6 * 20);
    assert!(find(&rendered.bytes, b"<</Root 1 0 R/Size 6>>").is_some());
}

#[test]
fn startxref_names_the_xref_keyword() {
    for record in records() {
        let rendered = render(&record, &ReportOptions::default());
        let position = find(&rendered.bytes, b"\nxref\n").unwrap() + 1;
        assert_eq!(rendered.xref_start, position);
        let tail = format!("\nstartxref\n{}\n%%EOF\n", position);
        assert!(rendered.bytes.ends_with(tail.as_bytes()));
        assert_eq!(verify(&rendered.bytes).unwrap().xref_start, position);
    }
}

#[test]
fn structural_ids_never_change() {
    for record in records() {
        let layout = verify(&render(&record, &german()).bytes).unwrap();
        assert_eq!(layout.root, ObjectKind::Catalog.id());
        let catalog = layout.objects[&1].as_dict().unwrap();
        assert_eq!(catalog.get(b"Pages").unwrap().as_reference().unwrap(), ObjectKind::PageTree.id());
        let pages = layout.objects[&2].as_dict().unwrap();
        assert_eq!(
            pages.get(b"Kids").unwrap().as_array().unwrap()[0].as_reference().unwrap(),
            ObjectKind::Page.id()
        );
        let page = layout.objects[&3].as_dict().unwrap();
        assert_eq!(page.get(b"Contents").unwrap().as_reference().unwrap(), (4, 0));
        let font = layout.objects[&5].as_dict().unwrap();
        assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
    }
}

#[test]
fn concrete_scenario() {
    let bytes = generate(&sample_input(), &ReportOptions::default()).unwrap();
    let layout = verify(&bytes).unwrap();
    assert_eq!(layout.objects.len(), 5);
    assert_eq!(
        layout.text_lines(),
        vec![
            "Weekly Report",
            "Generated on 2024-03-08",
            "KPIs",
            "Total hours: 34.5",
            "Entries: 12",
            "Average hours per entry: 2.9",
            "Invalid values ignored: 1",
        ]
    );
}

#[test]
fn empty_period_gets_a_note() {
    let record = SummaryInput::new(0, 0.0).validate(report_date()).unwrap();
    let options = ReportOptions::default();
    let text = ReportText::from_record(&record, &options);
    let bytes = generate_from_record(&record, &text, &options).unwrap();
    let lines = verify(&bytes).unwrap().text_lines();
    assert_eq!(lines.last().map(String::as_str), Some("No evaluable entries for the selected period."));
    assert!(lines.contains(&"Entries: 0".to_string()));
}

#[test]
fn generation_is_deterministic() {
    let first = generate(&sample_input(), &german()).unwrap();
    let second = generate(&sample_input(), &german()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_fields_produce_no_output() {
    let missing_entries = SummaryInput {
        total_hours: Some(34.5),
        ..SummaryInput::default()
    };
    let missing_total = SummaryInput {
        entry_count: Some(12),
        ..SummaryInput::default()
    };
    for (input, field) in [(missing_entries, "entryCount"), (missing_total, "totalHours")] {
        match generate(&input, &ReportOptions::default()) {
            Err(Error::Validation(ValidationError::MissingField(name))) => assert_eq!(name, field),
            other => panic!("expected validation error, got {:?}", other.map(|bytes| bytes.len())),
        }
    }
}

#[test]
fn concurrent_generation() {
    let handles: Vec<_> = (0..8u64)
        .map(|n| {
            std::thread::spawn(move || {
                let input = SummaryInput::new(n, n as f64 * 1.5).with_generated_on(report_date());
                generate(&input, &ReportOptions::default()).unwrap()
            })
        })
        .collect();
    for (n, handle) in handles.into_iter().enumerate() {
        let bytes = handle.join().unwrap();
        let lines = verify(&bytes).unwrap().text_lines();
        assert!(lines.contains(&format!("Entries: {}", n)));
    }
}

#[test]
fn save_writes_the_rendered_bytes() {
    let options = ReportOptions::default();
    let text = ReportText::from_record(&sample_record(), &options);
    let content = ContentBuilder::build(&text, &options).unwrap();
    let document = Document::new(ObjectTable::new(&content, &options).unwrap(), "1.4");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&options.filename);
    document.save(&path).unwrap();
    let mut buffer = Vec::new();
    document.save_to(&mut buffer).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), buffer);
}
