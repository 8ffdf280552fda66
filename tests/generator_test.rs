mod common;

#[test]
fn test_generate_simple_csv() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_csv(file.path(), 5).expect("Failed to generate CSV");

    let content = std::fs::read_to_string(file.path()).expect("Failed to read file");
    // Header + 5 rows = 6 lines
    assert_eq!(content.lines().count(), 6);
}

#[test]
fn test_generated_rows_are_valid_shapes() {
    let file = tempfile::NamedTempFile::new().unwrap();
    common::generate_csv(file.path(), 200).expect("Failed to generate CSV");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(file.path())
        .expect("Failed to open CSV");

    let mut lengths = std::collections::HashSet::new();
    for result in reader.records() {
        let record = result.expect("Failed to read record");
        let document = &record[1];
        assert!(document.bytes().all(|b| b.is_ascii_digit()));
        lengths.insert(document.len());

        let amount: f64 = record[2].parse().expect("Failed to parse amount");
        assert!(amount >= 0.01);
    }

    // With 200 rows both CPF and CNPJ shapes show up
    assert_eq!(lengths, [11, 14].into_iter().collect());
}
