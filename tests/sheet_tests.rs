use cell_annot_rs::sheet;

#[test]
fn test_read_sample_sheet() {
    let path = "tests/data/sample.csv";
    let df = sheet::read_sample_sheet(path).unwrap();

    // the label and numeric cluster columns are stripped, rows truncate at
    // the cluster column's first missing value
    assert_eq!(df.width(), 2);
    assert_eq!(df.height(), 3);

    let names: Vec<&str> = df.get_columns().iter().map(|c| c.name().as_str()).collect();
    assert_eq!(names, ["Ch1", "Ch2"]);

    let ch1 = df.column("Ch1").unwrap().str().unwrap();
    assert_eq!(ch1.get(0), Some("CD3D"));
    assert_eq!(ch1.get(2), Some("TRAC"));

    // test file does not exist
    let result = sheet::read_sample_sheet("tests/data/nonexistent.csv");
    assert!(result.is_err());
}

#[test]
fn test_read_sample_sheet_without_index_column() {
    let result = sheet::read_sample_sheet("tests/data/no_index.csv");
    assert!(result.is_err());
}

#[test]
fn test_read_reference_sheet() {
    let path = "tests/data/reference.csv";
    let df = sheet::read_reference_sheet(path).unwrap();

    // the interleaved ordering sub-columns are skipped
    assert_eq!(df.width(), 2);
    assert_eq!(df.height(), 3);

    let names: Vec<&str> = df.get_columns().iter().map(|c| c.name().as_str()).collect();
    assert_eq!(names, ["T cell", "B cell"]);

    let t_cell = df.column("T cell").unwrap().str().unwrap();
    assert_eq!(t_cell.get(0), Some("CD3D"));
    assert_eq!(t_cell.get(2), Some("TRAC"));

    // test file does not exist
    let result = sheet::read_reference_sheet("tests/data/nonexistent.csv");
    assert!(result.is_err());
}
