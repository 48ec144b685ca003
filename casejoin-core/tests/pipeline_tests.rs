use casejoin_core::reader::{CellValue, Table, read_sheet};
use casejoin_core::writer::write_xlsx;
use casejoin_core::{CaseJoiner, JoinConfig, JoinError, PipelineVariant};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn steps_sheet() -> Table {
    let mut table = Table::new("Steps", vec!["Name".to_string(), "Command".to_string()]);
    table.push_row(vec![text("LCD Voltage Test"), text("CMD1")]);
    table.push_row(vec![text("LCD Timing Test"), text("CMD2")]);
    table
}

fn test_lines_sheet(rows: &[(CellValue, CellValue)]) -> Table {
    let mut table = Table::new(
        "TestLines",
        vec!["GoalName".to_string(), "TestStep5".to_string()],
    );
    for (goal, step) in rows {
        table.push_row(vec![goal.clone(), step.clone()]);
    }
    table
}

// Helper to create a workbook holding both the reference and identifier sheets
fn create_book(dir: &Path, test_lines: &Table) -> PathBuf {
    let path = dir.join("NGATestlines.xlsx");
    write_xlsx(&path, &[&steps_sheet(), test_lines]).expect("Failed to write fixture");
    path
}

fn config_with_output(output: PathBuf) -> JoinConfig {
    let mut config = JoinConfig::default();
    config.output.path = output;
    config
}

#[test]
fn test_fixture_workbook_reads_back() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(
        dir.path(),
        &test_lines_sheet(&[(text("LCD_CXL_7: Voltage Test"), text("s"))]),
    );

    assert_eq!(read_sheet(&book, "Steps").unwrap(), steps_sheet());
    assert_eq!(read_sheet(&book, "TestLines").unwrap().columns, vec!["GoalName", "TestStep5"]);
}

#[test]
fn test_end_to_end_plain_variant() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(
        dir.path(),
        &test_lines_sheet(&[
            (text("LCD_CXL_7: Voltage Test"), CellValue::Empty),
            (text("LCD_CXL_9: Unrelated"), CellValue::Empty),
        ]),
    );
    let output = dir.path().join("output_result.xlsx");

    let joiner = CaseJoiner::with_config(config_with_output(output.clone()));
    let report = joiner.run(&book, &book).unwrap();

    assert_eq!(report.table.variant, PipelineVariant::Plain);
    assert_eq!(report.table.len(), 1);
    assert_eq!(report.output.as_deref(), Some(output.as_path()));
    assert!(report.persistence_error.is_none());

    let written = read_sheet(&output, "Sheet1").unwrap();
    assert_eq!(written.columns, vec!["Name", "Command", "Extracted_Number"]);
    assert_eq!(
        written.rows,
        vec![vec![text("LCD Voltage Test"), text("CMD1"), text("7")]]
    );
}

#[test]
fn test_end_to_end_checker_variant() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(
        dir.path(),
        &test_lines_sheet(&[(text("LCD_CXL_1: Timing Test"), text("press reset"))]),
    );
    let output = dir.path().join("checked.xlsx");

    let mut config = config_with_output(output.clone());
    config.identifiers.step_column = Some("TestStep5".to_string());
    let report = CaseJoiner::with_config(config).run(&book, &book).unwrap();

    assert_eq!(report.table.variant, PipelineVariant::WithChecker);
    let written = read_sheet(&output, "Sheet1").unwrap();
    assert_eq!(
        written.columns,
        vec!["Name", "Command", "Extracted_Number", "Checker"]
    );
    assert_eq!(
        written.rows,
        vec![vec![
            text("LCD Timing Test"),
            text("CMD2"),
            text("1"),
            text("press reset")
        ]]
    );
}

#[test]
fn test_empty_identifiers_write_nothing() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(dir.path(), &test_lines_sheet(&[]));
    let output = dir.path().join("output_result.xlsx");

    let report = CaseJoiner::with_config(config_with_output(output.clone()))
        .run(&book, &book)
        .unwrap();

    assert!(report.is_empty());
    assert!(report.output.is_none());
    assert!(!output.exists());
}

#[test]
fn test_empty_identifiers_skip_reference_sheet() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(dir.path(), &test_lines_sheet(&[]));
    let output = dir.path().join("output_result.xlsx");

    let mut config = config_with_output(output.clone());
    config.reference.sheet = "Missing".to_string();
    config.reference.value_column = "Nope".to_string();
    let report = CaseJoiner::with_config(config).run(&book, &book).unwrap();

    assert!(report.is_empty());
    assert!(report.persistence_error.is_none());
    assert!(!output.exists());
}

#[test]
fn test_no_match_writes_nothing() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(
        dir.path(),
        &test_lines_sheet(&[(text("LCD_CXL_9: Unrelated"), CellValue::Empty)]),
    );
    let output = dir.path().join("output_result.xlsx");

    let report = CaseJoiner::with_config(config_with_output(output.clone()))
        .run(&book, &book)
        .unwrap();

    assert!(report.is_empty());
    assert!(!output.exists());
}

#[test]
fn test_missing_sheet_and_column_are_schema_errors() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(
        dir.path(),
        &test_lines_sheet(&[(text("LCD_CXL_7: Voltage Test"), CellValue::Empty)]),
    );

    let mut config = config_with_output(dir.path().join("out.xlsx"));
    config.reference.sheet = "Missing".to_string();
    let err = CaseJoiner::with_config(config).run(&book, &book).unwrap_err();
    assert!(matches!(err, JoinError::SheetNotFound { .. }));

    let mut config = config_with_output(dir.path().join("out.xlsx"));
    config.reference.id_column = "id_name".to_string();
    let err = CaseJoiner::with_config(config).run(&book, &book).unwrap_err();
    assert!(matches!(err, JoinError::MissingColumn { ref column, .. } if column == "id_name"));
    assert!(!dir.path().join("out.xlsx").exists());
}

#[test]
fn test_persistence_failure_keeps_table() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(
        dir.path(),
        &test_lines_sheet(&[(text("LCD_CXL_7: Voltage Test"), CellValue::Empty)]),
    );
    let output = dir.path().join("no_such_dir").join("out.xlsx");

    let report = CaseJoiner::with_config(config_with_output(output.clone()))
        .run(&book, &book)
        .unwrap();

    assert_eq!(report.table.len(), 1);
    assert!(report.output.is_none());
    assert!(matches!(
        report.persistence_error,
        Some(JoinError::Persistence { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_find_values() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(dir.path(), &test_lines_sheet(&[]));

    let joiner = CaseJoiner::new();
    assert_eq!(joiner.find(&book, "lcd").unwrap(), vec![text("CMD1"), text("CMD2")]);
    assert_eq!(joiner.find(&book, "voltage").unwrap(), vec![text("CMD1")]);
    assert!(joiner.find(&book, "missing").unwrap().is_empty());
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let book = create_book(
        dir.path(),
        &test_lines_sheet(&[
            (text("LCD_CXL_2: Test"), CellValue::Empty),
            (text("LCD_CXL_3: voltage"), CellValue::Empty),
        ]),
    );

    let mut config = config_with_output(dir.path().join("a.xlsx"));
    let first = CaseJoiner::with_config(config.clone()).run(&book, &book).unwrap();
    config.parallel = true;
    config.output.path = dir.path().join("b.xlsx");
    let second = CaseJoiner::with_config(config).run(&book, &book).unwrap();

    assert_eq!(first.table, second.table);
    assert_eq!(first.table.len(), 3);
    assert_eq!(
        read_sheet(dir.path().join("a.xlsx"), "Sheet1").unwrap().rows,
        read_sheet(dir.path().join("b.xlsx"), "Sheet1").unwrap().rows
    );
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_decisions_observable_through_injected_subscriber() {
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let batch = casejoin_core::IdentifierBatch {
            identifiers: vec![CellValue::Number(1.0), text("LCD_CXL_9: Unrelated")],
            steps: None,
        };
        let result = CaseJoiner::new().join_tables(&steps_sheet(), &batch).unwrap();
        assert!(result.is_empty());

        let batch = casejoin_core::IdentifierBatch {
            identifiers: vec![text("LCD_CXL_1: A")],
            steps: Some(vec![]),
        };
        assert!(CaseJoiner::new().join_tables(&steps_sheet(), &batch).is_err());
    });

    let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("WARN"));
    assert!(output.contains("skipping non-text identifier"));
    assert!(output.contains("no matching rows found"));
    assert!(output.contains("ERROR"));
    assert!(output.contains("same length"));
}
