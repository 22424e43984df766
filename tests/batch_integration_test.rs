use rust_xlsxwriter::Workbook;
use seat_chart::domain::model::SkipReason;
use seat_chart::{BatchEngine, LocalStorage, SeatChartError, SeatChartPipeline, TomlConfig};
use std::path::Path;
use tempfile::TempDir;

const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<class>
  <seat><name>192.168.19.1</name></seat>
  <seat><name>192.168.19.2</name></seat>
  <seat><name>192.168.19.9</name></seat>
  <seat><name>192.168.19.10</name></seat>
  <seat><name>192.168.19.11</name></seat>
</class>
"#;

fn normalized(path: &Path) -> String {
    path.to_str().unwrap().replace('\\', "/")
}

fn write_roster_xlsx(path: &Path, rows: &[(&str, f64)]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "序号").unwrap();
    worksheet.write_string(0, 1, "姓名").unwrap();
    worksheet.write_string(0, 2, "考号").unwrap();
    for (idx, (name, id)) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        worksheet.write_number(row, 0, row as f64).unwrap();
        worksheet.write_string(row, 1, *name).unwrap();
        worksheet.write_number(row, 2, *id).unwrap();
    }
    workbook.save(path).unwrap();
}

fn config_for(dir: &TempDir, input: &str, extra_output: &str) -> TomlConfig {
    let base = normalized(dir.path());
    let content = format!(
        r#"
[input]
path = "{base}/{input}"

[template]
path = "{base}/a.cls"

[output]
path = "{base}/out"
{extra_output}
"#
    );
    TomlConfig::from_toml_str(&content).unwrap()
}

async fn run(config: TomlConfig) -> seat_chart::Result<seat_chart::core::RunReport> {
    let storage = LocalStorage::new(config.output.path.clone());
    let pipeline = SeatChartPipeline::new(storage, config);
    BatchEngine::new(pipeline).run().await
}

#[tokio::test]
async fn test_end_to_end_from_xlsx() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.cls"), TEMPLATE).unwrap();
    write_roster_xlsx(
        &dir.path().join("2025mt.xlsx"),
        &[
            ("Li Wei", 250010309.0),
            ("王芳", 250010310.0),
            ("张三", 250010201.0),
            ("短号", 25001020.0),
        ],
    );

    let report = run(config_for(&dir, "2025mt.xlsx", "")).await.unwrap();

    assert_eq!(report.total_rows, 4);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::InvalidIdentifierFormat {
            identifier: 25001020
        }
    );
    assert_eq!(report.classes.len(), 2);
    assert_eq!(report.classes[0].class_number, 2);
    assert_eq!(report.classes[1].matched, vec![9, 10]);

    let class_03 = std::fs::read_to_string(dir.path().join("out/class_03.cls")).unwrap();
    assert!(class_03.contains("<seat><name>09Li Wei</name></seat>"));
    assert!(class_03.contains("<seat><name>10王芳</name></seat>"));
    assert!(class_03.contains("<seat><name>192.168.19.1</name></seat>"));
    assert!(class_03.contains("<seat><name>192.168.19.11</name></seat>"));

    let class_02 = std::fs::read_to_string(dir.path().join("out/class_02.cls")).unwrap();
    assert!(class_02.contains("<seat><name>01张三</name></seat>"));
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.cls"), TEMPLATE).unwrap();
    std::fs::write(
        dir.path().join("roster.csv"),
        "name,id\nAnn,250010301\nBen,250010302\nCid,250010411\n",
    )
    .unwrap();
    let extra = "bundle = \"charts.zip\"\nreport = \"report.json\"";

    run(config_for(&dir, "roster.csv", extra)).await.unwrap();
    let first: Vec<Vec<u8>> = ["class_03.cls", "class_04.cls", "charts.zip", "report.json"]
        .iter()
        .map(|f| std::fs::read(dir.path().join("out").join(f)).unwrap())
        .collect();

    run(config_for(&dir, "roster.csv", extra)).await.unwrap();
    let second: Vec<Vec<u8>> = ["class_03.cls", "class_04.cls", "charts.zip", "report.json"]
        .iter()
        .map(|f| std::fs::read(dir.path().join("out").join(f)).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_template_aborts_before_output() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("roster.csv"), "name,id\nAnn,250010301\n").unwrap();

    let err = run(config_for(&dir, "roster.csv", "")).await.unwrap_err();

    match err {
        SeatChartError::MissingRequiredFile { paths } => {
            assert_eq!(paths.len(), 1);
            assert!(paths[0].ends_with("a.cls"));
        }
        other => panic!("expected MissingRequiredFile, got {:?}", other),
    }
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn test_unknown_columns_abort_before_output() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.cls"), TEMPLATE).unwrap();
    std::fs::write(dir.path().join("roster.csv"), "学生,编号\nAnn,250010301\n").unwrap();

    let err = run(config_for(&dir, "roster.csv", "")).await.unwrap_err();

    assert!(matches!(err, SeatChartError::SchemaResolution { .. }));
    assert!(err.user_friendly_message().contains("学生"));
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn test_class_with_no_matching_seat_is_still_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.cls"), TEMPLATE).unwrap();
    std::fs::write(
        dir.path().join("roster.csv"),
        "name,id\nAnn,250010350\nBen,250010401\n",
    )
    .unwrap();

    let report = run(config_for(&dir, "roster.csv", "")).await.unwrap();

    assert_eq!(report.classes.len(), 2);
    assert!(report.classes[0].matched.is_empty());
    assert_eq!(report.classes[0].unmatched[0].seat_number, 50);
    assert_eq!(report.classes[1].matched, vec![1]);
    assert_eq!(report.generated_files.len(), 2);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.cls"), TEMPLATE).unwrap();
    std::fs::write(dir.path().join("roster.csv"), "name,id\nAnn,250010301\n").unwrap();

    let config = config_for(&dir, "roster.csv", "");
    let storage = LocalStorage::new(config.output.path.clone());
    let engine = BatchEngine::new(SeatChartPipeline::new(storage, config));

    let plan = engine.plan().await.unwrap();
    assert_eq!(plan.classes.len(), 1);
    assert_eq!(plan.classes[0].file_name, "class_03.cls");
    assert!(plan.classes[0].outcome.text.contains("<name>01Ann</name>"));
    assert!(!dir.path().join("out").exists());
}
