//! End-to-end tests of the `sheetorder` binary

use std::io::Cursor;
use std::path::Path;

use assert_cmd::Command;
use calamine::{Data, Reader, Xlsx};
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

fn write_input_workbook(path: &Path, header: &[&str], rows: &[[&str; 3]]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (n_col, c_name) in header.iter().enumerate() {
        worksheet
            .write_string(0, n_col as u16, *c_name)
            .expect("header");
    }
    for (n_idx, l_row) in rows.iter().enumerate() {
        for (n_col, c_value) in l_row.iter().enumerate() {
            worksheet
                .write_string(n_idx as u32 + 1, n_col as u16, *c_value)
                .expect("cell");
        }
    }
    workbook.save(path).expect("save");
}

fn read_column(path: &Path, n_col: usize) -> Vec<Data> {
    let v_bytes = std::fs::read(path).expect("read output");
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(v_bytes)).expect("open");
    let range = workbook.worksheet_range_at(0).expect("sheet").expect("range");
    range.rows().skip(1).map(|row| row[n_col].clone()).collect()
}

#[test]
fn test_cli_college_order_writes_default_file() {
    let dir = TempDir::new().expect("tempdir");
    let path_input = dir.path().join("报名.xlsx");
    write_input_workbook(
        &path_input,
        &["姓名", "学院", "学号"],
        &[
            ["甲", "某新学院", "20240000001"],
            ["乙", "外院", "20240000002"],
            ["丙", "经管学院", "20240000003"],
        ],
    );

    Command::cargo_bin("sheetorder")
        .expect("binary")
        .arg(&path_input)
        .assert()
        .success()
        .stdout(predicate::str::contains("[ORDER] mode=college"));

    let path_output = dir.path().join("按学院排序.xlsx");
    assert!(path_output.exists());
    assert_eq!(
        read_column(&path_output, 1),
        vec![
            Data::String("经济与管理学院".to_string()),
            Data::String("外国语学院".to_string()),
            Data::String("某新学院".to_string()),
        ]
    );
    assert_eq!(
        read_column(&path_output, 2)[0],
        Data::String("20240000003".to_string())
    );
}

#[test]
fn test_cli_time_order_with_preview() {
    let dir = TempDir::new().expect("tempdir");
    let path_input = dir.path().join("in.xlsx");
    let path_output = dir.path().join("out.xlsx");
    write_input_workbook(
        &path_input,
        &["姓名", "学院", "开始时间"],
        &[
            ["甲", "法学院", "2024-01-03"],
            ["乙", "法学院", "not a date"],
            ["丙", "法学院", "2024-01-01"],
        ],
    );

    Command::cargo_bin("sheetorder")
        .expect("binary")
        .arg(&path_input)
        .args(["--mode", "time", "--preview", "2", "-o"])
        .arg(&path_output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Before"))
        .stdout(predicate::str::contains("by=time"));

    assert_eq!(
        read_column(&path_output, 0),
        vec![
            Data::String("丙".to_string()),
            Data::String("甲".to_string()),
            Data::String("乙".to_string()),
        ]
    );
}

#[test]
fn test_cli_missing_category_column_fails_without_output() {
    let dir = TempDir::new().expect("tempdir");
    let path_input = dir.path().join("in.xlsx");
    write_input_workbook(&path_input, &["姓名", "部门", "日期"], &[["甲", "x", "y"]]);

    Command::cargo_bin("sheetorder")
        .expect("binary")
        .arg(&path_input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("学院"));

    assert!(!dir.path().join("按学院排序.xlsx").exists());
}

#[test]
fn test_cli_rules_file_overrides_order() {
    let dir = TempDir::new().expect("tempdir");
    let path_input = dir.path().join("in.xlsx");
    let path_rules = dir.path().join("rules.json");
    let path_output = dir.path().join("out.xlsx");
    write_input_workbook(
        &path_input,
        &["姓名", "部门", "备注"],
        &[["甲", "B", ""], ["乙", "a", ""], ["丙", "C", ""]],
    );
    std::fs::write(
        &path_rules,
        r#"{"column_category": "部门", "order": ["A", "B"], "aliases": {"a": "A"}}"#,
    )
    .expect("rules");

    Command::cargo_bin("sheetorder")
        .expect("binary")
        .arg(&path_input)
        .arg("--rules")
        .arg(&path_rules)
        .arg("-o")
        .arg(&path_output)
        .assert()
        .success();

    assert_eq!(
        read_column(&path_output, 1),
        vec![
            Data::String("A".to_string()),
            Data::String("B".to_string()),
            Data::String("C".to_string()),
        ]
    );
}

#[test]
fn test_cli_refuses_to_overwrite_input() {
    let dir = TempDir::new().expect("tempdir");
    let path_input = dir.path().join("按学院排序.xlsx");
    write_input_workbook(
        &path_input,
        &["姓名", "学院", "学号"],
        &[["甲", "外院", "20240000001"], ["乙", "经管学院", "20240000002"]],
    );
    let v_bytes_before = std::fs::read(&path_input).expect("read input");

    Command::cargo_bin("sheetorder")
        .expect("binary")
        .arg(&path_input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("overwrite the input"));

    assert_eq!(std::fs::read(&path_input).expect("read input"), v_bytes_before);
}
