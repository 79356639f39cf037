use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;
use lotto_lib::wish::check_wish_file;
use lotto_lib::{Draw, SummaryFormat};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::Path;

fn draw(no: u32, main: [i64; 6], bonus: i64) -> Draw {
    Draw::new(no, NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(), main, bonus).unwrap()
}

fn history() -> Vec<Draw> {
    vec![
        draw(101, [1, 2, 3, 4, 40, 41], 42),
        draw(102, [1, 2, 3, 4, 5, 6], 7),
        draw(103, [1, 2, 3, 4, 43, 44], 45),
    ]
}

#[test]
fn wish_file_gets_result_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wish_number.csv");
    fs::write(
        &path,
        "Memo,Num1,Num2,Num3,Num4,Num5,Num6\n\
         birthday,1,2,3,4,5,6\n\
         random,20,21,22,23,24,25\n\
         second,7,5,4,3,2,1\n",
    )
    .unwrap();

    let outcomes = check_wish_file(&path, &history(), &SummaryFormat::default()).unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].summary.first.occurrences, vec![102]);
    assert_eq!(outcomes[0].summary.fourth.occurrences, vec![101, 103]);
    assert_eq!(outcomes[2].result, "2nd 1times, 4th 2times");

    let written = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "Memo,Num1,Num2,Num3,Num4,Num5,Num6,Result,Details");
    assert_eq!(
        lines[1],
        "birthday,1,2,3,4,5,6,\"1st 1times, 4th 2times\",\"1st: 102; 4th: 101, 103\""
    );
    assert_eq!(lines[2], "random,20,21,22,23,24,25,no win,");
}

#[test]
fn wish_file_rerun_overwrites_previous_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wish_number.csv");
    fs::write(&path, "Num1,Num2,Num3,Num4,Num5,Num6\n1,2,3,4,5,6\n").unwrap();

    check_wish_file(&path, &history(), &SummaryFormat::korean()).unwrap();
    check_wish_file(&path, &history()[..1], &SummaryFormat::korean()).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "Num1,Num2,Num3,Num4,Num5,Num6,Result,Details\n1,2,3,4,5,6,4등 1회,4등: 101\n"
    );
}

#[test]
fn invalid_wish_row_aborts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wish_number.csv");
    let original = "Num1,Num2,Num3,Num4,Num5,Num6\n1,2,3,4,5,6\n1,1,2,3,4,5\n";
    fs::write(&path, original).unwrap();

    let err = check_wish_file(&path, &history(), &SummaryFormat::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("wish row 2"));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn missing_number_column_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wish_number.csv");
    fs::write(&path, "Num1,Num2,Num3,Num4,Num5\n1,2,3,4,5\n").unwrap();

    let err = check_wish_file(&path, &history(), &SummaryFormat::default()).unwrap_err();
    assert!(err.to_string().contains("Num6"));
}

#[test]
fn wider_row_than_header_aborts_and_keeps_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wish_number.csv");
    let original = "Num1,Num2,Num3,Num4,Num5,Num6\n1,2,3,4,5,6,keep-me,and-me\n";
    fs::write(&path, original).unwrap();

    let err = check_wish_file(&path, &history(), &SummaryFormat::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("wish row 1"));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn header_only_wish_file_gets_result_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wish_number.csv");
    fs::write(&path, "Memo,Num1,Num2,Num3,Num4,Num5,Num6\n").unwrap();

    let outcomes = check_wish_file(&path, &history(), &SummaryFormat::default()).unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Memo,Num1,Num2,Num3,Num4,Num5,Num6,Result,Details\n"
    );
}

#[test]
fn rewrite_leaves_no_temporary_files_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wish_number.csv");
    fs::write(&path, "Num1,Num2,Num3,Num4,Num5,Num6\n1,2,3,4,5,6\n").unwrap();

    check_wish_file(&path, &history(), &SummaryFormat::default()).unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec!["wish_number.csv"]);
}

fn write_xlsx(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("wishes").unwrap();
    for (col, header) in ["Memo", "Num1", "Num2", "Num3", "Num4", "Num5", "Num6", "Result"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    let rows: [(&str, [f64; 6]); 2] = [
        ("007", [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        ("nothing", [20.0, 21.0, 22.0, 23.0, 24.0, 25.0]),
    ];
    for (r, (memo, numbers)) in rows.iter().enumerate() {
        let row = r as u32 + 1;
        sheet.write_string(row, 0, *memo).unwrap();
        for (c, n) in numbers.iter().enumerate() {
            sheet.write_number(row, c as u16 + 1, *n).unwrap();
        }
        sheet.write_string(row, 7, "stale").unwrap();
    }
    workbook.save(path).unwrap();
}

#[test]
fn xlsx_wish_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wish_number.xlsx");
    write_xlsx(&path);

    let outcomes = check_wish_file(&path, &history(), &SummaryFormat::korean()).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].result, "1등 1회, 4등 2회");

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["wishes".to_string()]);
    let range = workbook.worksheet_range("wishes").unwrap();
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

    assert_eq!(rows[0].len(), 9);
    assert_eq!(rows[0][7], Data::String("Result".to_string()));
    assert_eq!(rows[0][8], Data::String("Details".to_string()));
    assert_eq!(rows[1][0], Data::String("007".to_string()));
    assert_eq!(rows[1][1], Data::Float(1.0));
    assert_eq!(rows[1][7], Data::String("1등 1회, 4등 2회".to_string()));
    assert_eq!(rows[1][8], Data::String("1등: 102; 4등: 101, 103".to_string()));
    assert_eq!(rows[2][7], Data::String("낙첨".to_string()));

    // A second pass reuses the existing columns.
    check_wish_file(&path, &history(), &SummaryFormat::korean()).unwrap();
    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range("wishes").unwrap();
    assert_eq!(range.width(), 9);
}
