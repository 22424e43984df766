use crate::utils::error::{Result, SeatChartError};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv"];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierCell {
    Missing,
    NonNumeric(String),
    Value(i64),
}

impl Cell {
    /// 以文字呈現儲存格；空白儲存格回傳 None
    pub fn as_display(&self) -> Option<String> {
        let text = match self {
            Cell::Empty => return None,
            Cell::Text(s) => s.trim().to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", *f as i64)
            }
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }

    /// 數值化考號：小數一律捨去，文字先試整數再試浮點數
    pub fn as_identifier(&self) -> IdentifierCell {
        match self {
            Cell::Empty => IdentifierCell::Missing,
            Cell::Int(i) => IdentifierCell::Value(*i),
            Cell::Float(f) if f.is_finite() => IdentifierCell::Value(f.trunc() as i64),
            Cell::Float(f) => IdentifierCell::NonNumeric(f.to_string()),
            Cell::Bool(b) => IdentifierCell::NonNumeric(b.to_string()),
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return IdentifierCell::Missing;
                }
                if let Ok(i) = trimmed.parse::<i64>() {
                    return IdentifierCell::Value(i);
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => IdentifierCell::Value(f.trunc() as i64),
                    _ => IdentifierCell::NonNumeric(trimmed.to_string()),
                }
            }
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// 依副檔名讀取試算表或 CSV/TSV；第一列為欄名
pub fn read_table(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<Table> {
    let path = path.as_ref();
    let extension = extension_of(path);

    if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
        let delimiter = if extension == "tsv" { b'\t' } else { b',' };
        return read_delimited(path, delimiter);
    }
    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        return read_workbook(path, sheet);
    }

    Err(SeatChartError::InvalidConfigValueError {
        field: "input".to_string(),
        value: path.display().to_string(),
        reason: format!(
            "Unsupported input format. Supported: {}, {}",
            SPREADSHEET_EXTENSIONS.join(", "),
            DELIMITED_EXTENSIONS.join(", ")
        ),
    })
}

fn read_delimited(path: &Path, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_path(path)?;

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table { headers, rows })
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SeatChartError::ProcessingError {
                message: format!("Workbook {} has no sheets", path.display()),
            })?,
    };

    tracing::debug!("Reading sheet '{}' from {}", sheet_name, path.display());
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows_iter = range.rows();
    let headers = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|value| match value {
                Data::Empty => String::new(),
                other => other.to_string().trim().to_string(),
            })
            .collect(),
        None => Vec::new(),
    };

    let rows = rows_iter
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    #[test]
    fn test_identifier_coercion() {
        assert_eq!(Cell::Int(123456789).as_identifier(), IdentifierCell::Value(123456789));
        assert_eq!(
            Cell::Float(123456789.0).as_identifier(),
            IdentifierCell::Value(123456789)
        );
        assert_eq!(
            Cell::Text(" 012345678 ".to_string()).as_identifier(),
            IdentifierCell::Value(12345678)
        );
        assert_eq!(
            Cell::Text("1.23456789e8".to_string()).as_identifier(),
            IdentifierCell::Value(123456789)
        );
        assert_eq!(
            Cell::Text("缺考".to_string()).as_identifier(),
            IdentifierCell::NonNumeric("缺考".to_string())
        );
        assert_eq!(Cell::Empty.as_identifier(), IdentifierCell::Missing);
        assert_eq!(Cell::Text("  ".to_string()).as_identifier(), IdentifierCell::Missing);
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(Cell::Text(" 李伟 ".to_string()).as_display().as_deref(), Some("李伟"));
        assert_eq!(Cell::Float(42.0).as_display().as_deref(), Some("42"));
        assert_eq!(Cell::Text("".to_string()).as_display(), None);
        assert_eq!(Cell::Empty.as_display(), None);
    }

    #[test]
    fn test_read_csv_with_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.csv");
        std::fs::write(&path, "\u{feff}考号, 姓名 \n250010301,张三\n,李四\n").unwrap();

        let table = read_table(&path, None).unwrap();
        assert_eq!(table.headers, vec!["考号", "姓名"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 1), &Cell::Text("张三".to_string()));
        assert_eq!(table.cell(1, 0), &Cell::Empty);
        assert_eq!(table.cell(5, 5), &Cell::Empty);
    }

    #[test]
    fn test_read_tsv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("students.tsv");
        std::fs::write(&path, "name\tid\nAnn\t250010301\n").unwrap();

        let table = read_table(&path, None).unwrap();
        assert_eq!(table.headers, vec!["name", "id"]);
        assert_eq!(table.cell(0, 1).as_identifier(), IdentifierCell::Value(250010301));
    }

    #[test]
    fn test_read_xlsx_first_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("2025mt.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "姓名").unwrap();
        worksheet.write_string(0, 1, "考号").unwrap();
        worksheet.write_string(1, 0, "张三").unwrap();
        worksheet.write_number(1, 1, 250010301.0).unwrap();
        workbook.save(&path).unwrap();

        let table = read_table(&path, None).unwrap();
        assert_eq!(table.headers, vec!["姓名", "考号"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(0, 1).as_identifier(), IdentifierCell::Value(250010301));
        assert_eq!(table.cell(0, 0).as_display().as_deref(), Some("张三"));
    }

    #[test]
    fn test_read_unknown_extension() {
        let err = read_table("students.txt", None).unwrap_err();
        assert!(matches!(err, SeatChartError::InvalidConfigValueError { .. }));
    }
}
