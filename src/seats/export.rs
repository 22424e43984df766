use crate::seats::model::ClaimRow;
use crate::utils::error::{Result, SeatChartError};
use chrono::NaiveDateTime;
use rust_xlsxwriter::Workbook;
use serde::Deserialize;

/// 匯出欄位：座位號作為考號
pub const EXPORT_HEADERS: [&str; 3] = ["考号", "姓名", "学号"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

pub fn export_file_name(format: ExportFormat, at: NaiveDateTime) -> String {
    format!(
        "seat_selection_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Builds the export; `None` when there is nothing to export.
pub fn export_claims(
    rows: &[ClaimRow],
    format: ExportFormat,
    at: NaiveDateTime,
) -> Result<Option<ExportFile>> {
    if rows.is_empty() {
        return Ok(None);
    }

    let bytes = match format {
        ExportFormat::Xlsx => to_xlsx(rows)?,
        ExportFormat::Csv => to_csv(rows)?,
    };

    Ok(Some(ExportFile {
        file_name: export_file_name(format, at),
        format,
        bytes,
    }))
}

fn to_xlsx(rows: &[ClaimRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let line = (idx + 1) as u32;
        worksheet.write_string(line, 0, &row.seat_number)?;
        worksheet.write_string(line, 1, &row.student_name)?;
        worksheet.write_string(line, 2, &row.student_id)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn to_csv(rows: &[ClaimRow]) -> Result<Vec<u8>> {
    // UTF-8 BOM，讓 Excel 正確辨識中文
    let mut buffer = "\u{feff}".as_bytes().to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(EXPORT_HEADERS)?;
        for row in rows {
            writer.write_record([&row.seat_number, &row.student_name, &row.student_id])?;
        }
        writer
            .flush()
            .map_err(SeatChartError::IoError)?;
    }
    Ok(buffer)
}
