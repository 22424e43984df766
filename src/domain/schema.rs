use crate::utils::error::{Result, SeatChartError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME_COLUMNS: &[&str] = &["姓名", "学生姓名", "name", "学员姓名"];
pub const DEFAULT_IDENTIFIER_COLUMNS: &[&str] = &["考号", "学号", "准考证号", "id", "考试号"];

/// 姓名欄與考號欄的候選名稱，依序比對
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCandidates {
    pub name: Vec<String>,
    pub identifier: Vec<String>,
}

impl Default for ColumnCandidates {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_COLUMNS.iter().map(|s| s.to_string()).collect(),
            identifier: DEFAULT_IDENTIFIER_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub name_index: usize,
    pub name_header: String,
    pub identifier_index: usize,
    pub identifier_header: String,
}

fn find_column(headers: &[String], candidates: &[String]) -> Option<(usize, String)> {
    candidates.iter().find_map(|candidate| {
        let candidate = candidate.trim();
        headers
            .iter()
            .position(|h| h.trim() == candidate)
            .map(|idx| (idx, candidate.to_string()))
    })
}

/// 找出姓名欄與考號欄。任一找不到即回傳 `SchemaResolution`，不做任何猜測。
pub fn resolve_columns(headers: &[String], candidates: &ColumnCandidates) -> Result<ResolvedColumns> {
    let name = find_column(headers, &candidates.name);
    let identifier = find_column(headers, &candidates.identifier);

    match (name, identifier) {
        (Some((name_index, name_header)), Some((identifier_index, identifier_header))) => {
            Ok(ResolvedColumns {
                name_index,
                name_header,
                identifier_index,
                identifier_header,
            })
        }
        (name, identifier) => {
            let mut missing = Vec::new();
            if name.is_none() {
                missing.push(format!("name [{}]", candidates.name.join(", ")));
            }
            if identifier.is_none() {
                missing.push(format!("identifier [{}]", candidates.identifier.join(", ")));
            }
            Err(SeatChartError::SchemaResolution {
                missing: missing.join("; "),
                available: headers.iter().map(|h| h.trim().to_string()).collect(),
            })
        }
    }
}
