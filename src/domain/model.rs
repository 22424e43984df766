use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 試算表中的一筆學生資料，讀入後不再變更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// 1-based data row (header excluded)
    pub row: usize,
    pub display_name: String,
    pub identifier: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecodedId {
    pub class_number: u8,
    pub seat_number: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingName,
    MissingIdentifier,
    NonNumericIdentifier { raw: String },
    InvalidIdentifierFormat { identifier: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub row: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSeat {
    pub seat_number: u8,
    pub replaced: StudentRecord,
    pub kept: StudentRecord,
}

/// 同一班級的學生，以座位號為鍵
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassGroup {
    pub class_number: u8,
    pub seats: BTreeMap<u8, StudentRecord>,
    pub duplicates: Vec<DuplicateSeat>,
}

impl ClassGroup {
    pub fn new(class_number: u8) -> Self {
        Self {
            class_number,
            ..Self::default()
        }
    }

    /// Later records win; the replaced one is kept in `duplicates`.
    pub fn insert(&mut self, seat_number: u8, record: StudentRecord) {
        if let Some(previous) = self.seats.insert(seat_number, record.clone()) {
            self.duplicates.push(DuplicateSeat {
                seat_number,
                replaced: previous,
                kept: record,
            });
        }
    }

    pub fn seat_to_name(&self) -> BTreeMap<u8, String> {
        self.seats
            .iter()
            .map(|(seat, record)| (*seat, record.display_name.clone()))
            .collect()
    }

    /// 依班級號分組，班級以遞增順序排列
    pub fn group_by_class(
        decoded: impl IntoIterator<Item = (StudentRecord, DecodedId)>,
    ) -> BTreeMap<u8, ClassGroup> {
        let mut groups: BTreeMap<u8, ClassGroup> = BTreeMap::new();
        for (record, id) in decoded {
            groups
                .entry(id.class_number)
                .or_insert_with(|| ClassGroup::new(id.class_number))
                .insert(id.seat_number, record);
        }
        groups
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedSeat {
    pub seat_number: u8,
    pub expected_token: String,
    /// Raw template text that looks like the token but differs in spacing or padding.
    pub near_miss: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub text: String,
    pub matched: BTreeSet<u8>,
    pub unmatched: Vec<UnmatchedSeat>,
}

/// Output of the extract stage.
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    pub total_rows: usize,
    pub records: Vec<StudentRecord>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone)]
pub struct RenderedClass {
    pub class_number: u8,
    pub file_name: String,
    pub student_count: usize,
    pub outcome: RenderOutcome,
    pub duplicates: Vec<DuplicateSeat>,
}

/// Output of the transform stage.
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub total_rows: usize,
    pub skipped: Vec<SkippedRecord>,
    pub classes: Vec<RenderedClass>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReport {
    pub class_number: u8,
    pub student_count: usize,
    pub matched: Vec<u8>,
    pub unmatched: Vec<UnmatchedSeat>,
    pub duplicate_seats: Vec<u8>,
    pub output_file: Option<String>,
    pub write_error: Option<String>,
}

impl ClassReport {
    pub fn is_written(&self) -> bool {
        self.output_file.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub total_rows: usize,
    pub skipped: Vec<SkippedRecord>,
    pub classes: Vec<ClassReport>,
    pub generated_files: Vec<String>,
    pub bundle: Option<String>,
}

impl RunReport {
    pub fn matched_total(&self) -> usize {
        self.classes.iter().map(|c| c.matched.len()).sum()
    }

    pub fn unmatched_total(&self) -> usize {
        self.classes.iter().map(|c| c.unmatched.len()).sum()
    }

    pub fn failed_classes(&self) -> impl Iterator<Item = &ClassReport> {
        self.classes.iter().filter(|c| !c.is_written())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: usize, name: &str, identifier: i64) -> StudentRecord {
        StudentRecord {
            row,
            display_name: name.to_string(),
            identifier,
        }
    }

    fn id(class_number: u8, seat_number: u8) -> DecodedId {
        DecodedId {
            class_number,
            seat_number,
        }
    }

    #[test]
    fn test_same_class_different_seats_share_group() {
        let groups = ClassGroup::group_by_class(vec![
            (record(1, "张三", 250010301), id(3, 1)),
            (record(2, "李四", 250010302), id(3, 2)),
            (record(3, "王五", 250010401), id(4, 1)),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&3].seats.len(), 2);
        assert_eq!(groups[&4].seats.len(), 1);
        assert!(groups[&3].duplicates.is_empty());
    }

    #[test]
    fn test_duplicate_seat_last_wins() {
        let groups = ClassGroup::group_by_class(vec![
            (record(1, "张三", 250010301), id(3, 1)),
            (record(2, "李四", 260010301), id(3, 1)),
        ]);

        let group = &groups[&3];
        assert_eq!(group.seats.len(), 1);
        assert_eq!(group.seats[&1].display_name, "李四");
        assert_eq!(group.duplicates.len(), 1);
        assert_eq!(group.duplicates[0].replaced.display_name, "张三");
    }

    #[test]
    fn test_groups_iterate_in_class_order() {
        let groups = ClassGroup::group_by_class(vec![
            (record(1, "a", 250011201), id(12, 1)),
            (record(2, "b", 250010201), id(2, 1)),
            (record(3, "c", 250010701), id(7, 1)),
        ]);
        let order: Vec<u8> = groups.keys().copied().collect();
        assert_eq!(order, vec![2, 7, 12]);
    }
}
