use serde::{Deserialize, Serialize};

/// 預設開放的座位數（01-48）
pub const DEFAULT_SEAT_COUNT: u8 = 48;

/// 座位號可以是數字或字串（"7"、"07"）
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SeatInput {
    Number(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClaimRequest {
    pub seat_number: Option<SeatInput>,
    pub student_name: Option<String>,
    pub student_id: Option<String>,
}

/// A request that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidClaim {
    pub seat_number: u8,
    pub student_name: String,
    pub student_id: String,
}

impl ValidClaim {
    pub fn seat_label(&self) -> String {
        seat_label(self.seat_number)
    }
}

pub fn seat_label(seat_number: u8) -> String {
    format!("{:02}", seat_number)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRejection {
    /// 請求本身無法解析
    Malformed,
    Incomplete,
    InvalidSeat,
    SeatTaken,
    AlreadyClaimed,
    Database,
}

impl ClaimRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Incomplete => "incomplete",
            Self::InvalidSeat => "invalid_seat",
            Self::SeatTaken => "seat_taken",
            Self::AlreadyClaimed => "already_claimed",
            Self::Database => "database",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Malformed => "请求格式错误",
            Self::Incomplete => "请填写完整信息",
            Self::InvalidSeat => "座位号无效",
            Self::SeatTaken => "该座位已被选择",
            Self::AlreadyClaimed => "您已经选择过座位了",
            Self::Database => "数据库错误",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Accepted { seat_number: String },
    Rejected(ClaimRejection),
}

impl ClaimRequest {
    /// 檢查欄位是否齊全、座位號是否在 1..=seat_count 之內
    pub fn validate(&self, seat_count: u8) -> Result<ValidClaim, ClaimRejection> {
        let student_name = non_blank(self.student_name.as_deref());
        let student_id = non_blank(self.student_id.as_deref());
        let seat = self.seat_number.as_ref().and_then(|seat| match seat {
            SeatInput::Text(s) if s.trim().is_empty() => None,
            other => Some(other),
        });

        let (Some(seat), Some(student_name), Some(student_id)) = (seat, student_name, student_id)
        else {
            return Err(ClaimRejection::Incomplete);
        };

        let seat_number = match seat {
            SeatInput::Number(n) => Some(*n),
            SeatInput::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            SeatInput::Float(_) => None,
            SeatInput::Text(s) => s.trim().parse::<i64>().ok(),
        }
        .filter(|n| (1..=i64::from(seat_count)).contains(n))
        .ok_or(ClaimRejection::InvalidSeat)?;

        Ok(ValidClaim {
            seat_number: seat_number as u8,
            student_name,
            student_id,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 選座表中的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRow {
    pub seat_number: String,
    pub student_name: String,
    pub student_id: String,
    pub created_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatStatus {
    pub seat_number: String,
    pub taken: bool,
}
