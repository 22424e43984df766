//! SQLite persistence for seat claims.
//!
//! Every operation takes an explicit connection. `SeatDb` hands out a fresh,
//! schema-ready connection per request; nothing is held globally.

use crate::seats::model::{
    seat_label, ClaimOutcome, ClaimRejection, ClaimRequest, ClaimRow, SeatStatus,
};
use crate::utils::error::{Result, SeatChartError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SeatDb {
    path: PathBuf,
    seat_count: u8,
}

impl SeatDb {
    pub fn new(path: impl Into<PathBuf>, seat_count: u8) -> Self {
        Self {
            path: path.into(),
            seat_count,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn seat_count(&self) -> u8 {
        self.seat_count
    }

    /// 開啟連線並確保資料表存在
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        ensure_schema(&conn)?;
        Ok(conn)
    }

    /// Runs `f` on a dedicated connection inside the blocking pool.
    pub async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.connect()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| SeatChartError::ProcessingError {
            message: format!("database task failed: {}", e),
        })?
    }
}

pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            seat_number TEXT UNIQUE NOT NULL,
            student_name TEXT NOT NULL,
            student_id TEXT NOT NULL,
            created_time TEXT NOT NULL
        )",
        [],
    )?;

    let indexed = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = 'idx_students_student_id'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if indexed {
        return Ok(());
    }

    // 舊版資料庫未限制學號唯一，建立索引前先找出重複者
    let duplicates = duplicate_student_ids(conn)?;
    if !duplicates.is_empty() {
        tracing::error!(
            "Seat database holds several claims for student id(s) {}; unique index not created",
            duplicates.join(", ")
        );
        return Err(SeatChartError::DuplicateClaims {
            student_ids: duplicates,
        });
    }

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_students_student_id ON students(student_id)",
        [],
    )?;
    Ok(())
}

fn duplicate_student_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT student_id FROM students GROUP BY student_id HAVING COUNT(*) > 1
         ORDER BY student_id",
    )?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// 選座：檢查座位與學號皆未被使用後寫入。
///
/// The checks and the insert share one IMMEDIATE transaction, so concurrent
/// claims for the same seat or student are serialized by SQLite's write lock.
pub fn claim_seat(
    conn: &mut Connection,
    request: &ClaimRequest,
    seat_count: u8,
) -> Result<ClaimOutcome> {
    let claim = match request.validate(seat_count) {
        Ok(claim) => claim,
        Err(rejection) => return Ok(ClaimOutcome::Rejected(rejection)),
    };
    let seat = claim.seat_label();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let seat_taken = tx
        .query_row(
            "SELECT id FROM students WHERE seat_number = ?1",
            params![seat],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if seat_taken {
        return Ok(ClaimOutcome::Rejected(ClaimRejection::SeatTaken));
    }

    let already_claimed = tx
        .query_row(
            "SELECT id FROM students WHERE student_id = ?1",
            params![claim.student_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if already_claimed {
        return Ok(ClaimOutcome::Rejected(ClaimRejection::AlreadyClaimed));
    }

    let created_time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let inserted = tx.execute(
        "INSERT INTO students(seat_number, student_name, student_id, created_time)
         VALUES(?1, ?2, ?3, ?4)",
        params![seat, claim.student_name, claim.student_id, created_time],
    );

    match inserted {
        Ok(_) => {
            tx.commit()?;
            tracing::info!("Seat {} claimed by {}", seat, claim.student_id);
            Ok(ClaimOutcome::Accepted { seat_number: seat })
        }
        Err(e) => match constraint_rejection(&e) {
            Some(rejection) => Ok(ClaimOutcome::Rejected(rejection)),
            None => Err(e.into()),
        },
    }
}

fn constraint_rejection(err: &rusqlite::Error) -> Option<ClaimRejection> {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(message))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            if message.contains("students.seat_number") {
                Some(ClaimRejection::SeatTaken)
            } else if message.contains("students.student_id") {
                Some(ClaimRejection::AlreadyClaimed)
            } else {
                None
            }
        }
        _ => None,
    }
}

pub fn selected_seats(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT seat_number FROM students ORDER BY seat_number")?;
    let seats = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(seats)
}

pub fn seat_map(conn: &Connection, seat_count: u8) -> Result<Vec<SeatStatus>> {
    let taken = selected_seats(conn)?;
    Ok((1..=seat_count)
        .map(seat_label)
        .map(|seat_number| SeatStatus {
            taken: taken.contains(&seat_number),
            seat_number,
        })
        .collect())
}

pub fn all_claims(conn: &Connection) -> Result<Vec<ClaimRow>> {
    let mut stmt = conn.prepare(
        "SELECT seat_number, student_name, student_id, created_time
         FROM students ORDER BY seat_number",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClaimRow {
                seat_number: row.get(0)?,
                student_name: row.get(1)?,
                student_id: row.get(2)?,
                created_time: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 清空所有選座資料，回傳刪除筆數
pub fn clear_all(conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM students", [])?;
    tracing::warn!("Cleared {} seat claims", removed);
    Ok(removed)
}
