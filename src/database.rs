use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use rust_decimal::Decimal;
use std::path::Path;

use crate::error::{DatabaseError, PilotHealthError, Result};
use crate::models::{
    Assessment, Base, Complaint, ComplaintStatus, History, IpaqAnswers, Message, NasaTlxRatings,
    NasaTlxRecord, Notification, Onset, Profile, Role, User,
};

/// Decimal stored as TEXT so no precision is lost
struct SqlDecimal(Decimal);

impl ToSql for SqlDecimal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for SqlDecimal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(_) => value
                .as_str()?
                .parse::<Decimal>()
                .map(SqlDecimal)
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Integer(i) => Ok(SqlDecimal(Decimal::from(i))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

fn sql_decimal(value: Option<Decimal>) -> Option<SqlDecimal> {
    value.map(SqlDecimal)
}

fn decimal_column(row: &Row, column: &str) -> rusqlite::Result<Option<Decimal>> {
    Ok(row.get::<_, Option<SqlDecimal>>(column)?.map(|d| d.0))
}

macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                <$ty>::parse(value.as_str()?).map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum_sql!(Role);
text_enum_sql!(Onset);
text_enum_sql!(History);
text_enum_sql!(ComplaintStatus);

/// A complaint joined with everything the metrics engine and the detail
/// views need
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedComplaint {
    pub complaint: Complaint,
    pub pilot: User,
    pub profile: Option<Profile>,
    pub ipaq: Option<IpaqAnswers>,
    pub nasa_tlx: Option<NasaTlxRecord>,
    pub has_assessment: bool,
}

/// Complaint listing filters
#[derive(Debug, Default, Clone)]
pub struct ComplaintFilters {
    pub pilot_id: Option<String>,
    /// Exact body-region match
    pub location: Option<String>,
    /// Inclusive submission-date bounds, compared on the UTC calendar day
    pub submitted_from: Option<NaiveDate>,
    pub submitted_to: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Assessment row as listed for the pilot it concerns
#[derive(Debug, Clone, PartialEq)]
pub struct PilotReportRow {
    pub assessment: Assessment,
    pub complaint_location: String,
    pub complaint_date: DateTime<Utc>,
}

/// Record counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    pub user_count: usize,
    pub complaint_count: usize,
    pub message_count: usize,
    pub unread_notification_count: usize,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    rank TEXT,
    saram TEXT,
    aircraft_type TEXT,
    base_id INTEGER,
    birth_date TEXT,
    weight_kg TEXT,
    height_m TEXT,
    whatsapp TEXT,
    crm_crefito TEXT,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
    FOREIGN KEY (base_id) REFERENCES bases (id)
);

CREATE TABLE IF NOT EXISTS complaints (
    id TEXT PRIMARY KEY,
    pilot_id TEXT NOT NULL,
    location TEXT NOT NULL,
    intensity INTEGER NOT NULL,
    duration TEXT,
    flight_impact TEXT,
    concentration_impact TEXT,
    days_missed INTEGER,
    loss_of_movement BOOLEAN,
    medication_used BOOLEAN,
    onset TEXT,
    history TEXT,
    qualitative_details TEXT,
    status TEXT NOT NULL,
    submission_date TEXT NOT NULL,
    FOREIGN KEY (pilot_id) REFERENCES users (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS ipaq_responses (
    complaint_id TEXT PRIMARY KEY,
    vigorous_activity_days INTEGER,
    vigorous_activity_minutes INTEGER,
    moderate_activity_days INTEGER,
    moderate_activity_minutes INTEGER,
    walking_days INTEGER,
    walking_minutes INTEGER,
    sitting_minutes INTEGER,
    submitted_at TEXT NOT NULL,
    FOREIGN KEY (complaint_id) REFERENCES complaints (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS nasa_tlx_responses (
    complaint_id TEXT PRIMARY KEY,
    mental_demand TEXT NOT NULL,
    physical_demand TEXT NOT NULL,
    temporal_demand TEXT NOT NULL,
    performance TEXT NOT NULL,
    effort TEXT NOT NULL,
    frustration TEXT NOT NULL,
    overall_score TEXT NOT NULL,
    submitted_at TEXT NOT NULL,
    FOREIGN KEY (complaint_id) REFERENCES complaints (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS assessments (
    id TEXT PRIMARY KEY,
    complaint_id TEXT NOT NULL,
    professional_id TEXT NOT NULL,
    diagnosis TEXT NOT NULL,
    treatment_plan TEXT,
    notes TEXT,
    assessment_date TEXT NOT NULL,
    FOREIGN KEY (complaint_id) REFERENCES complaints (id) ON DELETE CASCADE,
    FOREIGN KEY (professional_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    complaint_id TEXT NOT NULL,
    sender_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (complaint_id) REFERENCES complaints (id) ON DELETE CASCADE,
    FOREIGN KEY (sender_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    message TEXT NOT NULL,
    link TEXT NOT NULL,
    is_read BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_complaints_pilot_date ON complaints (pilot_id, submission_date);
CREATE INDEX IF NOT EXISTS idx_complaints_location ON complaints (location);
CREATE INDEX IF NOT EXISTS idx_assessments_complaint ON assessments (complaint_id);
CREATE INDEX IF NOT EXISTS idx_messages_complaint ON messages (complaint_id, created_at);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id, is_read);
"#;

const JOINED_SELECT: &str = r#"
SELECT
    c.id, c.pilot_id, c.location, c.intensity, c.duration, c.flight_impact,
    c.concentration_impact, c.days_missed, c.loss_of_movement, c.medication_used,
    c.onset, c.history, c.qualitative_details, c.status, c.submission_date,
    u.name AS pilot_name, u.email AS pilot_email, u.role AS pilot_role,
    u.created_at AS pilot_created_at,
    p.user_id AS profile_user_id, p.rank, p.saram, p.aircraft_type, p.base_id,
    b.name AS base_name, p.birth_date, p.weight_kg, p.height_m, p.whatsapp, p.crm_crefito,
    i.complaint_id AS ipaq_complaint_id,
    i.vigorous_activity_days, i.vigorous_activity_minutes,
    i.moderate_activity_days, i.moderate_activity_minutes,
    i.walking_days, i.walking_minutes, i.sitting_minutes,
    n.mental_demand, n.physical_demand, n.temporal_demand, n.performance,
    n.effort, n.frustration, n.overall_score, n.submitted_at AS tlx_submitted_at,
    EXISTS (SELECT 1 FROM assessments a WHERE a.complaint_id = c.id) AS has_assessment
FROM complaints c
JOIN users u ON u.id = c.pilot_id
LEFT JOIN profiles p ON p.user_id = c.pilot_id
LEFT JOIN bases b ON b.id = p.base_id
LEFT JOIN ipaq_responses i ON i.complaint_id = c.id
LEFT JOIN nasa_tlx_responses n ON n.complaint_id = c.id
"#;

const PROFILE_SELECT: &str = r#"
SELECT
    p.user_id, p.rank, p.saram, p.aircraft_type, p.base_id, b.name AS base_name,
    p.birth_date, p.weight_kg, p.height_m, p.whatsapp, p.crm_crefito
FROM profiles p
LEFT JOIN bases b ON b.id = p.base_id
"#;

/// SQLite-backed store
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create or open a database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path.as_ref()).map_err(|e| {
            DatabaseError::ConnectionFailed {
                reason: format!("{}: {}", db_path.as_ref().display(), e),
            }
        })?;

        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        tracing::debug!(path = %db_path.as_ref().display(), journal_mode, "Opened database");

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", true)?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // --- users -----------------------------------------------------------

    pub fn insert_user(&self, user: &User) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO users (id, name, email, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.id, user.name, user.email, user.role, user.created_at],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(DatabaseError::Duplicate {
                    table: "users".to_string(),
                    key: user.email.clone(),
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email, role, created_at FROM users WHERE id = ?1",
                params![user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn users_with_role(&self, role: Role) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, role, created_at FROM users WHERE role = ?1 ORDER BY name",
        )?;
        let users = stmt
            .query_map(params![role], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    // --- bases -----------------------------------------------------------

    /// Insert the base if it is not there yet and return it
    pub fn ensure_base(&self, name: &str) -> Result<Base> {
        self.conn.execute(
            "INSERT OR IGNORE INTO bases (name) VALUES (?1)",
            params![name],
        )?;
        let base = self.conn.query_row(
            "SELECT id, name FROM bases WHERE name = ?1",
            params![name],
            |row| {
                Ok(Base {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;
        Ok(base)
    }

    pub fn list_bases(&self) -> Result<Vec<Base>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM bases ORDER BY name")?;
        let bases = stmt
            .query_map([], |row| {
                Ok(Base {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bases)
    }

    pub fn base_exists(&self, base_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bases WHERE id = ?1",
            params![base_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // --- profiles --------------------------------------------------------

    pub fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let sql = format!("{} WHERE p.user_id = ?1", PROFILE_SELECT);
        let profile = self
            .conn
            .query_row(&sql, params![user_id], |row| {
                profile_from_row(row, "user_id")
            })
            .optional()?;
        Ok(profile)
    }

    pub fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO profiles (
                user_id, rank, saram, aircraft_type, base_id, birth_date,
                weight_kg, height_m, whatsapp, crm_crefito, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (user_id) DO UPDATE SET
                rank = excluded.rank,
                saram = excluded.saram,
                aircraft_type = excluded.aircraft_type,
                base_id = excluded.base_id,
                birth_date = excluded.birth_date,
                weight_kg = excluded.weight_kg,
                height_m = excluded.height_m,
                whatsapp = excluded.whatsapp,
                crm_crefito = excluded.crm_crefito,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.user_id,
                profile.rank,
                profile.saram,
                profile.aircraft_type,
                profile.base_id,
                profile.birth_date,
                sql_decimal(profile.weight_kg),
                sql_decimal(profile.height_m),
                profile.whatsapp,
                profile.crm_crefito,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    // --- complaints ------------------------------------------------------

    /// Store a complaint together with the notifications it triggers
    pub fn insert_complaint(
        &mut self,
        complaint: &Complaint,
        notifications: &[Notification],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO complaints (
                id, pilot_id, location, intensity, duration, flight_impact,
                concentration_impact, days_missed, loss_of_movement, medication_used,
                onset, history, qualitative_details, status, submission_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                complaint.id,
                complaint.pilot_id,
                complaint.location,
                complaint.intensity,
                complaint.duration,
                complaint.flight_impact,
                complaint.concentration_impact,
                complaint.days_missed,
                complaint.loss_of_movement,
                complaint.medication_used,
                complaint.onset,
                complaint.history,
                complaint.qualitative_details,
                complaint.status,
                complaint.submission_date,
            ],
        )?;
        insert_notifications(&tx, notifications)?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_complaint(&self, complaint_id: &str) -> Result<Option<Complaint>> {
        let sql = format!("{} WHERE c.id = ?1", JOINED_SELECT);
        let complaint = self
            .conn
            .query_row(&sql, params![complaint_id], complaint_from_row)
            .optional()?;
        Ok(complaint)
    }

    /// Load one complaint with its pilot, profile and questionnaires
    pub fn load_joined(&self, complaint_id: &str) -> Result<Option<JoinedComplaint>> {
        let sql = format!("{} WHERE c.id = ?1", JOINED_SELECT);
        let joined = self
            .conn
            .query_row(&sql, params![complaint_id], joined_from_row)
            .optional()?;
        Ok(joined)
    }

    /// Joined complaints, newest first
    pub fn query_joined(&self, filters: &ComplaintFilters) -> Result<Vec<JoinedComplaint>> {
        let sql = format!(
            "{} WHERE (?1 IS NULL OR c.pilot_id = ?1) AND (?2 IS NULL OR c.location = ?2) \
             AND (?3 IS NULL OR substr(c.submission_date, 1, 10) >= ?3) \
             AND (?4 IS NULL OR substr(c.submission_date, 1, 10) <= ?4) \
             ORDER BY c.submission_date DESC, c.id LIMIT ?5 OFFSET ?6",
            JOINED_SELECT
        );
        // SQLite reads a negative LIMIT as unbounded
        let limit = filters.limit.map_or(-1, |limit| limit as i64);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    filters.pilot_id,
                    filters.location,
                    filters.submitted_from,
                    filters.submitted_to,
                    limit,
                    filters.offset as i64,
                ],
                joined_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn update_complaint_status(
        &self,
        complaint_id: &str,
        status: ComplaintStatus,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE complaints SET status = ?1 WHERE id = ?2",
            params![status, complaint_id],
        )?;
        Ok(changed > 0)
    }

    // --- questionnaires --------------------------------------------------

    pub fn upsert_ipaq(
        &self,
        complaint_id: &str,
        answers: &IpaqAnswers,
        submitted_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO ipaq_responses (
                complaint_id, vigorous_activity_days, vigorous_activity_minutes,
                moderate_activity_days, moderate_activity_minutes,
                walking_days, walking_minutes, sitting_minutes, submitted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                complaint_id,
                answers.vigorous_activity_days,
                answers.vigorous_activity_minutes,
                answers.moderate_activity_days,
                answers.moderate_activity_minutes,
                answers.walking_days,
                answers.walking_minutes,
                answers.sitting_minutes,
                submitted_at,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_nasa_tlx(&self, complaint_id: &str, record: &NasaTlxRecord) -> Result<()> {
        let r = &record.ratings;
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO nasa_tlx_responses (
                complaint_id, mental_demand, physical_demand, temporal_demand,
                performance, effort, frustration, overall_score, submitted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                complaint_id,
                SqlDecimal(r.mental_demand),
                SqlDecimal(r.physical_demand),
                SqlDecimal(r.temporal_demand),
                SqlDecimal(r.performance),
                SqlDecimal(r.effort),
                SqlDecimal(r.frustration),
                SqlDecimal(record.overall_score),
                record.submitted_at,
            ],
        )?;
        Ok(())
    }

    // --- assessments -----------------------------------------------------

    /// Store an assessment, mark the complaint answered and notify the pilot
    pub fn insert_assessment(
        &mut self,
        assessment: &Assessment,
        notification: &Notification,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO assessments (
                id, complaint_id, professional_id, diagnosis, treatment_plan, notes, assessment_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                assessment.id,
                assessment.complaint_id,
                assessment.professional_id,
                assessment.diagnosis,
                assessment.treatment_plan,
                assessment.notes,
                assessment.assessment_date,
            ],
        )?;
        tx.execute(
            "UPDATE complaints SET status = ?1 WHERE id = ?2",
            params![ComplaintStatus::Answered, assessment.complaint_id],
        )?;
        insert_notifications(&tx, std::slice::from_ref(notification))?;

        tx.commit()?;
        Ok(())
    }

    pub fn assessments_for_complaint(&self, complaint_id: &str) -> Result<Vec<Assessment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.id, a.complaint_id, a.professional_id, u.name AS professional_name,
                   a.diagnosis, a.treatment_plan, a.notes, a.assessment_date
            FROM assessments a
            JOIN users u ON u.id = a.professional_id
            WHERE a.complaint_id = ?1
            ORDER BY a.assessment_date
            "#,
        )?;
        let assessments = stmt
            .query_map(params![complaint_id], assessment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assessments)
    }

    /// Every assessment written about one pilot's complaints, newest first
    pub fn reports_for_pilot(&self, pilot_id: &str) -> Result<Vec<PilotReportRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.id, a.complaint_id, a.professional_id, u.name AS professional_name,
                   a.diagnosis, a.treatment_plan, a.notes, a.assessment_date,
                   c.location AS complaint_location, c.submission_date AS complaint_date
            FROM assessments a
            JOIN complaints c ON c.id = a.complaint_id
            JOIN users u ON u.id = a.professional_id
            WHERE c.pilot_id = ?1
            ORDER BY a.assessment_date DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![pilot_id], |row| {
                Ok(PilotReportRow {
                    assessment: assessment_from_row(row)?,
                    complaint_location: row.get("complaint_location")?,
                    complaint_date: row.get("complaint_date")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // --- messages --------------------------------------------------------

    /// Store a message and the notifications it triggers atomically
    pub fn insert_message(
        &mut self,
        message: &Message,
        notifications: &[Notification],
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO messages (id, complaint_id, sender_id, content, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.id,
                message.complaint_id,
                message.sender_id,
                message.content,
                message.created_at,
            ],
        )?;
        insert_notifications(&tx, notifications)?;

        tx.commit()?;
        Ok(())
    }

    /// Thread of a complaint, oldest first
    pub fn messages_for_complaint(&self, complaint_id: &str) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT m.id, m.complaint_id, m.sender_id, u.name AS sender_name, m.content, m.created_at
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.complaint_id = ?1
            ORDER BY m.created_at, m.rowid
            "#,
        )?;
        let messages = stmt
            .query_map(params![complaint_id], |row| {
                Ok(Message {
                    id: row.get("id")?,
                    complaint_id: row.get("complaint_id")?,
                    sender_id: row.get("sender_id")?,
                    sender_name: row.get("sender_name")?,
                    content: row.get("content")?,
                    created_at: row.get("created_at")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    // --- notifications ---------------------------------------------------

    /// Notifications of a user, newest first
    pub fn notifications_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, message, link, is_read, created_at
            FROM notifications
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;
        let notifications = stmt
            .query_map(params![user_id, limit as i64], notification_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notifications)
    }

    pub fn get_notification(&self, notification_id: &str) -> Result<Option<Notification>> {
        let notification = self
            .conn
            .query_row(
                "SELECT id, user_id, message, link, is_read, created_at \
                 FROM notifications WHERE id = ?1",
                params![notification_id],
                notification_from_row,
            )
            .optional()?;
        Ok(notification)
    }

    pub fn unread_count(&self, user_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = FALSE",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn mark_notification_read(&self, notification_id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = TRUE WHERE id = ?1",
            params![notification_id],
        )?;
        Ok(changed > 0)
    }

    // --- maintenance -----------------------------------------------------

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(DatabaseStats {
            user_count: count("SELECT COUNT(*) FROM users")?,
            complaint_count: count("SELECT COUNT(*) FROM complaints")?,
            message_count: count("SELECT COUNT(*) FROM messages")?,
            unread_notification_count: count(
                "SELECT COUNT(*) FROM notifications WHERE is_read = FALSE",
            )?,
        })
    }
}

fn insert_notifications(tx: &Transaction<'_>, notifications: &[Notification]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO notifications (id, user_id, message, link, is_read, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for n in notifications {
        stmt.execute(params![n.id, n.user_id, n.message, n.link, n.is_read, n.created_at])?;
    }
    Ok(())
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role: row.get("role")?,
        created_at: row.get("created_at")?,
    })
}

fn profile_from_row(row: &Row, user_id_column: &str) -> rusqlite::Result<Profile> {
    Ok(Profile {
        user_id: row.get(user_id_column)?,
        rank: row.get("rank")?,
        saram: row.get("saram")?,
        aircraft_type: row.get("aircraft_type")?,
        base_id: row.get("base_id")?,
        base_name: row.get("base_name")?,
        birth_date: row.get("birth_date")?,
        weight_kg: decimal_column(row, "weight_kg")?,
        height_m: decimal_column(row, "height_m")?,
        whatsapp: row.get("whatsapp")?,
        crm_crefito: row.get("crm_crefito")?,
    })
}

fn complaint_from_row(row: &Row) -> rusqlite::Result<Complaint> {
    Ok(Complaint {
        id: row.get("id")?,
        pilot_id: row.get("pilot_id")?,
        location: row.get("location")?,
        intensity: row.get("intensity")?,
        duration: row.get("duration")?,
        flight_impact: row.get("flight_impact")?,
        concentration_impact: row.get("concentration_impact")?,
        days_missed: row.get("days_missed")?,
        loss_of_movement: row.get("loss_of_movement")?,
        medication_used: row.get("medication_used")?,
        onset: row.get("onset")?,
        history: row.get("history")?,
        qualitative_details: row.get("qualitative_details")?,
        status: row.get("status")?,
        submission_date: row.get("submission_date")?,
    })
}

fn joined_from_row(row: &Row) -> rusqlite::Result<JoinedComplaint> {
    let complaint = complaint_from_row(row)?;

    let pilot = User {
        id: complaint.pilot_id.clone(),
        name: row.get("pilot_name")?,
        email: row.get("pilot_email")?,
        role: row.get("pilot_role")?,
        created_at: row.get("pilot_created_at")?,
    };

    let profile = match row.get::<_, Option<String>>("profile_user_id")? {
        Some(_) => Some(profile_from_row(row, "profile_user_id")?),
        None => None,
    };

    let ipaq = match row.get::<_, Option<String>>("ipaq_complaint_id")? {
        Some(_) => Some(IpaqAnswers {
            vigorous_activity_days: row.get("vigorous_activity_days")?,
            vigorous_activity_minutes: row.get("vigorous_activity_minutes")?,
            moderate_activity_days: row.get("moderate_activity_days")?,
            moderate_activity_minutes: row.get("moderate_activity_minutes")?,
            walking_days: row.get("walking_days")?,
            walking_minutes: row.get("walking_minutes")?,
            sitting_minutes: row.get("sitting_minutes")?,
        }),
        None => None,
    };

    let nasa_tlx = match decimal_column(row, "overall_score")? {
        Some(overall_score) => {
            let required = |column: &str| -> rusqlite::Result<Decimal> {
                Ok(row.get::<_, SqlDecimal>(column)?.0)
            };
            Some(NasaTlxRecord {
                ratings: NasaTlxRatings {
                    mental_demand: required("mental_demand")?,
                    physical_demand: required("physical_demand")?,
                    temporal_demand: required("temporal_demand")?,
                    performance: required("performance")?,
                    effort: required("effort")?,
                    frustration: required("frustration")?,
                },
                overall_score,
                submitted_at: row.get("tlx_submitted_at")?,
            })
        }
        None => None,
    };

    Ok(JoinedComplaint {
        complaint,
        pilot,
        profile,
        ipaq,
        nasa_tlx,
        has_assessment: row.get("has_assessment")?,
    })
}

fn assessment_from_row(row: &Row) -> rusqlite::Result<Assessment> {
    Ok(Assessment {
        id: row.get("id")?,
        complaint_id: row.get("complaint_id")?,
        professional_id: row.get("professional_id")?,
        professional_name: row.get("professional_name")?,
        diagnosis: row.get("diagnosis")?,
        treatment_plan: row.get("treatment_plan")?,
        notes: row.get("notes")?,
        assessment_date: row.get("assessment_date")?,
    })
}

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        message: row.get("message")?,
        link: row.get("link")?,
        is_read: row.get("is_read")?,
        created_at: row.get("created_at")?,
    })
}
