use std::collections::HashMap;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{parse_time_of_day, ApprovalMark, Faculty, LectureRecord, TimetableSlot};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let faculty = vec![
        (
            Uuid::parse_str("7c9e4f0a-51b3-4f62-9a1d-2f3b8c6d5e01")?,
            "Amit Kumar",
            "amit.kumar@vit.edu",
            "Assistant Professor",
        ),
        (
            Uuid::parse_str("b2a1c8d4-6e5f-4a30-8b7c-9d0e1f2a3b02")?,
            "Priya Sharma",
            "priya.sharma@vit.edu",
            "Associate Professor",
        ),
        (
            Uuid::parse_str("e5d4c3b2-a190-4878-b6c5-d4e3f2a1b003")?,
            "Dr. John Doe",
            "john.doe@vit.edu",
            "Professor",
        ),
    ];

    for (id, name, email, designation) in &faculty {
        sqlx::query(
            r#"
            INSERT INTO lecture_audit.faculty (id, name, email, designation)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name, designation = EXCLUDED.designation
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(designation)
        .execute(pool)
        .await?;
    }

    let slots = vec![
        (
            Uuid::parse_str("11111111-0000-4000-8000-000000000001")?,
            "VI",
            "A",
            "Cloud Computing",
            "Theory",
            "Monday",
            (10, 0),
            (11, 0),
            "504",
            faculty[0].0,
        ),
        (
            Uuid::parse_str("11111111-0000-4000-8000-000000000002")?,
            "VI",
            "A",
            "Web Technology",
            "Theory",
            "Monday",
            (11, 0),
            (12, 0),
            "504",
            faculty[1].0,
        ),
        (
            Uuid::parse_str("11111111-0000-4000-8000-000000000003")?,
            "VI",
            "A",
            "AI & ML",
            "Theory",
            "Tuesday",
            (10, 0),
            (11, 0),
            "302",
            faculty[0].0,
        ),
    ];

    for (id, sem, div, subject, kind, day, start, end, room, faculty_id) in slots {
        let start_time = NaiveTime::from_hms_opt(start.0, start.1, 0).context("invalid time")?;
        let end_time = NaiveTime::from_hms_opt(end.0, end.1, 0).context("invalid time")?;
        sqlx::query(
            r#"
            INSERT INTO lecture_audit.timetable
            (id, semester, division, batch_strength, subject_name, subject_type,
             day_of_week, start_time, end_time, room_no, assigned_faculty_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(sem)
        .bind(div)
        .bind(60)
        .bind(subject)
        .bind(kind)
        .bind(day)
        .bind(start_time)
        .bind(end_time)
        .bind(room)
        .bind(faculty_id)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO lecture_audit.daily_lecture_records
        (id, timetable_id, date, actual_start_time, actual_end_time, room_no,
         faculty_id, attendance_count, topic_covered, lecture_capture_status,
         smart_board_pdf_status, remarks, submitted_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(Uuid::parse_str("22222222-0000-4000-8000-000000000001")?)
    .bind(Uuid::parse_str("11111111-0000-4000-8000-000000000001")?)
    .bind(NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?)
    .bind(NaiveTime::from_hms_opt(10, 5, 0).context("invalid time")?)
    .bind(NaiveTime::from_hms_opt(11, 0, 0).context("invalid time")?)
    .bind("504")
    .bind(faculty[0].0)
    .bind(52)
    .bind("Virtualization and hypervisors")
    .bind(true)
    .bind(false)
    .bind("")
    .bind("amit.kumar@vit.edu")
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_faculty(pool: &PgPool) -> anyhow::Result<Vec<Faculty>> {
    let rows = sqlx::query(
        "SELECT id, name, email, designation FROM lecture_audit.faculty ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Faculty {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            designation: row.get("designation"),
        })
        .collect())
}

pub async fn list_slots_for_weekday(
    pool: &PgPool,
    weekday: &str,
) -> anyhow::Result<Vec<TimetableSlot>> {
    let rows = sqlx::query(
        "SELECT t.id, t.semester, t.division, t.batch_strength, t.subject_name, \
         t.subject_type, t.day_of_week, t.start_time, t.end_time, t.room_no, \
         t.assigned_faculty_id, f.name AS assigned_faculty_name \
         FROM lecture_audit.timetable t \
         LEFT JOIN lecture_audit.faculty f ON f.id = t.assigned_faculty_id \
         WHERE t.day_of_week = $1 \
         ORDER BY t.start_time",
    )
    .bind(weekday)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| TimetableSlot {
            id: row.get("id"),
            semester: row.get("semester"),
            division: row.get("division"),
            batch_strength: row.get("batch_strength"),
            subject_name: row.get("subject_name"),
            subject_type: row.get("subject_type"),
            day_of_week: row.get("day_of_week"),
            start_time: row.get("start_time"),
            end_time: row.get("end_time"),
            room_no: row.get("room_no"),
            assigned_faculty_id: row.get("assigned_faculty_id"),
            assigned_faculty_name: row.get("assigned_faculty_name"),
        })
        .collect())
}

pub async fn list_records_for_date(
    pool: &PgPool,
    date: NaiveDate,
) -> anyhow::Result<Vec<LectureRecord>> {
    let rows = sqlx::query(
        "SELECT r.id, r.timetable_id, r.date, r.actual_start_time, r.actual_end_time, \
         r.room_no, r.faculty_id, f.name AS faculty_name, r.attendance_count, \
         r.topic_covered, r.lecture_capture_status, r.smart_board_pdf_status, \
         r.remarks, r.submitted_by, \
         t.subject_name AS linked_subject, t.semester AS linked_semester, \
         t.division AS linked_division \
         FROM lecture_audit.daily_lecture_records r \
         LEFT JOIN lecture_audit.faculty f ON f.id = r.faculty_id \
         LEFT JOIN lecture_audit.timetable t ON t.id = r.timetable_id \
         WHERE r.date = $1 \
         ORDER BY r.created_at",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| LectureRecord {
            id: row.get("id"),
            timetable_id: row.get("timetable_id"),
            date: row.get("date"),
            actual_start_time: row.get("actual_start_time"),
            actual_end_time: row.get("actual_end_time"),
            room_no: row.get("room_no"),
            faculty_id: row.get("faculty_id"),
            faculty_name: row.get("faculty_name"),
            attendance_count: row.get("attendance_count"),
            topic_covered: row.get("topic_covered"),
            lecture_capture_status: row.get("lecture_capture_status"),
            smart_board_pdf_status: row.get("smart_board_pdf_status"),
            remarks: row.get("remarks"),
            submitted_by: row.get("submitted_by"),
            linked_subject: row.get("linked_subject"),
            linked_semester: row.get("linked_semester"),
            linked_division: row.get("linked_division"),
        })
        .collect())
}

pub async fn get_approval(pool: &PgPool, date: NaiveDate) -> anyhow::Result<Option<ApprovalMark>> {
    let row = sqlx::query(
        "SELECT date, approved_by, approved_by_id, approved_at \
         FROM lecture_audit.report_approvals WHERE date = $1",
    )
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| ApprovalMark {
        date: row.get("date"),
        approved_by: row.get("approved_by"),
        approved_by_id: row.get("approved_by_id"),
        approved_at: row.get("approved_at"),
    }))
}

/// Last write wins: re-approving a date replaces the existing mark.
pub async fn upsert_approval(
    pool: &PgPool,
    date: NaiveDate,
    approved_by: &str,
    email: Option<&str>,
) -> anyhow::Result<()> {
    let approved_by_id = match email {
        Some(email) => faculty_id_by_email(pool, email).await?,
        None => None,
    };

    sqlx::query(
        r#"
        INSERT INTO lecture_audit.report_approvals (date, approved_by, approved_by_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (date) DO UPDATE
        SET approved_by = EXCLUDED.approved_by,
            approved_by_id = EXCLUDED.approved_by_id,
            approved_at = now()
        "#,
    )
    .bind(date)
    .bind(approved_by)
    .bind(approved_by_id)
    .execute(pool)
    .await?;

    Ok(())
}

async fn faculty_id_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Option<Uuid>> {
    let row = sqlx::query("SELECT id FROM lecture_audit.faculty WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.get("id")))
}

/// Ingests timetable slots from the flat CSV form produced by the external
/// Excel/PDF importers. Rows with unusable start or end times are skipped,
/// never guessed at. Returns (inserted, skipped).
pub async fn import_timetable_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<(usize, usize)> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        semester: String,
        division: String,
        batch_strength: Option<i32>,
        subject_name: String,
        subject_type: Option<String>,
        day_of_week: String,
        start_time: String,
        end_time: String,
        room_no: String,
        faculty_name: Option<String>,
        faculty_email: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        let (start_time, end_time) = match (
            parse_time_of_day(&row.start_time),
            parse_time_of_day(&row.end_time),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let assigned_faculty_id = match &row.faculty_email {
            Some(email) => {
                let name = row.faculty_name.as_deref().unwrap_or(email.as_str());
                Some(upsert_faculty(pool, name, email).await?)
            }
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO lecture_audit.timetable
            (id, semester, division, batch_strength, subject_name, subject_type,
             day_of_week, start_time, end_time, room_no, assigned_faculty_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.semester)
        .bind(&row.division)
        .bind(row.batch_strength)
        .bind(&row.subject_name)
        .bind(row.subject_type.as_deref().unwrap_or("Theory"))
        .bind(&row.day_of_week)
        .bind(start_time)
        .bind(end_time)
        .bind(&row.room_no)
        .bind(assigned_faculty_id)
        .execute(pool)
        .await?;

        inserted += 1;
    }

    Ok((inserted, skipped))
}

/// Ingests daily lecture records. Rows for a date that already carries an
/// approval mark are skipped: the lock freezes that date's records.
/// Malformed actual times degrade to NULL rather than dropping the row.
/// Returns (inserted, locked_skipped).
pub async fn import_records_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<(usize, usize)> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        timetable_id: Option<Uuid>,
        date: NaiveDate,
        actual_start_time: Option<String>,
        actual_end_time: Option<String>,
        room_no: String,
        faculty_email: Option<String>,
        attendance_count: Option<i32>,
        topic_covered: Option<String>,
        #[serde(default)]
        lecture_capture_status: bool,
        #[serde(default)]
        smart_board_pdf_status: bool,
        remarks: Option<String>,
        submitted_by: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;
    let mut locked = 0usize;
    let mut lock_cache: HashMap<NaiveDate, bool> = HashMap::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        let is_locked = match lock_cache.get(&row.date) {
            Some(flag) => *flag,
            None => {
                let flag = get_approval(pool, row.date).await?.is_some();
                lock_cache.insert(row.date, flag);
                flag
            }
        };
        if is_locked {
            locked += 1;
            continue;
        }

        let faculty_id = match &row.faculty_email {
            Some(email) => faculty_id_by_email(pool, email).await?,
            None => None,
        };

        let start: Option<NaiveTime> = row
            .actual_start_time
            .as_deref()
            .and_then(parse_time_of_day);
        let end: Option<NaiveTime> = row.actual_end_time.as_deref().and_then(parse_time_of_day);

        sqlx::query(
            r#"
            INSERT INTO lecture_audit.daily_lecture_records
            (id, timetable_id, date, actual_start_time, actual_end_time, room_no,
             faculty_id, attendance_count, topic_covered, lecture_capture_status,
             smart_board_pdf_status, remarks, submitted_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.timetable_id)
        .bind(row.date)
        .bind(start)
        .bind(end)
        .bind(&row.room_no)
        .bind(faculty_id)
        .bind(row.attendance_count)
        .bind(row.topic_covered.as_deref().unwrap_or(""))
        .bind(row.lecture_capture_status)
        .bind(row.smart_board_pdf_status)
        .bind(row.remarks.as_deref().unwrap_or(""))
        .bind(row.submitted_by.as_deref().unwrap_or(""))
        .execute(pool)
        .await?;

        inserted += 1;
    }

    Ok((inserted, locked))
}

async fn upsert_faculty(pool: &PgPool, name: &str, email: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO lecture_audit.faculty (id, name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}
