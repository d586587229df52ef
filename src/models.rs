use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Faculty {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub designation: String,
}

/// A recurring weekly timetable entry. Reference data owned by the admin
/// role; `assigned_faculty_name` is denormalized from the faculty join.
#[derive(Debug, Clone, Serialize)]
pub struct TimetableSlot {
    pub id: Uuid,
    pub semester: String,
    pub division: String,
    pub batch_strength: Option<i32>,
    pub subject_name: String,
    pub subject_type: String,
    pub day_of_week: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_no: String,
    pub assigned_faculty_id: Option<Uuid>,
    pub assigned_faculty_name: Option<String>,
}

/// A faculty-submitted record of what actually happened in a slot.
/// `timetable_id` is None for extra/unscheduled lectures. The `linked_*`
/// fields carry the timetable join for records whose slot exists but is
/// not part of the current day's slot set.
#[derive(Debug, Clone, Serialize)]
pub struct LectureRecord {
    pub id: Uuid,
    pub timetable_id: Option<Uuid>,
    pub date: NaiveDate,
    pub actual_start_time: Option<NaiveTime>,
    pub actual_end_time: Option<NaiveTime>,
    pub room_no: String,
    pub faculty_id: Option<Uuid>,
    pub faculty_name: Option<String>,
    pub attendance_count: Option<i32>,
    pub topic_covered: String,
    pub lecture_capture_status: bool,
    pub smart_board_pdf_status: bool,
    pub remarks: String,
    pub submitted_by: String,
    pub linked_subject: Option<String>,
    pub linked_semester: Option<String>,
    pub linked_division: Option<String>,
}

/// Per-date lock. Once present, every record for that date is frozen and
/// reconciliation short-circuits to LockedApproved.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalMark {
    pub date: NaiveDate,
    pub approved_by: String,
    pub approved_by_id: Option<Uuid>,
    pub approved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LectureStatus {
    Scheduled,
    Submitted,
    Conflict,
    LockedApproved,
}

impl std::fmt::Display for LectureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LectureStatus::Scheduled => "scheduled",
            LectureStatus::Submitted => "submitted",
            LectureStatus::Conflict => "conflict",
            LectureStatus::LockedApproved => "locked-approved",
        };
        f.write_str(label)
    }
}

/// Resolved caller capability. Built once per request; the engine never
/// looks at emails or role strings.
#[derive(Debug, Clone, Copy)]
pub enum Viewer {
    Admin,
    Hod,
    /// None means the viewer's email matched no faculty entry; such a
    /// viewer sees nothing.
    Faculty { faculty_id: Option<Uuid> },
}

/// Derived per request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledEntry {
    pub slot: TimetableSlot,
    pub record: Option<LectureRecord>,
    pub status: LectureStatus,
    pub conflict: bool,
    pub locked: bool,
}

/// One line of the printable daily report: planned columns beside actual
/// columns, already formatted for tabular export. The PDF/Excel writers
/// take a list of these as their only structured input.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub semester: String,
    pub division: String,
    pub batch_strength: String,
    pub subject_name: String,
    pub subject_type: String,
    pub planned_time: String,
    pub planned_faculty: String,
    pub planned_room: String,
    pub actual_faculty: String,
    pub actual_time: String,
    pub actual_room: String,
    pub attendance: String,
    pub topic_covered: String,
    pub lecture_capture: String,
    pub smart_board_pdf: String,
    pub remarks: String,
    pub faculty_substituted: bool,
    pub room_changed: bool,
    pub lecture_capture_missing: bool,
    pub lecture_capture_done: bool,
    pub extra: bool,
}

/// Normalizes an external clock string to a time of day. Accepts
/// `HH:MM` and `HH:MM:SS`, tolerating missing zero-padding ("9:5" is
/// 09:05). Anything else is None; callers treat such times as unusable
/// rather than comparing raw strings.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_and_unpadded_times() {
        assert_eq!(
            parse_time_of_day("10:00"),
            NaiveTime::from_hms_opt(10, 0, 0)
        );
        assert_eq!(parse_time_of_day("9:5"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(
            parse_time_of_day("11:15:30"),
            NaiveTime::from_hms_opt(11, 15, 30)
        );
        assert_eq!(
            parse_time_of_day(" 08:30 "),
            NaiveTime::from_hms_opt(8, 30, 0)
        );
    }

    #[test]
    fn rejects_garbage_times() {
        assert_eq!(parse_time_of_day(""), None);
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_time_of_day("noon"), None);
        assert_eq!(parse_time_of_day("10-00"), None);
    }

    #[test]
    fn normalized_times_order_correctly() {
        // "9:5" vs "10:00" is the case string comparison gets wrong.
        let early = parse_time_of_day("9:5").unwrap();
        let late = parse_time_of_day("10:00").unwrap();
        assert!(early < late);
    }
}
