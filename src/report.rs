use std::fmt::Write;

use chrono::{NaiveDate, NaiveTime};

use crate::models::{ApprovalMark, LectureRecord, ReportRow, TimetableSlot};
use crate::reconcile;

/// Flattens a date's slots and records into printable report rows:
/// one row per slot (planned beside actual), then one row per record
/// that matches no slot in the set (extra/unscheduled lectures). Row
/// order is part of the report contract; callers must not resort.
pub fn project_report(slots: &[TimetableSlot], records: &[LectureRecord]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = slots
        .iter()
        .map(|slot| {
            let record = records.iter().find(|r| r.timetable_id == Some(slot.id));
            slot_row(slot, record)
        })
        .collect();

    for record in records {
        let matched = record
            .timetable_id
            .map_or(false, |id| slots.iter().any(|s| s.id == id));
        if !matched {
            rows.push(extra_row(record));
        }
    }

    rows
}

fn slot_row(slot: &TimetableSlot, record: Option<&LectureRecord>) -> ReportRow {
    let planned_faculty = slot
        .assigned_faculty_name
        .clone()
        .unwrap_or_else(|| "Unknown".to_string());

    let (actual_faculty, actual_time, actual_room, attendance, topic, capture, smart_board, remarks) =
        match record {
            Some(r) => (
                actual_faculty_label(r),
                time_range(r.actual_start_time, r.actual_end_time)
                    .unwrap_or_else(|| "-".to_string()),
                r.room_no.clone(),
                r.attendance_count
                    .map_or_else(|| "-".to_string(), |n| n.to_string()),
                if r.topic_covered.is_empty() {
                    "-".to_string()
                } else {
                    r.topic_covered.clone()
                },
                yes_no(r.lecture_capture_status),
                yes_no(r.smart_board_pdf_status),
                r.remarks.clone(),
            ),
            None => (
                "N/A".to_string(),
                "N/A".to_string(),
                "N/A".to_string(),
                "N/A".to_string(),
                "N/A".to_string(),
                "No".to_string(),
                "No".to_string(),
                String::new(),
            ),
        };

    ReportRow {
        semester: slot.semester.clone(),
        division: slot.division.clone(),
        batch_strength: slot
            .batch_strength
            .map_or_else(|| "60".to_string(), |n| n.to_string()),
        subject_name: slot.subject_name.clone(),
        subject_type: slot.subject_type.clone(),
        planned_time: format!("{} - {}", fmt_time(slot.start_time), fmt_time(slot.end_time)),
        planned_faculty,
        planned_room: slot.room_no.clone(),
        actual_faculty,
        actual_time,
        actual_room,
        attendance,
        topic_covered: topic,
        lecture_capture: capture,
        smart_board_pdf: smart_board,
        remarks,
        faculty_substituted: record.map_or(false, |r| {
            r.faculty_id.is_some() && r.faculty_id != slot.assigned_faculty_id
        }),
        room_changed: record.map_or(false, |r| r.room_no != slot.room_no),
        lecture_capture_missing: record.map_or(false, |r| !r.lecture_capture_status),
        lecture_capture_done: record.map_or(false, |r| r.lecture_capture_status),
        extra: false,
    }
}

/// A record with no slot in the day's set still gets a row; the record's
/// timetable join fills the planned columns when it exists, otherwise the
/// row falls back to the extra-lecture defaults.
fn extra_row(record: &LectureRecord) -> ReportRow {
    ReportRow {
        semester: record
            .linked_semester
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        division: record
            .linked_division
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        batch_strength: "-".to_string(),
        subject_name: record
            .linked_subject
            .clone()
            .unwrap_or_else(|| "Extra Lecture".to_string()),
        subject_type: "Practical".to_string(),
        planned_time: "N/A".to_string(),
        planned_faculty: "N/A".to_string(),
        planned_room: "N/A".to_string(),
        actual_faculty: actual_faculty_label(record),
        actual_time: time_range(record.actual_start_time, record.actual_end_time)
            .unwrap_or_else(|| "-".to_string()),
        actual_room: record.room_no.clone(),
        attendance: record
            .attendance_count
            .map_or_else(|| "-".to_string(), |n| n.to_string()),
        topic_covered: if record.topic_covered.is_empty() {
            "-".to_string()
        } else {
            record.topic_covered.clone()
        },
        lecture_capture: yes_no(record.lecture_capture_status),
        smart_board_pdf: yes_no(record.smart_board_pdf_status),
        remarks: record.remarks.clone(),
        faculty_substituted: false,
        room_changed: false,
        lecture_capture_missing: !record.lecture_capture_status,
        lecture_capture_done: record.lecture_capture_status,
        extra: true,
    }
}

fn actual_faculty_label(record: &LectureRecord) -> String {
    match (&record.faculty_name, record.faculty_id) {
        (Some(name), _) => name.clone(),
        (None, Some(_)) => "Unknown".to_string(),
        (None, None) => "-".to_string(),
    }
}

fn fmt_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn time_range(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{} - {}", fmt_time(start), fmt_time(end))),
        _ => None,
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

/// Renders the printable daily report as markdown. The PDF and Excel
/// writers consume the row JSON instead; this rendering is the CLI-side
/// view of the same rows.
pub fn render_report(
    date: NaiveDate,
    rows: &[ReportRow],
    approval: Option<&ApprovalMark>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Daily Lecture Record");
    let _ = writeln!(
        output,
        "Vidyalankar Institute of Technology, Department of Information Technology"
    );
    let _ = writeln!(output, "Date: {} ({})", date, reconcile::weekday_name(date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Planned vs Actual");

    if rows.is_empty() {
        let _ = writeln!(output, "No lectures scheduled or recorded for this date.");
    } else {
        let _ = writeln!(
            output,
            "| Sem | Div | Subject | Planned Time | Planned Faculty | Planned Room | Actual Time | Actual Faculty | Actual Room | Att. | Topic | LC | SB | Remarks |"
        );
        let _ = writeln!(
            output,
            "|-----|-----|---------|--------------|-----------------|--------------|-------------|----------------|-------------|------|-------|----|----|---------|"
        );
        for row in rows {
            let subject = if row.extra {
                format!("{} (extra)", row.subject_name)
            } else {
                row.subject_name.clone()
            };
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                row.semester,
                row.division,
                subject,
                row.planned_time,
                row.planned_faculty,
                row.planned_room,
                row.actual_time,
                row.actual_faculty,
                row.actual_room,
                row.attendance,
                row.topic_covered,
                row.lecture_capture,
                row.smart_board_pdf,
                row.remarks
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Deviations");

    let mut deviations = 0usize;
    for row in rows {
        if row.faculty_substituted {
            deviations += 1;
            let _ = writeln!(
                output,
                "- {}: taken by {} instead of {}",
                row.subject_name, row.actual_faculty, row.planned_faculty
            );
        }
        if row.room_changed {
            deviations += 1;
            let _ = writeln!(
                output,
                "- {}: moved from room {} to {}",
                row.subject_name, row.planned_room, row.actual_room
            );
        }
        if row.lecture_capture_missing {
            deviations += 1;
            let _ = writeln!(output, "- {}: lecture capture missing", row.subject_name);
        }
    }
    if deviations == 0 {
        let _ = writeln!(output, "No deviations recorded.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lecture Capture Tracking");

    let captured: Vec<&ReportRow> = rows.iter().filter(|r| r.lecture_capture_done).collect();
    if captured.is_empty() {
        let _ = writeln!(output, "No lecture captures reported.");
    } else {
        for row in captured {
            let _ = writeln!(
                output,
                "- Room {}: {} at {} ({})",
                row.actual_room, row.subject_name, row.actual_time, row.actual_faculty
            );
        }
    }

    let _ = writeln!(output);
    match approval {
        Some(mark) => {
            let _ = writeln!(
                output,
                "Approved by {} on {}.",
                mark.approved_by,
                mark.approved_at.date_naive()
            );
        }
        None => {
            let _ = writeln!(output, "Pending approval.");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_time_of_day;
    use chrono::Utc;
    use uuid::Uuid;

    fn t(raw: &str) -> NaiveTime {
        parse_time_of_day(raw).unwrap()
    }

    fn sample_slot(subject: &str, room: &str, start: &str, end: &str) -> TimetableSlot {
        TimetableSlot {
            id: Uuid::new_v4(),
            semester: "VI".to_string(),
            division: "A".to_string(),
            batch_strength: Some(60),
            subject_name: subject.to_string(),
            subject_type: "Theory".to_string(),
            day_of_week: "Monday".to_string(),
            start_time: t(start),
            end_time: t(end),
            room_no: room.to_string(),
            assigned_faculty_id: Some(Uuid::new_v4()),
            assigned_faculty_name: Some("Priya Sharma".to_string()),
        }
    }

    fn sample_record(timetable_id: Option<Uuid>, room: &str) -> LectureRecord {
        LectureRecord {
            id: Uuid::new_v4(),
            timetable_id,
            date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            actual_start_time: Some(t("10:00")),
            actual_end_time: Some(t("11:00")),
            room_no: room.to_string(),
            faculty_id: Some(Uuid::new_v4()),
            faculty_name: Some("Amit Kumar".to_string()),
            attendance_count: Some(48),
            topic_covered: "Load balancing".to_string(),
            lecture_capture_status: true,
            smart_board_pdf_status: true,
            remarks: String::new(),
            submitted_by: "amit.kumar@vit.edu".to_string(),
            linked_subject: None,
            linked_semester: None,
            linked_division: None,
        }
    }

    #[test]
    fn every_slot_and_unmatched_record_gets_a_row() {
        let slot_a = sample_slot("Cloud Computing", "504", "10:00", "11:00");
        let slot_b = sample_slot("Web Technology", "504", "11:00", "12:00");
        let records = vec![
            sample_record(Some(slot_a.id), "504"),
            sample_record(None, "302"),
            sample_record(Some(Uuid::new_v4()), "302"),
        ];
        let rows = project_report(&[slot_a, slot_b], &records);
        // 2 slots plus 2 records that match no slot in the set.
        assert_eq!(rows.len(), 4);
        assert!(!rows[0].extra && !rows[1].extra);
        assert!(rows[2].extra && rows[3].extra);
    }

    #[test]
    fn matched_slots_come_first_then_extras_in_record_order() {
        let slot = sample_slot("Cloud Computing", "504", "10:00", "11:00");
        let mut extra_first = sample_record(None, "302");
        extra_first.topic_covered = "first extra".to_string();
        let mut extra_second = sample_record(None, "303");
        extra_second.topic_covered = "second extra".to_string();
        let rows = project_report(&[slot], &[extra_first, extra_second]);
        assert_eq!(rows[0].subject_name, "Cloud Computing");
        assert_eq!(rows[1].topic_covered, "first extra");
        assert_eq!(rows[2].topic_covered, "second extra");
    }

    #[test]
    fn unmatched_slot_degrades_to_placeholders() {
        let slot = sample_slot("AI & ML", "302", "10:00", "11:00");
        let rows = project_report(&[slot], &[]);
        let row = &rows[0];
        assert_eq!(row.actual_time, "N/A");
        assert_eq!(row.actual_faculty, "N/A");
        assert_eq!(row.attendance, "N/A");
        assert!(!row.faculty_substituted);
        assert!(!row.room_changed);
        assert!(!row.lecture_capture_missing);
        assert!(!row.lecture_capture_done);
    }

    #[test]
    fn extra_record_uses_linked_fields_or_defaults() {
        let mut linked = sample_record(None, "302");
        linked.linked_subject = Some("Computer Networks".to_string());
        linked.linked_semester = Some("IV".to_string());
        linked.linked_division = Some("B".to_string());
        let bare = sample_record(None, "303");

        let rows = project_report(&[], &[linked, bare]);
        assert_eq!(rows[0].subject_name, "Computer Networks");
        assert_eq!(rows[0].semester, "IV");
        assert_eq!(rows[1].subject_name, "Extra Lecture");
        assert_eq!(rows[1].subject_type, "Practical");
        assert_eq!(rows[1].planned_time, "N/A");
    }

    #[test]
    fn deviation_flags_are_independent() {
        let slot = sample_slot("Cloud Computing", "504", "10:00", "11:00");
        let mut record = sample_record(Some(slot.id), "302");
        record.lecture_capture_status = false;
        let rows = project_report(&[slot.clone()], &[record]);
        let row = &rows[0];
        // Different faculty id, different room, capture off.
        assert!(row.faculty_substituted);
        assert!(row.room_changed);
        assert!(row.lecture_capture_missing);
        assert!(!row.lecture_capture_done);

        // Same faculty keeps the substitution flag off.
        let mut same_faculty = sample_record(Some(slot.id), "504");
        same_faculty.faculty_id = slot.assigned_faculty_id;
        let rows = project_report(&[slot], &[same_faculty]);
        assert!(!rows[0].faculty_substituted);
        assert!(!rows[0].room_changed);
    }

    #[test]
    fn projection_is_pure_over_its_inputs() {
        let slot = sample_slot("Cloud Computing", "504", "10:00", "11:00");
        let records = vec![
            sample_record(Some(slot.id), "504"),
            sample_record(None, "302"),
        ];
        let slots = vec![slot];
        let first = project_report(&slots, &records);
        let second = project_report(&slots, &records);
        let keys = |rows: &[ReportRow]| {
            rows.iter()
                .map(|r| (r.subject_name.clone(), r.actual_time.clone(), r.extra))
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&first), keys(&second));
    }

    #[test]
    fn rendered_report_carries_header_and_approval_state() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let slot = sample_slot("Cloud Computing", "504", "10:00", "11:00");
        let rows = project_report(&[slot], &[]);

        let pending = render_report(date, &rows, None);
        assert!(pending.contains("# Daily Lecture Record"));
        assert!(pending.contains("2026-02-02 (Monday)"));
        assert!(pending.contains("Pending approval."));

        let mark = ApprovalMark {
            date,
            approved_by: "Dr. HOD".to_string(),
            approved_by_id: None,
            approved_at: Utc::now(),
        };
        let approved = render_report(date, &rows, Some(&mark));
        assert!(approved.contains("Approved by Dr. HOD"));
    }
}
