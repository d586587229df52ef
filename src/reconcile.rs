use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    ApprovalMark, Faculty, LectureRecord, LectureStatus, ReconciledEntry, TimetableSlot, Viewer,
};

/// Weekday name used as the timetable slot key ("Monday".."Sunday").
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

/// Resolves a viewer email against the faculty list. Done once per
/// request; the engine itself only ever sees the resolved id.
pub fn resolve_faculty_id(faculty: &[Faculty], email: &str) -> Option<Uuid> {
    faculty.iter().find(|f| f.email == email).map(|f| f.id)
}

/// Joins the day's planned slots with submitted records and derives one
/// entry per visible slot. Pure over its inputs: no I/O, no failure for
/// empty sets, output order follows slot input order.
pub fn reconcile(
    slots: &[TimetableSlot],
    records: &[LectureRecord],
    approval: Option<&ApprovalMark>,
    viewer: Viewer,
) -> Vec<ReconciledEntry> {
    let (slots, records): (Vec<&TimetableSlot>, Vec<&LectureRecord>) = match viewer {
        Viewer::Faculty {
            faculty_id: Some(id),
        } => (
            slots
                .iter()
                .filter(|s| s.assigned_faculty_id == Some(id))
                .collect(),
            records.iter().filter(|r| r.faculty_id == Some(id)).collect(),
        ),
        // An unresolved faculty viewer sees nothing at all.
        Viewer::Faculty { faculty_id: None } => (Vec::new(), Vec::new()),
        Viewer::Admin | Viewer::Hod => (slots.iter().collect(), records.iter().collect()),
    };

    let rooms = room_index(&records);
    let locked = approval.is_some();

    slots
        .iter()
        .map(|slot| {
            // At most one record per (slot, date) is expected but the
            // store does not enforce it; the first match wins.
            let matched = records.iter().position(|r| r.timetable_id == Some(slot.id));

            let status = if locked {
                LectureStatus::LockedApproved
            } else {
                match matched {
                    None => LectureStatus::Scheduled,
                    Some(idx) if has_room_conflict(&records, &rooms, idx) => {
                        LectureStatus::Conflict
                    }
                    Some(_) => LectureStatus::Submitted,
                }
            };

            ReconciledEntry {
                slot: (*slot).clone(),
                record: matched.map(|idx| records[idx].clone()),
                status,
                conflict: status == LectureStatus::Conflict,
                locked,
            }
        })
        .collect()
}

/// Groups record indexes by room. Room groups stay in the tens, so a
/// linear scan within a group is enough.
fn room_index<'a>(records: &[&'a LectureRecord]) -> HashMap<&'a str, Vec<usize>> {
    let mut rooms: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        rooms.entry(record.room_no.as_str()).or_default().push(idx);
    }
    rooms
}

fn has_room_conflict(
    records: &[&LectureRecord],
    rooms: &HashMap<&str, Vec<usize>>,
    idx: usize,
) -> bool {
    let record = records[idx];
    match rooms.get(record.room_no.as_str()) {
        Some(group) => group
            .iter()
            .any(|&other| other != idx && overlaps(record, records[other])),
        None => false,
    }
}

/// Half-open interval overlap on [start, end): two lectures that merely
/// touch (a ends exactly when b starts) do not conflict. A record
/// missing either endpoint never overlaps anything.
fn overlaps(a: &LectureRecord, b: &LectureRecord) -> bool {
    match (
        a.actual_start_time,
        a.actual_end_time,
        b.actual_start_time,
        b.actual_end_time,
    ) {
        (Some(a_start), Some(a_end), Some(b_start), Some(b_end)) => {
            a_start < b_end && b_start < a_end
        }
        _ => false,
    }
}
