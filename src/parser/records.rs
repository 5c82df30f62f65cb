use serde::{Deserialize, Serialize};

use super::rows::CourseFields;

/// One parsed course section. CRNs are unique within a subject's result
/// set but not globally, and the portal can list stale duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub crn: String,
    pub subject: String,
    pub course_number: String,
    pub title: String,
    pub modality: String,
    pub credit_hours: String,
    pub capacity: u32,
    pub instructor: String,
    pub days: String,
    pub begin_time: String,
    pub end_time: String,
    pub location: String,
    pub comments: String,
}

/// Owns the ordered record sequence for one document.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    records: Vec<CourseRecord>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new record with empty `comments`. Repeated CRNs are kept
    /// as independent records; the portal emits them for stale sections.
    pub fn append(&mut self, fields: CourseFields) {
        self.records.push(CourseRecord {
            crn: fields.crn,
            subject: fields.subject,
            course_number: fields.course_number,
            title: fields.title,
            modality: fields.modality,
            credit_hours: fields.credit_hours,
            capacity: fields.capacity,
            instructor: fields.instructor,
            days: fields.days,
            begin_time: fields.begin_time,
            end_time: fields.end_time,
            location: fields.location,
            comments: String::new(),
        });
    }

    /// Attach a comment to the most recently appended record with this
    /// CRN. Comment rows follow the course row they annotate, so the
    /// newest-first scan resolves duplicate CRNs toward the latest entry.
    /// Returns false when no record matches; the comment is dropped.
    pub fn attach_comment(&mut self, crn: &str, text: &str) -> bool {
        for record in self.records.iter_mut().rev() {
            if record.crn == crn {
                record.comments = text.to_string();
                return true;
            }
        }
        false
    }

    pub fn into_records(self) -> Vec<CourseRecord> {
        self.records
    }
}
