pub mod records;
pub mod rows;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use records::{CourseRecord, RecordBuilder};
use rows::{classify_row, RowClass, SkipReason};

static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());

/// Per-document diagnostic counters. Merged across subjects at the end of
/// a parse run; none of these abort anything.
#[derive(Debug, Clone, Default)]
pub struct SkipTally {
    pub noise_rows: usize,
    pub bad_comment_crn: usize,
    pub bad_course_code: usize,
    pub empty_key_fields: usize,
    pub comments_attached: usize,
    pub comments_unmatched: usize,
}

impl SkipTally {
    pub fn merge(&mut self, other: &SkipTally) {
        self.noise_rows += other.noise_rows;
        self.bad_comment_crn += other.bad_comment_crn;
        self.bad_course_code += other.bad_course_code;
        self.empty_key_fields += other.empty_key_fields;
        self.comments_attached += other.comments_attached;
        self.comments_unmatched += other.comments_unmatched;
    }

    fn count(&mut self, subject_code: &str, reason: SkipReason) {
        match reason {
            SkipReason::TooFewCells => self.noise_rows += 1,
            SkipReason::CommentCrnPattern => {
                warn!("{}: comment row without a parsable CRN, skipping", subject_code);
                self.bad_comment_crn += 1;
            }
            SkipReason::CourseCodeFormat => {
                debug!("{}: course row with malformed subject code, skipping", subject_code);
                self.bad_course_code += 1;
            }
            SkipReason::EmptyKeyField => {
                warn!("{}: course row missing CRN or subject, skipping", subject_code);
                self.empty_key_fields += 1;
            }
        }
    }
}

pub struct ParsedDocument {
    pub subject_code: String,
    pub records: Vec<CourseRecord>,
    pub tally: SkipTally,
}

/// Single pass over the document's table rows in document order. Course
/// rows append records; comment rows attach to the newest matching prior
/// record; everything else is tallied and skipped. Row order matters, so
/// callers may parallelize across documents but never within one.
pub fn parse_document(subject_code: &str, html: &str) -> ParsedDocument {
    let doc = Html::parse_document(html);
    let mut builder = RecordBuilder::new();
    let mut tally = SkipTally::default();

    for row in doc.select(&ROW_SEL) {
        match classify_row(row) {
            RowClass::Course(fields) => builder.append(fields),
            RowClass::Comment { crn, text } => {
                if builder.attach_comment(&crn, &text) {
                    tally.comments_attached += 1;
                } else {
                    debug!("{}: comment for CRN {} matches no record, dropping", subject_code, crn);
                    tally.comments_unmatched += 1;
                }
            }
            RowClass::Skip(reason) => tally.count(subject_code, reason),
        }
    }

    ParsedDocument {
        subject_code: subject_code.to_string(),
        records: builder.into_records(),
        tally,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_fixture(name: &str) -> ParsedDocument {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        parse_document("CS", &html)
    }

    #[test]
    fn cs_fixture_records_in_document_order() {
        let doc = parse_fixture("cs");
        let crns: Vec<&str> = doc.records.iter().map(|r| r.crn.as_str()).collect();
        assert_eq!(crns, ["87312", "87313", "91844", "91845"]);
    }

    #[test]
    fn cs_fixture_comment_attachment() {
        let doc = parse_fixture("cs");
        let annotated = doc.records.iter().find(|r| r.crn == "87313").unwrap();
        assert_eq!(annotated.comments, "Prerequisite: CS 1114 with a C or better.");
        assert!(doc.records.iter().filter(|r| r.crn != "87313").all(|r| r.comments.is_empty()));
        assert_eq!(doc.tally.comments_attached, 1);
    }

    #[test]
    fn cs_fixture_skips_header_and_filler() {
        let doc = parse_fixture("cs");
        // Header row has 12 cells but "Course Section" has no single '-'.
        assert_eq!(doc.tally.bad_course_code, 1);
        // "* Additional Times *" continuation rows are short.
        assert!(doc.tally.noise_rows >= 1);
    }

    #[test]
    fn cs_fixture_capacity_normalization() {
        let doc = parse_fixture("cs");
        let open = doc.records.iter().find(|r| r.crn == "87312").unwrap();
        assert_eq!(open.capacity, 30);
        let tbd = doc.records.iter().find(|r| r.crn == "91844").unwrap();
        assert_eq!(tbd.capacity, 0);
    }

    #[test]
    fn parse_is_deterministic() {
        let html = std::fs::read_to_string("tests/fixtures/cs.html").unwrap();
        let a = parse_document("CS", &html);
        let b = parse_document("CS", &html);
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn comment_before_its_course_is_dropped() {
        let html = "<table>\
                    <tr><td>Comments for CRN 11111:</td><td><b>too early</b></td></tr>\
                    <tr><td><b>11111</b></td><td>MATH-1225</td><td>Calculus</td><td>L</td>\
                    <td>Face-to-Face Instruction</td><td>4</td><td>25</td><td>J Doe</td>\
                    <td>M W F</td><td>8:00AM</td><td>8:50AM</td><td>MCB 230</td></tr>\
                    </table>";
        let doc = parse_document("MATH", html);
        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.records[0].comments, "");
        assert_eq!(doc.tally.comments_unmatched, 1);
    }

    #[test]
    fn document_without_table_yields_nothing() {
        let doc = parse_document("FL", "<html><body><p>No sections found.</p></body></html>");
        assert!(doc.records.is_empty());
        assert_eq!(doc.tally.comments_attached, 0);
    }
}
