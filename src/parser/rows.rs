use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static BOLD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").unwrap());
static COMMENT_CRN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"CRN (\d+):").unwrap());

/// Marker phrase the portal puts in the first cell of an annotation row.
const COMMENT_MARKER: &str = "Comments for CRN";

/// A course row carries at least this many cells; anything shorter is
/// filler (header spacers, "* Additional Times *" continuations).
const MIN_COURSE_CELLS: usize = 12;

/// Column roles at their fixed 0-indexed offsets in a course row.
/// `SectionType` (3) exists in the markup but is not extracted.
#[derive(Debug, Clone, Copy)]
enum Column {
    Crn = 0,
    CourseCode = 1,
    Title = 2,
    #[allow(dead_code)]
    SectionType = 3,
    Modality = 4,
    CreditHours = 5,
    Capacity = 6,
    Instructor = 7,
    Days = 8,
    BeginTime = 9,
    EndTime = 10,
    Location = 11,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
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
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClass {
    Course(CourseFields),
    Comment { crn: String, text: String },
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than 12 cells: filler, not an error.
    TooFewCells,
    /// Comment marker present but no `CRN <digits>:` pattern.
    CommentCrnPattern,
    /// Cell 1 did not split into subject and number on a single `-`.
    CourseCodeFormat,
    /// Extraction produced an empty CRN or subject.
    EmptyKeyField,
}

/// Classify one `tr` element. The comment test runs first; a row that
/// fails both tests is filler and skipped without error.
pub fn classify_row(row: ElementRef) -> RowClass {
    let cells: Vec<ElementRef> = row.select(&CELL_SEL).collect();

    if cells.len() >= 2 && cell_text(cells[0]).contains(COMMENT_MARKER) {
        return classify_comment(&cells);
    }

    if cells.len() < MIN_COURSE_CELLS {
        return RowClass::Skip(SkipReason::TooFewCells);
    }

    match extract_course(&cells) {
        Ok(fields) => RowClass::Course(fields),
        Err(reason) => RowClass::Skip(reason),
    }
}

fn classify_comment(cells: &[ElementRef]) -> RowClass {
    let first = cell_text(cells[0]);
    let crn = match COMMENT_CRN_RE.captures(&first) {
        Some(caps) => caps[1].to_string(),
        None => return RowClass::Skip(SkipReason::CommentCrnPattern),
    };

    // Only bold sub-elements carry the comment body; surrounding plain
    // text in the cell is boilerplate and dropped on purpose.
    let text = cells[1]
        .select(&BOLD_SEL)
        .map(|b| b.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>()
        .join(" ");

    RowClass::Comment { crn, text }
}

fn extract_course(cells: &[ElementRef]) -> Result<CourseFields, SkipReason> {
    let crn = bold_text(col(cells, Column::Crn))
        .unwrap_or_else(|| cell_text(col(cells, Column::Crn)));

    let code = cell_text(col(cells, Column::CourseCode));
    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() != 2 {
        return Err(SkipReason::CourseCodeFormat);
    }
    let (subject, course_number) = (parts[0].to_string(), parts[1].to_string());

    if crn.is_empty() || subject.is_empty() {
        return Err(SkipReason::EmptyKeyField);
    }

    let capacity_text = cell_text(col(cells, Column::Capacity));
    let capacity = if !capacity_text.is_empty()
        && capacity_text.bytes().all(|b| b.is_ascii_digit())
    {
        capacity_text.parse().unwrap_or(0)
    } else {
        0
    };

    Ok(CourseFields {
        crn,
        subject,
        course_number,
        title: cell_text(col(cells, Column::Title)),
        modality: cell_text(col(cells, Column::Modality)),
        credit_hours: cell_text(col(cells, Column::CreditHours)),
        capacity,
        instructor: cell_text(col(cells, Column::Instructor)),
        days: cell_text(col(cells, Column::Days)),
        begin_time: cell_text(col(cells, Column::BeginTime)),
        end_time: cell_text(col(cells, Column::EndTime)),
        location: cell_text(col(cells, Column::Location)),
    })
}

fn col<'a>(cells: &[ElementRef<'a>], column: Column) -> ElementRef<'a> {
    cells[column as usize]
}

/// Whitespace-normalized text of a cell, nested elements included.
fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first bold sub-element, if the cell has one. The CRN cell
/// usually wraps the number in a linked `<b>`.
fn bold_text(cell: ElementRef) -> Option<String> {
    cell.select(&BOLD_SEL)
        .next()
        .map(|b| b.text().collect::<String>().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn classify(table: &str) -> RowClass {
        let doc = Html::parse_fragment(table);
        let sel = Selector::parse("tr").unwrap();
        let row = doc.select(&sel).next().expect("fixture has a row");
        classify_row(row)
    }

    fn course_row(code: &str, capacity: &str) -> String {
        format!(
            "<table><tr>\
             <td><a href=\"x\"><b>87312</b></a></td>\
             <td>{code}</td>\
             <td>Softw Des &amp; Data Structures</td>\
             <td>L</td>\
             <td>Face-to-Face Instruction</td>\
             <td>3</td>\
             <td>{capacity}</td>\
             <td>G Back</td>\
             <td>T R</td>\
             <td>9:30AM</td>\
             <td>10:45AM</td>\
             <td>MCB 113</td>\
             </tr></table>"
        )
    }

    #[test]
    fn course_row_extraction() {
        let RowClass::Course(f) = classify(&course_row("CS-2114", "30")) else {
            panic!("expected course row");
        };
        assert_eq!(f.crn, "87312");
        assert_eq!(f.subject, "CS");
        assert_eq!(f.course_number, "2114");
        assert_eq!(f.title, "Softw Des & Data Structures");
        assert_eq!(f.modality, "Face-to-Face Instruction");
        assert_eq!(f.credit_hours, "3");
        assert_eq!(f.capacity, 30);
        assert_eq!(f.instructor, "G Back");
        assert_eq!(f.days, "T R");
        assert_eq!(f.begin_time, "9:30AM");
        assert_eq!(f.end_time, "10:45AM");
        assert_eq!(f.location, "MCB 113");
    }

    #[test]
    fn crn_prefers_bold_subelement() {
        let html = course_row("CS-2114", "30").replace(
            "<td><a href=\"x\"><b>87312</b></a></td>",
            "<td>junk <b>90001</b></td>",
        );
        let RowClass::Course(f) = classify(&html) else {
            panic!("expected course row");
        };
        assert_eq!(f.crn, "90001");
    }

    #[test]
    fn crn_falls_back_to_cell_text() {
        let html = course_row("CS-2114", "30").replace(
            "<td><a href=\"x\"><b>87312</b></a></td>",
            "<td> 90002 </td>",
        );
        let RowClass::Course(f) = classify(&html) else {
            panic!("expected course row");
        };
        assert_eq!(f.crn, "90002");
    }

    #[test]
    fn non_numeric_capacity_defaults_to_zero() {
        let RowClass::Course(f) = classify(&course_row("CS-2114", "TBD")) else {
            panic!("expected course row");
        };
        assert_eq!(f.capacity, 0);
    }

    #[test]
    fn code_without_separator_is_skipped() {
        assert_eq!(
            classify(&course_row("CS2114", "30")),
            RowClass::Skip(SkipReason::CourseCodeFormat)
        );
    }

    #[test]
    fn code_with_two_separators_is_skipped() {
        assert_eq!(
            classify(&course_row("CS-2114-H", "30")),
            RowClass::Skip(SkipReason::CourseCodeFormat)
        );
    }

    #[test]
    fn empty_crn_is_skipped() {
        let html = course_row("CS-2114", "30").replace(
            "<td><a href=\"x\"><b>87312</b></a></td>",
            "<td><b></b></td>",
        );
        assert_eq!(classify(&html), RowClass::Skip(SkipReason::EmptyKeyField));
    }

    #[test]
    fn short_row_is_noise() {
        let html = "<table><tr><td colspan=\"5\">* Additional Times *</td>\
                    <td>T R</td><td>11:00AM</td><td>12:15PM</td><td>MCB 113</td></tr></table>";
        assert_eq!(classify(html), RowClass::Skip(SkipReason::TooFewCells));
    }

    #[test]
    fn comment_row() {
        let html = "<table><tr>\
                    <td colspan=\"2\">Comments for CRN 87312:</td>\
                    <td><b>Prerequisite:</b> see catalog <b>CS 1114</b></td>\
                    </tr></table>";
        assert_eq!(
            classify(html),
            RowClass::Comment {
                crn: "87312".to_string(),
                text: "Prerequisite: CS 1114".to_string(),
            }
        );
    }

    #[test]
    fn comment_ignores_non_bold_text() {
        let html = "<table><tr>\
                    <td>Comments for CRN 12345:</td>\
                    <td>plain <b>Waitlist</b> noise <b>Only</b> tail</td>\
                    </tr></table>";
        let RowClass::Comment { text, .. } = classify(html) else {
            panic!("expected comment row");
        };
        assert_eq!(text, "Waitlist Only");
    }

    #[test]
    fn comment_test_runs_before_course_test() {
        // 12 cells, but the marker in cell 0 wins.
        let cells: String = std::iter::once("<td>Comments for CRN 555:</td>".to_string())
            .chain((0..11).map(|i| format!("<td><b>c{i}</b></td>")))
            .collect();
        let html = format!("<table><tr>{cells}</tr></table>");
        assert!(matches!(classify(&html), RowClass::Comment { crn, .. } if crn == "555"));
    }

    #[test]
    fn comment_without_digits_is_skipped() {
        let html = "<table><tr>\
                    <td>Comments for CRN :</td>\
                    <td><b>orphaned</b></td>\
                    </tr></table>";
        assert_eq!(classify(html), RowClass::Skip(SkipReason::CommentCrnPattern));
    }

    #[test]
    fn empty_row_is_noise() {
        assert_eq!(
            classify("<table><tr></tr></table>"),
            RowClass::Skip(SkipReason::TooFewCells)
        );
    }
}
