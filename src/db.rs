use anyhow::Result;
use rusqlite::Connection;

use crate::parser::records::CourseRecord;
use crate::parser::ParsedDocument;

const DB_PATH: &str = "data/timetable.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS subjects (
            code       TEXT PRIMARY KEY,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_subjects_visited ON subjects(visited);

        -- Raw response bodies, one row per fetch attempt, keyed by subject.
        CREATE TABLE IF NOT EXISTS subject_html (
            id           INTEGER PRIMARY KEY,
            subject_code TEXT NOT NULL REFERENCES subjects(code),
            html         TEXT,
            status       INTEGER,
            error        TEXT,
            latency_ms   INTEGER,
            parsed       BOOLEAN NOT NULL DEFAULT 0,
            fetched_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_subject_html_code ON subject_html(subject_code);
        CREATE INDEX IF NOT EXISTS idx_subject_html_parsed ON subject_html(parsed);

        -- Extracted records; id order is document order within and across
        -- subjects, which export relies on.
        CREATE TABLE IF NOT EXISTS courses (
            id            INTEGER PRIMARY KEY,
            subject_code  TEXT NOT NULL REFERENCES subjects(code),
            crn           TEXT NOT NULL,
            subject       TEXT NOT NULL,
            course_number TEXT NOT NULL,
            title         TEXT NOT NULL,
            modality      TEXT NOT NULL,
            credit_hours  TEXT NOT NULL,
            capacity      INTEGER NOT NULL DEFAULT 0,
            instructor    TEXT NOT NULL,
            days          TEXT NOT NULL,
            begin_time    TEXT NOT NULL,
            end_time      TEXT NOT NULL,
            location      TEXT NOT NULL,
            comments      TEXT NOT NULL DEFAULT '',
            parsed_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_courses_subject ON courses(subject_code);
        CREATE INDEX IF NOT EXISTS idx_courses_crn ON courses(crn);
        ",
    )?;
    Ok(())
}

// ── Queue ──

pub fn insert_subjects(conn: &Connection, codes: &[&str]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO subjects (code) VALUES (?1)")?;
        for code in codes {
            count += stmt.execute(rusqlite::params![code])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<String>> {
    let sql = match limit {
        Some(n) => format!(
            "SELECT code FROM subjects WHERE visited = 0 ORDER BY code LIMIT {}",
            n
        ),
        None => "SELECT code FROM subjects WHERE visited = 0 ORDER BY code".to_string(),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Fetching ──

pub struct FetchRow {
    pub subject_code: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Parsing ──

pub struct RawDocument {
    pub html_id: i64,
    pub subject_code: String,
    pub html: String,
}

pub fn fetch_unparsed(conn: &Connection, limit: Option<usize>) -> Result<Vec<RawDocument>> {
    let sql = format!(
        "SELECT id, subject_code, html FROM subject_html
         WHERE html IS NOT NULL AND parsed = 0
         ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RawDocument {
                html_id: row.get(0)?,
                subject_code: row.get(1)?,
                html: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn save_parsed(conn: &Connection, batches: &[(i64, &ParsedDocument)]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO courses
             (subject_code, crn, subject, course_number, title, modality, credit_hours,
              capacity, instructor, days, begin_time, end_time, location, comments)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
        )?;
        let mut mark = tx.prepare("UPDATE subject_html SET parsed = 1 WHERE id = ?1")?;
        for (html_id, doc) in batches {
            for r in &doc.records {
                insert.execute(rusqlite::params![
                    doc.subject_code,
                    r.crn,
                    r.subject,
                    r.course_number,
                    r.title,
                    r.modality,
                    r.credit_hours,
                    r.capacity,
                    r.instructor,
                    r.days,
                    r.begin_time,
                    r.end_time,
                    r.location,
                    r.comments,
                ])?;
            }
            mark.execute(rusqlite::params![html_id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Export ──

pub fn fetch_all_courses(conn: &Connection) -> Result<Vec<CourseRecord>> {
    let mut stmt = conn.prepare(
        "SELECT crn, subject, course_number, title, modality, credit_hours,
                capacity, instructor, days, begin_time, end_time, location, comments
         FROM courses ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CourseRecord {
                crn: row.get(0)?,
                subject: row.get(1)?,
                course_number: row.get(2)?,
                title: row.get(3)?,
                modality: row.get(4)?,
                credit_hours: row.get(5)?,
                capacity: row.get(6)?,
                instructor: row.get(7)?,
                days: row.get(8)?,
                begin_time: row.get(9)?,
                end_time: row.get(10)?,
                location: row.get(11)?,
                comments: row.get(12)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub subjects: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub documents: usize,
    pub fetch_errors: usize,
    pub parsed: usize,
    pub courses: usize,
    pub commented: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> {
        Ok(conn.query_row(sql, [], |row| row.get::<_, i64>(0))? as usize)
    };
    Ok(Stats {
        subjects: count("SELECT COUNT(*) FROM subjects")?,
        visited: count("SELECT COUNT(*) FROM subjects WHERE visited = 1")?,
        unvisited: count("SELECT COUNT(*) FROM subjects WHERE visited = 0")?,
        documents: count("SELECT COUNT(*) FROM subject_html WHERE html IS NOT NULL")?,
        fetch_errors: count("SELECT COUNT(*) FROM subject_html WHERE error IS NOT NULL")?,
        parsed: count("SELECT COUNT(*) FROM subject_html WHERE parsed = 1")?,
        courses: count("SELECT COUNT(*) FROM courses")?,
        commented: count("SELECT COUNT(*) FROM courses WHERE comments != ''")?,
    })
}
