use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::FetchRow;

const ENDPOINT: &str = "https://selfservice.banner.vt.edu/ssb/HZSKVTSC.P_ProcRequest";
const USER_AGENT: &str = "Mozilla/5.0";

// One request per subject with a fixed gap; the portal has no documented
// rate limit and this keeps us well under anything plausible.
const REQUEST_DELAY: Duration = Duration::from_millis(1000);

/// Fetch stats returned after completion.
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch subjects sequentially, saving each response to DB as it arrives.
/// A failed request is recorded as an error row and the subject still
/// marked visited; nothing is retried.
pub async fn fetch_subjects_streaming(
    conn: &Connection,
    subjects: Vec<String>,
    term: &str,
) -> Result<FetchStats> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let total = subjects.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Prepare statements once, reuse for each row
    let mut insert_stmt = conn.prepare(
        "INSERT INTO subject_html (subject_code, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut update_stmt = conn.prepare(
        "UPDATE subjects SET visited = 1, visited_at = datetime('now') WHERE code = ?1",
    )?;

    let mut ok = 0usize;
    let mut errors = 0usize;

    for (i, code) in subjects.iter().enumerate() {
        let row = fetch_one(&client, code, term).await;
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }

        save_one(&mut insert_stmt, &mut update_stmt, &row)?;
        pb.inc(1);

        if i + 1 < total {
            tokio::time::sleep(REQUEST_DELAY).await;
        }
    }

    pb.finish_and_clear();
    info!("Fetched {} subjects ({} ok, {} errors)", total, ok, errors);

    Ok(FetchStats { total, ok, errors })
}

/// Save a single fetch result to DB using pre-prepared statements.
fn save_one(
    insert: &mut rusqlite::Statement,
    update: &mut rusqlite::Statement,
    row: &FetchRow,
) -> Result<()> {
    insert.execute(rusqlite::params![
        row.subject_code,
        row.html,
        row.status,
        row.error,
        row.latency_ms,
    ])?;
    update.execute(rusqlite::params![row.subject_code])?;
    Ok(())
}

async fn fetch_one(client: &reqwest::Client, code: &str, term: &str) -> FetchRow {
    // Form fields the portal's "FIND class sections" button submits.
    let form = [
        ("CAMPUS", "0"),
        ("TERMYEAR", term),
        ("CORE_CODE", "AR%"),
        ("subj_code", code),
        ("SCHDTYPE", "%"),
        ("CRSE_NUMBER", ""),
        ("crn", ""),
        ("open_only", ""),
        ("disp_comments_in", "Y"),
        ("sess_code", "%"),
        ("BTN_PRESSED", "FIND class sections"),
        ("inst_name", ""),
    ];

    let start = Instant::now();
    let response = client.post(ENDPOINT).form(&form).send().await;
    let elapsed = start.elapsed().as_millis() as i64;

    match response {
        Ok(resp) => {
            let status = resp.status().as_u16() as i32;
            match resp.text().await {
                Ok(body) if (200..300).contains(&status) => FetchRow {
                    subject_code: code.to_string(),
                    html: Some(body),
                    status: Some(status),
                    error: None,
                    latency_ms: Some(elapsed),
                },
                Ok(_) => {
                    warn!("{}: HTTP {}", code, status);
                    FetchRow {
                        subject_code: code.to_string(),
                        html: None,
                        status: Some(status),
                        error: Some(format!("HTTP {}", status)),
                        latency_ms: Some(elapsed),
                    }
                }
                Err(e) => {
                    warn!("{}: failed reading body: {}", code, e);
                    FetchRow {
                        subject_code: code.to_string(),
                        html: None,
                        status: Some(status),
                        error: Some(e.to_string()),
                        latency_ms: Some(elapsed),
                    }
                }
            }
        }
        Err(e) => {
            warn!("{}: request failed: {}", code, e);
            FetchRow {
                subject_code: code.to_string(),
                html: None,
                status: None,
                error: Some(e.to_string()),
                latency_ms: Some(elapsed),
            }
        }
    }
}
