mod db;
mod fetcher;
mod parser;
mod subjects;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vt_scraper", about = "Virginia Tech timetable course scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the subject-code queue
    Init,
    /// Fetch timetable HTML for unvisited subjects
    Fetch {
        /// Max subjects to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Term/year request parameter, e.g. 202509 for Fall 2025
        #[arg(short, long, default_value = "202509")]
        term: String,
    },
    /// Parse fetched documents into course records
    Parse {
        /// Max documents to parse (default: all unparsed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch + parse in one pipeline
    Run {
        /// Max subjects to fetch+parse
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Term/year request parameter, e.g. 202509 for Fall 2025
        #[arg(short, long, default_value = "202509")]
        term: String,
    },
    /// Write every parsed course to a flat JSON list
    Export {
        #[arg(short, long, default_value = "courses.json")]
        output: PathBuf,
    },
    /// Show pipeline statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let inserted = db::insert_subjects(&conn, subjects::SUBJECT_CODES)?;
            println!(
                "Inserted {} new subject codes ({} total known)",
                inserted,
                subjects::SUBJECT_CODES.len()
            );
            Ok(())
        }
        Commands::Fetch { limit, term } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let queue = db::fetch_unvisited(&conn, limit)?;
            if queue.is_empty() {
                println!("No unvisited subjects. Run 'init' first or all subjects are fetched.");
                return Ok(());
            }
            println!("Fetching {} subjects (streaming to DB)...", queue.len());
            let stats = fetcher::fetch_subjects_streaming(&conn, queue, &term).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Parse { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let docs = db::fetch_unparsed(&conn, limit)?;
            if docs.is_empty() {
                println!("No unparsed documents. Run 'fetch' first.");
                return Ok(());
            }
            println!("Parsing {} documents...", docs.len());
            let counts = parse_documents(&conn, &docs)?;
            counts.print();
            Ok(())
        }
        Commands::Run { limit, term } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let queue = db::fetch_unvisited(&conn, limit)?;
            if queue.is_empty() {
                println!("No unvisited subjects. Run 'init' first.");
                return Ok(());
            }

            // Phase 1: Fetch (streaming to DB)
            let t_fetch = Instant::now();
            println!("Pipeline: fetching {} subjects (streaming to DB)...", queue.len());
            let stats = fetcher::fetch_subjects_streaming(&conn, queue, &term).await?;
            println!(
                "Fetched {} subjects ({} ok, {} errors) in {:.1}s",
                stats.total, stats.ok, stats.errors, t_fetch.elapsed().as_secs_f64()
            );

            // Phase 2: Parse
            let t_parse = Instant::now();
            let docs = db::fetch_unparsed(&conn, None)?;
            if docs.is_empty() {
                println!("Nothing to parse (all fetches failed).");
                return Ok(());
            }
            println!("Parsing {} documents...", docs.len());
            let counts = parse_documents(&conn, &docs)?;
            println!("Parsed in {:.1}s", t_parse.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Export { output } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let courses = db::fetch_all_courses(&conn)?;
            let file = std::fs::File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), &courses)?;
            println!("Wrote {} courses to {}", courses.len(), output.display());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Subjects:     {}", s.subjects);
            println!("Visited:      {}", s.visited);
            println!("Unvisited:    {}", s.unvisited);
            println!("Documents:    {}", s.documents);
            println!("Fetch errors: {}", s.fetch_errors);
            println!("Parsed docs:  {}", s.parsed);
            println!("Courses:      {}", s.courses);
            println!("Commented:    {}", s.commented);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

#[derive(Default)]
struct ParseCounts {
    courses: usize,
    tally: parser::SkipTally,
}

impl ParseCounts {
    fn print(&self) {
        println!(
            "Saved {} courses ({} comments attached, {} unmatched).",
            self.courses, self.tally.comments_attached, self.tally.comments_unmatched,
        );
        println!(
            "Skipped rows: {} filler, {} bad course code, {} bad comment CRN, {} empty key fields.",
            self.tally.noise_rows,
            self.tally.bad_course_code,
            self.tally.bad_comment_crn,
            self.tally.empty_key_fields,
        );
    }
}

/// Parse documents in parallel (subjects are independent), then save in
/// queue order so course ids reproduce the encounter order.
fn parse_documents(
    conn: &rusqlite::Connection,
    docs: &[db::RawDocument],
) -> anyhow::Result<ParseCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ParseCounts::default();

    for chunk in docs.chunks(50) {
        let parsed: Vec<_> = chunk
            .par_iter()
            .map(|d| parser::parse_document(&d.subject_code, &d.html))
            .collect();

        let batches: Vec<(i64, &parser::ParsedDocument)> = chunk
            .iter()
            .zip(&parsed)
            .map(|(d, p)| (d.html_id, p))
            .collect();
        db::save_parsed(conn, &batches)?;

        for p in &parsed {
            counts.courses += p.records.len();
            counts.tally.merge(&p.tally);
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
