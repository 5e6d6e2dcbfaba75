use crate::infra::{parse_date, today, Board};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use job_board::accounts::{AccountId, Actor};
use job_board::clock::FixedClock;
use job_board::config::BoardConfig;
use job_board::documents::{DocumentKind, DocumentRef};
use job_board::error::AppError;
use job_board::notifications::NotificationFeed;
use job_board::postings::{
    filter_jobs, CatalogImporter, DescriptionForm, FilterCriteria, JobPosting, JobPostForm,
    SalaryBound, SalaryForm,
};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    /// CSV export with one job posting per row
    #[arg(long)]
    pub(crate) catalog: PathBuf,
    /// Case-insensitive substring of the job title
    #[arg(long)]
    pub(crate) keyword: Option<String>,
    /// Exact category tag
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Exact location
    #[arg(long)]
    pub(crate) location: Option<String>,
    /// full-time, part-time, internship or freelance
    #[arg(long = "type")]
    pub(crate) job_type: Option<String>,
    /// onsite, remote or hybrid
    #[arg(long)]
    pub(crate) arrangement: Option<String>,
    /// Minimum acceptable salary floor
    #[arg(long)]
    pub(crate) min_salary: Option<String>,
    /// Maximum acceptable salary ceiling
    #[arg(long)]
    pub(crate) max_salary: Option<String>,
    /// today, 3days, 5days, week or 2weeks
    #[arg(long)]
    pub(crate) date_post: Option<String>,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Also list drafts and postings past their deadline
    #[arg(long)]
    pub(crate) include_closed: bool,
}

impl SearchArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            keyword: self.keyword.clone(),
            job_category: self.category.clone(),
            location: self.location.clone(),
            job_type: self.job_type.clone(),
            job_arrangement: self.arrangement.clone(),
            min_salary: self.min_salary.as_deref().and_then(SalaryBound::coerce),
            max_salary: self.max_salary.as_deref().and_then(SalaryBound::coerce),
            date_post: self.date_post.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Date the demo runs on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Statuses to apply in order
    #[arg(long = "status", default_values = ["reviewed", "interview", "offered"])]
    pub(crate) statuses: Vec<String>,
}

fn at_noon(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)) + Duration::hours(12)
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(today);
    let now = at_noon(today);
    let criteria = args.criteria();

    let import = CatalogImporter::from_path(&args.catalog, AccountId(0), now)?;
    for rejected in &import.rejected {
        eprintln!("skipped {rejected}");
    }

    let postings: Vec<JobPosting> = import
        .into_postings()
        .into_iter()
        .filter(|posting| args.include_closed || posting.is_open(today))
        .collect();
    let matches = filter_jobs(&postings, &criteria, now);

    println!(
        "{} of {} postings match ({})",
        matches.len(),
        postings.len(),
        args.catalog.display()
    );
    for posting in &matches {
        render_posting(posting, today);
    }
    Ok(())
}

fn render_posting(posting: &JobPosting, today: NaiveDate) {
    println!(
        "  #{:<4} {:<32} {:<14} {:<10} {:<7} {:>7}-{:<7} deadline {} [{}]",
        posting.id,
        posting.title,
        posting.location,
        posting.employment_type.label(),
        posting.arrangement.label(),
        posting.salary.min,
        posting.salary.max,
        posting.deadline.date_naive(),
        posting.status(today).label()
    );
}

fn step<T, E: Display>(label: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            println!("  {label}: {err}");
            None
        }
    }
}

fn demo_form(today: NaiveDate) -> JobPostForm {
    JobPostForm {
        title: Some("Graphic Designer".to_string()),
        category: vec!["Design".to_string(), "Marketing".to_string()],
        location: Some("Bangkok".to_string()),
        job_type: Some("internship".to_string()),
        arrangement: Some("onsite".to_string()),
        salary: Some(SalaryForm {
            min: Some(30000.0),
            max: Some(60000.0),
        }),
        deadline: Some((today + Duration::days(30)).to_string()),
        skills: vec!["Figma".to_string(), "Illustrator".to_string()],
        description: DescriptionForm {
            overview: Some("Support the brand team on campaign visuals".to_string()),
            responsibility: Some("Produce social and print assets".to_string()),
            requirement: Some("Portfolio with recent work".to_string()),
            qualification: Some("Design or communication student".to_string()),
        },
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(today);
    let board = Board::in_memory(&BoardConfig::default(), Arc::new(FixedClock(at_noon(today))))?;
    let company = Actor::company(1);
    let rival = Actor::company(3);
    let student = Actor::student(2);

    println!("Job board demo ({today})");

    let Some(posting) = step(
        "posting rejected",
        board.postings.create(&company, demo_form(today), true),
    ) else {
        return Ok(());
    };
    println!("\nCompany {} published:", company.account_id);
    render_posting(&posting, today);

    let criteria = FilterCriteria {
        keyword: Some("designer".to_string()),
        location: Some("Bangkok".to_string()),
        date_post: Some("today".to_string()),
        ..FilterCriteria::default()
    };
    if let Some(found) = step("search failed", board.postings.search(&criteria)) {
        println!("\nSearch for designers in Bangkok posted today: {} match", found.len());
    }

    let mut documents = Vec::new();
    if let Some(receipt) = step(
        "resume rejected",
        board.documents.upload(
            &student,
            DocumentKind::Resume,
            mime::APPLICATION_PDF,
            b"%PDF-1.7 demo resume".to_vec(),
        ),
    ) {
        println!(
            "\nStudent {} uploaded {} ({} bytes), link valid until {}",
            student.account_id, receipt.document.key, receipt.document.size, receipt.link.expires_at
        );
        documents.push(DocumentRef {
            key: receipt.document.key,
            kind: receipt.document.kind,
        });
    }

    let Some(application) = step(
        "submission rejected",
        board.applications.submit(&student, posting.id, documents),
    ) else {
        return Ok(());
    };
    println!(
        "Application #{} submitted with status {}",
        application.id, application.status
    );

    println!("\nStatus pipeline");
    step(
        "company 3 attempt refused",
        board
            .applications
            .update_status(application.id, "interview", &rival),
    );
    for status in &args.statuses {
        if let Some(record) = step(
            &format!("move to {status} refused"),
            board
                .applications
                .update_status(application.id, status, &company),
        ) {
            println!(
                "  -> {} (next: {})",
                record.status,
                record.status_view().next_statuses.join(", ")
            );
        }
    }

    for (label, actor) in [("Student", student), ("Company", company)] {
        if let Some(feed) = step(
            "feed unavailable",
            board.notifications.for_recipient(actor.account_id),
        ) {
            println!("\n{label} {} notifications", actor.account_id);
            for notification in feed {
                println!("  [{}] {}", notification.id, notification.message);
            }
        }
    }

    Ok(())
}
