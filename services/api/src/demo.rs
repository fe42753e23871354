use chrono::{Duration, Utc};
use clap::Args;
use job_board::board::{
    ApplicationRequest, ApplicationStatus, ApplicationWorkflow, BoardError, InMemoryStore,
    JobDetails, JobService, SignupRequest, UserDirectory,
};
use job_board::error::AppError;
use job_board::identity::{Caller, Provider, Role, Seeker, TokenKeys};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Title of the posting the demo provider creates.
    #[arg(long, default_value = "Backend Engineer")]
    pub(crate) job_title: String,
    /// Print the provider dashboard as JSON at the end of the walkthrough.
    #[arg(long)]
    pub(crate) json: bool,
}

struct DemoBoard {
    jobs: JobService<InMemoryStore>,
    workflow: ApplicationWorkflow<InMemoryStore>,
    users: UserDirectory<InMemoryStore>,
}

impl DemoBoard {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let keys = Arc::new(TokenKeys::from_secret(
            b"job-board-demo",
            Duration::minutes(15),
        ));
        Self {
            jobs: JobService::new(store.clone()),
            workflow: ApplicationWorkflow::new(store.clone()),
            users: UserDirectory::new(store, keys),
        }
    }

    fn sign_up(&self, email: &str, first_name: &str, role: Role) -> Result<Caller, BoardError> {
        let response = self.users.register(SignupRequest {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: "Demo".to_string(),
            role,
        })?;
        Ok(Caller::new(response.user.id, response.user.role))
    }
}

fn outcome<T>(label: &str, result: Result<T, BoardError>) -> Option<T> {
    match result {
        Ok(value) => {
            println!("  {label}: ok");
            Some(value)
        }
        Err(err) => {
            println!("  {label}: rejected ({:?}) {err}", err.kind());
            None
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { job_title, json } = args;
    let board = DemoBoard::new();

    println!("Job board demo");
    let provider: Provider = board
        .sign_up("hiring@acme.test", "Pat", Role::JobProvider)?
        .provider()
        .map_err(BoardError::from)?;
    let seeker: Seeker = board
        .sign_up("sam@mail.test", "Sam", Role::JobSeeker)?
        .seeker()
        .map_err(BoardError::from)?;
    let bystander = board.sign_up("alex@mail.test", "Alex", Role::JobSeeker)?;

    let job = board.jobs.create(
        provider,
        JobDetails {
            title: job_title,
            description: "Design and operate the hiring platform APIs".to_string(),
            company: Some("Acme".to_string()),
            location: Some("Remote".to_string()),
            salary: Some(Decimal::new(95_000, 0)),
            job_type: Some("FULL_TIME".to_string()),
            experience_level: Some("SENIOR".to_string()),
        },
    )?;
    println!(
        "Posted job #{} \"{}\" (active: {})",
        job.id, job.title, job.is_active
    );

    println!("\nSubmitting an application");
    let application = board.workflow.submit(
        seeker,
        ApplicationRequest::new(job.id).with_cover_letter("I am interested"),
    )?;
    println!(
        "  Application #{} is {} (applied at {})",
        application.id,
        application.status,
        application.applied_at.format("%Y-%m-%d %H:%M:%S")
    );
    outcome(
        "Second submission to the same job",
        board
            .workflow
            .submit(seeker, ApplicationRequest::new(job.id)),
    );

    println!("\nAdjudication and withdrawal");
    outcome(
        "Provider shortlists",
        board
            .workflow
            .update_status(provider, application.id, ApplicationStatus::Shortlisted),
    );
    outcome(
        "Seeker withdraws",
        board.workflow.withdraw(seeker, application.id),
    );
    outcome(
        "Provider offers after withdrawal",
        board
            .workflow
            .update_status(provider, application.id, ApplicationStatus::Offered),
    );

    println!("\nVisibility");
    outcome(
        "Unrelated seeker views the application",
        board.workflow.view(bystander, application.id),
    );
    outcome(
        "Applicant views the application",
        board.workflow.view(Caller::from(seeker), application.id),
    );

    println!("\nInactive postings");
    board.jobs.delete(provider, job.id)?;
    let late_applicant = bystander.seeker().map_err(BoardError::from)?;
    outcome(
        "Applying to a deactivated job",
        board
            .workflow
            .submit(late_applicant, ApplicationRequest::new(job.id)),
    );

    let stats = board.workflow.dashboard(Caller::from(provider))?;
    println!(
        "\nProvider dashboard: {} application(s) as of {}",
        stats.total_applications,
        Utc::now().format("%Y-%m-%d")
    );
    for (status, count) in stats.applications_by_status.iter().filter(|(_, n)| **n > 0) {
        println!("  {status}: {count}");
    }

    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Dashboard payload unavailable: {err}"),
        }
    }

    Ok(())
}
