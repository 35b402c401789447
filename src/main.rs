use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use timesheet::config::{BackendKind, Config, open_store};
use timesheet::dates::parse_date;
use timesheet::grouping::{PayPeriodGroup, StatusFilter};
use timesheet::models::{EntryForm, ProjectForm, TimeEntry, UserForm};
use timesheet::store::Store;
use timesheet::{Timesheet, TimesheetError};

#[derive(Parser, Debug)]
#[command(name = "timesheet", version, about = "Timesheet entries and pay-period approvals")]
struct Cli {
    /// Id of the user performing the command
    #[arg(long = "as", env = "TIMESHEET_USER", global = true)]
    caller: Option<String>,

    /// JSON data file (forces file storage)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage your own time entries
    #[command(subcommand)]
    Entries(EntriesCommand),
    /// Approve a single entry
    Approve { id: String },
    /// Reject a single entry
    Reject { id: String },
    /// Approve every submitted entry among the given ids
    BulkApprove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Approve a user's submitted entries for one week
    ApprovePeriod {
        user: String,
        /// Any date inside the week
        #[arg(long)]
        week: String,
    },
    /// List every entry with its owner
    AllEntries,
    /// Show all users' pay periods
    Periods {
        /// Any date inside the week to show; all weeks when omitted
        #[arg(long)]
        week: Option<String>,
        /// all, draft, submitted, approved or rejected
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Pay periods waiting for approval
    Pending,
    /// Your own pay periods
    MyPeriods,
    /// Hour and entry totals per user
    Overview,
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Projects(ProjectsCommand),
    /// Create the first admin account
    InitAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum EntriesCommand {
    #[command(alias = "ls")]
    List,
    Show { id: String },
    Add {
        #[arg(long)]
        date: String,
        #[arg(long)]
        hours: String,
        #[arg(long)]
        project: String,
        #[arg(long)]
        description: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        hours: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    #[command(alias = "rm")]
    Delete { id: String },
    Submit { id: String },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    #[command(alias = "ls")]
    List,
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// employee, contractor or admin
        #[arg(long)]
        role: Option<String>,
    },
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum ProjectsCommand {
    #[command(alias = "ls")]
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

const DEFAULT_LOG_LEVEL: &str = "warn";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(path) = cli.data.clone() {
        config.backend = Some(BackendKind::Json);
        config.data_path = Some(path);
    }
    init_logging(log_directive(
        cli.log_level.as_deref(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        config.log_level.as_deref(),
    ));

    let store = match open_store(&config) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let app = Timesheet::new(store);

    match run(&cli, &app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

// --log-level, then RUST_LOG, then the config file, then warn.
fn log_directive<'a>(
    flag: Option<&'a str>,
    env: Option<&'a str>,
    config: Option<&'a str>,
) -> &'a str {
    [flag, env, config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|level| !level.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

fn init_logging(directive: &str) {
    let filter =
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn caller(cli: &Cli) -> Result<&str, TimesheetError> {
    cli.caller.as_deref().ok_or_else(|| {
        TimesheetError::Unauthenticated("No user given. Pass --as <USER_ID>.".to_string())
    })
}

fn run<S: Store>(cli: &Cli, app: &Timesheet<S>) -> Result<(), TimesheetError> {
    match &cli.command {
        Command::Entries(command) => run_entries(cli, app, command),
        Command::Approve { id } => {
            let entry = app.approve_entry(caller(cli)?, id)?;
            emit(cli, &entry, || println!("Approved {}", entry_line(&entry)));
            Ok(())
        }
        Command::Reject { id } => {
            let entry = app.reject_entry(caller(cli)?, id)?;
            emit(cli, &entry, || println!("Rejected {}", entry_line(&entry)));
            Ok(())
        }
        Command::BulkApprove { ids } => {
            let result = app.bulk_approve(caller(cli)?, ids)?;
            emit(cli, &result, || {
                println!("{}", result.message);
                for error in &result.errors {
                    println!("  {}: {}", error.entry_id, error.error);
                }
            });
            Ok(())
        }
        Command::ApprovePeriod { user, week } => {
            let date = parse_date(week).map_err(TimesheetError::Validation)?;
            let result = app.approve_pay_period(caller(cli)?, user, date)?;
            emit(cli, &result, || {
                println!("{}", result.message);
                for error in &result.errors {
                    println!("  {}: {}", error.entry_id, error.error);
                }
            });
            Ok(())
        }
        Command::AllEntries => {
            let entries = app.list_all_entries(caller(cli)?)?;
            emit(cli, &entries, || {
                for item in &entries {
                    println!("{} [{}]", entry_line(&item.entry), item.user_name);
                }
            });
            Ok(())
        }
        Command::Periods { week, status } => {
            let filter: StatusFilter = status.parse().map_err(TimesheetError::Validation)?;
            let groups = match week {
                Some(week) => {
                    let date = parse_date(week).map_err(TimesheetError::Validation)?;
                    app.pay_period(caller(cli)?, date, filter)?
                }
                None => app.all_pay_periods(caller(cli)?, filter)?,
            };
            print_groups(cli, &groups);
            Ok(())
        }
        Command::Pending => {
            let groups = app.pending_pay_periods(caller(cli)?)?;
            print_groups(cli, &groups);
            Ok(())
        }
        Command::MyPeriods => {
            let groups = app.my_pay_periods(caller(cli)?)?;
            print_groups(cli, &groups);
            Ok(())
        }
        Command::Overview => {
            let overview = app.overview(caller(cli)?)?;
            emit(cli, &overview, || {
                println!(
                    "{} users, {} entries, {:.2}h total",
                    overview.total_users, overview.total_entries, overview.total_hours
                );
                for user in &overview.by_user {
                    println!("• {} ({:.2}h, {} entries)", user.name, user.hours, user.entries);
                }
            });
            Ok(())
        }
        Command::Users(command) => run_users(cli, app, command),
        Command::Projects(command) => run_projects(cli, app, command),
        Command::InitAdmin { email, name } => {
            let user = app.bootstrap_admin(&UserForm {
                email: Some(email.clone()),
                name: Some(name.clone()),
                role: None,
            })?;
            emit(cli, &user, || println!("Created admin {} ({})", user.name, user.id));
            Ok(())
        }
    }
}

fn run_entries<S: Store>(
    cli: &Cli,
    app: &Timesheet<S>,
    command: &EntriesCommand,
) -> Result<(), TimesheetError> {
    let caller = caller(cli)?;
    match command {
        EntriesCommand::List => {
            let entries = app.list_own_entries(caller)?;
            emit(cli, &entries, || {
                for entry in &entries {
                    println!("{}", entry_line(entry));
                }
            });
        }
        EntriesCommand::Show { id } => {
            let entry = app.get_entry(caller, id)?;
            emit(cli, &entry, || println!("{}", entry_line(&entry)));
        }
        EntriesCommand::Add {
            date,
            hours,
            project,
            description,
        } => {
            let form = EntryForm {
                date: Some(date.clone()),
                hours: Some(hours.clone()),
                project: Some(project.clone()),
                description: description.clone(),
            };
            let entry = app.create_entry(caller, &form)?;
            emit(cli, &entry, || println!("Created {}", entry_line(&entry)));
        }
        EntriesCommand::Edit {
            id,
            date,
            hours,
            project,
            description,
        } => {
            let form = EntryForm {
                date: date.clone(),
                hours: hours.clone(),
                project: project.clone(),
                description: description.clone(),
            };
            let entry = app.update_entry(caller, id, &form)?;
            emit(cli, &entry, || println!("Updated {}", entry_line(&entry)));
        }
        EntriesCommand::Delete { id } => {
            app.delete_entry(caller, id)?;
            emit(cli, &serde_json::json!({ "success": true }), || {
                println!("Deleted {id}")
            });
        }
        EntriesCommand::Submit { id } => {
            let entry = app.submit_entry(caller, id)?;
            emit(cli, &entry, || println!("Submitted {}", entry_line(&entry)));
        }
    }
    Ok(())
}

fn run_users<S: Store>(
    cli: &Cli,
    app: &Timesheet<S>,
    command: &UsersCommand,
) -> Result<(), TimesheetError> {
    let caller = caller(cli)?;
    match command {
        UsersCommand::List => {
            let users = app.list_users(caller)?;
            emit(cli, &users, || {
                for user in &users {
                    println!("{}  {} <{}> [{}]", user.id, user.name, user.email, user.role);
                }
            });
        }
        UsersCommand::Add { email, name, role } => {
            let user = app.create_user(
                caller,
                &UserForm {
                    email: Some(email.clone()),
                    name: Some(name.clone()),
                    role: role.clone(),
                },
            )?;
            emit(cli, &user, || println!("Created user {} ({})", user.name, user.id));
        }
        UsersCommand::Delete { id } => {
            let deleted = app.delete_user(caller, id)?;
            emit(cli, &deleted, || println!("{}", deleted.message));
        }
    }
    Ok(())
}

fn run_projects<S: Store>(
    cli: &Cli,
    app: &Timesheet<S>,
    command: &ProjectsCommand,
) -> Result<(), TimesheetError> {
    let caller = caller(cli)?;
    match command {
        ProjectsCommand::List => {
            let projects = app.list_projects(caller)?;
            emit(cli, &projects, || {
                for project in &projects {
                    match &project.description {
                        Some(description) => println!("• {}: {}", project.name, description),
                        None => println!("• {}", project.name),
                    }
                }
            });
        }
        ProjectsCommand::Add { name, description } => {
            let project = app.create_project(
                caller,
                &ProjectForm {
                    name: Some(name.clone()),
                    description: description.clone(),
                },
            )?;
            emit(cli, &project, || println!("Created project {}", project.name));
        }
    }
    Ok(())
}

fn emit<T: Serialize>(cli: &Cli, value: &T, text: impl FnOnce()) {
    if !cli.json {
        text();
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("error: {err}"),
    }
}

fn entry_line(entry: &TimeEntry) -> String {
    let mut line = format!(
        "{}  {}  {:>5.2}h  {}  ({})",
        entry.id, entry.date, entry.hours, entry.project, entry.status
    );
    if !entry.description.is_empty() {
        line.push_str(&format!("  {}", entry.description));
    }
    line
}

fn print_groups(cli: &Cli, groups: &[PayPeriodGroup]) {
    emit(cli, &groups, || {
        if groups.is_empty() {
            println!("No pay periods.");
        }
        for group in groups {
            println!(
                "{}  {} ({:.2}h)",
                group.period().label(),
                group.user_name,
                group.total_hours
            );
            let days: Vec<String> = group
                .days
                .iter()
                .zip(group.per_day_hours())
                .map(|(day, hours)| format!("{} {:.2}", day.date.format("%a"), hours))
                .collect();
            println!("  {}", days.join(" | "));
        }
    });
}
