use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info};
use std::env;
use std::fs;
use std::path::PathBuf;

use sendplan::config::{GlobalConfig, load_config};
use sendplan::domain::{Caller, NewCandidate, PlanStatus, Role, User};
use sendplan::manager::PlanManager;
use sendplan::views::AssignmentView;

mod cli;

use cli::Cli;
use cli::commands::{CandidateCommands, Commands, QuotaCommands, UserCommands};

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

fn rust_log_set() -> bool {
    env::var_os("RUST_LOG").is_some()
}

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sendplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("sendplan.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // Without RUST_LOG the logger passes everything and log's max level gates it
    let mut builder = env_logger::Builder::new();
    if rust_log_set() {
        builder.parse_default_env();
    } else {
        builder.filter_level(LevelFilter::Trace);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    if !rust_log_set() {
        log::set_max_level(DEFAULT_LOG_LEVEL);
    }

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Apply the configured level once config is loaded. RUST_LOG wins.
fn apply_log_level(level: Option<&str>) -> Result<()> {
    if rust_log_set() {
        return Ok(());
    }
    if let Some(level) = level {
        let filter: LevelFilter = level.parse().context(format!("Invalid log level '{}'", level))?;
        log::set_max_level(filter);
        info!("Log level set to {}", filter);
    }
    Ok(())
}

fn run_application(cli: &Cli, config: &GlobalConfig) -> Result<()> {
    info!("Starting application");

    let mut manager = PlanManager::open(config).context("Failed to open plan database")?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
        if let Some(path) = manager.store().path() {
            println!("  Database: {}", path.display());
        }
    }
    let caller = manager.caller_for(cli.as_user.as_deref())?;

    match &cli.command {
        None => handle_range_command(&mut manager, None, None, &caller, cli.json),
        Some(Commands::Range { start, days }) => handle_range_command(&mut manager, *start, *days, &caller, cli.json),
        Some(Commands::Day { date }) => {
            let day = manager.day_plan(*date, &caller)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&day)?);
            } else {
                println!("{} {}", "Day:".green().bold(), day.date);
                print_items(&day.items);
            }
            Ok(())
        }
        Some(Commands::Week { start }) => {
            let week = manager.week_plan(*start, &caller)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&week)?);
            } else {
                println!("{} {} .. {}", "Week:".green().bold(), week.start, week.end);
                print_items(&week.items);
            }
            Ok(())
        }
        Some(Commands::Status { id, status }) => {
            let status = manager.set_status(*id, status, &caller)?;
            println!("{} assignment {} is now {}", "Updated:".green(), id, status_label(status));
            Ok(())
        }
        Some(Commands::Quota { command }) => handle_quota_command(command, &manager, &caller, cli.json),
        Some(Commands::User { command }) => handle_user_command(command, &manager, &caller, cli.json),
        Some(Commands::Candidate { command }) => handle_candidate_command(command, &manager, &caller, cli.json),
    }
}

fn handle_range_command(
    manager: &mut PlanManager,
    start: Option<chrono::NaiveDate>,
    days: Option<usize>,
    caller: &Caller,
    json: bool,
) -> Result<()> {
    info!("Refreshing range plan - start: {:?}, days: {:?}", start, days);
    let plan = manager.refresh_range(start, days, caller)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if plan.no_senders {
        println!("{}", "No senders registered; nothing was scheduled.".yellow());
    }

    let dates: Vec<String> = plan.dates.iter().map(|d| d.to_string()).collect();
    println!("{} {}", "Window:".green().bold(), dates.join(", "));
    print_items(&plan.items);

    if plan.deferred > 0 {
        println!(
            "{} {} pending assignments could not be placed yet; they will be retried next run",
            "Deferred:".yellow(),
            plan.deferred
        );
    }
    Ok(())
}

fn handle_quota_command(command: &QuotaCommands, manager: &PlanManager, caller: &Caller, json: bool) -> Result<()> {
    let quota = match command {
        QuotaCommands::Get => manager.quota()?,
        QuotaCommands::Set { value } => manager.set_quota(*value, caller)?,
    };
    if json {
        println!("{}", serde_json::json!({ "per_day": quota }));
    } else {
        println!("{} {}", "Per-day quota:".green(), quota);
    }
    Ok(())
}

fn handle_user_command(command: &UserCommands, manager: &PlanManager, caller: &Caller, json: bool) -> Result<()> {
    match command {
        UserCommands::Add { username, name, admin } => {
            let role = if *admin { Role::Admin } else { Role::Sender };
            let user = manager.add_user(username, name.as_deref(), role, caller)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("{} {} ({}) id={}", "Added:".green(), user.username, user.role, user.id);
            }
        }
        UserCommands::List => {
            let users = manager.list_users()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                print_users(&users);
            }
        }
    }
    Ok(())
}

fn handle_candidate_command(
    command: &CandidateCommands,
    manager: &PlanManager,
    caller: &Caller,
    json: bool,
) -> Result<()> {
    match command {
        CandidateCommands::Add {
            handle,
            name,
            link,
            avatar,
            unwanted,
        } => {
            let mut new = NewCandidate::new(handle);
            if let Some(name) = name {
                new = new.with_name(name);
            }
            if let Some(link) = link {
                new = new.with_link(link);
            }
            if let Some(avatar) = avatar {
                new = new.with_avatar(avatar);
            }
            if *unwanted {
                new = new.unwanted();
            }
            let candidate = manager.add_candidate(&new, caller)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&candidate)?);
            } else {
                println!("{} {} id={}", "Added:".green(), candidate.handle, candidate.id);
            }
        }
        CandidateCommands::Unwanted { handle, clear } => {
            manager.set_unwanted(handle, !*clear, caller)?;
            let state = if *clear { "cleared" } else { "marked unwanted" };
            println!("{} {} {}", "Updated:".green(), handle, state);
        }
        CandidateCommands::Count => {
            let count = manager.count_candidates()?;
            if json {
                println!("{}", serde_json::json!({ "total": count }));
            } else {
                println!("{} {}", "Candidates:".green(), count);
            }
        }
    }
    Ok(())
}

fn status_label(status: PlanStatus) -> ColoredString {
    match status {
        PlanStatus::Pending => status.as_str().yellow(),
        PlanStatus::Sent => status.as_str().cyan(),
        PlanStatus::Interested => status.as_str().magenta(),
        PlanStatus::Won => status.as_str().green().bold(),
    }
}

fn print_items(items: &[AssignmentView]) {
    if items.is_empty() {
        println!("  {}", "(no assignments)".dimmed());
        return;
    }

    let mut current = None;
    for item in items {
        if current != Some(item.date) {
            println!("{}", item.date.to_string().bold());
            current = Some(item.date);
        }
        println!(
            "  {:>6}  {:<16} {:<24} {:<11} {}",
            item.plan_id,
            item.sender_key(),
            item.handle,
            status_label(item.status).to_string(),
            item.link.as_deref().unwrap_or("")
        );
    }
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("  {}", "(no users)".dimmed());
        return;
    }
    for user in users {
        println!(
            "  {:>4}  {:<16} {:<7} {}",
            user.id,
            user.username,
            user.role.as_str(),
            user.name.as_deref().unwrap_or("")
        );
    }
}

fn main() -> Result<()> {
    // Setup logging first so config loading is logged
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(config.log_level.as_deref())?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
