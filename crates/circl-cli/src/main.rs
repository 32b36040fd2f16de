use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use circl_core::chat::ChatSession;
use circl_core::config::{self, CirclConfig};
use circl_core::import::{ImportWizard, RowError};
use circl_core::insights::{self, InsightCache, Priority, RecommendationSet};
use circl_core::llm::LlmService;
use circl_core::model::*;
use circl_core::notify::{self, EmailRequest, EmailService};
use circl_core::secure::SecureClient;
use circl_core::storage::{create_backend, SqliteStorage};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use uuid::Uuid;

type Client = SecureClient<SqliteStorage>;

#[derive(Parser)]
#[command(name = "circl", about = "Circl: stay close to the people who matter", version)]
enum Cli {
    /// Create a config with a fresh user id
    Init {
        /// Email address for digests and reminders
        #[arg(long)]
        email: Option<String>,
        /// Write .circl/config.toml in the current directory instead of the global config
        #[arg(long)]
        project: bool,
    },
    /// Import contacts from a CSV file
    Import {
        /// Path to the CSV file (must have a header row)
        path: PathBuf,
        /// Override a detected mapping, e.g. --map "Work Email=Email" (repeatable; empty column unmaps)
        #[arg(short, long)]
        map: Vec<String>,
        /// Validate and show the mapping without inserting anything
        #[arg(long)]
        dry_run: bool,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// List contacts
    Contacts {
        /// Only show one circle (inner, middle, outer)
        #[arg(short, long)]
        circle: Option<String>,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a contact
    Add {
        name: String,
        #[arg(short, long, default_value = "outer")]
        circle: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Birthday (YYYY-MM-DD)
        #[arg(long)]
        birthday: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Edit a contact
    Edit {
        /// Contact id or name
        contact: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        circle: Option<String>,
        /// New email (empty string clears it)
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Mark or unmark as favorite
        #[arg(long)]
        favorite: Option<bool>,
    },
    /// Delete a contact and its interactions
    Delete {
        /// Contact id or name
        contact: String,
    },
    /// Log an interaction with a contact
    Log {
        /// Contact id or name
        contact: String,
        /// Interaction type (call, meeting, email, message, note)
        #[arg(short, long, default_value = "message")]
        kind: String,
        /// When it happened (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Manage keystones (birthdays, anniversaries, reminders)
    #[command(subcommand)]
    Keystone(KeystoneCmd),
    /// Who to reach out to, from Arlo or the built-in rules
    Insights {
        /// Ignore the cached recommendations
        #[arg(long)]
        refresh: bool,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask Arlo a question about your network
    Chat {
        message: Vec<String>,
        /// Forget earlier conversation first
        #[arg(long)]
        reset: bool,
    },
    /// Build the weekly digest
    Digest {
        /// Email it instead of printing
        #[arg(long)]
        send: bool,
    },
    /// Show configuration and network status
    Status,
}

#[derive(Subcommand)]
enum KeystoneCmd {
    /// Add a keystone
    Add {
        title: String,
        /// Date (YYYY-MM-DD)
        date: String,
        /// birthday, anniversary, milestone, reminder, other
        #[arg(short, long, default_value = "reminder")]
        category: String,
        /// Contact id or name
        #[arg(long)]
        contact: Option<String>,
        /// weekly, monthly, yearly
        #[arg(short, long)]
        recurrence: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List keystones coming up
    List {
        /// Look-ahead window in days
        #[arg(short, long, default_value = "30")]
        days: i64,
        #[arg(long)]
        json: bool,
    },
    /// Delete a keystone
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let config = match CirclConfig::load(Some(&cwd)) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            CirclConfig::default_config()
        }
    };

    run(cli, &config, &cwd).await
}

async fn run(cli: Cli, config: &CirclConfig, cwd: &Path) -> Result<()> {
    match cli {
        Cli::Init { email, project } => cmd_init(email.as_deref(), project, cwd).await,
        Cli::Import {
            path,
            map,
            dry_run,
            json,
        } => {
            let client = make_client(config)?;
            cmd_import(&client, config, &path, &map, dry_run, json).await
        }
        Cli::Contacts { circle, json } => {
            let client = make_client(config)?;
            cmd_contacts(&client, circle.as_deref(), json).await
        }
        Cli::Add {
            name,
            circle,
            email,
            phone,
            company,
            title,
            birthday,
            notes,
        } => {
            let client = make_client(config)?;
            let mut fields = NewContact::new(name).with_circle(circle.parse()?);
            fields.personal_email = email;
            fields.mobile_phone = phone;
            fields.company = company;
            fields.job_title = title;
            fields.birthday = birthday.as_deref().map(parse_day).transpose()?;
            fields.notes = notes;
            let contact = client.insert_contact(fields).await?;
            println!(
                "{} {} ({})",
                "Added".green(),
                contact.name().bold(),
                short_id(contact.id).cyan()
            );
            Ok(())
        }
        Cli::Edit {
            contact,
            name,
            circle,
            email,
            company,
            notes,
            favorite,
        } => {
            let client = make_client(config)?;
            let target = resolve_contact(&client, &contact).await?;
            let patch = ContactPatch {
                name,
                circle: circle.as_deref().map(str::parse).transpose()?,
                personal_email: email.map(non_empty),
                company: company.map(non_empty),
                notes: notes.map(non_empty),
                favorite,
                ..Default::default()
            };
            let updated = client
                .update_contact(&target.id.to_string(), &patch)
                .await?;
            println!("{} {}", "Updated".green(), updated.name().bold());
            Ok(())
        }
        Cli::Delete { contact } => {
            let client = make_client(config)?;
            let target = resolve_contact(&client, &contact).await?;
            client.delete_contact(&target.id.to_string()).await?;
            println!("{} {}", "Deleted".red(), target.name().bold());
            Ok(())
        }
        Cli::Log {
            contact,
            kind,
            date,
            notes,
        } => {
            let client = make_client(config)?;
            let target = resolve_contact(&client, &contact).await?;
            let kind: InteractionKind = kind.parse()?;
            let when = match date.as_deref() {
                Some(d) => parse_day(d)?
                    .and_hms_opt(12, 0, 0)
                    .context("invalid time")?
                    .and_utc(),
                None => Utc::now(),
            };
            client
                .log_interaction(&target.id.to_string(), kind, when, notes.as_deref())
                .await?;
            println!(
                "{} {} with {}",
                "Logged".green(),
                kind,
                target.name().bold()
            );
            Ok(())
        }
        Cli::Keystone(cmd) => {
            let client = make_client(config)?;
            cmd_keystone(&client, cmd).await
        }
        Cli::Insights { refresh, json } => {
            let client = make_client(config)?;
            cmd_insights(&client, config, refresh, json).await
        }
        Cli::Chat { message, reset } => {
            let client = make_client(config)?;
            cmd_chat(&client, config, &message.join(" "), reset).await
        }
        Cli::Digest { send } => {
            let client = make_client(config)?;
            cmd_digest(&client, config, send).await
        }
        Cli::Status => cmd_status(config).await,
    }
}

fn make_client(config: &CirclConfig) -> Result<Client> {
    let storage = create_backend(config).context("failed to open the Circl database")?;
    SecureClient::from_config(storage, config).context("Circl is not initialized")
}

/// The configured LLM, or a disabled one when the config is unusable.
fn make_llm(config: &CirclConfig) -> Result<LlmService> {
    match LlmService::from_config(&config.llm) {
        Ok(llm) => Ok(llm),
        Err(e) => {
            tracing::warn!(error = %e, "LLM unavailable, using rule-based insights");
            let mut disabled = config.llm.clone();
            disabled.enabled = false;
            LlmService::from_config(&disabled).context("failed to create LLM client")
        }
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}' (expected YYYY-MM-DD)"))
}

/// Find a contact by id or exact name. Every caller changes data, so a typo
/// must not land on someone else.
async fn resolve_contact(client: &Client, query: &str) -> Result<Contact> {
    if Uuid::parse_str(query.trim()).is_ok() {
        return Ok(client.fetch_contact(query).await?);
    }
    let contacts = client.fetch_contacts().await?;
    Ok(insights::resolve_exact(query, &contacts)?.clone())
}

fn circle_colored(circle: Circle) -> String {
    match circle {
        Circle::Inner => circle.as_str().magenta().to_string(),
        Circle::Middle => circle.as_str().blue().to_string(),
        Circle::Outer => circle.as_str().dimmed().to_string(),
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

async fn cmd_init(email: Option<&str>, project: bool, cwd: &Path) -> Result<()> {
    let path = if project {
        cwd.join(".circl").join("config.toml")
    } else {
        config::global_config_path().context("cannot determine config directory")?
    };
    if path.exists() {
        println!("Circl is already initialized ({}).", path.display());
        return Ok(());
    }

    let cfg = config::write_initial_config(&path, email)?;
    println!("{} {}", "Created".green(), path.display());
    println!("  {}  {}", "User id:".dimmed(), cfg.user.id.as_deref().unwrap_or_default());

    let client = make_client(&cfg)?;
    println!("  {} {}", "Database:".dimmed(), cfg.database_path()?.display());

    if let Some(to) = email {
        let service = EmailService::new(&cfg.email)?;
        let request = EmailRequest {
            kind: EmailKind::Onboarding,
            to: to.to_string(),
            user_id: client.user_id(),
            data: serde_json::json!({}),
        };
        let log = service.send(&client, &request).await?;
        tracing::debug!(status = log.status.as_str(), "onboarding email");
    }

    println!();
    println!("Next: {}", "circl import contacts.csv".cyan());
    Ok(())
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

async fn cmd_import(
    client: &Client,
    config: &CirclConfig,
    path: &Path,
    overrides: &[String],
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let mut wizard = ImportWizard::new(&config.import);
    wizard
        .load_file(path)
        .with_context(|| format!("cannot import {}", path.display()))?;

    for entry in overrides {
        let (label, column) = entry
            .split_once('=')
            .with_context(|| format!("--map expects Label=Column, got '{entry}'"))?;
        wizard.set_mapping(label.trim(), column.trim())?;
    }

    if !json {
        println!("{}", "Column mapping".bold());
        if let Some(mapping) = wizard.mapping() {
            for (field, column) in mapping.mapped() {
                println!("  {:<18} {} {}", field.label, "←".dimmed(), column.cyan());
            }
            let unmapped: Vec<&str> = mapping.unmapped_fields().map(|f| f.label).collect();
            if !unmapped.is_empty() {
                println!("  {} {}", "unmapped:".dimmed(), unmapped.join(", ").dimmed());
            }
        }
        println!();
    }

    let report = wizard.confirm()?.clone();

    if dry_run {
        if json {
            let out = serde_json::json!({
                "mapping": wizard.mapping(),
                "valid": report.valid_contacts.len(),
                "errors": report.errors,
                "skipped_empty": report.skipped_empty,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!(
                "{} {} valid, {} with errors, {} empty",
                "Dry run:".yellow(),
                report.valid_contacts.len().to_string().green(),
                report.errors.len().to_string().red(),
                report.skipped_empty
            );
            print_row_errors(&report.errors);
        }
        return Ok(());
    }

    let outcome = wizard.submit(client).await?.clone();

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{} {} of {} rows ({} failed, {} empty)",
            "Imported".green(),
            outcome.imported.to_string().bold(),
            outcome.total_rows,
            outcome.failed,
            outcome.skipped_empty
        );
        print_row_errors(&outcome.errors);
    }
    Ok(())
}

fn print_row_errors(errors: &[RowError]) {
    for e in errors.iter().take(20) {
        println!("  {} {}", format!("row {}:", e.row).red(), e.reason);
    }
    if errors.len() > 20 {
        println!("  {}", format!("... and {} more", errors.len() - 20).dimmed());
    }
}

// ---------------------------------------------------------------------------
// contacts
// ---------------------------------------------------------------------------

async fn cmd_contacts(client: &Client, circle: Option<&str>, json: bool) -> Result<()> {
    let filter: Option<Circle> = circle.map(str::parse).transpose()?;
    let contacts: Vec<Contact> = client
        .fetch_contacts()
        .await?
        .into_iter()
        .filter(|c| filter.map_or(true, |f| f == c.circle()))
        .collect();
    let interactions = client.fetch_interactions(None).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&contacts)?);
        return Ok(());
    }
    if contacts.is_empty() {
        println!("{}", "No contacts yet. Try `circl import`.".dimmed());
        return Ok(());
    }

    let network = insights::analyze_network(&contacts, &interactions, Utc::now(), 7);
    println!(
        "{:<10} {:<28} {:<8} {:>6} {}",
        "ID".dimmed(),
        "Name".dimmed(),
        "Circle".dimmed(),
        "Days".dimmed(),
        "Company".dimmed()
    );
    for i in &network.insights {
        let days = i.analysis.days_since_last_contact.to_string();
        let days = if i.analysis.is_overdue {
            days.red().to_string()
        } else {
            days.green().to_string()
        };
        println!(
            "{:<10} {:<28} {:<8} {:>6} {}",
            short_id(i.contact.id).cyan(),
            i.contact.name(),
            circle_colored(i.contact.circle()),
            days,
            i.contact.fields.company.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// keystones
// ---------------------------------------------------------------------------

async fn cmd_keystone(client: &Client, cmd: KeystoneCmd) -> Result<()> {
    match cmd {
        KeystoneCmd::Add {
            title,
            date,
            category,
            contact,
            recurrence,
            notes,
        } => {
            let mut keystone = Keystone::new(client.user_id(), title, category.parse()?, parse_day(&date)?);
            if let Some(query) = contact {
                keystone = keystone.with_contact(resolve_contact(client, &query).await?.id);
            }
            if let Some(r) = recurrence {
                keystone = keystone.with_recurrence(r.parse()?);
            }
            keystone.notes = notes;
            let saved = client.insert_keystone(keystone).await?;
            println!(
                "{} {} on {} ({})",
                "Added".green(),
                saved.title.bold(),
                saved.date,
                short_id(saved.id).cyan()
            );
        }
        KeystoneCmd::List { days, json } => {
            let keystones = client.fetch_keystones().await?;
            let today = Utc::now().date_naive();
            let due = upcoming(&keystones, today, days);
            if json {
                let out: Vec<serde_json::Value> = due
                    .iter()
                    .map(|(k, next)| serde_json::json!({ "keystone": k, "next": next }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if due.is_empty() {
                println!("{}", format!("Nothing in the next {days} days.").dimmed());
            } else {
                for (k, next) in due {
                    let when = match (next - today).num_days() {
                        0 => "today".yellow().to_string(),
                        1 => "tomorrow".yellow().to_string(),
                        n => format!("in {n} days"),
                    };
                    println!(
                        "{:<10} {} {:<12} {} {}",
                        short_id(k.id).cyan(),
                        next,
                        k.category.to_string().magenta(),
                        k.title,
                        when.dimmed()
                    );
                }
            }
        }
        KeystoneCmd::Delete { id } => {
            client.delete_keystone(&id).await?;
            println!("{} keystone {}", "Deleted".red(), id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// insights
// ---------------------------------------------------------------------------

async fn load_recommendations(
    client: &Client,
    config: &CirclConfig,
    refresh: bool,
) -> Result<RecommendationSet> {
    let now = Utc::now();
    let cache_path = InsightCache::default_path()?;
    let mut cache = InsightCache::load(&cache_path);
    if !refresh {
        if let Some(set) = cache.fresh(client.user_id(), now, config.insights.cache_hours) {
            tracing::debug!("using cached recommendations");
            return Ok(set.clone());
        }
    }

    let contacts = client.fetch_contacts().await?;
    let interactions = client.fetch_interactions(None).await?;
    let llm = make_llm(config)?;
    let set = insights::recommend(&llm, &contacts, &interactions, &config.insights, now).await;

    cache.put(client.user_id(), set.clone(), now);
    if let Err(e) = cache.save(&cache_path) {
        tracing::warn!(error = %e, "failed to save insight cache");
    }
    Ok(set)
}

async fn cmd_insights(client: &Client, config: &CirclConfig, refresh: bool, json: bool) -> Result<()> {
    let set = load_recommendations(client, config, refresh).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }
    if set.is_empty() {
        println!("{}", "No contacts to analyze yet.".dimmed());
        return Ok(());
    }
    if !set.is_ai_generated() {
        println!(
            "{}",
            "AI unavailable, showing rule-based suggestions.".yellow()
        );
    }
    for r in set.items() {
        let priority = match r.priority {
            Priority::High => "HIGH".red().bold().to_string(),
            Priority::Medium => "MED ".yellow().to_string(),
            Priority::Low => "LOW ".dimmed().to_string(),
        };
        println!("{} {} {}", priority, r.contact_name.bold(), format!("[{}]", r.action_label).cyan());
        println!("     {}", r.suggestion);
        if !r.reasoning.is_empty() {
            println!("     {}", r.reasoning.dimmed());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// chat
// ---------------------------------------------------------------------------

async fn cmd_chat(client: &Client, config: &CirclConfig, message: &str, reset: bool) -> Result<()> {
    let history_path = config::data_dir()?.join(format!("chat-{}.json", client.user_id()));
    let mut session: ChatSession = if reset {
        ChatSession::new()
    } else {
        std::fs::read_to_string(&history_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    };

    if message.trim().is_empty() {
        if reset {
            let _ = std::fs::remove_file(&history_path);
            println!("{}", "Conversation cleared.".dimmed());
            return Ok(());
        }
        anyhow::bail!("say something, e.g. `circl chat who should I call this week?`");
    }

    let contacts = client.fetch_contacts().await?;
    let interactions = client.fetch_interactions(None).await?;
    let llm = make_llm(config)?;
    let reply = session
        .send(&llm, message, &contacts, &interactions, &config.insights, Utc::now())
        .await;

    println!("{} {}", "Arlo:".bold().magenta(), reply.message.content);
    if !reply.ai_available {
        tracing::debug!("chat answered from rules");
    }

    std::fs::create_dir_all(history_path.parent().unwrap_or(Path::new(".")))?;
    std::fs::write(&history_path, serde_json::to_string(&session)?)
        .context("failed to save chat history")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// digest
// ---------------------------------------------------------------------------

async fn cmd_digest(client: &Client, config: &CirclConfig, send: bool) -> Result<()> {
    let contacts = client.fetch_contacts().await?;
    let interactions = client.fetch_interactions(None).await?;
    let keystones = client.fetch_keystones().await?;
    let recommendations = load_recommendations(client, config, false).await?;

    let now = Utc::now();
    let network = insights::analyze_network(&contacts, &interactions, now, config.insights.recent_activity_days);
    let data = notify::digest_data(
        config.user.email.as_deref().and_then(|e| e.split('@').next()),
        &network,
        &keystones,
        &recommendations,
        now.date_naive(),
    );

    let to = config.user.email.clone().unwrap_or_default();
    let request = EmailRequest {
        kind: EmailKind::WeeklyDigest,
        to,
        user_id: client.user_id(),
        data,
    };

    if !send {
        let rendered = notify::render(&request)?;
        println!("{}", rendered.subject.bold());
        println!();
        print!("{}", rendered.text);
        return Ok(());
    }

    if request.to.is_empty() {
        anyhow::bail!("no email address configured (set [user] email)");
    }
    let log = EmailService::new(&config.email)?.send(client, &request).await?;
    match log.status {
        EmailStatus::Sent => println!("{} digest to {}", "Sent".green(), request.to),
        EmailStatus::Skipped => println!(
            "{} email delivery is not configured ([email] enabled/endpoint)",
            "Skipped:".yellow()
        ),
        EmailStatus::Failed => println!(
            "{} {}",
            "Failed:".red(),
            log.error.as_deref().unwrap_or("unknown error")
        ),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

async fn cmd_status(config: &CirclConfig) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    println!("{}", format!("Circl Status v{version}").bold());

    match config.user_id() {
        Ok(id) => println!("  {}       {}", "User:".dimmed(), id),
        Err(_) => {
            println!("  {}       {}", "User:".dimmed(), "not initialized (run `circl init`)".yellow());
            return Ok(());
        }
    }
    println!("  {}   {}", "Database:".dimmed(), config.database_path()?.display());

    let llm = make_llm(config)?;
    let ai = if llm.is_enabled() {
        format!("{} ({}, {})", "enabled".green(), config.llm.provider, llm.model())
    } else {
        "disabled".yellow().to_string()
    };
    println!("  {}         {}", "AI:".dimmed(), ai);
    let email = if EmailService::new(&config.email)?.is_configured() {
        "configured".green().to_string()
    } else {
        "not configured".dimmed().to_string()
    };
    println!("  {}      {}", "Email:".dimmed(), email);

    let client = make_client(config)?;
    let contacts = client.fetch_contacts().await?;
    let interactions = client.fetch_interactions(None).await?;
    let network = insights::analyze_network(&contacts, &interactions, Utc::now(), config.insights.recent_activity_days);
    let s = &network.summary;
    println!(
        "  {}   {} ({} inner, {} middle, {} outer)",
        "Contacts:".dimmed(),
        s.total.to_string().cyan(),
        s.inner,
        s.middle,
        s.outer
    );
    println!("  {}    {}", "Overdue:".dimmed(), s.stale_total().to_string().red());
    println!(
        "  {}     {} in the last {} days",
        "Recent:".dimmed(),
        s.recent_interactions,
        config.insights.recent_activity_days
    );

    let logs = client.fetch_email_logs(1).await?;
    if let Some(last) = logs.first() {
        println!(
            "  {} {} {} ({})",
            "Last email:".dimmed(),
            last.kind,
            last.status.as_str(),
            last.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
