use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use civic_report::api::client::build_http_client;
use civic_report::api::{
    login, AuthSession, HttpSubmissionClient, LoginIdentity, SubmissionClient, SubmissionError,
};
use civic_report::config::Config;
use civic_report::env_vars::env_vars_by_category;
use civic_report::logging;
use civic_report::report::{
    Category, DraftField, FieldUpdate, IssueDraft, NotificationChannel, Photo, ReportWizard,
    Severity, StepStatus, SubmitError, WizardStep,
};

#[derive(Parser)]
#[command(name = "civic-report")]
#[command(about = "Report civic issues through a step-by-step wizard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List wizard steps, categories and severity levels
    Steps,

    /// Walk the wizard with the given answers and report per-step problems
    Validate {
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Walk the wizard and submit the report
    Submit {
        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Show recognised environment variables
    Env,

    /// Write the effective configuration to a TOML file
    Init {
        /// Destination (default: ~/.config/civic-report/config.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Draft answers, one flag per field
#[derive(Args, Debug, Default)]
struct ReportArgs {
    /// Issue title
    #[arg(long)]
    title: Option<String>,

    /// Issue description
    #[arg(long)]
    description: Option<String>,

    /// Where the issue is
    #[arg(long)]
    location: Option<String>,

    /// Category label (see `civic-report steps`)
    #[arg(long)]
    category: Option<String>,

    /// Photo file; repeat for several, order is preserved
    #[arg(long = "photo")]
    photos: Vec<PathBuf>,

    /// Severity label (see `civic-report steps`)
    #[arg(long)]
    severity: Option<String>,

    /// Reporter's full name
    #[arg(long)]
    full_name: Option<String>,

    /// Reporter's email
    #[arg(long)]
    email: Option<String>,

    /// Reporter's phone number
    #[arg(long)]
    phone: Option<String>,

    /// Notification channels to enable (email, sms, push)
    #[arg(long = "notify", value_delimiter = ',')]
    notify: Vec<String>,

    /// Update frequency preference
    #[arg(long)]
    update_frequency: Option<String>,
}

#[derive(Args, Debug, Default)]
struct AuthArgs {
    /// Access token (overrides the configured token variable)
    #[arg(long)]
    token: Option<String>,

    /// Log in with this username
    #[arg(long, conflicts_with = "login_email")]
    username: Option<String>,

    /// Log in with this email
    #[arg(long = "login-email")]
    login_email: Option<String>,

    /// Password for --username / --login-email
    #[arg(long)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let _logging_handle = logging::init_logging(&config, cli.debug)?;

    match cli.command {
        Commands::Steps => cmd_steps(),
        Commands::Validate { report } => cmd_validate(&config, report),
        Commands::Submit { report, auth } => cmd_submit(&config, report, auth).await?,
        Commands::Env => cmd_env(),
        Commands::Init { output, force } => cmd_init(&config, output, force)?,
    }

    Ok(())
}

fn cmd_steps() {
    println!("Steps:");
    for step in WizardStep::all() {
        let fields: Vec<&str> = step.fields().iter().map(|f| f.as_str()).collect();
        println!("  {}  [{}]", step, fields.join(", "));
    }

    println!();
    println!("Categories:");
    for category in Category::all() {
        println!("  {:<16} {}", category.label(), category.description());
    }

    println!();
    println!("Severity levels:");
    for severity in Severity::all() {
        println!("  {:<16} {}", severity.label(), severity.description());
    }
}

fn cmd_validate(config: &Config, report: ReportArgs) {
    let mut wizard = build_wizard(config, report);
    let reached_end = walk(&mut wizard);

    print_progress(&wizard);
    if reached_end {
        println!("All steps are complete. The report is ready to submit.");
    } else {
        print_step_errors(&wizard);
    }
}

async fn cmd_submit(config: &Config, report: ReportArgs, auth: AuthArgs) -> Result<()> {
    let mut wizard = build_wizard(config, report);
    if !walk(&mut wizard) {
        print_progress(&wizard);
        print_step_errors(&wizard);
        bail!("Report is incomplete");
    }

    let session = resolve_session(config, auth).await?;
    let client = HttpSubmissionClient::from_config(&config.api, session.clone())
        .context("Failed to build submission client")?;
    tracing::debug!(client = client.name(), url = %client.issues_url(), "Submitting");

    let mut outcome = wizard.submit(&client).await;

    // An expired access token gets one retry after a refresh
    let expired = matches!(
        &outcome,
        Err(SubmitError::Submission(SubmissionError::Unauthorized { .. }))
    );
    if expired && session.refresh_token().is_some() {
        let http = build_http_client(&config.api)?;
        match session.refresh(&http, &config.api.base_url).await {
            Ok(refreshed) => {
                let client = HttpSubmissionClient::with_client(
                    http,
                    config.api.base_url.clone(),
                    refreshed,
                );
                outcome = wizard.submit(&client).await;
            }
            Err(e) => tracing::warn!(error = %e, "Token refresh failed"),
        }
    }

    match outcome {
        Ok(receipt) => {
            println!("Thank you! Your report has been submitted.");
            println!("  Reference: {}", receipt.id);
            if let Some(ai) = &receipt.ai {
                if let Some(category) = &ai.category {
                    match ai.confidence {
                        Some(confidence) => println!(
                            "  Suggested category: {} (confidence {:.2})",
                            category, confidence
                        ),
                        None => println!("  Suggested category: {}", category),
                    }
                }
                if let Some(analysis) = &ai.analysis {
                    println!("  Analysis: {}", analysis);
                }
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            if let SubmitError::Submission(failure) = &err {
                print_server_field_errors(failure);
            }
            Err(err.into())
        }
    }
}

fn cmd_env() {
    for (category, vars) in env_vars_by_category() {
        println!("{}:", category.display_name());
        for var in vars {
            println!("  {}", var.name);
            println!("      {}", var.description);
            if let Some(default) = var.default {
                println!("      default: {}", default);
            }
            if let Some(example) = var.example {
                println!("      example: {}", example);
            }
        }
        println!();
    }
}

fn cmd_init(config: &Config, output: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => Config::user_config_path().context("Could not determine config directory")?,
    };

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    config.save_to(&path)?;
    println!("Wrote configuration to {}", path.display());
    Ok(())
}

/// Fresh wizard with every provided answer applied
fn build_wizard(config: &Config, report: ReportArgs) -> ReportWizard {
    let draft = IssueDraft::with_update_frequency(config.wizard.default_update_frequency.clone());
    let mut wizard = ReportWizard::with_draft(draft);

    let text_answers = [
        (DraftField::Title, report.title),
        (DraftField::Description, report.description),
        (DraftField::Location, report.location),
        (DraftField::Category, report.category),
        (DraftField::Severity, report.severity),
        (DraftField::FullName, report.full_name),
        (DraftField::Email, report.email),
        (DraftField::Phone, report.phone),
        (DraftField::UpdateFrequency, report.update_frequency),
    ];
    for (field, value) in text_answers {
        if let Some(update) = value.and_then(|v| FieldUpdate::from_text(field, v)) {
            wizard.update_field(update);
        }
    }

    if !report.photos.is_empty() {
        let photos = report.photos.iter().map(Photo::from_path).collect();
        wizard.update_field(FieldUpdate::Photos(photos));
    }

    for name in &report.notify {
        match NotificationChannel::all()
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
        {
            Some(channel) => {
                wizard.update_field(FieldUpdate::Notification(*channel, true));
            }
            None => tracing::warn!(channel = %name, "Unknown notification channel; ignoring"),
        }
    }

    wizard
}

/// Advance until a step fails or the last step validates
fn walk(wizard: &mut ReportWizard) -> bool {
    while wizard.advance() {}
    wizard.current_step().is_last() && wizard.errors().is_empty()
}

fn print_progress(wizard: &ReportWizard) {
    for (step, status) in wizard.step_statuses() {
        let marker = match status {
            StepStatus::Completed => "[x]",
            StepStatus::Current => "[>]",
            StepStatus::Upcoming => "[ ]",
        };
        println!("{} {}", marker, step);
    }
    println!();
}

fn print_step_errors(wizard: &ReportWizard) {
    println!(
        "Step {} of {} needs attention:",
        wizard.step_number(),
        wizard.total_steps()
    );
    for (field, message) in wizard.errors().iter() {
        println!("  {}: {}", field, message);
    }
}

fn print_server_field_errors(failure: &SubmissionError) {
    let Some(field_errors) = failure.field_errors() else {
        return;
    };
    for (field, messages) in field_errors {
        for message in messages {
            eprintln!("  {}: {}", field, message);
        }
    }
}

async fn resolve_session(config: &Config, auth: AuthArgs) -> Result<AuthSession> {
    let scheme = config.api.auth_scheme;

    if let Some(token) = auth.token {
        return Ok(AuthSession::new(token, scheme));
    }

    let identity = match (auth.username, auth.login_email) {
        (Some(username), _) => Some(LoginIdentity::Username(username)),
        (None, Some(email)) => Some(LoginIdentity::Email(email)),
        (None, None) => None,
    };

    if let Some(identity) = identity {
        let Some(password) = auth.password else {
            bail!("--password is required when logging in");
        };
        let client = build_http_client(&config.api)?;
        let session = login(&client, &config.api.base_url, &identity, &password, scheme)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))
            .context("Login failed")?;
        return Ok(session);
    }

    AuthSession::from_env(&config.api.token_env, scheme).with_context(|| {
        format!(
            "No access token: pass --token, set {} or log in with --username/--password",
            config.api.token_env
        )
    })
}
