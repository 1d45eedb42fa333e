//! Command-line parsing and dispatch for the `taskgrid` console.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};
use taskgrid_config::ConsoleConfig;
use taskgrid_config::validate::{ensure_interval, parse_api_url, validate};
use taskgrid_telemetry::{LoggingConfig, Metrics, init_logging};
use url::Url;

use crate::client::{AppContext, CliError, CliResult};
use crate::commands::{auth, dashboard, files, tasks, workers};
use crate::notice::StderrNotifier;
use crate::output::print_json;

/// Parses CLI arguments, executes the requested command and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);

    let result = bootstrap(&cli).and_then(|(config, metrics)| {
        AppContext::new(config, cli.output, Arc::new(StderrNotifier), metrics)
    });
    let result = match result {
        Ok(ctx) => {
            let outcome = dispatch(&ctx, cli.command).await;
            let rendered = if cli.metrics {
                render_metrics(&ctx)
            } else {
                Ok(())
            };
            outcome.and(rendered)
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {
            tracing::debug!(command = command_name, "command succeeded");
            0
        }
        Err(err) => {
            if let Some(message) = err.display_message() {
                eprintln!("error: {message}");
            }
            tracing::debug!(command = command_name, exit_code = err.exit_code(), "command failed");
            err.exit_code()
        }
    }
}

fn bootstrap(cli: &Cli) -> CliResult<(ConsoleConfig, Option<Metrics>)> {
    let mut config = ConsoleConfig::from_env()?;
    apply_overrides(&mut config, cli)?;
    init_logging(&LoggingConfig {
        level: &config.log_level,
        format: config.log_format,
    })
    .map_err(|err| CliError::failure(anyhow!("failed to initialise logging: {err}")))?;
    let metrics = if cli.metrics {
        Some(Metrics::new().map_err(|err| CliError::failure(anyhow!("{err}")))?)
    } else {
        None
    };
    Ok((config, metrics))
}

pub(crate) fn apply_overrides(config: &mut ConsoleConfig, cli: &Cli) -> CliResult<()> {
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout = Duration::from_secs(secs);
    }
    validate(config)?;
    Ok(())
}

async fn dispatch(ctx: &AppContext, command: Command) -> CliResult<()> {
    match command {
        Command::Login(args) => auth::handle_login(ctx, args).await,
        Command::Register(args) => auth::handle_register(ctx, args).await,
        Command::RegisterClient(args) => auth::handle_register_client(ctx, args).await,
        Command::Logout => {
            auth::handle_logout(ctx);
            Ok(())
        }
        Command::Whoami => auth::handle_whoami(ctx),
        Command::Clients => auth::handle_clients(ctx).await,
        Command::Workers(args) => workers::handle_workers(ctx, args).await,
        Command::Worker(args) => workers::handle_worker(ctx, args).await,
        Command::Tasks(args) => tasks::handle_tasks(ctx, args).await,
        Command::Task(TaskCommand::Create(args)) => tasks::handle_task_create(ctx, args).await,
        Command::Task(TaskCommand::Status(args)) => tasks::handle_task_status(ctx, args).await,
        Command::Files => files::handle_files(ctx).await,
        Command::File(FileCommand::Upload(args)) => files::handle_file_upload(ctx, args).await,
        Command::File(FileCommand::Delete(args)) => files::handle_file_delete(ctx, args).await,
        Command::Dashboard(args) => dashboard::handle_dashboard(ctx, args).await,
    }
}

fn render_metrics(ctx: &AppContext) -> CliResult<()> {
    let Some(metrics) = &ctx.metrics else {
        return Ok(());
    };
    match ctx.output {
        OutputFormat::Json => print_json(&metrics.snapshot()),
        OutputFormat::Table => {
            let text = metrics
                .render()
                .map_err(|err| CliError::failure(anyhow!("failed to render metrics: {err}")))?;
            print!("{text}");
            Ok(())
        }
    }
}

/// Convert an optional millisecond flag into a validated interval.
pub(crate) fn interval_or(
    field: &'static str,
    millis: Option<u64>,
    fallback: Duration,
) -> CliResult<Duration> {
    let Some(millis) = millis else {
        return Ok(fallback);
    };
    let interval = Duration::from_millis(millis);
    ensure_interval(field, interval)?;
    Ok(interval)
}

fn parse_url(input: &str) -> Result<Url, String> {
    parse_api_url("api_url", input).map_err(|err| err.detail())
}

fn parse_ticks(input: &str) -> Result<usize, String> {
    match input.trim().parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(ticks) => Ok(ticks),
        Err(err) => Err(err.to_string()),
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Register(_) => "register",
        Command::RegisterClient(_) => "register_client",
        Command::Logout => "logout",
        Command::Whoami => "whoami",
        Command::Clients => "clients",
        Command::Workers(_) => "workers",
        Command::Worker(_) => "worker",
        Command::Tasks(_) => "tasks",
        Command::Task(TaskCommand::Create(_)) => "task_create",
        Command::Task(TaskCommand::Status(_)) => "task_status",
        Command::Files => "files",
        Command::File(FileCommand::Upload(_)) => "file_upload",
        Command::File(FileCommand::Delete(_)) => "file_delete",
        Command::Dashboard(_) => "dashboard",
    }
}

#[derive(Parser)]
#[command(name = "taskgrid", about = "Operator console for the taskgrid compute platform")]
pub(crate) struct Cli {
    #[arg(long, global = true, value_parser = parse_url, help = "API base URL, e.g. http://localhost:8080/api")]
    pub(crate) api_url: Option<Url>,
    #[arg(long, global = true, help = "HTTP timeout in seconds")]
    pub(crate) timeout: Option<u64>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        env = "TASKGRID_OUTPUT",
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, help = "Print poll metrics after the command")]
    pub(crate) metrics: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sign in and persist the session.
    Login(LoginArgs),
    /// Create a user inside an existing organisation.
    Register(RegisterArgs),
    /// Create a new organisation and its first account.
    RegisterClient(RegisterClientArgs),
    /// Forget the stored session.
    Logout,
    /// Show the stored session.
    Whoami,
    /// List organisations open for registration.
    Clients,
    /// List workers, optionally polling.
    Workers(WorkersArgs),
    /// Monitor one worker.
    Worker(WorkerArgs),
    /// List tasks, optionally polling.
    Tasks(TasksArgs),
    #[command(subcommand)]
    Task(TaskCommand),
    /// List uploaded files.
    Files,
    #[command(subcommand)]
    File(FileCommand),
    /// Fleet and task summary.
    Dashboard(DashboardArgs),
}

/// Task operations.
#[derive(Subcommand)]
pub(crate) enum TaskCommand {
    /// Submit a new task.
    Create(TaskCreateArgs),
    /// Show one task, optionally until it finishes.
    Status(TaskStatusArgs),
}

/// File operations.
#[derive(Subcommand)]
pub(crate) enum FileCommand {
    /// Upload a local file.
    Upload(FileUploadArgs),
    /// Delete an uploaded file.
    Delete(FileDeleteArgs),
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long, env = "TASKGRID_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

#[derive(Args)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) client_id: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) display_name: String,
    #[arg(long, env = "TASKGRID_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

#[derive(Args)]
pub(crate) struct RegisterClientArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) username: String,
    #[arg(long, env = "TASKGRID_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
}

#[derive(Args, Default)]
pub(crate) struct WorkersArgs {
    #[arg(long, help = "Keep polling and re-render on every change")]
    pub(crate) watch: bool,
    #[arg(long, help = "Poll interval in milliseconds")]
    pub(crate) interval_ms: Option<u64>,
}

#[derive(Args, Default)]
pub(crate) struct WorkerArgs {
    pub(crate) worker_id: String,
    #[arg(long, help = "Organisation of the worker; defaults to the signed-in client")]
    pub(crate) client_id: Option<String>,
    #[arg(long, help = "Keep sampling until Ctrl-C")]
    pub(crate) watch: bool,
    #[arg(long, value_parser = parse_ticks, help = "Stop after this many samples")]
    pub(crate) ticks: Option<usize>,
    #[arg(long, help = "Poll interval in milliseconds")]
    pub(crate) interval_ms: Option<u64>,
}

#[derive(Args, Default)]
pub(crate) struct TasksArgs {
    #[arg(long, help = "Keep polling and re-render on every change")]
    pub(crate) watch: bool,
    #[arg(long, help = "Poll interval in milliseconds")]
    pub(crate) interval_ms: Option<u64>,
}

#[derive(Args)]
pub(crate) struct TaskCreateArgs {
    #[arg(long)]
    pub(crate) function_id: String,
}

#[derive(Args)]
pub(crate) struct TaskStatusArgs {
    pub(crate) task_id: String,
    #[arg(long, help = "Poll until the task succeeds or fails")]
    pub(crate) watch: bool,
    #[arg(long, help = "Poll interval in milliseconds")]
    pub(crate) interval_ms: Option<u64>,
}

#[derive(Args)]
pub(crate) struct FileUploadArgs {
    pub(crate) path: PathBuf,
}

#[derive(Args)]
pub(crate) struct FileDeleteArgs {
    pub(crate) file_id: String,
}

#[derive(Args, Default)]
pub(crate) struct DashboardArgs {
    #[arg(
        long,
        value_parser = parse_ticks,
        help = "Stop after this many refreshes; a single snapshot when omitted"
    )]
    pub(crate) ticks: Option<usize>,
    #[arg(long, help = "Poll interval in milliseconds")]
    pub(crate) interval_ms: Option<u64>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(err) => panic!("arguments should parse: {err}"),
        }
    }

    #[test]
    fn global_flags_apply_after_the_subcommand() {
        let cli = parse(&[
            "taskgrid",
            "workers",
            "--watch",
            "--interval-ms",
            "1000",
            "--output",
            "json",
            "--api-url",
            "http://grid.example.com/api",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(
            cli.api_url.as_ref().map(Url::as_str),
            Some("http://grid.example.com/api")
        );
        assert!(matches!(
            cli.command,
            Command::Workers(WorkersArgs {
                watch: true,
                interval_ms: Some(1000)
            })
        ));
    }

    #[test]
    fn tick_budgets_must_be_positive() {
        assert!(Cli::try_parse_from(["taskgrid", "worker", "w-1", "--ticks", "0"]).is_err());
        let cli = parse(&["taskgrid", "worker", "w-1", "--ticks", "3"]);
        assert!(matches!(
            cli.command,
            Command::Worker(WorkerArgs { ticks: Some(3), watch: false, .. })
        ));
    }

    #[test]
    fn non_http_urls_are_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["taskgrid", "--api-url", "ftp://grid", "files"]).is_err());
    }

    #[test]
    fn nested_commands_parse() {
        let cli = parse(&["taskgrid", "task", "status", "t-1", "--watch"]);
        assert!(matches!(
            &cli.command,
            Command::Task(TaskCommand::Status(args)) if args.task_id == "t-1" && args.watch
        ));
        assert_eq!(command_label(&cli.command), "task_status");

        let cli = parse(&["taskgrid", "file", "upload", "data.csv"]);
        assert_eq!(command_label(&cli.command), "file_upload");
    }

    #[test]
    fn overrides_replace_url_and_timeout() -> anyhow::Result<()> {
        let mut config = ConsoleConfig::from_lookup(|_| None)?;
        let cli = parse(&[
            "taskgrid",
            "--api-url",
            "https://grid.example.com/api",
            "--timeout",
            "3",
            "clients",
        ]);
        apply_overrides(&mut config, &cli).map_err(|err| anyhow!("{err:?}"))?;
        assert_eq!(config.api_base_url.as_str(), "https://grid.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn zero_timeout_is_a_validation_error() -> anyhow::Result<()> {
        let mut config = ConsoleConfig::from_lookup(|_| None)?;
        let cli = parse(&["taskgrid", "--timeout", "0", "clients"]);
        let result = apply_overrides(&mut config, &cli);
        assert!(matches!(result, Err(CliError::Validation(_))));
        Ok(())
    }

    #[test]
    fn interval_flags_are_range_checked() {
        let fallback = Duration::from_secs(5);
        assert!(matches!(interval_or("interval_ms", None, fallback), Ok(d) if d == fallback));
        assert!(matches!(
            interval_or("interval_ms", Some(1000), fallback),
            Ok(d) if d == Duration::from_millis(1000)
        ));
        assert!(matches!(
            interval_or("interval_ms", Some(10), fallback),
            Err(CliError::Validation(_))
        ));
    }
}
