//! # CLI Layer
//!
//! One UI client for the call-center library. This is the only place that
//! knows about the terminal, the process environment, and exit codes.
//!
//! 1. **Argument Parsing**: clap derive types in [`setup`]
//! 2. **Context Setup**: data directory, config, store, API, tracing
//! 3. **API Dispatch**: one `handle_*` per subcommand
//! 4. **Output Formatting**: `CmdResult` to text in [`render`]
//! 5. **Error Handling**: [`describe_error`] turns errors into user-facing text
//!
//! Business rules are tested in the library; tests here cover parsing and
//! layout only.

mod render;
mod setup;

use callcenter::api::{CallCenterApi, CmdResult, ConfigAction, ListRequest};
use callcenter::commands::search;
use callcenter::config::CallCenterConfig;
use callcenter::error::{CallCenterError, ErrorKind, Result};
use callcenter::model::{Job, Ticket, TicketStatus};
use callcenter::search::{Debounced, DebouncedSearch, SearchOutcome};
use callcenter::store::fs::FileStore;
use callcenter::store::DocumentStore;
use chrono::Utc;
use clap::Parser;
use directories::ProjectDirs;
use render::{
    print_config, print_contact, print_employees, print_job_detail, print_jobs, print_messages,
    print_page_footer, print_ticket_detail, print_tickets,
};
use serde::de::DeserializeOwned;
use setup::{Cli, Commands, ListArgs};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const HOME_ENV: &str = "CALLCENTER_HOME";

struct AppContext {
    api: CallCenterApi<FileStore>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Tickets(args)) => handle_tickets(&mut ctx, args),
        Some(Commands::Invoices(args)) => handle_invoices(&mut ctx, args),
        Some(Commands::Search {
            invoices,
            interactive,
            term,
        }) => handle_search(&ctx, invoices, interactive, term),
        Some(Commands::Recall { ticket_number }) => handle_recall(&mut ctx, &ticket_number),
        Some(Commands::Create(args)) => handle_create(&mut ctx, args),
        Some(Commands::Show { invoice, key }) => handle_show(&ctx, invoice, &key),
        Some(Commands::Contact { ticket_number }) => handle_contact(&ctx, &ticket_number),
        Some(Commands::Employees) => handle_employees(&ctx),
        Some(Commands::Login { username, password }) => handle_login(&ctx, &username, password),
        Some(Commands::Reconcile) => handle_reconcile(&mut ctx),
        Some(Commands::Config { key, value }) => handle_config(&mut ctx, key, value),
        None => handle_tickets(
            &mut ctx,
            ListArgs {
                status: setup::StatusArg::Open,
                page: 1,
                expired: false,
            },
        ),
    }
}

/// Turn an error into the text shown to the agent.
pub fn describe_error(error: &CallCenterError) -> String {
    match (error.kind(), error) {
        (ErrorKind::Validation, CallCenterError::Validation(fields)) => {
            let mut lines = vec!["Validation failed. Please check your inputs.".to_string()];
            lines.extend(fields.iter().map(|f| format!("  {}", f)));
            lines.join("\n")
        }
        (ErrorKind::Data, other) => format!("A stored record could not be read.\n  {}", other),
        (ErrorKind::Store, CallCenterError::Store(_)) => format!(
            "Cannot connect to server. Please try again later.\n  {}",
            error
        ),
        (_, CallCenterError::Api(message)) => message.clone(),
        (_, other) => other.to_string(),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "callcenter", "callcenter")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| CallCenterError::Api("Could not determine data directory".into()))
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = resolve_data_dir(cli)?;
    let config = CallCenterConfig::load(&data_dir)?;
    debug!(data_dir = %data_dir.display(), page_size = config.page_size, "starting");

    let store = FileStore::new(data_dir.clone());
    let api = CallCenterApi::new(store, data_dir, config);
    Ok(AppContext { api })
}

fn list_request(ctx: &AppContext, args: &ListArgs) -> ListRequest {
    ListRequest::new(TicketStatus::from(args.status), ctx.api.config().page_size)
        .page(args.page)
        .include_expired(args.expired)
}

fn handle_tickets(ctx: &mut AppContext, args: ListArgs) -> Result<()> {
    let request = list_request(ctx, &args);
    let now = Utc::now();
    let result = ctx.api.list_tickets(&request, now)?;
    print_tickets(&result.tickets, now);
    if let Some(page) = &result.page {
        print_page_footer(page);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_invoices(ctx: &mut AppContext, args: ListArgs) -> Result<()> {
    let request = list_request(ctx, &args);
    let now = Utc::now();
    let result = ctx.api.list_invoices(&request, now)?;
    print_jobs(&result.jobs, now);
    if let Some(page) = &result.page {
        print_page_footer(page);
    }
    print_messages(&result.messages);
    Ok(())
}

fn print_search_result(result: &CmdResult) {
    let now = Utc::now();
    if !result.tickets.is_empty() {
        print_tickets(&result.tickets, now);
    }
    if !result.jobs.is_empty() {
        print_jobs(&result.jobs, now);
    }
    print_messages(&result.messages);
}

fn handle_search(
    ctx: &AppContext,
    invoices: bool,
    interactive: bool,
    term: Vec<String>,
) -> Result<()> {
    if interactive {
        return if invoices {
            run_interactive::<Job>(ctx, ctx.api.debounced_invoice_search(), search::jobs)
        } else {
            run_interactive::<Ticket>(ctx, ctx.api.debounced_ticket_search(), search::tickets)
        };
    }

    let text = term.join(" ");
    let result = if invoices {
        ctx.api.search_invoices(&text)
    } else {
        ctx.api.search_tickets(&text)
    };
    print_search_result(&result);
    Ok(())
}

fn run_interactive<T: DeserializeOwned>(
    ctx: &AppContext,
    search: DebouncedSearch,
    to_result: fn(SearchOutcome<T>) -> CmdResult,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(interactive_search(ctx.api.store(), &search, to_result))
}

fn show_debounced<T>(
    outcome: Debounced<SearchOutcome<T>>,
    to_result: fn(SearchOutcome<T>) -> CmdResult,
) {
    if let Debounced::Ready(outcome) = outcome {
        print_search_result(&to_result(outcome));
    }
}

/// Each stdin line replaces the pending query. A query runs only after the
/// input has been quiet for the configured period; end of input flushes the
/// last one.
async fn interactive_search<S, T>(
    store: &S,
    search: &DebouncedSearch,
    to_result: fn(SearchOutcome<T>) -> CmdResult,
) -> Result<()>
where
    S: DocumentStore,
    T: DeserializeOwned,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<String> = None;

    loop {
        let text = match pending.take() {
            Some(text) => text,
            None => match lines.next_line().await? {
                Some(line) => line,
                None => return Ok(()),
            },
        };

        let run = search.run::<S, T>(store, &text);
        tokio::pin!(run);

        let next = tokio::select! {
            outcome = &mut run => {
                show_debounced(outcome, to_result);
                continue;
            }
            line = lines.next_line() => line?,
        };

        match next {
            Some(line) => pending = Some(line),
            None => {
                show_debounced(run.await, to_result);
                return Ok(());
            }
        }
    }
}

fn handle_recall(ctx: &mut AppContext, ticket_number: &str) -> Result<()> {
    let result = ctx.api.recall_ticket(ticket_number)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_create(ctx: &mut AppContext, args: setup::CreateArgs) -> Result<()> {
    let result = ctx.api.create_ticket(args.into())?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_show(ctx: &AppContext, invoice: bool, key: &str) -> Result<()> {
    let now = Utc::now();
    let result = if invoice {
        ctx.api.show_invoice(key)?
    } else {
        ctx.api.show_ticket(key)?
    };

    for ticket in &result.tickets {
        print_ticket_detail(ticket, now);
    }
    for (i, job) in result.jobs.iter().enumerate() {
        if i > 0 || !result.tickets.is_empty() {
            println!("\n================================\n");
        }
        print_job_detail(job);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_contact(ctx: &AppContext, ticket_number: &str) -> Result<()> {
    let result = ctx.api.technician_contact(ticket_number)?;
    if let Some(contact) = &result.contact {
        print_contact(contact);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_employees(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.employees()?;
    print_employees(&result.employees);
    print_messages(&result.messages);
    Ok(())
}

fn handle_login(ctx: &AppContext, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let result = ctx.api.login(username, &password)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_reconcile(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.reconcile()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let show_all = key.is_none();
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = ctx.api.config_action(action)?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(config);
        }
    }
    print_messages(&result.messages);
    Ok(())
}
