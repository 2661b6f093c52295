use callcenter::model::TicketStatus;
use callcenter::validation::TicketForm;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "callcenter", bin_name = "callcenter", version)]
#[command(about = "Service tickets and invoices for the call center", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (default: $CALLCENTER_HOME, then the user data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Open,
    Closed,
    Recalled,
}

impl From<StatusArg> for TicketStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => TicketStatus::Open,
            StatusArg::Closed => TicketStatus::Closed,
            StatusArg::Recalled => TicketStatus::Recalled,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Ticket status to list
    #[arg(value_enum, default_value = "open")]
    pub status: StatusArg,

    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Include records whose action date has passed
    #[arg(short, long)]
    pub expired: bool,
}

/// Every field is optional on the command line so that missing values are
/// reported together with the other validation errors.
#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    #[arg(long, default_value = "")]
    pub number: String,
    #[arg(long, default_value = "")]
    pub day: String,
    #[arg(long, default_value = "")]
    pub month: String,
    #[arg(long, default_value = "")]
    pub year: String,
    /// Time window, e.g. "9am-12pm"
    #[arg(long, default_value = "")]
    pub time: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, default_value = "")]
    pub apartment: String,
    #[arg(long, default_value = "")]
    pub customer: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Service-charge amount
    #[arg(long, default_value = "")]
    pub sc: String,
    #[arg(long, default_value = "")]
    pub technician: String,
}

impl From<CreateArgs> for TicketForm {
    fn from(args: CreateArgs) -> Self {
        TicketForm {
            day: args.day,
            month: args.month,
            year: args.year,
            action_time: args.time,
            address: args.address,
            apartment: args.apartment,
            customer_name: args.customer,
            phone: args.phone,
            description: args.description,
            sc: args.sc,
            technician: args.technician,
            ticket_number: args.number,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tickets by status, one page at a time
    #[command(alias = "t")]
    Tickets(ListArgs),

    /// List invoices by ticket status
    #[command(alias = "i")]
    Invoices(ListArgs),

    /// Search by ticket number, then by address
    #[command(alias = "s")]
    Search {
        /// Search invoices instead of tickets
        #[arg(long)]
        invoices: bool,

        /// Read queries from stdin, searching once typing pauses
        #[arg(short, long)]
        interactive: bool,

        /// Search text
        term: Vec<String>,
    },

    /// Recall a closed ticket and put its invoice back to Installing
    Recall {
        /// Ticket number
        ticket_number: String,
    },

    /// Create a new open ticket
    Create(CreateArgs),

    /// Show a ticket (or invoice) by id or ticket number
    Show {
        /// Show the invoice instead of the ticket
        #[arg(long)]
        invoice: bool,

        /// Document id or ticket number
        key: String,
    },

    /// Show how to reach the technician of a ticket
    Contact {
        /// Ticket number
        ticket_number: String,
    },

    /// List employees
    Employees,

    /// Check call-center staff credentials
    Login {
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Repair invoices whose status diverged from their ticket
    Reconcile,

    /// Get or set configuration values
    Config {
        /// Configuration key (e.g. page-size)
        key: Option<String>,
        /// Value to set
        value: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_defaults() {
        let cli = Cli::try_parse_from(["callcenter", "tickets"]).unwrap();
        match cli.command {
            Some(Commands::Tickets(args)) => {
                assert_eq!(args.status, StatusArg::Open);
                assert_eq!(args.page, 1);
                assert!(!args.expired);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "callcenter",
            "invoices",
            "closed",
            "--page",
            "3",
            "--data-dir",
            "/tmp/cc",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/cc")));
        assert!(matches!(
            cli.command,
            Some(Commands::Invoices(ListArgs {
                status: StatusArg::Closed,
                page: 3,
                ..
            }))
        ));
    }

    #[test]
    fn create_args_map_to_form() {
        let cli = Cli::try_parse_from([
            "callcenter", "create", "--number", "x1", "--customer", "Lee",
        ])
        .unwrap();
        let Some(Commands::Create(args)) = cli.command else {
            panic!("expected create");
        };
        let form = TicketForm::from(args);
        assert_eq!(form.ticket_number, "x1");
        assert_eq!(form.customer_name, "Lee");
        assert!(form.phone.is_empty());
    }
}
