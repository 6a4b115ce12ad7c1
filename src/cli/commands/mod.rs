//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod export;
mod helpers;
mod init;
mod profile;
mod serve;
mod spj;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::services::FilterParams;

#[derive(Parser)]
#[command(name = "espj")]
#[command(about = "e-SPJ expense accountability document archive")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing espj.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Account id to act as
    #[arg(short, long, global = true, env = "ESPJ_USER")]
    user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Listing filter flags shared by `list` and `export spreadsheet`.
#[derive(clap::Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Year (YYYY) or "all"
    #[arg(long)]
    year: Option<String>,
    /// Month (1-12) or "all"
    #[arg(long)]
    month: Option<String>,
    /// Division name or "all" (defaults to the user's division)
    #[arg(long)]
    bidang: Option<String>,
    /// Search the description
    #[arg(short, long)]
    keyword: Option<String>,
    /// Search the booking number
    #[arg(short, long)]
    nomor: Option<String>,
}

impl From<FilterArgs> for FilterParams {
    fn from(args: FilterArgs) -> Self {
        FilterParams {
            year: args.year,
            month: args.month,
            bidang: args.bidang,
            keyword: args.keyword,
            nomor: args.nomor,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the web server
    Serve {
        /// Bind address: port, host, or host:port (default from config)
        #[arg(short, long, env = "ESPJ_BIND")]
        bind: Option<String>,
    },

    /// List SPJ records with summary counts
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Add an SPJ record
    Add {
        /// Booking number (No. Pembukuan)
        #[arg(long)]
        nomor: String,
        /// Account code (Kode Rekening)
        #[arg(long)]
        kode_rekening: String,
        /// SPJ type: GU or LS
        #[arg(long)]
        jenis: String,
        /// Division
        #[arg(long)]
        bidang: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        tanggal: NaiveDate,
        /// Description
        #[arg(long)]
        uraian: String,
        /// Amount in rupiah
        #[arg(long)]
        jumlah: i64,
        /// Attachment to upload
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete an SPJ record and its attachment (treasurer only)
    Delete {
        /// Record id
        id: String,
    },

    /// Export records
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },

    /// Manage user profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// ZIP of the attachments matching year, month and division
    Archive {
        /// Year (YYYY) or "all"
        #[arg(long)]
        year: Option<String>,
        /// Month (1-12) or "all"
        #[arg(long)]
        month: Option<String>,
        /// Division name or "all"
        #[arg(long)]
        bidang: Option<String>,
        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Spreadsheet report of the filtered listing
    Spreadsheet {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Create or update a profile
    Set {
        /// Account id
        id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Employee number
        #[arg(long)]
        nip: Option<String>,
        /// Job title ("Bendahara Pengeluaran" grants treasurer rights)
        #[arg(long)]
        jabatan: Option<String>,
        /// Division, or "all" to clear
        #[arg(long)]
        bidang: Option<String>,
    },
    /// Show one profile, or all
    Show {
        /// Account id
        id: Option<String>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options).await;
    let user = cli.user.as_deref();

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::List { filter } => spj::cmd_list(&settings, user, filter.into()).await,
        Commands::Add {
            nomor,
            kode_rekening,
            jenis,
            bidang,
            tanggal,
            uraian,
            jumlah,
            file,
        } => {
            let args = spj::AddArgs {
                nomor,
                kode_rekening,
                jenis,
                bidang,
                tanggal,
                uraian,
                jumlah,
                file,
            };
            spj::cmd_add(&settings, user, args).await
        }
        Commands::Delete { id } => spj::cmd_delete(&settings, user, &id).await,
        Commands::Export { command } => match command {
            ExportCommands::Archive {
                year,
                month,
                bidang,
                output,
            } => {
                export::cmd_export_archive(
                    &settings,
                    user,
                    year.as_deref(),
                    month.as_deref(),
                    bidang.as_deref(),
                    output.as_deref(),
                )
                .await
            }
            ExportCommands::Spreadsheet { filter, output } => {
                export::cmd_export_spreadsheet(&settings, user, filter.into(), output.as_deref())
                    .await
            }
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                id,
                first_name,
                last_name,
                nip,
                jabatan,
                bidang,
            } => {
                let args = profile::ProfileArgs {
                    first_name,
                    last_name,
                    nip,
                    jabatan,
                    bidang,
                };
                profile::cmd_profile_set(&settings, &id, args).await
            }
            ProfileCommands::Show { id } => profile::cmd_profile_show(&settings, id.as_deref()).await,
        },
    }
}
