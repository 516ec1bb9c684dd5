mod budgets;
mod categorizer;
mod cli;
mod dashboard;
mod db;
mod error;
mod extractor;
mod fallback;
mod fmt;
mod importer;
mod models;
mod rules;
mod settings;
mod transactions;

use clap::Parser;

use cli::{BudgetCommands, Cli, Commands, RulesCommands, TxCommands};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import {
            file,
            format,
            force,
            dry_run,
        } => cli::import::run(&file, &format, force, dry_run),
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                pattern,
                category,
                txn_type,
                sub_type,
                match_type,
                case_sensitive,
                amount_op,
                amount,
                priority,
            } => cli::rules::add(cli::rules::AddArgs {
                pattern,
                category,
                txn_type,
                sub_type,
                match_type,
                case_sensitive,
                amount_op,
                amount,
                priority,
            }),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Update {
                id,
                pattern,
                category,
                txn_type,
                sub_type,
                match_type,
                case_sensitive,
                amount_op,
                amount,
                clear_amount,
                priority,
                active,
            } => cli::rules::update(
                id,
                cli::rules::UpdateArgs {
                    pattern,
                    category,
                    txn_type,
                    sub_type,
                    match_type,
                    case_sensitive,
                    amount_op,
                    amount,
                    clear_amount,
                    priority,
                    active,
                },
            ),
            RulesCommands::Delete { id, soft } => cli::rules::delete(id, soft),
            RulesCommands::Apply => cli::rules::apply(),
        },
        Commands::Budget { command } => match command {
            BudgetCommands::Set {
                txn_type,
                category,
                sub_type,
                year,
                month,
                amount,
            } => cli::budget::set(&txn_type, &category, sub_type, year, month, &amount),
            BudgetCommands::List { year } => cli::budget::list(year),
            BudgetCommands::Delete { id } => cli::budget::delete(id),
        },
        Commands::Tx { command } => match command {
            TxCommands::List {
                year,
                month,
                txn_type,
                category,
                min,
                max,
                limit,
                offset,
            } => cli::tx::list(cli::tx::ListArgs {
                year,
                month,
                txn_type,
                category,
                min,
                max,
                limit,
                offset,
            }),
            TxCommands::Edit {
                id,
                txn_type,
                category,
                sub_type,
            } => cli::tx::edit(id, txn_type.as_deref(), &category, sub_type.as_deref()),
            TxCommands::Delete { id } => cli::tx::delete(id),
        },
        Commands::Summary { year, month, json } => cli::summary::summary(year, month, json),
        Commands::Trend {
            year,
            categories,
            json,
        } => cli::summary::trend(year, categories, json),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
