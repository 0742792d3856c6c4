use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::*;
use uf2merge_core::{MergePolicy, boards::BoardIter};

use std::{error::Error, io::Write, path::PathBuf, process::ExitCode};

use crate::{
    dump::dump,
    merge::merge_files,
    validate::{VALIDATION_FAILED, report_check},
};

mod dump;
mod merge;
mod output;
mod reporter;
mod validate;

#[derive(Subcommand, Debug)]
enum Command {
    /// Concatenate two UF2 files, truncating before the erase region unless it is appended
    #[command(arg_required_else_help = true)]
    Combine {
        /// First input UF2 file
        input1: PathBuf,

        /// Second input UF2 file
        input2: PathBuf,

        /// Output UF2 file
        output: PathBuf,

        /// Append zeroed blocks covering the erase region
        #[clap(long)]
        include_erase: bool,
    },
    /// Merge two ordered UF2 files, zero filling the gap between them and the rest of flash
    #[command(arg_required_else_help = true)]
    GapFill {
        /// Lower UF2 file
        first: PathBuf,

        /// Higher UF2 file
        second: PathBuf,

        /// Output UF2 file
        output: PathBuf,
    },
    /// Print the header of every block in a UF2 file
    #[command(arg_required_else_help = true)]
    Dump {
        /// UF2 file
        file: PathBuf,
    },
    /// Check that a UF2 file is well formed and consistently numbered
    #[command(arg_required_else_help = true)]
    Validate {
        /// UF2 file
        file: PathBuf,
    },
}

fn board_parser(s: &str) -> Result<String, String> {
    if let Some(board) = BoardIter::find_by_name(s) {
        Ok(board.board_name())
    } else {
        Err(format!("Unknown board '{}'", s))
    }
}

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Set the logging verbosity
    #[clap(short, long, value_enum, global = true, default_value_t = LogLevel::Info)]
    verbose: LogLevel,

    /// Board whose flash layout bounds the merge (rp2040, rp2350)
    #[clap(short, long, global = true, default_value = "rp2040", value_parser = board_parser)]
    board: String,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

fn run(command: Command, board: &str) -> Result<ExitCode, Box<dyn Error>> {
    let board =
        BoardIter::find_by_name(board).expect("This already has been verified by board_parser");

    match command {
        Command::Combine {
            input1,
            input2,
            output,
            include_erase,
        } => merge_files(
            &[input1, input2],
            &output,
            MergePolicy::Combine { include_erase },
            board.as_ref(),
        )
        .map(ExitCode::from),
        Command::GapFill {
            first,
            second,
            output,
        } => merge_files(
            &[first, second],
            &output,
            MergePolicy::GapFill,
            board.as_ref(),
        )
        .map(ExitCode::from),
        Command::Dump { file } => dump(&file).map(|_| ExitCode::SUCCESS),
        Command::Validate { file } => Ok(if report_check(&file) {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(VALIDATION_FAILED)
        }),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    env_logger::Builder::from_env(Env::default())
        .filter_level(cli.verbose.into())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            let level = record.level();
            if level == Level::Info {
                writeln!(buf, "{}", record.args())
            } else {
                writeln!(buf, "{}: {}", record.level(), record.args())
            }
        })
        .init();

    let command = match cli.command {
        Some(command) => command,
        None => return ExitCode::SUCCESS,
    };

    match run(command, &cli.board) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
