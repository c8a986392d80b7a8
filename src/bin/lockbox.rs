//! Lockbox CLI - Password-based file encryption
//!
//! Command-line interface for encrypting and decrypting files using
//! AES-256-CBC with PBKDF2 key derivation.

use clap::{Parser, Subcommand};
use std::error::Error as _;
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use lockbox::error::Result;
use lockbox::file_ops;
use lockbox::passphrase::{
    AdvisingPassphraseReader, PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader,
};
use lockbox::selection::Selection;

#[derive(Parser)]
#[command(name = "lockbox")]
#[command(version)]
#[command(about = "Password-based file encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Log what is being done to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the container to [default: FILE.encrypted]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the container to be decrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the decrypted contents to [default: FILE with
        /// ".encrypted" replaced by ".decrypted"]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli.command, cli.passphrase_stdin);
    match result {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            process::exit(1);
        }
    }
}

fn run(command: Commands, passphrase_stdin: bool) -> Result<PathBuf> {
    match command {
        Commands::Encrypt { input, output } => {
            let mut reader =
                AdvisingPassphraseReader::new(get_passphrase_reader(passphrase_stdin), io::stderr());
            match output {
                Some(output) => {
                    file_ops::encrypt_file(&input, &output, &mut reader)?;
                    Ok(output)
                }
                None => Selection::new(input).encrypt(&mut reader),
            }
        }
        Commands::Decrypt { input, output } => {
            let mut reader = get_passphrase_reader(passphrase_stdin);
            match output {
                Some(output) => {
                    file_ops::decrypt_file(&input, &output, &mut *reader)?;
                    Ok(output)
                }
                None => Selection::new(input).decrypt(&mut *reader),
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}
