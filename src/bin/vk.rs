//! VariantKey command line tool.

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use console::{Emoji, Term};

use variantkey::chrom::decode_chrom;
use variantkey::esid::{encode_string_id, hash_string_id};
use variantkey::refalt::decode_refalt;
use variantkey::regionkey::{regionkey, regionkey_hex};
use variantkey::variantkey::{decode_variantkey, parse_variantkey_hex, variantkey, variantkey_hex};

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
struct CommonArgs {
    /// Verbosity of the program
    #[clap(flatten)]
    verbose: Verbosity,
}

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Encode and decode genetic variants as sortable 64 bit VariantKeys",
    long_about = "Encodes and decodes genetic variants, genomic regions, and string \
identifiers as sortable 64 bit keys."
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: CommonArgs,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Encode a variant as a VariantKey.
    Key(KeyArgs),
    /// Decode a VariantKey hex string.
    Decode(DecodeArgs),
    /// Encode a genomic region as a RegionKey.
    Region(RegionArgs),
    /// Encode a string identifier as an ESID.
    Esid(EsidArgs),
}

/// Parsing of "key" sub command arguments.
#[derive(Debug, Args)]
struct KeyArgs {
    /// Chromosome name (e.g. "1", "X", "MT")
    chrom: String,
    /// 0-based position
    pos: u32,
    /// Reference allele
    reference: String,
    /// Alternate allele
    alt: String,
}

/// Parsing of "decode" sub command arguments.
#[derive(Debug, Args)]
struct DecodeArgs {
    /// 16-digit hex VariantKey
    hex: String,
}

/// Parsing of "region" sub command arguments.
#[derive(Debug, Args)]
struct RegionArgs {
    /// Chromosome name (e.g. "1", "X", "MT")
    chrom: String,
    /// Half-open interval start
    start: u32,
    /// Half-open interval end
    end: u32,
    /// Strand: -1, 0, or 1
    strand: i8,
}

/// Parsing of "esid" sub command arguments.
#[derive(Debug, Args)]
struct EsidArgs {
    /// String identifier to encode
    string: String,
}

fn run(command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::Key(args) => {
            let vk = variantkey(&args.chrom, args.pos, &args.reference, &args.alt);
            println!("{}", variantkey_hex(vk));
        }
        Commands::Decode(args) => {
            let vk = parse_variantkey_hex(&args.hex);
            let fields = decode_variantkey(vk);
            print!(
                "chrom={} pos={} refalt={:#010x}",
                decode_chrom(fields.chrom),
                fields.pos,
                fields.refalt
            );
            if let Some(refalt) = decode_refalt(fields.refalt) {
                print!(" ref={} alt={}", refalt.reference, refalt.alt);
            }
            println!();
        }
        Commands::Region(args) => {
            let rk = regionkey(&args.chrom, args.start, args.end, args.strand);
            println!("{}", regionkey_hex(rk));
        }
        Commands::Esid(args) => {
            let code = if args.string.len() <= 10 {
                encode_string_id(&args.string, 0)
            } else {
                hash_string_id(&args.string)
            };
            println!("{:016x}", code);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    let term = Term::stderr();
    let result = tracing::subscriber::with_default(collector, || run(&cli.command));

    match result {
        Ok(()) => {
            let _ = term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")));
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = term.write_line(&format!("error: {err:#}"));
            ExitCode::from(1)
        }
    }
}
