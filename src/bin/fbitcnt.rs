use std::io::{self, BufWriter, Write};
use std::process;

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser};

use bitcnt_rs::bitcnt::{
    self, BitCounter, CounterConfig, DEFAULT_CHUNK_PAGES, SourceReport, TOTAL_NAME,
};
use bitcnt_rs::common::io::page_size;
use bitcnt_rs::common::{gnu_name, logger, reset_sigpipe};

const TOOL_NAME: &str = "fbitcnt";

#[derive(Parser)]
#[command(
    name = "bitcnt",
    about = "Print the number and share of one and zero bits in each FILE"
)]
struct Cli {
    /// Streaming chunk size, in memory pages
    #[arg(
        short = 'p',
        long = "chunk-pages",
        value_name = "N",
        default_value_t = DEFAULT_CHUNK_PAGES,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    chunk_pages: usize,

    /// Never memory-map inputs; always read them chunk by chunk
    #[arg(long = "no-mmap")]
    no_mmap: bool,

    /// Number of worker threads (default: one per CPU)
    #[arg(short = 'j', long = "threads", value_name = "N")]
    threads: Option<usize>,

    /// When to print a line with total counts; WHEN can be: auto, always, never, only
    #[arg(long = "total", value_name = "WHEN", default_value = "auto")]
    total: String,

    /// Log strategy decisions to stderr (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Files to process (reads stdin if none given, or for '-')
    files: Vec<String>,
}

fn main() {
    reset_sigpipe();
    let cli = Cli::parse();
    let tool = gnu_name(TOOL_NAME);
    logger::init(tool, cli.verbose);

    match cli.total.as_str() {
        "auto" | "always" | "only" | "never" => {}
        _ => {
            eprintln!("{}: invalid argument '{}' for '--total'", tool, cli.total);
            eprintln!("Valid arguments are:");
            eprintln!("  - 'auto'");
            eprintln!("  - 'always'");
            eprintln!("  - 'only'");
            eprintln!("  - 'never'");
            eprintln!("Try '{} --help' for more information.", tool);
            process::exit(1);
        }
    }

    match run(&cli, tool) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}: {:#}", tool, e);
            process::exit(1);
        }
    }
}

/// Count every input and print the report. Returns false if any source
/// failed; setup failures that stop all counting are errors.
fn run(cli: &Cli, tool: &str) -> anyhow::Result<bool> {
    let page_size = page_size().context("error getting page size")?;
    let mut config = CounterConfig::from_page_size(page_size, cli.chunk_pages)
        .ok_or_else(|| anyhow!("chunk size of {} pages is too large", cli.chunk_pages))?;
    config.allow_mmap = !cli.no_mmap;
    log::debug!(
        "page size {}, chunk size {}, mmap {}",
        page_size,
        config.chunk_size,
        if config.allow_mmap { "on" } else { "off" }
    );
    let counter = BitCounter::new(config);

    let files: Vec<String> = if cli.files.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.files.clone()
    };

    let pool = bitcnt::build_pool(cli.threads).context("could not start worker pool")?;
    let reports: Vec<SourceReport> = pool.install(|| bitcnt::count_inputs(&counter, &files));

    let show_total = match cli.total.as_str() {
        "always" | "only" => true,
        "never" => false,
        _ => files.len() > 1, // "auto"
    };
    let only_total = cli.total == "only";

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut ok = true;

    for report in &reports {
        match &report.result {
            Ok(count) => {
                if !only_total {
                    bitcnt::write_count(&mut out, count, &report.name)?;
                }
            }
            Err(e) => {
                let _ = out.flush();
                eprintln!("{}: {}", tool, e);
                ok = false;
            }
        }
    }

    if show_total {
        let total = bitcnt::grand_total(&reports);
        bitcnt::write_count(&mut out, &total, TOTAL_NAME)?;
    }

    out.flush()?;
    Ok(ok)
}
