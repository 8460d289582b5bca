/*!
  Binary for the CLI of BitWeaving: bwv
*/

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences
)]

pub mod cli;
pub mod error;
mod load;
mod timing;

use std::fs::read_to_string;

use bitweave_physical::{
    columnar::{bitvector::BitVector, ScanStatistics},
    config::{LayoutPolicy, TableOptions},
    index::{build_index_into, compare_into, CompareOptions},
    management::bytesized::ByteSized,
    tabular::table::BwTable,
};
use clap::Parser;
use cli::{CliApp, Reporting};
use colored::Colorize;
use error::CliError;
use timing::TimedCode;

/// Collect the compare options from --where and --query.
fn compare_options(cli: &CliApp) -> Result<Vec<CompareOptions>, CliError> {
    let mut options = cli.query.compare_options();

    if let Some(filename) = &cli.query.query_file {
        let content = read_to_string(filename)?;
        let query: Vec<CompareOptions> =
            serde_json::from_str(&content).map_err(|error| CliError::QueryParsing {
                filename: filename.clone(),
                error,
            })?;

        log::debug!("Read {} compare options from {}", query.len(), filename.display());
        options.extend(query);
    }

    if options.is_empty() {
        return Err(CliError::NoQuery);
    }

    Ok(options)
}

/// Print every selected row together with the codes of all indexed columns.
fn print_rows(table: &BwTable, bitvector: &BitVector) -> Result<(), CliError> {
    let names: Vec<&str> = table.column_names().collect();
    println!("row\t{}", names.join("\t"));

    let mut iter = table.create_iterator(bitvector);
    while iter.advance() {
        let mut line = iter.row().unwrap_or_default().to_string();

        for name in &names {
            let code = iter.code(table.column(name)?)?;
            line.push('\t');
            line.push_str(&code.to_string());
        }

        println!("{line}");
    }

    Ok(())
}

fn print_short_report(num_rows: usize, statistics: &ScanStatistics) {
    let total = TimedCode::instance().timings().system_time();
    let scanning = TimedCode::instance().sub("Scanning").timings().system_time();

    let per_row = if num_rows > 0 {
        scanning.as_nanos() as f64 / num_rows as f64
    } else {
        0.0
    };

    println!(
        "Finished in {}{}, scanning took {}ms ({per_row:.2}ns per row).",
        total.as_millis().to_string().green().bold(),
        "ms".green().bold(),
        scanning.as_millis()
    );
    println!(
        "   {0: <18} {1:>12}",
        "Words read:", statistics.words_read
    );
    println!(
        "   {0: <18} {1:>12}",
        "Segments skipped:", statistics.segments_skipped
    );
}

fn print_memory_report(table: &BwTable, bitvector: &BitVector) -> Result<(), CliError> {
    println!("\nMemory:");
    for name in table.column_names() {
        let column = table.column(name)?;
        println!(
            "   {name}: {} bytes ({}, {} bits)",
            column.size_bytes(),
            column.layout(),
            column.bit_width()
        );
    }
    println!("   table: {} bytes", table.size_bytes());
    println!("   selection: {} bytes", bitvector.size_bytes());

    Ok(())
}

fn run(cli: CliApp) -> Result<(), CliError> {
    TimedCode::instance().start();

    let options = compare_options(&cli)?;

    let batch = TimedCode::measure("Loading", || load::load_csv(&cli.input, &cli.index))?;

    let policy = LayoutPolicy {
        vertical_from_width: cli.vertical_from_width,
    };
    let mut table = match &cli.store {
        Some(directory) => BwTable::new(
            directory,
            TableOptions {
                in_memory: false,
                delete_existing_files: true,
            },
        ),
        None => BwTable::in_memory(),
    };
    table.open()?;

    TimedCode::measure("Indexing", || {
        build_index_into(&mut table, &batch, &cli.index, &policy)
    })?;

    let mut bitvector = table.create_bitvector();
    let statistics = TimedCode::measure("Scanning", || {
        compare_into(&table, &options, &mut bitvector)
    })?;

    table.close()?;
    TimedCode::instance().stop();

    println!(
        "Selected {} of {} rows.",
        bitvector.count().to_string().green().bold(),
        table.num_rows()
    );

    if cli.print_rows {
        print_rows(&table, &bitvector)?;
    }

    let short = match cli.reporting {
        Reporting::None => false,
        Reporting::Auto => !cli.print_rows,
        _ => true,
    };
    if short {
        print_short_report(table.num_rows(), &statistics);
    }

    if matches!(cli.reporting, Reporting::Time | Reporting::All) {
        println!("\n{}", TimedCode::instance().create_tree_string("bwv")?);
    }

    if matches!(cli.reporting, Reporting::Mem | Reporting::All) {
        print_memory_report(&table, &bitvector)?;
    }

    Ok(())
}

fn main() {
    let cli = CliApp::parse();

    cli.logging.initialize_logging();
    log::info!("Version: {}", clap::crate_version!());
    log::debug!("Input file: {}", cli.input.display());

    run(cli).unwrap_or_else(|err| {
        log::error!("{} {err}", "error:".red().bold());
        std::process::exit(1)
    })
}
