//! Contains structures and functionality for the binary
use std::path::PathBuf;

use bitweave_physical::{
    columnar::code::{Code, Layout},
    config::DEFAULT_VERTICAL_FROM_WIDTH,
    index::{ColumnIndexUnit, CompareOptions, CompareOptionsUnit},
    predicate::{CombineOp, Comparator},
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Possible settings for the reporting option.
#[derive(clap::ValueEnum, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub(crate) enum Reporting {
    /// Disable reporting.
    None,
    /// Print short report if no rows are printed. Otherwise disable reporting.
    #[default]
    Auto,
    /// Print short report.
    Short,
    /// Print short report and detailed timing.
    Time,
    /// Print short report and memory usage.
    Mem,
    /// Print short report and all details on timing and memory usage.
    All,
}

/// Cli Arguments related to logging
#[derive(clap::Args, Debug)]
pub(crate) struct LoggingArgs {
    /// Increase log verbosity (multiple uses increase verbosity further)
    #[arg(short, long, action = clap::builder::ArgAction::Count, group = "verbosity")]
    verbose: u8,
    /// Reduce log verbosity to show only errors (equivalent to --log error)
    #[arg(short, long, group = "verbosity")]
    quiet: bool,
    /// Set log verbosity (default is "warn")
    #[arg(long = "log", value_parser=clap::builder::PossibleValuesParser::new(["error", "warn", "info", "debug", "trace"]), group = "verbosity")]
    log_level: Option<String>,
}

impl LoggingArgs {
    /// Initialising Logging
    ///
    /// Sets the logging verbosity to the given log-level in the following order:
    ///  * `Info`, `Debug`, `Trace`; depending on the count of `-v`
    ///  * `Error` when `-q` is used
    ///  * The `BWV_LOG` environment variable value
    ///  * `Warn` otherwise
    pub(crate) fn initialize_logging(&self) {
        let mut builder = env_logger::Builder::new();

        // Default log level
        builder.filter_level(log::LevelFilter::Warn);

        builder.parse_env("BWV_LOG");
        if let Some(ref level) = self.log_level {
            builder.parse_filters(level);
        } else if self.quiet {
            builder.filter_level(log::LevelFilter::Error);
        } else if self.verbose > 0 {
            builder.filter_level(match self.verbose {
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            });
        }
        builder.init();
    }
}

/// Cli arguments describing which rows to select
#[derive(clap::Args, Debug)]
pub(crate) struct QueryArgs {
    /// Predicate of the form "COLUMN OP CONSTANT" with OP one of =, !=, <, <=, >, >=;
    /// predicates are intersected unless prefixed with "or:"
    #[arg(short, long = "where", value_parser = parse_where_clause, action = clap::ArgAction::Append)]
    pub(crate) predicates: Vec<WhereClause>,
    /// JSON file containing a list of compare options, applied after all --where predicates
    #[arg(long = "query")]
    pub(crate) query_file: Option<PathBuf>,
}

/// BitWeaving CLI
#[derive(clap::Parser, Debug)]
#[command(name = "bwv", author, version, about)]
pub struct CliApp {
    /// CSV file with a header row
    #[arg(value_parser)]
    pub(crate) input: PathBuf,
    /// Column to index, given as NAME:WIDTH or NAME:WIDTH:LAYOUT with LAYOUT one of h, v
    #[arg(short, long = "index", value_parser = parse_index_unit, action = clap::ArgAction::Append, required = true)]
    pub(crate) index: Vec<ColumnIndexUnit>,
    /// Bit width from which columns without explicit layout are stored vertically
    #[arg(long = "vertical-from", default_value_t = DEFAULT_VERTICAL_FROM_WIDTH)]
    pub(crate) vertical_from_width: u8,
    /// Arguments related to the selection
    #[command(flatten)]
    pub(crate) query: QueryArgs,
    /// Print index and codes of every selected row
    #[arg(long = "print-rows")]
    pub(crate) print_rows: bool,
    /// Directory in which the index columns are stored
    #[arg(long = "store")]
    pub(crate) store: Option<PathBuf>,
    /// Control amount of reporting printed by the program
    #[arg(long = "report", value_enum, default_value_t)]
    pub(crate) reporting: Reporting,
    /// Arguments related to logging
    #[command(flatten)]
    pub(crate) logging: LoggingArgs,
}

/// A single predicate given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WhereClause {
    /// Name of the compared column
    pub(crate) column: String,
    /// Comparison
    pub(crate) comparator: Comparator,
    /// Constant compared against
    pub(crate) constant: Code,
    /// Whether the clause is united with the previous ones
    pub(crate) disjunctive: bool,
}

/// Pattern of a predicate given with --where
static WHERE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?P<or>or)\s*:)?\s*(?P<column>[^\s<>=!]+)\s*(?P<op><=|>=|!=|<>|==|=|<|>)\s*(?P<constant>\d+)\s*$").unwrap()
});

/// Parse a predicate of the form "[or:]COLUMN OP CONSTANT".
fn parse_where_clause(s: &str) -> Result<WhereClause, String> {
    let captures = WHERE_CLAUSE
        .captures(s)
        .ok_or_else(|| format!("expected \"COLUMN OP CONSTANT\", found \"{s}\""))?;

    let comparator = captures["op"]
        .parse::<Comparator>()
        .map_err(|error| error.to_string())?;
    let constant = captures["constant"]
        .parse::<Code>()
        .map_err(|error| format!("invalid constant: {error}"))?;

    Ok(WhereClause {
        column: captures["column"].to_string(),
        comparator,
        constant,
        disjunctive: captures.name("or").is_some(),
    })
}

/// Parse a column to index of the form "NAME:WIDTH[:LAYOUT]".
fn parse_index_unit(s: &str) -> Result<ColumnIndexUnit, String> {
    let mut parts = s.split(':');

    let name = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| format!("missing column name in \"{s}\""))?;
    let bit_width = parts
        .next()
        .ok_or_else(|| format!("missing bit width in \"{s}\""))?
        .parse::<u8>()
        .map_err(|error| format!("invalid bit width in \"{s}\": {error}"))?;

    let mut unit = ColumnIndexUnit::new(name, bit_width);
    if let Some(layout) = parts.next() {
        unit = unit.with_layout(layout.parse::<Layout>().map_err(|error| error.to_string())?);
    }

    if parts.next().is_some() {
        return Err(format!("expected NAME:WIDTH[:LAYOUT], found \"{s}\""));
    }

    Ok(unit)
}

impl QueryArgs {
    /// Translate the --where clauses into compare options.
    ///
    /// The first clause overwrites the selection, later ones are intersected
    /// or, if marked as such, united with it.
    pub(crate) fn compare_options(&self) -> Vec<CompareOptions> {
        let mut result: Vec<CompareOptions> = Vec::new();

        for (position, clause) in self.predicates.iter().enumerate() {
            let combine_op = if position == 0 {
                CombineOp::Set
            } else if clause.disjunctive {
                CombineOp::Or
            } else {
                CombineOp::And
            };
            let unit = CompareOptionsUnit::new(clause.comparator, clause.constant, combine_op);

            match result.last_mut() {
                Some(last) if last.column == clause.column => last.units.push(unit),
                _ => result.push(CompareOptions::new(clause.column.as_str()).with_unit(unit)),
            }
        }

        result
    }
}

#[cfg(test)]
mod test {
    use bitweave_physical::{
        columnar::code::Layout,
        predicate::{CombineOp, Comparator},
    };
    use test_log::test;

    use super::{parse_index_unit, parse_where_clause, QueryArgs};

    #[test]
    fn index_units() {
        let unit = parse_index_unit("price:12").unwrap();
        assert_eq!(unit.name, "price");
        assert_eq!(unit.bit_width, 12);
        assert_eq!(unit.layout, None);

        let unit = parse_index_unit("flag:1:v").unwrap();
        assert_eq!(unit.layout, Some(Layout::Vertical));

        assert!(parse_index_unit("price").is_err());
        assert!(parse_index_unit(":3").is_err());
        assert!(parse_index_unit("price:many").is_err());
        assert!(parse_index_unit("price:3:x").is_err());
        assert!(parse_index_unit("price:3:h:v").is_err());
    }

    #[test]
    fn where_clauses() {
        let clause = parse_where_clause("A >= 10").unwrap();
        assert_eq!(clause.column, "A");
        assert_eq!(clause.comparator, Comparator::GreaterEqual);
        assert_eq!(clause.constant, 10);
        assert!(!clause.disjunctive);

        let clause = parse_where_clause("or: B<>3").unwrap();
        assert_eq!(clause.column, "B");
        assert_eq!(clause.comparator, Comparator::NotEqual);
        assert!(clause.disjunctive);

        assert!(parse_where_clause("A => 3").is_err());
        assert!(parse_where_clause("A < -3").is_err());
        assert!(parse_where_clause("< 3").is_err());
    }

    #[test]
    fn clauses_to_options() {
        let query = QueryArgs {
            predicates: ["A > 9", "A < 20", "B < 10", "or: B = 63"]
                .into_iter()
                .map(|clause| parse_where_clause(clause).unwrap())
                .collect(),
            query_file: None,
        };

        let options = query.compare_options();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].column, "A");
        assert_eq!(
            options[0]
                .units
                .iter()
                .map(|unit| unit.combine_op)
                .collect::<Vec<_>>(),
            vec![CombineOp::Set, CombineOp::And]
        );
        assert_eq!(
            options[1]
                .units
                .iter()
                .map(|unit| unit.combine_op)
                .collect::<Vec<_>>(),
            vec![CombineOp::And, CombineOp::Or]
        );
    }
}
