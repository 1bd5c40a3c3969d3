use std::{
    collections::BTreeSet,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};
use roam_mine::calendar::{DateRange, build_calendar, month_range};
use roam_mine::core::{Page, Pattern};
use roam_mine::dates::{month_for_date, parse_date};
use roam_mine::months::{MonthResults, filter_months, format_month, process};
use roam_mine::storage::{JsonPageLoader, PageLoader, parse_pages_from_reader};

#[derive(Debug, Parser)]
#[command(
    name = "roam-mine",
    about = "Mine Roam daily pages and build calendar outlines",
    version
)]
struct Cli {
    /// Enable verbose logging for debugging.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect the first matching block of each day page, grouped by month.
    Mine(MineArgs),

    /// Print a Roam table calendar linking each requested day.
    Calendar(CalendarArgs),
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("pattern")
        .required(true)
        .args(["match_string", "match_regex"])
))]
struct MineArgs {
    /// Match blocks containing the given text.
    #[arg(short = 's', long)]
    match_string: Option<String>,
    /// Match blocks whose entire text matches the given regular expression.
    #[arg(short = 'r', long)]
    match_regex: Option<String>,
    /// Only return results for the month containing the given date.
    #[arg(short, long)]
    month: Option<String>,
    /// Use the given Roam JSON export as input. If absent, reads stdin.
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Emit JSON instead of Roam outline text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CalendarArgs {
    /// Dates to place on the calendar (e.g. 2020-08-01 or "August 1st, 2020").
    dates: Vec<String>,
    /// Use every day of the month containing this date.
    #[arg(long, conflicts_with_all = ["dates", "from", "to"])]
    month: Option<String>,
    /// Inclusive start date (YYYY-MM-DD).
    #[arg(long, requires = "to", conflicts_with = "dates")]
    from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD).
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
    /// Emit the outline node tree as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Mine(args) => handle_mine(args),
        Commands::Calendar(args) => handle_calendar(args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn handle_mine(args: MineArgs) -> Result<()> {
    let output = mine_output(&args)?;
    if output.is_empty() {
        log::debug!("No matching blocks found for the provided inputs.");
    }
    write_output(&mut io::stdout().lock(), &output)
}

/// Print `output` as one or more lines; an empty result is a single blank line.
fn write_output(out: &mut impl Write, output: &str) -> Result<()> {
    out.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

fn mine_output(args: &MineArgs) -> Result<String> {
    let pattern = pattern_from_args(args)?;
    let target_month = args
        .month
        .as_deref()
        .map(month_for_date)
        .transpose()
        .context("resolving --month")?;

    let pages = load_pages(args.file.as_ref())?;
    log::debug!("searching {} pages for {:?}", pages.len(), pattern.title());

    let results = process(&pattern, &pages).context("grouping day pages by month")?;
    let results = filter_months(target_month.as_deref(), results);
    log::debug!("{} months with matches", results.len());

    render_results(&pattern, &results, args.json)
}

fn pattern_from_args(args: &MineArgs) -> Result<Pattern> {
    match (&args.match_string, &args.match_regex) {
        (Some(text), _) => Ok(Pattern::from_kind("literal", text)?),
        (None, Some(source)) => Ok(Pattern::from_kind("regex", source)?),
        (None, None) => anyhow::bail!("one of --match-string or --match-regex is required"),
    }
}

fn load_pages(file: Option<&PathBuf>) -> Result<Vec<Page>> {
    match file {
        Some(path) => {
            log::debug!("reading export {:?}", path);
            JsonPageLoader
                .load_file(path)
                .with_context(|| format!("loading {:?}", path))
        }
        None => {
            log::debug!("reading export from stdin");
            parse_pages_from_reader(io::stdin().lock()).context("loading export from stdin")
        }
    }
}

fn render_results(pattern: &Pattern, results: &MonthResults, json: bool) -> Result<String> {
    if results.is_empty() {
        return Ok(String::new());
    }
    if json {
        return Ok(serde_json::to_string_pretty(results)?);
    }
    let months: Vec<String> = results
        .values()
        .filter_map(|matches| format_month(pattern.title(), Some(matches.as_slice())))
        .collect();
    Ok(months.join("\n\n"))
}

fn handle_calendar(args: CalendarArgs) -> Result<()> {
    let dates = calendar_dates(&args)?;
    log::debug!("building calendar for {} dates", dates.len());
    let table = build_calendar(&dates).context("building calendar")?;
    let outline = table.to_outline();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outline)?);
    } else {
        print!("{}", outline.render());
    }
    Ok(())
}

fn calendar_dates(args: &CalendarArgs) -> Result<BTreeSet<NaiveDate>> {
    if let Some(month) = &args.month {
        let date = parse_date(month).context("resolving --month")?;
        return Ok(month_range(date).days().collect());
    }

    if let (Some(first), Some(last)) = (args.from, args.to) {
        if last < first {
            anyhow::bail!("--to {last} is before --from {first}");
        }
        return Ok(DateRange { first, last }.days().collect());
    }

    args.dates
        .iter()
        .map(|text| parse_date(text).with_context(|| format!("parsing date {text:?}")))
        .collect()
}
