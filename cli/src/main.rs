//! xlsx2csv CLI - spreadsheet to CSV conversion tool
//!
//! Converts one sheet, or every sheet, of an .xlsx workbook to CSV.

use clap::{Parser, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use xlsx2csv::{ConvertOptions, Converter, HyperlinkStyle, LineTerminator};

/// Convert xlsx spreadsheets to CSV
#[derive(Parser)]
#[command(
    name = "xlsx2csv",
    author = "iyulab",
    version,
    about = "Convert xlsx spreadsheets to CSV",
    long_about = "xlsx2csv - Office Open XML spreadsheet to CSV converter.\n\n\
                  Writes the selected sheet to OUTFILE (default: stdout). With --all and an\n\
                  OUTFILE, every sheet is written to OUTFILE/<sheet name>.csv."
)]
struct Cli {
    /// Input workbook (.xlsx, .xlsm, .xltx)
    infile: PathBuf,

    /// Output file, or output directory with --all (default: stdout)
    outfile: Option<PathBuf>,

    /// Export all sheets
    #[arg(short, long)]
    all: bool,

    /// Sheet number to convert (1-based)
    #[arg(short, long, value_name = "NUMBER")]
    sheet: Option<usize>,

    /// Sheet name to convert
    #[arg(short = 'n', long = "sheetname", value_name = "NAME")]
    sheet_name: Option<String>,

    /// Column delimiter; 'tab' or 'x09' for a tab (default: ',')
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Override date format (ex. %Y/%m/%d)
    #[arg(short = 'f', long = "dateformat", value_name = "FORMAT")]
    date_format: Option<String>,

    /// Override time format (ex. %H:%M)
    #[arg(short = 't', long = "timeformat", value_name = "FORMAT")]
    time_format: Option<String>,

    /// Fixed number of decimals for plain numbers
    #[arg(long = "floatprecision", value_name = "DIGITS")]
    float_precision: Option<usize>,

    /// Skip empty lines
    #[arg(short = 'i', long = "ignoreempty")]
    ignore_empty: bool,

    /// Escape \r\n\t characters
    #[arg(short, long)]
    escape: bool,

    /// Separator line between sheets; pass '' for none (default: '--------')
    #[arg(short = 'p', long = "sheetdelimiter", value_name = "LINE")]
    sheet_delimiter: Option<String>,

    /// Include hyperlinks
    #[arg(long)]
    hyperlinks: bool,

    /// How hyperlinks are written
    #[arg(long, value_name = "STYLE")]
    hyperlink_style: Option<LinkStyle>,

    /// Only include sheets matching the pattern (with --all)
    #[arg(short = 'I', long = "include_sheet_pattern", value_name = "PATTERN")]
    include_sheet_pattern: Vec<String>,

    /// Exclude sheets matching the pattern (with --all)
    #[arg(short = 'E', long = "exclude_sheet_pattern", value_name = "PATTERN")]
    exclude_sheet_pattern: Vec<String>,

    /// Skip hidden sheets (with --all)
    #[arg(long)]
    exclude_hidden: bool,

    /// Repeat merged cell values into every covered cell
    #[arg(short, long = "merge-cells")]
    merge_cells: bool,

    /// Detect dates and times in unknown custom number formats
    #[arg(long)]
    infer_dates: bool,

    /// End lines with \r\n
    #[arg(long)]
    crlf: bool,

    /// Load settings from a JSON file; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the resolved settings as JSON and exit
    #[arg(long)]
    dump_options: bool,

    /// List sheet names and exit
    #[arg(long)]
    list_sheets: bool,

    /// Overwrite existing output files
    #[arg(long)]
    force: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Hyperlink rendering
#[derive(Clone, Copy, ValueEnum)]
enum LinkStyle {
    /// text [url]
    Inline,
    /// <a href='url'>text</a>
    Html,
    /// URL in an extra trailing column
    Column,
}

impl From<LinkStyle> for HyperlinkStyle {
    fn from(style: LinkStyle) -> Self {
        match style {
            LinkStyle::Inline => HyperlinkStyle::Inline,
            LinkStyle::Html => HyperlinkStyle::Html,
            LinkStyle::Column => HyperlinkStyle::Column,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(&cli)?;

    if cli.dump_options {
        println!("{}", options.to_json()?);
        return Ok(());
    }

    options.validate()?;
    let converter = Converter::open(&cli.infile)?;
    log::info!(
        "{}: {} sheets",
        cli.infile.display(),
        converter.workbook().sheets.len()
    );

    if cli.list_sheets {
        print_sheets(&converter);
        return Ok(());
    }

    match cli.outfile {
        Some(dir) if options.all_sheets => write_dir(&converter, &dir, &options, cli.force)?,
        Some(path) => {
            converter.convert_to_path(&path, &options, cli.force)?;
            println!(
                "{} Converted to CSV: {}",
                "✓".green().bold(),
                path.display()
            );
        }
        None => {
            let csv = converter.convert(&options)?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(csv.as_bytes())?;
            handle.flush()?;
        }
    }

    Ok(())
}

/// Settings from `--config` (or defaults), overridden by flags.
fn build_options(cli: &Cli) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut options = match &cli.config {
        Some(path) => ConvertOptions::from_json(&fs::read_to_string(path)?)?,
        None => ConvertOptions::default(),
    };

    if cli.all {
        options.all_sheets = true;
    }
    if let Some(number) = cli.sheet {
        options.sheet_number = Some(number);
    }
    if let Some(name) = &cli.sheet_name {
        options.sheet_name = Some(name.clone());
    }
    if let Some(delimiter) = &cli.delimiter {
        options.delimiter = delimiter.clone();
    }
    if let Some(format) = &cli.date_format {
        options.date_format = Some(format.clone());
    }
    if let Some(format) = &cli.time_format {
        options.time_format = Some(format.clone());
    }
    if let Some(precision) = cli.float_precision {
        options.float_precision = Some(precision);
    }
    if let Some(separator) = &cli.sheet_delimiter {
        options.sheet_separator = separator.clone();
    }
    if let Some(style) = cli.hyperlink_style {
        options.hyperlink_style = style.into();
        options.include_hyperlinks = true;
    }
    if cli.crlf {
        options.line_terminator = LineTerminator::Crlf;
    }

    options.ignore_empty_lines |= cli.ignore_empty;
    options.escape_control_chars |= cli.escape;
    options.include_hyperlinks |= cli.hyperlinks;
    options.exclude_hidden_sheets |= cli.exclude_hidden;
    options.merge_cells |= cli.merge_cells;
    options.infer_custom_date_formats |= cli.infer_dates;
    options
        .include_sheet_patterns
        .extend(cli.include_sheet_pattern.iter().cloned());
    options
        .exclude_sheet_patterns
        .extend(cli.exclude_sheet_pattern.iter().cloned());

    Ok(options)
}

fn print_sheets(converter: &Converter) {
    let workbook = converter.workbook();
    println!("{}", "Sheets".cyan().bold());
    println!("{}", "─".repeat(40));
    for sheet in &workbook.sheets {
        let hidden = if sheet.hidden {
            " (hidden)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("{:>3}  {}{}", sheet.index, sheet.name, hidden);
    }
}

fn write_dir(
    converter: &Converter,
    dir: &Path,
    options: &ConvertOptions,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = create_spinner("Converting sheets...");
    let result = converter.convert_to_dir_with(dir, options, force, |sheet| {
        pb.set_message(format!("Converting {}...", sheet.name));
    });
    pb.finish_and_clear();
    let written = result?;

    if written.is_empty() {
        println!("{} No sheets matched", "!".yellow().bold());
    } else {
        println!(
            "{} Converted {} sheets to {}",
            "✓".green().bold(),
            written.len(),
            dir.display()
        );
    }
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
