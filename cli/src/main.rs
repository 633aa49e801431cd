//! thesisfmt CLI - thesis formatting checker and fixer

mod oracle;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use thesisfmt::render::{self, JsonFormat};
use thesisfmt::{
    detect_format_from_path, CitationStyle, ClassifierConfig, CompareOptions, ParagraphRole,
    ParsedThesis, ReconstructOptions, RequirementSpec, Thesisfmt,
};

use crate::oracle::{load_endpoints, ChatOracle};

#[derive(Parser)]
#[command(name = "thesisfmt")]
#[command(author = "thesisfmt contributors")]
#[command(version)]
#[command(about = "Check and fix thesis formatting in DOCX documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a document against a requirement file
    Check {
        /// Input DOCX file
        #[arg(value_name = "DOC")]
        input: PathBuf,

        /// Requirement specification (JSON)
        #[arg(short, long, value_name = "JSON")]
        requirements: PathBuf,

        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Skip document structure checks
        #[arg(long)]
        no_structure: bool,

        #[command(flatten)]
        oracle: OracleArgs,
    },

    /// Write a corrected copy of a document
    Fix {
        /// Input DOCX file
        #[arg(value_name = "DOC")]
        input: PathBuf,

        /// Requirement specification (JSON)
        #[arg(short, long, value_name = "JSON")]
        requirements: PathBuf,

        /// Output file (defaults to <name>.fixed.docx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Color paragraphs with violations red
        #[arg(long)]
        highlight: bool,

        /// Build a new document instead of editing the original
        #[arg(long)]
        recreate: bool,

        /// Also format paragraphs inside tables
        #[arg(long)]
        table_cells: bool,

        #[command(flatten)]
        oracle: OracleArgs,
    },

    /// Print paragraph records as JSON
    Extract {
        /// Input DOCX file
        #[arg(value_name = "DOC")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show the role assigned to each paragraph
    Classify {
        /// Input DOCX file
        #[arg(value_name = "DOC")]
        input: PathBuf,

        #[command(flatten)]
        oracle: OracleArgs,
    },

    /// Derive a requirement file from a reference document
    Derive {
        /// Correctly formatted reference DOCX
        #[arg(value_name = "REFERENCE_DOC")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check the reference list against a citation style
    Cite {
        /// Input DOCX file
        #[arg(value_name = "DOC")]
        input: PathBuf,

        /// Citation style (gbt7714, apa, mla)
        #[arg(short, long, default_value = "gbt7714")]
        style: String,
    },

    /// Show document information
    Info {
        /// Input DOCX file
        #[arg(value_name = "DOC")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct OracleArgs {
    /// Endpoint key file: {name: {base_url, api_key, model_name}}
    #[arg(long, value_name = "FILE", requires = "model")]
    oracle_keys: Option<PathBuf>,

    /// Endpoint name in the key file
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// API key, overriding the key file
    #[arg(long, env = "THESISFMT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Concurrent oracle calls per window
    #[arg(long, default_value = "10")]
    window: usize,

    /// Oracle call timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Skip the verification pass
    #[arg(long)]
    no_verify: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
    /// Compact JSON
    Compact,
}

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            input,
            requirements,
            format,
            output,
            no_structure,
            oracle,
        } => cmd_check(&input, &requirements, format, output.as_deref(), no_structure, &oracle),
        Commands::Fix {
            input,
            requirements,
            output,
            highlight,
            recreate,
            table_cells,
            oracle,
        } => {
            let options = ReconstructOptions::new()
                .with_highlight(highlight)
                .with_table_cells(table_cells);
            cmd_fix(&input, &requirements, output.as_deref(), options, recreate, &oracle)
        }
        Commands::Extract {
            input,
            output,
            compact,
        } => cmd_extract(&input, output.as_deref(), compact),
        Commands::Classify { input, oracle } => cmd_classify(&input, &oracle),
        Commands::Derive { input, output } => cmd_derive(&input, output.as_deref()),
        Commands::Cite { input, style } => cmd_cite(&input, &style),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn progress(steps: u64) -> ProgressBar {
    let pb = ProgressBar::new(steps);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

fn pipeline(oracle: &OracleArgs) -> CliResult<Thesisfmt> {
    let timeout = Duration::from_secs(oracle.timeout);
    let config = ClassifierConfig::new()
        .with_window_size(oracle.window)
        .with_timeout(timeout)
        .with_verification(!oracle.no_verify);
    let mut builder = Thesisfmt::new().lenient().with_classifier_config(config);

    if let (Some(keys), Some(model)) = (&oracle.oracle_keys, &oracle.model) {
        let mut endpoints = load_endpoints(keys)?;
        let endpoint = endpoints
            .remove(model)
            .ok_or_else(|| format!("model '{}' not found in {}", model, keys.display()))?;
        let client = ChatOracle::new(endpoint, oracle.api_key.clone(), timeout)?;
        builder = builder.with_oracle(Arc::new(client));
    }
    Ok(builder)
}

fn write_or_print(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn open_classified(input: &Path, builder: &Thesisfmt, pb: &ProgressBar) -> CliResult<ParsedThesis> {
    pb.set_message("Parsing and classifying...");
    let thesis = builder.open(input)?;
    pb.inc(1);
    Ok(thesis)
}

fn cmd_check(
    input: &Path,
    requirements: &Path,
    format: ReportFormat,
    output: Option<&Path>,
    no_structure: bool,
    oracle: &OracleArgs,
) -> CliResult {
    let spec = RequirementSpec::from_path(requirements)?;
    let compare = CompareOptions::default().with_structural_checks(!no_structure);
    let builder = pipeline(oracle)?.with_compare_options(compare);

    let pb = progress(2);
    let thesis = open_classified(input, &builder, &pb)?;
    pb.set_message("Comparing...");
    let report = thesis.check(&spec);
    pb.inc(1);
    pb.finish_and_clear();

    let content = match format {
        ReportFormat::Text => render::to_text(&report),
        ReportFormat::Json => render::to_json(&report, JsonFormat::Pretty)?,
        ReportFormat::Compact => render::to_json(&report, JsonFormat::Compact)?,
    };
    write_or_print(output, &content)?;

    if report.is_clean() {
        eprintln!("{}", "No violations found.".green().bold());
    } else {
        eprintln!(
            "{} {} violations",
            "Found".yellow().bold(),
            report.violations.len()
        );
    }
    Ok(())
}

fn cmd_fix(
    input: &Path,
    requirements: &Path,
    output: Option<&Path>,
    options: ReconstructOptions,
    recreate: bool,
    oracle: &OracleArgs,
) -> CliResult {
    let spec = RequirementSpec::from_path(requirements)?;
    let builder = pipeline(oracle)?.with_reconstruct_options(options);
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        input.with_file_name(format!("{}.fixed.docx", stem))
    });

    let pb = progress(3);
    let thesis = open_classified(input, &builder, &pb)?;

    pb.set_message("Applying requirements...");
    let (package, summary) = if recreate {
        thesis.recreate(&spec)?
    } else {
        thesis.fix(&spec)?
    };
    pb.inc(1);

    pb.set_message("Saving...");
    package.save(&output)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    println!("\n{} {}", "Saved to".green().bold(), output.display());
    println!("  {} formatted: {}", "├─".dimmed(), summary.formatted);
    println!("  {} special:   {}", "├─".dimmed(), summary.special);
    println!("  {} skipped:   {}", "├─".dimmed(), summary.skipped);
    if summary.highlighted > 0 {
        println!("  {} highlighted: {}", "├─".dimmed(), summary.highlighted);
    }
    println!("  {} failed:    {}", "└─".dimmed(), summary.failed);
    Ok(())
}

fn cmd_extract(input: &Path, output: Option<&Path>, compact: bool) -> CliResult {
    let doc = thesisfmt::parse_file(input)?;
    let json = if compact {
        serde_json::to_string(&doc)?
    } else {
        serde_json::to_string_pretty(&doc)?
    };
    write_or_print(output, &json)
}

fn role_color(role: ParagraphRole, label: &str) -> colored::ColoredString {
    match role {
        ParagraphRole::Body => label.normal(),
        ParagraphRole::Heading1 | ParagraphRole::Heading2 | ParagraphRole::Heading3 => {
            label.cyan().bold()
        }
        ParagraphRole::TitleZh | ParagraphRole::TitleEn => label.magenta().bold(),
        r if r.is_special() => label.green(),
        _ => label.yellow(),
    }
}

fn cmd_classify(input: &Path, oracle: &OracleArgs) -> CliResult {
    let builder = pipeline(oracle)?;
    let pb = progress(1);
    let thesis = open_classified(input, &builder, &pb)?;
    pb.finish_and_clear();

    for (index, record) in thesis.document().records.iter().enumerate() {
        let label = format!("{:<24}", record.role.label());
        println!(
            "{:>4}  {}  {:.2}  {}",
            index,
            role_color(record.role, &label),
            record.confidence,
            record.excerpt(40).dimmed()
        );
    }

    let summary = thesis.classification();
    println!();
    println!(
        "{} {} paragraphs, {} by rule, {} oracle calls ({} failed)",
        "Classified".green().bold(),
        summary.paragraphs,
        summary.authoritative,
        summary.oracle_calls,
        summary.oracle_failures
    );
    Ok(())
}

fn cmd_derive(input: &Path, output: Option<&Path>) -> CliResult {
    let thesis = Thesisfmt::new().lenient().open(input)?;
    let spec = thesis.derive();
    write_or_print(output, &spec.to_json_pretty()?)
}

fn cmd_cite(input: &Path, style: &str) -> CliResult {
    let style: CitationStyle = style.parse()?;
    let thesis = Thesisfmt::new().lenient().open(input)?;
    let violations = thesis.cite(style);

    if violations.is_empty() {
        println!("{} {}", "All references follow".green().bold(), style);
        return Ok(());
    }
    for violation in &violations {
        println!("{} {}", "✗".red(), violation.message);
        if let Some(excerpt) = &violation.excerpt {
            println!("    {}", excerpt.dimmed());
        }
    }
    println!("\n{} {} problems", "Found".yellow().bold(), violations.len());
    Ok(())
}

fn cmd_info(input: &Path) -> CliResult {
    let format = detect_format_from_path(input)?;
    let thesis = Thesisfmt::new().lenient().open(input)?;
    let doc = thesis.document();
    let page = &doc.page;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);
    println!(
        "{}: {}",
        "Styles".bold(),
        if format.has_styles { "Yes" } else { "No" }
    );
    println!(
        "{}: {}",
        "Theme".bold(),
        if format.has_theme { "Yes" } else { "No" }
    );
    println!(
        "{}: {} ({:.2} x {:.2} cm, {})",
        "Paper".bold(),
        page.paper_name(0.2).unwrap_or("custom"),
        page.width.cm(),
        page.height.cm(),
        page.orientation.as_str()
    );
    println!(
        "{}: top {:.2} / bottom {:.2} / left {:.2} / right {:.2} cm",
        "Margins".bold(),
        page.margins.top.cm(),
        page.margins.bottom.cm(),
        page.margins.left.cm(),
        page.margins.right.cm()
    );

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Paragraphs".bold(), doc.metadata.paragraph_count);
    println!("{}: {}", "Images".bold(), doc.metadata.image_count);
    println!("{}: {}", "Tables".bold(), doc.metadata.table_count);
    println!("{}: {}", "Split labels".bold(), doc.metadata.split_count);
    println!(
        "{}: {}",
        "Recovered defects".bold(),
        doc.metadata.recovered_defects
    );

    println!();
    println!("{}", "Roles".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (role, count) in doc.role_counts() {
        println!("{:<24} {}", role.label(), count);
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "thesisfmt".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Thesis formatting checker and fixer for DOCX documents");
    println!();
    println!("License: MIT");
}
