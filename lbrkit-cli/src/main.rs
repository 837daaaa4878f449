//! lbrkit CLI - add or update devicesets in Eagle libraries from the command line.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use lbrkit::{
    find_template_named, require_deviceset, summarize_deviceset, template_footprints,
    DevicesetSummary, EditAction, EditOptions, EditOutcome, EditRequest, LibraryDocument,
    LibraryEditor, LibraryError, PartEntry, TEMPLATE_NAME,
};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "lbrkit")]
#[command(about = "Eagle library deviceset editor", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List package (footprint) names in the library
    Packages {
        /// Path to .lbr file
        #[arg(value_name = "LIBRARY")]
        library: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List symbol names in the library
    Symbols {
        /// Path to .lbr file
        #[arg(value_name = "LIBRARY")]
        library: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List devicesets in document order
    Devicesets {
        /// Path to .lbr file
        #[arg(value_name = "LIBRARY")]
        library: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Show one deviceset's devices and metadata
    Show {
        /// Path to .lbr file
        #[arg(value_name = "LIBRARY")]
        library: PathBuf,

        /// Deviceset name (case-insensitive)
        #[arg(value_name = "DEVICESET")]
        deviceset: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Show the template deviceset and the footprints it offers
    Template {
        /// Path to .lbr file
        #[arg(value_name = "LIBRARY")]
        library: PathBuf,

        /// Template deviceset name
        #[arg(long, default_value = TEMPLATE_NAME)]
        template_name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Add a deviceset, or merge footprints into an existing one
    Add {
        /// Path to .lbr file
        #[arg(value_name = "LIBRARY")]
        library: PathBuf,

        /// Deviceset name (new or existing)
        #[arg(short, long)]
        name: String,

        /// Reference designator prefix (R, C, U, ...)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Value written to every selected footprint
        #[arg(long)]
        value: String,

        /// Symbol to use for every gate
        #[arg(short, long)]
        symbol: Option<String>,

        /// Footprint entry as FOOTPRINT=DESCRIPTION=PART (repeatable)
        #[arg(long = "part", value_name = "FOOTPRINT=DESCRIPTION=PART", value_parser = parse_part)]
        parts: Vec<PartEntry>,

        /// JSON file with an array of {footprint, description, part_reference}
        #[arg(long = "parts", value_name = "FILE")]
        manifest: Option<PathBuf>,

        /// Template deviceset name
        #[arg(long, default_value = TEMPLATE_NAME)]
        template_name: String,

        /// Overwrite the library in place instead of via a temp file
        #[arg(long)]
        no_atomic: bool,

        /// Apply the edit without saving
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Packages { library, format } => {
            handle_list(&library, &format, "packages", |doc| doc.list_packages())
        }
        Commands::Symbols { library, format } => {
            handle_list(&library, &format, "symbols", |doc| doc.list_symbols())
        }
        Commands::Devicesets { library, format } => {
            handle_list(&library, &format, "devicesets", lbrkit::list_devicesets)
        }
        Commands::Show {
            library,
            deviceset,
            format,
        } => handle_show(&library, &deviceset, &format),
        Commands::Template {
            library,
            template_name,
            format,
        } => handle_template(&library, &template_name, &format),
        Commands::Add {
            library,
            name,
            prefix,
            value,
            symbol,
            parts,
            manifest,
            template_name,
            no_atomic,
            dry_run,
            format,
        } => {
            let request = EditRequest {
                name,
                prefix,
                value,
                symbol,
                parts,
            };
            let options = EditOptions {
                template_name,
                atomic_save: !no_atomic,
                ..EditOptions::default()
            };
            handle_add(&library, request, manifest.as_deref(), &options, dry_run, &format)
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_part(s: &str) -> Result<PartEntry, String> {
    let mut fields = s.splitn(3, '=');
    let footprint = fields.next().unwrap_or("").trim();
    let (Some(description), Some(part_reference)) = (fields.next(), fields.next()) else {
        return Err(format!("expected FOOTPRINT=DESCRIPTION=PART, got '{}'", s));
    };
    if footprint.is_empty() {
        return Err("footprint must not be empty".to_string());
    }
    Ok(PartEntry::new(footprint, description, part_reference))
}

fn load(path: &Path) -> Result<LibraryDocument, i32> {
    LibraryDocument::load(path).map_err(report)
}

fn report(e: LibraryError) -> i32 {
    eprintln!("Error: {}", e);
    1
}

fn handle_list(
    library: &Path,
    format: &OutputFormat,
    key: &str,
    list: impl Fn(&LibraryDocument) -> Vec<String>,
) -> i32 {
    let doc = match load(library) {
        Ok(doc) => doc,
        Err(code) => return code,
    };
    let names = list(&doc);
    match format {
        OutputFormat::Human => {
            for name in &names {
                println!("{}", name);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({ key: names })),
    }
    0
}

fn handle_show(library: &Path, deviceset: &str, format: &OutputFormat) -> i32 {
    let doc = match load(library) {
        Ok(doc) => doc,
        Err(code) => return code,
    };
    match require_deviceset(&doc, deviceset) {
        Ok(ds) => {
            let summary = summarize_deviceset(ds);
            match format {
                OutputFormat::Human => output_summary(&summary),
                OutputFormat::Json => print_json(&serde_json::json!(summary)),
            }
            0
        }
        Err(e) => report(e),
    }
}

fn handle_template(library: &Path, template_name: &str, format: &OutputFormat) -> i32 {
    let doc = match load(library) {
        Ok(doc) => doc,
        Err(code) => return code,
    };
    let template = match find_template_named(&doc, template_name) {
        Ok(t) => t.attr("name").unwrap_or("").to_string(),
        Err(e) => return report(e),
    };
    let footprints = match template_footprints(&doc, template_name) {
        Ok(f) => f,
        Err(e) => return report(e),
    };
    match format {
        OutputFormat::Human => {
            println!("Template: {}", template);
            for fp in &footprints {
                println!("  {}", fp);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "template": template,
            "footprints": footprints,
        })),
    }
    0
}

fn handle_add(
    library: &Path,
    mut request: EditRequest,
    manifest: Option<&Path>,
    options: &EditOptions,
    dry_run: bool,
    format: &OutputFormat,
) -> i32 {
    if let Some(manifest) = manifest {
        match PartEntry::load_manifest(manifest) {
            Ok(parts) => request.parts.extend(parts),
            Err(e) => return report(e),
        }
    }

    let result = if dry_run {
        load(library).and_then(|mut doc| {
            LibraryEditor::apply(&mut doc, &request, options).map_err(report)
        })
    } else {
        LibraryEditor::apply_to_file(library, &request, options).map_err(report)
    };

    match result {
        Ok(outcome) => {
            match format {
                OutputFormat::Human => output_outcome(&outcome, dry_run),
                OutputFormat::Json => print_json(&serde_json::json!({
                    "outcome": outcome,
                    "saved": !dry_run,
                })),
            }
            0
        }
        Err(code) => code,
    }
}

fn output_outcome(outcome: &EditOutcome, dry_run: bool) {
    match outcome.action {
        EditAction::Created => println!(
            "Created new deviceset '{}' with {} package(s).",
            outcome.deviceset, outcome.added
        ),
        EditAction::Merged => println!(
            "Deviceset '{}' already exists.\n→ {} updated, {} added.",
            outcome.deviceset, outcome.updated, outcome.added
        ),
    }
    if !outcome.skipped.is_empty() {
        println!("Skipped (missing fields): {}", outcome.skipped.join(", "));
    }
    if dry_run {
        println!("Dry run: library not saved.");
    }
}

fn output_summary(summary: &DevicesetSummary) {
    println!("\nDeviceset: {}", summary.name);
    println!("{}", "─".repeat(60));
    println!("  Prefix:    {}", summary.prefix.as_deref().unwrap_or("-"));
    println!("  Uservalue: {}", if summary.uservalue { "yes" } else { "no" });
    if !summary.symbols.is_empty() {
        println!("  Symbols:   {}", summary.symbols.join(", "));
    }

    if summary.devices.is_empty() {
        println!("\n  No devices");
        return;
    }
    println!("\n  Devices:");
    for dev in &summary.devices {
        println!("    - {} ({} connects)", dev.footprint, dev.connects);
        if let Some(ref desc) = dev.description {
            println!("      Description: {}", desc);
        }
        if let Some(ref part) = dev.part_reference {
            println!("      LCSC part:   {}", part);
        }
        if let Some(ref value) = dev.value {
            println!("      Value:       {}", value);
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error: {}", e),
    }
}
