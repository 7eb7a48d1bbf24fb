use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use drs_tagger::{
    load_dataset_list, override_rows, write_override_rows, OutputWriter, RunCoordinator,
    RunOutcome, TaggerConfig,
};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::{fs, path::PathBuf};
use templates::{Template, BASIC_CONFIG, FULL_CONFIG};
use tracing::{error, info, warn, Level};

mod templates;

/// CCI Dataset DRS Tagger
/// Derives DRS identifiers and vocabulary tags for climate datasets
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output for detailed processing information
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct DatasetInput {
    /// A single dataset directory
    #[arg(short, long, value_name = "DATASET PATH")]
    dataset: Option<PathBuf>,

    /// A file listing one dataset directory per line
    #[arg(short, long, value_name = "DATASET LIST")]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag datasets and write the DRS, tag, mapping and error files
    Tag {
        #[command(flatten)]
        input: DatasetInput,

        /// Path to the configuration file
        #[arg(
            short,
            long,
            default_value = "drs-tagger.jsonc",
            value_name = "PATH TO CONFIG"
        )]
        config: PathBuf,

        /// Output directory for the generated files
        #[arg(short, long, default_value = ".", value_name = "OUTPUT DIRECTORY PATH")]
        output: PathBuf,

        /// Number of files read per dataset (0 = all)
        #[arg(long, value_name = "COUNT")]
        file_count: Option<usize>,

        /// Skip SHA-256 checksums
        #[arg(long)]
        no_checksum: bool,

        /// Ignore local override mappings
        #[arg(long)]
        no_mappings: bool,
    },
    /// List the configured override mappings as facet,value,uri rows
    ShowMappings {
        /// Path to the configuration file
        #[arg(
            short,
            long,
            default_value = "drs-tagger.jsonc",
            value_name = "PATH TO CONFIG"
        )]
        config: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "OUTPUT PATH")]
        output: Option<PathBuf>,
    },
    /// Generate a configuration template
    GenerateConfig {
        /// Type of configuration template to generate (basic/full)
        #[arg(short = 't', long = "type", default_value = "basic")]
        template_type: String,

        /// Output path for the generated configuration
        #[arg(
            short,
            long,
            default_value = "drs-tagger.jsonc",
            value_name = "OUTPUT PATH"
        )]
        output: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file to validate
        #[arg(
            short,
            long,
            default_value = "drs-tagger.jsonc",
            value_name = "PATH TO CONFIG"
        )]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging with appropriate level
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Tag {
            input,
            config,
            output,
            file_count,
            no_checksum,
            no_mappings,
        } => {
            tag_command(
                input,
                config,
                output,
                *file_count,
                *no_checksum,
                *no_mappings,
            )
            .await
        }
        Commands::ShowMappings { config, output } => {
            show_mappings_command(config, output).map(|_| RunOutcome::Clean)
        }
        Commands::GenerateConfig {
            template_type,
            output,
        } => generate_config_command(template_type, output).map(|_| RunOutcome::Clean),
        Commands::Validate { config } => validate_command(config).map(|_| RunOutcome::Clean),
    };

    match result {
        Ok(RunOutcome::Clean) => ExitCode::SUCCESS,
        Ok(RunOutcome::CompletedWithErrors { errors }) => {
            warn!("Completed with {} errors, see errors.txt", errors);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn load_config(config_path: &PathBuf) -> Result<TaggerConfig> {
    if !config_path.exists() {
        anyhow::bail!(
            "Configuration file not found: {}. Try using --config <PATH TO CONFIG>",
            config_path.display()
        );
    }
    let mut config = TaggerConfig::from_file(config_path)
        .context("Failed to load configuration. See errors for additional details:")?;
    config
        .validate()
        .context("Failed to validate configuration")?;
    Ok(config)
}

async fn tag_command(
    input: &DatasetInput,
    config_path: &PathBuf,
    output: &PathBuf,
    file_count: Option<usize>,
    no_checksum: bool,
    no_mappings: bool,
) -> Result<RunOutcome> {
    let mut config = load_config(config_path)?;
    if let Some(count) = file_count {
        config.file_count = count;
    }
    if no_checksum {
        config.checksums = false;
    }
    if no_mappings {
        info!("Override mappings disabled");
        config.use_overrides = false;
    }

    let datasets = match (&input.dataset, &input.file) {
        (Some(dataset), _) => vec![dataset.clone()],
        (None, Some(list)) => load_dataset_list(list).context("Failed to read dataset list")?,
        (None, None) => anyhow::bail!("Either --dataset or --file is required"),
    };

    info!("Initializing tagger...");
    let mut coordinator =
        RunCoordinator::from_config(&config).context("Failed to set up the vocabulary")?;

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the datasets already started");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = coordinator
        .run(datasets)
        .await
        .context("Failed to tag datasets")?;

    OutputWriter::new(output)
        .write_report(&report)
        .context(format!("Failed to write results to: {}", output.display()))?;

    if report.cancelled {
        warn!("Run was interrupted; results cover the datasets that finished");
    }
    info!("Tagging completed");
    Ok(report.outcome())
}

fn show_mappings_command(config_path: &PathBuf, output: &Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let rows = override_rows(&config).context("Failed to read override mappings")?;
    info!("{} override mappings", rows.len());

    match output {
        Some(path) => {
            let file = fs::File::create(path)
                .context(format!("Failed to create: {}", path.display()))?;
            write_override_rows(file, &rows)?;
        }
        None => write_override_rows(std::io::stdout().lock(), &rows)?,
    }
    Ok(())
}

fn generate_config_command(template_type: &str, output: &PathBuf) -> Result<()> {
    let template = match template_type.to_lowercase().as_str() {
        "basic" => Template::Basic,
        "full" => Template::Full,
        _ => anyhow::bail!("Invalid template type. Must be either 'basic' or 'full'"),
    };

    info!("Generating {} configuration template...", template_type);

    let template_content = match template {
        Template::Basic => BASIC_CONFIG,
        Template::Full => FULL_CONFIG,
    };

    // if output is a directory, append the default file name
    let full_file_output_path = if output.is_dir() {
        output.join("drs-tagger.jsonc")
    } else {
        output.into()
    };

    fs::write(&full_file_output_path, template_content).context(format!(
        "Failed to write configuration to: {}",
        output.display()
    ))?;

    info!(
        "Successfully generated configuration template at: {}",
        full_file_output_path.display()
    );
    Ok(())
}

fn validate_command(config_path: &PathBuf) -> Result<()> {
    info!("Validating configuration...");
    let config = load_config(config_path)?;
    info!("Configuration validation successful");
    info!("DRS facets: {:?}", config.drs.facets);
    info!(
        "{} override mappings, {} aliases, {} pins",
        config.overrides.len(),
        config.aliases.len(),
        config.pins.len()
    );
    Ok(())
}
