use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cms_client::{
    ClientConfig, ClientError, ConfigLayer, ENV_BASE_URL, ENV_CONFIG_FILE, ENV_TIMEOUT_SECS,
    ENV_TOKEN_FILE, Gender, TreatmentTarget,
};
use cms_types::{DocumentId, EntryId, NonEmptyText};

mod commands;

#[derive(Parser)]
#[command(name = "hcms")]
#[command(about = "Hospital treatment-tracking CMS client")]
struct Cli {
    /// YAML configuration file (overrides HCMS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// CMS REST API base URL, e.g. http://localhost:1337/api
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Session file
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    /// Print records as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        /// Username or email
        identifier: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Patient records
    #[command(subcommand)]
    Patients(PatientCommands),
    /// Treatment records
    #[command(subcommand)]
    Treatments(TreatmentCommands),
    /// Upload a photo
    Upload {
        path: PathBuf,
        /// Stored file name (defaults to the file's own name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete an uploaded file by numeric id
    DeleteFile { id: EntryId },
    /// Generate patients, treatment records and photos for load testing
    Seed(SeedArgs),
    /// List treatment sites
    Targets,
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List patients, optionally filtered
    List(PatientListArgs),
    /// Create a patient
    Create(PatientFields),
    /// Update a patient by document id
    Update {
        document_id: DocumentId,
        #[command(flatten)]
        fields: PatientFields,
    },
    /// Delete a patient by document id
    Delete { document_id: DocumentId },
}

#[derive(Args, Default)]
struct PatientListArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
    /// Matches the name (case-insensitive) or the document id
    #[arg(long)]
    keyword: Option<String>,
    /// Name filter; takes precedence over --keyword
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    gender: Option<Gender>,
    /// Earliest birthday (YYYY-MM-DD); needs --born-to
    #[arg(long, requires = "born_to")]
    born_from: Option<NaiveDate>,
    /// Latest birthday (YYYY-MM-DD); needs --born-from
    #[arg(long, requires = "born_from")]
    born_to: Option<NaiveDate>,
    /// Past treatment the patient must have had (repeatable)
    #[arg(long = "past-treatment")]
    past_treatments: Vec<String>,
}

#[derive(Args)]
struct PatientFields {
    #[arg(long)]
    name: NonEmptyText,
    #[arg(long)]
    gender: Gender,
    /// YYYY-MM-DD
    #[arg(long)]
    birthday: Option<NaiveDate>,
    /// Past treatment (repeatable)
    #[arg(long = "past-treatment")]
    past_treatments: Vec<String>,
}

#[derive(Subcommand)]
enum TreatmentCommands {
    /// List treatment records
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Only records of this patient (document id)
        #[arg(long)]
        patient: Option<DocumentId>,
    },
    /// Create a treatment record
    Create(TreatmentFields),
    /// Update a treatment record by document id
    Update {
        document_id: DocumentId,
        #[command(flatten)]
        fields: TreatmentFields,
    },
    /// Delete a treatment record by document id
    Delete { document_id: DocumentId },
}

#[derive(Args)]
struct TreatmentFields {
    /// Owning patient (document id)
    #[arg(long)]
    patient: DocumentId,
    #[arg(long)]
    treatment_no: Option<String>,
    /// Treatment site, by stored value or label
    #[arg(long)]
    target: Option<TreatmentTarget>,
    #[arg(long)]
    sequence_number: Option<u32>,
    /// Total minutes
    #[arg(long)]
    duration: Option<u32>,
    /// Uploaded media id to attach to the record (repeatable)
    #[arg(long = "image")]
    images: Vec<EntryId>,
    /// Lesion as SITE=ID[,ID...], e.g. "Chest=31,32" (repeatable)
    #[arg(long = "lesion", value_parser = commands::parse_lesion)]
    lesions: Vec<cms_client::TreatmentDetailInput>,
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long, default_value_t = 20)]
    patients: usize,
    #[arg(long, default_value_t = 3)]
    records_per_patient: usize,
    #[arg(long, default_value_t = 2)]
    lesions_per_record: usize,
    #[arg(long, default_value_t = 2)]
    photos_per_lesion: usize,
    /// Size of each generated photo in KiB
    #[arg(long, default_value_t = 3072)]
    image_kib: usize,
    /// Patient workflows in flight at once
    #[arg(long, default_value_t = 4)]
    max_workers: usize,
}

/// Main entry point for the `hcms` command-line client
///
/// Loads `.env`, installs logging, resolves configuration and dispatches the subcommand.
/// Client errors are reported with their operator-facing message; a rejected or missing
/// session adds a hint to log in again.
///
/// # Environment Variables
/// - `HCMS_CONFIG`: YAML configuration file
/// - `HCMS_BASE_URL`: CMS REST API base URL (default: "http://localhost:1337/api")
/// - `HCMS_TIMEOUT_SECS`: request timeout (default: 10)
/// - `HCMS_TOKEN_FILE`: session file (default: ".hcms/session.json")
/// - `RUST_LOG`: log filter, on top of the default `hcms=info`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("hcms=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'hcms --help' for commands");
        return Ok(());
    };

    let config = resolve_config(
        cli.config,
        ConfigLayer {
            base_url: cli.base_url,
            timeout_secs: cli.timeout_secs,
            token_file: cli.token_file,
            page_size: None,
        },
    )?;
    tracing::debug!("using backend {}", config.base_url());

    if let Err(err) = commands::run(command, &config, cli.json).await {
        if let Some(client_err) = err.downcast_ref::<ClientError>() {
            eprintln!("Error: {}", client_err.user_message());
            if client_err.requires_login() {
                eprintln!("Run 'hcms login <identifier> --password <password>' to sign in.");
            }
            tracing::debug!("{:#}", err);
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}

/// Layers configuration: defaults, then the YAML file, then the environment, then flags.
fn resolve_config(config_file: Option<PathBuf>, flags: ConfigLayer) -> anyhow::Result<ClientConfig> {
    let config_file =
        config_file.or_else(|| std::env::var_os(ENV_CONFIG_FILE).map(PathBuf::from));
    let file = match config_file {
        Some(path) => ConfigLayer::from_yaml_file(&path)?,
        None => ConfigLayer::default(),
    };
    let env = ConfigLayer::from_env_values(
        std::env::var(ENV_BASE_URL).ok(),
        std::env::var(ENV_TIMEOUT_SECS).ok(),
        std::env::var(ENV_TOKEN_FILE).ok(),
    )?;
    Ok(file.merge(env).merge(flags).resolve()?)
}
