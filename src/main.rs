use clap::{Args, Parser, Subcommand};
use kml_folders::document::{self, KmlBuilder};
use kml_folders::error::{BuildError, InputError, RoutingError};
use kml_folders::record::{RecordKind, SegmentRecord};
use kml_folders::report::Report;
use kml_folders::routing::{self, OpenRouteService, RateLimiter};
use kml_folders::{input, read_kml};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

#[derive(Parser)]
#[command(about = "Build KML overlays with nested folders from JSON rows")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<String>,
}

#[derive(Args)]
struct Files {
    /// JSON array of rows, or `[{"rawData": [...]}]`.
    #[arg(long)]
    input_file: String,

    #[arg(long)]
    output_file: String,

    /// Name of the KML Document.
    #[arg(long)]
    document_name: Option<String>,
}

#[derive(Args)]
struct RouteArgs {
    #[command(flatten)]
    files: Files,

    #[arg(long, env = "ORS_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, default_value = routing::DEFAULT_PROFILE)]
    profile: String,

    /// Maximum routing requests per minute (0 disables the limit).
    #[arg(long, default_value_t = 40)]
    rate_limit: u32,

    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Top-level folder all routes are placed in.
    #[arg(long, default_value = "Routes")]
    main_folder: String,
}

#[derive(Subcommand)]
enum Command {
    /// Straight line segments (LineName, Latitude1, Longitude1, ...).
    Lines(Files),
    /// Point sites (SiteName, Latitude, Longitude, Icon, ...).
    Sites(Files),
    /// Line segments routed through OpenRouteService.
    Routes(RouteArgs),
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("cannot write KML file '{path}': {source}")]
    Write { path: String, source: io::Error },

    #[error("cannot open log file '{path}': {source}")]
    LogFile { path: String, source: io::Error },

    #[error("no rows in input file '{0}'")]
    NoRows(String),
}

/// Sends every log line to stderr and to a file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn init_logging(log_file: Option<&str>) -> Result<(), CliError> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| CliError::LogFile {
                path: path.to_string(),
                source,
            })?;
        builder
            .target(env_logger::Target::Pipe(Box::new(Tee { file })))
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} - {} - {}",
                    buf.timestamp_seconds(),
                    record.level(),
                    record.args()
                )
            });
    }
    builder.init();
    Ok(())
}

fn write_output(path: &str, kml: &str) -> Result<(), CliError> {
    let to_err = |source| CliError::Write {
        path: path.to_string(),
        source,
    };
    if let Some(dir) = Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(to_err)?;
        }
    }
    fs::write(path, kml).map_err(to_err)?;
    match read_kml::summarize(kml) {
        Ok(s) => log::info!(
            "{}: {} folders, {} placemarks",
            path,
            s.total_folders(),
            s.total_placemarks()
        ),
        Err(e) => log::warn!("{}: written KML does not parse back: {}", path, e),
    }
    Ok(())
}

fn load(files: &Files) -> Result<Vec<serde_json::Value>, CliError> {
    let rows = input::load_records(&files.input_file)?;
    if rows.is_empty() {
        return Err(CliError::NoRows(files.input_file.clone()));
    }
    Ok(rows)
}

fn run_convert(kind: RecordKind, files: &Files, default_name: &str) -> Result<Report, CliError> {
    let rows = load(files)?;
    let name = files.document_name.as_deref().unwrap_or(default_name);
    let conversion = document::convert(kind, &rows, &KmlBuilder::new(name));
    let kml = conversion.kml?;
    write_output(&files.output_file, &kml)?;
    Ok(Report::success(
        &files.output_file,
        format!(
            "KML created from {} of {} rows ({} skipped)",
            conversion.accepted,
            rows.len(),
            conversion.rejected.len()
        ),
    ))
}

fn run_routes(args: &RouteArgs) -> Result<Report, CliError> {
    let rows = load(&args.files)?;
    let (segments, rejected): (Vec<SegmentRecord>, _) =
        document::validate(&rows, SegmentRecord::from_raw);
    log::info!(
        "{} segments to route, {} rows skipped",
        segments.len(),
        rejected.len()
    );

    let mut resolver =
        OpenRouteService::new(&args.api_key, &args.profile)?.with_max_retries(args.max_retries);
    let mut limiter = RateLimiter::per_minute(args.rate_limit);
    let routed = routing::enrich(segments, &mut resolver, &mut limiter);

    let name = args.files.document_name.as_deref().unwrap_or("Routes");
    let kml = KmlBuilder::new(name)
        .root_folder(args.main_folder.as_str())
        .build(&routed)?;
    write_output(&args.files.output_file, &kml)?;
    Ok(Report::success(
        &args.files.output_file,
        format!("KML created with {} routes", routed.len()),
    )
    .with_routes(&routed))
}

fn run(cli: &Cli) -> Result<Report, CliError> {
    init_logging(cli.log_file.as_deref())?;
    match &cli.command {
        Command::Lines(files) => run_convert(RecordKind::Segment, files, "Line data"),
        Command::Sites(files) => run_convert(RecordKind::Point, files, "Site data"),
        Command::Routes(args) => run_routes(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (report, code) = match run(&cli) {
        Ok(report) => (report, ExitCode::SUCCESS),
        Err(e) => {
            log::error!("{}", e);
            (Report::error(e.to_string()), ExitCode::FAILURE)
        }
    };
    println!("{}", report.to_json());
    code
}
