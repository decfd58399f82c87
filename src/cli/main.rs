use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use photo_stamp::capture::{
    CaptureOrchestrator, CaptureRequest, FailureReason, ImportDevice, StaticPermissions,
};
use photo_stamp::catalog::{CatalogReader, ImageRecord};
use photo_stamp::config::Config;
use photo_stamp::container::{ContainerLocator, collect_images};
use photo_stamp::exif::{self, MetadataWriter, TagName};
use photo_stamp::location::{LocationFix, StaticLocation};
use photo_stamp::store::LibraryStore;

#[derive(Parser, Debug)]
#[command(
    name = "photo-stamp",
    version,
    about = "Stamp photos with capture date/time and GPS, publish them to a library and list them back"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config.json and exit
    Init,

    /// Capture a photo into the library, using an existing JPEG as the camera output
    Capture {
        /// JPEG file the "camera" produces
        #[arg(long, value_name = "FILE")]
        from: PathBuf,

        /// Latitude of the current location fix, in decimal degrees
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude of the current location fix, in decimal degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Altitude of the current location fix, in meters
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        alt: Option<f64>,

        /// Behave as if location permission was denied
        #[arg(long)]
        deny_location: bool,

        /// Display name (default: IMG_<millis>.jpg)
        #[arg(long)]
        name: Option<String>,

        /// Output the published record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the library, newest first
    List {
        /// Output records as JSON
        #[arg(long)]
        json: bool,

        /// Write a PNG preview per record into this directory
        #[arg(long, value_name = "DIR")]
        thumbnails: Option<PathBuf>,
    },

    /// Display the date/time and GPS tags of image files or directories
    Show {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Init => {
            let config = Config::default();
            let path = cli.config.as_deref();
            config.save(path)?;
            let save_path = match path {
                Some(p) => p.to_path_buf(),
                None => Config::config_path()?,
            };
            println!("Default config written to {}", save_path.display());
            Ok(())
        }
        Command::Capture {
            from,
            lat,
            lon,
            alt,
            deny_location,
            name,
            json,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let fix = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(LocationFix::new(lat, lon).with_altitude(alt)),
                _ => None,
            };
            let record = capture(&config, from, fix, deny_location, name).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
            }
            Ok(())
        }
        Command::List { json, thumbnails } => {
            let config = Config::load(cli.config.as_deref())?;
            list(&config, json, thumbnails.as_deref()).await
        }
        Command::Show { paths } => {
            let images = collect_images(&paths);
            if images.is_empty() {
                anyhow::bail!("No JPEG files found in the specified paths.");
            }
            let writer = MetadataWriter::new();
            for image_path in &images {
                if let Err(e) = print_tags(&writer, image_path) {
                    log::error!("Failed to read {}: {e:#}", image_path.display());
                }
            }
            Ok(())
        }
    }
}

fn open_library(config: &Config) -> Result<(Arc<LibraryStore>, MetadataWriter)> {
    let store = Arc::new(LibraryStore::open(&config.library.root)?);
    let writer = MetadataWriter::new()
        .with_resolver(store.clone())
        .with_staging_dir(config.staging_dir());
    Ok((store, writer))
}

async fn capture(
    config: &Config,
    from: PathBuf,
    fix: Option<LocationFix>,
    deny_location: bool,
    name: Option<String>,
) -> Result<ImageRecord> {
    let (store, writer) = open_library(config)?;
    let orchestrator = CaptureOrchestrator::new(
        Arc::new(StaticPermissions {
            camera: true,
            location: !deny_location,
        }),
        Arc::new(StaticLocation::new(fix)),
        Arc::new(ImportDevice::new(from).with_resolver(store.clone())),
        writer,
        store.clone(),
    )
    .with_location_config(config.location.clone());

    let name = name.unwrap_or_else(CaptureRequest::default_display_name);
    let locator = store.allocate(&name)?;

    match orchestrator.capture(CaptureRequest::new(locator.clone(), name)).await {
        Ok(record) => Ok(record),
        Err(reason) => {
            match reason {
                // Nothing was captured into the container, so drop the reservation.
                FailureReason::Cancelled | FailureReason::PermissionDenied(_) => {
                    if let Err(e) = store.discard(&locator) {
                        log::warn!("Failed to discard {locator}: {e:#}");
                    }
                }
                _ => log::warn!("Unpublished capture left at {locator}"),
            }
            Err(reason).context("Capture failed")
        }
    }
}

async fn list(config: &Config, json: bool, thumbnails: Option<&Path>) -> Result<()> {
    let (store, writer) = open_library(config)?;
    let reader = CatalogReader::new(store, writer).with_config(&config.catalog);

    let records = match thumbnails {
        Some(dir) => {
            std::fs::create_dir_all(dir).context("Failed to create thumbnail directory")?;
            let entries = reader.list_with_previews().await?;
            for entry in &entries {
                let Some(preview) = &entry.preview else {
                    log::warn!("No preview for {}", entry.record.display_name);
                    continue;
                };
                let stem = Path::new(&entry.record.display_name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let path = dir.join(format!("{}_{stem}.png", entry.record.id));
                match preview.save(&path) {
                    Ok(()) => log::info!("Preview written: {}", path.display()),
                    Err(e) => log::error!("Failed to write {}: {e}", path.display()),
                }
            }
            entries.into_iter().map(|e| e.record).collect()
        }
        None => reader.list().await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("  {DIM}(library is empty){RESET}");
    }
    for record in &records {
        print_record(record);
    }
    log::info!("{} image(s) in {}", records.len(), config.library.root.display());
    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print one catalog entry the way the list view shows it.
fn print_record(record: &ImageRecord) {
    println!();
    println!("{BOLD}{}{RESET} {DIM}#{}{RESET}", record.display_name, record.id);
    println!("  {DIM}{}{RESET}", "─".repeat(70));
    print_row("Container", &record.locator.to_string());
    print_row(
        "Inserted",
        &record.inserted_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    match &record.date_time {
        Some(dt) => print_row("DateTime", dt),
        None => print_missing("DateTime"),
    }
    match &record.geo_location {
        Some(point) => {
            println!("  {GREEN}{:<22} : {point}{RESET}", "Location");
            if let Some(alt) = point.altitude {
                print_row("Altitude", &format!("{alt:.1} m"));
            }
        }
        None => print_missing("Location"),
    }
}

/// Print the recognized tags of a file, then the independent nom-exif view.
fn print_tags(writer: &MetadataWriter, path: &Path) -> Result<()> {
    let tags = writer.read_tags(&ContainerLocator::path(path))?;
    let summary = exif::read_summary(path)?;

    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    if !tags.is_empty() {
        println!("  {BOLD}Date / Location Tags{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for name in TagName::ALL {
            if let Some(value) = tags.get(name) {
                print_row(name.as_str(), &value.to_string());
            }
        }
        println!();
    }

    let camera_fields: Vec<(&str, Option<&str>)> = vec![
        ("Make", summary.make.as_deref()),
        ("Model", summary.model.as_deref()),
        ("DateTimeOriginal", summary.date_time_original.as_deref()),
    ];
    if camera_fields.iter().any(|(_, v)| v.is_some()) {
        println!("  {BOLD}Camera / Device{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for (tag, val) in &camera_fields {
            if let Some(v) = val {
                print_row(tag, v);
            }
        }
        println!();
    }

    if let Some(gps) = summary.gps {
        println!("  {BOLD}GPS{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        print_row("GPSLatitude", &format!("{:.6}", gps.latitude));
        print_row("GPSLongitude", &format!("{:.6}", gps.longitude));
        if let Some(alt) = gps.altitude {
            print_row("GPSAltitude", &format!("{alt:.3} m"));
        }
        println!();
    }

    if tags.is_empty() && summary.gps.is_none() && camera_fields.iter().all(|(_, v)| v.is_none())
    {
        println!("  {DIM}(no EXIF metadata found){RESET}");
        println!();
    }

    Ok(())
}

fn print_missing(tag: &str) {
    let tag_col = format!("{:<22}", tag);
    println!("  {DIM}{tag_col} : (none){RESET}");
}

/// Print a single row in the display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
