//! # photo-stamp
//!
//! Capture photos, stamp them with the capture date/time and the device's GPS
//! position as EXIF tags, publish them to an image library and list them back
//! with their decoded metadata and thumbnails.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use photo_stamp::capture::{CaptureOrchestrator, CaptureRequest, ImportDevice, StaticPermissions};
//! use photo_stamp::catalog::CatalogReader;
//! use photo_stamp::exif::MetadataWriter;
//! use photo_stamp::location::{LocationFix, StaticLocation};
//! use photo_stamp::store::LibraryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(LibraryStore::open("library")?);
//!     let writer = MetadataWriter::new().with_resolver(store.clone());
//!
//!     let orchestrator = CaptureOrchestrator::new(
//!         Arc::new(StaticPermissions::all_granted()),
//!         Arc::new(StaticLocation::new(Some(LocationFix::new(40.4168, -3.7038)))),
//!         Arc::new(ImportDevice::new("shot.jpg").with_resolver(store.clone())),
//!         writer.clone(),
//!         store.clone(),
//!     );
//!
//!     let name = CaptureRequest::default_display_name();
//!     let locator = store.allocate(&name)?;
//!     orchestrator.capture(CaptureRequest::new(locator, name)).await?;
//!
//!     for record in CatalogReader::new(store, writer).list().await? {
//!         println!("{} {:?} {:?}", record.display_name, record.date_time, record.geo_location);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`capture`]: the capture state machine and its platform collaborators
//! - [`catalog`]: newest-first listing with decoded metadata and previews
//! - [`config`]: configuration types and loading/saving
//! - [`container`]: container addressing (file paths and resolver URIs)
//! - [`exif`]: EXIF tag sets, the JPEG metadata writer and reader
//! - [`location`]: location fixes and the latest-wins location provider
//! - [`store`]: the image store trait with directory-backed and in-memory stores
//! - [`thumbnail`]: downsampled previews

pub mod capture;
pub mod catalog;
pub mod config;
pub mod container;
pub mod exif;
pub mod location;
pub mod store;
pub mod thumbnail;
