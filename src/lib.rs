//! babynames: CSV-to-MySQL ingestion of a baby-names dataset, with a CRM push
//!
//! The crate runs a short, strictly sequential pipeline:
//!
//! 1. **Locate** -- Check that the dataset export exists at the configured path
//!    (downloading it from the portal happens outside this crate)
//! 2. **Extract** -- Stream the CSV row by row, resolving the name and sex columns once
//!    per file from an ordered list of accepted header aliases
//! 3. **Deduplicate** -- Keep the first record per case-insensitive `(name, sex)` key
//! 4. **Load** -- Insert the unique records in fixed-size `INSERT IGNORE` batches, one
//!    round trip per batch, stopping at the first failed batch
//! 5. **Push** (separate command) -- Create one CRM contact per stored row, for a
//!    bounded sample, logging and skipping failed calls
//!
//! # Key Modules
//!
//! - [`extract`] -- Lazy CSV row extractor with header alias resolution
//! - [`dedup`] -- First-seen deduplication
//! - [`import`] -- Batch loader and progress bars
//! - [`pipeline`] -- Stage-tracking driver tying the steps together
//! - [`store`] -- `NameStore` trait, MySQL and in-memory implementations
//! - [`crm`] -- CRM contact client and push loop
//! - [`dataset`] -- Input file location
//! - [`models`] -- Core data types (NameRecord, DedupKey, StoredName, Sex)
//! - [`error`] -- Typed failure kinds
//! - [`stats`] -- Run counters and summaries
//! - [`config`] -- Constants and database settings
//!
//! # Example Usage
//!
//! ```bash
//! # Ingest the CSV into MySQL
//! babynames import --csv-path data/babyNamesUSYOB-full.csv
//!
//! # Parse and deduplicate without touching the database
//! babynames import --dry-run
//!
//! # Ingest, then push the first 100 rows to the CRM
//! babynames run
//! ```

pub mod config;
pub mod crm;
pub mod dataset;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod stats;
pub mod store;
