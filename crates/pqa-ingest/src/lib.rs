//! Loading collaborator for the precinct QA engine.
//!
//! Reads results files into a [`pqa_model::Dataset`], reads the canonical
//! state and county reference tables, and infers which state a file covers.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use pqa_ingest::{ReferencePaths, load_references, read_dataset, reference_dir};
//!
//! let dataset = read_dataset(Path::new("AL_precinct_general.csv"))?;
//! let references = load_references(&ReferencePaths::in_dir(&reference_dir()))?;
//! ```

mod dataset;
mod detect;
mod error;
mod paths;
mod reference;

// === Error Types ===
pub use error::{IngestError, Result};

// === Dataset Reading ===
pub use dataset::{Delimiter, detect_delimiter, read_dataset, read_dataset_frame, validate_encoding};

// === Reference Tables ===
pub use reference::{
    COUNTY_FIPS_FILE, ReferencePaths, STATE_CODES_FILE, load_references, read_county_fips,
    read_state_codes,
};

// === Paths and Detection ===
pub use detect::{detect_state_from_filename, detected_state_from_po};
pub use paths::{REFERENCE_ENV_VAR, reference_dir};
