use std::{fs, io, path::Path};

use thiserror::Error;
use uf2merge_core::{StreamSummary, ValidationFailure, validate_stream};

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Cannot read UF2: {0}")]
    Read(#[from] io::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationFailure),
}

/// Runs the strict stream checks over a file as it is on disk.
pub fn check_file<P: AsRef<Path>>(path: P) -> Result<StreamSummary, CheckError> {
    let raw = fs::read(path)?;
    Ok(validate_stream(&raw)?)
}

/// Exit code for a file that fails validation
pub const VALIDATION_FAILED: u8 = 2;

pub fn validation_line(result: &Result<StreamSummary, CheckError>) -> String {
    match result {
        Ok(summary) => format!("Validation: Valid UF2 with {} blocks", summary.blocks),
        Err(err) => format!("Validation FAILED: {}", err),
    }
}

/// Prints the outcome of [`check_file`], returns whether the file passed.
pub fn report_check<P: AsRef<Path>>(path: P) -> bool {
    let result = check_file(path);
    println!("{}", validation_line(&result));
    result.is_ok()
}
