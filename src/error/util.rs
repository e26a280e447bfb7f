//! Utility functions for error handling
//!
//! File-system helpers that attach the purpose of an access to any failure,
//! so a broken data directory reads as "observation table for income" rather
//! than a bare `NotFound`.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, anyhow};

use crate::error::Result;

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(anyhow!("File not found: {} (needed for: {purpose})", path.display()).into());
    }

    if !path.is_file() {
        return Err(anyhow!(
            "Path is not a file: {} (expected a file for: {purpose})",
            path.display()
        )
        .into());
    }

    match fs::File::open(path) {
        Ok(file) => Ok(file),
        Err(e) => {
            let context = match e.kind() {
                io::ErrorKind::PermissionDenied => format!(
                    "Permission denied opening {} - check file permissions",
                    path.display()
                ),
                _ => format!("Failed to open {} for: {purpose}", path.display()),
            };
            Err(anyhow::Error::new(e).context(context).into())
        }
    }
}

/// Check if a directory exists and is readable, with rich error information
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!(
            "Directory not found: {} (needed for: {purpose})",
            path.display()
        )
        .into());
    }

    if !path.is_dir() {
        return Err(anyhow!(
            "Path is not a directory: {} (expected a directory for: {purpose})",
            path.display()
        )
        .into());
    }

    fs::read_dir(path)
        .with_context(|| format!("Failed to access directory {} for: {purpose}", path.display()))?;
    Ok(())
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    io::Read::read_to_string(&mut file, &mut content).with_context(|| {
        format!(
            "Failed to read {} as UTF-8 text for: {purpose}",
            path.display()
        )
    })?;
    Ok(content)
}
