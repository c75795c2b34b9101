// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `adsynk export`.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use adsynk_core::AdsynkError;

use crate::context::AppContext;
use crate::output::write_error;

/// Render the CSV and write it to `output`, or to stdout when absent.
///
/// A directory `output` receives the export under its suggested file name.
pub async fn run_export(
    ctx: &AppContext,
    out: &mut dyn Write,
    start: Option<&str>,
    end: Option<&str>,
    output: Option<&Path>,
) -> Result<(), AdsynkError> {
    let export = ctx
        .exporter()
        .export(start, end, Utc::now().date_naive())
        .await?;

    let Some(output) = output else {
        return out.write_all(export.content.as_bytes()).map_err(write_error);
    };
    let target: PathBuf = if output.is_dir() {
        output.join(&export.file_name)
    } else {
        output.to_path_buf()
    };
    std::fs::write(&target, export.content.as_bytes()).map_err(write_error)?;
    info!(path = %target.display(), rows = export.rows, "export written");
    Ok(())
}
