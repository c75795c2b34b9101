// SPDX-FileCopyrightText: 2026 Adsynk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io::Write;

use serde::Serialize;

use adsynk_core::AdsynkError;

/// Pretty-print `value` as JSON followed by a newline.
pub fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), AdsynkError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AdsynkError::Internal(format!("failed to serialize output: {e}")))?;
    writeln!(out, "{rendered}").map_err(write_error)
}

pub fn write_error(e: std::io::Error) -> AdsynkError {
    AdsynkError::Internal(format!("failed to write output: {e}"))
}
