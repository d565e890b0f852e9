//! Stdout plumbing for command results.
//!
//! Command output goes through an explicit writer rather than the print
//! macros so failures (a closed pipe, a full disk behind a redirect)
//! surface as errors instead of panics.

use std::io::{self, Write};

/// Write `content` to standard output.
///
/// # Errors
///
/// Returns the underlying I/O error when stdout cannot be written, for
/// example when the consuming pipe has closed.
pub fn print(content: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()
}
