//! ANSI escape codes and cursor operations
//!
//! `\r` moves to column 1, `\x1b[nA` moves up n lines, `\x1b[2K` erases the
//! whole line.

use std::io::{self, Write};

pub const RESET: &str = "\x1b[0m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[1;31m";
pub const YELLOW: &str = "\x1b[1;33m";
pub const CYAN: &str = "\x1b[1;36m";

/// Write lines and flush immediately
pub fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line.trim_end())?;
    }
    out.flush()
}

/// Erase the `n` lines above the cursor and return to column 1
pub fn clear_lines<W: Write>(out: &mut W, n: usize) -> io::Result<()> {
    for _ in 0..n {
        write!(out, "\x1b[1A\x1b[2K")?;
    }
    write!(out, "\r")?;
    out.flush()
}

/// Overwrite the last `lines.len()` lines with new content
pub fn replace_lines<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    clear_lines(out, lines.len())?;
    write_lines(out, lines)
}
