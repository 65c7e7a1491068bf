//! Reading the end of log files on disk.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use dashboard_types::LogFileTail;

use crate::config::LogFileConfig;

/// Bytes read per backward step.
const CHUNK_LEN: u64 = 4096;

/// Return the last `max_lines` lines of the file at `path`.
///
/// Scans backward from the end in fixed-size chunks counting newlines,
/// so only the tail of a large file is read. A trailing newline counts
/// as the end of the last line; without one, the unterminated text after
/// the final newline is the last line.
///
/// # Errors
///
/// Returns any I/O error from opening, seeking or reading the file.
pub fn tail_lines(path: &Path, max_lines: usize) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut pos = file.metadata()?.len();
    let mut start: u64 = 0;
    let mut buf = vec![0_u8; usize::try_from(CHUNK_LEN).map_err(io::Error::other)?];
    let mut newlines = usize::from(!ends_with_newline(&mut file, pos)?);

    'scan: while pos > 0 {
        let step = pos.min(CHUNK_LEN);
        pos = pos.saturating_sub(step);
        let step = usize::try_from(step).map_err(io::Error::other)?;
        let Some(chunk) = buf.get_mut(..step) else {
            break;
        };
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(chunk)?;
        for (offset, byte) in chunk.iter().enumerate().rev() {
            if *byte != b'\n' {
                continue;
            }
            newlines = newlines.saturating_add(1);
            if newlines > max_lines {
                let offset = u64::try_from(offset).map_err(io::Error::other)?;
                start = pos.saturating_add(offset).saturating_add(1);
                break 'scan;
            }
        }
    }

    file.seek(SeekFrom::Start(start))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    if len == 0 {
        return Ok(true);
    }
    let mut last = [0_u8; 1];
    file.seek(SeekFrom::Start(len.saturating_sub(1)))?;
    file.read_exact(&mut last)?;
    Ok(last == [b'\n'])
}

fn modified(meta: &fs::Metadata) -> Option<SystemTime> {
    meta.modified().ok()
}

/// Tail the most recently modified existing file among `candidates`.
///
/// When none exists the report has `exists: false`, the first candidate's
/// path, and no content.
///
/// # Errors
///
/// Returns an I/O error if the chosen file cannot be read.
pub fn read_latest(candidates: &[LogFileConfig], max_lines: usize) -> io::Result<LogFileTail> {
    let newest = candidates
        .iter()
        .filter_map(|c| {
            let meta = fs::metadata(&c.path).ok().filter(fs::Metadata::is_file)?;
            Some((c, meta))
        })
        .max_by_key(|(_, meta)| modified(meta));

    let Some((candidate, meta)) = newest else {
        return Ok(LogFileTail {
            path: candidates
                .first()
                .map(|c| c.path.display().to_string())
                .unwrap_or_default(),
            exists: false,
            source: String::new(),
            mtime: String::new(),
            size: 0,
            content: String::new(),
        });
    };

    Ok(LogFileTail {
        path: candidate.path.display().to_string(),
        exists: true,
        source: candidate.label.clone(),
        mtime: modified(&meta)
            .map(|t| DateTime::<Local>::from(t).to_rfc3339())
            .unwrap_or_default(),
        size: meta.len(),
        content: tail_lines(&candidate.path, max_lines)?,
    })
}
