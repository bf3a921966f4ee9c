//! Two-phase atomic placement of digest-named files.
//!
//! A placement streams a source once, feeding every digest lane, and then
//! gives the destination its name with a single terminal syscall. At every
//! instant before that call the destination path is untouched by the
//! operation; after it, the path holds the complete content or (if the call
//! itself failed) remains as it was. Partial files never become visible.
//!
//! Two target modes, selected once up front and never re-examined:
//!
//! - **Rename**: the source is an existing regular file on the same
//!   filesystem as the destination's parent. No bytes are copied; the
//!   digest pass reads the file directly and `rename(2)` is the terminal
//!   call.
//! - **Staging**: anything else — a pipe, a non-regular or cross-filesystem
//!   source, or a live stream. Bytes are copied into an `O_TMPFILE`
//!   anonymous file in the destination's parent directory and `linkat(2)`
//!   through `/proc/self/fd` gives it its first and only name. An abandoned
//!   staging file is reclaimed by the filesystem when its descriptor drops.
//!
//! The pattern is expanded twice: once against an all-zero digest before
//! any data is read (a too-long result fails fast, before work is wasted on
//! a large source) and once with the real digest after the stream ends.

use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::sys::stat::{umask, Mode};
use nix::unistd::{linkat, LinkatFlags};
use tracing::debug;

use crate::bounded::BoundedCursor;
use crate::errors::{HashmvError, Result};
use crate::registry::{DigestList, DigestOutput, MultiHasher};
use crate::template;

/// Destination path capacity, terminator included.
pub const DEST_MAX: usize = libc::PATH_MAX as usize;

/// Chunk size for the streaming pass.
const CHUNK: usize = 64 * 1024;

/// Data source for one placement operation.
pub enum Source<'a> {
    /// A named file. Eligible for rename-mode placement when it is regular
    /// and lives on the destination filesystem.
    Path(&'a Path),
    /// A live byte stream of unknown length; always staged.
    Stream(&'a mut dyn Read),
}

/// Parameters of one placement operation.
pub struct PlaceRequest<'a> {
    /// Destination pattern (see [`crate::template`]).
    pub pattern: &'a str,
    /// Permission mask applied to staged files, umask-style: the final mode
    /// is `0o666 & !mask`. `None` reads the process umask, matching what an
    /// ordinary file creation would have received.
    pub mode_mask: Option<u32>,
}

/// Outcome of a successful placement.
#[derive(Debug)]
pub struct Placement {
    pub destination: PathBuf,
    /// Finalized digests in list order; the first one named the file.
    pub digests: Vec<DigestOutput>,
}

/// How the destination will receive its name. Selected once per operation;
/// the commit step is the only other place that looks at it.
enum PlacementTarget {
    /// Existing regular file, renamed in place.
    Rename { source: PathBuf },
    /// Anonymous staging file, linked under its first and only name.
    /// Exclusively owned here until commit; dropped unlinked on failure.
    Staging { file: File },
}

/// Stream `source` into a digest-named destination derived from
/// `req.pattern`. The first non-alias entry of `list` names the file;
/// every entry is computed in the same pass.
pub fn place(list: &DigestList, source: Source<'_>, req: &PlaceRequest<'_>) -> Result<Placement> {
    let primary = match list.computation_entries().next() {
        Some(spec) => spec,
        None => {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty digest list").into())
        }
    };

    // Phase one: prove the worst-case expansion fits before the source is
    // touched. Hex length depends only on digest length, so an all-zero
    // digest expands to exactly the final size.
    let zeros = template::zero_digest(primary.digest_len());
    let mut dry_buf = [0u8; DEST_MAX];
    let mut cursor = BoundedCursor::new(&mut dry_buf);
    template::expand_into(&mut cursor, req.pattern, &zeros)?;
    let parent = parent_dir(Path::new(OsStr::from_bytes(cursor.finish())));

    let (mut input, mut target): (Box<dyn Read + '_>, PlacementTarget) = match source {
        Source::Path(path) => {
            let file = File::open(path)?;
            let meta = file.metadata()?;
            let same_fs = meta.dev() == fs::metadata(&parent)?.dev();
            if meta.file_type().is_file() && same_fs {
                debug!(source = %path.display(), "rename-mode placement");
                (
                    Box::new(file),
                    PlacementTarget::Rename {
                        source: path.to_path_buf(),
                    },
                )
            } else {
                debug!(source = %path.display(), "source not renameable, staging");
                (
                    Box::new(file),
                    PlacementTarget::Staging {
                        file: open_staging(&parent)?,
                    },
                )
            }
        }
        Source::Stream(reader) => (
            Box::new(reader),
            PlacementTarget::Staging {
                file: open_staging(&parent)?,
            },
        ),
    };

    let mut pass = list.begin();
    let staging = match &mut target {
        PlacementTarget::Staging { file } => Some(file),
        PlacementTarget::Rename { .. } => None,
    };
    copy_stream(&mut *input, &mut pass, staging)?;
    drop(input);

    let digests = pass.finish();
    // must fit: the dry run already validated worst-case length
    let destination = expand_real(req.pattern, &digests[0].bytes)?;

    match target {
        PlacementTarget::Rename { source } => {
            fs::rename(&source, &destination).map_err(HashmvError::Commit)?;
        }
        PlacementTarget::Staging { file } => {
            commit_staging(&file, &destination, req.mode_mask)?;
        }
    }
    debug!(destination = %destination.display(), "placement committed");

    Ok(Placement {
        destination,
        digests,
    })
}

/// Allocate an anonymous file in `parent`. Filesystems without `O_TMPFILE`
/// support make this fail outright; there is no portable fallback.
fn open_staging(parent: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_TMPFILE)
        .mode(0o600)
        .open(parent)?;
    debug!(parent = %parent.display(), "allocated anonymous staging file");
    Ok(file)
}

/// Single read pass: every chunk updates all digest lanes and, when staging,
/// is fully written out before the next read.
fn copy_stream(
    reader: &mut dyn Read,
    pass: &mut MultiHasher<'_>,
    mut staging: Option<&mut File>,
) -> Result<u64> {
    let mut buf = vec![0u8; CHUNK];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(HashmvError::SourceRead(e)),
        };
        pass.update(&buf[..n]);
        if let Some(out) = staging.as_deref_mut() {
            out.write_all(&buf[..n]).map_err(HashmvError::StagingWrite)?;
        }
        total += n as u64;
    }
    Ok(total)
}

/// Second expansion, with the real digest.
fn expand_real(pattern: &str, digest: &[u8]) -> Result<PathBuf> {
    let mut buf = [0u8; DEST_MAX];
    let mut cursor = BoundedCursor::new(&mut buf);
    template::expand_into(&mut cursor, pattern, digest)?;
    Ok(PathBuf::from(OsStr::from_bytes(cursor.finish())))
}

/// Terminal staging commit: fix up the anonymous file's permission bits to
/// what an ordinary create would have produced, then link it to its first
/// and only name. `linkat` goes through `/proc/self/fd` because
/// `AT_EMPTY_PATH` needs a capability unprivileged processes lack.
fn commit_staging(staging: &File, destination: &Path, mode_mask: Option<u32>) -> Result<()> {
    let mask = mode_mask.unwrap_or_else(process_umask);
    staging
        .set_permissions(Permissions::from_mode(0o666 & !mask))
        .map_err(HashmvError::Commit)?;
    let fd_path = format!("/proc/self/fd/{}", staging.as_raw_fd());
    linkat(
        None,
        Path::new(&fd_path),
        None,
        destination,
        LinkatFlags::SymlinkFollow,
    )
    .map_err(|errno| HashmvError::Commit(io::Error::from(errno)))
}

/// The process umask, read the only way POSIX offers: set and restore.
fn process_umask() -> u32 {
    let current = umask(Mode::empty());
    umask(current);
    current.bits()
}

/// Parent directory of the (dry-run) destination; the staging file must
/// live there for `linkat` to stay on one filesystem.
fn parent_dir(destination: &Path) -> PathBuf {
    match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
