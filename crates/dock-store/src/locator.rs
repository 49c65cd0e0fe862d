//! Durable references to file-system entries.
//!
//! A locator is captured once from a live path and stored as an opaque
//! token. The token remembers the canonical path and, on Unix, the file's
//! `(device, inode)` identity and modification time, which lets resolution
//! follow a rename or a short move inside the original parent directory.
//!
//! Token layout: `<hex(json bookmark)>.<hex(sha256(json)[..8])>`.

use crate::error::ResolutionError;
use log::trace;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, Metadata};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

const CHECKSUM_LEN: usize = 8;

/// How far below the original parent a moved target is looked for.
const RECOVERY_DEPTH: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct FileId {
    dev: u64,
    ino: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Bookmark {
    path: PathBuf,
    #[serde(default, rename = "fileId", skip_serializing_if = "Option::is_none")]
    file_id: Option<FileId>,
    /// Modification time at capture, in nanoseconds since the epoch.
    /// A recovered entry must still carry it, so a reused inode is not
    /// mistaken for the captured file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified: Option<u64>,
}

/// Opaque, revalidatable reference to a file-system entry.
///
/// Deserializing never fails on a bad token; the error shows up on the
/// first `resolve`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    token: String,
}

/// A live path recovered from a locator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    /// The token decoded, but the target it describes may have changed:
    /// it was found at another path, or the entry at the original path is
    /// not the one that was captured.
    pub stale: bool,
}

impl Locator {
    /// Capture a locator for an existing path.
    pub fn capture(path: &Path) -> Result<Self, ResolutionError> {
        let path = fs::canonicalize(path)?;
        let meta = fs::metadata(&path)?;
        let bookmark = Bookmark {
            file_id: file_id(&meta),
            modified: modified(&meta),
            path,
        };
        Ok(Self {
            token: encode(&bookmark)?,
        })
    }

    /// Wrap a token read back from storage.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The path recorded at capture time, if the token decodes.
    pub fn recorded_path(&self) -> Option<PathBuf> {
        decode(&self.token).ok().map(|b| b.path)
    }

    /// Recover a live path.
    pub fn resolve(&self) -> Result<Resolved, ResolutionError> {
        let bookmark = decode(&self.token)?;
        let current = fs::metadata(&bookmark.path).ok();

        match (current, bookmark.file_id) {
            (Some(_), None) => Ok(Resolved {
                path: bookmark.path,
                stale: false,
            }),
            (Some(meta), Some(id)) if file_id(&meta) == Some(id) => Ok(Resolved {
                path: bookmark.path,
                stale: false,
            }),
            (Some(_), Some(id)) => {
                let path = recover(&bookmark, id).unwrap_or(bookmark.path);
                Ok(Resolved { path, stale: true })
            }
            (None, Some(id)) => recover(&bookmark, id)
                .map(|path| Resolved { path, stale: true })
                .ok_or_else(|| gone(&bookmark.path)),
            (None, None) => Err(gone(&bookmark.path)),
        }
    }

    /// Resolve and hold the target open until the guard is dropped.
    pub fn access(&self) -> Result<ScopedAccess, ResolutionError> {
        let resolved = self.resolve()?;
        let handle = File::open(&resolved.path)?;
        trace!("Acquired scoped access to {}", resolved.path.display());

        Ok(ScopedAccess {
            resolved,
            _handle: handle,
        })
    }
}

/// Scoped access to a resolved target. Released on drop.
#[derive(Debug)]
pub struct ScopedAccess {
    resolved: Resolved,
    _handle: File,
}

impl ScopedAccess {
    pub fn path(&self) -> &Path {
        &self.resolved.path
    }

    pub fn is_stale(&self) -> bool {
        self.resolved.stale
    }
}

impl Drop for ScopedAccess {
    fn drop(&mut self) {
        trace!("Released scoped access to {}", self.resolved.path.display());
    }
}

fn gone(path: &Path) -> ResolutionError {
    ResolutionError::Unresolvable(format!("{} no longer exists", path.display()))
}

fn checksum(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    hex::encode(&digest[..CHECKSUM_LEN])
}

fn encode(bookmark: &Bookmark) -> Result<String, ResolutionError> {
    let payload = serde_json::to_vec(bookmark)
        .map_err(|e| ResolutionError::Unresolvable(format!("cannot encode bookmark: {}", e)))?;
    Ok(format!("{}.{}", hex::encode(&payload), checksum(&payload)))
}

fn decode(token: &str) -> Result<Bookmark, ResolutionError> {
    let corrupt = |why: &str| ResolutionError::Unresolvable(format!("corrupt token: {}", why));

    let (payload_hex, sum) = token.split_once('.').ok_or_else(|| corrupt("no checksum"))?;
    let payload = hex::decode(payload_hex).map_err(|_| corrupt("payload is not hex"))?;
    if checksum(&payload) != sum {
        return Err(corrupt("checksum mismatch"));
    }
    serde_json::from_slice(&payload).map_err(|_| corrupt("payload is not a bookmark"))
}

#[cfg(unix)]
fn file_id(meta: &Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;
    Some(FileId {
        dev: meta.dev(),
        ino: meta.ino(),
    })
}

#[cfg(not(unix))]
fn file_id(_meta: &Metadata) -> Option<FileId> {
    None
}

fn modified(meta: &Metadata) -> Option<u64> {
    let since_epoch = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
    u64::try_from(since_epoch.as_nanos()).ok()
}

/// Look for the captured entry near where it used to be.
fn recover(bookmark: &Bookmark, id: FileId) -> Option<PathBuf> {
    let parent = bookmark.path.parent()?;

    WalkDir::new(parent)
        .min_depth(1)
        .max_depth(RECOVERY_DEPTH)
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|entry| {
            let Ok(meta) = entry.metadata() else {
                return false;
            };
            file_id(&meta) == Some(id)
                && (bookmark.modified.is_none() || modified(&meta) == bookmark.modified)
        })
        .map(|entry| entry.into_path())
}
