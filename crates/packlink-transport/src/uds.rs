use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::ByteTransport;

/// Owner-only access for the socket standing in for the serial line.
const LINK_SOCKET_MODE: u32 = 0o600;

/// Capacity of `sockaddr_un.sun_path`.
#[cfg(target_os = "linux")]
const SUN_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const SUN_PATH_LEN: usize = 104;

/// Listening end of a Unix domain socket link.
///
/// Two processes connected through this socket behave like two nodes on a
/// serial line: each accepted or connected [`LinkStream`] is non-blocking and
/// exchanges single bytes. The socket file is removed on drop unless another
/// process has replaced it in the meantime.
pub struct UnixLink {
    listener: UnixListener,
    path: PathBuf,
    identity: Option<FileIdentity>,
}

/// Device and inode of the socket file this process created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    fn of_socket(path: &Path) -> Option<Self> {
        let meta = std::fs::symlink_metadata(path).ok()?;
        meta.file_type().is_socket().then(|| Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }
}

impl UnixLink {
    /// Bind the link socket at `path` with owner-only permissions.
    ///
    /// A leftover socket from an earlier listener is replaced; any other kind
    /// of file at `path` is an error.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        clear_stale_socket(&path)?;

        let listener = UnixListener::bind(&path).map_err(|e| bind_error(&path, e))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(LINK_SOCKET_MODE))
            .map_err(|e| bind_error(&path, e))?;
        let identity = FileIdentity::of_socket(&path);

        info!(?path, "waiting for link peer");
        Ok(Self {
            listener,
            path,
            identity,
        })
    }

    /// Accept the next peer (blocking) and return its non-blocking stream.
    pub fn accept(&self) -> Result<LinkStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "link peer attached");
        LinkStream::from_unix(stream)
    }

    /// Attach to a listening link (blocking connect, non-blocking stream).
    pub fn connect(path: impl AsRef<Path>) -> Result<LinkStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "attached to link");
        LinkStream::from_unix(stream)
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixLink {
    fn drop(&mut self) {
        if self.identity.is_some() && FileIdentity::of_socket(&self.path) == self.identity {
            debug!(path = ?self.path, "removing link socket");
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn clear_stale_socket(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= SUN_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: SUN_PATH_LEN,
        });
    }

    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            debug!(?path, "replacing stale link socket");
            std::fs::remove_file(path).map_err(|e| bind_error(path, e))
        }
        Ok(_) => Err(bind_error(
            path,
            std::io::Error::new(ErrorKind::AlreadyExists, "path exists and is not a socket"),
        )),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(bind_error(path, err)),
    }
}

fn bind_error(path: &Path, source: std::io::Error) -> TransportError {
    TransportError::Bind {
        path: path.to_path_buf(),
        source,
    }
}

/// A connected, non-blocking byte stream between two link peers.
///
/// A full socket buffer plays the part of a busy transmit register:
/// `try_send` reports "not now" until the peer reads.
pub struct LinkStream {
    inner: UnixStream,
}

impl LinkStream {
    fn from_unix(stream: UnixStream) -> Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self { inner: stream })
    }

    /// Create a connected pair without touching the filesystem.
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = UnixStream::pair()?;
        Ok((Self::from_unix(left)?, Self::from_unix(right)?))
    }
}

impl ByteTransport for LinkStream {
    fn try_send(&mut self, byte: u8) -> Result<bool> {
        match self.inner.write(&[byte]) {
            Ok(0) => Err(TransportError::Closed),
            Ok(_) => Ok(true),
            Err(err) => match err.kind() {
                ErrorKind::WouldBlock | ErrorKind::Interrupted => Ok(false),
                ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => Err(TransportError::Closed),
                _ => Err(TransportError::Io(err)),
            },
        }
    }

    fn try_recv(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.inner.read(&mut byte) {
            Ok(0) => Err(TransportError::Closed),
            Ok(_) => Ok(Some(byte[0])),
            Err(err) => match err.kind() {
                ErrorKind::WouldBlock | ErrorKind::Interrupted => Ok(None),
                ErrorKind::ConnectionReset => Err(TransportError::Closed),
                _ => Err(TransportError::Io(err)),
            },
        }
    }

    fn transport_name(&self) -> &'static str {
        "unix-socket"
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkStream").finish_non_exhaustive()
    }
}
