//! Bearer token persistence.
//!
//! The client never reads ambient state for credentials; whoever builds it
//! hands over a [`SessionStore`] to load the token from.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Persistence port for the API bearer token.
pub trait SessionStore: Send + Sync {
    /// Load the persisted token, `None` when logged out.
    fn load_token(&self) -> io::Result<Option<String>>;

    /// Persist a token, or forget it with `None`.
    fn save_token(&self, token: Option<&str>) -> io::Result<()>;
}

/// Keeps the token in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load_token(&self) -> io::Result<Option<String>> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_token(&self, token: Option<&str>) -> io::Result<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.map(str::to_string);
        Ok(())
    }
}

/// Stores the token in a plain file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load_token(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save_token(&self, token: Option<&str>) -> io::Result<()> {
        match token {
            Some(token) => {
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, token)
            }
            None => match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        }
    }
}
