//! Token command implementation

use crate::cli::{TokenClearArgs, TokenSetArgs};
use crate::client::{FileSessionStore, SessionStore};
use crate::config::PrintwatchConfig;

fn token_store(config: &PrintwatchConfig) -> Result<FileSessionStore, Box<dyn std::error::Error>> {
    let path = config.backend.token_file.as_ref().ok_or(
        "No token file configured. Set backend.token_file, PRINTWATCH_TOKEN_FILE or --token-file.",
    )?;
    Ok(FileSessionStore::new(path))
}

/// Handle `printwatch token set` command
pub fn handle_token_set(args: &TokenSetArgs) -> Result<String, Box<dyn std::error::Error>> {
    let token = args.token.trim();
    if token.is_empty() {
        return Err("Token cannot be empty".into());
    }

    let config = args.backend.load_config()?;
    let store = token_store(&config)?;
    store.save_token(Some(token))?;

    Ok(format!("✓ Token saved to {}", store.path().display()))
}

/// Handle `printwatch token clear` command
pub fn handle_token_clear(args: &TokenClearArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = args.backend.load_config()?;
    let store = token_store(&config)?;
    store.save_token(None)?;

    Ok(format!("✓ Token removed from {}", store.path().display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::BackendArgs;

    fn backend_args(dir: &tempfile::TempDir, token_file: bool) -> BackendArgs {
        BackendArgs {
            config: dir.path().join("printwatch.toml"),
            backend_url: Some("http://localhost:8080".to_string()),
            token_file: token_file.then(|| dir.path().join("session").join("token")),
        }
    }

    #[test]
    fn test_token_set_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("session").join("token");

        let set = TokenSetArgs {
            token: " abc123 ".to_string(),
            backend: backend_args(&dir, true),
        };
        handle_token_set(&set).unwrap();
        assert_eq!(std::fs::read_to_string(&token_path).unwrap().trim(), "abc123");

        let clear = TokenClearArgs {
            backend: backend_args(&dir, true),
        };
        handle_token_clear(&clear).unwrap();
        assert!(!token_path.exists());
    }

    #[test]
    fn test_token_set_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let args = TokenSetArgs {
            token: "  ".to_string(),
            backend: backend_args(&dir, true),
        };
        assert!(handle_token_set(&args).is_err());
    }

    #[test]
    fn test_token_requires_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = TokenClearArgs {
            backend: backend_args(&dir, false),
        };
        if std::env::var_os("PRINTWATCH_TOKEN_FILE").is_none() {
            let err = handle_token_clear(&args).unwrap_err();
            assert!(err.to_string().contains("No token file configured"));
        }
    }
}
