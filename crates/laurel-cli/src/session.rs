// crates/laurel-cli/src/session.rs
//
// Wallet session: which owner the CLI acts for.
//
// `laurel wallet connect <address>` writes the session file and
// `laurel wallet disconnect` removes it. Commands that take an owner fall
// back to the connected wallet when `--owner` is not given. The engine itself
// never sees the session; it only receives explicit owner ids.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use laurel_core::ids::OwnerId;

/// A connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    /// The connected wallet address.
    pub owner_id: String,
    /// Unix seconds.
    pub connected_at: u64,
}

impl Session {
    /// Start a session for `owner`, validating the address format.
    pub fn connect(owner: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let owner = OwnerId::parse(owner)?;
        let connected_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        Ok(Self {
            session_id: Uuid::now_v7(),
            owner_id: owner.to_string(),
            connected_at,
        })
    }
}

/// Default session file: `~/.laurel/session.toml`.
pub fn default_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(".laurel").join("session.toml"))
}

/// Read the session, if one is connected.
pub fn load(path: &Path) -> Result<Option<Session>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    Ok(Some(toml::from_str(&contents)?))
}

pub fn save(path: &Path, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string(session)?)?;
    Ok(())
}

/// Remove the session. Returns the session that was connected, if any.
pub fn clear(path: &Path) -> Result<Option<Session>, Box<dyn std::error::Error>> {
    let previous = load(path)?;
    if previous.is_some() {
        fs::remove_file(path)?;
    }
    Ok(previous)
}

/// The owner to act for: the explicit `--owner`, else the connected wallet.
pub fn resolve_owner(explicit: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(owner) = explicit {
        return Ok(owner.to_string());
    }
    match load(&default_path()?)? {
        Some(session) => Ok(session.owner_id),
        None => Err("No wallet connected. Run `laurel wallet connect <address>` or pass --owner.".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("laurel_cli_test_{}", Uuid::now_v7()))
            .join("session.toml")
    }

    #[test]
    fn test_connect_save_load_clear() {
        let path = temp_session_path();
        assert_eq!(load(&path).unwrap(), None);

        let session = Session::connect(" 0xabc ").unwrap();
        assert_eq!(session.owner_id, "0xabc");
        save(&path, &session).unwrap();
        assert_eq!(load(&path).unwrap(), Some(session.clone()));

        assert_eq!(clear(&path).unwrap(), Some(session));
        assert_eq!(load(&path).unwrap(), None);
        assert_eq!(clear(&path).unwrap(), None);
    }

    #[test]
    fn test_connect_rejects_bad_address() {
        assert!(Session::connect("").is_err());
        assert!(Session::connect("0x:abc").is_err());
    }

    #[test]
    fn test_explicit_owner_wins() {
        assert_eq!(resolve_owner(Some("0xdef")).unwrap(), "0xdef");
    }
}
