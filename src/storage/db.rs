//! Database persistence layer using Sled
//!
//! One record per known spork id, overwritten on update. Persisted records
//! outlive the process and are the source of truth across restarts.

use sled::{Db, Tree};
use std::path::Path;

use crate::spork::{SporkId, SporkMessage, SporkStore};

/// Database wrapper
#[derive(Debug, Clone)]
pub struct NodeDb {
    db: Db,
    sporks_tree: Tree,
}

impl NodeDb {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let db = sled::open(path)?;
        let sporks_tree = db.open_tree("sporks")?;

        Ok(Self { db, sporks_tree })
    }
}

impl SporkStore for NodeDb {
    fn read(&self, id: SporkId) -> Option<SporkMessage> {
        let bytes = match self.sporks_tree.get(id.code().to_le_bytes()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(spork = id.name(), error = %e, "spork read failed");
                return None;
            }
        };

        match bincode::deserialize(&bytes) {
            Ok(msg) => Some(msg),
            Err(e) => {
                // A corrupt record is treated as absent; the next accepted
                // update overwrites it.
                tracing::warn!(spork = id.name(), error = %e, "corrupt spork record");
                None
            }
        }
    }

    fn write(&self, id: SporkId, msg: &SporkMessage) -> std::io::Result<()> {
        let value = bincode::serialize(msg)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.sporks_tree.insert(id.code().to_le_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let db = NodeDb::open(dir.path()).unwrap();

        let msg = SporkMessage::unsigned(SporkId::FastTx.code(), 42, 1_700_000_000);
        db.write(SporkId::FastTx, &msg).unwrap();

        let loaded = db.read(SporkId::FastTx).unwrap();
        assert_eq!(loaded, msg);
    }

    #[test]
    fn test_missing_record_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let db = NodeDb::open(dir.path()).unwrap();
        assert!(db.read(SporkId::MaxValue).is_none());
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        let db = NodeDb::open(dir.path()).unwrap();

        let first = SporkMessage::unsigned(SporkId::MaxValue.code(), 1000, 10);
        let second = SporkMessage::unsigned(SporkId::MaxValue.code(), 2000, 20);
        db.write(SporkId::MaxValue, &first).unwrap();
        db.write(SporkId::MaxValue, &second).unwrap();

        assert_eq!(db.read(SporkId::MaxValue).unwrap(), second);
    }
}
