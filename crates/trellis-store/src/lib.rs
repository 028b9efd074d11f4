//! Trellis Storage Layer
//!
//! Durable storage for accepted relationships using SQLite. Implements the
//! same [`RelationshipStore`] contract as the in-memory graph, so either can
//! back discovery.
//!
//! # Architecture
//!
//! - One `relationships` table keyed by (source, target, type)
//! - `upsert` runs its read-merge-write inside an IMMEDIATE transaction, so
//!   concurrent writers on the same database file serialize per call
//! - Busy or locked databases are retried internally; `upsert` never reports
//!   contention to the caller
//!
//! # Examples
//!
//! ```
//! use trellis_store::SqliteRelationshipStore;
//! use trellis_domain::traits::RelationshipStore;
//! use trellis_domain::{DiscoveryMethod, Relationship, RelationshipType, UpsertOutcome};
//!
//! let store = SqliteRelationshipStore::in_memory().unwrap();
//! let edge = Relationship::new("api", "postgres", RelationshipType::ConnectsTo, 0.7, DiscoveryMethod::Pattern);
//!
//! assert_eq!(store.upsert(edge).unwrap(), UpsertOutcome::Inserted);
//! assert_eq!(store.count().unwrap(), 1);
//! ```

#![warn(missing_docs)]

use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};
use trellis_domain::traits::RelationshipStore;
use trellis_domain::{
    Direction, DiscoveryMethod, EntityId, Evidence, Neighbor, Relationship, RelationshipType,
    TrellisError, UpsertOutcome,
};

/// Upper bound on the pause between upsert attempts
///
/// Busy upserts are retried without limit and contention is never reported.
/// A foreign process that holds the write lock forever stalls the upserting
/// caller forever; the connection mutex is released between attempts, so
/// other callers of the store keep going.
const MAX_BACKOFF: Duration = Duration::from_millis(100);

/// Attempts after which continued contention is logged at `warn`
const WARN_AFTER_ATTEMPTS: u32 = 5;

/// How long SQLite itself waits on a locked database per attempt
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

const SELECT_COLUMNS: &str = "SELECT source_id, target_id, relationship_type, confidence, \
     discovery_method, evidence, similarity FROM relationships";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The relationship violates a graph invariant
    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// A thread panicked while holding the connection
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Whether the error is transient database contention
    pub fn is_busy(&self) -> bool {
        match self {
            StoreError::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
            }
            _ => false,
        }
    }
}

impl From<StoreError> for TrellisError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidRelationship(msg) => TrellisError::InvalidInput(msg),
            busy if busy.is_busy() => TrellisError::ConcurrentConflict(busy.to_string()),
            other => TrellisError::Store(other.to_string()),
        }
    }
}

/// SQLite-based implementation of RelationshipStore
///
/// The connection is guarded by a mutex, so one store can be shared across
/// threads. Separate stores opened on the same file coordinate through
/// SQLite's own locking.
pub struct SqliteRelationshipStore {
    conn: Mutex<Connection>,
}

impl SqliteRelationshipStore {
    /// Open (or create) a store at the given database path
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use trellis_store::SqliteRelationshipStore;
    ///
    /// let store = SqliteRelationshipStore::open("trellis.db").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Create a store backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Number of stored relationships
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM relationships", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }

    fn try_upsert(
        conn: &mut Connection,
        relationship: &Relationship,
    ) -> Result<UpsertOutcome, StoreError> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = Self::select_one(
            &tx,
            &relationship.source,
            &relationship.target,
            relationship.relationship_type,
        )?;

        let (outcome, row) = match existing {
            None => (UpsertOutcome::Inserted, relationship.clone()),
            Some(mut stored) => {
                let outcome = stored.merge(relationship.clone());
                (outcome, stored)
            }
        };

        if outcome != UpsertOutcome::Unchanged {
            Self::write_row(&tx, &row)?;
        }

        tx.commit()?;
        Ok(outcome)
    }

    fn write_row(tx: &Transaction<'_>, relationship: &Relationship) -> Result<(), StoreError> {
        let evidence = relationship
            .evidence
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::InvalidData(format!("Unserializable evidence: {}", e)))?;
        let now = now_secs();

        tx.execute(
            "INSERT INTO relationships (source_id, target_id, relationship_type, confidence,
                 discovery_method, evidence, similarity, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT(source_id, target_id, relationship_type) DO UPDATE SET
             confidence = excluded.confidence,
             discovery_method = excluded.discovery_method,
             evidence = excluded.evidence,
             similarity = excluded.similarity,
             updated_at = excluded.updated_at",
            params![
                relationship.source.as_str(),
                relationship.target.as_str(),
                relationship.relationship_type.as_str(),
                relationship.confidence.score(),
                relationship.discovery_method.as_str(),
                evidence,
                relationship.similarity,
                now,
            ],
        )?;

        Ok(())
    }

    fn select_one(
        conn: &Connection,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Result<Option<Relationship>, StoreError> {
        let sql = format!(
            "{} WHERE source_id = ?1 AND target_id = ?2 AND relationship_type = ?3",
            SELECT_COLUMNS
        );
        let relationship = conn
            .query_row(
                &sql,
                params![source.as_str(), target.as_str(), relationship_type.as_str()],
                row_to_relationship,
            )
            .optional()?;
        Ok(relationship)
    }

    fn select_many(
        conn: &Connection,
        filter: &str,
        id: Option<&EntityId>,
    ) -> Result<Vec<Relationship>, StoreError> {
        let sql = format!("{} {}", SELECT_COLUMNS, filter);
        let mut stmt = conn.prepare(&sql)?;
        let rows = match id {
            Some(id) => stmt.query_map(params![id.as_str()], row_to_relationship)?,
            None => stmt.query_map([], row_to_relationship)?,
        };
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl RelationshipStore for SqliteRelationshipStore {
    type Error = StoreError;

    fn upsert(&self, relationship: Relationship) -> Result<UpsertOutcome, Self::Error> {
        relationship
            .validate()
            .map_err(|e| StoreError::InvalidRelationship(e.to_string()))?;

        // IMMEDIATE transactions take the write lock up front, so another
        // writer always finishes and a retry eventually gets through
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = {
                let mut conn = self.lock()?;
                Self::try_upsert(&mut conn, &relationship)
            };
            match result {
                Err(e) if e.is_busy() => {
                    if attempt == WARN_AFTER_ATTEMPTS {
                        warn!("Upsert of {} still busy after {} attempts", relationship, attempt);
                    } else {
                        debug!("Upsert of {} busy on attempt {}", relationship, attempt);
                    }
                    let backoff = Duration::from_millis(10 * u64::from(attempt));
                    thread::sleep(backoff.min(MAX_BACKOFF));
                }
                result => return result,
            }
        }
    }

    fn neighbors(&self, id: &EntityId, direction: Direction) -> Result<Vec<Neighbor>, Self::Error> {
        let conn = self.lock()?;

        let outgoing = || -> Result<Vec<Neighbor>, StoreError> {
            let rows = Self::select_many(
                &conn,
                "WHERE source_id = ?1 ORDER BY target_id, relationship_type",
                Some(id),
            )?;
            Ok(rows
                .into_iter()
                .map(|r| Neighbor {
                    entity: r.target,
                    relationship_type: r.relationship_type,
                    confidence: r.confidence,
                    direction: Direction::Outgoing,
                })
                .collect())
        };
        let incoming = || -> Result<Vec<Neighbor>, StoreError> {
            let rows = Self::select_many(
                &conn,
                "WHERE target_id = ?1 ORDER BY source_id, relationship_type",
                Some(id),
            )?;
            Ok(rows
                .into_iter()
                .map(|r| Neighbor {
                    entity: r.source,
                    relationship_type: r.relationship_type,
                    confidence: r.confidence,
                    direction: Direction::Incoming,
                })
                .collect())
        };

        match direction {
            Direction::Outgoing => outgoing(),
            Direction::Incoming => incoming(),
            Direction::Both => {
                let mut all = outgoing()?;
                all.extend(incoming()?);
                Ok(all)
            }
        }
    }

    fn get(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: RelationshipType,
    ) -> Result<Option<Relationship>, Self::Error> {
        let conn = self.lock()?;
        Self::select_one(&conn, source, target, relationship_type)
    }

    fn relationships(&self) -> Result<Vec<Relationship>, Self::Error> {
        let conn = self.lock()?;
        Self::select_many(
            &conn,
            "ORDER BY source_id, target_id, relationship_type",
            None,
        )
    }
}

fn row_to_relationship(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let type_str: String = row.get(2)?;
    let relationship_type = RelationshipType::parse(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(StoreError::InvalidData(format!(
                "Unknown relationship type: {}",
                type_str
            ))),
        )
    })?;

    let method_str: String = row.get(4)?;
    let discovery_method = DiscoveryMethod::parse(&method_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(StoreError::InvalidData(format!(
                "Unknown discovery method: {}",
                method_str
            ))),
        )
    })?;

    let evidence_json: Option<String> = row.get(5)?;
    let evidence = evidence_json
        .map(|json| serde_json::from_str::<Evidence>(&json))
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Relationship {
        source: EntityId::new(row.get::<_, String>(0)?),
        target: EntityId::new(row.get::<_, String>(1)?),
        relationship_type,
        confidence: row.get::<_, f64>(3)?.into(),
        discovery_method,
        evidence,
        similarity: row.get(6)?,
    })
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
