//! Relata Storage Layer
//!
//! Implements the RelationshipStore trait on SQLite.
//!
//! # Architecture
//!
//! - `relationships` holds one row per directed edge, unique per typed
//!   `(source, destination)` pair and indexed on both endpoints
//! - `relationship_attrs` holds the attribute rows, deleted with their
//!   relationship
//! - `relationship_types` holds the descriptive vocabulary
//!
//! Every write runs in one transaction. Uniqueness and attribute
//! validation are checked inside it, so a rejected write leaves nothing
//! behind.
//!
//! # Examples
//!
//! ```no_run
//! use relata_domain::{AttrValidatorRegistry, EntitySchema};
//! use relata_store::SqliteStore;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(AttrValidatorRegistry::new(Arc::new(EntitySchema::new())));
//! let store = SqliteStore::new(":memory:", registry).unwrap();
//! // Store is now ready for relationship operations
//! ```

#![warn(missing_docs)]

pub mod config;

pub use config::StoreConfig;

use relata_domain::traits::{RelationshipQuery, RelationshipStore};
use relata_domain::{
    AttrMap, AttrValidatorRegistry, Entity, EntityRef, RelatedEdges, Relationship, RelationshipAttr,
    RelationshipError, RelationshipId, RelationshipType,
};
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Relationship not found
    #[error("Relationship not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Rejected by the relationship rules
    #[error(transparent)]
    Relationship(#[from] RelationshipError),
}

impl StoreError {
    /// The domain error behind this failure, if any
    ///
    /// Lets an import layer tell rejected rows (`DuplicateEdge`,
    /// `InvalidAttribute`) apart from database faults.
    pub fn kind(&self) -> Option<&RelationshipError> {
        match self {
            StoreError::Relationship(err) => Some(err),
            _ => None,
        }
    }
}

/// Most ids bound into one `IN (...)` list
const MAX_BATCH: usize = 500;

const SELECT_RELATIONSHIP: &str = "SELECT id, source_type, source_id, destination_type, destination_id,
        relationship_type_id, automapping_id
 FROM relationships";

const SELECT_RELATIONSHIP_TYPE: &str = "SELECT id, relationship_type, description, forward_phrase,
        backward_phrase, symmetric
 FROM relationship_types";

/// SQLite-based implementation of RelationshipStore
///
/// Attribute writes are checked against the shared
/// [`AttrValidatorRegistry`] the store was opened with.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance; the registry can be shared between them.
pub struct SqliteStore {
    conn: Connection,
    registry: Arc<AttrValidatorRegistry>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use relata_domain::{AttrValidatorRegistry, EntitySchema};
    /// use relata_store::SqliteStore;
    /// use std::sync::Arc;
    ///
    /// let registry = Arc::new(AttrValidatorRegistry::new(Arc::new(EntitySchema::new())));
    /// let store = SqliteStore::new("relata.db", registry).unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P, registry: Arc<AttrValidatorRegistry>) -> Result<Self, StoreError> {
        Self::open(&StoreConfig::at(path), registry)
    }

    /// Create a store over a private in-memory database
    pub fn in_memory(registry: Arc<AttrValidatorRegistry>) -> Result<Self, StoreError> {
        Self::open(&StoreConfig::in_memory(), registry)
    }

    /// Open the database described by `config`
    pub fn open(config: &StoreConfig, registry: Arc<AttrValidatorRegistry>) -> Result<Self, StoreError> {
        let conn = Connection::open(&config.path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        if config.wal && !config.is_in_memory() {
            // Not every filesystem supports WAL; fall back to the default journal
            let _ = conn.pragma_update(None, "journal_mode", "WAL");
        }

        let mut store = Self { conn, registry };
        store.initialize_schema()?;
        info!("Opened relationship store at {}", config.path.display());
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Registry attribute writes are validated against
    pub fn registry(&self) -> &Arc<AttrValidatorRegistry> {
        &self.registry
    }
}

/// One `relationships` row before its attributes are attached
struct RelationshipRow {
    id: i64,
    source: EntityRef,
    destination: EntityRef,
    relationship_type_id: Option<String>,
    automapping_id: Option<i64>,
}

impl RelationshipRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            source: EntityRef::new(row.get::<_, String>(1)?, row.get(2)?),
            destination: EntityRef::new(row.get::<_, String>(3)?, row.get(4)?),
            relationship_type_id: row.get(5)?,
            automapping_id: row.get(6)?,
        })
    }

    fn into_relationship(self, attrs: AttrMap) -> Relationship {
        Relationship::from_stored(
            RelationshipId::from_value(self.id),
            self.source,
            self.destination,
            self.relationship_type_id,
            self.automapping_id.map(RelationshipId::from_value),
            attrs,
        )
    }
}

fn relationship_type_from_row(row: &Row<'_>) -> rusqlite::Result<RelationshipType> {
    Ok(RelationshipType {
        id: row.get(0)?,
        relationship_type: row.get(1)?,
        description: row.get(2)?,
        forward_phrase: row.get(3)?,
        backward_phrase: row.get(4)?,
        symmetric: row.get(5)?,
    })
}

/// Start a write transaction holding the write lock from the first statement
///
/// Concurrent writers wait out `busy_timeout` at `BEGIN` instead of failing
/// on lock upgrade, so checks inside the transaction see committed rows.
fn begin_write(conn: &mut Connection) -> rusqlite::Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
}

/// `?start, ?start+1, ...` for `count` numbered parameters
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|n| format!("?{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn duplicate_edge(source: &EntityRef, destination: &EntityRef) -> StoreError {
    warn!("Rejected duplicate relationship {} -> {}", source, destination);
    RelationshipError::DuplicateEdge {
        from: source.clone(),
        to: destination.clone(),
    }
    .into()
}

/// Map a unique-constraint failure on insert to `DuplicateEdge`
fn insert_error(err: rusqlite::Error, source: &EntityRef, destination: &EntityRef) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => {
            duplicate_edge(source, destination)
        }
        _ => err.into(),
    }
}

/// Attribute maps for the given relationship ids
fn load_attrs(conn: &Connection, ids: &[i64]) -> Result<HashMap<i64, AttrMap>, StoreError> {
    let mut rows: HashMap<i64, Vec<RelationshipAttr>> = HashMap::new();

    for chunk in ids.chunks(MAX_BATCH) {
        let sql = format!(
            "SELECT relationship_id, attr_name, attr_value FROM relationship_attrs
             WHERE relationship_id IN ({})",
            placeholders(1, chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let attrs = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            let id: i64 = row.get(0)?;
            let attr = RelationshipAttr::new(
                Some(RelationshipId::from_value(id)),
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            );
            Ok((id, attr))
        })?;

        for attr in attrs {
            let (id, attr) = attr?;
            rows.entry(id).or_default().push(attr);
        }
    }

    Ok(rows
        .into_iter()
        .map(|(id, attrs)| (id, AttrMap::from_rows(attrs)))
        .collect())
}

/// Attach attributes to a set of rows, keeping row order
fn with_attrs(conn: &Connection, rows: Vec<RelationshipRow>) -> Result<Vec<Relationship>, StoreError> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut attrs = load_attrs(conn, &ids)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let map = attrs.remove(&row.id).unwrap_or_default();
            row.into_relationship(map)
        })
        .collect())
}

fn query_relationships_where(
    conn: &Connection,
    clause: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Relationship>, StoreError> {
    let sql = format!("{} WHERE {} ORDER BY id", SELECT_RELATIONSHIP, clause);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, RelationshipRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    with_attrs(conn, rows)
}

fn load_relationship(conn: &Connection, id: RelationshipId) -> Result<Option<Relationship>, StoreError> {
    let row = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_RELATIONSHIP),
            params![id.value()],
            RelationshipRow::from_row,
        )
        .optional()?;

    match row {
        Some(row) => Ok(with_attrs(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

impl RelationshipStore for SqliteStore {
    type Error = StoreError;

    fn create_relationship(&mut self, relationship: &Relationship) -> Result<RelationshipId, Self::Error> {
        let (source, destination) = relationship.endpoints()?;
        let tx = begin_write(&mut self.conn)?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM relationships
                 WHERE source_type = ?1 AND source_id = ?2
                   AND destination_type = ?3 AND destination_id = ?4",
                params![&source.type_name, source.id, &destination.type_name, destination.id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(duplicate_edge(source, destination));
        }

        relationship.validate_attrs(&self.registry)?;

        tx.execute(
            "INSERT INTO relationships
             (source_type, source_id, destination_type, destination_id, relationship_type_id, automapping_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &source.type_name,
                source.id,
                &destination.type_name,
                destination.id,
                &relationship.relationship_type_id,
                relationship.automapping_id.map(|id| id.value()),
            ],
        )
        .map_err(|e| insert_error(e, source, destination))?;

        let id = tx.last_insert_rowid();
        for attr in relationship.attr_rows() {
            tx.execute(
                "INSERT INTO relationship_attrs (relationship_id, attr_name, attr_value) VALUES (?1, ?2, ?3)",
                params![id, attr.attr_name, attr.attr_value],
            )?;
        }

        tx.commit()?;
        debug!("Created relationship {} ({} -> {})", id, source, destination);
        Ok(RelationshipId::from_value(id))
    }

    fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>, Self::Error> {
        load_relationship(&self.conn, id)
    }

    fn find_related(&self, a: &dyn Entity, b: &dyn Entity) -> Result<Option<Relationship>, Self::Error> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "{} WHERE (source_type = ?1 AND source_id = ?2 AND destination_type = ?3 AND destination_id = ?4)
                        OR (source_type = ?3 AND source_id = ?4 AND destination_type = ?1 AND destination_id = ?2)
                     ORDER BY id LIMIT 1",
                    SELECT_RELATIONSHIP
                ),
                params![a.type_name(), a.id(), b.type_name(), b.id()],
                RelationshipRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => Ok(with_attrs(&self.conn, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn query_relationships(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>, Self::Error> {
        let mut sql = format!("{} WHERE 1=1", SELECT_RELATIONSHIP);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(source_type) = &query.source_type {
            sql.push_str(" AND source_type = ?");
            params.push(Box::new(source_type.clone()));
        }

        if let Some(destination_type) = &query.destination_type {
            sql.push_str(" AND destination_type = ?");
            params.push(Box::new(destination_type.clone()));
        }

        if let Some(relationship_type_id) = &query.relationship_type_id {
            sql.push_str(" AND relationship_type_id = ?");
            params.push(Box::new(relationship_type_id.clone()));
        }

        if query.automapped_only {
            sql.push_str(" AND automapping_id IS NOT NULL");
        }

        sql.push_str(" ORDER BY id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(&param_refs[..], RelationshipRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        with_attrs(&self.conn, rows)
    }

    fn set_attr(
        &mut self,
        id: RelationshipId,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, Self::Error> {
        let tx = begin_write(&mut self.conn)?;

        let mut relationship =
            load_relationship(&tx, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let previous = relationship.set_attr(&self.registry, name, value)?;

        tx.execute(
            "INSERT INTO relationship_attrs (relationship_id, attr_name, attr_value) VALUES (?1, ?2, ?3)
             ON CONFLICT(relationship_id, attr_name) DO UPDATE SET attr_value = excluded.attr_value",
            params![id.value(), name, value],
        )?;

        tx.commit()?;
        Ok(previous)
    }

    fn remove_attr(&mut self, id: RelationshipId, name: &str) -> Result<Option<String>, Self::Error> {
        let tx = begin_write(&mut self.conn)?;

        let previous: Option<String> = tx
            .query_row(
                "SELECT attr_value FROM relationship_attrs WHERE relationship_id = ?1 AND attr_name = ?2",
                params![id.value(), name],
                |row| row.get(0),
            )
            .optional()?;

        if previous.is_some() {
            tx.execute(
                "DELETE FROM relationship_attrs WHERE relationship_id = ?1 AND attr_name = ?2",
                params![id.value(), name],
            )?;
        }

        tx.commit()?;
        Ok(previous)
    }

    fn delete_relationship(&mut self, id: RelationshipId) -> Result<bool, Self::Error> {
        let tx = begin_write(&mut self.conn)?;

        let derived: i64 = tx.query_row(
            "SELECT COUNT(*) FROM relationships WHERE automapping_id = ?1",
            params![id.value()],
            |row| row.get(0),
        )?;

        let deleted = tx.execute("DELETE FROM relationships WHERE id = ?1", params![id.value()])?;
        tx.commit()?;

        if deleted > 0 && derived > 0 {
            debug!("Unlinked {} relationship(s) automapped from {}", derived, id);
        }
        Ok(deleted > 0)
    }

    fn related_sources(&self, entity: &dyn Entity) -> Result<Vec<Relationship>, Self::Error> {
        query_relationships_where(
            &self.conn,
            "destination_type = ?1 AND destination_id = ?2",
            params![entity.type_name(), entity.id()],
        )
    }

    fn related_destinations(&self, entity: &dyn Entity) -> Result<Vec<Relationship>, Self::Error> {
        query_relationships_where(
            &self.conn,
            "source_type = ?1 AND source_id = ?2",
            params![entity.type_name(), entity.id()],
        )
    }

    fn delete_entity(&mut self, entity: &dyn Entity) -> Result<usize, Self::Error> {
        self.delete_entities(std::slice::from_ref(&entity.entity_ref()))
    }

    fn delete_entities(&mut self, entities: &[EntityRef]) -> Result<usize, Self::Error> {
        let tx = begin_write(&mut self.conn)?;

        let mut deleted = 0;
        for entity in entities {
            let count = tx.execute(
                "DELETE FROM relationships
                 WHERE (source_type = ?1 AND source_id = ?2)
                    OR (destination_type = ?1 AND destination_id = ?2)",
                params![&entity.type_name, entity.id],
            )?;
            if count > 0 {
                info!("Deleted {} relationship(s) of {}", count, entity);
            }
            deleted += count;
        }

        tx.commit()?;
        Ok(deleted)
    }

    fn eager_related(
        &self,
        type_name: &str,
        ids: &[i64],
    ) -> Result<HashMap<i64, RelatedEdges>, Self::Error> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let mut edges: HashMap<i64, RelatedEdges> =
            unique.iter().map(|&id| (id, RelatedEdges::default())).collect();

        for chunk in unique.chunks(MAX_BATCH) {
            let batch: HashSet<i64> = chunk.iter().copied().collect();
            let list = placeholders(2, chunk.len());
            let sql = format!(
                "{} WHERE (source_type = ?1 AND source_id IN ({list}))
                    OR (destination_type = ?1 AND destination_id IN ({list}))
                 ORDER BY id",
                SELECT_RELATIONSHIP,
                list = list
            );

            let mut params: Vec<&dyn rusqlite::ToSql> = vec![&type_name];
            params.extend(chunk.iter().map(|id| id as &dyn rusqlite::ToSql));

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(&params[..], RelationshipRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            for relationship in with_attrs(&self.conn, rows)? {
                let (source, destination) = relationship.endpoints()?;
                let (source, destination) = (source.clone(), destination.clone());

                if destination.type_name == type_name && batch.contains(&destination.id) {
                    if let Some(entry) = edges.get_mut(&destination.id) {
                        entry.related_sources.push(relationship.clone());
                    }
                }
                if source.type_name == type_name && batch.contains(&source.id) {
                    if let Some(entry) = edges.get_mut(&source.id) {
                        entry.related_destinations.push(relationship);
                    }
                }
            }
        }

        debug!("Eager-loaded relationships for {} {} entities", ids.len(), type_name);
        Ok(edges)
    }

    fn count_relationships(&self) -> Result<usize, Self::Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;

        usize::try_from(count).map_err(|_| StoreError::InvalidData(format!("Negative row count: {}", count)))
    }

    fn save_relationship_type(&mut self, relationship_type: &RelationshipType) -> Result<i64, Self::Error> {
        let tx = begin_write(&mut self.conn)?;

        tx.execute(
            "INSERT INTO relationship_types
             (relationship_type, description, forward_phrase, backward_phrase, symmetric)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(relationship_type) DO UPDATE SET
             description = excluded.description,
             forward_phrase = excluded.forward_phrase,
             backward_phrase = excluded.backward_phrase,
             symmetric = excluded.symmetric",
            params![
                &relationship_type.relationship_type,
                &relationship_type.description,
                &relationship_type.forward_phrase,
                &relationship_type.backward_phrase,
                relationship_type.symmetric,
            ],
        )?;

        let id: i64 = tx.query_row(
            "SELECT id FROM relationship_types WHERE relationship_type = ?1",
            params![&relationship_type.relationship_type],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(id)
    }

    fn get_relationship_type(&self, key: &str) -> Result<Option<RelationshipType>, Self::Error> {
        let relationship_type = self
            .conn
            .query_row(
                &format!("{} WHERE relationship_type = ?1", SELECT_RELATIONSHIP_TYPE),
                params![key],
                relationship_type_from_row,
            )
            .optional()?;

        Ok(relationship_type)
    }

    fn list_relationship_types(&self) -> Result<Vec<RelationshipType>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY relationship_type", SELECT_RELATIONSHIP_TYPE))?;

        let types = stmt
            .query_map([], relationship_type_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(types)
    }

    fn delete_relationship_type(&mut self, key: &str) -> Result<bool, Self::Error> {
        let deleted = self
            .conn
            .execute("DELETE FROM relationship_types WHERE relationship_type = ?1", params![key])?;
        Ok(deleted > 0)
    }
}
