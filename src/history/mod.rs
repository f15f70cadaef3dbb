//! Value historization and historical reads
//!
//! The historizer records value changes of monitored nodes into one
//! append-only table per node and answers raw (paginated) and at-time
//! (interpolating) historical queries. Every operation acquires and
//! releases its backend connection within the call; nothing is held across
//! calls or shared mutably between the runtime's worker threads.

pub mod quality;
pub mod store;
pub mod token;

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::{debug, error, info, warn};

pub use quality::{DataLocation, QualityBits};
pub use store::{DbConn, DbPool};
pub use token::ContinuationToken;

use crate::config::HistoryConfig;
use crate::space::{AddressSpace, MonitorMode, MonitorRequest, NodeIdentifier};
use crate::variant::{self, DataKind, DataVariant};
use crate::{Error, Result};

/// Raw history read request
#[derive(Debug, Clone)]
pub struct RawReadRequest {
    pub node: NodeIdentifier,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Inclusive boundary comparisons when set, exclusive otherwise
    pub include_bounds: bool,
    /// Maximum records per page; 0 means unlimited
    pub limit: u32,
    pub continuation: Option<ContinuationToken>,
    /// Release a previously issued continuation instead of reading
    pub release: bool,
}

impl RawReadRequest {
    /// Unbounded ascending read of a node's full history
    #[must_use]
    pub fn all(node: NodeIdentifier) -> Self {
        Self {
            node,
            start: None,
            end: None,
            include_bounds: true,
            limit: 0,
            continuation: None,
            release: false,
        }
    }
}

/// One stored record returned by a raw read
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryValue {
    pub sequence: i64,
    pub value: DataVariant,
    pub source_time: Option<DateTime<Utc>>,
    pub server_time: Option<DateTime<Utc>>,
}

/// Result page of a raw read
#[derive(Debug, Clone)]
pub struct RawReadResponse {
    pub values: Vec<HistoryValue>,
    /// Present when more records match the request than were returned
    pub continuation: Option<ContinuationToken>,
}

/// One answered timestamp of an at-time read
#[derive(Debug, Clone, PartialEq)]
pub struct AtTimeValue {
    pub timestamp: DateTime<Utc>,
    pub value: DataVariant,
    pub quality: QualityBits,
}

/// Records value changes and serves historical reads
pub struct Historizer {
    pool: DbPool,
    /// Declared value kind per node, backed by the bookkeeping table
    kinds: DashMap<NodeIdentifier, DataKind>,
    sampling_interval: Duration,
}

impl Historizer {
    /// Open the historizer against the configured backend
    ///
    /// # Errors
    ///
    /// Returns an error if the backing database cannot be opened
    pub fn open(config: &HistoryConfig) -> Result<Self> {
        let pool = match &config.database_path {
            Some(path) => store::init(path)?,
            None => store::init_memory()?,
        };
        Ok(Self {
            pool,
            kinds: DashMap::new(),
            sampling_interval: Duration::from_millis(config.sampling_interval_ms),
        })
    }

    /// Open an in-memory historizer (for embedding and tests)
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized
    pub fn in_memory() -> Result<Self> {
        Self::open(&HistoryConfig::default())
    }

    fn conn(&self) -> Result<DbConn> {
        self.pool
            .get()
            .map_err(|e| Error::BackendUnavailable(e.to_string()))
    }

    /// Arm historization for a node; idempotent
    ///
    /// The first call creates the node's record table and bookkeeping row.
    /// Every call (re-)arms a reporting-mode value-change monitor and
    /// refreshes the bookkeeping marker, so re-registration after a restart
    /// resumes recording into the existing table.
    ///
    /// # Errors
    ///
    /// [`Error::BackendUnavailable`] when storage is unreachable,
    /// [`Error::TypeMismatch`] when re-registering with a different kind,
    /// or the address-space error when the monitor cannot be armed
    pub fn register_node(
        &self,
        space: &dyn AddressSpace,
        id: &NodeIdentifier,
        kind: DataKind,
    ) -> Result<()> {
        let conn = self.conn()?;
        let key = id.to_string();
        let now = store::format_ts(Utc::now());

        let stored: Option<String> = conn
            .query_row(
                "SELECT value_kind FROM historized_nodes WHERE node_id = ?1",
                [key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(stored) => {
                let stored_kind = DataKind::from_str(&stored)
                    .ok_or_else(|| Error::Internal(format!("unknown stored kind {stored:?}")))?;
                if stored_kind != kind {
                    return Err(Error::TypeMismatch {
                        expected: stored_kind,
                        actual: kind,
                    });
                }
                conn.execute(
                    "UPDATE historized_nodes SET last_updated = ?2 WHERE node_id = ?1",
                    params![key, now],
                )?;
                debug!(node = %id, "node already historized; refreshed marker");
            }
            None => {
                conn.execute(
                    "INSERT INTO historized_nodes (node_id, value_kind, last_updated)
                     VALUES (?1, ?2, ?3)",
                    params![key, kind.as_str(), now],
                )?;
                conn.execute_batch(&format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        seq INTEGER PRIMARY KEY AUTOINCREMENT,
                        server_ts TEXT,
                        source_ts TEXT,
                        value {} NOT NULL
                    );",
                    store::record_table(id),
                    store::column_type(kind),
                ))?;
                info!(node = %id, kind = %kind, "historization armed");
            }
        }
        self.kinds.insert(id.clone(), kind);

        space.monitor_value(
            id,
            MonitorRequest {
                sampling_interval: self.sampling_interval,
                mode: MonitorMode::Reporting,
            },
        )
    }

    /// Value-change notification entry point
    ///
    /// Never fails the calling thread: backend trouble is logged and the
    /// sample dropped. A false `historizing` flag drops the sample with an
    /// informational log, so historization can be administratively disabled
    /// per node while the monitor stays armed.
    pub fn data_changed(
        &self,
        id: &NodeIdentifier,
        historizing: bool,
        value: &DataVariant,
        source_time: Option<DateTime<Utc>>,
        server_time: Option<DateTime<Utc>>,
    ) {
        if !historizing {
            info!(node = %id, "node is not configured for historization; value dropped");
            return;
        }
        if let Err(e) = self.append(id, value, source_time, server_time) {
            match e {
                Error::BackendUnavailable(_) => {
                    error!(node = %id, error = %e, "could not historize value; backend unavailable");
                }
                other => error!(node = %id, error = %other, "failed to historize value"),
            }
        }
    }

    fn append(
        &self,
        id: &NodeIdentifier,
        value: &DataVariant,
        source_time: Option<DateTime<Utc>>,
        server_time: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let kind = self.value_kind(&conn, id)?;
        if value.kind() != kind {
            return Err(Error::TypeMismatch {
                expected: kind,
                actual: value.kind(),
            });
        }
        conn.execute(
            &format!(
                "INSERT INTO {} (server_ts, source_ts, value) VALUES (?1, ?2, ?3)",
                store::record_table(id)
            ),
            params![
                server_time.map(store::format_ts),
                source_time.map(store::format_ts),
                store::encode_value(value),
            ],
        )?;
        conn.execute(
            "UPDATE historized_nodes SET last_updated = ?2 WHERE node_id = ?1",
            params![id.to_string(), store::format_ts(Utc::now())],
        )?;
        Ok(())
    }

    fn value_kind(&self, conn: &Connection, id: &NodeIdentifier) -> Result<DataKind> {
        if let Some(kind) = self.kinds.get(id) {
            return Ok(*kind);
        }
        let stored: Option<String> = conn
            .query_row(
                "SELECT value_kind FROM historized_nodes WHERE node_id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let kind = stored
            .as_deref()
            .and_then(DataKind::from_str)
            .ok_or_else(|| Error::NoData(id.clone()))?;
        self.kinds.insert(id.clone(), kind);
        Ok(kind)
    }

    /// Paginated raw history read
    ///
    /// Ordering is ascending by source time, EXCEPT descending when either
    /// no start but an end and a limit are given, or start is after end.
    /// The exception is intended behavior, not an accident: it lets a
    /// client fetch "the last N values" with only an end time and a limit.
    ///
    /// When a page comes back full, a count query over the same filter
    /// decides whether a continuation token (the last returned sequence
    /// index) is issued. Tokens carry no server-side state; a `release`
    /// request is answered with an empty page unconditionally.
    ///
    /// # Errors
    ///
    /// [`Error::BackendUnavailable`] when storage is unreachable,
    /// [`Error::NoData`] for a node that was never historized
    pub fn read_raw(&self, request: &RawReadRequest) -> Result<RawReadResponse> {
        if request.release {
            // no cursor state exists, so there is nothing to release
            return Ok(RawReadResponse {
                values: Vec::new(),
                continuation: None,
            });
        }

        let conn = self.conn()?;
        let kind = self.value_kind(&conn, &request.node)?;
        let table = store::record_table(&request.node);

        let descending = match (request.start, request.end) {
            (None, Some(_)) => request.limit > 0,
            (Some(start), Some(end)) => start > end,
            _ => false,
        };

        // a reversed range still filters on the same interval
        let (lower, upper) = match (request.start, request.end) {
            (Some(start), Some(end)) if start > end => (Some(end), Some(start)),
            bounds => bounds,
        };
        let (lower_op, upper_op) = if request.include_bounds {
            (">=", "<=")
        } else {
            (">", "<")
        };

        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(ts) = lower {
            args.push(Value::Text(store::format_ts(ts)));
            clauses.push(format!("source_ts {lower_op} ?{}", args.len()));
        }
        if let Some(ts) = upper {
            args.push(Value::Text(store::format_ts(ts)));
            clauses.push(format!("source_ts {upper_op} ?{}", args.len()));
        }
        if let Some(token) = request.continuation {
            args.push(Value::Integer(token.last_sequence()));
            // direction-aware so every page resumes past the last delivered row
            let op = if descending { "<" } else { ">" };
            clauses.push(format!("seq {op} ?{}", args.len()));
        }
        let filter = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let order = if descending { "DESC" } else { "ASC" };
        let mut sql = format!(
            "SELECT seq, value, source_ts, server_ts FROM {table}{filter}
             ORDER BY source_ts {order}, seq {order}"
        );
        if request.limit > 0 {
            sql.push_str(&format!(" LIMIT {}", request.limit));
        }
        debug!(node = %request.node, descending, limit = request.limit, "raw history read");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Value>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut values = Vec::new();
        for row in rows {
            let (sequence, raw, source, server) = row?;
            values.push(HistoryValue {
                sequence,
                value: store::decode_value(kind, ValueRef::from(&raw))?,
                source_time: source.as_deref().map(store::parse_ts).transpose()?,
                server_time: server.as_deref().map(store::parse_ts).transpose()?,
            });
        }

        let mut continuation = None;
        if request.limit > 0 && values.len() == request.limit as usize {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {table}{filter}"),
                params_from_iter(args.iter()),
                |row| row.get(0),
            )?;
            if total > i64::from(request.limit) {
                continuation = values.last().map(|v| ContinuationToken::new(v.sequence));
            }
        }

        Ok(RawReadResponse {
            values,
            continuation,
        })
    }

    /// Historical read at explicit timestamps
    ///
    /// Each requested timestamp is answered independently: an exact stored
    /// match comes back with Raw quality, a bracketed timestamp of a
    /// numeric node comes back linearly interpolated, and a timestamp that
    /// cannot be answered fails alone without affecting the rest of the
    /// batch.
    ///
    /// # Errors
    ///
    /// [`Error::BackendUnavailable`] when storage is unreachable,
    /// [`Error::NoData`] for a node that was never historized; per-entry
    /// failures are returned inside the vector
    pub fn read_at_time(
        &self,
        id: &NodeIdentifier,
        timestamps: &[DateTime<Utc>],
    ) -> Result<Vec<Result<AtTimeValue>>> {
        let conn = self.conn()?;
        let kind = self.value_kind(&conn, id)?;
        let table = store::record_table(id);

        Ok(timestamps
            .iter()
            .map(|&target| read_one_at(&conn, &table, kind, target))
            .collect())
    }
}

fn read_one_at(
    conn: &Connection,
    table: &str,
    kind: DataKind,
    target: DateTime<Utc>,
) -> Result<AtTimeValue> {
    let key = store::format_ts(target);

    let mut stmt = conn.prepare(&format!(
        "SELECT value FROM {table} WHERE source_ts = ?1 ORDER BY seq ASC"
    ))?;
    let matches: Vec<Value> = stmt
        .query_map([key.as_str()], |row| row.get::<_, Value>(0))?
        .collect::<rusqlite::Result<_>>()?;

    if let Some(first) = matches.first() {
        let mut quality = QualityBits::new(DataLocation::Raw);
        if matches.len() > 1 {
            warn!(timestamp = %key, "multiple records at requested timestamp");
            quality = quality.with_multiple_values();
        }
        return Ok(AtTimeValue {
            timestamp: target,
            value: store::decode_value(kind, ValueRef::from(first))?,
            quality,
        });
    }

    let before = nearest(conn, table, kind, &key, "<", "DESC")?;
    let after = nearest(conn, table, kind, &key, ">", "ASC")?;
    let (Some(before), Some(after)) = (before, after) else {
        return Err(Error::NoBound(target));
    };
    if !kind.is_numeric() {
        return Err(Error::NotInterpolatable(format!(
            "cannot interpolate {kind} values"
        )));
    }

    Ok(AtTimeValue {
        timestamp: target,
        value: interpolate(&before, &after, target)?,
        quality: QualityBits::new(DataLocation::Interpolated),
    })
}

type Neighbor = (DataVariant, DateTime<Utc>);

fn nearest(
    conn: &Connection,
    table: &str,
    kind: DataKind,
    key: &str,
    op: &str,
    direction: &str,
) -> Result<Option<Neighbor>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT value, source_ts FROM {table}
                 WHERE source_ts {op} ?1 ORDER BY source_ts {direction} LIMIT 1"
            ),
            [key],
            |row| Ok((row.get::<_, Value>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    match row {
        None => Ok(None),
        Some((raw, ts)) => Ok(Some((
            store::decode_value(kind, ValueRef::from(&raw))?,
            store::parse_ts(&ts)?,
        ))),
    }
}

/// Linear interpolation between two stored neighbors on the value's
/// native width:
/// `before + (after − before) × (target − t_before) / (t_after − t_before)`
fn interpolate(before: &Neighbor, after: &Neighbor, target: DateTime<Utc>) -> Result<DataVariant> {
    let overflow = || Error::NotInterpolatable("bracket interval overflows".into());
    let denominator = (after.1 - before.1).num_microseconds().ok_or_else(overflow)?;
    let weight = (target - before.1).num_microseconds().ok_or_else(overflow)?;

    let diff = variant::sub(&after.0, &before.0)?;
    let scaled = variant::mul_scalar(&diff, weight)?;
    let quotient = variant::div_scalar(&scaled, denominator)?;
    variant::add(&before.0, &quotient)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::space::memory::InMemorySpace;
    use crate::space::{ReferenceKind, TypeDescriptor, VariableNode, WireValue};

    fn ts(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    fn setup(kind: DataKind) -> (InMemorySpace, Historizer, NodeIdentifier) {
        let space = InMemorySpace::new();
        let id = NodeIdentifier::text(2, "metric");
        space
            .add_variable_node(VariableNode {
                id: id.clone(),
                parent: space.objects_root(),
                reference: ReferenceKind::HasComponent,
                name: "metric".into(),
                description: String::new(),
                value_type: TypeDescriptor::from_kind(kind),
                initial: WireValue::from(DataVariant::placeholder(kind)),
                readable: true,
                writable: false,
                historizing: true,
            })
            .unwrap();
        let historizer = Historizer::in_memory().unwrap();
        historizer.register_node(&space, &id, kind).unwrap();
        (space, historizer, id)
    }

    fn record(historizer: &Historizer, id: &NodeIdentifier, seconds: i64, value: i64) {
        historizer.data_changed(
            id,
            true,
            &DataVariant::Integer(value),
            Some(ts(seconds)),
            Some(ts(seconds)),
        );
    }

    #[test]
    fn register_is_idempotent_and_arms_monitoring() {
        let (space, historizer, id) = setup(DataKind::Integer);
        historizer
            .register_node(&space, &id, DataKind::Integer)
            .unwrap();
        assert!(space.monitor(&id).is_some());
    }

    #[test]
    fn register_rejects_kind_change() {
        let (space, historizer, id) = setup(DataKind::Integer);
        let result = historizer.register_node(&space, &id, DataKind::Double);
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn disabled_historizing_drops_the_value() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        historizer.data_changed(&id, false, &DataVariant::Integer(1), Some(ts(1)), None);
        let response = historizer.read_raw(&RawReadRequest::all(id)).unwrap();
        assert!(response.values.is_empty());
    }

    #[test]
    fn unhistorized_node_has_no_data() {
        let (_space, historizer, _id) = setup(DataKind::Integer);
        let unknown = NodeIdentifier::text(2, "unknown");
        assert!(matches!(
            historizer.read_raw(&RawReadRequest::all(unknown)),
            Err(Error::NoData(_))
        ));
    }

    #[test]
    fn ascending_full_read_is_sequenced() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        for i in 0..5 {
            record(&historizer, &id, 10 + i, i * 100);
        }
        let response = historizer.read_raw(&RawReadRequest::all(id)).unwrap();
        assert_eq!(response.values.len(), 5);
        assert!(response.continuation.is_none());
        let times: Vec<_> = response
            .values
            .iter()
            .map(|v| v.source_time.unwrap())
            .collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn end_plus_limit_reads_newest_first() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        for i in 0..5 {
            record(&historizer, &id, 10 + i, i);
        }
        let response = historizer
            .read_raw(&RawReadRequest {
                start: None,
                end: Some(ts(100)),
                limit: 3,
                ..RawReadRequest::all(id)
            })
            .unwrap();
        let values: Vec<_> = response.values.iter().map(|v| v.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                DataVariant::Integer(4),
                DataVariant::Integer(3),
                DataVariant::Integer(2)
            ]
        );
    }

    #[test]
    fn reversed_range_reads_descending() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        for i in 0..4 {
            record(&historizer, &id, 10 + i, i);
        }
        let response = historizer
            .read_raw(&RawReadRequest {
                start: Some(ts(100)),
                end: Some(ts(0)),
                ..RawReadRequest::all(id)
            })
            .unwrap();
        let values: Vec<_> = response.values.iter().map(|v| v.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                DataVariant::Integer(3),
                DataVariant::Integer(2),
                DataVariant::Integer(1),
                DataVariant::Integer(0)
            ]
        );
    }

    #[test]
    fn bounds_inclusive_vs_exclusive() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        for i in 0..3 {
            record(&historizer, &id, 10 + i, i);
        }
        let base = RawReadRequest {
            start: Some(ts(10)),
            end: Some(ts(12)),
            ..RawReadRequest::all(id)
        };

        let inclusive = historizer.read_raw(&base).unwrap();
        assert_eq!(inclusive.values.len(), 3);

        let exclusive = historizer
            .read_raw(&RawReadRequest {
                include_bounds: false,
                ..base
            })
            .unwrap();
        assert_eq!(exclusive.values.len(), 1);
        assert_eq!(exclusive.values[0].value, DataVariant::Integer(1));
    }

    #[test]
    fn pagination_returns_every_record_exactly_once() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        let total = 10u32;
        for i in 0..i64::from(total) {
            record(&historizer, &id, 10 + i, i);
        }

        let limit = 3u32;
        let mut seen = Vec::new();
        let mut continuation = None;
        let mut pages = 0;
        loop {
            let response = historizer
                .read_raw(&RawReadRequest {
                    limit,
                    continuation,
                    ..RawReadRequest::all(id.clone())
                })
                .unwrap();
            pages += 1;
            seen.extend(response.values.iter().map(|v| v.sequence));
            match response.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        assert_eq!(pages, total.div_ceil(limit));
        assert_eq!(seen.len(), total as usize);
        let mut deduped = seen.clone();
        deduped.dedup();
        assert_eq!(deduped, seen);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn descending_pagination_is_also_exactly_once() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        for i in 0..7 {
            record(&historizer, &id, 10 + i, i);
        }

        let mut seen = Vec::new();
        let mut continuation = None;
        loop {
            let response = historizer
                .read_raw(&RawReadRequest {
                    end: Some(ts(100)),
                    limit: 3,
                    continuation,
                    ..RawReadRequest::all(id.clone())
                })
                .unwrap();
            seen.extend(response.values.iter().map(|v| v.sequence));
            match response.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }
        assert_eq!(seen.len(), 7);
        assert!(seen.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn exact_page_boundary_issues_no_dangling_token() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        for i in 0..6 {
            record(&historizer, &id, 10 + i, i);
        }
        let first = historizer
            .read_raw(&RawReadRequest {
                limit: 3,
                ..RawReadRequest::all(id.clone())
            })
            .unwrap();
        let second = historizer
            .read_raw(&RawReadRequest {
                limit: 3,
                continuation: first.continuation,
                ..RawReadRequest::all(id)
            })
            .unwrap();
        assert_eq!(second.values.len(), 3);
        assert!(second.continuation.is_none());
    }

    #[test]
    fn release_is_trivially_satisfied() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        record(&historizer, &id, 10, 1);
        let response = historizer
            .read_raw(&RawReadRequest {
                release: true,
                continuation: Some(ContinuationToken::new(1)),
                ..RawReadRequest::all(id)
            })
            .unwrap();
        assert!(response.values.is_empty());
        assert!(response.continuation.is_none());
    }

    #[test]
    fn at_time_exact_match_is_raw() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        record(&historizer, &id, 10, 100);
        record(&historizer, &id, 20, 200);

        let results = historizer.read_at_time(&id, &[ts(10), ts(20)]).unwrap();
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.value, DataVariant::Integer(100));
        assert_eq!(first.quality.location(), DataLocation::Raw);
        assert!(!first.quality.has_multiple_values());
        let second = results[1].as_ref().unwrap();
        assert_eq!(second.value, DataVariant::Integer(200));
    }

    #[test]
    fn at_time_between_records_interpolates() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        record(&historizer, &id, 10, 0);
        record(&historizer, &id, 20, 100);

        let results = historizer.read_at_time(&id, &[ts(15)]).unwrap();
        let value = results[0].as_ref().unwrap();
        assert_eq!(value.value, DataVariant::Integer(50));
        assert_eq!(value.quality.location(), DataLocation::Interpolated);

        let quarter = historizer.read_at_time(&id, &[ts(12)]).unwrap();
        assert_eq!(
            quarter[0].as_ref().unwrap().value,
            DataVariant::Integer(20)
        );
    }

    #[test]
    fn at_time_interpolates_doubles() {
        let (space, historizer, _) = setup(DataKind::Integer);
        let id = NodeIdentifier::text(2, "pressure");
        space
            .add_variable_node(VariableNode {
                id: id.clone(),
                parent: space.objects_root(),
                reference: ReferenceKind::HasComponent,
                name: "pressure".into(),
                description: String::new(),
                value_type: TypeDescriptor::Double,
                initial: WireValue::Double(0.0),
                readable: true,
                writable: false,
                historizing: true,
            })
            .unwrap();
        historizer
            .register_node(&space, &id, DataKind::Double)
            .unwrap();
        historizer.data_changed(&id, true, &DataVariant::Double(1.0), Some(ts(0)), None);
        historizer.data_changed(&id, true, &DataVariant::Double(2.0), Some(ts(10)), None);

        let results = historizer.read_at_time(&id, &[ts(5)]).unwrap();
        assert_eq!(results[0].as_ref().unwrap().value, DataVariant::Double(1.5));
    }

    #[test]
    fn at_time_missing_bracket_fails_that_timestamp_alone() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        record(&historizer, &id, 10, 0);
        record(&historizer, &id, 20, 100);

        let results = historizer
            .read_at_time(&id, &[ts(5), ts(15), ts(25)])
            .unwrap();
        assert!(matches!(results[0], Err(Error::NoBound(_))));
        assert_eq!(
            results[1].as_ref().unwrap().value,
            DataVariant::Integer(50)
        );
        assert!(matches!(results[2], Err(Error::NoBound(_))));
    }

    #[test]
    fn at_time_non_numeric_bracket_is_not_interpolatable() {
        let (space, historizer, _) = setup(DataKind::Integer);
        let id = NodeIdentifier::text(2, "status");
        space
            .add_variable_node(VariableNode {
                id: id.clone(),
                parent: space.objects_root(),
                reference: ReferenceKind::HasComponent,
                name: "status".into(),
                description: String::new(),
                value_type: TypeDescriptor::String,
                initial: WireValue::String(String::new()),
                readable: true,
                writable: false,
                historizing: true,
            })
            .unwrap();
        historizer
            .register_node(&space, &id, DataKind::Text)
            .unwrap();
        historizer.data_changed(&id, true, &DataVariant::Text("off".into()), Some(ts(0)), None);
        historizer.data_changed(&id, true, &DataVariant::Text("on".into()), Some(ts(10)), None);

        let results = historizer.read_at_time(&id, &[ts(5)]).unwrap();
        assert!(matches!(results[0], Err(Error::NotInterpolatable(_))));

        // exact matches still resolve for non-numeric kinds
        let exact = historizer.read_at_time(&id, &[ts(10)]).unwrap();
        assert_eq!(
            exact[0].as_ref().unwrap().value,
            DataVariant::Text("on".into())
        );
    }

    #[test]
    fn at_time_duplicate_timestamps_flag_multiple_values() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        record(&historizer, &id, 10, 1);
        record(&historizer, &id, 10, 2);

        let results = historizer.read_at_time(&id, &[ts(10)]).unwrap();
        let value = results[0].as_ref().unwrap();
        assert_eq!(value.value, DataVariant::Integer(1));
        assert!(value.quality.has_multiple_values());
        assert_eq!(value.quality.location(), DataLocation::Raw);
    }

    #[test]
    fn kind_mismatched_sample_is_swallowed() {
        let (_space, historizer, id) = setup(DataKind::Integer);
        historizer.data_changed(&id, true, &DataVariant::Text("bad".into()), Some(ts(1)), None);
        let response = historizer.read_raw(&RawReadRequest::all(id)).unwrap();
        assert!(response.values.is_empty());
    }
}
