//! Streaming event-log reader with IO-level row-group pruning.
//!
//! On open the reader builds an index of per-row-group min/max statistics
//! for `ts_event_ns` and `seq`. Row groups that provably cannot match the
//! active filters are skipped without being read; rows from surviving
//! groups pass through a row-level filter residual, so correctness never
//! depends on the statistics being present.

use crate::error::EventLogError;
use crate::metadata::FileMeta;
use crate::schema::ColumnIndexes;
use arrow::array::{
    DictionaryArray, Float64Array, Int64Array, Int8Array, StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{Int32Type, SchemaRef};
use arrow::record_batch::RecordBatch;
use nx_types::{
    Aggressor, Bar, DepthOp, DepthUpdate, Event, EventHeader, EventType, Heartbeat, OrderEvent,
    OrderState, Side, Trade,
};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::file::metadata::ParquetMetaData;
use parquet::file::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Min/max bounds for one row group, when its statistics are usable.
/// `None` means "may match"; absent statistics never cause a skip.
#[derive(Debug, Clone, Copy)]
struct GroupStats {
    ts: Option<(i64, i64)>,
    seq: Option<(u64, u64)>,
}

/// Reader for deterministic replay of one event-log file.
pub struct EventLogReader {
    path: PathBuf,
    metadata: Arc<ParquetMetaData>,
    file_meta: FileMeta,
    cols: ColumnIndexes,
    group_stats: Vec<GroupStats>,
    time_filter: Option<(i64, i64)>,
    seq_filter: Option<(u64, u64)>,
    next_group: usize,
    group_reader: Option<ParquetRecordBatchReader>,
    batch: Option<RecordBatch>,
    row: usize,
    groups_touched: i32,
}

impl EventLogReader {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, EventLogError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema: SchemaRef = builder.schema().clone();
        let metadata = builder.metadata().clone();

        let cols = ColumnIndexes::from_schema(schema.as_ref())?;
        let group_stats = collect_group_stats(&metadata);
        let file_meta = parse_file_meta(&path, &metadata);

        Ok(Self {
            path,
            metadata,
            file_meta,
            cols,
            group_stats,
            time_filter: None,
            seq_filter: None,
            next_group: 0,
            group_reader: None,
            batch: None,
            row: 0,
            groups_touched: 0,
        })
    }

    /// Next event passing all active filters, or `Ok(None)` at end of file.
    pub fn next(&mut self) -> Result<Option<Event>, EventLogError> {
        loop {
            let need_batch = match &self.batch {
                Some(batch) => self.row >= batch.num_rows(),
                None => true,
            };
            if need_batch && !self.advance_batch()? {
                return Ok(None);
            }

            let decoded = {
                let Some(batch) = &self.batch else {
                    return Ok(None);
                };
                let row = self.row;
                let ts = i64_at(batch, self.cols.ts_event_ns, row)?;
                let seq = u64_at(batch, self.cols.seq, row)?;
                let pass = self
                    .time_filter
                    .map_or(true, |(start, end)| ts >= start && ts <= end)
                    && self.seq_filter.map_or(true, |(lo, hi)| seq >= lo && seq <= hi);
                if pass {
                    Some(decode_row(batch, &self.cols, row)?)
                } else {
                    None
                }
            };

            self.row += 1;
            if let Some(event) = decoded {
                return Ok(Some(event));
            }
        }
    }

    /// Restart scanning from the first row group. Filters are preserved;
    /// the touched-group counter starts over.
    pub fn reset(&mut self) {
        self.group_reader = None;
        self.batch = None;
        self.row = 0;
        self.next_group = 0;
        self.groups_touched = 0;
    }

    /// Total rows in the file, from the footer.
    pub fn event_count(&self) -> u64 {
        self.metadata.file_metadata().num_rows() as u64
    }

    /// Only events with `ts_event_ns` in `[start_ns, end_ns]` are returned.
    pub fn set_time_range(&mut self, start_ns: i64, end_ns: i64) {
        self.time_filter = Some((start_ns, end_ns));
    }

    /// Only events with `seq` in `[min_seq, max_seq]` are returned.
    pub fn set_seq_range(&mut self, min_seq: u64, max_seq: u64) {
        self.seq_filter = Some((min_seq, max_seq));
    }

    pub fn clear_filters(&mut self) {
        self.time_filter = None;
        self.seq_filter = None;
    }

    /// Number of row groups in the file.
    pub fn row_group_count(&self) -> i32 {
        self.metadata.num_row_groups() as i32
    }

    /// Row groups actually opened since the last `reset()`. Compare with
    /// `row_group_count` to verify pruning effectiveness.
    pub fn row_groups_touched(&self) -> i32 {
        self.groups_touched
    }

    /// Provenance metadata parsed from the footer.
    pub fn get_metadata(&self) -> FileMeta {
        self.file_meta.clone()
    }

    fn advance_batch(&mut self) -> Result<bool, EventLogError> {
        loop {
            if let Some(reader) = self.group_reader.as_mut() {
                match reader.next() {
                    Some(batch) => {
                        self.batch = Some(batch?);
                        self.row = 0;
                        return Ok(true);
                    }
                    None => self.group_reader = None,
                }
            }
            if !self.open_next_group()? {
                self.batch = None;
                return Ok(false);
            }
        }
    }

    fn open_next_group(&mut self) -> Result<bool, EventLogError> {
        while self.next_group < self.group_stats.len() {
            let group = self.next_group;
            self.next_group += 1;
            if !self.group_may_match(group) {
                continue;
            }
            let file = File::open(&self.path)?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
                .with_row_groups(vec![group])
                .build()?;
            self.group_reader = Some(reader);
            self.groups_touched += 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn group_may_match(&self, group: usize) -> bool {
        let stats = &self.group_stats[group];
        if let (Some((start, end)), Some((min, max))) = (self.time_filter, stats.ts) {
            if max < start || min > end {
                return false;
            }
        }
        if let (Some((lo, hi)), Some((min, max))) = (self.seq_filter, stats.seq) {
            if max < lo || min > hi {
                return false;
            }
        }
        true
    }
}

fn parse_file_meta(path: &Path, metadata: &ParquetMetaData) -> FileMeta {
    let Some(kvs) = metadata.file_metadata().key_value_metadata() else {
        warn!("file {} has no footer metadata (old format?)", path.display());
        return FileMeta::default();
    };

    let map: BTreeMap<String, String> = kvs
        .iter()
        .filter_map(|kv| kv.value.clone().map(|v| (kv.key.clone(), v)))
        .collect();
    let file_meta = FileMeta::from_map(&map);

    if !file_meta.write_complete {
        warn!(
            "file {} may be incomplete (write_complete=false); \
             the writer may have crashed before closing",
            path.display()
        );
    }
    file_meta
}

fn collect_group_stats(metadata: &ParquetMetaData) -> Vec<GroupStats> {
    (0..metadata.num_row_groups())
        .map(|g| {
            let row_group = metadata.row_group(g);
            let mut stats = GroupStats { ts: None, seq: None };
            for col in row_group.columns() {
                match col.column_path().string().as_str() {
                    "ts_event_ns" => stats.ts = stat_range_i64(col.statistics()),
                    "seq" => stats.seq = stat_range_u64(col.statistics()),
                    _ => {}
                }
            }
            stats
        })
        .collect()
}

// Statistics arrive as raw encoded bytes; they are usable only when the
// length matches the fixed 8-byte plain encoding of the column type.
fn stat_range_i64(stats: Option<&Statistics>) -> Option<(i64, i64)> {
    let stats = stats?;
    Some((fixed_i64(stats.min_bytes_opt()?)?, fixed_i64(stats.max_bytes_opt()?)?))
}

fn stat_range_u64(stats: Option<&Statistics>) -> Option<(u64, u64)> {
    let stats = stats?;
    Some((fixed_u64(stats.min_bytes_opt()?)?, fixed_u64(stats.max_bytes_opt()?)?))
}

fn fixed_i64(bytes: &[u8]) -> Option<i64> {
    let bytes: [u8; 8] = bytes.try_into().ok()?;
    Some(i64::from_le_bytes(bytes))
}

fn fixed_u64(bytes: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

fn column_as<'a, T: 'static>(
    batch: &'a RecordBatch,
    idx: usize,
) -> Result<&'a T, EventLogError> {
    batch.column(idx).as_any().downcast_ref::<T>().ok_or_else(|| {
        EventLogError::Decode(format!(
            "column {} has unexpected type {}",
            batch.schema_ref().field(idx).name(),
            batch.column(idx).data_type()
        ))
    })
}

fn i64_at(batch: &RecordBatch, idx: usize, row: usize) -> Result<i64, EventLogError> {
    Ok(column_as::<Int64Array>(batch, idx)?.value(row))
}

fn u64_at(batch: &RecordBatch, idx: usize, row: usize) -> Result<u64, EventLogError> {
    Ok(column_as::<UInt64Array>(batch, idx)?.value(row))
}

fn u32_at(batch: &RecordBatch, idx: usize, row: usize) -> Result<u32, EventLogError> {
    Ok(column_as::<UInt32Array>(batch, idx)?.value(row))
}

fn i8_at(batch: &RecordBatch, idx: usize, row: usize) -> Result<i8, EventLogError> {
    Ok(column_as::<Int8Array>(batch, idx)?.value(row))
}

fn f64_at(batch: &RecordBatch, idx: usize, row: usize) -> Result<f64, EventLogError> {
    Ok(column_as::<Float64Array>(batch, idx)?.value(row))
}

// Text columns may arrive dictionary-encoded or plain depending on the
// field; detect at runtime and resolve through the dictionary when needed.
fn string_at(batch: &RecordBatch, idx: usize, row: usize) -> Result<String, EventLogError> {
    let column = batch.column(idx);
    if let Some(dict) = column.as_any().downcast_ref::<DictionaryArray<Int32Type>>() {
        let values = dict
            .values()
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                EventLogError::Decode(format!(
                    "dictionary column {} does not hold utf8 values",
                    batch.schema_ref().field(idx).name()
                ))
            })?;
        let key = dict.keys().value(row) as usize;
        Ok(values.value(key).to_string())
    } else {
        Ok(column_as::<StringArray>(batch, idx)?.value(row).to_string())
    }
}

fn enum_at<T>(
    batch: &RecordBatch,
    idx: usize,
    row: usize,
    from_i8: fn(i8) -> Option<T>,
) -> Result<T, EventLogError> {
    let code = i8_at(batch, idx, row)?;
    from_i8(code).ok_or_else(|| {
        EventLogError::Decode(format!(
            "invalid code {code} in column {}",
            batch.schema_ref().field(idx).name()
        ))
    })
}

/// Reconstruct one event from a batch row: read the header columns, then
/// dispatch on `event_type` and read only that variant's columns.
fn decode_row(
    batch: &RecordBatch,
    cols: &ColumnIndexes,
    row: usize,
) -> Result<Event, EventLogError> {
    let header = EventHeader {
        ts_event_ns: i64_at(batch, cols.ts_event_ns, row)?,
        ts_receive_ns: i64_at(batch, cols.ts_receive_ns, row)?,
        ts_monotonic_ns: i64_at(batch, cols.ts_monotonic_ns, row)?,
        venue: string_at(batch, cols.venue, row)?,
        symbol: string_at(batch, cols.symbol, row)?,
        source: string_at(batch, cols.source, row)?,
        seq: u64_at(batch, cols.seq, row)?,
    };

    let code = i8_at(batch, cols.event_type, row)?;
    let event_type = EventType::from_i8(code)
        .ok_or_else(|| EventLogError::Decode(format!("unknown event_type code {code}")))?;

    match event_type {
        EventType::DepthUpdate => Ok(Event::DepthUpdate(DepthUpdate {
            header,
            side: enum_at(batch, cols.side, row, Side::from_i8)?,
            price: f64_at(batch, cols.price, row)?,
            size: f64_at(batch, cols.size, row)?,
            level: u32_at(batch, cols.level, row)?,
            op: enum_at(batch, cols.op, row, DepthOp::from_i8)?,
        })),
        EventType::Trade => Ok(Event::Trade(Trade {
            header,
            price: f64_at(batch, cols.price, row)?,
            size: f64_at(batch, cols.size, row)?,
            aggressor: enum_at(batch, cols.aggressor, row, Aggressor::from_i8)?,
        })),
        EventType::OrderEvent => Ok(Event::OrderEvent(OrderEvent {
            header,
            order_id: string_at(batch, cols.order_id, row)?,
            state: enum_at(batch, cols.state, row, OrderState::from_i8)?,
            price: f64_at(batch, cols.price, row)?,
            size: f64_at(batch, cols.size, row)?,
            filled: f64_at(batch, cols.filled, row)?,
            reason: string_at(batch, cols.reason, row)?,
        })),
        EventType::Bar => Ok(Event::Bar(Bar {
            header,
            ts_open_ns: i64_at(batch, cols.ts_open_ns, row)?,
            ts_close_ns: i64_at(batch, cols.ts_close_ns, row)?,
            open: f64_at(batch, cols.open, row)?,
            high: f64_at(batch, cols.high, row)?,
            low: f64_at(batch, cols.low, row)?,
            close: f64_at(batch, cols.close, row)?,
            volume: f64_at(batch, cols.volume, row)?,
        })),
        EventType::Heartbeat => Ok(Event::Heartbeat(Heartbeat { header })),
    }
}
