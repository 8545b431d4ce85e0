//! Columnar event-log writer.
//!
//! Events are validated, buffered into per-column builders, and flushed to
//! a Parquet file in batches. The file is staged at `{path}.partial` and
//! only appears at its canonical path via atomic rename during `close()`,
//! after the footer metadata (with `write_complete = true`) is written.

use crate::error::EventLogError;
use crate::metadata::FileMeta;
use crate::schema::{event_schema, price_decimal_type, size_decimal_type, PRICE_SCALE, SIZE_SCALE};
use crate::validate::{validate, validate_ordering};
use arrow::array::{
    ArrayRef, Decimal128Builder, Float64Builder, Int64Builder, Int8Builder, StringBuilder,
    StringDictionaryBuilder, UInt32Builder, UInt64Builder,
};
use arrow::datatypes::{Int32Type, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use nx_types::{Event, EventHeader};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, warn};

/// Rows buffered in the column builders before a batch is handed to the
/// Parquet layer.
const DEFAULT_BATCH_CAPACITY: usize = 10_000;
/// Target row-group length. Smaller groups prune better, larger groups
/// compress better; 250k rows lands around 50 MB per group.
const DEFAULT_MAX_ROW_GROUP_LEN: usize = 250_000;
/// Data page size, 1 MiB.
const DEFAULT_DATA_PAGE_SIZE: usize = 1024 * 1024;
const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Tunables for the underlying Parquet layer. The defaults are the
/// production settings.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub batch_capacity: usize,
    pub max_row_group_len: usize,
    pub data_page_size: usize,
    pub zstd_level: i32,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            max_row_group_len: DEFAULT_MAX_ROW_GROUP_LEN,
            data_page_size: DEFAULT_DATA_PAGE_SIZE,
            zstd_level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

// Scale multipliers for decimal conversion; indexed by scale.
const POW10: [f64; 10] = [
    1.0,
    10.0,
    100.0,
    1_000.0,
    10_000.0,
    100_000.0,
    1_000_000.0,
    10_000_000.0,
    100_000_000.0,
    1_000_000_000.0,
];

/// Scaled-integer encoding of a float for the decimal128 dual columns.
/// Non-finite inputs encode as decimal zero.
pub(crate) fn to_decimal(value: f64, scale: i8) -> i128 {
    if !value.is_finite() {
        return 0;
    }
    (value * POW10[scale as usize]).round() as i128
}

/// Per-column builders, one batch at a time. Field order mirrors the
/// schema declaration; `finish` emits arrays in that order.
struct ColumnBuilders {
    ts_event_ns: Int64Builder,
    ts_receive_ns: Int64Builder,
    ts_monotonic_ns: Int64Builder,
    event_type: Int8Builder,
    venue: StringDictionaryBuilder<Int32Type>,
    symbol: StringDictionaryBuilder<Int32Type>,
    source: StringDictionaryBuilder<Int32Type>,
    seq: UInt64Builder,
    side: Int8Builder,
    price: Float64Builder,
    size: Float64Builder,
    level: UInt32Builder,
    op: Int8Builder,
    price_decimal: Decimal128Builder,
    size_decimal: Decimal128Builder,
    aggressor: Int8Builder,
    order_id: StringBuilder,
    state: Int8Builder,
    filled: Float64Builder,
    filled_decimal: Decimal128Builder,
    reason: StringBuilder,
    ts_open_ns: Int64Builder,
    ts_close_ns: Int64Builder,
    open: Float64Builder,
    high: Float64Builder,
    low: Float64Builder,
    close: Float64Builder,
    open_decimal: Decimal128Builder,
    high_decimal: Decimal128Builder,
    low_decimal: Decimal128Builder,
    close_decimal: Decimal128Builder,
    volume: Float64Builder,
    volume_decimal: Decimal128Builder,
}

/// Values for the nullable variant columns of one row; everything left as
/// `None` is written as null, which is how the on-disk row encodes its
/// variant beyond the `event_type` tag.
#[derive(Default)]
struct VariantRow<'a> {
    side: Option<i8>,
    price: Option<f64>,
    size: Option<f64>,
    level: Option<u32>,
    op: Option<i8>,
    price_decimal: Option<i128>,
    size_decimal: Option<i128>,
    aggressor: Option<i8>,
    order_id: Option<&'a str>,
    state: Option<i8>,
    filled: Option<f64>,
    filled_decimal: Option<i128>,
    reason: Option<&'a str>,
    ts_open_ns: Option<i64>,
    ts_close_ns: Option<i64>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    open_decimal: Option<i128>,
    high_decimal: Option<i128>,
    low_decimal: Option<i128>,
    close_decimal: Option<i128>,
    volume: Option<f64>,
    volume_decimal: Option<i128>,
}

impl ColumnBuilders {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            ts_event_ns: Int64Builder::with_capacity(capacity),
            ts_receive_ns: Int64Builder::with_capacity(capacity),
            ts_monotonic_ns: Int64Builder::with_capacity(capacity),
            event_type: Int8Builder::with_capacity(capacity),
            venue: StringDictionaryBuilder::new(),
            symbol: StringDictionaryBuilder::new(),
            source: StringDictionaryBuilder::new(),
            seq: UInt64Builder::with_capacity(capacity),
            side: Int8Builder::with_capacity(capacity),
            price: Float64Builder::with_capacity(capacity),
            size: Float64Builder::with_capacity(capacity),
            level: UInt32Builder::with_capacity(capacity),
            op: Int8Builder::with_capacity(capacity),
            price_decimal: Decimal128Builder::with_capacity(capacity)
                .with_data_type(price_decimal_type()),
            size_decimal: Decimal128Builder::with_capacity(capacity)
                .with_data_type(size_decimal_type()),
            aggressor: Int8Builder::with_capacity(capacity),
            order_id: StringBuilder::with_capacity(capacity, capacity * 8),
            state: Int8Builder::with_capacity(capacity),
            filled: Float64Builder::with_capacity(capacity),
            filled_decimal: Decimal128Builder::with_capacity(capacity)
                .with_data_type(size_decimal_type()),
            reason: StringBuilder::with_capacity(capacity, capacity * 8),
            ts_open_ns: Int64Builder::with_capacity(capacity),
            ts_close_ns: Int64Builder::with_capacity(capacity),
            open: Float64Builder::with_capacity(capacity),
            high: Float64Builder::with_capacity(capacity),
            low: Float64Builder::with_capacity(capacity),
            close: Float64Builder::with_capacity(capacity),
            open_decimal: Decimal128Builder::with_capacity(capacity)
                .with_data_type(price_decimal_type()),
            high_decimal: Decimal128Builder::with_capacity(capacity)
                .with_data_type(price_decimal_type()),
            low_decimal: Decimal128Builder::with_capacity(capacity)
                .with_data_type(price_decimal_type()),
            close_decimal: Decimal128Builder::with_capacity(capacity)
                .with_data_type(price_decimal_type()),
            volume: Float64Builder::with_capacity(capacity),
            volume_decimal: Decimal128Builder::with_capacity(capacity)
                .with_data_type(size_decimal_type()),
        }
    }

    fn append_event(&mut self, event: &Event) -> Result<(), ArrowError> {
        let header = event.header();
        self.ts_event_ns.append_value(header.ts_event_ns);
        self.ts_receive_ns.append_value(header.ts_receive_ns);
        self.ts_monotonic_ns.append_value(header.ts_monotonic_ns);
        self.event_type.append_value(event.event_type() as i8);
        self.venue.append(header.venue.as_str())?;
        self.symbol.append(header.symbol.as_str())?;
        self.source.append(header.source.as_str())?;
        self.seq.append_value(header.seq);

        let mut row = VariantRow::default();
        match event {
            Event::DepthUpdate(e) => {
                row.side = Some(e.side as i8);
                row.price = Some(e.price);
                row.size = Some(e.size);
                row.level = Some(e.level);
                row.op = Some(e.op as i8);
                row.price_decimal = Some(to_decimal(e.price, PRICE_SCALE));
                row.size_decimal = Some(to_decimal(e.size, SIZE_SCALE));
            }
            Event::Trade(e) => {
                row.price = Some(e.price);
                row.size = Some(e.size);
                row.price_decimal = Some(to_decimal(e.price, PRICE_SCALE));
                row.size_decimal = Some(to_decimal(e.size, SIZE_SCALE));
                row.aggressor = Some(e.aggressor as i8);
            }
            Event::OrderEvent(e) => {
                row.price = Some(e.price);
                row.size = Some(e.size);
                row.price_decimal = Some(to_decimal(e.price, PRICE_SCALE));
                row.size_decimal = Some(to_decimal(e.size, SIZE_SCALE));
                row.order_id = Some(&e.order_id);
                row.state = Some(e.state as i8);
                row.filled = Some(e.filled);
                row.filled_decimal = Some(to_decimal(e.filled, SIZE_SCALE));
                row.reason = Some(&e.reason);
            }
            Event::Bar(e) => {
                row.ts_open_ns = Some(e.ts_open_ns);
                row.ts_close_ns = Some(e.ts_close_ns);
                row.open = Some(e.open);
                row.high = Some(e.high);
                row.low = Some(e.low);
                row.close = Some(e.close);
                row.open_decimal = Some(to_decimal(e.open, PRICE_SCALE));
                row.high_decimal = Some(to_decimal(e.high, PRICE_SCALE));
                row.low_decimal = Some(to_decimal(e.low, PRICE_SCALE));
                row.close_decimal = Some(to_decimal(e.close, PRICE_SCALE));
                row.volume = Some(e.volume);
                row.volume_decimal = Some(to_decimal(e.volume, SIZE_SCALE));
            }
            Event::Heartbeat(_) => {}
        }

        self.side.append_option(row.side);
        self.price.append_option(row.price);
        self.size.append_option(row.size);
        self.level.append_option(row.level);
        self.op.append_option(row.op);
        self.price_decimal.append_option(row.price_decimal);
        self.size_decimal.append_option(row.size_decimal);
        self.aggressor.append_option(row.aggressor);
        self.order_id.append_option(row.order_id);
        self.state.append_option(row.state);
        self.filled.append_option(row.filled);
        self.filled_decimal.append_option(row.filled_decimal);
        self.reason.append_option(row.reason);
        self.ts_open_ns.append_option(row.ts_open_ns);
        self.ts_close_ns.append_option(row.ts_close_ns);
        self.open.append_option(row.open);
        self.high.append_option(row.high);
        self.low.append_option(row.low);
        self.close.append_option(row.close);
        self.open_decimal.append_option(row.open_decimal);
        self.high_decimal.append_option(row.high_decimal);
        self.low_decimal.append_option(row.low_decimal);
        self.close_decimal.append_option(row.close_decimal);
        self.volume.append_option(row.volume);
        self.volume_decimal.append_option(row.volume_decimal);

        Ok(())
    }

    fn finish(&mut self, schema: &SchemaRef) -> Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(self.ts_event_ns.finish()),
            Arc::new(self.ts_receive_ns.finish()),
            Arc::new(self.ts_monotonic_ns.finish()),
            Arc::new(self.event_type.finish()),
            Arc::new(self.venue.finish()),
            Arc::new(self.symbol.finish()),
            Arc::new(self.source.finish()),
            Arc::new(self.seq.finish()),
            Arc::new(self.side.finish()),
            Arc::new(self.price.finish()),
            Arc::new(self.size.finish()),
            Arc::new(self.level.finish()),
            Arc::new(self.op.finish()),
            Arc::new(self.price_decimal.finish()),
            Arc::new(self.size_decimal.finish()),
            Arc::new(self.aggressor.finish()),
            Arc::new(self.order_id.finish()),
            Arc::new(self.state.finish()),
            Arc::new(self.filled.finish()),
            Arc::new(self.filled_decimal.finish()),
            Arc::new(self.reason.finish()),
            Arc::new(self.ts_open_ns.finish()),
            Arc::new(self.ts_close_ns.finish()),
            Arc::new(self.open.finish()),
            Arc::new(self.high.finish()),
            Arc::new(self.low.finish()),
            Arc::new(self.close.finish()),
            Arc::new(self.open_decimal.finish()),
            Arc::new(self.high_decimal.finish()),
            Arc::new(self.low_decimal.finish()),
            Arc::new(self.close_decimal.finish()),
            Arc::new(self.volume.finish()),
            Arc::new(self.volume_decimal.finish()),
        ];
        RecordBatch::try_new(schema.clone(), arrays)
    }
}

/// Append-only writer for one event-log file.
///
/// Not safe for concurrent appends; one producer per writer.
pub struct EventLogWriter {
    final_path: PathBuf,
    partial_path: PathBuf,
    schema: SchemaRef,
    writer: Option<ArrowWriter<File>>,
    builders: ColumnBuilders,
    pending_rows: usize,
    batch_capacity: usize,
    meta: FileMeta,
    last_header: Option<EventHeader>,
    event_count: u64,
    validation_errors: u64,
    closed: bool,
}

impl EventLogWriter {
    /// Open a writer whose canonical destination is `path`. All bytes go to
    /// `{path}.partial` until a successful `close()` renames it into place.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, EventLogError> {
        Self::with_options(path, WriterOptions::default())
    }

    pub fn with_options(
        path: impl AsRef<Path>,
        options: WriterOptions,
    ) -> Result<Self, EventLogError> {
        let final_path = path.as_ref().to_path_buf();
        let mut partial = final_path.clone().into_os_string();
        partial.push(".partial");
        let partial_path = PathBuf::from(partial);

        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let schema = event_schema();
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(
                ZstdLevel::try_new(options.zstd_level).unwrap_or(ZstdLevel::default()),
            ))
            .set_dictionary_enabled(true)
            .set_max_row_group_size(options.max_row_group_len)
            .set_data_page_size_limit(options.data_page_size)
            .build();

        let file = File::create(&partial_path)?;
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        Ok(Self {
            final_path,
            partial_path,
            schema,
            writer: Some(writer),
            builders: ColumnBuilders::with_capacity(options.batch_capacity),
            pending_rows: 0,
            batch_capacity: options.batch_capacity,
            meta: FileMeta::for_new_session(),
            last_header: None,
            event_count: 0,
            validation_errors: 0,
            closed: false,
        })
    }

    /// Validate and enqueue one event. Returns false when the event is
    /// rejected (validation or ordering) or a write fails; rejects leave
    /// the writer open and usable.
    pub fn append(&mut self, event: &Event) -> bool {
        if self.closed {
            error!("append on closed event log writer");
            return false;
        }

        if let Err(err) = validate(event) {
            warn!("event log validation error: {err}");
            self.validation_errors += 1;
            return false;
        }

        if let Some(previous) = &self.last_header {
            if let Err(err) = validate_ordering(event.header(), previous) {
                warn!("event log ordering error: {err}");
                self.validation_errors += 1;
                return false;
            }
        }

        match self.append_row(event) {
            Ok(()) => true,
            Err(err) => {
                error!("event log write error: {err}");
                false
            }
        }
    }

    fn append_row(&mut self, event: &Event) -> Result<(), EventLogError> {
        self.builders.append_event(event)?;
        self.pending_rows += 1;
        self.event_count += 1;

        let header = event.header();
        if self.event_count == 1 {
            self.meta.ingest_start_ns = header.ts_event_ns;
            self.meta.symbol = header.symbol.clone();
            self.meta.venue = header.venue.clone();
            self.meta.source = header.source.clone();
        }
        self.meta.ingest_end_ns = header.ts_event_ns;
        self.last_header = Some(header.clone());

        if self.pending_rows >= self.batch_capacity {
            self.write_pending()?;
        }
        Ok(())
    }

    fn write_pending(&mut self) -> Result<(), EventLogError> {
        if self.pending_rows == 0 {
            return Ok(());
        }
        let batch = self.builders.finish(&self.schema)?;
        if let Some(writer) = self.writer.as_mut() {
            writer.write(&batch)?;
        }
        self.pending_rows = 0;
        Ok(())
    }

    /// Seal any pending batch as a row group. Keeps the writer open.
    pub fn flush(&mut self) -> Result<(), EventLogError> {
        if self.closed {
            return Ok(());
        }
        self.write_pending()?;
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Finalize the file: seal the pending batch, write footer metadata
    /// with `write_complete = true`, rename the `.partial` file to the
    /// canonical path, and flush the parent directory. Idempotent.
    pub fn close(&mut self) -> Result<(), EventLogError> {
        if self.closed {
            return Ok(());
        }

        self.write_pending()?;
        self.meta.write_complete = true;

        if let Some(mut writer) = self.writer.take() {
            for (key, value) in self.meta.to_map() {
                writer.append_key_value_metadata(KeyValue::new(key, value));
            }
            writer.close()?;
        }

        fs::rename(&self.partial_path, &self.final_path)?;

        // Persist the rename itself; without this the publish can be lost
        // on power failure. Failure here is logged, not raised.
        if let Some(parent) = self.final_path.parent() {
            if !parent.as_os_str().is_empty() {
                match File::open(parent) {
                    Ok(dir) => {
                        if let Err(err) = dir.sync_all() {
                            warn!("fsync of {} failed: {err}", parent.display());
                        }
                    }
                    Err(err) => {
                        warn!("open of {} for fsync failed: {err}", parent.display());
                    }
                }
            }
        }

        self.closed = true;
        Ok(())
    }

    /// Number of successfully appended events.
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Number of events rejected by validation or ordering checks.
    pub fn validation_errors(&self) -> u64 {
        self.validation_errors
    }

    /// Override the session id recorded in the footer. Call before the
    /// first append; a late call is honored but flagged.
    pub fn set_ingest_session_id(&mut self, session_id: &str) {
        if self.event_count > 0 {
            warn!("set_ingest_session_id called after writes; metadata may be incomplete");
        }
        self.meta.ingest_session_id = session_id.to_string();
    }

    /// Record the feed mode ("live" or "delayed") in the footer. Call
    /// before the first append; a late call is honored but flagged.
    pub fn set_feed_mode(&mut self, feed_mode: &str) {
        if self.event_count > 0 {
            warn!("set_feed_mode called after writes; metadata may be incomplete");
        }
        self.meta.feed_mode = feed_mode.to_string();
    }
}

impl Drop for EventLogWriter {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.close() {
                error!("event log close on drop failed: {err}");
            }
        }
    }
}
