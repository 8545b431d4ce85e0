//! The v1.0 on-disk schema: a single flat layout with nullable
//! variant-specific columns, shared by the writer and the reader.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use std::sync::Arc;

/// Decimal scale for price-like columns (micro precision).
pub const PRICE_SCALE: i8 = 6;
/// Decimal scale for size/volume columns (milli precision).
pub const SIZE_SCALE: i8 = 3;
/// Decimal precision for all decimal128 columns.
pub const DECIMAL_PRECISION: u8 = 18;

fn dict_utf8() -> DataType {
    DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
}

pub(crate) fn price_decimal_type() -> DataType {
    DataType::Decimal128(DECIMAL_PRECISION, PRICE_SCALE)
}

pub(crate) fn size_decimal_type() -> DataType {
    DataType::Decimal128(DECIMAL_PRECISION, SIZE_SCALE)
}

/// Schema v1.0. Column order is the single source of truth; the writer
/// builds record batches in this order and the reader resolves indices
/// from it by name.
pub fn event_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        // Common fields (required)
        Field::new("ts_event_ns", DataType::Int64, false),
        Field::new("ts_receive_ns", DataType::Int64, false),
        Field::new("ts_monotonic_ns", DataType::Int64, false),
        Field::new("event_type", DataType::Int8, false),
        Field::new("venue", dict_utf8(), false),
        Field::new("symbol", dict_utf8(), false),
        Field::new("source", dict_utf8(), false),
        Field::new("seq", DataType::UInt64, false),
        // Depth-update fields (nullable)
        Field::new("side", DataType::Int8, true),
        Field::new("price", DataType::Float64, true),
        Field::new("size", DataType::Float64, true),
        Field::new("level", DataType::UInt32, true),
        Field::new("op", DataType::Int8, true),
        // Exact-arithmetic duals of price/size, written alongside the floats
        Field::new("price_decimal", price_decimal_type(), true),
        Field::new("size_decimal", size_decimal_type(), true),
        // Trade fields (nullable, reuses price/size)
        Field::new("aggressor", DataType::Int8, true),
        // Order-event fields (nullable, reuses price/size)
        Field::new("order_id", DataType::Utf8, true),
        Field::new("state", DataType::Int8, true),
        Field::new("filled", DataType::Float64, true),
        Field::new("filled_decimal", size_decimal_type(), true),
        Field::new("reason", DataType::Utf8, true),
        // Bar fields (nullable)
        Field::new("ts_open_ns", DataType::Int64, true),
        Field::new("ts_close_ns", DataType::Int64, true),
        Field::new("open", DataType::Float64, true),
        Field::new("high", DataType::Float64, true),
        Field::new("low", DataType::Float64, true),
        Field::new("close", DataType::Float64, true),
        Field::new("open_decimal", price_decimal_type(), true),
        Field::new("high_decimal", price_decimal_type(), true),
        Field::new("low_decimal", price_decimal_type(), true),
        Field::new("close_decimal", price_decimal_type(), true),
        Field::new("volume", DataType::Float64, true),
        Field::new("volume_decimal", size_decimal_type(), true),
    ]))
}

/// Indices of the columns the reader decodes, resolved by name so they can
/// never drift from the schema declaration.
#[derive(Debug, Clone)]
pub(crate) struct ColumnIndexes {
    pub ts_event_ns: usize,
    pub ts_receive_ns: usize,
    pub ts_monotonic_ns: usize,
    pub event_type: usize,
    pub venue: usize,
    pub symbol: usize,
    pub source: usize,
    pub seq: usize,
    pub side: usize,
    pub price: usize,
    pub size: usize,
    pub level: usize,
    pub op: usize,
    pub aggressor: usize,
    pub order_id: usize,
    pub state: usize,
    pub filled: usize,
    pub reason: usize,
    pub ts_open_ns: usize,
    pub ts_close_ns: usize,
    pub open: usize,
    pub high: usize,
    pub low: usize,
    pub close: usize,
    pub volume: usize,
}

impl ColumnIndexes {
    pub fn from_schema(schema: &Schema) -> Result<Self, ArrowError> {
        Ok(Self {
            ts_event_ns: schema.index_of("ts_event_ns")?,
            ts_receive_ns: schema.index_of("ts_receive_ns")?,
            ts_monotonic_ns: schema.index_of("ts_monotonic_ns")?,
            event_type: schema.index_of("event_type")?,
            venue: schema.index_of("venue")?,
            symbol: schema.index_of("symbol")?,
            source: schema.index_of("source")?,
            seq: schema.index_of("seq")?,
            side: schema.index_of("side")?,
            price: schema.index_of("price")?,
            size: schema.index_of("size")?,
            level: schema.index_of("level")?,
            op: schema.index_of("op")?,
            aggressor: schema.index_of("aggressor")?,
            order_id: schema.index_of("order_id")?,
            state: schema.index_of("state")?,
            filled: schema.index_of("filled")?,
            reason: schema.index_of("reason")?,
            ts_open_ns: schema.index_of("ts_open_ns")?,
            ts_close_ns: schema.index_of("ts_close_ns")?,
            open: schema.index_of("open")?,
            high: schema.index_of("high")?,
            low: schema.index_of("low")?,
            close: schema.index_of("close")?,
            volume: schema.index_of("volume")?,
        })
    }
}
