use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Discriminant stored in the `event_type` column.
///
/// The on-disk code is the authoritative tag for a row; the nullable
/// variant columns of that row must match it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[repr(i8)]
pub enum EventType {
    DepthUpdate = 1,
    Trade = 2,
    OrderEvent = 3,
    Bar = 4,
    Heartbeat = 5,
}

impl EventType {
    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            1 => Some(EventType::DepthUpdate),
            2 => Some(EventType::Trade),
            3 => Some(EventType::OrderEvent),
            4 => Some(EventType::Bar),
            5 => Some(EventType::Heartbeat),
            _ => None,
        }
    }
}

/// Book side of a depth update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[repr(i8)]
pub enum Side {
    Bid = 0,
    Ask = 1,
}

impl Side {
    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            0 => Some(Side::Bid),
            1 => Some(Side::Ask),
            _ => None,
        }
    }
}

/// Operation applied to a book level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[repr(i8)]
pub enum DepthOp {
    Add = 0,
    Update = 1,
    Delete = 2,
}

impl DepthOp {
    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            0 => Some(DepthOp::Add),
            1 => Some(DepthOp::Update),
            2 => Some(DepthOp::Delete),
            _ => None,
        }
    }
}

/// Aggressing side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[repr(i8)]
pub enum Aggressor {
    Buy = 0,
    Sell = 1,
    Unknown = 2,
}

impl Aggressor {
    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            0 => Some(Aggressor::Buy),
            1 => Some(Aggressor::Sell),
            2 => Some(Aggressor::Unknown),
            _ => None,
        }
    }
}

/// Lifecycle state reported by an order event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[repr(i8)]
pub enum OrderState {
    New = 0,
    Ack = 1,
    Replaced = 2,
    Canceled = 3,
    Filled = 4,
    Rejected = 5,
}

impl OrderState {
    pub fn from_i8(v: i8) -> Option<Self> {
        match v {
            0 => Some(OrderState::New),
            1 => Some(OrderState::Ack),
            2 => Some(OrderState::Replaced),
            3 => Some(OrderState::Canceled),
            4 => Some(OrderState::Filled),
            5 => Some(OrderState::Rejected),
            _ => None,
        }
    }
}

/// Fields common to every event.
///
/// `ts_event_ns` and `ts_receive_ns` are wall-clock nanoseconds since the
/// Unix epoch (source time and local receive time). `ts_monotonic_ns` is a
/// monotonic timestamp used for latency measurement and ordering checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHeader {
    pub ts_event_ns: i64,
    pub ts_receive_ns: i64,
    pub ts_monotonic_ns: i64,
    pub venue: String,
    pub symbol: String,
    pub source: String,
    /// Strictly positive, strictly increasing per (source, symbol).
    pub seq: u64,
}

/// One price-level change in the order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthUpdate {
    pub header: EventHeader,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub level: u32,
    pub op: DepthOp,
}

/// An executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub header: EventHeader,
    pub price: f64,
    pub size: f64,
    pub aggressor: Aggressor,
}

/// A state transition in an order's lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub header: EventHeader,
    pub order_id: String,
    pub state: OrderState,
    pub price: f64,
    pub size: f64,
    pub filled: f64,
    /// Venue-supplied reason text (rejections); may be empty.
    pub reason: String,
}

/// An OHLC bar over `[ts_open_ns, ts_close_ns]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub header: EventHeader,
    pub ts_open_ns: i64,
    pub ts_close_ns: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Feed liveness marker; header only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub header: EventHeader,
}

/// One record in the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    DepthUpdate(DepthUpdate),
    Trade(Trade),
    OrderEvent(OrderEvent),
    Bar(Bar),
    Heartbeat(Heartbeat),
}

impl Event {
    pub fn header(&self) -> &EventHeader {
        match self {
            Event::DepthUpdate(e) => &e.header,
            Event::Trade(e) => &e.header,
            Event::OrderEvent(e) => &e.header,
            Event::Bar(e) => &e.header,
            Event::Heartbeat(e) => &e.header,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Event::DepthUpdate(_) => EventType::DepthUpdate,
            Event::Trade(_) => EventType::Trade,
            Event::OrderEvent(_) => EventType::OrderEvent,
            Event::Bar(_) => EventType::Bar,
            Event::Heartbeat(_) => EventType::Heartbeat,
        }
    }
}

impl From<DepthUpdate> for Event {
    fn from(e: DepthUpdate) -> Self {
        Event::DepthUpdate(e)
    }
}

impl From<Trade> for Event {
    fn from(e: Trade) -> Self {
        Event::Trade(e)
    }
}

impl From<OrderEvent> for Event {
    fn from(e: OrderEvent) -> Self {
        Event::OrderEvent(e)
    }
}

impl From<Bar> for Event {
    fn from(e: Bar) -> Self {
        Event::Bar(e)
    }
}

impl From<Heartbeat> for Event {
    fn from(e: Heartbeat) -> Self {
        Event::Heartbeat(e)
    }
}
