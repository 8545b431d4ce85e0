//! Write-time invariant checks.
//!
//! `validate` is a pure predicate over a single event; `validate_ordering`
//! checks the pairwise constraints between consecutive events. Both report
//! the first failure encountered.

use nx_types::clock::{MAX_WALL_NS, MIN_WALL_NS};
use nx_types::{Bar, DepthOp, DepthUpdate, Event, EventHeader, OrderEvent, Trade};
use thiserror::Error;

/// Maximum tolerated amount by which `ts_receive_ns` may precede
/// `ts_event_ns` (bounded clock skew between source and local clocks).
pub const MAX_CLOCK_SKEW_NS: i64 = 60_000_000_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} out of bounds: {value} (must be in [2020, 2050])")]
    WallClockOutOfBounds { field: &'static str, value: i64 },
    #[error("ts_receive_ns ({receive}) is too far before ts_event_ns ({event}), clock skew > 60s")]
    ClockSkew { receive: i64, event: i64 },
    #[error("seq must be > 0")]
    ZeroSeq,
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },
    #[error("level too large: {0} (must be < 1000)")]
    LevelTooLarge(u32),
    #[error("{field} must be finite and positive: {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite and non-negative: {value}")]
    NotNonNegative { field: &'static str, value: f64 },
    #[error("filled ({filled}) cannot exceed size ({size})")]
    Overfilled { filled: f64, size: f64 },
    #[error("ts_close_ns ({close}) must be > ts_open_ns ({open})")]
    EmptyBarInterval { open: i64, close: i64 },
    #[error("high ({high}) must be >= low ({low})")]
    HighBelowLow { high: f64, low: f64 },
    #[error("high ({high}) must be >= open ({open}) and close ({close})")]
    HighNotExtreme { high: f64, open: f64, close: f64 },
    #[error("low ({low}) must be <= open ({open}) and close ({close})")]
    LowNotExtreme { low: f64, open: f64, close: f64 },
    #[error("ts_monotonic_ns not monotonic: {current} < {previous}")]
    MonotonicRegression { current: i64, previous: i64 },
    #[error("seq not strictly increasing for ({src}, {symbol}): {current} <= {previous}")]
    SeqRegression {
        src: String,
        symbol: String,
        current: u64,
        previous: u64,
    },
}

fn finite_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}

fn finite_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotNonNegative { field, value })
    }
}

fn wall_in_bounds(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if (MIN_WALL_NS..=MAX_WALL_NS).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::WallClockOutOfBounds { field, value })
    }
}

/// Validate the common header fields.
pub fn validate_header(header: &EventHeader) -> Result<(), ValidationError> {
    wall_in_bounds("ts_event_ns", header.ts_event_ns)?;
    wall_in_bounds("ts_receive_ns", header.ts_receive_ns)?;

    if header.ts_receive_ns < header.ts_event_ns - MAX_CLOCK_SKEW_NS {
        return Err(ValidationError::ClockSkew {
            receive: header.ts_receive_ns,
            event: header.ts_event_ns,
        });
    }

    if header.seq == 0 {
        return Err(ValidationError::ZeroSeq);
    }

    if header.venue.is_empty() {
        return Err(ValidationError::EmptyField { field: "venue" });
    }
    if header.symbol.is_empty() {
        return Err(ValidationError::EmptyField { field: "symbol" });
    }
    if header.source.is_empty() {
        return Err(ValidationError::EmptyField { field: "source" });
    }

    Ok(())
}

/// Validate one event before writing.
pub fn validate(event: &Event) -> Result<(), ValidationError> {
    validate_header(event.header())?;

    match event {
        Event::DepthUpdate(e) => validate_depth_update(e),
        Event::Trade(e) => validate_trade(e),
        Event::OrderEvent(e) => validate_order_event(e),
        Event::Bar(e) => validate_bar(e),
        Event::Heartbeat(_) => Ok(()),
    }
}

/// Validate the ordering constraints between an event and its predecessor.
pub fn validate_ordering(
    current: &EventHeader,
    previous: &EventHeader,
) -> Result<(), ValidationError> {
    if current.ts_monotonic_ns < previous.ts_monotonic_ns {
        return Err(ValidationError::MonotonicRegression {
            current: current.ts_monotonic_ns,
            previous: previous.ts_monotonic_ns,
        });
    }

    if current.source == previous.source
        && current.symbol == previous.symbol
        && current.seq <= previous.seq
    {
        return Err(ValidationError::SeqRegression {
            src: current.source.clone(),
            symbol: current.symbol.clone(),
            current: current.seq,
            previous: previous.seq,
        });
    }

    Ok(())
}

fn validate_depth_update(event: &DepthUpdate) -> Result<(), ValidationError> {
    if event.level >= 1000 {
        return Err(ValidationError::LevelTooLarge(event.level));
    }

    // Deletes may carry a zero price; everything else must quote one.
    if event.op == DepthOp::Delete {
        finite_non_negative("price", event.price)?;
    } else {
        finite_positive("price", event.price)?;
    }

    finite_non_negative("size", event.size)
}

fn validate_trade(event: &Trade) -> Result<(), ValidationError> {
    finite_positive("trade price", event.price)?;
    finite_positive("trade size", event.size)
}

fn validate_order_event(event: &OrderEvent) -> Result<(), ValidationError> {
    if event.order_id.is_empty() {
        return Err(ValidationError::EmptyField { field: "order_id" });
    }

    finite_non_negative("order price", event.price)?;
    finite_positive("order size", event.size)?;
    finite_non_negative("filled", event.filled)?;

    if event.filled > event.size {
        return Err(ValidationError::Overfilled {
            filled: event.filled,
            size: event.size,
        });
    }

    Ok(())
}

fn validate_bar(event: &Bar) -> Result<(), ValidationError> {
    if event.ts_close_ns <= event.ts_open_ns {
        return Err(ValidationError::EmptyBarInterval {
            open: event.ts_open_ns,
            close: event.ts_close_ns,
        });
    }

    finite_positive("open", event.open)?;
    finite_positive("high", event.high)?;
    finite_positive("low", event.low)?;
    finite_positive("close", event.close)?;

    if event.high < event.low {
        return Err(ValidationError::HighBelowLow {
            high: event.high,
            low: event.low,
        });
    }
    if event.high < event.open || event.high < event.close {
        return Err(ValidationError::HighNotExtreme {
            high: event.high,
            open: event.open,
            close: event.close,
        });
    }
    if event.low > event.open || event.low > event.close {
        return Err(ValidationError::LowNotExtreme {
            low: event.low,
            open: event.open,
            close: event.close,
        });
    }

    finite_non_negative("volume", event.volume)
}
