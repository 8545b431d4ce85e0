use nx_eventlog::{
    validate, validate_header, validate_ordering, EventLogReader, EventLogWriter, ValidationError,
};
use nx_types::clock;
use nx_types::{
    Aggressor, Bar, DepthOp, DepthUpdate, Event, EventHeader, Heartbeat, OrderEvent, OrderState,
    Side, Trade,
};

const BASE_TS: i64 = 1_700_000_000_000_000_000;

fn header() -> EventHeader {
    EventHeader {
        ts_event_ns: BASE_TS,
        ts_receive_ns: BASE_TS + 1000,
        ts_monotonic_ns: clock::monotonic_ns(),
        venue: "NASDAQ".to_string(),
        symbol: "AAPL".to_string(),
        source: "ibkr".to_string(),
        seq: 1,
    }
}

fn trade() -> Trade {
    Trade {
        header: header(),
        price: 150.0,
        size: 100.0,
        aggressor: Aggressor::Buy,
    }
}

fn depth() -> DepthUpdate {
    DepthUpdate {
        header: header(),
        side: Side::Bid,
        price: 150.0,
        size: 100.0,
        level: 0,
        op: DepthOp::Add,
    }
}

fn order() -> OrderEvent {
    OrderEvent {
        header: header(),
        order_id: "ORDER-1".to_string(),
        state: OrderState::New,
        price: 150.0,
        size: 100.0,
        filled: 0.0,
        reason: String::new(),
    }
}

fn bar() -> Bar {
    Bar {
        header: header(),
        ts_open_ns: BASE_TS - 60_000_000_000,
        ts_close_ns: BASE_TS,
        open: 149.0,
        high: 151.0,
        low: 148.5,
        close: 150.5,
        volume: 1000.0,
    }
}

#[test]
fn valid_events_pass() {
    assert!(validate(&Event::Trade(trade())).is_ok());
    assert!(validate(&Event::DepthUpdate(depth())).is_ok());
    assert!(validate(&Event::OrderEvent(order())).is_ok());
    assert!(validate(&Event::Bar(bar())).is_ok());
    assert!(validate(&Event::Heartbeat(Heartbeat { header: header() })).is_ok());
}

#[test]
fn header_violations_rejected() {
    let mut h = header();
    h.ts_event_ns = 946_684_800_000_000_000; // 2000-01-01, too old
    assert!(matches!(
        validate_header(&h),
        Err(ValidationError::WallClockOutOfBounds { field: "ts_event_ns", .. })
    ));

    let mut h = header();
    h.ts_event_ns = 2_700_000_000_000_000_000; // past 2050
    assert!(validate_header(&h).is_err());

    let mut h = header();
    h.ts_receive_ns = 1_000_000;
    assert!(matches!(
        validate_header(&h),
        Err(ValidationError::WallClockOutOfBounds { field: "ts_receive_ns", .. })
    ));

    // Receive more than 60s before event time
    let mut h = header();
    h.ts_receive_ns = h.ts_event_ns - 61_000_000_000;
    assert!(matches!(validate_header(&h), Err(ValidationError::ClockSkew { .. })));

    // Exactly 60s of skew is still acceptable
    let mut h = header();
    h.ts_receive_ns = h.ts_event_ns - 60_000_000_000;
    assert!(validate_header(&h).is_ok());

    let mut h = header();
    h.seq = 0;
    assert!(matches!(validate_header(&h), Err(ValidationError::ZeroSeq)));

    for field in ["venue", "symbol", "source"] {
        let mut h = header();
        match field {
            "venue" => h.venue.clear(),
            "symbol" => h.symbol.clear(),
            _ => h.source.clear(),
        }
        assert!(matches!(
            validate_header(&h),
            Err(ValidationError::EmptyField { .. })
        ));
    }
}

#[test]
fn depth_violations_rejected() {
    let mut e = depth();
    e.level = 1000;
    assert!(matches!(
        validate(&Event::DepthUpdate(e)),
        Err(ValidationError::LevelTooLarge(1000))
    ));

    let mut e = depth();
    e.price = 0.0;
    assert!(validate(&Event::DepthUpdate(e)).is_err());

    // Deletes may carry a zero price but not a negative one
    let mut e = depth();
    e.op = DepthOp::Delete;
    e.price = 0.0;
    assert!(validate(&Event::DepthUpdate(e)).is_ok());

    let mut e = depth();
    e.op = DepthOp::Delete;
    e.price = -1.0;
    assert!(validate(&Event::DepthUpdate(e)).is_err());

    let mut e = depth();
    e.price = f64::NAN;
    assert!(validate(&Event::DepthUpdate(e)).is_err());

    let mut e = depth();
    e.size = -1.0;
    assert!(validate(&Event::DepthUpdate(e)).is_err());

    // Zero size is a legitimate level removal
    let mut e = depth();
    e.size = 0.0;
    assert!(validate(&Event::DepthUpdate(e)).is_ok());
}

#[test]
fn trade_violations_rejected() {
    let mut e = trade();
    e.price = -10.0;
    assert!(matches!(
        validate(&Event::Trade(e)),
        Err(ValidationError::NotPositive { .. })
    ));

    let mut e = trade();
    e.price = 0.0;
    assert!(validate(&Event::Trade(e)).is_err());

    let mut e = trade();
    e.size = 0.0;
    assert!(validate(&Event::Trade(e)).is_err());

    let mut e = trade();
    e.price = f64::INFINITY;
    assert!(validate(&Event::Trade(e)).is_err());
}

#[test]
fn order_violations_rejected() {
    let mut e = order();
    e.order_id.clear();
    assert!(matches!(
        validate(&Event::OrderEvent(e)),
        Err(ValidationError::EmptyField { field: "order_id" })
    ));

    let mut e = order();
    e.price = -1.0;
    assert!(validate(&Event::OrderEvent(e)).is_err());

    // Zero price is allowed for orders (market orders)
    let mut e = order();
    e.price = 0.0;
    assert!(validate(&Event::OrderEvent(e)).is_ok());

    let mut e = order();
    e.size = 0.0;
    assert!(validate(&Event::OrderEvent(e)).is_err());

    let mut e = order();
    e.filled = -0.5;
    assert!(validate(&Event::OrderEvent(e)).is_err());

    let mut e = order();
    e.filled = e.size + 1.0;
    assert!(matches!(
        validate(&Event::OrderEvent(e)),
        Err(ValidationError::Overfilled { .. })
    ));
}

#[test]
fn bar_violations_rejected() {
    let mut e = bar();
    e.ts_close_ns = e.ts_open_ns;
    assert!(matches!(
        validate(&Event::Bar(e)),
        Err(ValidationError::EmptyBarInterval { .. })
    ));

    let mut e = bar();
    e.open = 0.0;
    assert!(validate(&Event::Bar(e)).is_err());

    let mut e = bar();
    e.high = e.low - 1.0;
    assert!(validate(&Event::Bar(e)).is_err());

    let mut e = bar();
    e.high = e.close - 0.1;
    assert!(matches!(
        validate(&Event::Bar(e)),
        Err(ValidationError::HighNotExtreme { .. })
    ));

    let mut e = bar();
    e.low = e.open + 0.1;
    assert!(matches!(
        validate(&Event::Bar(e)),
        Err(ValidationError::LowNotExtreme { .. })
    ));

    let mut e = bar();
    e.volume = -1.0;
    assert!(validate(&Event::Bar(e)).is_err());
}

#[test]
fn ordering_violations_rejected() {
    let previous = header();

    let mut current = header();
    current.seq = 2;
    current.ts_monotonic_ns = previous.ts_monotonic_ns;
    assert!(validate_ordering(&current, &previous).is_ok());

    // Monotonic clock must not go backwards
    let mut current = header();
    current.seq = 2;
    current.ts_monotonic_ns = previous.ts_monotonic_ns - 1;
    assert!(matches!(
        validate_ordering(&current, &previous),
        Err(ValidationError::MonotonicRegression { .. })
    ));

    // Duplicate seq for the same (source, symbol)
    let mut current = header();
    current.ts_monotonic_ns = previous.ts_monotonic_ns + 1;
    assert!(matches!(
        validate_ordering(&current, &previous),
        Err(ValidationError::SeqRegression { .. })
    ));

    // Same seq is fine on a different symbol
    let mut current = header();
    current.ts_monotonic_ns = previous.ts_monotonic_ns + 1;
    current.symbol = "MSFT".to_string();
    assert!(validate_ordering(&current, &previous).is_ok());
}

#[test]
fn writer_rejects_and_stays_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rejects.parquet");

    {
        let mut writer = EventLogWriter::new(&path).expect("open writer");

        let mut good = trade();
        good.header.seq = 1;
        assert!(writer.append(&Event::Trade(good)));

        let mut bad = trade();
        bad.header.seq = 2;
        bad.price = -10.0;
        assert!(!writer.append(&Event::Trade(bad)));
        assert_eq!(writer.validation_errors(), 1);

        // Ordering reject: duplicate seq on the same stream
        let mut dup = trade();
        dup.header.seq = 1;
        assert!(!writer.append(&Event::Trade(dup)));
        assert_eq!(writer.validation_errors(), 2);

        // Writer is still usable after rejects
        let mut next = trade();
        next.header.seq = 2;
        assert!(writer.append(&Event::Trade(next)));
        assert_eq!(writer.event_count(), 2);

        writer.close().expect("close");
    }

    let reader = EventLogReader::new(&path).expect("open reader");
    assert_eq!(reader.event_count(), 2);
}

#[test]
fn each_violation_bumps_counter_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("counter.parquet");
    let mut writer = EventLogWriter::new(&path).expect("open writer");

    let violations: Vec<Event> = vec![
        {
            let mut e = trade();
            e.price = f64::NAN;
            Event::Trade(e)
        },
        {
            let mut e = depth();
            e.level = 5000;
            Event::DepthUpdate(e)
        },
        {
            let mut e = order();
            e.order_id.clear();
            Event::OrderEvent(e)
        },
        {
            let mut e = bar();
            e.volume = f64::NEG_INFINITY;
            Event::Bar(e)
        },
        {
            let mut e = Heartbeat { header: header() };
            e.header.venue.clear();
            Event::Heartbeat(e)
        },
    ];

    for (i, event) in violations.iter().enumerate() {
        assert!(!writer.append(event), "accepted invalid event {i}");
        assert_eq!(writer.validation_errors(), i as u64 + 1);
    }
    assert_eq!(writer.event_count(), 0);
    writer.close().expect("close");
}
