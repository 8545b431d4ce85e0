use nx_types::{
    Aggressor, DepthOp, Event, EventHeader, EventType, Heartbeat, OrderState, Side, Trade,
};

fn header(symbol: &str, seq: u64) -> EventHeader {
    EventHeader {
        ts_event_ns: 1_700_000_000_000_000_000,
        ts_receive_ns: 1_700_000_000_000_001_000,
        ts_monotonic_ns: 42,
        venue: "TEST".to_string(),
        symbol: symbol.to_string(),
        source: "test".to_string(),
        seq,
    }
}

#[test]
fn event_type_codes_are_stable() {
    assert_eq!(EventType::DepthUpdate as i8, 1);
    assert_eq!(EventType::Trade as i8, 2);
    assert_eq!(EventType::OrderEvent as i8, 3);
    assert_eq!(EventType::Bar as i8, 4);
    assert_eq!(EventType::Heartbeat as i8, 5);

    for code in 1..=5i8 {
        let ty = EventType::from_i8(code).expect("known code");
        assert_eq!(ty as i8, code);
    }
    assert_eq!(EventType::from_i8(0), None);
    assert_eq!(EventType::from_i8(6), None);
}

#[test]
fn enum_codes_round_trip() {
    assert_eq!(Side::from_i8(Side::Bid as i8), Some(Side::Bid));
    assert_eq!(Side::from_i8(Side::Ask as i8), Some(Side::Ask));
    assert_eq!(Side::from_i8(2), None);

    assert_eq!(DepthOp::from_i8(DepthOp::Delete as i8), Some(DepthOp::Delete));
    assert_eq!(DepthOp::from_i8(3), None);

    assert_eq!(
        Aggressor::from_i8(Aggressor::Unknown as i8),
        Some(Aggressor::Unknown)
    );
    assert_eq!(Aggressor::from_i8(-1), None);

    assert_eq!(
        OrderState::from_i8(OrderState::Rejected as i8),
        Some(OrderState::Rejected)
    );
    assert_eq!(OrderState::from_i8(6), None);
}

#[test]
fn event_accessors() {
    let event: Event = Trade {
        header: header("AAPL", 7),
        price: 150.0,
        size: 10.0,
        aggressor: Aggressor::Buy,
    }
    .into();

    assert_eq!(event.event_type(), EventType::Trade);
    assert_eq!(event.header().symbol, "AAPL");
    assert_eq!(event.header().seq, 7);

    let hb: Event = Heartbeat {
        header: header("MSFT", 9),
    }
    .into();
    assert_eq!(hb.event_type(), EventType::Heartbeat);
    assert_eq!(hb.header().symbol, "MSFT");
}
