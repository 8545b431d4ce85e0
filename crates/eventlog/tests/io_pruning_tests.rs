//! IO-level pruning: row groups whose statistics cannot match the active
//! filters are skipped without being read, observable through
//! `row_groups_touched`.

use nx_eventlog::{EventLogReader, EventLogWriter, WriterOptions};
use nx_types::clock;
use nx_types::{Aggressor, Event, EventHeader, Trade};
use std::path::Path;

const BASE_TS: i64 = 1_700_000_000_000_000_000;

fn trade(symbol: &str, ts_event_ns: i64, seq: u64) -> Event {
    Event::Trade(Trade {
        header: EventHeader {
            ts_event_ns,
            ts_receive_ns: ts_event_ns + 1000,
            ts_monotonic_ns: clock::monotonic_ns(),
            venue: "TEST".to_string(),
            symbol: symbol.to_string(),
            source: "test".to_string(),
            seq,
        },
        price: 150.0,
        size: 100.0,
        aggressor: Aggressor::Buy,
    })
}

fn drain_count(reader: &mut EventLogReader) -> usize {
    let mut count = 0;
    while reader.next().expect("read").is_some() {
        count += 1;
    }
    count
}

fn write_spread(path: &Path, total: u64, interval_ns: i64) {
    let mut writer = EventLogWriter::new(path).expect("open writer");
    for i in 0..total {
        let ev = trade("AAPL", BASE_TS + i as i64 * interval_ns, i + 1);
        assert!(writer.append(&ev));
    }
    writer.close().expect("close");
}

#[test]
fn row_group_skipping() {
    const TOTAL_EVENTS: u64 = 600_000;
    const INTERVAL_NS: i64 = 10_000_000_000; // 10s
    const TIME_SPAN: i64 = TOTAL_EVENTS as i64 * INTERVAL_NS;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pruning.parquet");
    write_spread(&path, TOTAL_EVENTS, INTERVAL_NS);

    let reader = EventLogReader::new(&path).expect("open reader");
    let total_groups = reader.row_group_count();
    assert!(total_groups >= 2, "need multiple row groups, got {total_groups}");
    let time_per_group = TIME_SPAN / total_groups as i64;

    // Query inside the first row group only
    {
        let mut reader = EventLogReader::new(&path).expect("open reader");
        reader.set_time_range(BASE_TS, BASE_TS + time_per_group - 1);
        let count = drain_count(&mut reader);
        assert!(count > 0);
        assert_eq!(reader.row_groups_touched(), 1);
    }

    // Query past the end of the file: nothing read, nothing touched
    {
        let mut reader = EventLogReader::new(&path).expect("open reader");
        let end_ns = reader.get_metadata().ingest_end_ns;
        reader.set_time_range(end_ns + 1_000_000_000, end_ns + 2_000_000_000);
        assert_eq!(drain_count(&mut reader), 0);
        assert_eq!(reader.row_groups_touched(), 0);
    }

    // Full scan touches every group
    {
        let mut reader = EventLogReader::new(&path).expect("open reader");
        assert_eq!(drain_count(&mut reader) as u64, TOTAL_EVENTS);
        assert_eq!(reader.row_groups_touched(), total_groups);
    }
}

#[test]
fn seq_range_prunes_groups() {
    const TOTAL_EVENTS: u64 = 30_000;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("seqprune.parquet");

    // Shrink row groups so pruning is observable on a small file
    let options = WriterOptions {
        max_row_group_len: 10_000,
        ..WriterOptions::default()
    };
    {
        let mut writer = EventLogWriter::with_options(&path, options).expect("open writer");
        for i in 0..TOTAL_EVENTS {
            let ev = trade("AAPL", BASE_TS + i as i64 * 1_000_000, i + 1);
            assert!(writer.append(&ev));
        }
        writer.close().expect("close");
    }

    let mut reader = EventLogReader::new(&path).expect("open reader");
    assert_eq!(reader.row_group_count(), 3);

    // seq 1..=1000 lives entirely in the first row group
    reader.set_seq_range(1, 1000);
    assert_eq!(drain_count(&mut reader), 1000);
    assert_eq!(reader.row_groups_touched(), 1);

    // A range inside the last group skips the first two
    reader.reset();
    reader.set_seq_range(25_000, 26_000);
    assert_eq!(drain_count(&mut reader), 1001);
    assert_eq!(reader.row_groups_touched(), 1);

    // Past the last sequence number: all groups pruned
    reader.reset();
    reader.set_seq_range(TOTAL_EVENTS + 1, TOTAL_EVENTS + 1000);
    assert_eq!(drain_count(&mut reader), 0);
    assert_eq!(reader.row_groups_touched(), 0);
}

#[test]
fn flush_seals_row_groups() {
    const GROUPS: u64 = 5;
    const PER_GROUP: u64 = 20_000;
    const INTERVAL_NS: i64 = 1_000_000; // 1ms

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("flushed.parquet");

    {
        let mut writer = EventLogWriter::new(&path).expect("open writer");
        for i in 0..GROUPS * PER_GROUP {
            let ev = trade("AMZN", BASE_TS + i as i64 * INTERVAL_NS, i + 1);
            assert!(writer.append(&ev));
            if (i + 1) % PER_GROUP == 0 {
                writer.flush().expect("flush");
            }
        }
        writer.close().expect("close");
    }

    let mut reader = EventLogReader::new(&path).expect("open reader");
    assert_eq!(reader.row_group_count() as u64, GROUPS);

    // A range covering exactly the first sealed group touches only it
    reader.set_time_range(BASE_TS, BASE_TS + PER_GROUP as i64 * INTERVAL_NS - 1);
    assert_eq!(drain_count(&mut reader) as u64, PER_GROUP);
    assert_eq!(reader.row_groups_touched(), 1);
}

#[test]
fn reset_restarts_touched_counter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("touched.parquet");

    let options = WriterOptions {
        max_row_group_len: 5_000,
        ..WriterOptions::default()
    };
    {
        let mut writer = EventLogWriter::with_options(&path, options).expect("open writer");
        for i in 0..20_000u64 {
            let ev = trade("MSFT", BASE_TS + i as i64 * 1_000_000, i + 1);
            assert!(writer.append(&ev));
        }
        writer.close().expect("close");
    }

    let mut reader = EventLogReader::new(&path).expect("open reader");
    let total_groups = reader.row_group_count();
    assert_eq!(total_groups, 4);
    assert_eq!(drain_count(&mut reader), 20_000);
    assert_eq!(reader.row_groups_touched(), total_groups);

    reader.reset();
    assert_eq!(reader.row_groups_touched(), 0);
    assert_eq!(drain_count(&mut reader), 20_000);
    assert_eq!(reader.row_groups_touched(), total_groups);
}
