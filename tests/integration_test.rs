//! End-to-end tests: CSV event log in, MBP-10 rows out.
//!
//! Run with:
//! ```bash
//! cargo test --test integration_test
//! ```

use std::fs;
use std::io::{Cursor, Read};

use mbo_mbp_reconstructor::{
    csv_header, Action, CsvSource, MarketDataSource, MbpConfig, MbpError, MbpReconstructor,
    ModifyPolicy, Side, VecSource,
};

const HEADER: &str = "ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,price,size,channel_id,order_id,flags,ts_in_delta,sequence,symbol";

/// Build one data row in the 15-field event layout.
fn row(ts: &str, action: &str, side: &str, price: &str, size: u32, order_id: u64, seq: u64) -> String {
    format!("{ts},{ts},160,2,1108,{action},{side},{price},{size},0,{order_id},130,165200,{seq},ARL")
}

fn csv(rows: &[String]) -> String {
    let mut text = String::from(HEADER);
    for r in rows {
        text.push('\n');
        text.push_str(r);
    }
    text.push('\n');
    text
}

/// Run the whole pipeline over `text` and return the rendered output.
fn run(text: &str) -> (MbpReconstructor, String) {
    let source = CsvSource::from_reader(Cursor::new(text.as_bytes().to_vec()));
    let mut mbp = MbpReconstructor::new(10);
    mbp.process_source(source).unwrap();

    let mut out = Vec::new();
    mbp.snapshots().write_to(&mut out).unwrap();
    (mbp, String::from_utf8(out).unwrap())
}

// ============================================================================
// Output shape
// ============================================================================

#[test]
fn test_two_adds_produce_two_snapshots() {
    let text = csv(&[
        row("t1", "A", "B", "100.00", 50, 1, 1),
        row("t2", "A", "A", "101.00", 30, 2, 2),
    ]);
    let (mbp, output) = run(&text);

    assert_eq!(mbp.snapshots().len(), 2);

    let empty_side = ",".repeat(20);
    let expected = format!(
        "{}\nt1,1,100.00,50{}{}\nt2,2,100.00,50{}101.00,30{}\n",
        csv_header(10).join(","),
        ",".repeat(18),
        empty_side,
        ",".repeat(19),
        ",".repeat(18),
    );
    assert_eq!(output, expected);
}

#[test]
fn test_every_row_has_42_fields() {
    let mut rows = Vec::new();
    for i in 0..15u64 {
        let side = if i % 2 == 0 { "B" } else { "A" };
        let price = format!("{}.00", 100 + i);
        rows.push(row("t", "A", side, &price, 10, i + 1, i + 1));
    }
    let (_, output) = run(&csv(&rows));

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 16);
    for line in lines {
        assert_eq!(line.split(',').count(), 42, "bad row: {line}");
    }
}

#[test]
fn test_empty_input_writes_header_only() {
    let (mbp, output) = run(&format!("{HEADER}\n"));
    assert!(mbp.snapshots().is_empty());
    assert_eq!(output, format!("{}\n", csv_header(10).join(",")));
}

// ============================================================================
// T→F→C correlation
// ============================================================================

#[test]
fn test_trade_fill_cancel_hits_resting_side_with_trade_identity() {
    let text = csv(&[
        row("t0", "A", "A", "50.00", 5, 99, 1),
        row("T1", "T", "B", "50.00", 3, 7, 10),
        row("tf", "F", "B", "50.00", 3, 7, 11),
        row("tc", "C", "B", "50.00", 3, 7, 12),
    ]);
    let (mbp, _) = run(&text);

    // Only the add and the cancel emit.
    assert_eq!(mbp.snapshots().len(), 2);

    let last = mbp.snapshots().last().unwrap();
    assert_eq!(last.timestamp, "T1");
    assert_eq!(last.sequence, 10);
    assert_eq!(last.best_ask().unwrap().size, 2);
    assert!(last.best_bid().is_none());
    assert_eq!(mbp.stats().correlated_cancels, 1);
    assert_eq!(mbp.correlator().pending_count(), 0);
}

#[test]
fn test_none_side_trade_is_not_tracked() {
    let text = csv(&[
        row("t0", "A", "B", "20.00", 10, 5, 1),
        row("t1", "T", "N", "20.00", 4, 5, 2),
        row("t2", "C", "B", "20.00", 4, 5, 3),
    ]);
    let (mbp, _) = run(&text);

    let last = mbp.snapshots().last().unwrap();
    assert_eq!(last.timestamp, "t2");
    assert_eq!(last.sequence, 3);
    assert_eq!(last.best_bid().unwrap().size, 6);
    assert_eq!(mbp.stats().correlated_cancels, 0);
}

#[test]
fn test_orphan_fill_has_no_effect() {
    let text = csv(&[
        row("t0", "A", "B", "20.00", 10, 5, 1),
        row("t1", "F", "B", "20.00", 10, 42, 2),
    ]);
    let (mbp, _) = run(&text);

    assert_eq!(mbp.snapshots().len(), 1);
    assert_eq!(mbp.book().size_at(Side::Bid, 20_000_000_000), Some(10));
    assert_eq!(mbp.stats().fills, 1);
}

// ============================================================================
// Filtering and tolerance
// ============================================================================

#[test]
fn test_clear_rows_and_short_lines_are_skipped() {
    let text = format!(
        "{HEADER}\n{}\nnot,enough,fields\n{}\n{}\n",
        row("t0", "R", "N", "", 0, 0, 0),
        row("t1", "A", "B", "10.00", 1, 1, 1),
        row("t2", "X", "B", "10.00", 1, 2, 2),
    );
    let (mbp, output) = run(&text);

    assert_eq!(mbp.snapshots().len(), 1);
    assert_eq!(mbp.stats().clears_skipped, 1);
    assert_eq!(mbp.stats().ignored, 2);
    assert_eq!(output.lines().count(), 2);
}

#[test]
fn test_invalid_utf8_symbol_does_not_truncate_input() {
    let mut bytes = csv(&[row("t1", "A", "B", "10.00", 1, 1, 1)]).into_bytes();
    bytes.extend_from_slice(row("t2", "A", "B", "10.00", 2, 2, 2).as_bytes());
    bytes.extend_from_slice(b"\xff\n");
    bytes.extend_from_slice(row("t3", "A", "A", "11.00", 3, 3, 3).as_bytes());
    bytes.push(b'\n');

    let mut mbp = MbpReconstructor::new(10);
    let emitted = mbp
        .process_source(CsvSource::from_reader(Cursor::new(bytes)))
        .unwrap();

    assert_eq!(emitted, 3);
    let last = mbp.snapshots().last().unwrap();
    assert_eq!(last.timestamp, "t3");
    assert_eq!(last.best_bid().unwrap().size, 3);
    assert_eq!(last.best_ask().unwrap().size, 3);
}

/// Yields its data, then fails every read.
struct BrokenPipe(Cursor<Vec<u8>>);

impl Read for BrokenPipe {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.0.read(buf)? {
            0 => Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed")),
            n => Ok(n),
        }
    }
}

#[test]
fn test_read_failure_reaches_caller() {
    let text = csv(&[row("t1", "A", "B", "10.00", 1, 1, 1)]);
    let source = CsvSource::from_reader(BrokenPipe(Cursor::new(text.into_bytes())));

    let mut mbp = MbpReconstructor::new(10);
    let result = mbp.process_source(source);

    assert!(matches!(result, Err(MbpError::Io(_))));
    assert_eq!(mbp.snapshots().len(), 1);
}

#[test]
fn test_crlf_input() {
    let text = csv(&[row("t1", "A", "B", "100.00", 50, 1, 1)]).replace('\n', "\r\n");
    let (_, output) = run(&text);
    assert!(output.contains("\nt1,1,100.00,50,"));
}

#[test]
fn test_deterministic_output() {
    let text = csv(&[
        row("t1", "A", "B", "100.00", 50, 1, 1),
        row("t2", "A", "A", "101.00", 30, 2, 2),
        row("t3", "M", "B", "100.00", 20, 1, 3),
        row("t4", "T", "A", "100.00", 10, 1, 4),
        row("t5", "F", "A", "100.00", 10, 1, 5),
        row("t6", "C", "A", "100.00", 10, 1, 6),
        row("t7", "C", "A", "101.00", 30, 2, 7),
    ]);

    let (_, first) = run(&text);
    let (_, second) = run(&text);
    assert_eq!(first, second);
}

// ============================================================================
// File I/O
// ============================================================================

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    let output = dir.path().join("mbp_output.csv");
    fs::write(
        &input,
        csv(&[
            row("t1", "A", "B", "100.00", 50, 1, 1),
            row("t2", "A", "A", "101.00", 30, 2, 2),
        ]),
    )
    .unwrap();

    let source = CsvSource::open(&input).unwrap();
    assert_eq!(source.metadata().file_path.as_deref(), Some(input.as_path()));

    let config = MbpConfig::new(10).with_output_path(&output);
    let mut mbp = MbpReconstructor::with_config(config).unwrap();
    assert_eq!(mbp.process_source(source).unwrap(), 2);
    mbp.write_output().unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 3);
    assert!(written.starts_with("timestamp,sequence,bid_px_00"));
}

#[test]
fn test_missing_input_file() {
    let result = CsvSource::open("/definitely/not/here/mbo.csv");
    match result {
        Err(MbpError::InputUnavailable { path, .. }) => {
            assert_eq!(path, "/definitely/not/here/mbo.csv")
        }
        _ => panic!("expected InputUnavailable"),
    }
}

#[test]
fn test_unwritable_output_keeps_snapshots() {
    let config = MbpConfig::new(10).with_output_path("/definitely/not/here/out.csv");
    let mut mbp = MbpReconstructor::with_config(config).unwrap();
    let source = VecSource::new(vec![mbo_mbp_reconstructor::MboMessage::new(
        1,
        Action::Add,
        Side::Bid,
        100_000_000_000,
        1,
    )]);
    mbp.process_source(source).unwrap();

    assert!(matches!(
        mbp.write_output(),
        Err(MbpError::OutputUnavailable { .. })
    ));
    assert_eq!(mbp.snapshots().len(), 1);
}

// ============================================================================
// Modify policy
// ============================================================================

#[test]
fn test_modify_policies_differ() {
    let text = csv(&[
        row("t1", "A", "B", "100.00", 50, 1, 1),
        row("t2", "M", "B", "100.00", 20, 1, 2),
    ]);

    let (default_run, _) = run(&text);
    assert_eq!(
        default_run.book().size_at(Side::Bid, 100_000_000_000),
        Some(70)
    );

    let source = CsvSource::from_reader(Cursor::new(text.into_bytes()));
    let config = MbpConfig::new(10).with_modify_policy(ModifyPolicy::ReplaceResting);
    let mut replacing = MbpReconstructor::with_config(config).unwrap();
    replacing.process_source(source).unwrap();
    assert_eq!(replacing.book().size_at(Side::Bid, 100_000_000_000), Some(20));
}
