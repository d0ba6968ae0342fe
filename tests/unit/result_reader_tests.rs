//! Unit tests for the incremental result reader.

use agi_wire::protocol::{AgiStatus, ResultMessage, Severity};
use agi_wire::stream::{Event, ResultReader};
use agi_wire::AgiError;

const USAGE: &[u8] = b"520-Invalid command syntax.  Proper usage follows:\n\
Usage: DATABASE GET <family> <key>\n\
520 End of proper usage.\n";

fn results(events: &[Event]) -> Vec<&ResultMessage> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Result(message) => Some(message),
            _ => None,
        })
        .collect()
}

#[test]
fn one_line_yields_one_result() {
    let mut reader = ResultReader::new();
    let events = reader.feed(b"200 result=1 (testvariable)\n").unwrap();

    assert_eq!(events.len(), 1);
    let found = results(&events);
    assert_eq!(found[0].result(), Some("1"));
    assert_eq!(found[0].payload(), Some("testvariable"));
}

#[test]
fn partial_line_waits_for_newline() {
    let mut reader = ResultReader::new();
    assert!(reader.feed(b"200 res").unwrap().is_empty());
    assert!(reader.feed(b"ult=0").unwrap().is_empty());

    let events = reader.feed(b"\n").unwrap();
    assert_eq!(results(&events)[0].result(), Some("0"));
}

#[test]
fn several_lines_in_one_chunk_keep_order() {
    let mut reader = ResultReader::new();
    let events = reader.feed(b"100 result=0 Trying...\n200 result=1\n").unwrap();

    let found = results(&events);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].status(), AgiStatus::Trying);
    assert_eq!(found[1].status(), AgiStatus::Success);
}

#[test]
fn usage_block_in_one_chunk() {
    let mut reader = ResultReader::new();
    let events = reader.feed(USAGE).unwrap();

    let found = results(&events);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status(), AgiStatus::InvalidCommandSyntax);
    assert!(found[0].info().contains("Usage: DATABASE GET <family> <key>"));
    assert!(!reader.has_pending());
}

#[test]
fn usage_block_across_every_chunking() {
    for chunk_size in 1..=USAGE.len() {
        let mut reader = ResultReader::new();
        let mut events = Vec::new();
        for chunk in USAGE.chunks(chunk_size) {
            events.extend(reader.feed(chunk).unwrap());
        }

        let found = results(&events);
        assert_eq!(found.len(), 1, "chunk size {chunk_size} must yield one message");
        assert_eq!(found[0].status(), AgiStatus::InvalidCommandSyntax);
    }
}

#[test]
fn usage_block_stays_pending_between_feeds() {
    let mut reader = ResultReader::new();
    assert!(reader
        .feed(b"520-Invalid command syntax.  Proper usage follows:\n").unwrap()
        .is_empty());
    assert!(reader.has_pending());
    assert!(reader.feed(b"Usage: ANSWER\n").unwrap().is_empty());

    let events = reader.feed(b"520 End of proper usage.\n").unwrap();
    assert_eq!(results(&events).len(), 1);
    assert!(!reader.has_pending());
}

#[test]
fn interrupted_usage_block_is_discarded_with_warning() {
    let mut reader = ResultReader::new();
    reader.feed(b"520-Invalid command syntax.  Proper usage follows:\n").unwrap();

    let events = reader.feed(b"200 result=1\n").unwrap();
    assert_eq!(events.len(), 2);
    match &events[0] {
        Event::Diagnostic(diagnostic) => {
            assert_eq!(diagnostic.severity, Severity::Warning);
            assert!(diagnostic.raw.starts_with("520-"));
        }
        other => panic!("expected a diagnostic first, got: {other:?}"),
    }
    assert_eq!(results(&events)[0].result(), Some("1"));
    assert!(!reader.has_pending());
}

#[test]
fn hangup_line_ends_stream_without_result() {
    let mut reader = ResultReader::new();
    let events = reader.feed(b"HANGUP\n").unwrap();

    assert_eq!(events, vec![Event::EndOfStream]);
    assert!(reader.is_finished());
}

#[test]
fn hangup_during_usage_block_ends_stream() {
    let mut reader = ResultReader::new();
    reader.feed(b"520-Invalid command syntax.  Proper usage follows:\n").unwrap();

    let events = reader.feed(b"HANGUP\n").unwrap();
    assert_eq!(events, vec![Event::EndOfStream]);
    assert!(!reader.has_pending());
}

#[test]
fn input_after_hangup_is_ignored_until_reset() {
    let mut reader = ResultReader::new();
    let events = reader.feed(b"200 result=1\nHANGUP\n200 result=2\n").unwrap();
    assert_eq!(results(&events).len(), 1);
    assert_eq!(events.last(), Some(&Event::EndOfStream));

    assert!(reader.feed(b"200 result=3\n").unwrap().is_empty());

    reader.reset();
    let events = reader.feed(b"200 result=4\n").unwrap();
    assert_eq!(results(&events)[0].result(), Some("4"));
}

#[test]
fn stray_line_yields_diagnostic_and_stream_continues() {
    let mut reader = ResultReader::new();
    let events = reader.feed(b"garbage here\n200 result=1\n").unwrap();

    assert!(matches!(&events[0], Event::Diagnostic(d) if d.raw == "garbage here"));
    assert_eq!(results(&events)[0].result(), Some("1"));
}

#[test]
fn memory_failure_emits_result_then_critical_diagnostic() {
    let mut reader = ResultReader::new();
    let events = reader.feed(b"503 result=-2 Memory allocation failure\n").unwrap();

    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Result(m) if m.status() == AgiStatus::MemoryAllocationFailure));
    assert!(matches!(&events[1], Event::Diagnostic(d) if d.severity == Severity::Critical));
}

#[test]
fn blank_and_crlf_lines_are_tolerated() {
    let mut reader = ResultReader::new();
    let events = reader.feed(b"\r\n\n200 result=1 (x)\r\n").unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(results(&events)[0].payload(), Some("x"));
}

#[test]
fn empty_chunk_produces_nothing() {
    let mut reader = ResultReader::new();
    assert!(reader.feed(b"").unwrap().is_empty());
    assert_eq!(reader.buffered_len(), 0);
}

#[test]
fn hangup_after_status_code_ends_stream() {
    let mut reader = ResultReader::new();
    let events = reader.feed(b"200 result=-1 HANGUP\n200 result=1\n").unwrap();

    assert_eq!(events, vec![Event::EndOfStream]);
    assert!(reader.is_finished());
}

#[test]
fn usage_text_naming_hangup_does_not_end_stream() {
    let mut reader = ResultReader::new();
    let events = reader
        .feed(
            b"520-Invalid command syntax.  Proper usage follows:\n\
              Usage: HANGUP [<channelname>]\n\
              520 End of proper usage.\n",
        )
        .unwrap();

    let found = results(&events);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status(), AgiStatus::InvalidCommandSyntax);
    assert!(found[0].info().contains("Usage: HANGUP"));
    assert!(!reader.is_finished());
}

#[test]
fn overlong_usage_block_is_dropped_with_warning() {
    let mut reader = ResultReader::new().with_max_line_bytes(64);
    reader
        .feed(b"520-Invalid command syntax.  Proper usage follows:\n")
        .unwrap();

    let events = reader.feed(b"Usage: EXEC <application> <options>\n").unwrap();
    assert!(matches!(&events[..], [Event::Diagnostic(d)] if d.severity == Severity::Warning));
    assert!(!reader.has_pending());

    let events = reader.feed(b"200 result=1\n").unwrap();
    assert_eq!(results(&events)[0].result(), Some("1"));
}

#[test]
fn overlong_line_is_an_error_and_earlier_results_survive() {
    let mut reader = ResultReader::new().with_max_line_bytes(16);

    let err = reader
        .feed(b"200 result=1\n200 result=1 (far too long for the limit)\n")
        .expect_err("second line is over the limit");
    assert!(matches!(err, AgiError::Codec(ref msg) if msg.starts_with("line too long")));

    let events = reader.feed(b"200 result=2\n").unwrap();
    let found = results(&events);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].result(), Some("1"));
    assert_eq!(found[1].result(), Some("2"));
}
