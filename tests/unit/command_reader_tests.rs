//! Unit tests for the incremental command reader.

use agi_wire::protocol::AgiCommand;
use agi_wire::stream::{CommandReader, Event};
use agi_wire::AgiError;

#[test]
fn commands_are_read_across_chunks() {
    let mut reader = CommandReader::new();
    assert!(reader.feed(b"GET VARIABLE \"my").unwrap().is_empty());

    let events = reader.feed(b" var\"\nANSWER\n").unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Command(m) if m.command() == AgiCommand::GetVariable && m.args() == ["my var"]));
    assert!(matches!(&events[1], Event::Command(m) if m.command() == AgiCommand::Answer));
}

#[test]
fn unknown_command_is_a_diagnostic() {
    let mut reader = CommandReader::new();
    let events = reader.feed(b"FROBNICATE\nNOOP\n").unwrap();

    assert!(matches!(&events[0], Event::Diagnostic(_)));
    assert!(matches!(&events[1], Event::Command(m) if m.command() == AgiCommand::Noop));
}

#[test]
fn hangup_command_ends_stream() {
    let mut reader = CommandReader::new();
    let events = reader.feed(b"HANGUP\nANSWER\n").unwrap();

    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Command(m) if m.command() == AgiCommand::Hangup));
    assert_eq!(events[1], Event::EndOfStream);
    assert!(reader.is_finished());
    assert!(reader.feed(b"ANSWER\n").unwrap().is_empty());
}

#[test]
fn whitespace_lines_between_commands_are_skipped() {
    let mut reader = CommandReader::new();
    let events = reader.feed(b"\n  \r\nANSWER\n").unwrap();
    assert_eq!(events.len(), 1);
}

#[test]
fn overlong_command_is_an_error_and_reading_resumes() {
    let mut reader = CommandReader::new().with_max_line_bytes(16);

    let err = reader
        .feed(b"ANSWER\nVERBOSE \"a very long message\" 1\nNOOP\n")
        .expect_err("VERBOSE line is over the limit");
    assert!(matches!(err, AgiError::Codec(_)));

    let events = reader.feed(b"").unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], Event::Command(m) if m.command() == AgiCommand::Answer));
    assert!(matches!(&events[1], Event::Command(m) if m.command() == AgiCommand::Noop));
}
