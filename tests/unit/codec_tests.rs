//! Unit tests for `AgiCodec` decoding and encoding.

use agi_wire::codec::AgiCodec;
use agi_wire::config::ParserConfig;
use agi_wire::protocol::{AgiCommand, AgiStatus, CommandMessage, Fields, ResultMessage};
use agi_wire::stream::{Event, Phase, Role};
use agi_wire::AgiError;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

fn drain(codec: &mut AgiCodec, buf: &mut BytesMut) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = codec.decode(buf).expect("decode must succeed") {
        events.push(event);
    }
    events
}

#[test]
fn decode_returns_none_until_line_completes() {
    let mut codec = AgiCodec::new(Role::Script);
    let mut buf = BytesMut::from(&b"agi_type: SIP\n"[..]);

    assert!(codec.decode(&mut buf).unwrap().is_none());
    assert!(buf.is_empty(), "decoder must consume the buffer");
    assert_eq!(codec.phase(), Phase::RequestHeaders);
}

#[test]
fn decode_queues_multiple_events() {
    let mut codec = AgiCodec::new(Role::Script);
    let mut buf = BytesMut::from(&b"agi_type: SIP\n\n200 result=1\nHANGUP\n"[..]);

    let events = drain(&mut codec, &mut buf);
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], Event::Request(_)));
    assert!(matches!(&events[1], Event::Result(m) if m.status() == AgiStatus::Success));
    assert_eq!(events[2], Event::EndOfStream);
    assert_eq!(codec.phase(), Phase::Results);
}

#[test]
fn decode_empty_buffer_is_none() {
    let mut codec = AgiCodec::new(Role::Gateway);
    let mut buf = BytesMut::new();
    assert!(codec.decode(&mut buf).unwrap().is_none());
}

#[test]
fn decode_gateway_commands() {
    let mut codec = AgiCodec::new(Role::Gateway);
    let mut buf = BytesMut::from(&b"EXEC foo \"bar baz\" qux\n"[..]);

    let events = drain(&mut codec, &mut buf);
    match &events[..] {
        [Event::Command(message)] => {
            assert_eq!(message.command(), AgiCommand::Exec);
            assert_eq!(message.args(), ["foo", "bar baz", "qux"]);
        }
        other => panic!("expected a single command, got: {other:?}"),
    }
}

#[test]
fn overlong_line_is_a_codec_error() {
    let config = ParserConfig {
        max_line_bytes: 16,
        ..ParserConfig::default()
    };
    let mut codec = AgiCodec::with_config(Role::Gateway, &config);
    let mut buf = BytesMut::from(&b"VERBOSE aaaaaaaaaaaaaaaaaaaaaaaa"[..]);

    match codec.decode(&mut buf) {
        Err(AgiError::Codec(msg)) => assert_eq!(msg, "line too long: exceeded 16 bytes"),
        other => panic!("expected codec error, got: {other:?}"),
    }

    // The rest of the oversized line is skipped up to its newline.
    buf.extend_from_slice(b"aaaa 1\nANSWER\n");
    let events = drain(&mut codec, &mut buf);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], Event::Command(m) if m.command() == AgiCommand::Answer));
}

#[test]
fn complete_lines_over_the_limit_are_rejected() {
    let config = ParserConfig {
        max_line_bytes: 16,
        ..ParserConfig::default()
    };
    let mut codec = AgiCodec::with_config(Role::Gateway, &config);
    let mut buf = BytesMut::from(&b"VERBOSE aaaaaaaaaaaaaaaaaaaaaaaa 1\nNOOP\n"[..]);

    assert!(matches!(codec.decode(&mut buf), Err(AgiError::Codec(_))));
    let events = drain(&mut codec, &mut buf);
    assert!(matches!(&events[..], [Event::Command(m)] if m.command() == AgiCommand::Noop));
}

#[test]
fn lines_at_the_limit_are_accepted() {
    let config = ParserConfig {
        max_line_bytes: 16,
        ..ParserConfig::default()
    };
    let mut codec = AgiCodec::with_config(Role::Gateway, &config);
    let mut buf = BytesMut::from(&b"VERBOSE aaaa bbb\n"[..]);

    let events = drain(&mut codec, &mut buf);
    assert!(matches!(&events[..], [Event::Command(m)] if m.command() == AgiCommand::Verbose));
}

#[test]
fn endless_header_block_is_a_codec_error() {
    let config = ParserConfig {
        max_line_bytes: 64,
        ..ParserConfig::default()
    };
    let mut codec = AgiCodec::with_config(Role::Script, &config);
    let mut buf = BytesMut::new();

    let mut outcome = None;
    for n in 0..10_000 {
        buf.extend_from_slice(format!("agi_x{n}: yyyyyyyyyy\n").as_bytes());
        match codec.decode(&mut buf) {
            Ok(None) => {}
            other => {
                outcome = Some((n, other));
                break;
            }
        }
    }

    let (n, result) = outcome.expect("the header block must be rejected");
    assert!(n < 10, "rejected only after {n} lines");
    match result {
        Err(AgiError::Codec(msg)) => {
            assert_eq!(msg, "request header block too long: exceeded 64 bytes");
        }
        other => panic!("expected codec error, got: {other:?}"),
    }
    assert_eq!(codec.phase(), Phase::RequestHeaders);
}

#[test]
fn unterminated_input_at_eof_is_dropped() {
    let mut codec = AgiCodec::new(Role::Gateway);
    let mut buf = BytesMut::from(&b"ANSWER\nNOO"[..]);

    let first = codec.decode_eof(&mut buf).unwrap();
    assert!(matches!(first, Some(Event::Command(ref m)) if m.command() == AgiCommand::Answer));
    assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    assert!(buf.is_empty());
}

#[test]
fn malformed_headers_surface_as_header_error() {
    let mut codec = AgiCodec::new(Role::Script);
    let mut buf = BytesMut::from(&b"broken\n\n"[..]);
    assert!(matches!(codec.decode(&mut buf), Err(AgiError::Header(_))));
}

#[test]
fn encode_command() {
    let mut codec = AgiCodec::new(Role::Script);
    let mut dst = BytesMut::new();
    codec
        .encode(
            CommandMessage::new(AgiCommand::GetVariable, ["my var"]),
            &mut dst,
        )
        .unwrap();
    assert_eq!(&dst[..], b"GET VARIABLE \"my var\"\n");
}

#[test]
fn encode_command_rejects_quotes() {
    let mut codec = AgiCodec::new(Role::Script);
    let mut dst = BytesMut::new();
    let result = codec.encode(
        CommandMessage::new(AgiCommand::Verbose, ["\"quoted\""]),
        &mut dst,
    );
    assert!(matches!(result, Err(AgiError::Encode(_))));
    assert!(dst.is_empty(), "nothing may be written for a rejected command");
}

#[test]
fn encode_result() {
    let mut codec = AgiCodec::new(Role::Gateway);
    let mut dst = BytesMut::new();
    let data: Fields = [("data", "testvariable")].into_iter().collect();

    codec
        .encode(ResultMessage::success("1", data, ""), &mut dst)
        .unwrap();
    codec
        .encode(
            ResultMessage::with_status(AgiStatus::InvalidCommand, "Invalid or unknown command"),
            &mut dst,
        )
        .unwrap();

    assert_eq!(
        &dst[..],
        b"200 result=1 (testvariable)\n510 Invalid or unknown command\n"
    );
}

#[test]
fn encoded_results_decode_on_script_side() {
    let mut gateway = AgiCodec::new(Role::Gateway);
    let mut wire = BytesMut::from(&b"agi_type: SIP\n\n"[..]);
    let usage = "Invalid command syntax.  Proper usage follows:\n\
                 Usage: ANSWER\n\
                 520 End of proper usage.";
    gateway
        .encode(
            ResultMessage::with_status(AgiStatus::InvalidCommandSyntax, usage),
            &mut wire,
        )
        .unwrap();

    let mut script = AgiCodec::new(Role::Script);
    let events = drain(&mut script, &mut wire);
    match &events[..] {
        [Event::Request(_), Event::Result(message)] => {
            assert_eq!(message.status(), AgiStatus::InvalidCommandSyntax);
            assert_eq!(message.info(), usage);
        }
        other => panic!("expected request then usage result, got: {other:?}"),
    }
}
