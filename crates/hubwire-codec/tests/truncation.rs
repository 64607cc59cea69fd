use bytes::Bytes;
use hubwire_codec::{
    read_ack, read_group_command, read_invocation, read_list, write_ack, write_group_command,
    write_invocation_message, write_list, BackplaneProtocol, DecodeError, FormatRegistry,
    GroupAction, GroupActionKind, GroupCommand, Invocation, SerializedHubMessage,
    SerializedMessage,
};
use serde_json::json;

fn assert_every_prefix_fails<T: std::fmt::Debug>(
    wire: &[u8],
    decode: impl Fn(&[u8]) -> Result<T, DecodeError>,
) {
    assert!(decode(wire).is_ok(), "full frame should decode");
    for len in 0..wire.len() {
        let result = decode(&wire[..len]);
        assert!(
            result.is_err(),
            "prefix of {len}/{} bytes decoded: {result:?}",
            wire.len()
        );
    }
}

#[test]
fn truncated_group_commands_fail() {
    let wire = write_group_command(&GroupCommand::new(
        70_000,
        "server-with-a-longer-name-than-31-bytes",
        GroupActionKind::Remove,
        "group",
        "connection",
    ))
    .unwrap();
    assert_every_prefix_fails(&wire, read_group_command);

    let wire = write_group_command(&GroupCommand::new(
        -1,
        "",
        GroupAction::from_raw(250),
        "",
        "",
    ))
    .unwrap();
    assert_every_prefix_fails(&wire, read_group_command);
}

#[test]
fn truncated_acks_fail() {
    for id in [0, 7, -33, 300, i32::MIN, i32::MAX] {
        assert_every_prefix_fails(&write_ack(id).unwrap(), read_ack);
    }
}

#[test]
fn truncated_lists_fail() {
    assert_every_prefix_fails(&write_list(&["a", "bb", "ccc"]).unwrap(), read_list);
    assert_every_prefix_fails(&write_list::<&str>(&[]).unwrap(), read_list);

    let many: Vec<String> = (0..20).map(|i| format!("server-{i}")).collect();
    assert_every_prefix_fails(&write_list(&many).unwrap(), read_list);
}

#[test]
fn truncated_invocations_fail() {
    let protocol = BackplaneProtocol::new(FormatRegistry::json());
    let wire = protocol
        .write_invocation_excluding("Send", vec![json!({"text": "hi"})], &["c1", "c2"])
        .unwrap();
    assert_every_prefix_fails(&wire, read_invocation);

    let empty = write_invocation_message(&Invocation::default()).unwrap();
    assert_every_prefix_fails(&empty, read_invocation);

    let big_blob = Invocation::new(
        SerializedHubMessage::new(vec![
            SerializedMessage::new("a", Bytes::from(vec![7u8; 300])),
            SerializedMessage::new("b", Bytes::new()),
        ]),
        Vec::new(),
    );
    assert_every_prefix_fails(
        &write_invocation_message(&big_blob).unwrap(),
        read_invocation,
    );
}

#[test]
fn truncation_is_reported_as_truncated_buffer() {
    let wire = write_group_command(&GroupCommand::new(1, "s", GroupActionKind::Add, "g", "c"))
        .unwrap();
    for len in 0..wire.len() {
        assert!(
            matches!(
                read_group_command(&wire[..len]),
                Err(DecodeError::TruncatedBuffer { .. })
            ),
            "prefix {len}"
        );
    }
}
