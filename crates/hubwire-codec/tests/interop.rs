//! Frames produced and consumed by an independent MessagePack implementation.

use std::collections::BTreeMap;
use std::fmt;

use hubwire_codec::{
    read_ack, read_group_command, read_invocation, read_list, write_ack, write_group_command,
    write_invocation_message, write_list, GroupActionKind, GroupCommand, Invocation,
    SerializedHubMessage, SerializedMessage,
};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Byte string that serde encodes as MessagePack `bin` rather than an array.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Blob(Vec<u8>);

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BlobVisitor;

        impl<'de> Visitor<'de> for BlobVisitor {
            type Value = Blob;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte string")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Blob, E> {
                Ok(Blob(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Blob, E> {
                Ok(Blob(v))
            }
        }

        deserializer.deserialize_bytes(BlobVisitor)
    }
}

#[test]
fn reads_group_command_from_rmp_serde() {
    let wire = rmp_serde::to_vec(&(42i32, "srv-1", 1u8, "chat", "conn-9")).unwrap();
    assert_eq!(
        read_group_command(&wire).unwrap(),
        GroupCommand::new(42, "srv-1", GroupActionKind::Add, "chat", "conn-9")
    );

    let wire = rmp_serde::to_vec(&(-70_000i32, "s", 2u8, "g", "c")).unwrap();
    let decoded = read_group_command(&wire).unwrap();
    assert_eq!(decoded.id, -70_000);
    assert_eq!(decoded.action.kind(), Ok(GroupActionKind::Remove));
}

#[test]
fn rmp_serde_reads_our_group_command() {
    let command = GroupCommand::new(i32::MIN, "srv", GroupActionKind::Remove, "room", "conn");
    let wire = write_group_command(&command).unwrap();
    let decoded: (i32, String, u8, String, String) = rmp_serde::from_slice(&wire).unwrap();
    assert_eq!(
        decoded,
        (
            i32::MIN,
            "srv".to_string(),
            2,
            "room".to_string(),
            "conn".to_string()
        )
    );
}

#[test]
fn acks_interoperate() {
    for id in [0, 7, 127, 128, -1, -32, -33, 65_536, i32::MIN, i32::MAX] {
        let theirs = rmp_serde::to_vec(&(id,)).unwrap();
        assert_eq!(read_ack(&theirs).unwrap(), id);
        assert_eq!(write_ack(id).unwrap(), theirs, "ack {id}");
    }
}

#[test]
fn lists_interoperate() {
    let items = vec!["a".to_string(), "b".to_string(), "x".repeat(40)];
    let theirs = rmp_serde::to_vec(&items).unwrap();
    assert_eq!(read_list(&theirs).unwrap(), items);

    let ours = write_list(&items).unwrap();
    let decoded: Vec<String> = rmp_serde::from_slice(&ours).unwrap();
    assert_eq!(decoded, items);
}

#[test]
fn reads_invocation_from_rmp_serde() {
    let mut formats = BTreeMap::new();
    formats.insert("json", Blob(b"{}\x1e".to_vec()));
    let wire = rmp_serde::to_vec(&(vec!["c1", "c2"], formats)).unwrap();

    let invocation = read_invocation(&wire).unwrap();
    assert_eq!(invocation.excluded_connection_ids, vec!["c1", "c2"]);
    assert_eq!(
        invocation.message.get("json").unwrap().as_ref(),
        b"{}\x1e"
    );
}

#[test]
fn rmp_serde_reads_our_invocation() {
    let invocation = Invocation::new(
        SerializedHubMessage::new(vec![
            SerializedMessage::new("json", b"[1]".to_vec()),
            SerializedMessage::new("messagepack", vec![0x93, 0x01]),
        ]),
        vec!["skip-me".to_string()],
    );
    let wire = write_invocation_message(&invocation).unwrap();

    let (excluded, formats): (Vec<String>, BTreeMap<String, Blob>) =
        rmp_serde::from_slice(&wire).unwrap();
    assert_eq!(excluded, vec!["skip-me"]);
    assert_eq!(formats["json"], Blob(b"[1]".to_vec()));
    assert_eq!(formats["messagepack"], Blob(vec![0x93, 0x01]));
}
