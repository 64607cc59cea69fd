//! The four backplane frames.
//!
//! Every frame is a top-level MessagePack array. Decoders require at least the
//! slots they know about and ignore any trailing slots, so a peer running a
//! newer build can append fields without breaking older ones.
//!
//! ```text
//! Invocation    [ [excluded ids: str...], { format: bin, ... } ]
//! GroupCommand  [ id: int, server: str, action: uint, group: str, connection: str ]
//! Ack           [ id: int ]
//! List          [ item: str, ... ]
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cursor::Cursor;
use crate::envelope::{
    read_serialized_hub_message, write_serialized_hub_message, write_serialized_message,
    SerializedHubMessage,
};
use crate::error::{DecodeError, EncodeError, Result, UnrecognizedAction};
use crate::format::{FormatRegistry, HubMessage, InvocationMessage};
use crate::pool;
use crate::writer::MessageWriter;

/// Minimum slot count of an invocation frame.
pub const INVOCATION_FIELDS: usize = 2;

/// Minimum slot count of a group command frame.
pub const GROUP_COMMAND_FIELDS: usize = 5;

/// Minimum slot count of an ack frame.
pub const ACK_FIELDS: usize = 1;

/// Group action byte exactly as carried on the wire.
///
/// Values this build does not know survive a decode/encode round trip; use
/// [`GroupAction::kind`] to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupAction(u8);

impl GroupAction {
    pub const ADD: Self = Self(GroupActionKind::Add as u8);
    pub const REMOVE: Self = Self(GroupActionKind::Remove as u8);

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Interpret the byte as one of the known actions.
    pub fn kind(self) -> Result<GroupActionKind, UnrecognizedAction> {
        GroupActionKind::try_from(self)
    }
}

/// Group actions understood by this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GroupActionKind {
    Add = 1,
    Remove = 2,
}

impl TryFrom<GroupAction> for GroupActionKind {
    type Error = UnrecognizedAction;

    fn try_from(action: GroupAction) -> Result<Self, Self::Error> {
        match action.0 {
            1 => Ok(Self::Add),
            2 => Ok(Self::Remove),
            other => Err(UnrecognizedAction(other)),
        }
    }
}

impl From<GroupActionKind> for GroupAction {
    fn from(kind: GroupActionKind) -> Self {
        Self(kind as u8)
    }
}

/// Add or remove a connection from a group on the server that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCommand {
    /// Correlation id echoed back in the ack.
    pub id: i32,
    /// Server that issued the command and waits for the ack.
    pub server_name: String,
    pub action: GroupAction,
    pub group_name: String,
    pub connection_id: String,
}

impl GroupCommand {
    pub fn new(
        id: i32,
        server_name: impl Into<String>,
        action: impl Into<GroupAction>,
        group_name: impl Into<String>,
        connection_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            server_name: server_name.into(),
            action: action.into(),
            group_name: group_name.into(),
            connection_id: connection_id.into(),
        }
    }
}

/// A broadcast hub message plus the connections that must not receive it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Empty when nothing is excluded.
    pub excluded_connection_ids: Vec<String>,
    pub message: SerializedHubMessage,
}

impl Invocation {
    pub fn new(message: SerializedHubMessage, excluded_connection_ids: Vec<String>) -> Self {
        Self {
            excluded_connection_ids,
            message,
        }
    }

    /// True if `connection_id` was excluded by the sender.
    pub fn excludes(&self, connection_id: &str) -> bool {
        self.excluded_connection_ids
            .iter()
            .any(|id| id == connection_id)
    }
}

/// Encoder/decoder bound to the set of downstream formats a process serves.
#[derive(Debug, Clone, Default)]
pub struct BackplaneProtocol {
    formats: Arc<FormatRegistry>,
}

impl BackplaneProtocol {
    pub fn new(formats: FormatRegistry) -> Self {
        Self::from_shared(Arc::new(formats))
    }

    pub fn from_shared(formats: Arc<FormatRegistry>) -> Self {
        Self { formats }
    }

    /// Formats written into every invocation envelope.
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Encode an invocation of `target` delivered to every connection.
    pub fn write_invocation(
        &self,
        target: &str,
        arguments: Vec<Value>,
    ) -> Result<Vec<u8>, EncodeError> {
        self.write_invocation_excluding::<&str>(target, arguments, &[])
    }

    /// Encode an invocation of `target`, skipping `excluded_connection_ids`.
    pub fn write_invocation_excluding<S: AsRef<str>>(
        &self,
        target: &str,
        arguments: Vec<Value>,
        excluded_connection_ids: &[S],
    ) -> Result<Vec<u8>, EncodeError> {
        let message = HubMessage::from(InvocationMessage::new(target, arguments));
        encode(|writer| {
            write_invocation_prefix(writer, excluded_connection_ids)?;
            write_serialized_message(writer, &self.formats, &message)
        })
    }

    pub fn read_invocation(&self, data: &[u8]) -> Result<Invocation> {
        read_invocation(data)
    }

    pub fn write_group_command(&self, command: &GroupCommand) -> Result<Vec<u8>, EncodeError> {
        write_group_command(command)
    }

    pub fn read_group_command(&self, data: &[u8]) -> Result<GroupCommand> {
        read_group_command(data)
    }

    pub fn write_ack(&self, id: i32) -> Result<Vec<u8>, EncodeError> {
        write_ack(id)
    }

    pub fn read_ack(&self, data: &[u8]) -> Result<i32> {
        read_ack(data)
    }

    pub fn write_list<S: AsRef<str>>(&self, items: &[S]) -> Result<Vec<u8>, EncodeError> {
        write_list(items)
    }

    pub fn read_list(&self, data: &[u8]) -> Result<Vec<String>> {
        read_list(data)
    }
}

/// Encode an invocation whose envelope was already serialized, e.g. when relaying.
pub fn write_invocation_message(invocation: &Invocation) -> Result<Vec<u8>, EncodeError> {
    encode(|writer| {
        write_invocation_prefix(writer, &invocation.excluded_connection_ids)?;
        write_serialized_hub_message(writer, &invocation.message)
    })
}

/// Decode an invocation frame.
pub fn read_invocation(data: &[u8]) -> Result<Invocation> {
    decode("Invocation", data, |cursor| {
        validate_array_size(cursor, INVOCATION_FIELDS, "Invocation")?;
        let excluded_connection_ids = read_string_array(cursor)?;
        let message = read_serialized_hub_message(cursor)?;
        Ok(Invocation {
            excluded_connection_ids,
            message,
        })
    })
}

/// Encode a group command. Slot order is part of the wire contract.
pub fn write_group_command(command: &GroupCommand) -> Result<Vec<u8>, EncodeError> {
    encode(|writer| {
        writer.write_array_header(GROUP_COMMAND_FIELDS)?;
        writer.write_i32(command.id)?;
        writer.write_str(&command.server_name)?;
        writer.write_u8(command.action.raw())?;
        writer.write_str(&command.group_name)?;
        writer.write_str(&command.connection_id)
    })
}

/// Decode a group command frame.
pub fn read_group_command(data: &[u8]) -> Result<GroupCommand> {
    decode("GroupCommand", data, |cursor| {
        validate_array_size(cursor, GROUP_COMMAND_FIELDS, "GroupCommand")?;
        let id = cursor.read_i32()?;
        let server_name = cursor.read_string()?;
        let action = GroupAction::from_raw(cursor.read_u8()?);
        let group_name = cursor.read_string()?;
        let connection_id = cursor.read_string()?;
        Ok(GroupCommand {
            id,
            server_name,
            action,
            group_name,
            connection_id,
        })
    })
}

/// Encode an acknowledgement of command `id`.
pub fn write_ack(id: i32) -> Result<Vec<u8>, EncodeError> {
    encode(|writer| {
        writer.write_array_header(ACK_FIELDS)?;
        writer.write_i32(id)
    })
}

/// Decode an ack frame into the acknowledged command id.
pub fn read_ack(data: &[u8]) -> Result<i32> {
    decode("Ack", data, |cursor| {
        validate_array_size(cursor, ACK_FIELDS, "Ack")?;
        cursor.read_i32()
    })
}

/// Encode a list of strings as a bare top-level array.
pub fn write_list<S: AsRef<str>>(items: &[S]) -> Result<Vec<u8>, EncodeError> {
    encode(|writer| write_string_array(writer, items))
}

/// Decode a list frame. An empty array yields an empty vector.
pub fn read_list(data: &[u8]) -> Result<Vec<String>> {
    decode("List", data, read_string_array)
}

/// Read the top-level array header and require at least `expected` slots.
pub fn validate_array_size(
    cursor: &mut Cursor<'_>,
    expected: usize,
    frame: &'static str,
) -> Result<usize> {
    let actual = cursor.read_array_header()?;
    if actual < expected {
        return Err(DecodeError::InsufficientFields {
            frame,
            expected,
            actual,
        });
    }
    Ok(actual)
}

fn write_invocation_prefix<S: AsRef<str>>(
    writer: &mut MessageWriter,
    ids: &[S],
) -> Result<(), EncodeError> {
    writer.write_array_header(INVOCATION_FIELDS)?;
    write_string_array(writer, ids)
}

fn write_string_array<S: AsRef<str>>(
    writer: &mut MessageWriter,
    items: &[S],
) -> Result<(), EncodeError> {
    writer.write_array_header(items.len())?;
    for item in items {
        writer.write_str(item.as_ref())?;
    }
    Ok(())
}

fn read_string_array(cursor: &mut Cursor<'_>) -> Result<Vec<String>> {
    let count = cursor.read_array_header()?;
    let mut items = Vec::with_capacity(cursor.capacity_hint(count));
    for _ in 0..count {
        items.push(cursor.read_string()?);
    }
    Ok(items)
}

// The pooled writer goes back to the pool when it drops, including on `?`.
fn encode(
    build: impl FnOnce(&mut MessageWriter) -> Result<(), EncodeError>,
) -> Result<Vec<u8>, EncodeError> {
    let mut writer = pool::acquire();
    build(&mut *writer)?;
    Ok(writer.to_owned_bytes())
}

fn decode<'a, T>(
    frame: &'static str,
    data: &'a [u8],
    read: impl FnOnce(&mut Cursor<'a>) -> Result<T>,
) -> Result<T> {
    let mut cursor = Cursor::new(data);
    read(&mut cursor).inspect_err(|err| {
        debug!(
            frame,
            len = data.len(),
            position = cursor.position(),
            error = %err,
            "rejected backplane frame"
        );
    })
}
