use bytes::Bytes;

use crate::cursor::Cursor;
use crate::error::{DecodeError, EncodeError};
use crate::format::{FormatRegistry, HubFormat, HubMessage};
use crate::writer::MessageWriter;

/// One format's serialization of a hub message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedMessage {
    pub format: String,
    pub payload: Bytes,
}

impl SerializedMessage {
    pub fn new(format: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            format: format.into(),
            payload: payload.into(),
        }
    }
}

/// A hub message carried as one opaque blob per downstream format.
///
/// Entries keep wire order. Names the local process does not know are kept
/// too; the consumer picks the blob it can deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializedHubMessage {
    entries: Vec<SerializedMessage>,
}

impl SerializedHubMessage {
    pub fn new(entries: Vec<SerializedMessage>) -> Self {
        Self { entries }
    }

    /// Serialize `message` with every format in `registry`, in registration order.
    pub fn from_message(
        message: &HubMessage,
        registry: &FormatRegistry,
    ) -> Result<Self, EncodeError> {
        let entries = registry
            .iter()
            .map(|format| {
                serialize_with(format, message)
                    .map(|payload| SerializedMessage::new(format.name(), payload))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// The blob for `format`, if the sender included one.
    pub fn get(&self, format: &str) -> Option<&Bytes> {
        self.entries
            .iter()
            .find(|entry| entry.format == format)
            .map(|entry| &entry.payload)
    }

    /// Format names in wire order.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.format.as_str())
    }

    pub fn entries(&self) -> &[SerializedMessage] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SerializedMessage> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialize `message` with each registered format and write the envelope map.
///
/// Written as a MessagePack map whose keys are format names (`str`) and whose
/// values are the serialized blobs (`bin`).
pub fn write_serialized_message(
    writer: &mut MessageWriter,
    registry: &FormatRegistry,
    message: &HubMessage,
) -> Result<(), EncodeError> {
    writer.write_map_header(registry.len())?;
    for format in registry.iter() {
        let payload = serialize_with(format, message)?;
        writer.write_str(format.name())?;
        writer.write_bytes(&payload)?;
    }
    Ok(())
}

fn serialize_with(format: &dyn HubFormat, message: &HubMessage) -> Result<Bytes, EncodeError> {
    format
        .serialize(message)
        .map_err(|source| EncodeError::Serialize {
            format: format.name().to_string(),
            source,
        })
}

/// Write an already-serialized message as an envelope map.
pub fn write_serialized_hub_message(
    writer: &mut MessageWriter,
    message: &SerializedHubMessage,
) -> Result<(), EncodeError> {
    writer.write_map_header(message.len())?;
    for entry in message.entries() {
        writer.write_str(&entry.format)?;
        writer.write_bytes(&entry.payload)?;
    }
    Ok(())
}

/// Read an envelope map. Blobs are copied out of the buffer, not interpreted.
pub fn read_serialized_hub_message(
    cursor: &mut Cursor<'_>,
) -> Result<SerializedHubMessage, DecodeError> {
    let count = cursor.read_map_header()?;
    let mut entries = Vec::with_capacity(cursor.capacity_hint(count));
    for _ in 0..count {
        let format = cursor.read_string()?;
        let payload = Bytes::copy_from_slice(cursor.read_bytes()?);
        entries.push(SerializedMessage { format, payload });
    }
    Ok(SerializedHubMessage { entries })
}
