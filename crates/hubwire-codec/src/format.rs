//! Downstream hub message formats.
//!
//! A format turns a [`HubMessage`] into the bytes a client connection speaking
//! that format expects. The backplane carries one blob per registered format
//! and never looks inside them.

use std::fmt;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde_json::Value;

use crate::error::FormatError;

/// Record separator terminating every JSON hub message.
pub const JSON_RECORD_SEPARATOR: u8 = 0x1e;

/// Message type tag for invocations in the JSON format.
pub const JSON_INVOCATION_TYPE: u8 = 1;

/// Invoke `target` on every receiving connection with `arguments`.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationMessage {
    pub target: String,
    pub arguments: Vec<Value>,
}

impl InvocationMessage {
    pub fn new(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            arguments,
        }
    }
}

/// A semantic hub event before any format has serialized it.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum HubMessage {
    Invocation(InvocationMessage),
}

impl From<InvocationMessage> for HubMessage {
    fn from(message: InvocationMessage) -> Self {
        Self::Invocation(message)
    }
}

/// A downstream wire format able to serialize hub messages.
pub trait HubFormat: Send + Sync {
    /// Name carried on the wire as the envelope key.
    fn name(&self) -> &str;

    /// Serialize `message` into an opaque blob.
    fn serialize(&self, message: &HubMessage) -> Result<Bytes, FormatError>;
}

/// The JSON hub format: one JSON object followed by `0x1e`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl JsonFormat {
    pub const NAME: &'static str = "json";
}

#[derive(Serialize)]
struct JsonInvocation<'a> {
    #[serde(rename = "type")]
    kind: u8,
    target: &'a str,
    arguments: &'a [Value],
}

impl HubFormat for JsonFormat {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn serialize(&self, message: &HubMessage) -> Result<Bytes, FormatError> {
        let HubMessage::Invocation(invocation) = message;
        let body = JsonInvocation {
            kind: JSON_INVOCATION_TYPE,
            target: &invocation.target,
            arguments: &invocation.arguments,
        };

        let mut out = BytesMut::new().writer();
        serde_json::to_writer(&mut out, &body)?;
        let mut out = out.into_inner();
        out.put_u8(JSON_RECORD_SEPARATOR);
        Ok(out.freeze())
    }
}

/// Ordered set of formats, unique by name.
///
/// Registration order is the order entries are written into an envelope.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: Vec<Arc<dyn HubFormat>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry containing only [`JsonFormat`].
    pub fn json() -> Self {
        Self::new().with_format(JsonFormat)
    }

    /// Builder-style [`FormatRegistry::register`].
    pub fn with_format(mut self, format: impl HubFormat + 'static) -> Self {
        self.register(format);
        self
    }

    /// Add a format. A format with the same name is replaced in place.
    pub fn register(&mut self, format: impl HubFormat + 'static) {
        self.register_shared(Arc::new(format));
    }

    /// Add an already shared format.
    pub fn register_shared(&mut self, format: Arc<dyn HubFormat>) {
        match self.formats.iter().position(|f| f.name() == format.name()) {
            Some(index) => self.formats[index] = format,
            None => self.formats.push(format),
        }
    }

    /// Look up a format by name.
    pub fn get(&self, name: &str) -> Option<&dyn HubFormat> {
        self.formats
            .iter()
            .find(|f| f.name() == name)
            .map(|f| f.as_ref())
    }

    /// Iterate formats in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn HubFormat> {
        self.formats.iter().map(|f| f.as_ref())
    }

    /// Format names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Fixed(&'static str, &'static [u8]);

    impl HubFormat for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn serialize(&self, _message: &HubMessage) -> Result<Bytes, FormatError> {
            Ok(Bytes::from_static(self.1))
        }
    }

    fn sample() -> HubMessage {
        InvocationMessage::new("Send", vec![json!("hi"), json!(3)]).into()
    }

    #[test]
    fn json_format_writes_record() {
        let blob = JsonFormat.serialize(&sample()).unwrap();
        assert_eq!(blob.last(), Some(&JSON_RECORD_SEPARATOR));

        let value: Value = serde_json::from_slice(&blob[..blob.len() - 1]).unwrap();
        assert_eq!(
            value,
            json!({"type": 1, "target": "Send", "arguments": ["hi", 3]})
        );
    }

    #[test]
    fn registry_keeps_registration_order() {
        let registry = FormatRegistry::new()
            .with_format(Fixed("b", b"B"))
            .with_format(Fixed("a", b"A"))
            .with_format(JsonFormat);
        assert_eq!(registry.names(), vec!["b", "a", "json"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_name_replaces_in_place() {
        let registry = FormatRegistry::new()
            .with_format(Fixed("a", b"old"))
            .with_format(Fixed("b", b"B"))
            .with_format(Fixed("a", b"new"));
        assert_eq!(registry.names(), vec!["a", "b"]);

        let blob = registry.get("a").unwrap().serialize(&sample()).unwrap();
        assert_eq!(blob.as_ref(), b"new");
    }

    #[test]
    fn lookup_of_unknown_format_is_none() {
        let registry = FormatRegistry::json();
        assert!(registry.get("messagepack").is_none());
        assert!(registry.get(JsonFormat::NAME).is_some());
    }

    #[test]
    fn debug_lists_names() {
        let registry = FormatRegistry::json();
        assert_eq!(
            format!("{registry:?}"),
            "FormatRegistry { formats: [\"json\"] }"
        );
    }
}
