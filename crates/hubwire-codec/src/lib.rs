//! MessagePack codec for a multi-server hub backplane.
//!
//! Server processes sharing a message broker exchange four frame shapes:
//! - Invocation: a hub message serialized once per downstream format, plus excluded connections
//! - GroupCommand: add/remove a connection to/from a group on the owning server
//! - Ack: the correlation id of a completed group command
//! - List: a plain list of strings (e.g. a server roster)
//!
//! Decoding borrows the received buffer and never panics on peer input.
//! Encoding writes into buffers borrowed from a process-wide pool.

pub mod cursor;
pub mod envelope;
pub mod error;
pub mod format;
pub mod marker;
pub mod pool;
pub mod protocol;
pub mod writer;

pub use cursor::{Cursor, MAX_SKIP_DEPTH};
pub use envelope::{
    read_serialized_hub_message, write_serialized_hub_message, write_serialized_message,
    SerializedHubMessage, SerializedMessage,
};
pub use error::{DecodeError, EncodeError, FormatError, Result, UnrecognizedAction};
pub use format::{FormatRegistry, HubFormat, HubMessage, InvocationMessage, JsonFormat};
pub use pool::{acquire, BufferPool, PoolConfig, PooledWriter};
pub use protocol::{
    read_ack, read_group_command, read_invocation, read_list, validate_array_size, write_ack,
    write_group_command, write_invocation_message, write_list, BackplaneProtocol, GroupAction,
    GroupActionKind, GroupCommand, Invocation, ACK_FIELDS, GROUP_COMMAND_FIELDS,
    INVOCATION_FIELDS,
};
pub use writer::MessageWriter;
