use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use hubwire::GroupAction;

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod envinfo;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a backplane frame.
    Encode(EncodeArgs),
    /// Decode a backplane frame and print its fields.
    Decode(DecodeArgs),
    /// Show the top-level slot layout of any MessagePack frame.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub frame: EncodeFrame,
}

#[derive(Subcommand, Debug)]
pub enum EncodeFrame {
    /// Acknowledge a group command.
    Ack(AckArgs),
    /// Add or remove a connection from a group.
    Group(GroupArgs),
    /// A bare list of strings.
    List(ListArgs),
    /// Invoke a hub method, serialized with the JSON hub format.
    Invocation(InvocationArgs),
}

#[derive(Args, Debug)]
pub struct AckArgs {
    /// Id of the acknowledged command.
    #[arg(long, allow_negative_numbers = true)]
    pub id: i32,
}

#[derive(Args, Debug)]
pub struct GroupArgs {
    /// Correlation id echoed back in the ack.
    #[arg(long, allow_negative_numbers = true)]
    pub id: i32,
    /// Server that issues the command.
    #[arg(long)]
    pub server: String,
    /// `add`, `remove`, or a raw action byte.
    #[arg(long, value_parser = parse_action)]
    pub action: GroupAction,
    /// Group name.
    #[arg(long)]
    pub group: String,
    /// Connection id.
    #[arg(long)]
    pub connection: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Items to encode, in order.
    pub items: Vec<String>,
}

#[derive(Args, Debug)]
pub struct InvocationArgs {
    /// Hub method to invoke.
    #[arg(long)]
    pub target: String,
    /// Arguments as a JSON array.
    #[arg(long = "args", value_name = "JSON", default_value = "[]")]
    pub arguments: String,
    /// Connections that must not receive the message (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FrameKind {
    Ack,
    Group,
    List,
    Invocation,
}

impl FrameKind {
    pub fn name(self) -> &'static str {
        match self {
            FrameKind::Ack => "ack",
            FrameKind::Group => "group",
            FrameKind::List => "list",
            FrameKind::Invocation => "invocation",
        }
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame type to decode as.
    pub frame: FrameKind,
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

/// Where frame bytes come from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Frame bytes as hex (whitespace ignored).
    #[arg(long)]
    pub hex: Option<String>,
    /// Read frame bytes from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    pub fn read(&self) -> CliResult<Vec<u8>> {
        if let Some(text) = &self.hex {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            return hex::decode(compact)
                .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")));
        }
        match &self.file {
            Some(path) => std::fs::read(path)
                .map_err(|err| io_error(&format!("read {}", path.display()), err)),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

fn parse_action(value: &str) -> Result<GroupAction, String> {
    match value.to_ascii_lowercase().as_str() {
        "add" => Ok(GroupAction::ADD),
        "remove" => Ok(GroupAction::REMOVE),
        other => other
            .parse::<u8>()
            .map(GroupAction::from_raw)
            .map_err(|_| format!("expected add, remove or 0-255, got {value:?}")),
    }
}
