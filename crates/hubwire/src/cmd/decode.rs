use hubwire::{read_ack, read_group_command, read_invocation, read_list, GroupCommand, Invocation};
use serde::Serialize;
use tracing::debug;

use crate::cmd::{DecodeArgs, FrameKind};
use crate::exit::{decode_error, CliResult, SUCCESS};
use crate::output::{payload_preview, print_record, OutputFormat};

#[derive(Serialize)]
struct AckOutput {
    frame: &'static str,
    id: i32,
}

#[derive(Serialize)]
struct GroupOutput {
    frame: &'static str,
    id: i32,
    server_name: String,
    action: u8,
    action_name: Option<&'static str>,
    group_name: String,
    connection_id: String,
}

impl From<GroupCommand> for GroupOutput {
    fn from(command: GroupCommand) -> Self {
        Self {
            frame: "group",
            id: command.id,
            server_name: command.server_name,
            action: command.action.raw(),
            action_name: command.action.kind().ok().map(|kind| match kind {
                hubwire::GroupActionKind::Add => "add",
                hubwire::GroupActionKind::Remove => "remove",
            }),
            group_name: command.group_name,
            connection_id: command.connection_id,
        }
    }
}

#[derive(Serialize)]
struct ListOutput {
    frame: &'static str,
    items: Vec<String>,
}

#[derive(Serialize)]
struct PayloadOutput {
    format: String,
    size: usize,
    payload: String,
}

#[derive(Serialize)]
struct InvocationOutput {
    frame: &'static str,
    excluded_connection_ids: Vec<String>,
    payloads: Vec<PayloadOutput>,
}

impl From<Invocation> for InvocationOutput {
    fn from(invocation: Invocation) -> Self {
        let payloads = invocation
            .message
            .into_entries()
            .into_iter()
            .map(|entry| PayloadOutput {
                size: entry.payload.len(),
                payload: payload_preview(&entry.payload),
                format: entry.format,
            })
            .collect();
        Self {
            frame: "invocation",
            excluded_connection_ids: invocation.excluded_connection_ids,
            payloads,
        }
    }
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let data = args.input.read()?;
    let context = format!("decode {}", args.frame.name());
    debug!(frame = args.frame.name(), len = data.len(), "decoding frame");

    match args.frame {
        FrameKind::Ack => {
            let id = read_ack(&data).map_err(|err| decode_error(&context, err))?;
            print_record(&AckOutput { frame: "ack", id }, format);
        }
        FrameKind::Group => {
            let command = read_group_command(&data).map_err(|err| decode_error(&context, err))?;
            print_record(&GroupOutput::from(command), format);
        }
        FrameKind::List => {
            let items = read_list(&data).map_err(|err| decode_error(&context, err))?;
            print_record(&ListOutput { frame: "list", items }, format);
        }
        FrameKind::Invocation => {
            let invocation = read_invocation(&data).map_err(|err| decode_error(&context, err))?;
            print_record(&InvocationOutput::from(invocation), format);
        }
    }

    Ok(SUCCESS)
}
