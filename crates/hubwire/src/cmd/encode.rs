use hubwire::{BackplaneProtocol, FormatRegistry, GroupCommand};
use serde_json::Value;
use tracing::debug;

use crate::cmd::{EncodeArgs, EncodeFrame, InvocationArgs};
use crate::exit::{encode_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let protocol = BackplaneProtocol::new(FormatRegistry::json());

    let (frame, result) = match args.frame {
        EncodeFrame::Ack(ack) => ("ack", protocol.write_ack(ack.id)),
        EncodeFrame::Group(group) => {
            let command = GroupCommand::new(
                group.id,
                group.server,
                group.action,
                group.group,
                group.connection,
            );
            ("group", protocol.write_group_command(&command))
        }
        EncodeFrame::List(list) => ("list", protocol.write_list(&list.items)),
        EncodeFrame::Invocation(invocation) => {
            let arguments = parse_arguments(&invocation)?;
            (
                "invocation",
                protocol.write_invocation_excluding(
                    &invocation.target,
                    arguments,
                    &invocation.exclude,
                ),
            )
        }
    };

    let wire = result.map_err(|err| encode_error(&format!("encode {frame}"), err))?;
    debug!(frame, len = wire.len(), "encoded frame");
    print_encoded(frame, &wire, format);
    Ok(SUCCESS)
}

fn parse_arguments(args: &InvocationArgs) -> CliResult<Vec<Value>> {
    match serde_json::from_str::<Value>(&args.arguments) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(CliError::new(
            USAGE,
            format!("--args must be a JSON array, got {other}"),
        )),
        Err(err) => Err(CliError::new(USAGE, format!("--args is not valid JSON: {err}"))),
    }
}
