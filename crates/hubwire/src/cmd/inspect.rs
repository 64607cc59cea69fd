use hubwire::marker::family_name;
use hubwire::{Cursor, DecodeError};
use serde::Serialize;

use crate::cmd::InspectArgs;
use crate::exit::{decode_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Debug, Serialize)]
struct SlotOutput {
    index: usize,
    start: usize,
    end: usize,
    family: &'static str,
}

#[derive(Debug, Serialize)]
struct LayoutOutput {
    length: usize,
    slots: usize,
    layout: Vec<SlotOutput>,
    trailing: usize,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let data = args.input.read()?;
    let layout = layout(&data).map_err(|err| decode_error("inspect", err))?;
    print_record(&layout, format);
    Ok(SUCCESS)
}

/// Byte range and type family of every slot in the top-level array.
fn layout(data: &[u8]) -> Result<LayoutOutput, DecodeError> {
    let mut cursor = Cursor::new(data);
    let slots = cursor.read_array_header()?;
    let mut layout = Vec::with_capacity(cursor.capacity_hint(slots));
    for index in 0..slots {
        let start = cursor.position();
        let family = cursor.rest().first().copied().map_or("none", family_name);
        cursor.skip_value()?;
        layout.push(SlotOutput {
            index,
            start,
            end: cursor.position(),
            family,
        });
    }
    Ok(LayoutOutput {
        length: data.len(),
        slots,
        layout,
        trailing: cursor.remaining(),
    })
}
