use espmux_frame::find_header;
use tracing::debug;

use crate::cmd::{read_input, ScanArgs};
use crate::exit::{CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_scan, OutputFormat, ScanRow};

pub fn run(args: ScanArgs, format: OutputFormat) -> CliResult<i32> {
    let data = read_input(&args.input)?;
    let rows = scan(&data);
    print_scan(&rows, format);

    if rows.iter().any(|row| row.error.is_some()) {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

/// Walk `data` header by header. Valid headers skip over their payload;
/// rejected ones resume the search one byte past the `+`.
fn scan(data: &[u8]) -> Vec<ScanRow> {
    let mut rows = Vec::new();
    let mut pos = 0;

    while let Some(found) = find_header(&data[pos..]) {
        let offset = pos + found.start;
        match found.header {
            Ok(header) => {
                rows.push(ScanRow {
                    offset,
                    channel: Some(header.channel),
                    len: Some(header.len),
                    error: None,
                });
                let payload_end = (pos + found.end).saturating_add(header.len as usize);
                pos = payload_end.min(data.len());
            }
            Err(err) => {
                debug!(offset, error = %err, "rejected header");
                rows.push(ScanRow {
                    offset,
                    channel: None,
                    len: None,
                    error: Some(err.to_string()),
                });
                pos = offset + 1;
            }
        }
    }
    rows
}
