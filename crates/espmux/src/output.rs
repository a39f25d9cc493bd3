use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use espmux_frame::{channel_name, PacketReport};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    kind: &'a str,
    channel: u8,
    channel_name: &'a str,
    declared: u32,
    consumed: u32,
    dropped: u32,
    truncated: bool,
    payload: String,
    timestamp: String,
}

pub fn print_packet(report: &PacketReport, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                kind: "packet",
                channel: report.channel,
                channel_name: channel_name(report.channel),
                declared: report.declared,
                consumed: report.consumed,
                dropped: report.dropped,
                truncated: report.is_truncated(),
                payload: payload_preview(payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "DECLARED", "STORED", "DROPPED", "PAYLOAD"])
                .add_row(vec![
                    channel_name(report.channel).to_string(),
                    report.declared.to_string(),
                    report.stored().to_string(),
                    report.dropped.to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut line = format!(
                "channel={} ({}) declared={} stored={}",
                report.channel,
                channel_name(report.channel),
                report.declared,
                report.stored(),
            );
            if report.dropped > 0 {
                line.push_str(&format!(" dropped={}", report.dropped));
            }
            if report.is_truncated() {
                line.push_str(" truncated");
            }
            println!("{line} payload={}", payload_preview(payload));
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

/// One `+IPD` occurrence found by `scan`.
#[derive(Debug, Serialize)]
pub struct ScanRow {
    pub offset: usize,
    pub channel: Option<u8>,
    pub len: Option<u32>,
    pub error: Option<String>,
}

pub fn print_scan(rows: &[ScanRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for row in rows {
                println!(
                    "{}",
                    serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OFFSET", "CHANNEL", "LEN", "STATUS"]);
            for row in rows {
                table.add_row(vec![
                    row.offset.to_string(),
                    row.channel.map(channel_name).unwrap_or("-").to_string(),
                    row.len.map(|len| len.to_string()).unwrap_or_else(|| "-".into()),
                    row.error.clone().unwrap_or_else(|| "ok".into()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in rows {
                match (&row.error, row.channel, row.len) {
                    (None, Some(channel), Some(len)) => println!(
                        "offset={} channel={} ({}) len={}",
                        row.offset,
                        channel,
                        channel_name(channel),
                        len
                    ),
                    (error, _, _) => println!(
                        "offset={} rejected: {}",
                        row.offset,
                        error.as_deref().unwrap_or("unknown")
                    ),
                }
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
