use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use packlink_frame::Packet;
use packlink_peer::{LinkStats, SendOutcome};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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
struct PacketOutput {
    destination: u8,
    #[serde(rename = "type")]
    packet_type: u8,
    payload: String,
    payload_u32: u32,
    checksum: String,
    timestamp: String,
}

impl PacketOutput {
    fn new(packet: &Packet) -> Self {
        Self {
            destination: packet.destination,
            packet_type: packet.packet_type,
            payload: hex(packet.payload.bytes()),
            payload_u32: packet.payload.u32(),
            checksum: format!("0x{:04x}", packet.checksum),
            timestamp: now_unix_seconds(),
        }
    }
}

#[derive(Serialize)]
struct SendOutput<'a> {
    outcome: &'static str,
    attempts: Option<u8>,
    packet: PacketOutput,
    stats: &'a LinkStats,
}

/// One row of a selftest report.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRecord {
    pub index: usize,
    pub packet: Packet,
    pub outcome: &'static str,
    pub attempts: Option<u8>,
    pub delivered: bool,
}

#[derive(Serialize)]
struct SelftestOutput<'a> {
    passed: bool,
    exchanges: &'a [ExchangeRecord],
    sender: &'a LinkStats,
    receiver: &'a LinkStats,
}

pub fn print_packet(packet: &Packet, format: OutputFormat) {
    let out = PacketOutput::new(packet);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["DEST", "TYPE", "PAYLOAD", "U32", "CRC"]);
            table.add_row(vec![
                out.destination.to_string(),
                out.packet_type.to_string(),
                out.payload,
                out.payload_u32.to_string(),
                out.checksum,
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "dest={} type={} payload={} crc={}",
                out.destination, out.packet_type, out.payload, out.checksum
            );
        }
    }
}

pub fn print_send_outcome(
    packet: &Packet,
    outcome: &SendOutcome,
    stats: &LinkStats,
    format: OutputFormat,
) {
    let (label, attempts) = send_outcome_parts(outcome);
    match format {
        OutputFormat::Json => print_json(&SendOutput {
            outcome: label,
            attempts,
            packet: PacketOutput::new(packet),
            stats,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["OUTCOME", "ATTEMPTS", "DEST", "TYPE", "PAYLOAD"]);
            table.add_row(vec![
                label.to_string(),
                attempts.map_or_else(|| "-".to_string(), |n| n.to_string()),
                packet.destination.to_string(),
                packet.packet_type.to_string(),
                hex(packet.payload.bytes()),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let attempts = attempts.map_or_else(|| "-".to_string(), |n| n.to_string());
            println!(
                "{label} attempts={attempts} dest={} type={} payload={}",
                packet.destination,
                packet.packet_type,
                hex(packet.payload.bytes())
            );
        }
    }
}

pub fn print_selftest(
    exchanges: &[ExchangeRecord],
    sender: &LinkStats,
    receiver: &LinkStats,
    passed: bool,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&SelftestOutput {
            passed,
            exchanges,
            sender,
            receiver,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "TYPE", "PAYLOAD", "OUTCOME", "ATTEMPTS", "DELIVERED"]);
            for record in exchanges {
                table.add_row(vec![
                    record.index.to_string(),
                    record.packet.packet_type.to_string(),
                    hex(record.packet.payload.bytes()),
                    record.outcome.to_string(),
                    record
                        .attempts
                        .map_or_else(|| "-".to_string(), |n| n.to_string()),
                    record.delivered.to_string(),
                ]);
            }
            println!("{table}");
            println!(
                "{}: sender attempts={} nacks={} / receiver delivered={} resyncs={} crc_failures={}",
                if passed { "PASS" } else { "FAIL" },
                sender.attempts,
                sender.nacks,
                receiver.delivered,
                receiver.resyncs,
                receiver.checksum_failures,
            );
        }
        OutputFormat::Pretty => {
            for record in exchanges {
                println!(
                    "#{} type={} payload={} {} delivered={}",
                    record.index,
                    record.packet.packet_type,
                    hex(record.packet.payload.bytes()),
                    record.outcome,
                    record.delivered
                );
            }
            println!("{}", if passed { "PASS" } else { "FAIL" });
        }
    }
}

pub fn send_outcome_parts(outcome: &SendOutcome) -> (&'static str, Option<u8>) {
    match outcome {
        SendOutcome::Acknowledged { attempts } => ("acknowledged", Some(*attempts)),
        SendOutcome::SendFailed { attempts } => ("send_failed", Some(*attempts)),
        SendOutcome::Reset => ("reset", None),
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex(&[0x10, 0x00, 0xAB, 0x7F]), "1000ab7f");
    }

    #[test]
    fn packet_json_uses_wire_field_names() {
        let packet = Packet::new(1, 5, [0x10, 0, 0, 0]).sealed();
        let value = serde_json::to_value(PacketOutput::new(&packet)).unwrap();
        assert_eq!(value["destination"], 1);
        assert_eq!(value["type"], 5);
        assert_eq!(value["payload"], "10000000");
        assert_eq!(value["payload_u32"], 0x10);
    }
}
