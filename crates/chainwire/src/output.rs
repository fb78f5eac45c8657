use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chainwire_frame::Message;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
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

/// JSON record printed per message.
#[derive(Serialize)]
struct MessageRecord<'a> {
    #[serde(rename = "type")]
    kind: u8,
    kind_name: &'static str,
    size: usize,
    data: String,
    preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer_id: Option<&'a str>,
    received_at: u64,
}

impl<'a> MessageRecord<'a> {
    fn new(message: &Message, peer_id: Option<&'a str>) -> Self {
        let kind = message.kind();
        let data = message.data().as_ref();
        Self {
            kind: kind.as_u8(),
            kind_name: kind.name(),
            size: data.len(),
            data: STANDARD.encode(data),
            preview: data_preview(data),
            peer_id,
            received_at: unix_seconds(),
        }
    }

    fn kind_label(&self) -> String {
        format!("{} ({})", self.kind_name, self.kind)
    }
}

/// Print one decoded message. `peer_id` is set for messages received over the network.
pub fn print_message(message: &Message, peer_id: Option<&str>, format: OutputFormat) {
    if format == OutputFormat::Raw {
        print_raw(message.data());
        return;
    }

    let record = MessageRecord::new(message, peer_id);
    let peer = record.peer_id.unwrap_or("-");
    match format {
        OutputFormat::Json => match serde_json::to_string(&record) {
            Ok(line) => println!("{line}"),
            Err(err) => eprintln!("error: failed to render message: {err}"),
        },
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "SIZE", "PEER", "DATA"])
                .add_row(vec![
                    record.kind_label(),
                    record.size.to_string(),
                    peer.to_string(),
                    record.preview.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => println!(
            "type={} ({}) size={} peer={} data={}",
            record.kind, record.kind_name, record.size, peer, record.preview
        ),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = stdout.write_all(data).and_then(|()| stdout.flush()) {
        eprintln!("error: failed to write raw output: {err}");
    }
}

fn data_preview(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", data.len()),
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chainwire_frame::MessageType;

    #[test]
    fn record_encodes_data_as_base64() {
        let message = Message::new(MessageType::Block, b"hello".to_vec());
        let record = MessageRecord::new(&message, Some("peer-3"));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], 0);
        assert_eq!(json["kind_name"], "BLOCK");
        assert_eq!(json["data"], "aGVsbG8=");
        assert_eq!(json["peer_id"], "peer-3");
        assert_eq!(record.kind_label(), "BLOCK (0)");
    }

    #[test]
    fn record_omits_missing_peer() {
        let message = Message::new(200u8, Vec::<u8>::new());
        let json = serde_json::to_value(MessageRecord::new(&message, None)).unwrap();
        assert!(json.get("peer_id").is_none());
        assert_eq!(json["kind_name"], "UNRECOGNIZED");
    }

    #[test]
    fn preview_marks_binary_data() {
        assert_eq!(data_preview(b"hello"), "hello");
        assert_eq!(data_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }
}
