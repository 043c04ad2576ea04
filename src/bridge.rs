//! Host bridge message envelope.
//!
//! The host plugin runtime is an opaque transport delivering `{type, ...}`
//! JSON messages both ways. The core only dispatches requests against an
//! injected [`VariableSource`] and replies through a [`MessageChannel`]; the
//! CLI's `serve` command runs this over stdin/stdout JSON lines.

use crate::export::export_tokens;
use crate::normalize::format_collections;
use crate::variables::{VariableCollection, VariableSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostRequest {
    GetVariables,
    GetStyles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostResponse {
    #[serde(rename_all = "camelCase")]
    VariablesLoaded {
        variables: Vec<VariableCollection>,
        export_data: Value,
    },
    StylesLoaded {
        styles: Value,
    },
    Error {
        message: String,
    },
}

pub trait MessageChannel {
    fn send(&mut self, response: &HostResponse) -> std::io::Result<()>;
    /// Next inbound request; `None` on end of stream.
    fn receive(&mut self) -> std::io::Result<Option<HostRequest>>;
}

/// One JSON message per line, as the plugin bridge frames them.
pub struct JsonLineChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> JsonLineChannel<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> MessageChannel for JsonLineChannel<R, W> {
    fn send(&mut self, response: &HostResponse) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn receive(&mut self) -> std::io::Result<Option<HostRequest>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(request) => return Ok(Some(request)),
                Err(err) => {
                    tracing::warn!(%err, "ignoring malformed bridge message");
                }
            }
        }
    }
}

/// Dispatch one inbound request.
pub fn handle_request<S: VariableSource + ?Sized>(source: &S, request: &HostRequest) -> HostResponse {
    match request {
        HostRequest::GetVariables => {
            let variables = format_collections(source);
            let export_data = export_tokens(&variables);
            HostResponse::VariablesLoaded {
                variables,
                export_data,
            }
        }
        HostRequest::GetStyles => HostResponse::StylesLoaded {
            styles: source.styles(),
        },
    }
}

/// Serve requests until the channel closes.
pub fn serve<S: VariableSource + ?Sized, C: MessageChannel>(
    source: &S,
    channel: &mut C,
) -> std::io::Result<()> {
    while let Some(request) = channel.receive()? {
        let response = handle_request(source, &request);
        channel.send(&response)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableDocument;

    fn document() -> VariableDocument {
        serde_json::from_str(
            r#"
            {
                "collections": [
                    {"id": "c1", "name": "spacing", "modes": ["Default"], "variableIds": ["v1"]}
                ],
                "variables": {
                    "v1": {
                        "id": "v1",
                        "name": "sm",
                        "type": "FLOAT",
                        "valuesByMode": {"Default": {"kind": "number", "value": 4.0}}
                    }
                }
            }
            "#,
        )
        .expect("document")
    }

    #[test]
    fn request_message_shape() {
        let request: HostRequest =
            serde_json::from_str(r#"{"type": "get-variables"}"#).expect("request");
        assert_eq!(request, HostRequest::GetVariables);
    }

    #[test]
    fn variables_loaded_carries_collections_and_export() {
        let response = handle_request(&document(), &HostRequest::GetVariables);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["type"], "variables-loaded");
        assert_eq!(json["variables"][0]["name"], "spacing");
        assert_eq!(json["exportData"]["spacing"]["sm"]["$value"], "4");
    }

    #[test]
    fn styles_request_answered_with_styles_loaded() {
        let response = handle_request(&document(), &HostRequest::GetStyles);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["type"], "styles-loaded");
        // No styles in the document still yields an (empty) styles object.
        assert_eq!(json["styles"], serde_json::json!({}));
    }

    #[test]
    fn styles_loaded_carries_the_document_styles() {
        let document: VariableDocument = serde_json::from_str(
            r##"{"styles": {"color/brand": {"$value": "#1a73e8", "$type": "COLOR"}}}"##,
        )
        .expect("document");

        let response = handle_request(&document, &HostRequest::GetStyles);
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["type"], "styles-loaded");
        assert_eq!(json["styles"]["color/brand"]["$value"], "#1a73e8");
    }

    #[test]
    fn serve_loop_answers_each_line() {
        let input = b"{\"type\": \"get-variables\"}\n\n{\"type\": \"get-styles\"}\n" as &[u8];
        let mut output: Vec<u8> = Vec::new();
        {
            let mut channel = JsonLineChannel::new(input, &mut output);
            serve(&document(), &mut channel).expect("serve");
        }

        let lines: Vec<&str> = std::str::from_utf8(&output)
            .expect("utf-8")
            .lines()
            .collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("variables-loaded"));
        assert!(lines[1].contains("styles-loaded"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let input = b"not json\n{\"type\": \"get-variables\"}\n" as &[u8];
        let mut channel = JsonLineChannel::new(input, Vec::new());
        let request = channel.receive().expect("receive");
        assert_eq!(request, Some(HostRequest::GetVariables));
        assert_eq!(channel.receive().expect("eof"), None);
    }
}
