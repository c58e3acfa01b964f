//! Incremental Server-Sent Events decoding.

use std::time::Duration;

/// One decoded SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field; `None` means the default `message` type.
    pub event: Option<String>,
    /// Joined `data:` lines; `None` when the frame carried no data field.
    pub data: Option<String>,
    /// Value of the last `id:` field.
    pub id: Option<String>,
    /// Reconnection delay requested through `retry:`.
    pub retry: Option<Duration>,
}

/// Buffers raw body bytes and yields complete frames.
///
/// Frames may straddle read boundaries, including inside a multi-byte
/// character; bytes stay buffered until the blank line that ends the frame.
#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf) {
            let frame_bytes = self.buf[..idx].to_vec();
            self.buf.drain(..idx + delim_len);
            if let Some(frame) = parse_sse_frame(&frame_bytes) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Bytes received but not yet terminated by a blank line.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

fn find_frame_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buf.len()
            && buf[i] == b'\r'
            && buf[i + 1] == b'\n'
            && buf[i + 2] == b'\r'
            && buf[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?;
    if rest.is_empty() {
        return Some("");
    }
    let rest = rest.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn parse_sse_frame(bytes: &[u8]) -> Option<SseFrame> {
    if bytes.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(bytes);
    let mut frame = SseFrame::default();
    let mut data_lines: Vec<&str> = Vec::new();
    let mut saw_field = false;
    for raw_line in text.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(value) = field_value(line, "event") {
            frame.event = Some(value.to_string());
            saw_field = true;
        } else if let Some(value) = field_value(line, "data") {
            data_lines.push(value);
            saw_field = true;
        } else if let Some(value) = field_value(line, "id") {
            if !value.contains('\0') {
                frame.id = Some(value.to_string());
                saw_field = true;
            }
        } else if let Some(value) = field_value(line, "retry") {
            if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(ms) = value.parse::<u64>() {
                    frame.retry = Some(Duration::from_millis(ms));
                    saw_field = true;
                }
            }
        }
    }
    if !saw_field {
        return None;
    }
    if !data_lines.is_empty() {
        frame.data = Some(data_lines.join("\n"));
    }
    Some(frame)
}
