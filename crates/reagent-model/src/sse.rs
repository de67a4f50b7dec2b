// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
//! Server-Sent Events decoder.
//!
//! Transport chunks arrive with arbitrary boundaries — an event can be split
//! across TCP packets or several events can share one packet — so the decoder
//! carries a byte buffer forward and only interprets complete
//! `\n`-terminated lines.  Records are dispatched on blank lines, per the SSE
//! framing rules.

use std::ops::ControlFlow;

use reagent_core::{Error, Result};

/// One dispatched `event/data/id` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseRecord {
    /// Value of the last `event:` field, when present.
    pub event: Option<String>,
    /// Concatenation of all `data:` lines, joined with `\n`.
    pub data: String,
    /// Value of the last `id:` field, when present.
    pub id: Option<String>,
}

/// Incremental SSE decoder; re-entrant across [`feed`](SseDecoder::feed)
/// calls.  Feeding the concatenation of two byte sequences dispatches exactly
/// the same records as feeding them separately.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    event: Option<String>,
    data: String,
    id: Option<String>,
    aborted: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a handler has aborted the stream.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Feed a chunk of bytes, invoking `handler` once per completed record.
    ///
    /// A handler returning `ControlFlow::Break` moves the decoder into the
    /// aborted state: the current feed stops immediately and every later
    /// `feed` fails with `InvalidState`.
    pub fn feed(
        &mut self,
        chunk: &[u8],
        handler: &mut dyn FnMut(&SseRecord) -> ControlFlow<()>,
    ) -> Result<()> {
        if self.aborted {
            return Err(Error::InvalidState("SSE stream aborted".into()));
        }
        self.buf.extend_from_slice(chunk);

        while let Some(nl) = self.buf.iter().position(|&b| b == b'\n') {
            // Take the line without its terminator; collapse a trailing \r.
            let mut line: Vec<u8> = self.buf.drain(..=nl).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);

            if line.is_empty() {
                if !self.data.is_empty() {
                    let record = SseRecord {
                        event: self.event.take(),
                        data: std::mem::take(&mut self.data),
                        id: self.id.take(),
                    };
                    if handler(&record).is_break() {
                        self.aborted = true;
                        return Ok(());
                    }
                } else {
                    self.event = None;
                    self.id = None;
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                // A field name with no colon carries an empty value.
                None => (line.as_ref(), ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => {
                    if !self.data.is_empty() {
                        self.data.push('\n');
                    }
                    self.data.push_str(value);
                }
                "id" => self.id = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
