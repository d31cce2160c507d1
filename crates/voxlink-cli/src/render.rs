//! Plain-text rendering of the transcript as chat bubbles.
//!
//! Caller lines hug the left edge, counterpart lines the right edge with an
//! `AI:` prefix. Layout is done by ratatui into an off-screen [`Buffer`];
//! nothing here touches the terminal, callers print the result.

use std::fmt::Display;

use chrono::TimeZone;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Widget, Wrap};
use voxlink_models::{ChatMessage, ConnectionStatus, Sender, TimestampKey};
use voxlink_sdk::IngestError;

pub const WAITING: &str = "Waiting for transcriptions...";
pub const CLEARED: &str = "--- call ended, transcript cleared ---";

/// Bubbles never get narrower than this, whatever the terminal says.
const MIN_BUBBLE: u16 = 20;

/// Columns taken by the bubble's edge line and its padding.
const EDGE: u16 = 2;

/// `HH:MM` in `tz`, or the raw timestamp when it is not a date.
pub fn clock<Tz>(timestamp: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match TimestampKey::parse(timestamp) {
        TimestampKey::Instant(at) => at.with_timezone(tz).format("%H:%M").to_string(),
        TimestampKey::Unparsed(raw) => raw,
    }
}

/// One message, laid out for a terminal `width` columns wide.
pub fn bubble<Tz>(message: &ChatMessage, width: u16, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let width = width.max(MIN_BUBBLE);
    let bubble_width = u16::try_from(u32::from(width) * 4 / 5)
        .unwrap_or(width)
        .max(MIN_BUBBLE);
    let time = clock(message.timestamp(), tz);

    let (header, body, alignment, block, x) = match message.sender() {
        Sender::Caller => (
            format!("you · {time}"),
            message.text().to_string(),
            Alignment::Left,
            Block::default()
                .borders(Borders::LEFT)
                .padding(Padding::left(1)),
            0,
        ),
        Sender::Counterpart => (
            format!("ai · {time}"),
            format!("AI: {}", message.text()),
            Alignment::Right,
            Block::default()
                .borders(Borders::RIGHT)
                .padding(Padding::right(1)),
            width - bubble_width,
        ),
    };

    // Worst case every character lands on its own row.
    let limit = u16::try_from(body.chars().count() + 2)
        .unwrap_or(u16::MAX)
        .min(u16::MAX / width);

    let mut text = Text::from(Line::from(header));
    text.extend(Text::from(body));
    let paragraph = Paragraph::new(text)
        .alignment(alignment)
        .wrap(Wrap { trim: true });
    let height = rows_used(&paragraph, bubble_width - EDGE, limit);

    let mut buf = Buffer::empty(Rect::new(0, 0, width, height));
    paragraph
        .block(block)
        .render(Rect::new(x, 0, bubble_width, height), &mut buf);
    rows(&buf)
}

/// The whole history, or the waiting line when there is none.
pub fn transcript<Tz>(messages: &[ChatMessage], width: u16, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if messages.is_empty() {
        return WAITING.to_string();
    }
    messages
        .iter()
        .map(|m| bubble(m, width, tz))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn status_line(status: ConnectionStatus, error: Option<&IngestError>) -> String {
    match error {
        Some(e) => format!("[{status}] {e}"),
        None => format!("[{status}]"),
    }
}

/// Failed auto-forward notice, with the start of the text for context.
pub fn failed_send(text: &str, error: &dyn Display) -> String {
    const PREVIEW: usize = 40;
    let mut preview: String = text.chars().take(PREVIEW).collect();
    if text.chars().count() > PREVIEW {
        preview.push('…');
    }
    format!("✗ not relayed \"{preview}\": {error}")
}

/// Rows a paragraph fills when wrapped to `width`, at least one.
fn rows_used(paragraph: &Paragraph<'_>, width: u16, limit: u16) -> u16 {
    let area = Rect::new(0, 0, width, limit);
    let mut buf = Buffer::empty(area);
    paragraph.clone().render(area, &mut buf);
    (0..limit)
        .rev()
        .find(|&y| (0..width).any(|x| buf[(x, y)].symbol() != " "))
        .map_or(1, |y| y + 1)
}

fn rows(buf: &Buffer) -> String {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            let row: String = (area.left()..area.right())
                .map(|x| buf[(x, y)].symbol())
                .collect();
            row.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
