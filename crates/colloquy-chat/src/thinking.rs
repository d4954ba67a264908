//! Separates reasoning segments from the answer in a streamed reply.
//!
//! Reasoning models wrap their scratch work in a pair of markers
//! (`<think>` ... `</think>`). [`ThinkFilter`] sits on top of a
//! [`ReplyStream`](crate::session::ReplyStream) and labels every fragment
//! as answer or reasoning. Markers split across tokens are held back until
//! they can be recognized, and a segment holding nothing but whitespace can
//! be dropped without ever reaching the display.

use std::collections::VecDeque;

use colloquy_common::ChatError;
use colloquy_config::schema::PromptConfig;

use crate::session::{FinishReason, StreamEvent};

/// A fragment ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Answer(String),
    /// Reasoning text, markers included.
    Reasoning(String),
    /// A retraction or line clear, passed through unchanged.
    Correction(StreamEvent),
    Finished(FinishReason),
}

/// Open and close markers of a reasoning segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkMarkers {
    pub open: String,
    pub close: String,
}

impl Default for ThinkMarkers {
    fn default() -> Self {
        Self::from(&PromptConfig::default())
    }
}

impl From<&PromptConfig> for ThinkMarkers {
    fn from(config: &PromptConfig) -> Self {
        Self {
            open: config.think_open.clone(),
            close: config.think_close.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Answer,
    /// Inside a segment that has shown only whitespace so far.
    Undecided,
    Reasoning,
}

pub struct ThinkFilter<I> {
    inner: I,
    markers: ThinkMarkers,
    hide_empty: bool,
    segment: Segment,
    /// Unclassified text, possibly the start of a marker.
    carry: String,
    /// Open marker plus whitespace of an undecided segment.
    held: String,
    out: VecDeque<Shown>,
}

impl<I> ThinkFilter<I>
where
    I: Iterator<Item = Result<StreamEvent, ChatError>>,
{
    pub fn new(inner: I, markers: ThinkMarkers) -> Self {
        Self {
            inner,
            markers,
            hide_empty: true,
            segment: Segment::Answer,
            carry: String::new(),
            held: String::new(),
            out: VecDeque::new(),
        }
    }

    /// Show reasoning segments even when they hold only whitespace.
    pub fn with_hide_empty(mut self, hide_empty: bool) -> Self {
        self.hide_empty = hide_empty;
        self
    }

    fn emit(&mut self, shown: Shown) {
        match &shown {
            Shown::Answer(text) | Shown::Reasoning(text) if text.is_empty() => {}
            _ => self.out.push_back(shown),
        }
    }

    fn feed(&mut self, text: &str) {
        self.carry.push_str(text);
        loop {
            match self.segment {
                Segment::Answer => {
                    let open = &self.markers.open;
                    if let Some(idx) = find_marker(&self.carry, open) {
                        let answer: String = self.carry.drain(..idx).collect();
                        let marker: String = self.carry.drain(..open.len()).collect();
                        self.emit(Shown::Answer(answer));
                        if self.hide_empty {
                            self.held = marker;
                            self.segment = Segment::Undecided;
                        } else {
                            self.emit(Shown::Reasoning(marker));
                            self.segment = Segment::Reasoning;
                        }
                        continue;
                    }
                    let safe = self.carry.len() - partial_suffix_len(&self.carry, open);
                    let answer: String = self.carry.drain(..safe).collect();
                    self.emit(Shown::Answer(answer));
                    return;
                }
                Segment::Undecided => {
                    let close = &self.markers.close;
                    if let Some(idx) = find_marker(&self.carry, close) {
                        let body: String = self.carry.drain(..idx + close.len()).collect();
                        let segment = std::mem::take(&mut self.held) + &body;
                        if !body[..idx].trim().is_empty() {
                            self.emit(Shown::Reasoning(segment));
                        }
                        self.segment = Segment::Answer;
                        continue;
                    }
                    let safe = self.carry.len() - partial_suffix_len(&self.carry, close);
                    let body: String = self.carry.drain(..safe).collect();
                    if body.trim().is_empty() {
                        self.held.push_str(&body);
                    } else {
                        let segment = std::mem::take(&mut self.held) + &body;
                        self.emit(Shown::Reasoning(segment));
                        self.segment = Segment::Reasoning;
                    }
                    return;
                }
                Segment::Reasoning => {
                    let close = &self.markers.close;
                    if let Some(idx) = find_marker(&self.carry, close) {
                        let body: String = self.carry.drain(..idx + close.len()).collect();
                        self.emit(Shown::Reasoning(body));
                        self.segment = Segment::Answer;
                        continue;
                    }
                    let safe = self.carry.len() - partial_suffix_len(&self.carry, close);
                    let body: String = self.carry.drain(..safe).collect();
                    self.emit(Shown::Reasoning(body));
                    return;
                }
            }
        }
    }

    /// Release held-back text before a correction or the end of the reply.
    fn flush(&mut self) {
        let carry = std::mem::take(&mut self.carry);
        match self.segment {
            Segment::Answer => self.emit(Shown::Answer(carry)),
            Segment::Reasoning => self.emit(Shown::Reasoning(carry)),
            Segment::Undecided => {
                let segment = std::mem::take(&mut self.held) + &carry;
                let marker_len = self.markers.open.len().min(segment.len());
                if !segment[marker_len..].trim().is_empty() {
                    self.emit(Shown::Reasoning(segment));
                    self.segment = Segment::Reasoning;
                }
            }
        }
    }
}

impl<I> Iterator for ThinkFilter<I>
where
    I: Iterator<Item = Result<StreamEvent, ChatError>>,
{
    type Item = Result<Shown, ChatError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(shown) = self.out.pop_front() {
                return Some(Ok(shown));
            }
            match self.inner.next()? {
                Ok(StreamEvent::Token(text)) => self.feed(&text),
                Ok(event @ (StreamEvent::Retract { .. } | StreamEvent::ClearLine)) => {
                    self.flush();
                    self.out.push_back(Shown::Correction(event));
                }
                Ok(StreamEvent::Finished(reason)) => {
                    self.flush();
                    self.out.push_back(Shown::Finished(reason));
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Byte offset of `marker` in `text`. An empty marker never matches.
fn find_marker(text: &str, marker: &str) -> Option<usize> {
    if marker.is_empty() {
        return None;
    }
    text.find(marker)
}

/// Length of the longest proper prefix of `marker` that `text` ends with.
fn partial_suffix_len(text: &str, marker: &str) -> usize {
    let longest = text.len().min(marker.len().saturating_sub(1));
    (1..=longest)
        .rev()
        .find(|&len| marker.is_char_boundary(len) && text.ends_with(&marker[..len]))
        .unwrap_or(0)
}
