//! The interactive read-reply loop.

use std::io::{BufRead, Write};

use colloquy_chat::{
    ChatSession, FinishReason, InterruptFlag, Role, Shown, StreamEvent, ThinkFilter, ThinkMarkers,
};
use colloquy_common::{ChatError, Result};
use colloquy_config::schema::DisplayConfig;
use tracing::{debug, info, warn};

use crate::signal::GeneratingGuard;

/// Inputs that end the conversation, compared case-insensitively.
pub const EXIT_WORDS: [&str; 3] = ["esci", "exit", "quit"];

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    /// Forget the conversation but keep system turns.
    Reset,
    /// Forget everything.
    ResetAll,
    Stats,
    /// Print the token cache as text.
    Raw,
    Say(String),
    Skip,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Skip;
        }
        if EXIT_WORDS.contains(&line.to_lowercase().as_str()) {
            return Self::Exit;
        }
        match line {
            "/reset" => Self::Reset,
            "/reset-all" => Self::ResetAll,
            "/stats" => Self::Stats,
            "/raw" => Self::Raw,
            _ => Self::Say(line.to_string()),
        }
    }
}

pub struct Driver<R, W> {
    session: ChatSession,
    display: DisplayConfig,
    markers: ThinkMarkers,
    streaming: bool,
    interrupt: InterruptFlag,
    generating: GeneratingGuard,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Driver<R, W> {
    pub fn new(session: ChatSession, display: DisplayConfig, input: R, output: W) -> Self {
        Self {
            session,
            display,
            markers: ThinkMarkers::default(),
            streaming: true,
            interrupt: InterruptFlag::new(),
            generating: GeneratingGuard::new(),
            input,
            output,
        }
    }

    pub fn with_markers(mut self, markers: ThinkMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Share the flag and guard registered with the Ctrl+C handler.
    pub fn with_interrupt(mut self, interrupt: InterruptFlag, generating: GeneratingGuard) -> Self {
        self.interrupt = interrupt;
        self.generating = generating;
        self
    }

    /// Read lines until an exit word or end of input.
    pub fn run(&mut self) -> Result<()> {
        loop {
            write!(self.output, "{}: ", self.display.user_name)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            match Command::parse(&line) {
                Command::Exit => break,
                Command::Skip => {}
                Command::Reset => {
                    self.session.reset(true)?;
                    writeln!(self.output, "[conversation cleared, system prompt kept]")?;
                }
                Command::ResetAll => {
                    self.session.reset(false)?;
                    writeln!(self.output, "[conversation cleared]")?;
                }
                Command::Stats => self.print_stats()?,
                Command::Raw => {
                    let transcript = self.session.transcript()?;
                    writeln!(self.output, "{transcript}")?;
                }
                Command::Say(text) => {
                    let available = self.session.send(Role::User, text)?;
                    if available <= 0 {
                        warn!(available, "Message does not fit in the context");
                    }
                    self.reply()?;
                }
            }
        }
        info!("Session ended");
        Ok(())
    }

    fn reply(&mut self) -> Result<()> {
        self.interrupt.clear();
        self.generating.set(true);
        let result = if self.streaming {
            self.stream_reply()
        } else {
            self.full_reply()
        };
        self.generating.set(false);
        result
    }

    fn stream_reply(&mut self) -> Result<()> {
        write!(self.output, "{}: ", self.display.assistant_name)?;
        self.output.flush()?;

        let stream = self.session.generate_reply_stepped();
        let filter = ThinkFilter::new(stream, self.markers.clone())
            .with_hide_empty(self.display.hide_empty_thinking);
        for shown in filter {
            write_shown(&mut self.output, shown?)?;
        }
        Ok(())
    }

    fn full_reply(&mut self) -> Result<()> {
        let reply = match self.session.generate_reply() {
            Ok((reply, available)) => {
                debug!(available, "Reply recorded");
                reply
            }
            Err(ChatError::Interrupted) => {
                writeln!(self.output)?;
                info!("Reply interrupted");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        write!(self.output, "{}: ", self.display.assistant_name)?;
        let events: [std::result::Result<StreamEvent, ChatError>; 2] = [
            Ok(StreamEvent::Token(reply)),
            Ok(StreamEvent::Finished(FinishReason::EndOfSequence)),
        ];
        let filter = ThinkFilter::new(events.into_iter(), self.markers.clone())
            .with_hide_empty(self.display.hide_empty_thinking);
        for shown in filter {
            write_shown(&mut self.output, shown?)?;
        }
        Ok(())
    }

    fn print_stats(&mut self) -> Result<()> {
        let stats = self.session.stats();
        writeln!(
            self.output,
            "tokens: {} used, {} available of {}",
            stats.tokens_used, stats.tokens_available, stats.capacity
        )?;
        writeln!(self.output, "messages: {}", stats.messages)?;
        writeln!(
            self.output,
            "replies: {} ({} tokens, {:.1} tokens/s average)",
            stats.replies, stats.total_tokens, stats.average_tokens_per_second
        )?;
        if let Some(last) = stats.last_reply {
            writeln!(
                self.output,
                "last reply: {} tokens in {:.2}s ({:.1} tokens/s)",
                last.tokens,
                last.elapsed.as_secs_f64(),
                last.tokens_per_second()
            )?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn session(&self) -> &ChatSession {
        &self.session
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.output
    }
}

fn write_shown<W: Write>(out: &mut W, shown: Shown) -> std::io::Result<()> {
    match shown {
        Shown::Answer(text) => write!(out, "{text}")?,
        Shown::Reasoning(text) => write!(out, "{DIM}{text}{RESET}")?,
        Shown::Correction(event) => write!(out, "{}", event.to_terminal())?,
        Shown::Finished(reason) => {
            if reason == FinishReason::Interrupted {
                info!("Reply interrupted");
            }
            write!(out, "{}", StreamEvent::Finished(reason).to_terminal())?;
        }
    }
    out.flush()
}
