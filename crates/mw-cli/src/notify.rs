//! Delivery of the upcoming-activity report.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

const SUBJECT: &str = "Upcoming activities";

/// Something that can deliver a report.
pub trait Notifier {
    fn send(&mut self, message: &str) -> Result<()>;
}

/// Writes the report to a writer, typically stdout.
pub struct WriterNotifier<W: Write> {
    writer: W,
}

impl<W: Write> WriterNotifier<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Notifier for WriterNotifier<W> {
    fn send(&mut self, message: &str) -> Result<()> {
        writeln!(self.writer, "{message}")?;
        Ok(())
    }
}

/// Pipes the report into a sendmail-compatible command.
///
/// SMS gateways accept mail addressed to `<number>@<gateway>`, so the same
/// notifier covers both email and text messages.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    recipient: String,
}

impl CommandNotifier {
    pub fn new(program: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            recipient: recipient.into(),
        }
    }

    fn compose(&self, message: &str) -> String {
        format!(
            "To: {}\nSubject: {SUBJECT}\n\n{message}\n",
            self.recipient
        )
    }
}

impl Notifier for CommandNotifier {
    fn send(&mut self, message: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .arg(&self.recipient)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start {}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .context("failed to capture notifier stdin")?;
        let written = stdin.write_all(self.compose(message).as_bytes());
        drop(stdin);

        let status = child
            .wait()
            .with_context(|| format!("failed to wait for {}", self.program))?;
        if !status.success() {
            bail!("{} exited with status {status}", self.program);
        }
        written.with_context(|| format!("failed to write message to {}", self.program))?;

        tracing::info!(recipient = %self.recipient, "notification sent");
        Ok(())
    }
}

/// Builds the recipient address from a phone number and carrier gateway.
pub fn sms_recipient(phone: &str, carrier_gateway: &str) -> String {
    let gateway = carrier_gateway.trim().trim_start_matches('@');
    format!("{}@{gateway}", phone.trim())
}
