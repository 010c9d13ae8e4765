//! Recipient sink that renders RFC 5322 style header lines.

use async_trait::async_trait;
use orgbook_core::{HostError, Recipient, RecipientKind, RecipientSink};
use std::io::Write;
use std::sync::Mutex;

/// Writes one `To:` / `Cc:` / `Bcc:` line per commit.
#[derive(Debug)]
pub struct HeaderSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> HeaderSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// `"Name" <email>`, with quotes and backslashes in the name escaped.
pub fn format_address(recipient: &Recipient) -> String {
    let name = recipient.display_name.trim();
    if name.is_empty() {
        return format!("<{}>", recipient.email);
    }
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\" <{}>", recipient.email)
}

#[async_trait]
impl<W: Write + Send> RecipientSink for HeaderSink<W> {
    async fn add_recipients(
        &self,
        kind: RecipientKind,
        recipients: &[Recipient],
    ) -> Result<(), HostError> {
        if recipients.is_empty() {
            return Ok(());
        }
        let line = recipients
            .iter()
            .map(format_address)
            .collect::<Vec<_>>()
            .join(", ");
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| HostError::Rejected("header writer poisoned".into()))?;
        writeln!(writer, "{kind}: {line}")?;
        writer.flush()?;
        Ok(())
    }
}
