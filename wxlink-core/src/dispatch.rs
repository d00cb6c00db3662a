use async_trait::async_trait;
use std::{fmt::Debug, io::Write, sync::Mutex};

use crate::{error::DispatchError, model::DispatchDictionary};

/// Outbound link to the paired watch.
#[async_trait]
pub trait MessageDispatcher: Send + Sync + Debug {
    async fn send(&self, message: DispatchDictionary) -> Result<(), DispatchError>;
}

/// Writes one JSON object per message, newline-terminated.
#[derive(Debug)]
pub struct JsonLinesDispatcher<W> {
    out: Mutex<W>,
    numeric_keys: bool,
}

impl<W: Write + Send + Debug> JsonLinesDispatcher<W> {
    pub fn new(out: W, numeric_keys: bool) -> Self {
        Self { out: Mutex::new(out), numeric_keys }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JsonLinesDispatcher<std::io::Stdout> {
    pub fn stdout(numeric_keys: bool) -> Self {
        Self::new(std::io::stdout(), numeric_keys)
    }
}

#[async_trait]
impl<W: Write + Send + Debug> MessageDispatcher for JsonLinesDispatcher<W> {
    async fn send(&self, message: DispatchDictionary) -> Result<(), DispatchError> {
        let mut line = serde_json::to_vec(&message.to_json(self.numeric_keys))?;
        line.push(b'\n');

        // Whole lines only, so concurrent senders never interleave.
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        out.write_all(&line)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageKey;

    #[tokio::test]
    async fn writes_one_line_per_message() {
        let dispatcher = JsonLinesDispatcher::new(Vec::new(), false);

        let mut first = DispatchDictionary::default();
        first.insert(MessageKey::Temperature, 12);
        let mut second = DispatchDictionary::default();
        second.insert(MessageKey::Day1Conditions, "Rain".to_string());

        dispatcher.send(first).await.unwrap();
        dispatcher.send(second).await.unwrap();

        let out = String::from_utf8(dispatcher.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec![r#"{"KEY_TEMPERATURE":12}"#, r#"{"KEY_DAY1_CONDITIONS":"Rain"}"#]);
    }

    #[tokio::test]
    async fn numeric_keys_use_appmessage_ids() {
        let dispatcher = JsonLinesDispatcher::new(Vec::new(), true);

        let mut msg = DispatchDictionary::default();
        msg.insert(MessageKey::Day3Time, 1_700_000_000_i64);
        dispatcher.send(msg).await.unwrap();

        let out = String::from_utf8(dispatcher.into_inner()).unwrap();
        assert_eq!(out, "{\"19\":1700000000}\n");
    }
}
