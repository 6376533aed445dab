use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, Stdin};
use tracing::warn;

use super::{EventSource, TabEvent};

/// Chrome caps messages sent to a native host well below this, anything
/// larger means the stream is desynchronized.
const MAX_MESSAGE_LEN: usize = 1 << 20;

/// Reads extension messages in the Chrome native messaging format: a 4-byte
/// little-endian length followed by that many bytes of JSON.
pub struct NativeMessagingSource<R> {
    reader: R,
}

impl NativeMessagingSource<Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R> NativeMessagingSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send + 'static> EventSource for NativeMessagingSource<R> {
    async fn next_event(&mut self) -> Result<Option<TabEvent>> {
        loop {
            let mut len_buf = [0u8; 4];
            match self.reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_MESSAGE_LEN {
                bail!("Native message of {len} bytes exceeds the message limit");
            }

            let mut message = vec![0u8; len];
            self.reader.read_exact(&mut message).await?;

            match serde_json::from_slice::<TabEvent>(&message) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    // The extension may send message types we don't track.
                    warn!(
                        "Skipping unreadable native message {}: {e}",
                        String::from_utf8_lossy(&message)
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use anyhow::Result;

    use crate::browser::{EventSource, TabEvent};

    use super::NativeMessagingSource;

    fn encode(messages: &[&str]) -> Vec<u8> {
        let mut buffer = Vec::new();
        for message in messages {
            buffer.extend((message.len() as u32).to_le_bytes());
            buffer.extend(message.as_bytes());
        }
        buffer
    }

    #[tokio::test]
    async fn reads_length_prefixed_events() -> Result<()> {
        let input = encode(&[
            r#"{"type":"activated","tabId":1,"url":"https://github.com"}"#,
            r#"{"type":"url_changed","tabId":1,"url":"https://github.com/pulls"}"#,
        ]);
        let mut source = NativeMessagingSource::new(Cursor::new(input));

        assert_eq!(
            source.next_event().await?,
            Some(TabEvent::Activated {
                tab_id: 1,
                url: "https://github.com".into()
            })
        );
        assert_eq!(
            source.next_event().await?,
            Some(TabEvent::UrlChanged {
                tab_id: 1,
                url: "https://github.com/pulls".into()
            })
        );
        assert_eq!(source.next_event().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn skips_unknown_message_types() -> Result<()> {
        let input = encode(&[
            r#"{"type":"heartbeat"}"#,
            r#"{"type":"activated","tabId":2,"url":"https://reddit.com"}"#,
        ]);
        let mut source = NativeMessagingSource::new(Cursor::new(input));

        assert_eq!(
            source.next_event().await?,
            Some(TabEvent::Activated {
                tab_id: 2,
                url: "https://reddit.com".into()
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn closed_stream_yields_none() -> Result<()> {
        let mut source = NativeMessagingSource::new(Cursor::new(Vec::new()));
        assert_eq!(source.next_event().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn oversized_length_is_an_error() {
        let mut input = Vec::from(u32::MAX.to_le_bytes());
        input.extend(b"garbage");
        let mut source = NativeMessagingSource::new(Cursor::new(input));
        assert!(source.next_event().await.is_err());
    }
}
