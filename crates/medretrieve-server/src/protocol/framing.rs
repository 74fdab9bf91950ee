//! Length-prefixed JSON framing (§6): each frame is a 4-byte big-endian
//! length prefix followed by a JSON-encoded request or response. This
//! replaces a newline-delimited transport — a JSON payload containing a
//! literal newline would otherwise split mid-frame.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use super::types::{ToolRequest, ToolResponse};

pub struct FramedTransport<S> {
    inner: Framed<S, LengthDelimitedCodec>,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .length_field_type::<u32>()
            .new_codec();
        Self {
            inner: Framed::new(stream, codec),
        }
    }

    /// Read the next request frame. Returns `Ok(None)` on clean stream close.
    pub async fn read_request(&mut self) -> std::io::Result<Option<ToolRequest>> {
        match self.inner.next().await {
            None => Ok(None),
            Some(Ok(bytes)) => {
                let request: ToolRequest = serde_json::from_slice(&bytes)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                Ok(Some(request))
            }
            Some(Err(e)) => Err(e),
        }
    }

    pub async fn write_response(&mut self, response: &ToolResponse) -> std::io::Result<()> {
        let bytes = serde_json::to_vec(response)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.inner.send(bytes.into()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn round_trips_a_request_through_a_length_prefixed_frame() {
        let (client, server) = duplex(4096);
        let mut client_transport = FramedTransport::new(client);
        let mut server_transport = FramedTransport::new(server);

        let request = ToolRequest {
            tool_name: "graph_stats".to_string(),
            arguments: serde_json::json!({}),
            request_id: "req-1".to_string(),
            deadline_ms: None,
        };

        let bytes = serde_json::to_vec(&serde_json::json!({
            "tool_name": request.tool_name,
            "arguments": request.arguments,
            "request_id": request.request_id,
        }))
        .unwrap();
        client_transport
            .inner
            .send(bytes.into())
            .await
            .unwrap();

        let received = server_transport.read_request().await.unwrap().unwrap();
        assert_eq!(received.tool_name, "graph_stats");
        assert_eq!(received.request_id, "req-1");
    }
}
