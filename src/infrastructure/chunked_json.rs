// Chunked JSON streaming utilities
use crate::application::streaming_service::StreamMessage;
use crate::infrastructure::http_response::brotli_compress;
use crate::infrastructure::json_mapper::stream_message_to_json;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;

/// Create a chunked JSON streaming response
pub fn chunked_json_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = StreamMessage> + Send + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(msg, compress).await });

    // Chunks are compressed one by one, so no Content-Encoding on the response
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// 4-byte big-endian length, then the (optionally Brotli-compressed) JSON message
async fn serialize_chunk(msg: StreamMessage, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&stream_message_to_json(msg))?;

    let payload = if compress {
        brotli_compress(&json).await?
    } else {
        json
    };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Helper to create a streaming response from a receiver
pub fn stream_from_receiver(
    mut rx: tokio::sync::mpsc::Receiver<StreamMessage>,
    compress: bool,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        while let Some(msg) = rx.recv().await {
            yield msg;
        }
    };

    match chunked_json_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::live_feed::LiveUpdate;
    use async_compression::tokio::bufread::BrotliDecoder;
    use bytes::Buf;
    use tokio::io::AsyncReadExt;

    fn split_chunks(mut body: Bytes) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        while body.has_remaining() {
            let len = body.get_u32() as usize;
            chunks.push(body.split_to(len));
        }
        chunks
    }

    #[tokio::test]
    async fn test_chunks_are_length_prefixed() {
        let chunk = serialize_chunk(StreamMessage::Update(LiveUpdate::Counter(2)), false)
            .await
            .unwrap();

        let expected = br#"{"type":"counter","incidents":2}"#;
        assert_eq!(&chunk[..4], (expected.len() as u32).to_be_bytes());
        assert_eq!(&chunk[4..], expected);
    }

    #[tokio::test]
    async fn test_compressed_chunk_decodes() {
        let chunk = serialize_chunk(
            StreamMessage::Update(LiveUpdate::Notice("Failed to update incident count".into())),
            true,
        )
        .await
        .unwrap();

        let payload = split_chunks(chunk).remove(0);
        let mut decoder = BrotliDecoder::new(&payload[..]);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["type"], "notice");
        assert_eq!(value["message"], "Failed to update incident count");
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_drops() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(StreamMessage::Update(LiveUpdate::Counter(1)))
            .await
            .unwrap();
        tx.send(StreamMessage::Update(LiveUpdate::Counter(2)))
            .await
            .unwrap();
        drop(tx);

        let response = stream_from_receiver(rx, false).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let chunks = split_chunks(body);
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[1][..], br#"{"type":"counter","incidents":2}"#);
    }
}
