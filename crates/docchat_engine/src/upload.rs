use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;

use crate::{ApiError, FailureKind, UploadFile};

pub(crate) async fn read_source(file: &UploadFile) -> Result<Bytes, ApiError> {
    tokio::fs::read(&file.path)
        .await
        .map(Bytes::from)
        .map_err(|err| {
            ApiError::new(
                FailureKind::Io,
                format!("Could not read {}: {err}", file.path.display()),
            )
        })
}

/// Request body that reports the running byte count on `progress` each time
/// the HTTP client pulls another chunk.
pub(crate) fn progress_body(
    data: Bytes,
    chunk_size: usize,
    progress: UnboundedSender<u64>,
) -> reqwest::Body {
    let chunks = split_chunks(&data, chunk_size);
    let mut sent = 0u64;
    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        let _ = progress.send(sent);
        Ok::<Bytes, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(stream)
}

fn split_chunks(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_the_whole_body() {
        let data = Bytes::from_static(b"abcdefghij");
        let chunks = split_chunks(&data, 4);
        let lens: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(lens, vec![4, 4, 2]);
        assert_eq!(chunks.concat(), b"abcdefghij".to_vec());
    }

    #[test]
    fn empty_body_has_no_chunks() {
        assert!(split_chunks(&Bytes::new(), 4).is_empty());
    }

    #[test]
    fn zero_chunk_size_is_treated_as_one() {
        assert_eq!(split_chunks(&Bytes::from_static(b"ab"), 0).len(), 2);
    }
}
