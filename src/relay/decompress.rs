//! Content-Encoding handling for upstream bodies

use std::io::Read;

/// Upstream body could not be decoded
#[derive(Debug, thiserror::Error)]
#[error("{encoding} decompression failed: {reason}")]
pub struct DecompressError {
    pub encoding: String,
    pub reason: String,
}

/// Decode `body` according to its Content-Encoding; unknown encodings pass through
pub fn decompress_body(body: &[u8], content_encoding: Option<&str>) -> Result<Vec<u8>, DecompressError> {
    let encoding = match content_encoding.map(|e| e.trim().to_ascii_lowercase()) {
        Some(enc) if !enc.is_empty() && enc != "identity" => enc,
        _ => return Ok(body.to_vec()),
    };

    let fail = |reason: String| DecompressError {
        encoding: encoding.clone(),
        reason,
    };

    let decoded = match encoding.as_str() {
        "gzip" | "x-gzip" => {
            let mut out = Vec::new();
            flate2::read::GzDecoder::new(body)
                .read_to_end(&mut out)
                .map_err(|e| fail(e.to_string()))?;
            out
        }
        "deflate" => {
            let mut out = Vec::new();
            flate2::read::ZlibDecoder::new(body)
                .read_to_end(&mut out)
                .or_else(|_| {
                    // some servers send raw deflate without the zlib wrapper
                    out.clear();
                    flate2::read::DeflateDecoder::new(body).read_to_end(&mut out)
                })
                .map_err(|e| fail(e.to_string()))?;
            out
        }
        "br" => {
            let mut out = Vec::new();
            brotli::BrotliDecompress(&mut std::io::Cursor::new(body), &mut out).map_err(|e| fail(e.to_string()))?;
            out
        }
        "zstd" => zstd::decode_all(body).map_err(|e| fail(e.to_string()))?,
        other => {
            tracing::warn!(encoding = other, "Unsupported Content-Encoding, passing body through");
            return Ok(body.to_vec());
        }
    };

    tracing::debug!(
        encoding = %encoding,
        original_size = body.len(),
        decompressed_size = decoded.len(),
        "Decompressed upstream body"
    );
    Ok(decoded)
}
