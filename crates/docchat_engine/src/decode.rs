use encoding_rs::{Decoder, Encoding, UTF_8};

/// Incremental text decoder for streamed answers.
///
/// Multi-byte sequences split across chunks are held back until the rest
/// arrives. The charset comes from `Content-Type`; a BOM overrides it.
pub struct StreamDecoder {
    decoder: Decoder,
}

impl StreamDecoder {
    pub fn for_content_type(content_type: Option<&str>) -> Self {
        let encoding = content_type
            .and_then(extract_charset)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        Self {
            decoder: encoding.new_decoder(),
        }
    }

    /// Decodes the next chunk, returning whatever text is complete so far.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.decode_inner(bytes, false)
    }

    /// Flushes the decoder at end of stream. Dangling partial sequences come
    /// out as U+FFFD.
    pub fn finish(mut self) -> String {
        self.decode_inner(&[], true)
    }

    fn decode_inner(&mut self, bytes: &[u8], last: bool) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(bytes.len() * 3 + 16);
        let mut out = String::with_capacity(capacity);
        let _ = self.decoder.decode_to_string(bytes, &mut out, last);
        out
    }
}

pub fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("charset") {
                Some(value.trim().trim_matches(['"', '\''].as_ref()).to_string())
            } else {
                None
            }
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_multibyte_sequence_is_reassembled() {
        let text = "Grüße ✓";
        let bytes = text.as_bytes();
        let mut decoder = StreamDecoder::for_content_type(Some("text/plain"));

        let mut out = String::new();
        for byte in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        out.push_str(&decoder.finish());

        assert_eq!(out, text);
    }

    #[test]
    fn charset_label_selects_encoding() {
        let mut decoder = StreamDecoder::for_content_type(Some("text/plain; charset=ISO-8859-1"));
        let mut out = decoder.decode(&[0x63, 0x61, 0x66, 0xE9]);
        out.push_str(&decoder.finish());
        assert_eq!(out, "café");
    }

    #[test]
    fn extract_charset_handles_case_and_quotes() {
        assert_eq!(
            extract_charset("text/plain; Charset=\"utf-8\"").as_deref(),
            Some("utf-8")
        );
        assert_eq!(extract_charset("text/plain"), None);
    }

    #[test]
    fn truncated_sequence_becomes_replacement_char() {
        let mut decoder = StreamDecoder::for_content_type(None);
        let mut out = decoder.decode(&[b'a', 0xE2, 0x9C]);
        out.push_str(&decoder.finish());
        assert_eq!(out, "a\u{FFFD}");
    }
}
