use playdate_core::json::{DecodeError, DecodeErrorKind, DecodeHandler, Json};

/// Host [`Json`] backed by the `playdate-json` decoder.
#[derive(Default)]
pub struct SimJson;

impl Json for SimJson {
    fn decode_str<H: DecodeHandler>(&self, text: &str, handler: &mut H) -> Result<(), DecodeError> {
        playdate_json::decode(text, handler)
    }

    fn decode_reader<H: DecodeHandler>(
        &self,
        read: &mut dyn FnMut(&mut [u8]) -> usize,
        handler: &mut H,
    ) -> Result<(), DecodeError> {
        let mut text = Vec::new();
        let mut chunk = [0u8; 64];
        loop {
            let n = read(&mut chunk).min(chunk.len());
            if n == 0 {
                break;
            }
            text.extend_from_slice(&chunk[..n]);
        }
        match core::str::from_utf8(&text) {
            Ok(text) => playdate_json::decode(text, handler),
            Err(err) => {
                let newlines = text[..err.valid_up_to()].iter().filter(|b| **b == b'\n').count();
                let line = newlines as u32 + 1;
                let kind = DecodeErrorKind::UnexpectedCharacter;
                handler.decode_error(kind.message(), line);
                Err(DecodeError::new(kind, line))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playdate_core::value::Value;

    #[derive(Default)]
    struct Sum(i32, Option<u32>);

    impl DecodeHandler for Sum {
        fn decode_error(&mut self, _message: &str, line: u32) {
            self.1 = Some(line);
        }

        fn did_decode_array_value(&mut self, _pos: usize, value: Value<'_>) {
            self.0 += value.int_value();
        }
    }

    fn reader(mut bytes: &'static [u8]) -> impl FnMut(&mut [u8]) -> usize {
        move |buf| {
            let n = bytes.len().min(buf.len()).min(5);
            buf[..n].copy_from_slice(&bytes[..n]);
            bytes = &bytes[n..];
            n
        }
    }

    #[test]
    fn test_decode_reader_in_chunks() {
        let mut sum = Sum::default();
        let mut read = reader(b"[10, 20,\n 30, \"4 and more\"]");
        SimJson.decode_reader(&mut read, &mut sum).unwrap();
        assert_eq!(sum.0, 64);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut sum = Sum::default();
        let mut read = reader(b"[1,\n\xff]");
        let err = SimJson.decode_reader(&mut read, &mut sum).unwrap_err();
        assert_eq!(err, DecodeError::new(DecodeErrorKind::UnexpectedCharacter, 2));
        assert_eq!(sum.1, Some(2));
    }

    #[test]
    fn test_decode_str() {
        let mut sum = Sum::default();
        SimJson.decode_str("[true, 2.5]", &mut sum).unwrap();
        assert_eq!(sum.0, 3);
    }
}
