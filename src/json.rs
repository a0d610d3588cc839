//! The firmware's callback-driven JSON decoder behind [`Json`].
//!
//! Both entry points stream through `playdate_json.decode` with a reader, so
//! `decode_str` needs no NUL-terminated copy of the document.

use core::ffi::{c_char, c_int, c_void, CStr};

use ::playdate_sys as sys;
use playdate_core::handle::ListRef;
use playdate_core::json::{DecodeError, DecodeErrorKind, DecodeHandler, Json, ROOT_NAME};
use playdate_core::value::{Value, ValueType};
use sys::{json_decoder, json_reader, json_value, json_value_data, playdate_json};

use crate::ffi::{borrow_str, invoke, ptr_or_null, RawHandle};

type Reader<'a> = &'a mut dyn FnMut(&mut [u8]) -> usize;

/// Per-call state reached through `json_decoder.userdata`.
struct Session<'h, H> {
    handler: &'h mut H,
    error: Option<DecodeError>,
}

/// # Safety
///
/// `decoder` must be the decoder built by [`DeviceJson::run`] for this `H`.
unsafe fn session<'a, H>(decoder: *mut json_decoder) -> &'a mut Session<'a, H> {
    // SAFETY: per the caller, userdata points at a live `Session<H>`.
    unsafe { &mut *(*decoder).userdata.cast::<Session<'a, H>>() }
}

/// View a firmware value. Payloads are borrowed for the callback only.
///
/// # Safety
///
/// String payloads must be NUL-terminated and valid for `'a`.
unsafe fn to_value<'a>(raw: &json_value) -> Value<'a> {
    let Some(kind) = ValueType::from_raw(raw.type_ as u8) else {
        return Value::Null;
    };
    // SAFETY: the tag selects the union member the firmware wrote.
    unsafe {
        match kind {
            ValueType::Null => Value::Null,
            ValueType::True => Value::True,
            ValueType::False => Value::False,
            ValueType::Integer => Value::Integer(raw.data.intval),
            ValueType::Float => Value::Float(raw.data.floatval),
            ValueType::String => Value::String(string_payload(raw.data.stringval)),
            ValueType::Array => ListRef::from_ptr(raw.data.arrayval).map_or(Value::Null, Value::Array),
            ValueType::Table => ListRef::from_ptr(raw.data.tableval).map_or(Value::Null, Value::Table),
        }
    }
}

/// The longest UTF-8 prefix of a firmware string. Null reads as empty.
///
/// # Safety
///
/// `ptr` must be null or NUL-terminated and valid for `'a`.
unsafe fn string_payload<'a>(ptr: *const c_char) -> &'a str {
    if ptr.is_null() {
        return "";
    }
    // SAFETY: per the caller.
    let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
    match core::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}

fn kind_of(raw: sys::json_value_type) -> ValueType {
    ValueType::from_raw(raw as u8).unwrap_or(ValueType::Null)
}

fn sublist_name<'a>(name: *const c_char) -> &'a str {
    // SAFETY: the firmware passes null or a NUL-terminated name that lives
    // for the callback.
    unsafe { borrow_str(name) }.unwrap_or(ROOT_NAME)
}

unsafe extern "C" fn decode_error<H: DecodeHandler>(
    decoder: *mut json_decoder,
    error: *const c_char,
    linenum: c_int,
) {
    // SAFETY: installed by `run` for this `H`.
    let session = unsafe { session::<H>(decoder) };
    let line = linenum.max(0) as u32;
    // SAFETY: null or a message valid for the callback.
    let message = unsafe { borrow_str(error) }.unwrap_or(DecodeErrorKind::Firmware.message());
    session.handler.decode_error(message, line);
    session.error = Some(DecodeError::new(DecodeErrorKind::Firmware, line));
}

unsafe extern "C" fn will_decode_sublist<H: DecodeHandler>(
    decoder: *mut json_decoder,
    name: *const c_char,
    kind: sys::json_value_type,
) {
    // SAFETY: installed by `run` for this `H`.
    let session = unsafe { session::<H>(decoder) };
    session.handler.will_decode_sublist(sublist_name(name), kind_of(kind));
}

unsafe extern "C" fn should_decode_table_value_for_key<H: DecodeHandler>(
    decoder: *mut json_decoder,
    key: *const c_char,
) -> c_int {
    // SAFETY: installed by `run` for this `H`.
    let session = unsafe { session::<H>(decoder) };
    // SAFETY: keys are NUL-terminated and live for the callback.
    let key = unsafe { borrow_str(key) }.unwrap_or_default();
    c_int::from(session.handler.should_decode_table_value_for_key(key))
}

unsafe extern "C" fn did_decode_table_value<H: DecodeHandler>(
    decoder: *mut json_decoder,
    key: *const c_char,
    value: json_value,
) {
    // SAFETY: installed by `run` for this `H`.
    let session = unsafe { session::<H>(decoder) };
    // SAFETY: key and payload live for the callback.
    let (key, value) = unsafe { (borrow_str(key).unwrap_or_default(), to_value(&value)) };
    session.handler.did_decode_table_value(key, value);
}

unsafe extern "C" fn should_decode_array_value_at_index<H: DecodeHandler>(
    decoder: *mut json_decoder,
    pos: c_int,
) -> c_int {
    // SAFETY: installed by `run` for this `H`.
    let session = unsafe { session::<H>(decoder) };
    c_int::from(session.handler.should_decode_array_value_at_index(pos.max(0) as usize))
}

unsafe extern "C" fn did_decode_array_value<H: DecodeHandler>(
    decoder: *mut json_decoder,
    pos: c_int,
    value: json_value,
) {
    // SAFETY: installed by `run` for this `H`.
    let session = unsafe { session::<H>(decoder) };
    // SAFETY: the payload lives for the callback.
    let value = unsafe { to_value(&value) };
    session.handler.did_decode_array_value(pos.max(0) as usize, value);
}

unsafe extern "C" fn did_decode_sublist<H: DecodeHandler>(
    decoder: *mut json_decoder,
    name: *const c_char,
    kind: sys::json_value_type,
) -> *mut c_void {
    // SAFETY: installed by `run` for this `H`.
    let session = unsafe { session::<H>(decoder) };
    let list = session.handler.did_decode_sublist(sublist_name(name), kind_of(kind));
    ptr_or_null(list)
}

unsafe extern "C" fn read_trampoline(userdata: *mut c_void, buf: *mut u8, bufsize: c_int) -> c_int {
    if buf.is_null() || bufsize <= 0 {
        return 0;
    }
    // SAFETY: userdata is the `Reader` borrowed by `run`.
    let read = unsafe { &mut *userdata.cast::<Reader<'_>>() };
    // SAFETY: the firmware hands over `bufsize` writable bytes.
    let buf = unsafe { core::slice::from_raw_parts_mut(buf, bufsize as usize) };
    let n = read(buf).min(buf.len());
    n as c_int
}

/// [`Json`] over `playdate_json`.
#[derive(Clone, Copy)]
pub struct DeviceJson {
    table: &'static playdate_json,
}

impl DeviceJson {
    pub(crate) fn new(table: &'static playdate_json) -> Self {
        Self { table }
    }

    fn run<H: DecodeHandler>(&self, mut read: Reader<'_>, handler: &mut H) -> Result<(), DecodeError> {
        let mut session = Session {
            handler,
            error: None,
        };
        let mut decoder = json_decoder {
            decodeError: Some(decode_error::<H>),
            willDecodeSublist: Some(will_decode_sublist::<H>),
            shouldDecodeTableValueForKey: Some(should_decode_table_value_for_key::<H>),
            didDecodeTableValue: Some(did_decode_table_value::<H>),
            shouldDecodeArrayValueAtIndex: Some(should_decode_array_value_at_index::<H>),
            didDecodeArrayValue: Some(did_decode_array_value::<H>),
            didDecodeSublist: Some(did_decode_sublist::<H>),
            userdata: core::ptr::from_mut(&mut session).cast(),
            returnString: 0,
            path: core::ptr::null(),
        };
        let reader = json_reader {
            read: Some(read_trampoline),
            userdata: core::ptr::from_mut(&mut read).cast(),
        };
        let mut out = json_value {
            type_: 0,
            data: json_value_data { intval: 0 },
        };
        let ok = invoke!(self.table, decode(&mut decoder, reader, &mut out))
            .ok_or(DecodeError::new(DecodeErrorKind::Missing, 0))?;
        match session.error {
            Some(error) => Err(error),
            None if ok == 0 => Err(DecodeError::new(DecodeErrorKind::Firmware, 0)),
            None => Ok(()),
        }
    }
}

impl Json for DeviceJson {
    fn decode_str<H: DecodeHandler>(&self, text: &str, handler: &mut H) -> Result<(), DecodeError> {
        let mut rest = text.as_bytes();
        let mut read = |buf: &mut [u8]| {
            let n = rest.len().min(buf.len());
            buf[..n].copy_from_slice(&rest[..n]);
            rest = &rest[n..];
            n
        };
        self.run(&mut read, handler)
    }

    fn decode_reader<H: DecodeHandler>(
        &self,
        read: &mut dyn FnMut(&mut [u8]) -> usize,
        handler: &mut H,
    ) -> Result<(), DecodeError> {
        self.run(read, handler)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::boxed::Box;
    use std::string::{String, ToString};
    use std::vec::Vec;

    /// Stands in for the firmware: reads the whole document, then reports a
    /// fixed event sequence for `{"hp":3,"tags":["a"]}`, or an error when
    /// the text is not that document.
    unsafe extern "C" fn decode(
        d: *mut json_decoder,
        reader: json_reader,
        _out: *mut json_value,
    ) -> c_int {
        let mut text = Vec::new();
        let mut chunk = [0u8; 4];
        loop {
            let n = unsafe { reader.read.unwrap()(reader.userdata, chunk.as_mut_ptr(), 4) };
            if n == 0 {
                break;
            }
            text.extend_from_slice(&chunk[..n as usize]);
        }
        let dec = unsafe { &*d };
        if text != br#"{"hp":3,"tags":["a"]}"# {
            unsafe { dec.decodeError.unwrap()(d, c"unexpected token".as_ptr(), 2) };
            return 0;
        }
        let int = json_value {
            type_: sys::kJSONInteger as c_char,
            data: json_value_data { intval: 3 },
        };
        unsafe {
            dec.willDecodeSublist.unwrap()(d, c"_root".as_ptr(), sys::kJSONTable);
            if dec.shouldDecodeTableValueForKey.unwrap()(d, c"hp".as_ptr()) != 0 {
                dec.didDecodeTableValue.unwrap()(d, c"hp".as_ptr(), int);
            }
            dec.willDecodeSublist.unwrap()(d, c"tags".as_ptr(), sys::kJSONArray);
            let a = json_value {
                type_: sys::kJSONString as c_char,
                data: json_value_data {
                    stringval: c"a".as_ptr().cast_mut(),
                },
            };
            dec.didDecodeArrayValue.unwrap()(d, 1, a);
            let list = dec.didDecodeSublist.unwrap()(d, c"tags".as_ptr(), sys::kJSONArray);
            let tags = json_value {
                type_: sys::kJSONArray as c_char,
                data: json_value_data { arrayval: list },
            };
            dec.didDecodeTableValue.unwrap()(d, c"tags".as_ptr(), tags);
            dec.didDecodeSublist.unwrap()(d, c"_root".as_ptr(), sys::kJSONTable);
        }
        1
    }

    #[derive(Default)]
    struct Events {
        log: Vec<String>,
        errors: Vec<(String, u32)>,
    }

    impl DecodeHandler for Events {
        fn decode_error(&mut self, message: &str, line: u32) {
            self.errors.push((message.to_string(), line));
        }

        fn will_decode_sublist(&mut self, name: &str, kind: ValueType) {
            self.log.push(std::format!("open {} {:?}", name, kind));
        }

        fn did_decode_table_value(&mut self, key: &str, value: Value<'_>) {
            self.log.push(std::format!("{}={:?}", key, value));
        }

        fn did_decode_array_value(&mut self, pos: usize, value: Value<'_>) {
            self.log.push(std::format!("[{}]={:?}", pos, value));
        }

        fn did_decode_sublist(&mut self, name: &str, _kind: ValueType) -> Option<ListRef> {
            self.log.push(std::format!("close {}", name));
            ListRef::from_raw(0x77)
        }
    }

    fn json() -> DeviceJson {
        // SAFETY: every field is an optional function pointer; zero is None.
        let mut table: playdate_json = unsafe { core::mem::zeroed() };
        table.decode = Some(decode);
        DeviceJson::new(Box::leak(Box::new(table)))
    }

    #[test]
    fn test_events_reach_handler() {
        let mut events = Events::default();
        json().decode_str(r#"{"hp":3,"tags":["a"]}"#, &mut events).unwrap();
        assert_eq!(
            events.log,
            [
                "open _root Table",
                "hp=Integer(3)",
                "open tags Array",
                "[1]=String(\"a\")",
                "close tags",
                "tags=Array(ListRef(119))",
                "close _root",
            ]
        );
    }

    #[test]
    fn test_error_carries_line() {
        let mut events = Events::default();
        let err = json().decode_str("{oops", &mut events).unwrap_err();
        assert_eq!(err, DecodeError::new(DecodeErrorKind::Firmware, 2));
        assert_eq!(events.errors, [("unexpected token".to_string(), 2)]);
    }

    #[test]
    fn test_decode_reader_and_missing() {
        let doc = br#"{"hp":3,"tags":["a"]}"#;
        let mut offset = 0;
        let mut read = |buf: &mut [u8]| {
            let n = (doc.len() - offset).min(buf.len()).min(3);
            buf[..n].copy_from_slice(&doc[offset..offset + n]);
            offset += n;
            n
        };
        let mut events = Events::default();
        json().decode_reader(&mut read, &mut events).unwrap();
        assert_eq!(events.log.len(), 7);

        // SAFETY: as in `json`.
        let empty: &'static playdate_json = Box::leak(Box::new(unsafe { core::mem::zeroed() }));
        let err = DeviceJson::new(empty).decode_str("{}", &mut events).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Missing);
    }

    #[test]
    fn test_string_tag_survives_bad_utf8() {
        let bytes = b"12\xff\0";
        let raw = json_value {
            type_: sys::kJSONString as c_char,
            data: json_value_data {
                stringval: bytes.as_ptr().cast::<c_char>().cast_mut(),
            },
        };
        let value = unsafe { to_value(&raw) };
        assert_eq!(value, Value::String("12"));
        assert_eq!(value.int_value(), 12);
        assert!(value.bool_value());

        let null = json_value {
            type_: sys::kJSONString as c_char,
            data: json_value_data {
                stringval: core::ptr::null_mut(),
            },
        };
        assert_eq!(unsafe { to_value(&null) }, Value::String(""));
    }
}
