//! `playdate_json`: callback-driven decoder and encoder.

use core::ffi::{c_char, c_int, c_void};

pub type json_value_type = c_int;
pub const kJSONNull: json_value_type = 0;
pub const kJSONTrue: json_value_type = 1;
pub const kJSONFalse: json_value_type = 2;
pub const kJSONInteger: json_value_type = 3;
pub const kJSONFloat: json_value_type = 4;
pub const kJSONString: json_value_type = 5;
pub const kJSONArray: json_value_type = 6;
pub const kJSONTable: json_value_type = 7;

#[repr(C)]
#[derive(Clone, Copy)]
pub union json_value_data {
    pub intval: c_int,
    pub floatval: f32,
    pub stringval: *mut c_char,
    pub arrayval: *mut c_void,
    pub tableval: *mut c_void,
}

/// Tag in `type_` (a `json_value_type` stored in a `char`), payload in `data`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct json_value {
    pub type_: c_char,
    pub data: json_value_data,
}

pub type json_readFunc =
    unsafe extern "C" fn(userdata: *mut c_void, buf: *mut u8, bufsize: c_int) -> c_int;

pub type json_writeFunc = unsafe extern "C" fn(userdata: *mut c_void, str_: *const c_char, len: c_int);

#[repr(C)]
#[derive(Clone, Copy)]
pub struct json_reader {
    pub read: Option<json_readFunc>,
    pub userdata: *mut c_void,
}

#[repr(C)]
pub struct json_decoder {
    pub decodeError:
        Option<unsafe extern "C" fn(decoder: *mut json_decoder, error: *const c_char, linenum: c_int)>,
    pub willDecodeSublist: Option<
        unsafe extern "C" fn(decoder: *mut json_decoder, name: *const c_char, type_: json_value_type),
    >,
    pub shouldDecodeTableValueForKey:
        Option<unsafe extern "C" fn(decoder: *mut json_decoder, key: *const c_char) -> c_int>,
    pub didDecodeTableValue: Option<
        unsafe extern "C" fn(decoder: *mut json_decoder, key: *const c_char, value: json_value),
    >,
    pub shouldDecodeArrayValueAtIndex:
        Option<unsafe extern "C" fn(decoder: *mut json_decoder, pos: c_int) -> c_int>,
    pub didDecodeArrayValue:
        Option<unsafe extern "C" fn(decoder: *mut json_decoder, pos: c_int, value: json_value)>,
    pub didDecodeSublist: Option<
        unsafe extern "C" fn(
            decoder: *mut json_decoder,
            name: *const c_char,
            type_: json_value_type,
        ) -> *mut c_void,
    >,
    pub userdata: *mut c_void,
    /// Non-zero returns the current sublist as a string instead of decoding it.
    pub returnString: c_int,
    /// Path of the current value, maintained by the firmware.
    pub path: *const c_char,
}

#[repr(C)]
pub struct json_encoder {
    pub writeStringFunc: Option<json_writeFunc>,
    pub userdata: *mut c_void,
    /// Bitfield: pretty:1, startedTable:1, startedArray:1, depth:29.
    pub flags: u32,

    pub startArray: Option<unsafe extern "C" fn(encoder: *mut json_encoder)>,
    pub addArrayMember: Option<unsafe extern "C" fn(encoder: *mut json_encoder)>,
    pub endArray: Option<unsafe extern "C" fn(encoder: *mut json_encoder)>,
    pub startTable: Option<unsafe extern "C" fn(encoder: *mut json_encoder)>,
    pub addTableMember:
        Option<unsafe extern "C" fn(encoder: *mut json_encoder, name: *const c_char, len: c_int)>,
    pub endTable: Option<unsafe extern "C" fn(encoder: *mut json_encoder)>,
    pub writeNull: Option<unsafe extern "C" fn(encoder: *mut json_encoder)>,
    pub writeFalse: Option<unsafe extern "C" fn(encoder: *mut json_encoder)>,
    pub writeTrue: Option<unsafe extern "C" fn(encoder: *mut json_encoder)>,
    pub writeInt: Option<unsafe extern "C" fn(encoder: *mut json_encoder, num: c_int)>,
    pub writeDouble: Option<unsafe extern "C" fn(encoder: *mut json_encoder, num: f64)>,
    pub writeString:
        Option<unsafe extern "C" fn(encoder: *mut json_encoder, str_: *const c_char, len: c_int)>,
}

#[repr(C)]
pub struct playdate_json {
    pub initEncoder: Option<
        unsafe extern "C" fn(
            encoder: *mut json_encoder,
            write: Option<json_writeFunc>,
            userdata: *mut c_void,
            pretty: c_int,
        ),
    >,
    pub decode: Option<
        unsafe extern "C" fn(
            functions: *mut json_decoder,
            reader: json_reader,
            outval: *mut json_value,
        ) -> c_int,
    >,
    pub decodeString: Option<
        unsafe extern "C" fn(
            functions: *mut json_decoder,
            json_string: *const c_char,
            outval: *mut json_value,
        ) -> c_int,
    >,
}
