//! `playdate_lua`: Lua interop.

use core::ffi::{c_char, c_int, c_uint};

use crate::{LCDBitmap, LCDSprite, LuaUDObject, lua_State};

pub type lua_CFunction = unsafe extern "C" fn(l: *mut lua_State) -> c_int;

pub type LuaType = c_int;
pub const kTypeNil: LuaType = 0;
pub const kTypeBool: LuaType = 1;
pub const kTypeInt: LuaType = 2;
pub const kTypeFloat: LuaType = 3;
pub const kTypeString: LuaType = 4;
pub const kTypeTable: LuaType = 5;
pub const kTypeFunction: LuaType = 6;
pub const kTypeThread: LuaType = 7;
pub const kTypeObject: LuaType = 8;

pub type l_valtype = c_int;
pub const kInt: l_valtype = 0;
pub const kFloat: l_valtype = 1;
pub const kStr: l_valtype = 2;

/// One method of a registered class. The array ends with a null entry.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct lua_reg {
    pub name: *const c_char,
    pub func: Option<lua_CFunction>,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union lua_val_v {
    pub intval: c_uint,
    pub floatval: f32,
    pub strval: *const c_char,
}

/// One constant of a registered class. The array ends with a null name.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct lua_val {
    pub name: *const c_char,
    pub type_: l_valtype,
    pub v: lua_val_v,
}

#[repr(C)]
pub struct playdate_lua {
    pub addFunction: Option<
        unsafe extern "C" fn(
            f: Option<lua_CFunction>,
            name: *const c_char,
            out_err: *mut *const c_char,
        ) -> c_int,
    >,
    pub registerClass: Option<
        unsafe extern "C" fn(
            name: *const c_char,
            reg: *const lua_reg,
            vals: *const lua_val,
            isstatic: c_int,
            out_err: *mut *const c_char,
        ) -> c_int,
    >,
    pub pushFunction: Option<unsafe extern "C" fn(f: Option<lua_CFunction>)>,
    pub indexMetatable: Option<unsafe extern "C" fn() -> c_int>,
    pub stop: Option<unsafe extern "C" fn()>,
    pub start: Option<unsafe extern "C" fn()>,

    pub getArgCount: Option<unsafe extern "C" fn() -> c_int>,
    pub getArgType: Option<unsafe extern "C" fn(pos: c_int, out_class: *mut *const c_char) -> LuaType>,
    pub argIsNil: Option<unsafe extern "C" fn(pos: c_int) -> c_int>,
    pub getArgBool: Option<unsafe extern "C" fn(pos: c_int) -> c_int>,
    pub getArgInt: Option<unsafe extern "C" fn(pos: c_int) -> c_int>,
    pub getArgFloat: Option<unsafe extern "C" fn(pos: c_int) -> f32>,
    pub getArgString: Option<unsafe extern "C" fn(pos: c_int) -> *const c_char>,
    pub getArgBytes: Option<unsafe extern "C" fn(pos: c_int, outlen: *mut usize) -> *const c_char>,
    pub getArgObject: Option<
        unsafe extern "C" fn(
            pos: c_int,
            type_: *mut c_char,
            outud: *mut *mut LuaUDObject,
        ) -> *mut core::ffi::c_void,
    >,
    pub getBitmap: Option<unsafe extern "C" fn(pos: c_int) -> *mut LCDBitmap>,
    pub getSprite: Option<unsafe extern "C" fn(pos: c_int) -> *mut LCDSprite>,

    pub pushNil: Option<unsafe extern "C" fn()>,
    pub pushBool: Option<unsafe extern "C" fn(val: c_int)>,
    pub pushInt: Option<unsafe extern "C" fn(val: c_int)>,
    pub pushFloat: Option<unsafe extern "C" fn(val: f32)>,
    pub pushString: Option<unsafe extern "C" fn(str_: *const c_char)>,
    pub pushBytes: Option<unsafe extern "C" fn(str_: *const c_char, len: usize)>,
    pub pushBitmap: Option<unsafe extern "C" fn(bitmap: *mut LCDBitmap)>,
    pub pushSprite: Option<unsafe extern "C" fn(sprite: *mut LCDSprite)>,

    pub pushObject: Option<
        unsafe extern "C" fn(
            obj: *mut core::ffi::c_void,
            type_: *mut c_char,
            n_values: c_int,
        ) -> *mut LuaUDObject,
    >,
    pub retainObject: Option<unsafe extern "C" fn(obj: *mut LuaUDObject) -> *mut LuaUDObject>,
    pub releaseObject: Option<unsafe extern "C" fn(obj: *mut LuaUDObject)>,

    pub setUserValue: Option<unsafe extern "C" fn(obj: *mut LuaUDObject, slot: c_uint)>,
    pub getUserValue: Option<unsafe extern "C" fn(obj: *mut LuaUDObject, slot: c_uint) -> c_int>,

    pub callFunction_deprecated: Option<unsafe extern "C" fn(name: *const c_char, nargs: c_int)>,
    pub callFunction: Option<
        unsafe extern "C" fn(name: *const c_char, nargs: c_int, outerr: *mut *const c_char) -> c_int,
    >,
}
