use core::ffi::{c_char, c_int};

use ::playdate_sys as sys;
use playdate_core::handle::{Bitmap, LuaObject, Opaque, Sprite};
use playdate_core::lua::{Lua, LuaError, LuaType};
use sys::{lua_CFunction, lua_reg, lua_val, lua_val_v, playdate_lua};

use crate::ffi::{borrow_str, flag, invoke, CStrBuf, Name, RawHandle};

/// Methods accepted by one [`Lua::register_class`] call.
pub const MAX_METHODS: usize = 32;

type MethodName = CStrBuf<64>;

fn name(text: &str) -> Result<Name, LuaError> {
    Name::new(text).ok_or(LuaError::InvalidName)
}

/// Map a firmware status (non-zero on success) and its error message.
fn status(what: &str, result: Option<c_int>, err: *const c_char) -> Result<(), LuaError> {
    match result {
        None => Err(LuaError::Missing),
        Some(0) => {
            // SAFETY: the firmware sets `outerr` to null or a message that
            // lives until the next call.
            match unsafe { borrow_str(err) } {
                Some(reason) => log::error!("{}: {}", what, reason),
                None => log::error!("{} failed", what),
            }
            Err(LuaError::Failed)
        }
        Some(_) => Ok(()),
    }
}

/// [`Lua`] over `playdate_lua`.
///
/// Native functions are plain `lua_CFunction`s. Inside one, the argument
/// and push calls below act on the stack of the running call.
#[derive(Clone, Copy)]
pub struct DeviceLua {
    table: &'static playdate_lua,
}

impl DeviceLua {
    pub(crate) fn new(table: &'static playdate_lua) -> Self {
        Self { table }
    }
}

impl Lua for DeviceLua {
    type Function = lua_CFunction;

    fn add_function(&self, f: lua_CFunction, name: &str) -> Result<(), LuaError> {
        let mut lua_name = self::name(name)?;
        let mut err = core::ptr::null();
        let result = invoke!(self.table, addFunction(Some(f), lua_name.as_ptr(), &mut err));
        status(name, result, err)
    }

    fn register_class(
        &self,
        name: &str,
        methods: &[(&str, lua_CFunction)],
        is_static: bool,
    ) -> Result<(), LuaError> {
        if methods.len() > MAX_METHODS {
            return Err(LuaError::TooManyMethods);
        }
        let mut class = self::name(name)?;
        let mut names: heapless::Vec<MethodName, MAX_METHODS> = heapless::Vec::new();
        for (method, _) in methods {
            let method = MethodName::new(method).ok_or(LuaError::InvalidName)?;
            names.push(method).map_err(|_| LuaError::TooManyMethods)?;
        }

        let mut reg: heapless::Vec<lua_reg, { MAX_METHODS + 1 }> = heapless::Vec::new();
        for (method, (_, f)) in names.iter_mut().zip(methods) {
            let entry = lua_reg {
                name: method.as_ptr(),
                func: Some(*f),
            };
            reg.push(entry).map_err(|_| LuaError::TooManyMethods)?;
        }
        let end = lua_reg {
            name: core::ptr::null(),
            func: None,
        };
        reg.push(end).map_err(|_| LuaError::TooManyMethods)?;
        let vals = [lua_val {
            name: core::ptr::null(),
            type_: sys::kInt,
            v: lua_val_v { intval: 0 },
        }];

        let mut err = core::ptr::null();
        let result = invoke!(
            self.table,
            registerClass(
                class.as_ptr(),
                reg.as_ptr(),
                vals.as_ptr(),
                flag(is_static),
                &mut err,
            )
        );
        status(name, result, err)
    }

    fn push_function(&self, f: lua_CFunction) {
        invoke!(self.table, pushFunction(Some(f)));
    }

    fn index_metatable(&self) -> bool {
        invoke!(self.table, indexMetatable()).is_some_and(|found| found != 0)
    }

    fn start(&self) {
        invoke!(self.table, start());
    }

    fn stop(&self) {
        invoke!(self.table, stop());
    }

    fn arg_count(&self) -> i32 {
        invoke!(self.table, getArgCount()).unwrap_or_default()
    }

    fn arg_type(&self, pos: i32) -> LuaType {
        let mut class = core::ptr::null();
        invoke!(self.table, getArgType(pos, &mut class)).map_or(LuaType::Nil, LuaType::from_raw)
    }

    fn arg_is_nil(&self, pos: i32) -> bool {
        invoke!(self.table, argIsNil(pos)).map_or(true, |nil| nil != 0)
    }

    fn arg_bool(&self, pos: i32) -> bool {
        invoke!(self.table, getArgBool(pos)).is_some_and(|v| v != 0)
    }

    fn arg_int(&self, pos: i32) -> i32 {
        invoke!(self.table, getArgInt(pos)).unwrap_or_default()
    }

    fn arg_float(&self, pos: i32) -> f32 {
        invoke!(self.table, getArgFloat(pos)).unwrap_or_default()
    }

    fn arg_string(&self, pos: i32) -> Option<&str> {
        let text = invoke!(self.table, getArgString(pos))?;
        // SAFETY: Lua keeps argument strings alive for the running call.
        unsafe { borrow_str(text) }
    }

    fn arg_bytes(&self, pos: i32) -> Option<&[u8]> {
        let mut len = 0;
        let bytes = invoke!(self.table, getArgBytes(pos, &mut len))?;
        if bytes.is_null() {
            return None;
        }
        // SAFETY: `len` bytes owned by Lua for the running call.
        Some(unsafe { core::slice::from_raw_parts(bytes.cast::<u8>(), len) })
    }

    fn arg_bitmap(&self, pos: i32) -> Option<Bitmap> {
        Bitmap::from_ptr(invoke!(self.table, getBitmap(pos))?)
    }

    fn arg_sprite(&self, pos: i32) -> Option<Sprite> {
        Sprite::from_ptr(invoke!(self.table, getSprite(pos))?)
    }

    fn arg_object(&self, pos: i32, type_name: &str) -> Option<(Opaque, LuaObject)> {
        let mut class = Name::new(type_name)?;
        let mut ud = core::ptr::null_mut();
        let object = invoke!(
            self.table,
            getArgObject(pos, class.as_ptr().cast_mut(), &mut ud)
        )?;
        Some((Opaque::from_ptr(object)?, LuaObject::from_ptr(ud)?))
    }

    fn push_nil(&self) {
        invoke!(self.table, pushNil());
    }

    fn push_bool(&self, value: bool) {
        invoke!(self.table, pushBool(flag(value)));
    }

    fn push_int(&self, value: i32) {
        invoke!(self.table, pushInt(value));
    }

    fn push_float(&self, value: f32) {
        invoke!(self.table, pushFloat(value));
    }

    fn push_string(&self, value: &str) -> Result<(), LuaError> {
        // Lua strings are byte strings; text that does not fit a C string
        // goes through pushBytes.
        let pushed = match Name::new(value) {
            Some(mut text) => invoke!(self.table, pushString(text.as_ptr())),
            None => invoke!(self.table, pushBytes(value.as_ptr().cast(), value.len())),
        };
        pushed.ok_or(LuaError::Missing)
    }

    fn push_bytes(&self, value: &[u8]) {
        invoke!(self.table, pushBytes(value.as_ptr().cast(), value.len()));
    }

    fn push_bitmap(&self, bitmap: Bitmap) {
        invoke!(self.table, pushBitmap(bitmap.as_ptr()));
    }

    fn push_sprite(&self, sprite: Sprite) {
        invoke!(self.table, pushSprite(sprite.as_ptr()));
    }

    fn push_object(
        &self,
        object: Opaque,
        type_name: &str,
        user_values: i32,
    ) -> Result<LuaObject, LuaError> {
        let mut class = name(type_name)?;
        let ud = invoke!(
            self.table,
            pushObject(object.as_ptr(), class.as_ptr().cast_mut(), user_values)
        )
        .ok_or(LuaError::Missing)?;
        LuaObject::from_ptr(ud).ok_or(LuaError::Failed)
    }

    fn retain_object(&self, object: LuaObject) -> LuaObject {
        invoke!(self.table, retainObject(object.as_ptr()))
            .and_then(LuaObject::from_ptr)
            .unwrap_or(object)
    }

    fn release_object(&self, object: LuaObject) {
        invoke!(self.table, releaseObject(object.as_ptr()));
    }

    fn set_user_value(&self, object: LuaObject, slot: u32) {
        invoke!(self.table, setUserValue(object.as_ptr(), slot));
    }

    fn user_value(&self, object: LuaObject, slot: u32) -> LuaType {
        invoke!(self.table, getUserValue(object.as_ptr(), slot))
            .map_or(LuaType::Nil, LuaType::from_raw)
    }

    fn call_function(&self, name: &str, nargs: i32) -> Result<(), LuaError> {
        let mut function = self::name(name)?;
        let mut err = core::ptr::null();
        let result = invoke!(self.table, callFunction(function.as_ptr(), nargs, &mut err));
        status(name, result, err)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::RefCell;
    use core::ffi::CStr;
    use std::boxed::Box;
    use std::string::{String, ToString};
    use std::vec::Vec;

    std::thread_local! {
        static CLASS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
        static PUSHED: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
    }

    const NO_SUCH: &[u8] = b"no such function\0";

    unsafe extern "C" fn native(_l: *mut sys::lua_State) -> c_int {
        0
    }

    unsafe extern "C" fn register_class(
        name: *const c_char,
        reg: *const lua_reg,
        vals: *const lua_val,
        isstatic: c_int,
        _out_err: *mut *const c_char,
    ) -> c_int {
        let mut seen = std::vec![unsafe { CStr::from_ptr(name) }.to_str().unwrap().to_string()];
        let mut i = 0;
        loop {
            let entry = unsafe { *reg.add(i) };
            if entry.name.is_null() {
                assert!(entry.func.is_none());
                break;
            }
            assert!(entry.func.is_some());
            seen.push(unsafe { CStr::from_ptr(entry.name) }.to_str().unwrap().to_string());
            i += 1;
        }
        assert!(unsafe { (*vals).name }.is_null());
        assert_eq!(isstatic, 1);
        CLASS.with(|c| *c.borrow_mut() = seen);
        1
    }

    unsafe extern "C" fn call_function(
        _name: *const c_char,
        _nargs: c_int,
        outerr: *mut *const c_char,
    ) -> c_int {
        unsafe { *outerr = NO_SUCH.as_ptr().cast() };
        0
    }

    unsafe extern "C" fn push_string(text: *const c_char) {
        let text = unsafe { CStr::from_ptr(text) }.to_bytes().to_vec();
        PUSHED.with(|p| p.borrow_mut().push(text));
    }

    unsafe extern "C" fn push_bytes(text: *const c_char, len: usize) {
        let text = unsafe { core::slice::from_raw_parts(text.cast::<u8>(), len) }.to_vec();
        PUSHED.with(|p| p.borrow_mut().push(text));
    }

    fn lua() -> DeviceLua {
        // SAFETY: every field is an optional function pointer; zero is None.
        let mut table: playdate_lua = unsafe { core::mem::zeroed() };
        table.registerClass = Some(register_class);
        table.callFunction = Some(call_function);
        table.pushString = Some(push_string);
        table.pushBytes = Some(push_bytes);
        DeviceLua::new(Box::leak(Box::new(table)))
    }

    #[test]
    fn test_register_class() {
        let lua = lua();
        let f: lua_CFunction = native;
        lua.register_class("vec", &[("add", f), ("len", f)], true)
            .unwrap();
        CLASS.with(|c| assert_eq!(*c.borrow(), ["vec", "add", "len"]));

        let many = [("m", f); MAX_METHODS + 1];
        assert_eq!(
            lua.register_class("big", &many, false),
            Err(LuaError::TooManyMethods)
        );
        assert_eq!(
            lua.register_class("bad\0", &[], false),
            Err(LuaError::InvalidName)
        );
    }

    #[test]
    fn test_call_function_failure() {
        assert_eq!(lua().call_function("missing", 0), Err(LuaError::Failed));
    }

    #[test]
    fn test_push_string_falls_back_to_bytes() {
        let lua = lua();
        lua.push_string("score").unwrap();
        lua.push_string("a\0b").unwrap();
        PUSHED.with(|p| assert_eq!(*p.borrow(), [&b"score"[..], b"a\0b"]));
        assert_eq!(lua.add_function(native, "f"), Err(LuaError::Missing));
    }
}
