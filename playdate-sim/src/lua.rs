//! A tiny stand-in for the Lua runtime.
//!
//! There is no interpreter. Native functions are plain `fn(&SimLua) -> i32`
//! and are called directly by [`SimLua::invoke`] or through
//! [`Lua::call_function`]. Each call gets its own argument frame; values a
//! function pushes are returned to the caller.
//!
//! Strings and byte strings handed to the stack are leaked so that argument
//! accessors can lend them out for the rest of the process.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use playdate_core::handle::{Bitmap, LuaObject, Opaque, Sprite};
use playdate_core::lua::{Lua, LuaError, LuaType};

pub type NativeFn = fn(&SimLua) -> i32;

/// One slot of the Lua stack.
#[derive(Clone, Copy, Debug)]
pub enum LuaSlot {
    Nil,
    Bool(bool),
    Int(i32),
    Float(f32),
    String(&'static str),
    Bytes(&'static [u8]),
    Bitmap(Bitmap),
    Sprite(Sprite),
    Object(LuaObject),
    Function(NativeFn),
}

impl LuaSlot {
    pub fn string(value: &str) -> Self {
        Self::String(Box::leak(value.into()))
    }

    pub fn bytes(value: &[u8]) -> Self {
        Self::Bytes(Box::leak(value.into()))
    }

    pub fn lua_type(&self) -> LuaType {
        match self {
            Self::Nil => LuaType::Nil,
            Self::Bool(_) => LuaType::Bool,
            Self::Int(_) => LuaType::Int,
            Self::Float(_) => LuaType::Float,
            Self::String(_) | Self::Bytes(_) => LuaType::String,
            Self::Bitmap(_) | Self::Sprite(_) | Self::Object(_) => LuaType::Object,
            Self::Function(_) => LuaType::Function,
        }
    }
}

struct Object {
    data: Opaque,
    class: String,
    refs: u32,
    user_values: Vec<LuaSlot>,
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('\0')
}

/// Host [`Lua`].
pub struct SimLua {
    running: Cell<bool>,
    globals: RefCell<BTreeMap<String, NativeFn>>,
    classes: RefCell<BTreeMap<String, (Vec<(String, NativeFn)>, bool)>>,
    args: RefCell<Vec<LuaSlot>>,
    stack: RefCell<Vec<LuaSlot>>,
    objects: RefCell<BTreeMap<LuaObject, Object>>,
    next_object: Cell<usize>,
}

impl Default for SimLua {
    fn default() -> Self {
        Self {
            running: Cell::new(false),
            globals: RefCell::new(BTreeMap::new()),
            classes: RefCell::new(BTreeMap::new()),
            args: RefCell::new(Vec::new()),
            stack: RefCell::new(Vec::new()),
            objects: RefCell::new(BTreeMap::new()),
            next_object: Cell::new(1),
        }
    }
}

impl SimLua {
    /// Call `f` with `args` and return what it pushed.
    pub fn invoke(&self, f: NativeFn, args: &[LuaSlot]) -> Vec<LuaSlot> {
        let saved = self.args.replace(args.to_vec());
        let base = self.stack.borrow().len();
        let count = f(self).max(0) as usize;
        self.args.replace(saved);
        let mut stack = self.stack.borrow_mut();
        let at = base.min(stack.len());
        let results = stack.split_off(at);
        if results.len() != count {
            log::warn!("native function pushed {} values, returned {}", results.len(), count);
        }
        results
    }

    pub fn global(&self, name: &str) -> Option<NativeFn> {
        self.globals.borrow().get(name).copied()
    }

    /// Method `method` of class `class`.
    pub fn method(&self, class: &str, method: &str) -> Option<NativeFn> {
        self.classes
            .borrow()
            .get(class)
            .and_then(|(methods, _)| methods.iter().find(|(name, _)| name == method))
            .map(|(_, f)| *f)
    }

    pub fn is_static_class(&self, class: &str) -> Option<bool> {
        self.classes.borrow().get(class).map(|(_, is_static)| *is_static)
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Reference count of a live object.
    pub fn object_refs(&self, object: LuaObject) -> Option<u32> {
        self.objects.borrow().get(&object).map(|o| o.refs)
    }

    /// Values pushed outside of any call.
    pub fn take_stack(&self) -> Vec<LuaSlot> {
        self.stack.take()
    }

    fn arg(&self, pos: i32) -> LuaSlot {
        let args = self.args.borrow();
        usize::try_from(pos)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .and_then(|p| args.get(p).copied())
            .unwrap_or(LuaSlot::Nil)
    }

    fn push(&self, slot: LuaSlot) {
        self.stack.borrow_mut().push(slot);
    }
}

impl Lua for SimLua {
    type Function = NativeFn;

    fn add_function(&self, f: NativeFn, name: &str) -> Result<(), LuaError> {
        if !valid_name(name) {
            return Err(LuaError::InvalidName);
        }
        self.globals.borrow_mut().insert(name.into(), f);
        Ok(())
    }

    fn register_class(
        &self,
        name: &str,
        methods: &[(&str, NativeFn)],
        is_static: bool,
    ) -> Result<(), LuaError> {
        if !valid_name(name) || !methods.iter().all(|(m, _)| valid_name(m)) {
            return Err(LuaError::InvalidName);
        }
        let methods = methods.iter().map(|(m, f)| ((*m).into(), *f)).collect();
        self.classes.borrow_mut().insert(name.into(), (methods, is_static));
        Ok(())
    }

    fn push_function(&self, f: NativeFn) {
        self.push(LuaSlot::Function(f));
    }

    fn index_metatable(&self) -> bool {
        let (LuaSlot::Object(object), LuaSlot::String(key)) = (self.arg(1), self.arg(2)) else {
            return false;
        };
        let class = match self.objects.borrow().get(&object) {
            Some(o) => o.class.clone(),
            None => return false,
        };
        match self.method(&class, key) {
            Some(f) => {
                self.push_function(f);
                true
            }
            None => false,
        }
    }

    fn start(&self) {
        self.running.set(true);
    }

    fn stop(&self) {
        self.running.set(false);
    }

    fn arg_count(&self) -> i32 {
        self.args.borrow().len() as i32
    }

    fn arg_type(&self, pos: i32) -> LuaType {
        self.arg(pos).lua_type()
    }

    fn arg_is_nil(&self, pos: i32) -> bool {
        matches!(self.arg(pos), LuaSlot::Nil)
    }

    fn arg_bool(&self, pos: i32) -> bool {
        !matches!(self.arg(pos), LuaSlot::Nil | LuaSlot::Bool(false))
    }

    fn arg_int(&self, pos: i32) -> i32 {
        match self.arg(pos) {
            LuaSlot::Int(v) => v,
            LuaSlot::Float(v) => v as i32,
            _ => 0,
        }
    }

    fn arg_float(&self, pos: i32) -> f32 {
        match self.arg(pos) {
            LuaSlot::Int(v) => v as f32,
            LuaSlot::Float(v) => v,
            _ => 0.0,
        }
    }

    fn arg_string(&self, pos: i32) -> Option<&str> {
        match self.arg(pos) {
            LuaSlot::String(s) => Some(s),
            LuaSlot::Bytes(b) => core::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    fn arg_bytes(&self, pos: i32) -> Option<&[u8]> {
        match self.arg(pos) {
            LuaSlot::String(s) => Some(s.as_bytes()),
            LuaSlot::Bytes(b) => Some(b),
            _ => None,
        }
    }

    fn arg_bitmap(&self, pos: i32) -> Option<Bitmap> {
        match self.arg(pos) {
            LuaSlot::Bitmap(b) => Some(b),
            _ => None,
        }
    }

    fn arg_sprite(&self, pos: i32) -> Option<Sprite> {
        match self.arg(pos) {
            LuaSlot::Sprite(s) => Some(s),
            _ => None,
        }
    }

    fn arg_object(&self, pos: i32, type_name: &str) -> Option<(Opaque, LuaObject)> {
        let LuaSlot::Object(object) = self.arg(pos) else {
            return None;
        };
        let objects = self.objects.borrow();
        let o = objects.get(&object)?;
        (o.class == type_name).then_some((o.data, object))
    }

    fn push_nil(&self) {
        self.push(LuaSlot::Nil);
    }

    fn push_bool(&self, value: bool) {
        self.push(LuaSlot::Bool(value));
    }

    fn push_int(&self, value: i32) {
        self.push(LuaSlot::Int(value));
    }

    fn push_float(&self, value: f32) {
        self.push(LuaSlot::Float(value));
    }

    fn push_string(&self, value: &str) -> Result<(), LuaError> {
        if value.contains('\0') {
            return Err(LuaError::InvalidName);
        }
        self.push(LuaSlot::string(value));
        Ok(())
    }

    fn push_bytes(&self, value: &[u8]) {
        self.push(LuaSlot::bytes(value));
    }

    fn push_bitmap(&self, bitmap: Bitmap) {
        self.push(LuaSlot::Bitmap(bitmap));
    }

    fn push_sprite(&self, sprite: Sprite) {
        self.push(LuaSlot::Sprite(sprite));
    }

    fn push_object(
        &self,
        object: Opaque,
        type_name: &str,
        user_values: i32,
    ) -> Result<LuaObject, LuaError> {
        if !valid_name(type_name) {
            return Err(LuaError::InvalidName);
        }
        if !self.classes.borrow().contains_key(type_name) {
            log::error!("push_object: class {} is not registered", type_name);
            return Err(LuaError::Failed);
        }
        let raw = self.next_object.get();
        self.next_object.set(raw + 1);
        let handle = LuaObject::from_raw(raw).ok_or(LuaError::Failed)?;
        self.objects.borrow_mut().insert(
            handle,
            Object {
                data: object,
                class: type_name.into(),
                refs: 1,
                user_values: vec![LuaSlot::Nil; user_values.max(0) as usize],
            },
        );
        self.push(LuaSlot::Object(handle));
        Ok(handle)
    }

    fn retain_object(&self, object: LuaObject) -> LuaObject {
        if let Some(o) = self.objects.borrow_mut().get_mut(&object) {
            o.refs += 1;
        }
        object
    }

    fn release_object(&self, object: LuaObject) {
        let mut objects = self.objects.borrow_mut();
        let Some(o) = objects.get_mut(&object) else {
            return;
        };
        o.refs = o.refs.saturating_sub(1);
        if o.refs == 0 {
            objects.remove(&object);
        }
    }

    fn set_user_value(&self, object: LuaObject, slot: u32) {
        let value = self.stack.borrow_mut().pop().unwrap_or(LuaSlot::Nil);
        let mut objects = self.objects.borrow_mut();
        let target = objects
            .get_mut(&object)
            .zip((slot as usize).checked_sub(1))
            .and_then(|(o, i)| o.user_values.get_mut(i));
        match target {
            Some(v) => *v = value,
            None => log::warn!("set_user_value: no slot {}", slot),
        }
    }

    fn user_value(&self, object: LuaObject, slot: u32) -> LuaType {
        let value = self
            .objects
            .borrow()
            .get(&object)
            .zip((slot as usize).checked_sub(1))
            .and_then(|(o, i)| o.user_values.get(i).copied())
            .unwrap_or(LuaSlot::Nil);
        self.push(value);
        value.lua_type()
    }

    fn call_function(&self, name: &str, nargs: i32) -> Result<(), LuaError> {
        let args = {
            let mut stack = self.stack.borrow_mut();
            let at = stack.len().saturating_sub(nargs.max(0) as usize);
            stack.split_off(at)
        };
        let Some(f) = self.global(name) else {
            log::error!("call_function: {} is not a function", name);
            return Err(LuaError::Failed);
        };
        self.invoke(f, &args);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(lua: &SimLua) -> i32 {
        lua.push_int(lua.arg_int(1) + lua.arg_int(2));
        1
    }

    fn describe(lua: &SimLua) -> i32 {
        let text = format!(
            "{}:{:?}:{}",
            lua.arg_count(),
            lua.arg_type(1),
            lua.arg_string(1).unwrap_or("-")
        );
        lua.push_string(&text).unwrap();
        1
    }

    fn forward(lua: &SimLua) -> i32 {
        lua.push_int(40);
        lua.push_int(2);
        lua.call_function("add", 2).unwrap();
        0
    }

    #[test]
    fn test_invoke_reads_args() {
        let lua = SimLua::default();
        let out = lua.invoke(add, &[LuaSlot::Int(2), LuaSlot::Float(3.9)]);
        assert!(matches!(out[..], [LuaSlot::Int(5)]));

        let out = lua.invoke(describe, &[LuaSlot::string("hi")]);
        assert!(matches!(out[..], [LuaSlot::String("1:String:hi")]));
        let out = lua.invoke(describe, &[]);
        assert!(matches!(out[..], [LuaSlot::String("0:Nil:-")]));
    }

    #[test]
    fn test_truthiness() {
        let lua = SimLua::default();
        fn truthy(lua: &SimLua) -> i32 {
            lua.push_bool(lua.arg_bool(1));
            1
        }
        for (arg, expected) in [
            (LuaSlot::Nil, false),
            (LuaSlot::Bool(false), false),
            (LuaSlot::Int(0), true),
            (LuaSlot::string(""), true),
        ] {
            let out = lua.invoke(truthy, &[arg]);
            assert!(matches!(out[..], [LuaSlot::Bool(b)] if b == expected));
        }
    }

    #[test]
    fn test_globals_and_nested_calls() {
        let lua = SimLua::default();
        assert_eq!(lua.add_function(add, "a\0b"), Err(LuaError::InvalidName));
        lua.add_function(add, "add").unwrap();
        assert!(lua.invoke(forward, &[]).is_empty());
        assert_eq!(lua.call_function("missing", 0), Err(LuaError::Failed));
    }

    #[test]
    fn test_objects() {
        let lua = SimLua::default();
        let data = Opaque::from_raw(0x1000).unwrap();
        assert_eq!(lua.push_object(data, "Enemy", 1), Err(LuaError::Failed));

        lua.register_class("Enemy", &[("add", add)], false).unwrap();
        assert_eq!(lua.is_static_class("Enemy"), Some(false));
        let object = lua.push_object(data, "Enemy", 1).unwrap();
        lua.push_int(7);
        lua.set_user_value(object, 1);
        assert!(matches!(lua.take_stack()[..], [LuaSlot::Object(o)] if o == object));
        assert_eq!(lua.user_value(object, 1), LuaType::Int);
        assert_eq!(lua.user_value(object, 2), LuaType::Nil);
        lua.take_stack();

        fn lookup(lua: &SimLua) -> i32 {
            i32::from(lua.index_metatable())
        }
        let out = lua.invoke(lookup, &[LuaSlot::Object(object), LuaSlot::string("add")]);
        assert!(matches!(out[..], [LuaSlot::Function(_)]));

        fn unwrap_enemy(lua: &SimLua) -> i32 {
            lua.push_bool(lua.arg_object(1, "Enemy").is_some());
            lua.push_bool(lua.arg_object(1, "Player").is_some());
            2
        }
        let out = lua.invoke(unwrap_enemy, &[LuaSlot::Object(object)]);
        assert!(matches!(out[..], [LuaSlot::Bool(true), LuaSlot::Bool(false)]));

        lua.retain_object(object);
        assert_eq!(lua.object_refs(object), Some(2));
        lua.release_object(object);
        lua.release_object(object);
        assert_eq!(lua.object_refs(object), None);
    }

    #[test]
    fn test_start_stop() {
        let lua = SimLua::default();
        lua.start();
        assert!(lua.is_running());
        lua.stop();
        assert!(!lua.is_running());
    }
}
