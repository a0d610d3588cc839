//! Lua interop: registering native functions and classes, reading arguments
//! and pushing results.
//!
//! Positions are 1-based Lua stack indices. Native functions return the
//! number of values they pushed.

use crate::handle::{Bitmap, LuaObject, Opaque, Sprite};

/// Type of a Lua stack slot (`LuaType`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LuaType {
    Nil = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    String = 4,
    Table = 5,
    Function = 6,
    Thread = 7,
    Object = 8,
}

impl LuaType {
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Bool,
            2 => Self::Int,
            3 => Self::Float,
            4 => Self::String,
            5 => Self::Table,
            6 => Self::Function,
            7 => Self::Thread,
            8 => Self::Object,
            _ => Self::Nil,
        }
    }
}

/// Error type for Lua operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LuaError {
    /// The firmware table lacks the entry point.
    Missing,
    /// Name or string contains a NUL byte or is too long.
    InvalidName,
    /// More methods than fit the registration buffer.
    TooManyMethods,
    /// Lua reported an error. The message is logged.
    Failed,
}

/// The `Lua` table.
pub trait Lua {
    /// A native function callable from Lua.
    type Function: Copy;

    /// Expose `f` as the global `name`, which may be dotted (`"game.tick"`).
    fn add_function(&self, f: Self::Function, name: &str) -> Result<(), LuaError>;

    /// Register a class with the given methods. Static classes have no
    /// instances.
    fn register_class(
        &self,
        name: &str,
        methods: &[(&str, Self::Function)],
        is_static: bool,
    ) -> Result<(), LuaError>;

    fn push_function(&self, f: Self::Function);

    /// For use inside an `__index` metamethod. Returns true if the key
    /// was found in the metatable and its value pushed.
    fn index_metatable(&self) -> bool;

    fn start(&self);

    fn stop(&self);

    fn arg_count(&self) -> i32;

    fn arg_type(&self, pos: i32) -> LuaType;

    fn arg_is_nil(&self, pos: i32) -> bool;

    fn arg_bool(&self, pos: i32) -> bool;

    fn arg_int(&self, pos: i32) -> i32;

    fn arg_float(&self, pos: i32) -> f32;

    fn arg_string(&self, pos: i32) -> Option<&str>;

    fn arg_bytes(&self, pos: i32) -> Option<&[u8]>;

    fn arg_bitmap(&self, pos: i32) -> Option<Bitmap>;

    fn arg_sprite(&self, pos: i32) -> Option<Sprite>;

    /// The native object pushed with [`push_object`](Self::push_object),
    /// if the argument is of class `type_name`.
    fn arg_object(&self, pos: i32, type_name: &str) -> Option<(Opaque, LuaObject)>;

    fn push_nil(&self);

    fn push_bool(&self, value: bool);

    fn push_int(&self, value: i32);

    fn push_float(&self, value: f32);

    fn push_string(&self, value: &str) -> Result<(), LuaError>;

    fn push_bytes(&self, value: &[u8]);

    fn push_bitmap(&self, bitmap: Bitmap);

    fn push_sprite(&self, sprite: Sprite);

    /// Wrap `object` in a Lua userdata of class `type_name` with room for
    /// `user_values` extra slots.
    fn push_object(
        &self,
        object: Opaque,
        type_name: &str,
        user_values: i32,
    ) -> Result<LuaObject, LuaError>;

    fn retain_object(&self, object: LuaObject) -> LuaObject;

    fn release_object(&self, object: LuaObject);

    /// Pop the top of the stack into the object's user value `slot`.
    fn set_user_value(&self, object: LuaObject, slot: u32);

    /// Push the object's user value `slot`.
    fn user_value(&self, object: LuaObject, slot: u32) -> LuaType;

    /// Call the global function `name` with the top `nargs` values.
    fn call_function(&self, name: &str, nargs: i32) -> Result<(), LuaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_from_raw() {
        assert_eq!(LuaType::from_raw(0), LuaType::Nil);
        assert_eq!(LuaType::from_raw(8), LuaType::Object);
        assert_eq!(LuaType::from_raw(42), LuaType::Nil);
    }
}
