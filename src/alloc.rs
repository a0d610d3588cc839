//! Global allocator over the firmware's `realloc`.
//!
//! The firmware heap hands out 8-byte aligned blocks. Larger alignments
//! are refused with a null pointer.

use core::alloc::{GlobalAlloc, Layout};
use core::ffi::c_void;
use core::ptr;

use crate::api::system_table;

/// Strictest alignment the firmware heap guarantees.
pub const MAX_ALIGN: usize = 8;

/// Allocates through `system->realloc`. Only usable once the entry point
/// has installed the system table; before that every allocation fails.
pub struct FirmwareAllocator;

impl FirmwareAllocator {
    fn realloc_raw(ptr: *mut u8, size: usize) -> *mut u8 {
        let Some(realloc) = system_table().and_then(|system| system.realloc) else {
            return ptr::null_mut();
        };
        // SAFETY: `ptr` is null or came from this allocator.
        unsafe { realloc(ptr.cast::<c_void>(), size) }.cast()
    }
}

unsafe impl GlobalAlloc for FirmwareAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > MAX_ALIGN {
            return ptr::null_mut();
        }
        Self::realloc_raw(ptr::null_mut(), layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        Self::realloc_raw(ptr, 0);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > MAX_ALIGN {
            return ptr::null_mut();
        }
        Self::realloc_raw(ptr, new_size)
    }
}

#[cfg(all(not(feature = "std"), not(test)))]
#[global_allocator]
static ALLOCATOR: FirmwareAllocator = FirmwareAllocator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overaligned_is_refused() {
        let layout = Layout::from_size_align(64, 16).unwrap();
        assert!(unsafe { FirmwareAllocator.alloc(layout) }.is_null());
        assert!(unsafe { FirmwareAllocator.realloc(ptr::null_mut(), layout, 128) }.is_null());
    }
}
