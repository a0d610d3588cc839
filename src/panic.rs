//! Panic handler that reports through `system->error`.

use core::fmt::Write;
use core::panic::PanicInfo;

use crate::ffi::CStrBuf;
use crate::logger::LINE_CAPACITY;

/// Format a panic as one console line.
pub fn format_panic(info: &PanicInfo<'_>, line: &mut CStrBuf<LINE_CAPACITY>) {
    line.clear();
    let _ = match info.location() {
        Some(at) => write!(line, "panic at {}:{}: {}", at.file(), at.line(), info.message()),
        None => write!(line, "panic: {}", info.message()),
    };
}

#[cfg(all(not(feature = "std"), not(test)))]
#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    use crate::api::system_table;
    use crate::logger::emit;

    if let Some(system) = system_table() {
        let mut line = CStrBuf::default();
        format_panic(info, &mut line);
        // `error` stops the game and shows the message on screen.
        emit(system, &mut line, true);
    }
    loop {
        core::hint::spin_loop();
    }
}
