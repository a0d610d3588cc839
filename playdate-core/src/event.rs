//! System events delivered to the application entry point.

/// Event passed to `eventHandler` together with its argument (`PDSystemEvent`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemEvent {
    /// First call after launch. The update callback must be set here.
    Init,
    /// Lua is ready for function registration.
    InitLua,
    Lock,
    Unlock,
    Pause,
    Resume,
    Terminate,
    /// Simulator keyboard key pressed.
    KeyPressed { keycode: u32 },
    /// Simulator keyboard key released.
    KeyReleased { keycode: u32 },
    LowPower,
}

impl SystemEvent {
    /// Decode the raw event number and argument.
    ///
    /// The argument is only meaningful for key events.
    #[must_use]
    pub const fn from_raw(event: u32, arg: u32) -> Option<Self> {
        Some(match event {
            0 => Self::Init,
            1 => Self::InitLua,
            2 => Self::Lock,
            3 => Self::Unlock,
            4 => Self::Pause,
            5 => Self::Resume,
            6 => Self::Terminate,
            7 => Self::KeyPressed { keycode: arg },
            8 => Self::KeyReleased { keycode: arg },
            9 => Self::LowPower,
            _ => return None,
        })
    }

    /// The raw event number.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Init => 0,
            Self::InitLua => 1,
            Self::Lock => 2,
            Self::Unlock => 3,
            Self::Pause => 4,
            Self::Resume => 5,
            Self::Terminate => 6,
            Self::KeyPressed { .. } => 7,
            Self::KeyReleased { .. } => 8,
            Self::LowPower => 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(SystemEvent::from_raw(0, 99), Some(SystemEvent::Init));
        assert_eq!(
            SystemEvent::from_raw(7, 0x41),
            Some(SystemEvent::KeyPressed { keycode: 0x41 })
        );
        assert_eq!(SystemEvent::from_raw(9, 0), Some(SystemEvent::LowPower));
        assert_eq!(SystemEvent::from_raw(10, 0), None);
    }

    #[test]
    fn test_raw_matches_from_raw() {
        for raw in 0..10 {
            let event = SystemEvent::from_raw(raw, 3).unwrap();
            assert_eq!(event.raw(), raw);
        }
    }
}
