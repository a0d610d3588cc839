use playdate_core::config::{DisplayConfig, RunnerConfig, DEFAULT_DISPLAY, DEFAULT_RUNNER_CONFIG};
use playdate_core::{
    Buttons, Color, Display, FileOptions, FileSystem, Game, Graphics, Peripherals, Playdate, Rect,
    Runner, RunnerError, System, SystemEvent,
};
use playdate_sim::{DrawCall, Sim};

struct Paddle {
    x: i32,
    events: Vec<SystemEvent>,
}

impl Game for Paddle {
    const CONFIG: RunnerConfig = RunnerConfig {
        peripherals: Peripherals::ACCELEROMETER,
        fps_overlay: Some((2, 2)),
        auto_lock_disabled: true,
        crank_sounds_disabled: false,
        display: DisplayConfig {
            scale: 2,
            refresh_rate: 50.0,
            ..DEFAULT_DISPLAY
        },
    };

    type Error = ();

    fn init<P: Playdate>(pd: &P) -> Result<Self, ()> {
        pd.system().log_to_console("paddle ready");
        Ok(Self {
            x: 0,
            events: Vec::new(),
        })
    }

    fn update<P: Playdate>(&mut self, pd: &P) -> bool {
        let buttons = pd.system().button_state().current;
        if buttons.contains(Buttons::RIGHT) {
            self.x += 4;
        }
        pd.graphics().clear(Color::WHITE);
        pd.graphics().fill_rect(Rect::new(self.x, 0, 4, 4), Color::BLACK);
        true
    }

    fn event<P: Playdate>(&mut self, _pd: &P, event: SystemEvent) {
        self.events.push(event);
    }
}

/// Needs its save file at startup.
struct Saved;

impl Game for Saved {
    type Error = &'static str;

    fn init<P: Playdate>(pd: &P) -> Result<Self, &'static str> {
        pd.file()
            .open("save.json", FileOptions::READ_DATA)
            .map(|_| Saved)
            .map_err(|_| "no save file")
    }

    fn update<P: Playdate>(&mut self, _pd: &P) -> bool {
        false
    }
}

#[test]
fn test_init_applies_config() {
    let pd = Sim::default();
    let mut runner = Runner::<Paddle>::new();
    runner.handle_event(&pd, SystemEvent::Init).unwrap();

    assert!(runner.is_running());
    assert_eq!(pd.system.peripherals(), Peripherals::ACCELEROMETER);
    assert!(pd.system.auto_lock_disabled());
    assert_eq!(pd.display().width(), 200);
    assert_eq!(pd.display.refresh_rate(), 50.0);
    assert_eq!(pd.system.console(), ["paddle ready"]);
    assert_eq!(
        runner.handle_event(&pd, SystemEvent::Init),
        Err(RunnerError::AlreadyStarted)
    );
}

#[test]
fn test_update_moves_paddle() {
    let pd = Sim::default();
    let mut runner = Runner::<Paddle>::new();
    assert_eq!(runner.update(&pd), Err(RunnerError::NotRunning));
    runner.handle_event(&pd, SystemEvent::Init).unwrap();

    pd.system.set_buttons(Buttons::RIGHT);
    for _ in 0..3 {
        assert_eq!(runner.update(&pd), Ok(true));
    }
    assert_eq!(runner.frames(), 3);
    assert_eq!(runner.game().map(|g| g.x), Some(12));
    let calls = pd.graphics.take_calls();
    assert_eq!(calls.len(), 6);
    assert_eq!(
        calls[4..],
        [
            DrawCall::Clear(Color::WHITE),
            DrawCall::FillRect {
                rect: Rect::new(12, 0, 4, 4),
                color: Color::BLACK
            },
        ]
    );
    assert_eq!(pd.system.fps_position(), Some((2, 2)));
}

#[test]
fn test_events_until_terminate() {
    let pd = Sim::default();
    let mut runner = Runner::<Paddle>::new();
    assert_eq!(
        runner.handle_event(&pd, SystemEvent::Pause),
        Err(RunnerError::NotRunning)
    );
    runner.handle_event(&pd, SystemEvent::Init).unwrap();
    runner.handle_event(&pd, SystemEvent::Pause).unwrap();
    runner
        .handle_event(&pd, SystemEvent::KeyPressed { keycode: 0x41 })
        .unwrap();
    assert_eq!(
        runner.game().map(|g| g.events.clone()),
        Some(vec![SystemEvent::Pause, SystemEvent::KeyPressed { keycode: 0x41 }])
    );

    runner.handle_event(&pd, SystemEvent::Terminate).unwrap();
    assert!(runner.is_terminated());
    assert_eq!(runner.update(&pd), Err(RunnerError::NotRunning));
}

#[test]
fn test_failed_init_stops_runner() {
    let pd = Sim::default();
    let mut runner = Runner::<Saved>::new();
    assert_eq!(
        runner.handle_event(&pd, SystemEvent::Init),
        Err(RunnerError::Init("no save file"))
    );
    assert!(runner.is_failed());
    assert_eq!(runner.update(&pd), Err(RunnerError::NotRunning));
    // Default config leaves the display alone
    assert_eq!(pd.display.scale(), DEFAULT_RUNNER_CONFIG.display.scale);

    pd.file.insert("save.json", b"{}");
    let mut runner = Runner::<Saved>::new();
    runner.handle_event(&pd, SystemEvent::Init).unwrap();
    assert_eq!(runner.update(&pd), Ok(false));
}
