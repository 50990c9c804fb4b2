pub const TICK_INTERVAL_MS: u64 = 1000; // Countdown granularity, one tick per second
pub const POMODORO_WORK_MINUTES: u32 = 25; // Default Pomodoro work time
pub const POMODORO_BREAK_MINUTES: u32 = 5; // Default Pomodoro break time

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            Phase::Work => "work",
            Phase::Break => "break",
        }
    }

    pub(crate) fn emoji(&self) -> &str {
        match self {
            Phase::Work => "💼",
            Phase::Break => "☕",
        }
    }

    pub(crate) fn status_label(&self) -> &str {
        match self {
            Phase::Work => "Work time",
            Phase::Break => "Break time",
        }
    }

    /// Accent color pair (primary, secondary) the widget applies per phase.
    pub(crate) fn accent_colors(&self) -> (&str, &str) {
        match self {
            Phase::Work => ("#6a11cb", "#2575fc"),
            Phase::Break => ("#ff4d4d", "#ff8a5c"),
        }
    }
}

/// Reported by [`PomodoroTimer::tick`] when an interval elapses, so the
/// daemon loop can chime and notify without the state machine knowing
/// anything about audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub completed_sessions: u32,
}

/// Countdown state machine for alternating work/break intervals.
///
/// One instance is owned by the daemon; nothing here is persisted, the
/// session count starts over on every launch.
#[derive(Debug)]
pub struct PomodoroTimer {
    remaining_seconds: u32,
    running: bool,
    phase: Phase,
    completed_sessions: u32,
    work_minutes: u32,
    break_minutes: u32,
}

impl PomodoroTimer {
    pub fn new(work_minutes: u32, break_minutes: u32) -> Self {
        let work_minutes = work_minutes.max(1);
        let break_minutes = break_minutes.max(1);
        Self {
            remaining_seconds: work_minutes * 60,
            running: false,
            phase: Phase::Work,
            completed_sessions: 0,
            work_minutes,
            break_minutes,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Back to a paused work interval at its full configured length.
    pub fn reset(&mut self) {
        self.pause();
        self.phase = Phase::Work;
        self.remaining_seconds = self.work_minutes * 60;
    }

    /// Advance the countdown by one second. No-op while paused.
    ///
    /// When the count reaches zero the phase flips, the remaining time is
    /// reloaded from the incoming phase's configured duration and the timer
    /// stays running: the next interval begins immediately, the user only
    /// ever stops it by pausing.
    pub fn tick(&mut self) -> Option<Transition> {
        if !self.running {
            return None;
        }
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        if self.remaining_seconds > 0 {
            return None;
        }

        let from = self.phase;
        match from {
            Phase::Work => {
                self.completed_sessions += 1;
                self.phase = Phase::Break;
                self.remaining_seconds = self.break_minutes * 60;
            }
            Phase::Break => {
                self.phase = Phase::Work;
                self.remaining_seconds = self.work_minutes * 60;
            }
        }
        Some(Transition {
            from,
            to: self.phase,
            completed_sessions: self.completed_sessions,
        })
    }

    /// Record new durations. Both inputs are stored (they are read again at
    /// the next phase transition); the current countdown is only recomputed
    /// while paused, edits during a running interval wait for reset or the
    /// next transition.
    pub fn set_durations(&mut self, work_minutes: u32, break_minutes: u32) {
        self.work_minutes = work_minutes.max(1);
        self.break_minutes = break_minutes.max(1);
        if !self.running {
            self.remaining_seconds = match self.phase {
                Phase::Work => self.work_minutes * 60,
                Phase::Break => self.break_minutes * 60,
            };
        }
    }

    /// Remaining time as `MM:SS`, both fields zero-padded.
    pub fn display(&self) -> String {
        let minutes = self.remaining_seconds / 60;
        let seconds = self.remaining_seconds % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }
}
