use chrono::Local;
use notify_rust::Notification;
use std::fs::OpenOptions;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{Duration, interval};

mod audio;
mod pomodoro;
mod theme;
mod ws;

use ws::websocket_server::{ControlMessage, StateUpdate};

const WS_ADDR: &str = "127.0.0.1:8765"; // Widget clients connect here

#[derive(Debug)]
struct Daemon {
    timer: pomodoro::pomodoro::PomodoroTimer,
    theme: theme::theme::ThemeController,
    log_file: Option<String>,
}

impl Daemon {
    fn new(
        timer: pomodoro::pomodoro::PomodoroTimer,
        theme: theme::theme::ThemeController,
        log_file: Option<String>,
    ) -> Self {
        let daemon = Self {
            timer,
            theme,
            log_file,
        };
        daemon.log(&format!(
            "=== Focus Bell started at {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        daemon
    }

    fn log_to_file(path: &str, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", message)?;
        Ok(())
    }

    fn log(&self, message: &str) {
        if let Some(ref path) = self.log_file {
            let _ = Self::log_to_file(path, message);
        }
    }

    /// Timestamped line to stdout and the log file.
    fn log_event(&self, message: &str) {
        let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), message);
        println!("{}", line);
        self.log(&line);
    }

    /// Apply one widget control message and build the snapshot to push.
    fn handle_control(&mut self, message: ControlMessage) -> StateUpdate {
        let mut theme_transition = false;
        match message {
            ControlMessage::Start => {
                if !self.timer.is_running() {
                    self.timer.start();
                    self.log_event(&format!(
                        "{} Timer started ({} remaining in {})",
                        self.timer.phase().emoji(),
                        self.timer.display(),
                        self.timer.phase().status_label()
                    ));
                }
            }
            ControlMessage::Pause => {
                if self.timer.is_running() {
                    self.timer.pause();
                    self.log_event(&format!("Timer paused at {}", self.timer.display()));
                }
            }
            ControlMessage::Reset => {
                self.timer.reset();
                self.log_event(&format!("Timer reset to {}", self.timer.display()));
            }
            ControlMessage::SetDurations {
                work_minutes,
                break_minutes,
            } => {
                self.timer.set_durations(work_minutes, break_minutes);
                self.log_event(&format!(
                    "Durations set to {}min work / {}min break",
                    self.timer.work_minutes(),
                    self.timer.break_minutes()
                ));
            }
            ControlMessage::ToggleTheme => {
                let mode = self.theme.toggle();
                theme_transition = true;
                self.log_event(&format!("Theme switched to {}", mode.as_str()));
            }
            ControlMessage::AmbientChanged { prefers_dark } => {
                if let Some(mode) = self.theme.on_ambient_change(prefers_dark) {
                    self.log_event(&format!("Following ambient theme: {}", mode.as_str()));
                }
            }
        }

        let mut update = self.state_update();
        update.theme_transition = theme_transition;
        update
    }

    fn state_update(&self) -> StateUpdate {
        let phase = self.timer.phase();
        let (primary_color, secondary_color) = phase.accent_colors();
        let running = self.timer.is_running();
        StateUpdate {
            display: self.timer.display(),
            phase: phase.as_str().to_string(),
            status_label: phase.status_label().to_string(),
            running,
            completed_sessions: self.timer.completed_sessions(),
            start_enabled: !running,
            pause_enabled: running,
            reset_enabled: !running,
            primary_color: primary_color.to_string(),
            secondary_color: secondary_color.to_string(),
            theme: self.theme.applied().as_str().to_string(),
            theme_transition: false,
            chime: false,
        }
    }
}

fn send_notification(message: &str) -> Result<(), Box<dyn std::error::Error>> {
    Notification::new()
        .summary("Focus Bell - Pomodoro Timer")
        .body(message)
        .timeout(0) // No auto-dismiss
        .show()?;
    Ok(())
}

fn publish(update_tx: &watch::Sender<String>, update: &StateUpdate) {
    match serde_json::to_string(update) {
        Ok(json) => {
            let _ = update_tx.send(json);
        }
        Err(e) => eprintln!("Failed to serialize state update: {}", e),
    }
}

fn minutes_arg(args: &[String], flag: &str, default: u32) -> u32 {
    if let Some(pos) = args.iter().position(|a| a == flag) {
        args.get(pos + 1)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    } else {
        default
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let verbose = args.contains(&"--verbose".to_string()) || args.contains(&"-v".to_string());
    let work_minutes = minutes_arg(&args, "--work", pomodoro::pomodoro::POMODORO_WORK_MINUTES);
    let break_minutes = minutes_arg(&args, "--break", pomodoro::pomodoro::POMODORO_BREAK_MINUTES);

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());

    // Check for log file argument
    let log_file = if let Some(pos) = args.iter().position(|a| a == "--log" || a == "-l") {
        args.get(pos + 1).cloned()
    } else {
        Some(format!("{}/.local/share/focus_bell/daemon.log", home))
    };

    // Create log directory if needed
    if let Some(ref path) = log_file {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    println!("🔔 Focus Bell - Pomodoro Timer & Theme Daemon");
    println!("======================================================");
    println!(
        "Pomodoro settings: {}min work / {}min break",
        work_minutes, break_minutes
    );
    println!("Serving widget clients on ws://{}", WS_ADDR);
    if verbose {
        println!("Verbose mode: ON");
    }
    if let Some(ref path) = log_file {
        println!("Logging to: {}", path);
    }
    println!("Press Ctrl+C to stop\n");

    let timer = pomodoro::pomodoro::PomodoroTimer::new(work_minutes, break_minutes);
    // The widget reports the real ambient signal once connected; until then
    // an unset preference means light.
    let prefs_path = format!("{}/.local/share/focus_bell/theme.json", home);
    let theme_controller = theme::theme::ThemeController::load(prefs_path.into(), false);

    println!(
        "{} Starting paused in {} mode, theme: {}\n",
        timer.phase().emoji(),
        timer.phase().status_label(),
        theme_controller.applied().as_str()
    );

    let daemon = Arc::new(Mutex::new(Daemon::new(timer, theme_controller, log_file)));

    // Control channel fed by the WebSocket server, snapshot channel read by
    // every connection.
    let (control_tx, mut control_rx) = ws::websocket_server::create_control_channel();
    let initial = match daemon.lock() {
        Ok(d) => serde_json::to_string(&d.state_update())?,
        Err(_) => return Err("daemon state poisoned at startup".into()),
    };
    let (update_tx, update_rx) = watch::channel(initial);

    // Spawn WebSocket server
    let ws_addr: SocketAddr = WS_ADDR.parse()?;
    tokio::spawn(async move {
        if let Err(e) =
            ws::websocket_server::start_websocket_server(ws_addr, control_tx, update_rx).await
        {
            eprintln!("WebSocket server error: {}", e);
        }
    });

    // Spawn control message processor
    let daemon_clone = Arc::clone(&daemon);
    let control_update_tx = update_tx.clone();
    tokio::spawn(async move {
        while let Some(message) = control_rx.recv().await {
            if verbose {
                println!("[WebSocket] Received control: {:?}", message);
            }
            if let Ok(mut d) = daemon_clone.lock() {
                let update = d.handle_control(message);
                publish(&control_update_tx, &update);
            }
        }
    });

    // Main loop: the one tick schedule driving the countdown
    let mut timer_interval = interval(Duration::from_millis(
        pomodoro::pomodoro::TICK_INTERVAL_MS,
    ));

    loop {
        timer_interval.tick().await;

        if let Ok(mut d) = daemon.lock() {
            if let Some(transition) = d.timer.tick() {
                let message = match transition.from {
                    pomodoro::pomodoro::Phase::Work => format!(
                        "Focus session complete! Take a {}-minute break.",
                        d.timer.break_minutes()
                    ),
                    pomodoro::pomodoro::Phase::Break => format!(
                        "Break finished! Back to work for {} minutes.",
                        d.timer.work_minutes()
                    ),
                };

                d.log_event(&format!("{} {}", transition.to.emoji(), message));
                if transition.from == pomodoro::pomodoro::Phase::Work {
                    d.log_event(&format!(
                        "Completed sessions: {}",
                        transition.completed_sessions
                    ));
                }

                audio::chime::play_completion_chime();
                if let Err(e) = send_notification(&message) {
                    eprintln!("Failed to send notification: {}", e);
                }

                let mut update = d.state_update();
                update.chime = true;
                publish(&update_tx, &update);
            } else if d.timer.is_running() {
                publish(&update_tx, &d.state_update());
            }
        }
    }
}
