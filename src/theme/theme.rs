use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Light,
    Dark,
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Light => "light",
            Mode::Dark => "dark",
        }
    }

    fn flipped(&self) -> Mode {
        match self {
            Mode::Light => Mode::Dark,
            Mode::Dark => Mode::Light,
        }
    }

    fn for_ambient(prefers_dark: bool) -> Mode {
        if prefers_dark { Mode::Dark } else { Mode::Light }
    }
}

/// On-disk shape of the preference file. A missing file, a missing key or
/// an unparseable file all mean "no explicit choice yet".
#[derive(Debug, Default, Serialize, Deserialize)]
struct ThemePrefs {
    theme: Option<Mode>,
}

/// Tracks the applied light/dark mode.
///
/// An explicit user toggle is persisted and wins over the ambient signal
/// permanently; until the first toggle the controller follows whatever the
/// widget reports from the platform.
#[derive(Debug)]
pub struct ThemeController {
    applied: Mode,
    stored: Option<Mode>,
    prefs_path: PathBuf,
}

impl ThemeController {
    pub fn load(prefs_path: PathBuf, ambient_dark: bool) -> Self {
        let stored = read_prefs(&prefs_path);
        let applied = stored.unwrap_or_else(|| Mode::for_ambient(ambient_dark));
        Self {
            applied,
            stored,
            prefs_path,
        }
    }

    pub fn applied(&self) -> Mode {
        self.applied
    }

    /// Flip the applied mode and persist the choice. Persistence is
    /// best-effort; a write failure is logged and the in-memory state keeps
    /// the new mode.
    pub fn toggle(&mut self) -> Mode {
        let new_mode = self.applied.flipped();
        self.applied = new_mode;
        self.stored = Some(new_mode);
        if let Err(e) = write_prefs(&self.prefs_path, new_mode) {
            eprintln!("Failed to persist theme preference: {}", e);
        }
        new_mode
    }

    /// The platform's light/dark preference changed. Only followed while no
    /// explicit choice has ever been stored.
    pub fn on_ambient_change(&mut self, prefers_dark: bool) -> Option<Mode> {
        if self.stored.is_some() {
            return None;
        }
        self.applied = Mode::for_ambient(prefers_dark);
        Some(self.applied)
    }
}

fn read_prefs(path: &Path) -> Option<Mode> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str::<ThemePrefs>(&contents).ok()?.theme
}

fn write_prefs(path: &Path, mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(&ThemePrefs { theme: Some(mode) })?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_prefs_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "focus_bell_theme_{}_{}.json",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn test_absent_preference_follows_ambient() {
        let path = temp_prefs_path("absent");
        let _ = std::fs::remove_file(&path);

        let controller = ThemeController::load(path.clone(), true);
        assert_eq!(controller.applied(), Mode::Dark);
        let controller = ThemeController::load(path, false);
        assert_eq!(controller.applied(), Mode::Light);
    }

    #[test]
    fn test_toggle_persists_and_applies_immediately() {
        let path = temp_prefs_path("toggle");
        let _ = std::fs::remove_file(&path);

        let mut controller = ThemeController::load(path.clone(), false);
        assert_eq!(controller.toggle(), Mode::Dark);
        assert_eq!(controller.applied(), Mode::Dark);

        // A fresh load sees the stored choice regardless of ambient.
        let reloaded = ThemeController::load(path.clone(), false);
        assert_eq!(reloaded.applied(), Mode::Dark);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_ambient_change_without_stored_preference_applies() {
        let path = temp_prefs_path("ambient");
        let _ = std::fs::remove_file(&path);

        let mut controller = ThemeController::load(path, false);
        assert_eq!(controller.on_ambient_change(true), Some(Mode::Dark));
        assert_eq!(controller.applied(), Mode::Dark);
        assert_eq!(controller.on_ambient_change(false), Some(Mode::Light));
        assert_eq!(controller.applied(), Mode::Light);
    }

    #[test]
    fn test_ambient_change_after_explicit_toggle_is_ignored() {
        let path = temp_prefs_path("explicit");
        let _ = std::fs::remove_file(&path);

        let mut controller = ThemeController::load(path.clone(), false);
        controller.toggle(); // explicit choice: dark
        assert_eq!(controller.on_ambient_change(false), None);
        assert_eq!(controller.applied(), Mode::Dark);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unparseable_preference_file_counts_as_absent() {
        let path = temp_prefs_path("garbage");
        std::fs::write(&path, "not json").unwrap();

        let controller = ThemeController::load(path.clone(), true);
        assert_eq!(controller.applied(), Mode::Dark);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_prefs_file_shape() {
        let path = temp_prefs_path("shape");
        let _ = std::fs::remove_file(&path);

        let mut controller = ThemeController::load(path.clone(), true);
        controller.toggle(); // dark ambient start, toggle to light
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, r#"{"theme":"light"}"#);
        let _ = std::fs::remove_file(&path);
    }
}
