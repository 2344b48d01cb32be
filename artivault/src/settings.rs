use artivault_core::{library::LibraryConfig, session::SessionConfig};

const DOCUMENTATION: &str = r#"# ArtiVault settings. You may edit this file, but be aware that formatting and comments will not
# be preserved.

# data_dir: where folders, canvases and drawings are kept. Defaults to the platform data directory.
# log_level: one of "off", "error", "warn", "info", "debug", "trace".
# [library] default_folder_name: folder new canvases go to when none is chosen.
# [session] history_limit: undo steps kept, 0 for unlimited.
#           autosave_every: save after this many strokes, 0 to only save on close.
#           save_attempts: tries to save when a canvas is closed.
#           default_tool: tool selected when a canvas opens.

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}
#[must_use]
pub fn default_data_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::data_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip)]
    failed_to_load: bool,
    pub data_dir: Option<std::path::PathBuf>,
    pub log_level: String,
    pub library: LibraryConfig,
    pub session: SessionConfig,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            failed_to_load: false,
            data_dir: None,
            log_level: "info".to_owned(),
            library: LibraryConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
impl Settings {
    pub const FILENAME: &'static str = "settings.toml";
    /// Where settings live when not given explicitly.
    #[must_use]
    pub fn default_path() -> Option<std::path::PathBuf> {
        preferences_dir().map(|dir| dir.join(Self::FILENAME))
    }
    #[must_use]
    pub fn no_path() -> Self {
        Self {
            failed_to_load: true,
            ..Self::default()
        }
    }
    /// Read settings from `path`, or default them if that fails for any reason.
    #[must_use]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        let settings: anyhow::Result<Settings> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let settings : Settings = toml::from_str(&string)?;

            Ok(settings)
        };
        settings.unwrap_or_else(|_| Self::no_path())
    }
    /// Return true if loading user's settings failed. Logging isn't up yet while loading, so
    /// this is the way to report it.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            // Explicity do *not* create recursively. If not found, the user probably has a good reason.
            // Ignore errors (could already exist). Any real errors will be emitted by file access below.
            let _ = std::fs::DirBuilder::new().create(parent);
        }
        let mut string = toml::ser::to_string_pretty(self)?;
        // Prefix some documentation.
        string = DOCUMENTATION.to_owned() + &string;
        std::fs::write(path, string)?;
        Ok(())
    }
}
