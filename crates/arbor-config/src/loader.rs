use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use arbor_core::{ArborError, RawConfig, Result};

use crate::configuration::Configuration;

/// A typed configuration backed by an INI file, with optional hot-reload.
///
/// The in-memory model is single-owner. `ConfigFile` puts it behind a lock so
/// readers, the watcher thread and writers never touch it concurrently.
pub struct ConfigFile<C> {
    config: Arc<RwLock<C>>,
    config_path: PathBuf,
    env_prefix: Option<String>,
}

impl<C> ConfigFile<C>
where
    C: Configuration + Default + Clone + Send + Sync + 'static,
{
    /// Resolve the config path: explicit path > `<APP>_CONFIG` env > `<config dir>/<app>/<file_name>`
    pub fn resolve_path(explicit: Option<&Path>, app: &str, file_name: &str) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var(env_var_name(app, "CONFIG")) {
            return PathBuf::from(p);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(app)
            .join(file_name)
    }

    /// Load the config from disk, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        Self::open(path, None)
    }

    /// Like [`load`](Self::load), with `<PREFIX>_A__B=value` environment
    /// variables applied as overrides of raw path `A/B`.
    pub fn load_with_env_prefix(path: &Path, prefix: &str) -> Result<Self> {
        Self::open(path, Some(prefix.to_string()))
    }

    fn open(path: &Path, env_prefix: Option<String>) -> Result<Self> {
        if path.is_dir() {
            return Err(ArborError::Config(format!(
                "{} is a directory, expected a config file",
                path.display()
            )));
        }
        let config = if path.exists() {
            info!(?path, "loading configuration");
            read_config(path, env_prefix.as_deref(), C::default())?
        } else {
            warn!(?path, "config file not found, using defaults");
            let mut config = C::default();
            if let Some(prefix) = env_prefix.as_deref() {
                let mut raw = RawConfig::new();
                apply_env_overrides(&mut raw, prefix);
                config.load(&raw);
            }
            config
        };

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: path.to_path_buf(),
            env_prefix,
        })
    }

    /// Get a read snapshot of the current config.
    pub fn get(&self) -> C {
        self.config.read().clone()
    }

    /// Get a shared reference for subscription.
    pub fn shared(&self) -> Arc<RwLock<C>> {
        Arc::clone(&self.config)
    }

    /// Path being loaded from and saved to.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Mutate the config under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut *self.config.write())
    }

    /// Write the current config back to disk.
    pub fn save(&self) -> Result<()> {
        let mut raw = RawConfig::new();
        self.config.read().save(&mut raw);
        arbor_ini::write_ini_file(&raw, &self.config_path)?;
        info!(path = ?self.config_path, "configuration saved");
        Ok(())
    }

    /// Reload the config from disk. Keys absent from the file keep their
    /// current values.
    pub fn reload(&self) -> Result<()> {
        if !self.config_path.exists() {
            return Err(ArborError::NotFound(
                self.config_path.display().to_string(),
            ));
        }
        reload_into(&self.config, &self.config_path, self.env_prefix.as_deref())?;
        info!("configuration reloaded");
        Ok(())
    }

    /// Start a background file watcher that triggers a reload when the config file changes.
    /// Returns a handle to the watcher (must be kept alive for watching to continue).
    pub fn watch(&self) -> Result<notify::RecommendedWatcher> {
        let config = Arc::clone(&self.config);
        let config_path = self.config_path.clone();
        let env_prefix = self.env_prefix.clone();

        info!(?config_path, "starting config file watcher");

        let path_for_event = config_path.clone();
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<NotifyEvent, notify::Error>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }
                    let is_our_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == path_for_event.file_name());
                    if !is_our_file {
                        return;
                    }

                    info!("config file changed, reloading");
                    match reload_into(&config, &path_for_event, env_prefix.as_deref()) {
                        Ok(()) => info!("configuration hot-reloaded successfully"),
                        Err(e) => {
                            warn!(error = %e, "failed to reload config file, keeping current config")
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "file watcher error");
                }
            },
        )
        .map_err(|e| ArborError::Watch(format!("failed to create file watcher: {}", e)))?;

        // Watch the parent directory (some editors create temp files + rename)
        let watch_path = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        watcher
            .watch(watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| ArborError::Watch(format!("failed to watch config directory: {}", e)))?;

        Ok(watcher)
    }
}

fn read_config<C: Configuration>(path: &Path, env_prefix: Option<&str>, mut base: C) -> Result<C> {
    let mut raw = RawConfig::new();
    for diagnostic in arbor_ini::read_ini_file(&mut raw, path)? {
        warn!(?path, "{}", diagnostic);
    }
    if let Some(prefix) = env_prefix {
        apply_env_overrides(&mut raw, prefix);
    }
    let warnings = base.load(&raw);
    if !warnings.is_empty() {
        warn!(?path, rejected = warnings.len(), "some options kept their previous values");
    }
    Ok(base)
}

fn reload_into<C: Configuration + Clone>(
    config: &RwLock<C>,
    path: &Path,
    env_prefix: Option<&str>,
) -> Result<()> {
    let current = config.read().clone();
    let fresh = read_config(path, env_prefix, current)?;
    *config.write() = fresh;
    Ok(())
}

fn env_var_name(app: &str, suffix: &str) -> String {
    format!("{}_{}", app.to_ascii_uppercase().replace('-', "_"), suffix)
}

/// Apply `<PREFIX>_A__B=value` process environment variables to `raw`.
pub fn apply_env_overrides(raw: &mut RawConfig, prefix: &str) {
    apply_overrides(raw, prefix, std::env::vars());
}

/// Apply `<PREFIX>_A__B=value` pairs to `raw` as writes of raw path `A/B`.
/// Returns how many were applied.
pub fn apply_overrides(
    raw: &mut RawConfig,
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> usize {
    let marker = format!("{}_", prefix);
    let mut applied = 0;
    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&marker) else {
            continue;
        };
        let path = rest
            .split("__")
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        if path.is_empty() {
            continue;
        }
        debug!(%key, %path, "applying environment override");
        raw.set_value_by_path(&path, value);
        applied += 1;
    }
    applied
}
