//! Application context handed to config resolution.

use std::path::{Path, PathBuf};

use devhost_config::AppSettings;

use crate::dump::RuntimeState;
use crate::error::Result;

/// Where the host application lives and how it is configured.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Project root; relative paths in settings resolve against it
    pub base_dir: PathBuf,
    pub settings: AppSettings,
}

impl AppContext {
    pub fn new(base_dir: impl Into<PathBuf>, settings: AppSettings) -> Self {
        Self {
            base_dir: base_dir.into(),
            settings,
        }
    }

    /// Load settings for `base_dir` (see [`AppSettings::load`]).
    pub fn load(base_dir: impl Into<PathBuf>, settings_file: Option<&Path>) -> Result<Self> {
        let base_dir = base_dir.into();
        let settings = AppSettings::load(&base_dir, settings_file)?;
        Ok(Self::new(base_dir, settings))
    }

    pub fn env(&self) -> &str {
        &self.settings.env
    }

    pub fn is_dev(&self) -> bool {
        self.settings.is_dev()
    }

    pub fn rundir(&self) -> PathBuf {
        if self.settings.rundir.is_absolute() {
            self.settings.rundir.clone()
        } else {
            self.base_dir.join(&self.settings.rundir)
        }
    }

    /// Runtime state for the process owning the dev server.
    pub fn runtime(&self) -> RuntimeState {
        RuntimeState {
            rundir: self.rundir(),
            env: self.settings.env.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_rundir_joins_base() {
        let ctx = AppContext::new("/srv/app", AppSettings::default());
        assert_eq!(ctx.rundir(), PathBuf::from("/srv/app/run"));
        assert_eq!(ctx.runtime().env, "local");
    }

    #[test]
    fn absolute_rundir_is_kept() {
        let mut settings = AppSettings::default();
        settings.rundir = PathBuf::from("/var/run/app");
        let ctx = AppContext::new("/srv/app", settings);
        assert_eq!(ctx.rundir(), PathBuf::from("/var/run/app"));
    }
}
