use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::{BaseDirs, ProjectDirs};

pub const ENV_CONFIG_DIR: &str = "SHADERPAD_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "SHADERPAD_DATA_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Shaderpad";
const APPLICATION: &str = "shaderpad";

pub const CONFIG_FILE: &str = "shaderpad.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;

        Ok(Self {
            config_dir: resolve_dir(ENV_CONFIG_DIR, project_dirs.config_dir()),
            data_dir: resolve_dir(ENV_DATA_DIR, project_dirs.data_dir()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Built-in shader roots, searched after any roots named in the settings.
    pub fn shader_user_dirs(&self) -> Vec<PathBuf> {
        vec![self.config_dir.join("shaders"), self.data_dir.join("shaders")]
    }

    /// Configured roots (with `~` expanded) followed by the built-in ones.
    pub fn shader_roots(&self, configured: &[PathBuf]) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = configured.iter().map(|root| expand_home(root)).collect();
        for dir in self.shader_user_dirs() {
            if !roots.contains(&dir) {
                roots.push(dir);
            }
        }
        roots
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
        }
    }
}

fn resolve_dir(env_var: &str, default: &Path) -> PathBuf {
    env_override(env_var).unwrap_or_else(|| default.to_path_buf())
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

/// Replaces a leading `~` with the home directory when one is known.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match BaseDirs::new() {
        Some(base) => base.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV: Mutex<()> = Mutex::new(());

    /// Runs `check` with the directory overrides set, restoring them after.
    fn with_overrides(config: &Path, data: &Path, check: impl FnOnce()) {
        let _lock = ENV.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = [ENV_CONFIG_DIR, ENV_DATA_DIR].map(|key| (key, env::var_os(key)));
        env::set_var(ENV_CONFIG_DIR, config);
        env::set_var(ENV_DATA_DIR, data);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(check));
        for (key, value) in saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
    }

    #[test]
    fn directory_overrides_replace_project_dirs() {
        let root = TempDir::new().unwrap();
        let config = root.path().join("cfg");
        let data = root.path().join("share");
        with_overrides(&config, &data, || {
            let paths = AppPaths::discover().expect("paths");
            assert_eq!(paths.config_dir(), config);
            assert_eq!(paths.data_dir(), data);
            assert_eq!(paths.config_file(), config.join(CONFIG_FILE));
            assert_eq!(
                paths.shader_user_dirs(),
                vec![config.join("shaders"), data.join("shaders")]
            );
        });
    }

    #[test]
    fn configured_roots_come_first_without_duplicates() {
        let paths = AppPaths::from_raw(PathBuf::from("/cfg"), PathBuf::from("/data"));
        let roots = paths.shader_roots(&[PathBuf::from("/mine"), PathBuf::from("/data/shaders")]);
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/mine"),
                PathBuf::from("/data/shaders"),
                PathBuf::from("/cfg/shaders"),
            ]
        );
    }

    #[test]
    fn tilde_expands_only_as_first_component() {
        assert_eq!(expand_home(Path::new("/abs/dir")), PathBuf::from("/abs/dir"));
        assert_eq!(expand_home(Path::new("rel/~dir")), PathBuf::from("rel/~dir"));
        if let Some(base) = BaseDirs::new() {
            assert_eq!(expand_home(Path::new("~/shaders")), base.home_dir().join("shaders"));
        }
    }
}
