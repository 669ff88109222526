use std::fs;
use std::path::{Path, PathBuf};

use renderer::ShaderSource;
use tracing::{debug, error};

pub const SHADER_EXTENSION: &str = "glsl";

/// Shader chosen for a run, with the label shown in the window title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub source: ShaderSource,
    pub label: String,
}

impl Selection {
    fn bundled() -> Self {
        Self {
            source: ShaderSource::Bundled,
            label: "default".to_string(),
        }
    }
}

/// Named shaders stored as `<root>/<name>.glsl` across several roots.
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    roots: Vec<PathBuf>,
}

impl ShaderLibrary {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Finds the file for `request`, which is either a path to an existing
    /// file or a shader name looked up in each root in order.
    pub fn locate(&self, request: &str) -> Option<PathBuf> {
        let requested = Path::new(request);
        if requested.as_os_str().is_empty() {
            return None;
        }
        if requested.is_file() {
            return Some(requested.to_path_buf());
        }

        let file_name = if requested.extension().is_some_and(|ext| ext == SHADER_EXTENSION) {
            requested.to_path_buf()
        } else {
            PathBuf::from(format!("{request}.{SHADER_EXTENSION}"))
        };
        debug!(requested = request, roots = ?self.roots, "resolving shader");
        self.roots
            .iter()
            .map(|root| root.join(&file_name))
            .inspect(|candidate| debug!(candidate = %candidate.display(), "checking shader candidate"))
            .find(|candidate| candidate.is_file())
    }

    /// Resolves the shader to run; unknown names fall back to the bundled one.
    pub fn select(&self, request: Option<&str>) -> Selection {
        let Some(request) = request else {
            return Selection::bundled();
        };
        match self.locate(request) {
            Some(path) => Selection {
                label: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| request.to_string()),
                source: ShaderSource::File(path),
            },
            None => {
                error!(
                    requested = request,
                    roots = ?self.roots,
                    "cannot load shader with that name; using the default shader"
                );
                Selection::bundled()
            }
        }
    }

    /// Shader names available across all roots, first root wins.
    pub fn names(&self) -> Vec<(String, PathBuf)> {
        let mut found: Vec<(String, PathBuf)> = Vec::new();
        for root in &self.roots {
            let Ok(entries) = fs::read_dir(root) else {
                continue;
            };
            let mut in_root: Vec<(String, PathBuf)> = entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| {
                    path.is_file() && path.extension().is_some_and(|ext| ext == SHADER_EXTENSION)
                })
                .filter_map(|path| {
                    let stem = path.file_stem()?.to_string_lossy().into_owned();
                    Some((stem, path))
                })
                .collect();
            in_root.sort();
            for (name, path) in in_root {
                if !found.iter().any(|(existing, _)| *existing == name) {
                    found.push((name, path));
                }
            }
        }
        found
    }
}
