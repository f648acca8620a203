//! Settings module discovery
//!
//! Applications live under an applications directory, one directory per
//! application:
//!
//! ```text
//! <apps_dir>/<name>/settings.toml   settings (and optionally routes)
//! <apps_dir>/<name>/urls.toml       routes (optional, takes precedence)
//! ```
//!
//! Arbitrary settings modules are named either by file path or by dotted
//! import name (`blog.production` -> `<apps_dir>/blog/production.toml`).

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::module::{ModuleError, SettingsModule};

/// Settings file inside an application directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Route file inside an application directory
pub const ROUTES_FILE: &str = "urls.toml";

/// Resolves application names and module paths to settings modules
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    apps_dir: PathBuf,
}

impl ModuleLoader {
    pub fn new(apps_dir: impl Into<PathBuf>) -> Self {
        Self {
            apps_dir: apps_dir.into(),
        }
    }

    pub fn apps_dir(&self) -> &Path {
        &self.apps_dir
    }

    /// Load an application's settings module, including its routes
    pub fn load_application(&self, name: &str) -> Result<SettingsModule, ModuleError> {
        let app_dir = self.apps_dir.join(name);
        let settings_path = app_dir.join(SETTINGS_FILE);
        if !settings_path.is_file() {
            return Err(ModuleError::NotFound(format!(
                "application '{}' ({})",
                name,
                settings_path.display()
            )));
        }

        let mut module = SettingsModule::load(name, &settings_path)?;
        let routes_path = app_dir.join(ROUTES_FILE);
        if routes_path.is_file() {
            module.load_routes(&routes_path)?;
        }
        Ok(module)
    }

    /// Load a settings module by file path or dotted import name
    pub fn load_settings(&self, module: &str) -> Result<SettingsModule, ModuleError> {
        let path = self.resolve(module);
        if !path.is_file() {
            return Err(ModuleError::NotFound(format!(
                "'{}' ({})",
                module,
                path.display()
            )));
        }
        SettingsModule::load(module, &path)
    }

    /// Map a module reference to a file path
    pub fn resolve(&self, module: &str) -> PathBuf {
        let direct = Path::new(module);
        if module.ends_with(".toml") || direct.components().count() > 1 {
            return direct.to_path_buf();
        }
        let mut path = self.apps_dir.clone();
        for part in module.split('.') {
            path.push(part);
        }
        path.set_extension("toml");
        path
    }

    /// List application names under the applications directory, sorted
    pub fn discover(&self) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(&self.apps_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir() && e.path().join(SETTINGS_FILE).is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_app(root: &Path, name: &str, settings: &str, urls: Option<&str>) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SETTINGS_FILE), settings).unwrap();
        if let Some(urls) = urls {
            fs::write(dir.join(ROUTES_FILE), urls).unwrap();
        }
    }

    #[test]
    fn test_load_application_with_routes_file() {
        let temp = TempDir::new().unwrap();
        write_app(
            temp.path(),
            "blog",
            "INSTALLED_APPS = [\"taggit\"]\n",
            Some("[[urlpatterns]]\npattern = \"^blog/\"\nview = \"blog.urls\"\n"),
        );

        let loader = ModuleLoader::new(temp.path());
        let module = loader.load_application("blog").unwrap();

        assert_eq!(module.name, "blog");
        assert_eq!(module.settings.len(), 1);
        assert_eq!(module.routes.len(), 1);
        assert_eq!(module.routes[0].view, "blog.urls");
    }

    #[test]
    fn test_load_missing_application() {
        let temp = TempDir::new().unwrap();
        let loader = ModuleLoader::new(temp.path());
        assert!(matches!(
            loader.load_application("ghost"),
            Err(ModuleError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve() {
        let loader = ModuleLoader::new("/apps");
        assert_eq!(
            loader.resolve("blog.production"),
            PathBuf::from("/apps/blog/production.toml")
        );
        assert_eq!(loader.resolve("extra.toml"), PathBuf::from("extra.toml"));
        assert_eq!(
            loader.resolve("conf/extra.toml"),
            PathBuf::from("conf/extra.toml")
        );
    }

    #[test]
    fn test_load_settings_by_dotted_name() {
        let temp = TempDir::new().unwrap();
        write_app(temp.path(), "blog", "", None);
        fs::write(temp.path().join("blog").join("production.toml"), "DEBUG = false\n").unwrap();

        let loader = ModuleLoader::new(temp.path());
        let module = loader.load_settings("blog.production").unwrap();
        assert_eq!(module.name, "blog.production");
        assert!(module.get("DEBUG").is_some());
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        write_app(temp.path(), "shop", "", None);
        write_app(temp.path(), "blog", "", None);
        fs::create_dir_all(temp.path().join("not_an_app")).unwrap();

        let loader = ModuleLoader::new(temp.path());
        assert_eq!(loader.discover(), vec!["blog".to_string(), "shop".to_string()]);
    }
}
