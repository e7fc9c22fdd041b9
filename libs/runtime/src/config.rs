use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::paths::home_dir::resolve_home_dir;

/// `APP__SERVER__PORT=9000` overrides `server.port`.
const ENV_PREFIX: &str = "APP__";
const HOME_SUBDIR: &str = ".issue_tracker";
const DEFAULT_PORT: u16 = 8087;

/// Raw per-module sections keyed by module name (`api_ingress`, ...).
pub type ModuleBag = HashMap<String, serde_json::Value>;

/// Process configuration: `server`, `logging`, and one section per module.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
    /// Extra `<module>.yaml` files merged over `modules`.
    #[serde(default)]
    pub modules_dir: Option<String>,
    #[serde(default)]
    pub modules: ModuleBag,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base for relative log paths. Empty means `~/.issue_tracker`.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Fallback request timeout for the HTTP host; 0 leaves its own default.
    #[serde(default)]
    pub timeout_sec: u64,
}

/// Log sinks by subsystem; `default` catches everything else.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String,
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".to_owned(),
            port: DEFAULT_PORT,
            timeout_sec: 0,
        }
    }
}

impl ServerConfig {
    /// Replace `home_dir` with its absolute form, creating the directory.
    fn resolve_home(&mut self) -> Result<()> {
        let requested = Some(self.home_dir.trim())
            .filter(|dir| !dir.is_empty())
            .map(str::to_owned);
        let resolved = resolve_home_dir(requested, HOME_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        self.home_dir = resolved.to_string_lossy().into_owned();
        Ok(())
    }
}

pub fn default_logging_config() -> LoggingConfig {
    let section = Section {
        console_level: "info".to_owned(),
        file: "logs/issue_tracker.log".to_owned(),
        file_level: "debug".to_owned(),
        max_backups: Some(3),
        max_size_mb: Some(100),
    };
    HashMap::from([("default".to_owned(), section)])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: Some(default_logging_config()),
            ..Self::bare()
        }
    }
}

impl AppConfig {
    /// Server defaults only; sections absent from the file stay unset.
    fn bare() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: None,
            modules_dir: None,
            modules: ModuleBag::new(),
        }
    }

    /// Built-in server defaults, then the YAML file, then `APP__*` variables.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let path = config_path.as_ref();
        if !path.is_file() {
            anyhow::bail!("config file not found: {}", path.display());
        }

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(Self::bare()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to parse yaml config '{}'", path.display()))?;

        config.server.resolve_home()?;
        if let Some(dir) = &config.modules_dir {
            let extra = load_module_dir(Path::new(dir))?;
            config.modules.extend(extra);
        }
        Ok(config)
    }

    /// `load_layered` when a path is given, built-in defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        let Some(path) = config_path else {
            let mut config = Self::default();
            config.server.resolve_home()?;
            return Ok(config);
        };
        Self::load_layered(path)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Typed view of one module section; a missing section yields `T::default()`.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(module_name) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid configuration for module '{module_name}'")),
            None => Ok(T::default()),
        }
    }

    /// `--port` replaces `server.port`; `-v`/`-vv` raise the `default` console level.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let level = match args.verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(section) = logging.get_mut("default") {
            section.console_level = level.to_owned();
        }
    }
}

/// Flags of the server binary that feed into the configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// One section per `<module>.yaml` in `dir`. A missing directory is empty.
fn load_module_dir(dir: &Path) -> Result<ModuleBag> {
    let mut sections = ModuleBag::new();
    if !dir.exists() {
        return Ok(sections);
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read modules_dir {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || !is_yaml(&path) {
            continue;
        }
        let Some(module) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read module config {}", path.display()))?;
        let section: serde_json::Value = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse yaml module config {}", path.display()))?;
        sections.insert(module.to_owned(), section);
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_yaml(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn home_in(dir: &Path, leaf: &str) -> String {
        dir.join(leaf).to_string_lossy().replace('\\', "/")
    }

    #[test]
    fn defaults_before_resolution() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(config.server.home_dir.is_empty());

        let section = &config.logging.as_ref().unwrap()["default"];
        assert_eq!(section.console_level, "info");
        assert_eq!(section.file, "logs/issue_tracker.log");
        assert!(config.modules.is_empty());
    }

    #[test]
    fn file_values_override_defaults_and_home_is_created() {
        let tmp = tempdir().unwrap();
        let home = home_in(tmp.path(), "home");
        let path = write_yaml(
            tmp.path(),
            "cfg.yaml",
            &format!(
                r#"
server:
  home_dir: "{home}"
  host: "0.0.0.0"
  port: 9090
  timeout_sec: 30

logging:
  default:
    console_level: debug
    file: "logs/tracker.log"
"#
            ),
        );

        let config = AppConfig::load_layered(&path).unwrap();

        let home = PathBuf::from(&config.server.home_dir);
        assert!(home.is_absolute() && home.is_dir());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.timeout_sec, 30);

        let section = &config.logging.as_ref().unwrap()["default"];
        assert_eq!(section.console_level, "debug");
        assert_eq!(section.file_level, "");
    }

    #[test]
    fn absent_sections_stay_unset() {
        let tmp = tempdir().unwrap();
        let home = home_in(tmp.path(), "minimal");
        let path = write_yaml(
            tmp.path(),
            "cfg.yaml",
            &format!("server:\n  home_dir: \"{home}\"\n  host: localhost\n  port: 8080\n"),
        );

        let config = AppConfig::load_layered(&path).unwrap();

        assert!(config.server.home_dir.ends_with("minimal"));
        assert_eq!(config.server.port, 8080);
        assert!(config.logging.is_none());
        assert!(config.modules.is_empty());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let tmp = tempdir().unwrap();
        let home = home_in(tmp.path(), "home");
        let path = write_yaml(
            tmp.path(),
            "cfg.yaml",
            &format!("server:\n  home_dir: \"{home}\"\n  host: h\n  port: 1\nservr: {{}}\n"),
        );

        assert!(AppConfig::load_layered(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load_layered("/nonexistent/issue_tracker.yaml").unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn port_flag_and_verbosity() {
        for (verbose, expected) in [(0, "info"), (1, "debug"), (2, "trace"), (5, "trace")] {
            let mut config = AppConfig::default();
            config.apply_cli_overrides(&CliArgs {
                port: Some(3000),
                verbose,
                ..Default::default()
            });

            assert_eq!(config.server.port, 3000);
            let section = &config.logging.as_ref().unwrap()["default"];
            assert_eq!(section.console_level, expected, "verbose={verbose}");
        }
    }

    #[test]
    fn verbosity_creates_logging_when_absent() {
        let mut config = AppConfig::bare();
        config.apply_cli_overrides(&CliArgs {
            verbose: 1,
            ..Default::default()
        });
        assert_eq!(config.logging.unwrap()["default"].console_level, "debug");
    }

    #[test]
    fn modules_dir_files_become_sections() {
        let tmp = tempdir().unwrap();
        let modules = tmp.path().join("modules");
        fs::create_dir_all(&modules).unwrap();
        write_yaml(
            &modules,
            "api_ingress.yaml",
            "bind_addr: \"127.0.0.1:9999\"\nenable_docs: true\n",
        );
        write_yaml(&modules, "notes.txt", "ignored: true\n");

        let home = home_in(tmp.path(), "home");
        let modules = modules.to_string_lossy().replace('\\', "/");
        let path = write_yaml(
            tmp.path(),
            "cfg.yaml",
            &format!(
                r#"
server:
  home_dir: "{home}"
  host: "127.0.0.1"
  port: 8087

modules_dir: "{modules}"

modules:
  issue_tracker:
    key: "value"
"#
            ),
        );

        let config = AppConfig::load_layered(&path).unwrap();

        assert!(config.modules.contains_key("issue_tracker"));
        assert!(!config.modules.contains_key("notes"));
        let ingress = &config.modules["api_ingress"];
        assert_eq!(ingress["bind_addr"], "127.0.0.1:9999");
        assert_eq!(ingress["enable_docs"], true);
    }

    #[derive(Debug, Default, Deserialize)]
    struct LimitsConfig {
        #[serde(default)]
        name: String,
        #[serde(default)]
        limit: u32,
    }

    #[test]
    fn module_config_is_typed() {
        let mut config = AppConfig::default();
        config.modules.insert(
            "limits".into(),
            serde_json::json!({ "name": "issues", "limit": 7 }),
        );

        let limits: LimitsConfig = config.module_config("limits").unwrap();
        assert_eq!(limits.name, "issues");
        assert_eq!(limits.limit, 7);

        let missing: LimitsConfig = config.module_config("absent").unwrap();
        assert_eq!(missing.limit, 0);

        config
            .modules
            .insert("broken".into(), serde_json::json!({ "limit": "many" }));
        let err = config.module_config::<LimitsConfig>("broken").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn yaml_output_parses_back() {
        let yaml = AppConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("server:"));

        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.server.port, DEFAULT_PORT);
        assert!(parsed.logging.is_some());
    }
}
