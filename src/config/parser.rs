//! Declaration file loading.
//!
//! This module loads `dirconfig.yaml`, expands `${NAME}` environment
//! placeholders in the provider settings and applies `DIRCONFIG_*`
//! environment overrides.

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::{DeclarationFile, ProviderConfig};

/// Environment variable overriding `provider.https_host`.
pub const ENV_HTTPS_HOST: &str = "DIRCONFIG_HTTPS_HOST";
/// Environment variable overriding `provider.username`.
pub const ENV_USERNAME: &str = "DIRCONFIG_USERNAME";
/// Environment variable overriding `provider.password`.
pub const ENV_PASSWORD: &str = "DIRCONFIG_PASSWORD";
/// Environment variable overriding `provider.insecure_trust_all_tls`.
pub const ENV_INSECURE_TRUST_ALL_TLS: &str = "DIRCONFIG_INSECURE_TRUST_ALL_TLS";

/// Parser for declaration files.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Directory holding `.env`.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory where `.env` is looked up.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a declaration file as written, without environment handling.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DeclarationFile> {
        let path = path.as_ref();
        info!("Loading declarations from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses declarations from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<DeclarationFile> {
        debug!("Parsing YAML declarations");

        let file: DeclarationFile = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: format!("YAML parse error: {e}"),
            location: source.map(|p| p.display().to_string()),
        })?;

        debug!("Parsed {} resource declarations", file.resources.len());
        Ok(file)
    }

    /// Loads `.env`, then the declaration file, then resolves the provider
    /// settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or a referenced
    /// environment variable is not set.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<DeclarationFile> {
        self.load_dotenv()?;
        let mut file = self.load_file(path)?;
        resolve_provider(&mut file.provider, |name| std::env::var(name).ok())?;
        Ok(file)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| ConfigError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: Some(env_path.display().to_string()),
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Expands `${NAME}` placeholders and applies `DIRCONFIG_*` overrides.
///
/// `lookup` returns the value of an environment variable.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] for an unset placeholder and
/// [`ConfigError::InvalidProvider`] for an unparseable boolean override.
pub fn resolve_provider<F>(provider: &mut ProviderConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    provider.https_host = expand_env(&provider.https_host, &lookup)?;
    provider.username = expand_env(&provider.username, &lookup)?;
    provider.password = expand_env(&provider.password, &lookup)?;

    if let Some(host) = lookup(ENV_HTTPS_HOST) {
        debug!("Overriding provider.https_host from environment");
        provider.https_host = host;
    }
    if let Some(username) = lookup(ENV_USERNAME) {
        debug!("Overriding provider.username from environment");
        provider.username = username;
    }
    if let Some(password) = lookup(ENV_PASSWORD) {
        debug!("Overriding provider.password from environment");
        provider.password = password;
    }
    if let Some(flag) = lookup(ENV_INSECURE_TRUST_ALL_TLS) {
        debug!("Overriding provider.insecure_trust_all_tls from environment");
        provider.insecure_trust_all_tls = parse_flag(&flag).ok_or_else(|| ConfigError::InvalidProvider {
            message: format!("{ENV_INSECURE_TRUST_ALL_TLS} must be true or false, got '{flag}'"),
        })?;
    }
    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Replaces every `${NAME}` in `value`.
///
/// Placeholders containing a dot are resource references and are kept.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] when a variable is not set.
pub fn expand_env<F>(value: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            expanded.push_str(&rest[start..]);
            return Ok(expanded);
        };
        let name = &after[..end];
        if name.contains('.') {
            expanded.push_str(&rest[start..start + 2 + end + 1]);
        } else {
            let resolved = lookup(name).ok_or_else(|| ConfigError::MissingEnvVar {
                name: name.to_string(),
            })?;
            expanded.push_str(&resolved);
        }
        rest = &after[end + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

/// Declaration file names searched for by default.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["dirconfig.yaml", "dirconfig.yml"];

/// Finds the declaration file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no declaration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found declaration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirConfigError;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_minimal() {
        let yaml = r"
provider:
  https_host: https://localhost:1443
  username: cn=administrator
  password: ${DS_PASSWORD}
";
        let file = ConfigParser::new().parse_yaml(yaml, None).expect("valid yaml");
        assert_eq!(file.provider.password, "${DS_PASSWORD}");
        assert!(file.resources.is_empty());
    }

    #[test]
    fn test_parse_error_reports_location() {
        let err = ConfigParser::new()
            .parse_yaml("provider: [", Some(Path::new("dirconfig.yaml")))
            .expect_err("invalid yaml");
        match err {
            DirConfigError::Config(ConfigError::ParseError { location, .. }) => {
                assert_eq!(location.as_deref(), Some("dirconfig.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_expand_env() {
        let lookup = env(&[("HOST", "ds.example.com"), ("PORT", "1443")]);
        assert_eq!(
            expand_env("https://${HOST}:${PORT}", &lookup).expect("expanded"),
            "https://ds.example.com:1443"
        );
        assert_eq!(expand_env("plain", &lookup).expect("expanded"), "plain");
        assert_eq!(expand_env("${a.b.c}", &lookup).expect("kept"), "${a.b.c}");
        assert_eq!(expand_env("open ${HOST", &lookup).expect("kept"), "open ${HOST");

        let err = expand_env("${NOPE}", &lookup).expect_err("missing");
        assert!(matches!(
            err,
            DirConfigError::Config(ConfigError::MissingEnvVar { ref name }) if name == "NOPE"
        ));
    }

    #[test]
    fn test_resolve_provider_overrides() {
        let mut provider = ProviderConfig {
            https_host: String::from("https://localhost:1443"),
            username: String::from("cn=administrator"),
            password: String::from("${DS_PASSWORD}"),
            insecure_trust_all_tls: false,
            timeout_secs: 30,
        };
        let lookup = env(&[
            ("DS_PASSWORD", "2FederateM0re"),
            (ENV_HTTPS_HOST, "https://ds:8443"),
            (ENV_INSECURE_TRUST_ALL_TLS, "TRUE"),
        ]);
        resolve_provider(&mut provider, lookup).expect("resolved");
        assert_eq!(provider.password, "2FederateM0re");
        assert_eq!(provider.https_host, "https://ds:8443");
        assert_eq!(provider.username, "cn=administrator");
        assert!(provider.insecure_trust_all_tls);
    }

    #[test]
    fn test_bad_flag_override() {
        let mut provider = ProviderConfig {
            https_host: String::from("https://localhost:1443"),
            username: String::from("cn=administrator"),
            password: String::new(),
            insecure_trust_all_tls: false,
            timeout_secs: 30,
        };
        let err = resolve_provider(&mut provider, env(&[(ENV_INSECURE_TRUST_ALL_TLS, "maybe")]))
            .expect_err("bad flag");
        assert!(matches!(err, DirConfigError::Config(ConfigError::InvalidProvider { .. })));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");
        std::fs::write(dir.path().join("dirconfig.yml"), "provider: {}").expect("write");

        let found = find_config_file(&nested).expect("found");
        assert_eq!(found, dir.path().join("dirconfig.yml"));
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ConfigParser::new()
            .load_file(dir.path().join("dirconfig.yaml"))
            .expect_err("missing");
        assert!(matches!(err, DirConfigError::Config(ConfigError::FileNotFound { .. })));
    }
}
