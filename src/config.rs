//! Saved default flags.
//!
//! Defaults live in flag-token files: a global one under the platform config
//! directory and a local `.textpadrc` override. Files hold the same `--flag
//! value` tokens the command line accepts, one flag per line, `#` comments
//! allowed. The GitHub token is never written to these files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::document::FileType;

const APP_DIR: &str = "textpad";
const LOCAL_FILE: &str = ".textpadrc";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub filename: Option<String>,
    pub filetype: Option<FileType>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub repo_path: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub api_base: Option<String>,
    pub cache_name: Option<String>,
    pub asset_origin: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge two flag sets; values in `other` win.
    pub fn union(&self, other: &Self) -> Self {
        fn pick<T: Clone>(base: &Option<T>, over: &Option<T>) -> Option<T> {
            over.clone().or_else(|| base.clone())
        }
        Self {
            filename: pick(&self.filename, &other.filename),
            filetype: other.filetype.or(self.filetype),
            owner: pick(&self.owner, &other.owner),
            repo: pick(&self.repo, &other.repo),
            repo_path: pick(&self.repo_path, &other.repo_path),
            download_dir: pick(&self.download_dir, &other.download_dir),
            data_dir: pick(&self.data_dir, &other.data_dir),
            api_base: pick(&self.api_base, &other.api_base),
            cache_name: pick(&self.cache_name, &other.cache_name),
            asset_origin: pick(&self.asset_origin, &other.asset_origin),
            log_file: pick(&self.log_file, &other.log_file),
        }
    }

    /// `(flag, value)` pairs for every set option, in a stable order.
    fn entries(&self) -> Vec<(&'static str, String)> {
        let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        [
            ("--filename", self.filename.clone()),
            ("--filetype", self.filetype.map(|t| t.to_string())),
            ("--owner", self.owner.clone()),
            ("--repo", self.repo.clone()),
            ("--repo-path", self.repo_path.clone()),
            ("--download-dir", path(&self.download_dir)),
            ("--data-dir", path(&self.data_dir)),
            ("--api-base", self.api_base.clone()),
            ("--cache-name", self.cache_name.clone()),
            ("--asset-origin", self.asset_origin.clone()),
            ("--log-file", path(&self.log_file)),
        ]
        .into_iter()
        .filter_map(|(flag, value)| value.map(|v| (flag, v)))
        .collect()
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    PathBuf::from(LOCAL_FILE)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_FILE)
}

/// Where local storage and the asset cache live by default.
pub fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("LOCALAPPDATA") {
            return PathBuf::from(appdata).join(APP_DIR);
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR);
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join(APP_DIR);
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".local").join("share").join(APP_DIR);
        }
    }

    PathBuf::from(".textpad")
}

/// `~/Downloads` when it exists, else the current directory.
pub fn default_download_dir() -> PathBuf {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    if let Some(home) = home {
        let downloads = PathBuf::from(home).join("Downloads");
        if downloads.is_dir() {
            return downloads;
        }
    }
    PathBuf::from(".")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    // One flag per line; the value is the rest of the line so it may hold spaces.
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| match line.split_once(char::is_whitespace) {
            Some((flag, value)) => vec![flag.to_owned(), value.trim().to_owned()],
            None => vec![line.to_owned()],
        })
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# textpad defaults (saved with --save)".to_string()];
    lines.extend(
        flags
            .entries()
            .into_iter()
            .map(|(flag, value)| format!("{flag} {value}")),
    );
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick known flags out of a token list. Unknown tokens (the program name,
/// positional files, `--token`) are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value.to_string())),
            _ => (token, None),
        };
        if is_value_flag(name) {
            let value = inline.or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            });
            if let Some(value) = value {
                apply_flag(&mut flags, name, value);
            }
        }
        i += 1;
    }
    flags
}

fn is_value_flag(name: &str) -> bool {
    matches!(
        name,
        "--filename"
            | "--filetype"
            | "--owner"
            | "--repo"
            | "--repo-path"
            | "--download-dir"
            | "--data-dir"
            | "--api-base"
            | "--cache-name"
            | "--asset-origin"
            | "--log-file"
    )
}

fn apply_flag(flags: &mut ConfigFlags, name: &str, value: String) {
    match name {
        "--filename" => flags.filename = Some(value),
        "--filetype" => flags.filetype = value.parse().ok(),
        "--owner" => flags.owner = Some(value),
        "--repo" => flags.repo = Some(value),
        "--repo-path" => flags.repo_path = Some(value),
        "--download-dir" => flags.download_dir = Some(PathBuf::from(value)),
        "--data-dir" => flags.data_dir = Some(PathBuf::from(value)),
        "--api-base" => flags.api_base = Some(value),
        "--cache-name" => flags.cache_name = Some(value),
        "--asset-origin" => flags.asset_origin = Some(value),
        "--log-file" => flags.log_file = Some(PathBuf::from(value)),
        _ => {}
    }
}
