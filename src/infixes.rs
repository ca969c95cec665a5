use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::info;

// Include default infixes at compile time
const DEFAULT_INFIXES_BYTES: &[u8] = include_bytes!("../default_root_infixes.txt");

pub const DEFAULT_INFIX_FILE: &str = "root_infixes.txt";

fn parse_infixes(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// The embedded infix list.
pub fn default_infixes() -> Vec<String> {
    parse_infixes(std::str::from_utf8(DEFAULT_INFIXES_BYTES).unwrap_or_default())
}

pub fn load_root_infixes(infix_file_path: Option<&Path>) -> Result<Vec<String>> {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "infix_loading",
        "Starting root infix loading"
    );

    let infixes = if let Some(path) = infix_file_path {
        info!(action = "load", component = "infix_file", file_path = ?path, "Loading infixes from specified file");
        if !path.exists() {
            anyhow::bail!("Infix file not found: {:?}", path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read infix file {:?}", path))?;
        let infixes = parse_infixes(&content);
        if infixes.is_empty() {
            anyhow::bail!("Infix file {:?} contains no entries", path);
        }
        infixes
    } else {
        let default_file = Path::new(DEFAULT_INFIX_FILE);
        let mut infixes = Vec::new();
        if default_file.exists() {
            info!(action = "load", component = "default_infix_file", file_path = ?default_file, "Loading infixes from default file");
            let content = fs::read_to_string(default_file)
                .with_context(|| format!("Failed to read infix file {:?}", default_file))?;
            infixes = parse_infixes(&content);
        }

        // If no infixes loaded, use embedded defaults
        if infixes.is_empty() {
            info!(
                action = "load",
                component = "embedded_infixes",
                "Using embedded default infixes"
            );
            let default_content = std::str::from_utf8(DEFAULT_INFIXES_BYTES)
                .context("Failed to decode embedded default infixes")?;
            infixes = parse_infixes(default_content);
        }
        infixes
    };

    info!(
        action = "complete",
        component = "infix_loading",
        infix_count = infixes.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Loaded root infixes"
    );
    Ok(infixes)
}

pub fn init_default_infixes() -> Result<()> {
    init_default_infixes_at(Path::new(DEFAULT_INFIX_FILE))
}

fn init_default_infixes_at(target: &Path) -> Result<()> {
    if target.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first if you want to reinitialize.",
            target.display()
        );
    }

    let default_content = std::str::from_utf8(DEFAULT_INFIXES_BYTES)
        .context("Failed to decode embedded default infixes")?;

    fs::write(target, default_content)?;
    println!("Created {} with default infixes", target.display());

    Ok(())
}
