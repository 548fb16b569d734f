//! The `recque init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("recque.toml").exists() {
        println!("recque.toml already exists, skipping.");
    } else {
        std::fs::write("recque.toml", SAMPLE_CONFIG)?;
        println!("Created recque.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit recque.toml with your API key (or keep provider \"mock\" to try it offline)");
    println!("  2. Run: recque learn \"basic math\"");
    println!("  3. List saved sessions with: recque sessions");

    Ok(())
}

// Top-level keys must precede the first [providers.*] table, or TOML
// assigns them to that table.
const SAMPLE_CONFIG: &str = r#"# recque configuration

default_provider = "openai"
data_dir = "./recque-sessions"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
model = "gpt-4o-mini"
# Ask the model to double-check each generated question:
# verify = true

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
model = "llama3.1"

# Deterministic offline provider, no API key needed.
[providers.mock]
type = "mock"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use recque_providers::RecqueConfig;
    use std::path::PathBuf;

    #[test]
    fn sample_config_keeps_top_level_keys_out_of_provider_tables() {
        let config: RecqueConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.data_dir, PathBuf::from("./recque-sessions"));
        assert_eq!(config.providers.len(), 3);
    }
}
