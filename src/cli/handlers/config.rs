use std::fs;
use std::path::Path;

use crate::cli::commands::{ConfigAction, ConfigCmd};
use crate::io::config_io;
use crate::model::config::ClientConfig;

const CONFIG_TEMPLATE: &str = r##"# workly client configuration
# Edit freely, or use: wk config set <key> <value>

[api]
# API root; request paths are appended to it
base_url = "http://localhost:8000/api"
# Cookie header of a logged-in browser session. The CSRF token is read from it.
# cookie = "sessionid=...; csrftoken=..."
# timeout_secs = 30

[user]
# Your user id, used by --mine (see: wk users)
# id = 1

[ui]
# search_debounce_ms = 500
# json = false
"##;

pub fn cmd_config(cmd: ConfigCmd, path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match cmd.action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let mut config = config_io::load_config(path)?;
            config_io::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
            let shown = redacted(config);
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print!("{}", toml::to_string(&shown)?);
            }
        }
        ConfigAction::Set(args) => {
            if !path.exists() {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, CONFIG_TEMPLATE)?;
            }
            config_io::set_config_value(path, &args.key, &args.value)?;
            println!("{} = {}", args.key, shown_value(&args.key, &args.value));
        }
    }
    Ok(())
}

/// Keep the session secret out of terminal scrollback
fn redacted(mut config: ClientConfig) -> ClientConfig {
    if let Some(cookie) = &config.api.cookie {
        config.api.cookie = Some(redact_cookie(cookie));
    }
    config
}

fn shown_value(key: &str, value: &str) -> String {
    if key == "api.cookie" {
        redact_cookie(value)
    } else {
        value.to_string()
    }
}

fn redact_cookie(cookie: &str) -> String {
    cookie
        .split(';')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) => format!("{}=***", name.trim()),
            None => pair.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
