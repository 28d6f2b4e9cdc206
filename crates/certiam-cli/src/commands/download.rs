use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use crate::console::Console;
use crate::output::print_success;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Backend path, e.g. /apis/v1/certs/7/bundle.
    pub path: String,

    /// Query parameter as key=value; repeat a key to send a list.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Write the bytes here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// Collect parameters, turning a repeated key into an array.
fn to_query(params: &[(String, String)]) -> Map<String, Value> {
    let mut query = Map::new();
    for (key, value) in params {
        let value = Value::String(value.clone());
        match query.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                query.insert(key.clone(), value);
            }
        }
    }
    query
}

impl DownloadArgs {
    pub async fn run(self, console: &Console) -> Result<()> {
        let bytes = console.client.download(&self.path, &to_query(&self.params)).await?;
        match &self.output {
            Some(path) => {
                std::fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
                print_success(
                    &format!("Saved {} bytes to {}", bytes.len(), path.display()),
                    console.json,
                );
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&bytes).context("Failed to write to stdout")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("format=pem"), Ok(("format".into(), "pem".into())));
        assert_eq!(parse_param("q=a=b"), Ok(("q".into(), "a=b".into())));
        assert!(parse_param("=x").is_err());
        assert!(parse_param("flag").is_err());
    }

    #[test]
    fn test_repeated_params_become_lists() {
        let params = vec![
            ("id".to_string(), "1".to_string()),
            ("format".to_string(), "der".to_string()),
            ("id".to_string(), "2".to_string()),
            ("id".to_string(), "3".to_string()),
        ];
        assert_eq!(
            Value::Object(to_query(&params)),
            json!({"id": ["1", "2", "3"], "format": "der"})
        );
    }
}
