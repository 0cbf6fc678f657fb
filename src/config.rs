//! サーバー設定ロード（model_servers.yaml）
//!
//! 設定ファイルの形式:
//!
//! ```yaml
//! servers:
//!   - server: lambda5
//!     shortname: scout
//!     openai_api_key: ${SCOUT_API_KEY}
//!     openai_api_base: http://lambda5:8000/v1
//!     openai_model: meta-llama/Llama-4-Scout
//! ```
//!
//! 不正・欠落フィールドはすべてロード時エラーとし、ラウンド開始後に
//! 発覚させない。`openai_api_key` の `${VAR}` 参照はロード時に解決する。

use crate::error::{FleetError, Result};
use crate::types::ServerDescriptor;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// `openai_api_key` 未指定時のフォールバック環境変数
const FALLBACK_KEY_ENV: &str = "OPENAI_API_KEY";

/// YAMLトップレベル
#[derive(Debug, Deserialize)]
struct ServersFile {
    #[serde(default)]
    servers: Vec<ServerEntry>,
}

/// YAML内の1サーバー定義
#[derive(Debug, Deserialize)]
struct ServerEntry {
    server: String,
    shortname: String,
    #[serde(default)]
    openai_api_key: Option<String>,
    openai_api_base: String,
    openai_model: String,
}

/// 設定ファイルからサーバー記述子リストをロードする
///
/// shortnameの重複・空フィールド・解決不能なAPIキー参照はエラー。
/// ファイル内の記述順を保持する。
pub fn load_servers(path: &Path) -> Result<Vec<ServerDescriptor>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        FleetError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    let file: ServersFile = serde_yaml::from_str(&raw)?;

    if file.servers.is_empty() {
        return Err(FleetError::Config(format!(
            "no servers defined in {}",
            path.display()
        )));
    }

    let mut seen = HashSet::new();
    let mut descriptors = Vec::with_capacity(file.servers.len());
    for entry in file.servers {
        if entry.shortname.is_empty() {
            return Err(FleetError::Config("server entry with empty shortname".to_string()));
        }
        if !seen.insert(entry.shortname.clone()) {
            return Err(FleetError::Config(format!(
                "duplicate shortname: {}",
                entry.shortname
            )));
        }
        for (field, value) in [
            ("server", &entry.server),
            ("openai_api_base", &entry.openai_api_base),
            ("openai_model", &entry.openai_model),
        ] {
            if value.is_empty() {
                return Err(FleetError::Config(format!(
                    "server '{}': empty field '{}'",
                    entry.shortname, field
                )));
            }
        }

        let api_key = resolve_api_key(entry.openai_api_key.as_deref(), &entry.shortname)?;
        descriptors.push(ServerDescriptor {
            shortname: entry.shortname,
            server: entry.server,
            api_base: entry.openai_api_base,
            api_key,
            model: entry.openai_model,
        });
    }

    info!(count = descriptors.len(), path = %path.display(), "loaded server configuration");
    Ok(descriptors)
}

/// APIキーを解決する
///
/// `${VAR}` 形式は環境変数を参照し、未設定ならエラー。
/// キー自体が未指定なら `OPENAI_API_KEY` にフォールバックする。
fn resolve_api_key(raw: Option<&str>, shortname: &str) -> Result<String> {
    match raw {
        Some(value) => {
            if let Some(var) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
                std::env::var(var).map_err(|_| {
                    FleetError::Config(format!(
                        "server '{}': environment variable '{}' is not set",
                        shortname, var
                    ))
                })
            } else if value.is_empty() {
                Err(FleetError::Config(format!(
                    "server '{}': empty field 'openai_api_key'",
                    shortname
                )))
            } else {
                Ok(value.to_string())
            }
        }
        None => std::env::var(FALLBACK_KEY_ENV).map_err(|_| {
            FleetError::Config(format!(
                "server '{}': no openai_api_key and {} is not set",
                shortname, FALLBACK_KEY_ENV
            ))
        }),
    }
}

/// `--only` 指定でサーバーを絞り込む
///
/// 空の指定はフィルタなし。未知のshortname、絞り込み後に対象が
/// 空になる場合はエラー。
pub fn filter_servers(
    servers: Vec<ServerDescriptor>,
    only: &[String],
) -> Result<Vec<ServerDescriptor>> {
    if only.is_empty() {
        return Ok(servers);
    }

    let known: HashSet<&str> = servers.iter().map(|s| s.shortname.as_str()).collect();
    for name in only {
        if !known.contains(name.as_str()) {
            return Err(FleetError::Config(format!(
                "--only: unknown shortname '{}'",
                name
            )));
        }
    }

    let wanted: HashSet<&str> = only.iter().map(|s| s.as_str()).collect();
    let filtered: Vec<ServerDescriptor> = servers
        .into_iter()
        .filter(|s| wanted.contains(s.shortname.as_str()))
        .collect();

    if filtered.is_empty() {
        return Err(FleetError::Config("--only: no servers selected".to_string()));
    }
    Ok(filtered)
}
