use std::collections::BTreeMap;

use hubwire::{FormatRegistry, PoolConfig};
use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct PoolInfo {
    max_pooled: usize,
    initial_capacity: usize,
    max_retained_capacity: usize,
}

impl From<PoolConfig> for PoolInfo {
    fn from(config: PoolConfig) -> Self {
        Self {
            max_pooled: config.max_pooled,
            initial_capacity: config.initial_capacity,
            max_retained_capacity: config.max_retained_capacity,
        }
    }
}

#[derive(Serialize)]
struct EnvInfoOutput {
    version: String,
    target: String,
    rust_version: String,
    git_hash: String,
    platform: PlatformInfo,
    features: Vec<String>,
    formats: Vec<String>,
    pool: PoolInfo,
    dependencies: BTreeMap<String, String>,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut deps = BTreeMap::new();
    deps.insert("bytes".to_string(), "1".to_string());
    deps.insert("clap".to_string(), "4.5".to_string());
    deps.insert("serde_json".to_string(), "1.0".to_string());

    let mut env = BTreeMap::new();
    for name in ["HUBWIRE_LOG_FORMAT", "HUBWIRE_LOG_LEVEL", "RUST_LOG"] {
        env.insert(name.to_string(), std::env::var(name).ok());
    }

    let output = EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: target_triple(),
        rust_version: option_env!("RUSTC_VERSION")
            .unwrap_or("unknown")
            .to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        features: active_features(),
        formats: FormatRegistry::json()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        pool: PoolInfo::from(*hubwire::BufferPool::global().config()),
        dependencies: deps,
        environment: env,
    };

    print_record(&output, format);
    Ok(SUCCESS)
}

fn target_triple() -> String {
    option_env!("HUBWIRE_BUILD_TARGET")
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "{}-unknown-{}",
                std::env::consts::ARCH,
                std::env::consts::OS
            )
        })
}

fn active_features() -> Vec<String> {
    let mut features = Vec::new();
    if cfg!(feature = "cli") {
        features.push("cli".to_string());
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envinfo_json_reports_pool_defaults() {
        let out = EnvInfoOutput {
            version: "0.1.0".to_string(),
            target: "a-b-c".to_string(),
            rust_version: "1.85.0".to_string(),
            git_hash: "abc".to_string(),
            platform: PlatformInfo {
                os: "linux".to_string(),
                arch: "x86_64".to_string(),
            },
            features: vec!["cli".to_string()],
            formats: vec!["json".to_string()],
            pool: PoolInfo::from(PoolConfig::default()),
            dependencies: BTreeMap::new(),
            environment: BTreeMap::new(),
        };

        let json: serde_json::Value =
            serde_json::to_value(&out).expect("envinfo output should serialize");
        assert_eq!(json["pool"]["max_pooled"], 64);
        assert_eq!(json["pool"]["max_retained_capacity"], 65536);
        assert_eq!(json["formats"][0], "json");
    }

    #[test]
    fn target_looks_like_triple() {
        let target = target_triple();
        assert!(target.split('-').count() >= 3);
    }
}
