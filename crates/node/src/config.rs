//! `txp.conf` loading.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use txp_consensus::{
    chain_params, ChainParams, Coeff, Network, StakeholderId, TxFeePolicy, TxSizeLinear,
};
use txp_log::{Format, Level, LogConfig};

pub type ConfMap = HashMap<String, Vec<String>>;

#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub params: ChainParams,
    pub log: LogConfig,
}

impl NodeConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            params: chain_params(network),
            log: LogConfig::default(),
        }
    }
}

/// Reads `path`; a missing file yields the mainnet defaults.
pub fn load_node_config(path: &Path) -> Result<NodeConfig, String> {
    match load_conf(path)? {
        Some(conf) => node_config_from_conf(&conf, &path.display().to_string()),
        None => Ok(NodeConfig::for_network(Network::Mainnet)),
    }
}

pub fn load_conf(path: &Path) -> Result<Option<ConfMap>, String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse_conf(&contents))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(format!("failed to read {}: {err}", path.display())),
    }
}

/// Parses `key=value` lines. `#` and `;` start comments and a bare key means `1`.
pub fn parse_conf(contents: &str) -> ConfMap {
    let mut out = ConfMap::new();
    for raw_line in contents.lines() {
        let line = raw_line
            .split(['#', ';'])
            .next()
            .unwrap_or_default()
            .trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, "1"),
        };
        if key.is_empty() {
            continue;
        }
        out.entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
    }
    out
}

pub fn node_config_from_conf(conf: &ConfMap, source: &str) -> Result<NodeConfig, String> {
    let last = |key: &str| conf.get(key).and_then(|values| values.last());

    let network = match last("network") {
        Some(raw) => Network::parse(raw)
            .ok_or_else(|| format!("invalid network '{raw}' in {source}"))?,
        None => Network::Mainnet,
    };
    let mut config = NodeConfig::for_network(network);
    let params = &mut config.params;

    if let Some(raw) = last("mempoollimit") {
        params.mempool_limit = raw
            .parse()
            .map_err(|_| format!("invalid mempoollimit '{raw}' in {source}"))?;
    }
    if let Some(raw) = last("maxtxsize") {
        params.policy.max_tx_size = raw
            .parse()
            .map_err(|_| format!("invalid maxtxsize '{raw}' in {source}"))?;
    }
    if let Some(raw) = last("unlockstakeepoch") {
        params.policy.unlock_stake_epoch = raw
            .parse()
            .map_err(|_| format!("invalid unlockstakeepoch '{raw}' in {source}"))?;
    }

    let fee_a = last("txfeea")
        .map(|raw| parse_coeff(raw, "txfeea", source))
        .transpose()?;
    let fee_b = last("txfeeb")
        .map(|raw| parse_coeff(raw, "txfeeb", source))
        .transpose()?;
    if fee_a.is_some() || fee_b.is_some() {
        let (default_a, default_b) = match &params.policy.fee_policy {
            TxFeePolicy::SizeLinear(linear) => (linear.a, linear.b),
            TxFeePolicy::Unknown { .. } => (Coeff::default(), Coeff::default()),
        };
        params.policy.fee_policy = TxFeePolicy::SizeLinear(TxSizeLinear::new(
            fee_a.unwrap_or(default_a),
            fee_b.unwrap_or(default_b),
        ));
    }

    for raw in conf.get("bootstakeholder").into_iter().flatten() {
        let (id, weight) = parse_boot_stakeholder(raw)
            .ok_or_else(|| format!("invalid bootstakeholder '{raw}' in {source}"))?;
        params.boot_stakeholders.insert(id, weight);
    }

    if let Some(raw) = last("loglevel") {
        config.log.level =
            Level::parse(raw).ok_or_else(|| format!("invalid loglevel '{raw}' in {source}"))?;
    }
    if let Some(raw) = last("logformat") {
        config.log.format =
            Format::parse(raw).ok_or_else(|| format!("invalid logformat '{raw}' in {source}"))?;
    }
    if let Some(raw) = last("logtimestamps") {
        config.log.timestamps = parse_conf_bool(raw)
            .ok_or_else(|| format!("invalid logtimestamps value '{raw}' in {source}"))?;
    }
    Ok(config)
}

fn parse_coeff(raw: &str, key: &str, source: &str) -> Result<Coeff, String> {
    raw.parse::<i64>()
        .map(Coeff::from_nanos)
        .map_err(|_| format!("invalid {key} '{raw}' in {source}"))
}

/// `<stakeholder id hex>:<weight>`
fn parse_boot_stakeholder(raw: &str) -> Option<(StakeholderId, u16)> {
    let (id, weight) = raw.split_once(':')?;
    Some((StakeholderId::from_hex(id)?, weight.trim().parse().ok()?))
}

fn parse_conf_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Some(true);
    }
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
