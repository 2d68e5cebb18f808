// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod client;

pub use client::Client;

use crate::lotus_json::HasLotusJson;
use anyhow::Context as _;
use jsonrpsee::core::traits::ToRpcParams;
use multiaddr::{Multiaddr, Protocol};
use std::{env, fmt, marker::PhantomData, str::FromStr, time::Duration};
use url::Url;

pub const FULLNODE_API_INFO_KEY: &str = "FULLNODE_API_INFO";
pub const MINER_API_INFO_KEY: &str = "MINER_API_INFO";
pub const DEFAULT_FULLNODE_API: &str = "/ip4/127.0.0.1/tcp/1234/http";
pub const DEFAULT_MINER_API: &str = "/ip4/127.0.0.1/tcp/2345/http";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Lotus API versions, served under `/rpc/v0` and `/rpc/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ApiVersion {
    V0,
    V1,
}

impl ApiVersion {
    pub fn path(self) -> String {
        format!("/rpc/{self}")
    }
}

/// Token and address of a Lotus API endpoint, in the `token:multiaddr` form of
/// the `*_API_INFO` environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiInfo {
    multiaddr: Multiaddr,
    url: Url,
    pub token: Option<String>,
}

impl fmt::Display for ApiInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(token) = &self.token {
            token.fmt(f)?;
            write!(f, ":")?;
        }
        self.multiaddr.fmt(f)?;
        Ok(())
    }
}

impl FromStr for ApiInfo {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (token, host) = match s.split_once(':') {
            Some((token, host)) => (Some(token), host),
            None => (None, s),
        };
        let multiaddr: Multiaddr = host
            .parse()
            .with_context(|| format!("invalid multiaddr: {host}"))?;
        let url = multiaddr2url(&multiaddr).context("couldn't convert multiaddr to URL")?;
        Ok(ApiInfo {
            multiaddr,
            url,
            token: token.filter(|it| !it.is_empty()).map(String::from),
        })
    }
}

impl serde::Serialize for ApiInfo {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ApiInfo {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::lotus_json::stringify::deserialize(deserializer)
    }
}

impl ApiInfo {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Reads `key` from the environment, falling back to `default` when it is
    /// unset. Fails if the variable is malformed.
    pub fn from_env(key: &str, default: &str) -> anyhow::Result<Self> {
        match env::var(key) {
            Ok(it) => it.parse().with_context(|| format!("invalid {key}")),
            Err(env::VarError::NotPresent) => default.parse(),
            Err(it @ env::VarError::NotUnicode(_)) => Err(it.into()),
        }
    }
}

/// An `RpcRequest` is an at-rest description of a remote procedure call. It can
/// be invoked using [`Client::call`].
#[derive(Debug, Clone)]
pub struct RpcRequest<T = serde_json::Value> {
    pub method_name: &'static str,
    pub params: serde_json::Value,
    pub result_type: PhantomData<fn() -> T>,
    pub timeout: Duration,
}

impl<T> RpcRequest<T> {
    pub fn new<P: HasLotusJson>(method_name: &'static str, params: P) -> Self {
        RpcRequest {
            method_name,
            params: HasLotusJson::into_lotus_json_value(params).unwrap_or(
                serde_json::Value::String(
                    "INTERNAL ERROR: Parameters could not be serialized as JSON".to_string(),
                ),
            ),
            result_type: PhantomData,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl<T> ToRpcParams for RpcRequest<T> {
    fn to_rpc_params(self) -> Result<Option<Box<serde_json::value::RawValue>>, serde_json::Error> {
        match self.params {
            serde_json::Value::Null => Ok(None),
            params => Ok(Some(serde_json::value::to_raw_value(&params)?)),
        }
    }
}

/// `"/dns/example.com/tcp/8080/http" -> "http://example.com:8080/"`
///
/// Returns [`None`] on unsupported formats, or if there is a URL parsing error.
///
/// Note that [`Multiaddr`]s do NOT support a (URL) `path`, so that must be handled
/// out-of-band.
fn multiaddr2url(m: &Multiaddr) -> Option<Url> {
    let mut components = m.iter().peekable();
    let host = match components.next()? {
        Protocol::Dns(it) | Protocol::Dns4(it) | Protocol::Dns6(it) | Protocol::Dnsaddr(it) => {
            it.to_string()
        }
        Protocol::Ip4(it) => it.to_string(),
        Protocol::Ip6(it) => format!("[{it}]"),
        _ => return None,
    };
    let port = match components.peek() {
        Some(Protocol::Tcp(port)) => {
            let port = *port;
            components.next();
            Some(port)
        }
        _ => None,
    };
    let scheme = match components.next()? {
        Protocol::Http => "http",
        Protocol::Https => "https",
        Protocol::Ws(it) if it == "/" => "ws",
        Protocol::Wss(it) if it == "/" => "wss",
        _ => return None,
    };
    let None = components.next() else { return None };
    let parse_me = match port {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    };
    parse_me.parse().ok()
}
