// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use anyhow::Context as _;
use http::{HeaderMap, HeaderValue, header};
use jsonrpsee::core::client::ClientT as _;
use tracing::debug;
use url::Url;

use super::{ApiInfo, ApiVersion, RpcRequest};
use crate::lotus_json::HasLotusJson;

/// JSON-RPC client of one Lotus API endpoint.
pub struct Client {
    url: Url,
    inner: ClientInner,
}

enum ClientInner {
    Ws(jsonrpsee::ws_client::WsClient),
    Https(jsonrpsee::http_client::HttpClient),
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("url", &self.url).finish()
    }
}

impl Client {
    pub async fn from_api_info(info: &ApiInfo, version: ApiVersion) -> anyhow::Result<Self> {
        let mut url = info.url().clone();
        url.set_path(&version.path());
        Self::from_url(url, info.token.as_deref()).await
    }

    pub async fn from_url(url: Url, token: Option<&str>) -> anyhow::Result<Self> {
        let headers = match token {
            Some(token) => HeaderMap::from_iter([(
                header::AUTHORIZATION,
                HeaderValue::try_from(format!("Bearer {token}"))
                    .context("invalid authorization token")?,
            )]),
            None => HeaderMap::new(),
        };
        let inner = match url.scheme() {
            "ws" | "wss" => ClientInner::Ws(
                jsonrpsee::ws_client::WsClientBuilder::new()
                    .set_headers(headers)
                    .build(url.as_str())
                    .await
                    .with_context(|| format!("couldn't connect to {url}"))?,
            ),
            "http" | "https" => ClientInner::Https(
                jsonrpsee::http_client::HttpClientBuilder::new()
                    .set_headers(headers)
                    .build(url.as_str())
                    .with_context(|| format!("couldn't create a client for {url}"))?,
            ),
            it => anyhow::bail!("unsupported URL scheme: {it}"),
        };
        Ok(Self { url, inner })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn call<T: HasLotusJson>(&self, req: RpcRequest<T>) -> anyhow::Result<T> {
        let method_name = req.method_name;
        let timeout = req.timeout;
        debug!(method = method_name, url = %self.url, "rpc call");
        let work = async {
            match &self.inner {
                ClientInner::Ws(it) => it.request::<T::LotusJson, _>(method_name, req).await,
                ClientInner::Https(it) => it.request::<T::LotusJson, _>(method_name, req).await,
            }
        };
        let result = tokio::time::timeout(timeout, work)
            .await
            .with_context(|| format!("{method_name} timed out after {timeout:?}"))?
            .with_context(|| format!("{method_name} failed"))?;
        Ok(T::from_lotus_json(result))
    }
}
