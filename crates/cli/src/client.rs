// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the avian service.

use anyhow::Context;
use avian_daemon::protocol::Reply;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct Client {
    base: String,
    http: reqwest::Client,
}

impl Client {
    /// Target the service at `AVIAN_ADDRESS`/`AVIAN_PORT`, defaulting to
    /// the local daemon.
    pub fn from_env() -> Self {
        let address = std::env::var("AVIAN_ADDRESS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        let port = std::env::var("AVIAN_PORT")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "8080".to_string());
        Self {
            base: format!("http://{address}:{port}/api/"),
            http: reqwest::Client::new(),
        }
    }

    /// Call one `Service.Method` endpoint. A non-empty `error` in the
    /// response is a failure regardless of the HTTP status.
    pub async fn post<Req, T>(&self, method: &str, request: &Req) -> anyhow::Result<T>
    where
        Req: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let reply: Reply<T> = self
            .http
            .post(format!("{}{}", self.base, method))
            .json(request)
            .send()
            .await
            .with_context(|| format!("cannot reach avian service at {}", self.base))?
            .json()
            .await
            .with_context(|| format!("invalid response from {method}"))?;
        reply.into_result().map_err(anyhow::Error::msg)
    }

    /// Call an endpoint whose response carries no body.
    pub async fn post_ack<Req>(&self, method: &str, request: &Req) -> anyhow::Result<()>
    where
        Req: Serialize + ?Sized,
    {
        let reply: Reply<avian_daemon::protocol::Ack> = self
            .http
            .post(format!("{}{}", self.base, method))
            .json(request)
            .send()
            .await
            .with_context(|| format!("cannot reach avian service at {}", self.base))?
            .json()
            .await
            .with_context(|| format!("invalid response from {method}"))?;
        reply.check().map_err(anyhow::Error::msg)
    }
}
