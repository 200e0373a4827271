// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

use std::sync::Arc;

use crate::proxy::Upstreams;

#[derive(Clone)]
pub struct GatewayState {
    pub client: reqwest::Client,
    pub upstreams: Arc<Upstreams>,
}

impl GatewayState {
    pub fn new(upstreams: Upstreams) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstreams: Arc::new(upstreams),
        }
    }
}
