// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

use std::sync::Arc;

use fishpath_auth::TokenIssuer;

use crate::store::SharedUserStore;

#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub users: SharedUserStore,
}

impl AppState {
    pub fn new(issuer: TokenIssuer, users: SharedUserStore) -> Self {
        Self {
            issuer: Arc::new(issuer),
            users,
        }
    }
}
