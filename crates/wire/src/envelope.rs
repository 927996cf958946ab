// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response correlation (§4.1, §6.3): every message on the
//! wire carries a `request_id` so a client multiplexing several
//! requests over one connection can match each response to its call.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub request_id: String,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn new(request_id: String, body: T) -> Self {
        Self { request_id, body }
    }
}

/// A short, URL-safe, collision-resistant id for one request.
pub fn new_request_id() -> String {
    nanoid::nanoid!(12)
}
