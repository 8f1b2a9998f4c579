// ABOUTME: Scripted HttpTransport fake that answers by URL path and records every request
// ABOUTME: Queued responses are served first, then the path's repeating default, else 404
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use healthmetrics_providers::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Clone)]
enum Scripted {
    Respond(HttpResponse),
    Fail(TransportError),
}

/// Transport that never touches the network
#[derive(Default)]
pub struct FakeTransport {
    queued: Mutex<HashMap<String, VecDeque<Scripted>>>,
    defaults: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

/// Path component of an absolute URL, without the query string
pub fn path_of(url: &str) -> String {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = after_scheme
        .find('/')
        .map_or("/", |idx| &after_scheme[idx..]);
    path.split('?').next().unwrap_or(path).to_owned()
}

/// Value of one query parameter of an absolute URL
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}

fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse {
        status,
        body: serde_json::to_vec(body).unwrap(),
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` once for `path`
    pub fn push_json(&self, path: &str, status: u16, body: Value) {
        self.push(path, Scripted::Respond(json_response(status, &body)));
    }

    /// Serve a raw body once for `path`
    pub fn push_raw(&self, path: &str, status: u16, body: &str) {
        self.push(
            path,
            Scripted::Respond(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
        );
    }

    /// Fail the next request to `path` at the transport level
    pub fn push_failure(&self, path: &str, error: TransportError) {
        self.push(path, Scripted::Fail(error));
    }

    /// Serve `body` for every request to `path` once its queue is empty
    pub fn always_json(&self, path: &str, status: u16, body: Value) {
        self.defaults.lock().unwrap().insert(
            path.to_owned(),
            Scripted::Respond(json_response(status, &body)),
        );
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.queued
            .lock()
            .unwrap()
            .entry(path.to_owned())
            .or_default()
            .push_back(scripted);
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests received for one path
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| path_of(&r.url) == path)
            .collect()
    }

    /// Number of requests received for one path
    pub fn calls_to(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    /// Number of requests received in total
    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = path_of(&request.url);
        self.requests.lock().unwrap().push(request);

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front);
        let scripted = queued.or_else(|| self.defaults.lock().unwrap().get(&path).cloned());

        match scripted {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            None => Ok(HttpResponse {
                status: 404,
                body: br#"{"error":"not scripted"}"#.to_vec(),
            }),
        }
    }
}
