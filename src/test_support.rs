//! Scripted transport and recording sleeper for unit tests.

use crate::metadata::RequestMetadata;
use crate::retry::Sleeper;
use crate::transport::{RawResponse, Transport, TransportError};
use async_trait::async_trait;
use http::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

type Outcome = Result<RawResponse, TransportError>;

/// Replays a fixed sequence of outcomes, or one outcome forever.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Option<Outcome>,
    requests: Mutex<Vec<RequestMetadata>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(outcome: Outcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(outcome),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RequestMetadata> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: &RequestMetadata) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let next = self.script.lock().unwrap().pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(outcome) => outcome,
            None => panic!("transport script exhausted at {}", request.path()),
        }
    }
}

/// Records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn ok_body(body: &str) -> RawResponse {
    RawResponse::new(StatusCode::OK, body)
}
