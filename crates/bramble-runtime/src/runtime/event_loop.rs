// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Deferred callback queue (`process.nextTick`)

use bramble_script::Value;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A callback queued with its arguments
#[derive(Debug, Clone)]
pub struct Tick {
    /// The function to call
    pub callback: Value,
    /// Arguments passed to the callback
    pub args: Vec<Value>,
}

/// FIFO of deferred callbacks, drained after the entry module loads
#[derive(Debug, Default)]
pub struct TickQueue {
    queue: Mutex<VecDeque<Tick>>,
}

impl TickQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a callback
    pub fn push(&self, callback: Value, args: Vec<Value>) {
        self.queue.lock().push_back(Tick { callback, args });
    }

    /// Takes the oldest callback
    pub fn pop(&self) -> Option<Tick> {
        self.queue.lock().pop_front()
    }

    /// Number of queued callbacks
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
