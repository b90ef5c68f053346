// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sliding-window limiter for outbound JWKS fetches.
//!
//! A burst of tokens naming an unknown `kid` would otherwise turn into one
//! JWKS request each. The limiter keeps the timestamps of recent fetches and
//! refuses new ones once the window is full.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Window length for "requests per minute".
const WINDOW: Duration = Duration::from_secs(60);

/// Shared sliding-window limiter.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Limiter allowing `requests_per_minute` acquisitions per minute.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(requests_per_minute, WINDOW)
    }

    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(limit as usize)),
        }
    }

    /// Record one request if the window has room.
    ///
    /// On refusal returns how long until the oldest request leaves the window.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let Ok(mut timestamps) = self.timestamps.lock() else {
            return Err(self.window);
        };

        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.limit as usize {
            let retry_after = timestamps
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return Err(retry_after);
        }

        timestamps.push_back(now);
        Ok(())
    }

    /// Requests still allowed in the current window.
    pub fn remaining(&self) -> u32 {
        let now = Instant::now();
        self.timestamps
            .lock()
            .map(|timestamps| {
                let used = timestamps
                    .iter()
                    .filter(|t| now.duration_since(**t) < self.window)
                    .count() as u32;
                self.limit.saturating_sub(used)
            })
            .unwrap_or(0)
    }
}
