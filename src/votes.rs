// ABOUTME: In-memory tallies for live slide polls
// ABOUTME: Counts votes per poll option and produces the broadcast payload

use crate::errors::{Result, SlideError};
use crate::message::PushMessage;
use crate::transform::is_poll_id;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Highest accepted option index is `MAX_OPTIONS - 1`.
pub const MAX_OPTIONS: usize = 64;

#[derive(Debug, Default)]
pub struct VoteBook {
    tallies: Mutex<HashMap<String, Vec<u64>>>,
}

impl VoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one vote and return the resulting `vote` message. Only ids
    /// shaped like a rendered poll's are tallied.
    pub fn record(&self, poll: &str, option: usize) -> Result<PushMessage> {
        if !is_poll_id(poll) {
            return Err(SlideError::ValidationError(format!(
                "invalid poll id {:?}",
                poll
            )));
        }
        if option >= MAX_OPTIONS {
            return Err(SlideError::ValidationError(format!(
                "option {} out of range (max {})",
                option,
                MAX_OPTIONS - 1
            )));
        }

        let mut tallies = self.tallies.lock();
        let counts = tallies.entry(poll.to_string()).or_default();
        if counts.len() <= option {
            counts.resize(option + 1, 0);
        }
        counts[option] += 1;

        Ok(PushMessage::Vote {
            poll: poll.to_string(),
            option,
            counts: counts.clone(),
        })
    }

    pub fn counts(&self, poll: &str) -> Vec<u64> {
        self.tallies.lock().get(poll).cloned().unwrap_or_default()
    }
}
