// ABOUTME: Live poll directive for slide content
// ABOUTME: Renders `::: poll question | options` as an Alpine.js voting widget

use super::BlockDirective;
use handlebars::html_escape;
use sha2::{Digest, Sha256};

const DEFAULT_OPTIONS: &str = "Yes, No";

/// Stable poll identifier: the first 8 hex digits of SHA-256 of the trimmed question.
pub fn poll_id(question: &str) -> String {
    let digest = Sha256::digest(question.trim().as_bytes());
    hex::encode(&digest[..4])
}

/// Whether `id` has the shape `poll_id` produces: 8 lowercase hex digits.
pub fn is_poll_id(id: &str) -> bool {
    id.len() == 8 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Split `question | a, b, c` into the question and its options.
fn parse_params(params: &str) -> (String, Vec<String>) {
    let (question, options) = match params.split_once('|') {
        Some((question, options)) => (question, options),
        None => (params, DEFAULT_OPTIONS),
    };
    let mut options: Vec<String> = options
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if options.is_empty() {
        options = DEFAULT_OPTIONS.split(", ").map(str::to_string).collect();
    }
    (question.trim().to_string(), options)
}

/// `::: poll <question> | <options>`
#[derive(Debug, Default, Clone, Copy)]
pub struct Poll;

impl BlockDirective for Poll {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn open(&self, params: &str) -> String {
        let (question, options) = parse_params(params);
        let id = poll_id(&question);
        // Serializing a Vec<String> cannot fail.
        let options_json = serde_json::to_string(&options).unwrap_or_else(|_| "[]".into());

        format!(
            r#"<div class="poll-container w-full max-w-2xl mx-auto my-8 p-6 glass rounded-xl" x-data="poll('{id}', {options})" x-init="init()" id="poll-{id}">
<h3 class="text-2xl font-bold mb-6 text-center">{question}</h3>
<div class="space-y-4">
<template x-for="(opt, idx) in options" :key="idx">
<div class="relative h-12 bg-white/5 rounded-lg overflow-hidden cursor-pointer hover:bg-white/10 transition-colors" @click="vote(idx)">
<div class="absolute top-0 left-0 h-full bg-blue-500/20 transition-all duration-500" :style="'width: ' + percent(idx) + '%'"></div>
<div class="absolute inset-0 flex items-center justify-between px-4 z-10">
<span x-text="opt" class="font-medium"></span>
<span class="text-sm opacity-70" x-text="percent(idx) + '% (' + (votes[idx] || 0) + ')'"></span>
</div>
</div>
</template>
</div>"#,
            id = id,
            options = html_escape(&options_json),
            question = html_escape(&question),
        )
    }
}
