// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Payload sanitization.
//!
//! The service expects trimmed values and `\r\n` line endings. Fields listed
//! in a schema are cleaned with their own [`Transform`], every other string
//! in the payload gets the default text treatment.

use crate::document::{split_list, Schema, Transform};

use serde_json::{Map, Value as Json};

/// Trim text and normalize line endings to `\r\n`.
pub fn sanitize_text(text: &str) -> String {
    text.trim().replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Trim list entries and drop blank ones.
pub fn sanitize_list<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Clean top-level payload values in place.
pub fn sanitize_payload(payload: &mut Map<String, Json>, schema: &Schema) {
    for (name, value) in payload.iter_mut() {
        let transform = schema
            .field(name)
            .map(|spec| spec.transform)
            .unwrap_or_default();
        apply(transform, value);
    }
}

fn apply(transform: Transform, value: &mut Json) {
    let replacement = match (transform, &*value) {
        (Transform::Text, Json::String(text)) => Json::String(sanitize_text(text)),
        (Transform::List, Json::String(text)) => Json::from(split_list(text)),
        (Transform::List, Json::Array(items)) => {
            Json::from(sanitize_list(items.iter().filter_map(Json::as_str)))
        }
        _ => return,
    };
    *value = replacement;
}
