// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT
//! Environment Template Resolver
//!
//! Renders the value side of environment bindings with Handlebars, exposing
//! the running dependency containers as template data.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** `"{{db.host}}"` → the live container's address
//! - **Integration:** Built fresh per expansion, bound to
//!   `BuildContext.containers`
//!
//! # Supported Placeholders
//!
//! - `{{<label>.host}}` - address of the running container
//! - `{{<label>.container_id}}` - runtime container id
//! - `{{<label>.ports.[<port>]}}` - published host port for a container port
//!
//! Strict mode is on: a reference to a label (or attribute) that is not
//! running fails the render instead of expanding to an empty string.

use crate::domain::context::EnvError;
use crate::domain::runtime::ServiceHandle;
use handlebars::Handlebars;
use serde_json::{json, Value};
use std::collections::HashMap;

pub struct ContextResolver {
    handlebars: Handlebars<'static>,
    data: Value,
}

impl ContextResolver {
    /// Build a resolver bound to the given running containers.
    pub fn new(containers: &HashMap<String, ServiceHandle>) -> Self {
        let mut handlebars = Handlebars::new();
        // Unknown references must fail the expansion, not vanish.
        handlebars.set_strict_mode(true);

        let mut data = serde_json::Map::new();
        for (label, handle) in containers {
            data.insert(
                label.clone(),
                json!({
                    "host": handle.host,
                    "container_id": handle.id.as_str(),
                    "ports": handle.ports,
                }),
            );
        }

        Self {
            handlebars,
            data: Value::Object(data),
        }
    }

    /// Render one binding value. `key` is only used for error context.
    pub fn render(&self, key: &str, template: &str) -> Result<String, EnvError> {
        self.handlebars
            .render_template(template, &self.data)
            .map_err(|e| EnvError::Expansion {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}
