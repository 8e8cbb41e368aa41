//! Block identifiers derived from display names.
//!
//! Every exported object gets one identifier that is used for its asset
//! folder, its description block and its pose-document key. Identifiers are
//! the display name with every character outside `[A-Za-z0-9_]` replaced by
//! `_`. When two names sanitize to the same identifier, later objects get a
//! numeric suffix (`_1`, `_2`, ...) in scene order.

use std::collections::HashSet;

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
///
/// ```
/// use composer_bundle::naming::sanitize_name;
/// assert_eq!(sanitize_name("Table #1"), "Table__1");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_owned()
    } else {
        sanitized
    }
}

/// Assigns unique identifiers in call order.
#[derive(Debug, Default)]
pub struct IdentifierTable {
    taken: HashSet<String>,
}

impl IdentifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize `name` and make it unique among identifiers handed out so far.
    pub fn assign(&mut self, name: &str) -> String {
        let base = sanitize_name(name);
        let mut candidate = base.clone();
        let mut suffix = 1u32;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        if candidate != base {
            tracing::debug!(name, identifier = %candidate, "sanitized name collided, suffixed");
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
