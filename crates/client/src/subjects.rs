use std::sync::Arc;

use dashmap::DashMap;

/// Replace characters with special meaning in broker subjects.
/// Keeps ASCII alphanumerics, `_` and `-`; everything else becomes `-`.
pub fn sanitize_subject_token(token: &str) -> String {
    token
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Helper for project-scoped subject formatting.
/// Caches formatted subjects to avoid repeated allocations.
pub struct SubjectBuilder {
    /// Pre-computed base prefix: "{project}."
    base_prefix: Arc<str>,
    /// Pre-computed wildcard subject
    wildcard: Arc<str>,
    /// Cache of subscription name -> full subject
    cache: DashMap<Arc<str>, Arc<str>>,
}

impl SubjectBuilder {
    pub fn new(project: impl Into<String>) -> Self {
        let project = project.into();
        let base_prefix: Arc<str> = format!("{}.", project).into();
        let wildcard: Arc<str> = format!("{}.>", project).into();
        Self {
            base_prefix,
            wildcard,
            cache: DashMap::new(),
        }
    }

    /// Build subject for a subscription: {project}.{name}
    /// Cached - first call allocates, subsequent calls return Arc clone.
    pub fn subscription(&self, name: &str) -> Arc<str> {
        if let Some(cached) = self.cache.get(name) {
            return Arc::clone(cached.value());
        }

        let name_arc: Arc<str> = name.into();
        let subject: Arc<str> =
            format!("{}{}", self.base_prefix, sanitize_subject_token(name)).into();
        self.cache.insert(Arc::clone(&name_arc), Arc::clone(&subject));
        subject
    }

    /// Wildcard subject for every subscription in the project: {project}.>
    pub fn all(&self) -> &str {
        &self.wildcard
    }
}
