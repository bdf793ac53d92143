//! Path classification.
//!
//! # Responsibilities
//! - Flag scanner probes (secrets, CMS admin pages) anywhere in the path
//! - Recognize public assets and the auth service's own routes
//! - Everything else is protected
//!
//! # Design Decisions
//! - Suspicious check runs first so probes never reach the auth layer
//! - Deny-list is substring containment, allow-list is prefix
//! - The root `/` is public only as an exact match

use crate::config::PathConfig;

/// Category of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Suspicious,
    Public,
    Protected,
}

/// Classifies request paths against the configured lists.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    suspicious: Vec<String>,
    public: Vec<String>,
}

impl PathClassifier {
    pub fn new(suspicious: Vec<String>, public: Vec<String>) -> Self {
        Self { suspicious, public }
    }

    pub fn from_config(config: &PathConfig) -> Self {
        Self::new(config.suspicious.clone(), config.public.clone())
    }

    pub fn classify(&self, path: &str) -> PathClass {
        if self.suspicious.iter().any(|probe| path.contains(probe.as_str())) {
            return PathClass::Suspicious;
        }

        let public = self.public.iter().any(|prefix| {
            if prefix == "/" {
                path == "/"
            } else {
                path.starts_with(prefix.as_str())
            }
        });

        if public {
            PathClass::Public
        } else {
            PathClass::Protected
        }
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::from_config(&PathConfig::default())
    }
}
