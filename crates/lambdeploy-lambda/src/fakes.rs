//! In-memory fakes for the function service traits (testing only)
//!
//! Provides `MemoryFunctionService`, which implements both
//! `FunctionPublisher` and `AliasMover` with the same observable contract as
//! the real service, plus call counters and one-shot failure injection.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::LambdaError;
use crate::service_traits::*;

#[derive(Debug, Default)]
struct FunctionState {
    /// Published archives, index `n` holds version `n + 1`
    versions: Vec<Vec<u8>>,
    aliases: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct ServiceState {
    functions: HashMap<String, FunctionState>,
    publish_calls: usize,
    alias_move_calls: usize,
    next_publish_error: Option<LambdaError>,
    next_alias_error: Option<LambdaError>,
}

/// In-memory function service backed by a `HashMap<function, FunctionState>`.
///
/// Versions are numbered `"1"`, `"2"`, … per function.
#[derive(Debug, Default)]
pub struct MemoryFunctionService {
    state: Mutex<ServiceState>,
}

impl MemoryFunctionService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a function with no versions and no aliases.
    pub fn with_function(self, function: &str) -> Self {
        self.lock()
            .functions
            .entry(function.to_string())
            .or_default();
        self
    }

    /// Register an alias pointing at `version`.
    ///
    /// The function is created if needed. The version is not checked, which
    /// mirrors an alias created against `$LATEST` or a pre-existing version.
    pub fn with_alias(self, function: &str, alias: &str, version: &str) -> Self {
        self.lock()
            .functions
            .entry(function.to_string())
            .or_default()
            .aliases
            .insert(alias.to_string(), version.to_string());
        self
    }

    /// Make the next `publish` call fail with `err`.
    pub fn fail_next_publish(&self, err: LambdaError) {
        self.lock().next_publish_error = Some(err);
    }

    /// Make the next `move_alias` call fail with `err`.
    pub fn fail_next_alias_move(&self, err: LambdaError) {
        self.lock().next_alias_error = Some(err);
    }

    /// Number of `publish` calls received, including failed ones.
    pub fn publish_calls(&self) -> usize {
        self.lock().publish_calls
    }

    /// Number of `move_alias` calls received, including failed ones.
    pub fn alias_move_calls(&self) -> usize {
        self.lock().alias_move_calls
    }

    /// Published version tokens for a function, oldest first.
    pub fn versions(&self, function: &str) -> Vec<String> {
        self.lock()
            .functions
            .get(function)
            .map(|f| (1..=f.versions.len()).map(|v| v.to_string()).collect())
            .unwrap_or_default()
    }

    /// The version an alias currently points at.
    pub fn alias_target(&self, function: &str, alias: &str) -> Option<String> {
        self.lock()
            .functions
            .get(function)
            .and_then(|f| f.aliases.get(alias).cloned())
    }

    /// The archive bytes stored for a published version.
    pub fn archive(&self, function: &str, version: &str) -> Option<Vec<u8>> {
        let index = version.parse::<usize>().ok()?.checked_sub(1)?;
        self.lock()
            .functions
            .get(function)
            .and_then(|f| f.versions.get(index).cloned())
    }
}

#[async_trait]
impl FunctionPublisher for MemoryFunctionService {
    async fn publish(
        &self,
        function: &FunctionId,
        archive: Vec<u8>,
    ) -> LambdaResult<PublishedVersion> {
        let mut state = self.lock();
        state.publish_calls += 1;
        if let Some(err) = state.next_publish_error.take() {
            return Err(err);
        }
        let entry = state
            .functions
            .get_mut(function.as_str())
            .ok_or_else(|| LambdaError::FunctionNotFound {
                function: function.to_string(),
            })?;
        entry.versions.push(archive);
        Ok(PublishedVersion::new(entry.versions.len().to_string()))
    }
}

#[async_trait]
impl AliasMover for MemoryFunctionService {
    async fn move_alias(
        &self,
        function: &FunctionId,
        alias: &str,
        version: &PublishedVersion,
    ) -> LambdaResult<AliasBinding> {
        let mut state = self.lock();
        state.alias_move_calls += 1;
        if let Some(err) = state.next_alias_error.take() {
            return Err(err);
        }
        let entry = state
            .functions
            .get_mut(function.as_str())
            .ok_or_else(|| LambdaError::FunctionNotFound {
                function: function.to_string(),
            })?;

        let known_version = version
            .as_str()
            .parse::<usize>()
            .map(|v| v >= 1 && v <= entry.versions.len())
            .unwrap_or(false);
        if !known_version {
            return Err(LambdaError::VersionNotFound {
                function: function.to_string(),
                version: version.to_string(),
            });
        }

        let target = entry
            .aliases
            .get_mut(alias)
            .ok_or_else(|| LambdaError::AliasNotFound {
                function: function.to_string(),
                alias: alias.to_string(),
            })?;
        *target = version.to_string();

        Ok(AliasBinding {
            function: function.clone(),
            alias: alias.to_string(),
            version: version.to_string(),
            alias_arn: None,
            bound_at: Utc::now(),
        })
    }
}
