use std::sync::{Mutex, MutexGuard, PoisonError};

use url::Url;

use crate::common::data::Expectation;

/// The ordered set of expectations a mock server answers from.
///
/// The expectations themselves are never handed out. All access goes through a
/// [RegistryGuard], which holds the lock for as long as it lives.
#[derive(Default)]
pub(crate) struct ExpectationRegistry {
    expectations: Mutex<Vec<Expectation>>,
}

impl ExpectationRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acquires the registry lock. A lock poisoned by a panicking reporter is recovered, since
    /// the expectations are plain data that a panic cannot leave half-updated.
    pub(crate) fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            expectations: self
                .expectations
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

pub(crate) struct RegistryGuard<'a> {
    expectations: MutexGuard<'a, Vec<Expectation>>,
}

impl<'a> RegistryGuard<'a> {
    pub(crate) fn register(&mut self, expectation: Expectation) {
        tracing::debug!(
            "Registering expectation #{} for {}",
            self.expectations.len(),
            expectation.url
        );
        self.expectations.push(expectation);
    }

    /// Finds the earliest registered expectation for `url` that has not been called yet and
    /// marks it as called.
    pub(crate) fn claim(&mut self, url: &Url) -> Option<&Expectation> {
        let (idx, expectation) = self
            .expectations
            .iter_mut()
            .enumerate()
            .find(|(_, e)| !e.called && e.url == *url)?;

        tracing::debug!("Request for {} matched expectation #{}", url, idx);
        expectation.called = true;

        Some(&*expectation)
    }

    /// Required expectations that never received a request, in registration order.
    pub(crate) fn missing(&self) -> impl Iterator<Item = &Expectation> {
        self.expectations.iter().filter(|e| e.is_missing())
    }

    pub(crate) fn len(&self) -> usize {
        self.expectations.len()
    }
}
