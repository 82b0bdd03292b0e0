use anyhow::Result;
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::store::CodeStore;

/// Length of generated challenge ids.
const ID_LENGTH: usize = 20;

/// Code length used when a caller asks for zero digits.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Issues numeric codes and checks answers against a [`CodeStore`].
#[derive(Debug, Clone)]
pub struct Verifier<S> {
    store: S,
}

impl<S: CodeStore> Verifier<S> {
    /// Creates a verifier backed by `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Issues a code of `len` digits and stores it under a fresh id.
    ///
    /// Returns `(id, code)`. The caller delivers the code (image, SMS, mail)
    /// and later passes the id and the user's answer to [`Verifier::verify`].
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejects the code.
    pub async fn generate(&self, len: usize) -> Result<(String, String)> {
        let len = if len == 0 { DEFAULT_CODE_LENGTH } else { len };
        let (id, code): (String, String) = {
            let mut rng = rand::rng();
            let id = (&mut rng).sample_iter(Alphanumeric).take(ID_LENGTH).map(char::from).collect();
            let code = (0..len).map(|_| char::from(b'0' + rng.random_range(0..10_u8))).collect();
            (id, code)
        };

        self.store.set(id.clone(), code.clone()).await?;
        tracing::debug!("issued {len}-digit code: {id}");
        Ok((id, code))
    }

    /// Checks `answer` against the code stored under `id`.
    ///
    /// The comparison ignores surrounding whitespace and ASCII case. When
    /// `clear` is set the code is removed after the check, whatever the
    /// outcome, so it cannot be tried again. Missing, expired and unreadable
    /// codes never match.
    pub async fn verify(&self, id: &str, answer: &str, clear: bool) -> bool {
        let stored = match self.store.get(id.to_string()).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("failed to read code for {id}: {e:#}");
                None
            }
        };

        if clear && let Err(e) = self.store.delete(id.to_string()).await {
            tracing::warn!("failed to clear code for {id}: {e:#}");
        }

        let answer = answer.trim();
        let matched = !answer.is_empty()
            && stored.is_some_and(|code| code.trim().eq_ignore_ascii_case(answer));
        tracing::debug!(id, matched, "verified code");
        matched
    }
}
