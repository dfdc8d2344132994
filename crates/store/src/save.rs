//! Alias allocation on save.

use crate::error::{StoreError, StoreResult};
use crate::store::AliasStore;
use shortlink_core::config::AliasConfig;
use shortlink_core::{Alias, AliasGenerator, AliasRecord, TargetUrl};

/// Saves records under an explicit alias, or under a freshly generated one.
#[derive(Clone, Copy, Debug)]
pub struct AliasSaver {
    generator: AliasGenerator,
    max_attempts: u32,
}

impl AliasSaver {
    pub fn new(generator: AliasGenerator, max_attempts: u32) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &AliasConfig) -> Self {
        Self::new(AliasGenerator::new(config.length), config.max_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Save `target`, returning the stored record.
    ///
    /// With an explicit alias this is a single insert-if-absent and a taken alias
    /// fails with `AlreadyExists`. Without one, up to `max_attempts` generated
    /// candidates are tried; if every one collides the save fails with `Exhausted`.
    pub async fn save(
        &self,
        store: &dyn AliasStore,
        alias: Option<Alias>,
        target: TargetUrl,
    ) -> StoreResult<AliasRecord> {
        if let Some(alias) = alias {
            let record = AliasRecord::new(alias, target);
            store.insert(&record).await?;
            return Ok(record);
        }

        for attempt in 1..=self.max_attempts {
            let record = AliasRecord::new(self.generator.generate(), target.clone());
            match store.insert(&record).await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::debug!(
                            alias = %record.alias,
                            attempt,
                            "Generated alias accepted after collisions"
                        );
                    }
                    return Ok(record);
                }
                Err(StoreError::AlreadyExists(_)) => {
                    tracing::debug!(
                        candidate = %record.alias,
                        attempt,
                        max_attempts = self.max_attempts,
                        "Generated alias collided"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(
            attempts = self.max_attempts,
            alias_length = self.generator.length(),
            "Alias space exhausted for generated alias"
        );
        Err(StoreError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for AliasSaver {
    fn default() -> Self {
        Self::from_config(&AliasConfig::default())
    }
}
