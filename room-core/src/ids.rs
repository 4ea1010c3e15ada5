use rand::{Rng, distributions::Alphanumeric};
use room_types::RoomError;
use tracing::{debug, error};

pub const DEFAULT_ID_LENGTH: usize = 8;
pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 10;

/// Source of short random identifiers. Carries no uniqueness guarantee;
/// callers check their own namespace via [`generate_unique_id`].
pub trait IdGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self, length: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPolicy {
    pub length: usize,
    pub max_attempts: u32,
}

impl Default for IdPolicy {
    fn default() -> Self {
        Self {
            length: DEFAULT_ID_LENGTH,
            max_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

/// Random alphanumeric identifier, `DEFAULT_ID_LENGTH` chars unless given
pub fn generate_id(length: Option<usize>) -> String {
    RandomIdGenerator.generate(length.unwrap_or(DEFAULT_ID_LENGTH))
}

/// Draw identifiers until one is not taken, giving up after `policy.max_attempts`.
pub fn generate_unique_id<G, F>(
    generator: &G,
    policy: IdPolicy,
    is_taken: F,
) -> Result<String, RoomError>
where
    G: IdGenerator + ?Sized,
    F: Fn(&str) -> bool,
{
    for attempt in 1..=policy.max_attempts {
        let candidate = generator.generate(policy.length);
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
        debug!("ID collision on attempt {}: {}", attempt, candidate);
    }

    error!(
        "Exhausted {} attempts generating a unique ID of length {}",
        policy.max_attempts, policy.length
    );
    Err(RoomError::ExhaustedRetries {
        attempts: policy.max_attempts,
    })
}
