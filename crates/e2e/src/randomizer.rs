//! Unique suffixes for test data names

use rand::Rng;

/// Generate a 6-digit random number, for naming things that need unique names
pub fn generate_random_number() -> u32 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

/// `"{prefix} {6-digit number}"`
pub fn unique_name(prefix: &str) -> String {
    format!("{} {}", prefix, generate_random_number())
}
