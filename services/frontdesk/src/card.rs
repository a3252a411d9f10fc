//! Digital visitor card numbers
//!
//! Cards look like `VIS` followed by six digits. Generation retries on
//! collision and falls back to the clock when every attempt collides.

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{error, warn};

use crate::store::VisitStore;

const CARD_PREFIX: &str = "VIS";
const MAX_ATTEMPTS: usize = 10;

/// Generate a card number not used by any recorded visit
pub async fn generate(visits: &dyn VisitStore) -> String {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = random_card();
        match visits.card_number_exists(&candidate).await {
            Ok(false) => return candidate,
            Ok(true) => {}
            Err(e) => error!("Failed to check card number uniqueness: {}", e),
        }
    }

    warn!(
        "No free card number after {} attempts, using clock fallback",
        MAX_ATTEMPTS
    );
    fallback_card(Utc::now().timestamp_millis())
}

fn random_card() -> String {
    let number: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    format!("{}{}", CARD_PREFIX, number)
}

/// `VIS` plus the last six digits of a millisecond timestamp
fn fallback_card(millis: i64) -> String {
    format!("{}{:06}", CARD_PREFIX, millis.rem_euclid(1_000_000))
}

/// Whether `card` has the `VIS` + six digits shape
pub fn is_valid(card: &str) -> bool {
    static CARD_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = CARD_REGEX
        .get_or_init(|| Regex::new(r"^VIS[0-9]{6}$").expect("Failed to compile card regex"));
    regex.is_match(card)
}
