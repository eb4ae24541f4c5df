// src/feed/generator.rs
use rand::seq::SliceRandom;
use rand::Rng;

use crate::protocol::NewsItem;

/// Vocabulary for synthetic headlines: every positive word plus a negative twin.
pub const WORDS: [&str; 12] = [
    "up", "down", "rise", "fall", "good", "bad", "success", "failure", "high", "low", "über",
    "unter",
];

pub const MIN_HEADLINE_WORDS: usize = 3;
pub const MAX_HEADLINE_WORDS: usize = 5;

const RANDOMNESS_BOUND: u32 = 1000;
const FALLBACK_PRIORITY: u32 = 9;

/// Upper bounds (exclusive, per mille) of the cumulative priority distribution:
/// P(0)=29.3%, P(1)=19.3%, P(2)=14.3%, P(3)=10.9%, P(4)=8.4%,
/// P(5)=6.5%, P(6)=4.8%, P(7)=3.4%, P(8)=2.1%, P(9)=1.0%.
const CUMULATIVE_THRESHOLDS: [u32; 10] = [293, 486, 629, 738, 822, 887, 935, 969, 990, 1000];

/// Synthetic news source used by the demo client.
#[derive(Debug, Default, Clone, Copy)]
pub struct NewsContentGenerator;

impl NewsContentGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 3–5 distinct vocabulary words in random order, single-space separated.
    pub fn generate_headline(&self) -> String {
        self.headline_with(&mut rand::rng())
    }

    pub fn headline_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let count = rng.random_range(MIN_HEADLINE_WORDS..=MAX_HEADLINE_WORDS);
        let mut words = WORDS;
        words.shuffle(rng);
        words[..count].join(" ")
    }

    /// Priority in 0..=9, skewed towards low values.
    pub fn generate_priority(&self) -> u32 {
        priority_for_draw(rand::rng().random_range(0..RANDOMNESS_BOUND))
    }

    pub fn generate_item(&self) -> NewsItem {
        NewsItem::new(self.generate_headline(), self.generate_priority())
    }
}

/// Map a uniform draw in `0..1000` onto the priority distribution.
pub fn priority_for_draw(draw: u32) -> u32 {
    CUMULATIVE_THRESHOLDS
        .iter()
        .position(|&upper| draw < upper)
        .map(|p| p as u32)
        .unwrap_or(FALLBACK_PRIORITY)
}
