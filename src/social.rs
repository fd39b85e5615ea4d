use rand::RngExt;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Rapify,
    Rapple,
    TikTok,
    Instagram,
    YouTube,
    X,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Self::Rapify,
        Self::Rapple,
        Self::TikTok,
        Self::Instagram,
        Self::YouTube,
        Self::X,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Rapify => "Rapify",
            Self::Rapple => "Rapple Music",
            Self::TikTok => "TikTok",
            Self::Instagram => "Instagram",
            Self::YouTube => "YouTube",
            Self::X => "X",
        }
    }

    fn tuning(self) -> Tuning {
        match self {
            Self::Rapify => Tuning {
                follower_rate: 0.05,
                dampening: 1.0,
                engagement_rate: 0.02,
            },
            Self::Rapple => Tuning {
                follower_rate: 0.03,
                dampening: 1.0,
                engagement_rate: 0.015,
            },
            Self::TikTok => Tuning {
                follower_rate: 0.08,
                dampening: 2.0,
                engagement_rate: 0.12,
            },
            Self::Instagram => Tuning {
                follower_rate: 0.06,
                dampening: 1.5,
                engagement_rate: 0.08,
            },
            Self::YouTube => Tuning {
                follower_rate: 0.04,
                dampening: 1.5,
                engagement_rate: 0.05,
            },
            Self::X => Tuning {
                follower_rate: 0.05,
                dampening: 2.5,
                engagement_rate: 0.03,
            },
        }
    }
}

/// One row per platform; every screen reads the same constants.
struct Tuning {
    follower_rate: f64,
    dampening: f64,
    engagement_rate: f64,
}

pub fn estimate_followers(platform: Platform, lifetime_streams: u64) -> u64 {
    let tuning = platform.tuning();
    (lifetime_streams as f64 * tuning.follower_rate / tuning.dampening).floor() as u64
}

/// Likes, reposts or sound uses per post, depending on the platform.
pub fn estimate_engagement(platform: Platform, followers: u64) -> u64 {
    (followers as f64 * platform.tuning().engagement_rate).floor() as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformReach {
    pub platform: Platform,
    pub followers: u64,
    pub engagement: u64,
}

pub fn platform_reach(lifetime_streams: u64) -> Vec<PlatformReach> {
    Platform::ALL
        .into_iter()
        .map(|platform| {
            let followers = estimate_followers(platform, lifetime_streams);
            PlatformReach {
                platform,
                followers,
                engagement: estimate_engagement(platform, followers),
            }
        })
        .collect()
}

const LIVE_LISTENERS_MIN: u32 = 500;
const LIVE_LISTENERS_SPAN: u32 = 5_000;

/// Cosmetic "listening now" counter.
///
/// Owns its own RNG and is never consulted by ranking, rollup or the weekly
/// report, so its output must not be stored alongside them.
#[derive(Debug)]
pub struct LiveListenerTicker {
    rng: SmallRng,
}

impl LiveListenerTicker {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn next_count(&mut self) -> u32 {
        LIVE_LISTENERS_MIN + self.rng.random_range(0..LIVE_LISTENERS_SPAN)
    }
}

impl Default for LiveListenerTicker {
    fn default() -> Self {
        Self::new()
    }
}
