#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod review_service;
pub mod sessions;
pub mod stats_service;
pub mod streak_service;

pub use learn_core::Clock;

pub use app_services::StudyServices;
pub use config::{StatsSettings, StudyConfig};
pub use error::{
    ConfigError, ReviewServiceError, StatsError, StreakServiceError, StudyServiceError,
};
pub use review_service::ReviewService;
pub use sessions::{StudyAnswer, StudyLoopService};
pub use stats_service::{DashboardStats, StatsService};
pub use streak_service::StreakService;
