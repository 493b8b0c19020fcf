//! Strategy, worker profile and preference types

mod data;
pub mod token;

pub use data::{
    daily_sdi_from_centavos, first_of_month, salary_centavos, CivilStatus, Dependents, Priority, RiskTolerance, Strategy, StrategyMode,
    UserPreferences, WorkerProfile,
};
pub use token::StrategyToken;
