mod bookkeeping;
mod hazard;
mod household;
mod insurance;
mod subsidy;

pub use bookkeeping::BookkeepingSystem;
pub use hazard::HazardSystem;
pub use household::HouseholdSystem;
pub use insurance::InsuranceSystem;
pub use subsidy::SubsidySystem;
