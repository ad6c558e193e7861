//! Command implementations for the DINSY CLI
//!
//! This module contains the individual command implementations, each in their own file
//! for better organization and maintainability.

pub mod check_wallet;
pub mod current_plan;
pub mod pay;
pub mod pay_plan;
pub mod quote;
pub mod ref_link;
pub mod register;
pub mod sponsor_wallet;
pub mod tiers;

// Re-export command execution functions for easy access
pub use check_wallet::execute as execute_check_wallet;
pub use current_plan::execute as execute_current_plan;
pub use pay::execute as execute_pay;
pub use pay_plan::execute as execute_pay_plan;
pub use quote::execute as execute_quote;
pub use ref_link::execute as execute_ref_link;
pub use register::execute as execute_register;
pub use sponsor_wallet::execute as execute_sponsor_wallet;
pub use tiers::execute as execute_tiers;
