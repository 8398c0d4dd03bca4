// Matching module - pairs sales with purchases and values held inventory

pub mod inventory;
pub mod signature;
pub mod transactions;

pub use inventory::{match_inventory, ValuedInventoryItem};
pub use signature::{signature, Signature};
pub use transactions::{match_transactions, Match, MatchType, Reconciler};
