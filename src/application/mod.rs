//! Application layer containing the core business logic orchestration.
//!
//! `PaymentOrchestrator` owns the payment lifecycle, `ConversationService` the
//! guided chat dialogue built on top of the `PaymentAdmin` contract. Both
//! serialize work per key with `KeyedLocks`.

pub mod conversation;
pub mod keyed_lock;
pub mod orchestrator;
