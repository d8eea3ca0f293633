//! Core traits and types for WattWise.
//!
//! This crate defines the foundational abstractions shared across the
//! workspace: the device/assumption/constraint value types consumed by the
//! optimizer, the action domain model persisted by the action store, and
//! the abstract LLM runtime the proposal planner talks to.

pub mod action;
pub mod device;
pub mod llm;

pub use action::{
    ActionDoc, ActionParameters, ActionProposal, ActionStatus, ActionType, SavingsSnapshot,
    AGENT_ID,
};
pub use device::{Assumptions, Constraints, Device, DeviceControl, DevicePower, UsageProfile};
pub use llm::{
    BackendId, FinishReason, GenerationParams, LlmError, LlmInput, LlmOutput, LlmRuntime, Message,
    MessageRole,
};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::action::{
        ActionDoc, ActionParameters, ActionProposal, ActionStatus, ActionType, SavingsSnapshot,
    };
    pub use crate::device::{Assumptions, Constraints, Device, DevicePower, UsageProfile};
    pub use crate::llm::{LlmError, LlmInput, LlmOutput, LlmRuntime, Message};
}
