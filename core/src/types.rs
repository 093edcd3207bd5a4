//! Shared primitive types used across the SLA engine.

/// A stable, unique identifier for a work item, site or technician.
pub type EntityId = String;

/// An SLA window length in whole minutes.
pub type Minutes = u32;
