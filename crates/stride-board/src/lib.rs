//! Sprint board services: column lifecycle, task placement, and the
//! consistency sweep that repairs order lists after interrupted writes.

pub mod columns;
pub mod reconcile;
pub mod tasks;

pub use reconcile::{reconcile_sprint, ReconcileReport};
