//! Cluster reconciliation
//!
//! kubectl command construction, the create-or-update reconciler and the
//! once-only origin annotation.

pub mod annotation;
pub mod kubectl;
pub mod reconciler;

pub use annotation::{AnnotationOutcome, Annotator};
pub use kubectl::Kubectl;
pub use reconciler::{ReconcileOutcome, Reconciler};
