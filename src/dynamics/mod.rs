//! Simulation dynamics: explicit Euler integration and the contact solver.

pub mod integrator;
pub mod solver;

pub use integrator::Integrator;
pub use solver::{ContactImpulse, ContactSolver, SolverStepMetrics};
