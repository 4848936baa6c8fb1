// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod feedback;
pub mod geometry;
pub mod haptics;
pub mod logging;
pub mod runtime;
pub mod scheduler;
pub mod target;
pub mod tuning;
