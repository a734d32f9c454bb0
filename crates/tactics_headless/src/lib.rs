//! Headless scenario runner for CI and terminal review.
//!
//! Loads a scenario (a RON file holding an ASCII layout, extra placements
//! and tunables), runs the world without graphics and reports on it:
//!
//! - **JSON summaries**: unit states, transforms and event totals on stdout
//! - **Determinism checks**: repeated runs plus a snapshot resume
//! - **ASCII rendering**: the map, a unit's vision cone, or a planned path
//!
//! Logs go to stderr.
//!
//! # Example
//!
//! ```bash
//! # Run the bundled heist and print a summary
//! cargo run -p tactics_headless -- run --ticks 600
//!
//! # Verify determinism of a scenario file
//! cargo run -p tactics_headless -- verify --scenario levels/heist.ron --runs 5
//! ```

pub mod ascii_visualizer;
pub mod runner;
pub mod scenario;

pub use ascii_visualizer::{render_tilemap, render_world, AsciiConfig, Overlay};
pub use runner::{verify_determinism, HeadlessRunner, RunSummary, VerifyReport};
pub use scenario::{Scenario, ScenarioError};
