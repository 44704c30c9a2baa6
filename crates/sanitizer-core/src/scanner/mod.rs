mod walk;

pub use walk::{probe, target_mirror, walk, Probe, Walk, WalkStats};
