//! Frame stages and dispatch sizing

use particle_physics::WORKGROUP_SIZE;

/// The three stages of a frame, in the only order they may run.
///
/// Each stage is encoded as one or more separate compute passes, and wgpu makes
/// all writes of a pass visible to the next one. The passes are the barriers
/// between stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Zero the grid offset tables
    Clear,
    /// Counting-sort every particle into its cell
    Build,
    /// Accumulate forces and integrate
    Simulate,
}

impl Stage {
    pub const ORDER: [Stage; 3] = [Stage::Clear, Stage::Build, Stage::Simulate];
}

/// Workgroups needed to cover `count` elements, rounded up so no element is
/// left without an invocation.
pub fn dispatch_size(count: u32, workgroup_size: u32) -> u32 {
    count.div_ceil(workgroup_size)
}

/// [`dispatch_size`] at the shared [`WORKGROUP_SIZE`].
pub fn workgroups_for(count: u32) -> u32 {
    dispatch_size(count, WORKGROUP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_rounds_up() {
        assert_eq!(dispatch_size(0, 256), 0);
        assert_eq!(dispatch_size(1, 256), 1);
        assert_eq!(dispatch_size(256, 256), 1);
        assert_eq!(dispatch_size(257, 256), 2);
        assert_eq!(dispatch_size(100_000, 256), 391);
    }

    #[test]
    fn every_element_gets_an_invocation() {
        for count in [1, 255, 256, 511, 512, 513, 14_400, 100_000] {
            assert!(workgroups_for(count) * WORKGROUP_SIZE >= count);
            assert!((workgroups_for(count) - 1) * WORKGROUP_SIZE < count);
        }
    }

    #[test]
    fn clear_comes_first_and_simulate_last() {
        assert_eq!(Stage::ORDER[0], Stage::Clear);
        assert_eq!(Stage::ORDER[2], Stage::Simulate);
    }
}
