//! Configuration errors

use thiserror::Error;

/// Fatal problems with a [`SwarmConfig`](crate::SwarmConfig), detected before any
/// particle storage is allocated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("particle count must be positive")]
    EmptySwarm,

    #[error("repulsion radius must be a positive finite number (got {0})")]
    InvalidRepulsionRadius(f32),

    #[error("degenerate bounds: min {min:?} must be strictly below max {max:?} on both axes")]
    DegenerateBounds { min: [f32; 2], max: [f32; 2] },

    #[error("{name} must be non-negative (got {value})")]
    Negative { name: &'static str, value: f32 },

    #[error("{name} must be finite (got {value})")]
    NotFinite { name: &'static str, value: f32 },

    #[error("particle size must be positive (got {0})")]
    InvalidParticleSize(f32),

    #[error("grid of {width}x{height} cells does not fit in 32-bit cell indices")]
    GridTooLarge { width: u64, height: u64 },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let e = ConfigError::Negative {
            name: "drag",
            value: -0.5,
        };
        let msg = e.to_string();
        assert!(msg.contains("drag"));
        assert!(msg.contains("-0.5"));
    }

    #[test]
    fn non_finite_message_names_the_field() {
        let e = ConfigError::NotFinite {
            name: "gravity",
            value: f32::INFINITY,
        };
        assert_eq!(e.to_string(), "gravity must be finite (got inf)");
    }
}
