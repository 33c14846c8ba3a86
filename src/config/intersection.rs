use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use super::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct IntersectionConfig {
    pub geometry: IntersectionGeometry,
    #[serde(default)]
    pub signals: SignalTiming,
}

/// Canvas-space layout of the single crossing. Units are pixels.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntersectionGeometry {
    pub width: f32,
    pub height: f32,
    pub road_width: f32,
    /// Register curved right/left turn paths. Without them every turn
    /// intent resolves to the straight-through lane.
    #[serde(default)]
    pub turn_paths: bool,
}

impl Default for IntersectionGeometry {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            road_width: 60.0,
            turn_paths: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalTiming {
    pub yellow_duration_ms: f32,
    pub effect_duration_ms: f32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            yellow_duration_ms: 2000.0,
            effect_duration_ms: 500.0,
        }
    }
}

impl Validate for IntersectionConfig {
    fn validate(&self) -> Result<()> {
        let geometry = &self.geometry;
        if geometry.width <= 0.0 || geometry.height <= 0.0 {
            return Err(anyhow!("Canvas dimensions must be positive"));
        }

        if geometry.road_width <= 0.0 {
            return Err(anyhow!("Road width must be positive"));
        }

        if geometry.road_width >= geometry.width.min(geometry.height) {
            return Err(anyhow!(
                "Road width {} must be smaller than the canvas ({}x{})",
                geometry.road_width, geometry.width, geometry.height
            ));
        }

        let signals = &self.signals;
        if signals.yellow_duration_ms <= 0.0 {
            return Err(anyhow!("Yellow duration must be positive"));
        }

        if signals.effect_duration_ms < 0.0 {
            return Err(anyhow!("Effect duration must be non-negative"));
        }

        Ok(())
    }
}
