use anyhow::{Context, Result};

pub mod intersection;
pub mod traffic;
pub mod levels;

pub use intersection::*;
pub use traffic::*;
pub use levels::*;

#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    pub intersection: IntersectionConfig,
    pub traffic: TrafficConfig,
}

impl SimulationConfig {
    pub fn load_from_files(intersection_path: &str, traffic_path: &str) -> Result<Self> {
        let intersection_content = std::fs::read_to_string(intersection_path)
            .with_context(|| format!("reading {}", intersection_path))?;
        let traffic_content = std::fs::read_to_string(traffic_path)
            .with_context(|| format!("reading {}", traffic_path))?;

        Self::from_toml_strs(&intersection_content, &traffic_content)
    }

    pub fn from_toml_strs(intersection_toml: &str, traffic_toml: &str) -> Result<Self> {
        let intersection: IntersectionConfig = toml::from_str(intersection_toml)?;
        let traffic: TrafficConfig = toml::from_str(traffic_toml)?;

        // Validate configurations
        intersection.validate()?;
        traffic.validate()?;

        Ok(SimulationConfig { intersection, traffic })
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}
