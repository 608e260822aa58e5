use crate::csm::{MapSettings, MAXIMUM_BUCKETS_PER_AXIS};
use color_eyre::eyre::eyre;
use config::{Config, File};
use nalgebra::RealField;
use serde::{de::DeserializeOwned, Deserialize};
use std::env;

#[derive(Debug, Deserialize)]
pub(crate) struct Configuration<T> {
    pub(crate) mesh: MeshConfiguration<T>,
    pub(crate) refinement: RefinementConfiguration,
    #[serde(default)]
    pub(crate) map: MapSettings,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeshConfiguration<T> {
    /// Distance added around the bounding box of the structure on every side
    pub(crate) padding: T,
    pub(crate) cells_per_dim: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefinementConfiguration {
    pub(crate) maximum_passes: usize,
    /// Simplices holding more charges than this are refined
    pub(crate) maximum_charges_per_simplex: usize,
}

impl<T: DeserializeOwned> Configuration<T> {
    pub(crate) fn build() -> color_eyre::Result<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // The default settings, used in the general case
            .add_source(File::with_name(".config/default"))
            // The override settings which may be set by the user, optional
            .add_source(File::with_name(&format!(".config/{}", run_mode)).required(false))
            .build()?;

        s.try_deserialize()
            .map_err(|e| eyre!(format!("Failed to deserialize the config file: {:?}", e)))
    }
}

impl<T: Copy + RealField> Configuration<T> {
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.mesh.cells_per_dim > 0,
            "the initial mesh needs at least one cell per dimension"
        );
        anyhow::ensure!(
            self.mesh.padding >= T::zero(),
            "the mesh padding cannot be negative"
        );
        anyhow::ensure!(
            self.refinement.maximum_charges_per_simplex > 0,
            "refinement cannot empty every simplex of charges"
        );
        anyhow::ensure!(
            self.map.pool_block_size > 0,
            "the link pool block size must be positive"
        );
        if let Some(buckets_per_axis) = self.map.buckets_per_axis {
            anyhow::ensure!(
                (1..=MAXIMUM_BUCKETS_PER_AXIS).contains(&buckets_per_axis),
                "the locator takes between 1 and {} buckets per axis, found {}",
                MAXIMUM_BUCKETS_PER_AXIS,
                buckets_per_axis
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Configuration;
    use crate::csm::LocatorKind;
    use config::{Config, File, FileFormat};

    fn parse(source: &str) -> Configuration<f64> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn default_configuration_is_valid() {
        let config = parse(include_str!("../../../.config/default.toml"));
        config.validate().unwrap();
        assert_eq!(config.map.locator, LocatorKind::Bucketed);
    }

    #[test]
    fn map_section_is_optional() {
        let config = parse(
            r#"
            [mesh]
            padding = 2.0
            cells_per_dim = 3
            [refinement]
            maximum_passes = 4
            maximum_charges_per_simplex = 8
            "#,
        );
        assert_eq!(config.map, crate::csm::MapSettings::default());
        approx::assert_relative_eq!(config.mesh.padding, 2.0);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config = parse(
            r#"
            [mesh]
            padding = -1.0
            cells_per_dim = 3
            [refinement]
            maximum_passes = 4
            maximum_charges_per_simplex = 8
            [map]
            locator = "naive"
            "#,
        );
        assert_eq!(config.map.locator, LocatorKind::Naive);
        assert!(config.validate().is_err());
    }

    #[test]
    fn bucket_resolution_is_bounded() {
        let mut config = parse(include_str!("../../../.config/default.toml"));
        config.map.buckets_per_axis = Some(3_000_000);
        assert!(config.validate().is_err());
        config.map.buckets_per_axis = Some(0);
        assert!(config.validate().is_err());
        config.map.buckets_per_axis = Some(16);
        config.validate().unwrap();
    }
}
