pub mod errors;

pub use errors::{AcwfError, AcwfErrorCategory, AcwfResult};

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const SQRT_2: f64 = std::f64::consts::SQRT_2;
const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Crystal structure prototype of a benchmark calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Configuration {
    Sc,
    Bcc,
    Fcc,
    Diamond,
    Xo,
    X2o,
    Xo3,
    Xo2,
    X2o3,
    X2o5,
}

impl Configuration {
    pub const ALL: [Configuration; 10] = [
        Self::Sc,
        Self::Bcc,
        Self::Fcc,
        Self::Diamond,
        Self::Xo,
        Self::X2o,
        Self::Xo3,
        Self::Xo2,
        Self::X2o3,
        Self::X2o5,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sc => "SC",
            Self::Bcc => "BCC",
            Self::Fcc => "FCC",
            Self::Diamond => "Diamond",
            Self::Xo => "XO",
            Self::X2o => "X2O",
            Self::Xo3 => "XO3",
            Self::Xo2 => "XO2",
            Self::X2o3 => "X2O3",
            Self::X2o5 => "X2O5",
        }
    }

    /// Number of simulation-cell volumes per atom that fill the conventional cube.
    pub const fn volume_per_atom_to_cubic_volume(self) -> f64 {
        match self {
            Self::Sc => 1.0,
            Self::Bcc => 2.0,
            Self::Fcc => 4.0,
            Self::Diamond => 8.0,
            Self::X2o => 12.0,
            Self::Xo => 8.0,
            Self::Xo2 => 12.0,
            Self::X2o3 => 10.0,
            Self::X2o5 => 14.0,
            Self::Xo3 => 4.0,
        }
    }

    /// Ratio between the first-neighbor distance and the cubic lattice parameter.
    pub const fn alat_to_first_neighbor_factor(self) -> f64 {
        match self {
            Self::Sc => 1.0,
            Self::Fcc => SQRT_2 / 2.0,
            Self::Bcc => SQRT_3 / 2.0,
            Self::Diamond => SQRT_3 / 4.0,
            Self::Xo => 0.5,
            Self::X2o => SQRT_3 / 4.0,
            Self::Xo3 => 0.5,
            Self::Xo2 => SQRT_3 / 4.0,
            Self::X2o3 => SQRT_3 / 4.0,
            Self::X2o5 => SQRT_3 / 4.0,
        }
    }

    pub const fn marker(self) -> Marker {
        match self {
            Self::Sc | Self::Xo => Marker::Square,
            Self::Fcc | Self::X2o => Marker::Circle,
            Self::Bcc | Self::Xo3 => Marker::Cross,
            Self::Diamond | Self::Xo2 => Marker::Triangle,
            Self::X2o3 => Marker::Diamond,
            Self::X2o5 => Marker::Plus,
        }
    }

    /// Atoms in the simulation cell the equation of state was fitted on.
    ///
    /// Only diamond cells hold two atoms; every other unary or oxide volume is
    /// reported per formula unit.
    pub fn atoms_in_simulation_cell(self) -> u32 {
        if self.as_str().contains("Diamond") { 2 } else { 1 }
    }
}

impl Display for Configuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for Configuration {
    type Err = AcwfError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == token)
            .ok_or_else(|| {
                AcwfError::input_validation(
                    "INPUT.UNKNOWN_CONFIGURATION",
                    format!("unknown configuration '{}'", token),
                )
            })
    }
}

impl Serialize for Configuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Square,
    Circle,
    Cross,
    Triangle,
    Diamond,
    Plus,
}

/// Explicit form of the `"{element}-{configuration}"` keys used in fit files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FitKey {
    pub element: String,
    pub configuration: Configuration,
}

impl FitKey {
    const DOPING_PREFIX: &'static str = "X/";

    pub fn parse(raw: &str) -> AcwfResult<Self> {
        let mut parts = raw.split('-');
        let (Some(element), Some(configuration), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AcwfError::input_validation(
                "INPUT.FIT_KEY",
                format!("fit key '{}' is not of the form 'element-configuration'", raw),
            ));
        };
        if element.is_empty() {
            return Err(AcwfError::input_validation(
                "INPUT.FIT_KEY",
                format!("fit key '{}' has an empty element symbol", raw),
            ));
        }

        let configuration = configuration
            .strip_prefix(Self::DOPING_PREFIX)
            .unwrap_or(configuration);
        Ok(Self {
            element: element.to_string(),
            configuration: configuration.parse()?,
        })
    }
}

/// Lattice parameters per configuration and element; `None` marks missing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AlatMap {
    entries: BTreeMap<Configuration, BTreeMap<String, Option<f64>>>,
}

impl AlatMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, configuration: Configuration, element: &str, alat: Option<f64>) {
        self.entries
            .entry(configuration)
            .or_default()
            .insert(element.to_string(), alat);
    }

    /// Alat for a pair; `None` both when the pair is absent and when it was recorded as missing.
    pub fn get(&self, configuration: Configuration, element: &str) -> Option<f64> {
        self.entries
            .get(&configuration)
            .and_then(|elements| elements.get(element))
            .copied()
            .flatten()
    }

    pub fn contains(&self, configuration: Configuration, element: &str) -> bool {
        self.entries
            .get(&configuration)
            .is_some_and(|elements| elements.contains_key(element))
    }

    pub fn configurations(&self) -> BTreeSet<Configuration> {
        self.entries.keys().copied().collect()
    }

    pub fn elements(&self, configuration: Configuration) -> Option<&BTreeMap<String, Option<f64>>> {
        self.entries.get(&configuration)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Configuration, &BTreeMap<String, Option<f64>>)> {
        self.entries
            .iter()
            .map(|(configuration, elements)| (*configuration, elements))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Known benchmark sets, each with a fixed plotting order of configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigurationFamily {
    Unaries,
    Oxides,
}

impl ConfigurationFamily {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unaries => "unaries",
            Self::Oxides => "oxides",
        }
    }

    pub const fn ordering(self) -> &'static [Configuration] {
        match self {
            Self::Unaries => &[
                Configuration::Sc,
                Configuration::Bcc,
                Configuration::Fcc,
                Configuration::Diamond,
            ],
            Self::Oxides => &[
                Configuration::X2o,
                Configuration::Xo,
                Configuration::X2o3,
                Configuration::Xo2,
                Configuration::X2o5,
                Configuration::Xo3,
            ],
        }
    }

    /// Classifies a configuration set by its sentinel member and requires an exact match.
    pub fn detect(configurations: &BTreeSet<Configuration>) -> AcwfResult<Self> {
        let family = if configurations.contains(&Configuration::Diamond) {
            Self::Unaries
        } else if configurations.contains(&Configuration::X2o5) {
            Self::Oxides
        } else {
            return Err(AcwfError::computation(
                "RUN.CONFIGURATION_SET",
                format!(
                    "unknown configuration set {}",
                    format_configurations(configurations.iter().copied())
                ),
            ));
        };

        let expected = family.ordering().iter().copied().collect::<BTreeSet<_>>();
        if &expected != configurations {
            return Err(AcwfError::computation(
                "RUN.CONFIGURATION_SET",
                format!(
                    "configuration set {} does not match the {} set {}",
                    format_configurations(configurations.iter().copied()),
                    family.as_str(),
                    format_configurations(family.ordering().iter().copied())
                ),
            ));
        }
        Ok(family)
    }
}

impl Display for ConfigurationFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for ConfigurationFamily {
    type Err = AcwfError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "unaries" => Ok(Self::Unaries),
            "oxides" => Ok(Self::Oxides),
            other => Err(AcwfError::input_validation(
                "INPUT.SET_NAME",
                format!("unknown set '{}'; expected 'unaries' or 'oxides'", other),
            )),
        }
    }
}

fn format_configurations(configurations: impl Iterator<Item = Configuration>) -> String {
    let names = configurations
        .map(Configuration::as_str)
        .collect::<Vec<_>>();
    format!("[{}]", names.join(", "))
}
