//! Serde readers for float arrays whose missing values were written as JSON
//! `null` (serde_json's encoding of NaN).

use std::collections::BTreeMap;

use ndarray::{Array, Dimension};
use serde::{Deserialize, Deserializer};

pub fn array<'de, D, Dim>(deserializer: D) -> Result<Array<f64, Dim>, D::Error>
where
    D: Deserializer<'de>,
    Dim: Dimension + Deserialize<'de>,
{
    let values = Array::<Option<f64>, Dim>::deserialize(deserializer)?;
    Ok(values.mapv(|v| v.unwrap_or(f64::NAN)))
}

pub fn array_map<'de, D, Dim>(
    deserializer: D,
) -> Result<BTreeMap<String, Array<f64, Dim>>, D::Error>
where
    D: Deserializer<'de>,
    Dim: Dimension + Deserialize<'de>,
{
    let fields = BTreeMap::<String, Array<Option<f64>, Dim>>::deserialize(deserializer)?;
    Ok(fields
        .into_iter()
        .map(|(name, values)| (name, values.mapv(|v| v.unwrap_or(f64::NAN))))
        .collect())
}
