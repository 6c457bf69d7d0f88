//! Body-mass index computation and persistence.
//!
//! The index is `weight / height²` with weight in kilograms and height in
//! metres, rounded to two decimals. Heights above 3 are taken to be
//! centimetres. Categories follow the six-bucket table:
//!
//! | BMI          | Category           |
//! |--------------|--------------------|
//! | < 18.5       | Abaixo do peso     |
//! | [18.5, 25)   | Peso normal        |
//! | [25, 30)     | Sobrepeso          |
//! | [30, 35)     | Obesidade Grau I   |
//! | [35, 40)     | Obesidade Grau II  |
//! | >= 40        | Obesidade Grau III |

use crate::store::{self, KeyValueStore, BMI_KEY};
use crate::{BmiRecord, Error, Method, RemoteApi, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heights above this are interpreted as centimetres
const CENTIMETRE_THRESHOLD: f64 = 3.0;

/// BMI classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    ObesityGradeI,
    ObesityGradeII,
    ObesityGradeIII,
}

impl BmiCategory {
    /// Classify a (rounded) BMI value; lower bounds are inclusive
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else if bmi < 35.0 {
            BmiCategory::ObesityGradeI
        } else if bmi < 40.0 {
            BmiCategory::ObesityGradeII
        } else {
            BmiCategory::ObesityGradeIII
        }
    }

    /// Display label as shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Abaixo do peso",
            BmiCategory::Normal => "Peso normal",
            BmiCategory::Overweight => "Sobrepeso",
            BmiCategory::ObesityGradeI => "Obesidade Grau I",
            BmiCategory::ObesityGradeII => "Obesidade Grau II",
            BmiCategory::ObesityGradeIII => "Obesidade Grau III",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Convert a height to metres, treating values above 3 as centimetres
pub fn normalize_height(height: f64) -> f64 {
    if height > CENTIMETRE_THRESHOLD {
        height / 100.0
    } else {
        height
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute BMI and category from raw inputs
///
/// Fails with [`Error::Validation`] when either input is non-positive or
/// not a finite number; nothing is computed in that case.
pub fn calculate_bmi(weight: f64, height: f64) -> Result<BmiRecord> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(Error::Validation(format!(
            "weight must be a positive number, got {}",
            weight
        )));
    }
    if !height.is_finite() || height <= 0.0 {
        return Err(Error::Validation(format!(
            "height must be a positive number, got {}",
            height
        )));
    }

    let height_m = normalize_height(height);
    let bmi = round2(weight / (height_m * height_m));
    let category = BmiCategory::from_bmi(bmi);

    tracing::debug!("BMI {} ({}) for {} kg / {} m", bmi, category, weight, height_m);

    Ok(BmiRecord {
        weight,
        height: height_m,
        bmi,
        category: category.label().to_string(),
        user_id: None,
    })
}

/// Computes BMI records and keeps the latest one, remote first
pub struct BmiService<'a> {
    remote: &'a dyn RemoteApi,
    store: &'a dyn KeyValueStore,
    user_id: String,
}

impl<'a> BmiService<'a> {
    pub fn new(remote: &'a dyn RemoteApi, store: &'a dyn KeyValueStore, user_id: impl Into<String>) -> Self {
        Self {
            remote,
            store,
            user_id: user_id.into(),
        }
    }

    /// Compute a record, submit it, and overwrite the stored latest record
    pub fn record(&self, weight: f64, height: f64) -> Result<BmiRecord> {
        let mut record = calculate_bmi(weight, height)?;
        record.user_id = Some(self.user_id.clone());

        let body = serde_json::to_value(&record)?;
        let saved = match self.remote.request(Method::Post, "/bmi", Some(&body)) {
            Ok(Some(value)) => match serde_json::from_value::<BmiRecord>(value) {
                Ok(echoed) => echoed,
                Err(e) => {
                    tracing::warn!("Unexpected BMI response: {}. Keeping local result.", e);
                    record
                }
            },
            Ok(None) => record,
            Err(e) => {
                tracing::warn!("Saving BMI on remote failed: {}. Keeping it locally.", e);
                record
            }
        };

        store::write_json(self.store, BMI_KEY, &saved)?;
        Ok(saved)
    }

    /// The last stored record, if any
    pub fn latest(&self) -> Result<Option<BmiRecord>> {
        store::read_json(self.store, BMI_KEY)
    }

    /// BMI history; offline this is at most the single latest record
    pub fn history(&self) -> Vec<BmiRecord> {
        let remote = self
            .remote
            .request(Method::Get, "/bmi/history", None)
            .and_then(|body| {
                let value = body.ok_or_else(|| Error::Other("empty BMI history response".into()))?;
                Ok(serde_json::from_value::<Vec<BmiRecord>>(value)?)
            });

        match remote {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Fetching BMI history failed: {}. Using local record.", e);
                self.latest()
                    .unwrap_or_else(|e| {
                        tracing::warn!("Unable to read local BMI: {}", e);
                        None
                    })
                    .into_iter()
                    .collect()
            }
        }
    }
}
