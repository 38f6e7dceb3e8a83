use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Feature columns the classifier artifact expects, in wire order.
///
/// The raw payload carries `weight` and `height` instead of `BMI`; the
/// derived row swaps them for the computed BMI at index 12.
pub const FEATURE_COLUMNS: [&str; 15] = [
    "male",
    "age",
    "education",
    "currentSmoker",
    "cigsPerDay",
    "BPMeds",
    "prevalentStroke",
    "prevalentHyp",
    "diabetes",
    "totChol",
    "sysBP",
    "diaBP",
    "BMI",
    "heartRate",
    "glucose",
];

/// Raw clinical intake payload: 16 required numeric fields.
///
/// Wire names match the upstream dataset columns, hence the renames.
/// Constructed per request, validated, transformed into a
/// [`ModelInputRow`], and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Sex indicator (1 = male, 0 = female)
    pub male: i64,
    /// Age in years
    pub age: i64,
    /// Education level, ordinal 1-4
    pub education: i64,
    /// Current smoker (0/1)
    #[serde(rename = "currentSmoker")]
    pub current_smoker: i64,
    /// Cigarettes per day, non-negative
    #[serde(rename = "cigsPerDay")]
    pub cigs_per_day: i64,
    /// On blood pressure medication (count in the source dataset)
    #[serde(rename = "BPMeds")]
    pub bp_meds: i64,
    /// Prior stroke (0/1)
    #[serde(rename = "prevalentStroke")]
    pub prevalent_stroke: i64,
    /// Prevalent hypertension (0/1)
    #[serde(rename = "prevalentHyp")]
    pub prevalent_hyp: i64,
    /// Diabetic (0/1)
    pub diabetes: i64,
    /// Total cholesterol, mg/dL
    #[serde(rename = "totChol")]
    pub tot_chol: f64,
    /// Systolic blood pressure, mmHg
    #[serde(rename = "sysBP")]
    pub sys_bp: f64,
    /// Diastolic blood pressure, mmHg
    #[serde(rename = "diaBP")]
    pub dia_bp: f64,
    /// Weight in kilograms
    pub weight: f64,
    /// Height in meters
    pub height: f64,
    /// Heart rate, bpm
    #[serde(rename = "heartRate")]
    pub heart_rate: f64,
    /// Glucose, mg/dL
    pub glucose: f64,
}

impl PatientRecord {
    /// Derive BMI and produce the feature row the classifier expects.
    ///
    /// Fails if `height <= 0`; a zero or negative denominator would
    /// otherwise yield inf/NaN or a negative BMI.
    pub fn into_model_input(self) -> Result<ModelInputRow, DomainError> {
        let bmi = derive_bmi(self.weight, self.height)?;
        Ok(ModelInputRow {
            male: self.male,
            age: self.age,
            education: self.education,
            current_smoker: self.current_smoker,
            cigs_per_day: self.cigs_per_day,
            bp_meds: self.bp_meds,
            prevalent_stroke: self.prevalent_stroke,
            prevalent_hyp: self.prevalent_hyp,
            diabetes: self.diabetes,
            tot_chol: self.tot_chol,
            sys_bp: self.sys_bp,
            dia_bp: self.dia_bp,
            bmi,
            heart_rate: self.heart_rate,
            glucose: self.glucose,
        })
    }
}

/// `BMI = weight(kg) / height(m)^2`, computed once per request.
pub fn derive_bmi(weight: f64, height: f64) -> Result<f64, DomainError> {
    if height <= 0.0 {
        return Err(DomainError::NonPositiveHeight(height));
    }
    Ok(weight / (height * height))
}

/// The single tabular row fed to the classifier: raw fields minus
/// `weight`/`height`, plus the derived `BMI`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputRow {
    pub male: i64,
    pub age: i64,
    pub education: i64,
    pub current_smoker: i64,
    pub cigs_per_day: i64,
    pub bp_meds: i64,
    pub prevalent_stroke: i64,
    pub prevalent_hyp: i64,
    pub diabetes: i64,
    pub tot_chol: f64,
    pub sys_bp: f64,
    pub dia_bp: f64,
    pub bmi: f64,
    pub heart_rate: f64,
    pub glucose: f64,
}

impl ModelInputRow {
    /// Feature values in [`FEATURE_COLUMNS`] order.
    pub fn as_vector(&self) -> [f64; 15] {
        [
            self.male as f64,
            self.age as f64,
            self.education as f64,
            self.current_smoker as f64,
            self.cigs_per_day as f64,
            self.bp_meds as f64,
            self.prevalent_stroke as f64,
            self.prevalent_hyp as f64,
            self.diabetes as f64,
            self.tot_chol,
            self.sys_bp,
            self.dia_bp,
            self.bmi,
            self.heart_rate,
            self.glucose,
        ]
    }
}

/// Binary prediction outcome. Serialized as the bare integer 0 or 1,
/// never a probability, never a third category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RiskLabel {
    Low,
    High,
}

impl From<RiskLabel> for u8 {
    fn from(label: RiskLabel) -> u8 {
        match label {
            RiskLabel::Low => 0,
            RiskLabel::High => 1,
        }
    }
}

impl TryFrom<u8> for RiskLabel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RiskLabel::Low),
            1 => Ok(RiskLabel::High),
            other => Err(format!("risk label must be 0 or 1, got {other}")),
        }
    }
}
