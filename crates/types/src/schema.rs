//! Explicit schema validation for untyped request payloads.
//!
//! The service never trusts serde to partially populate a record; a
//! payload either yields a fully-typed [`PatientRecord`] or a
//! [`ValidationError`] naming the first offending field.

use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::record::PatientRecord;

/// Validate an untyped JSON payload into a typed record.
///
/// All 16 fields are required. Integer fields accept JSON integers and
/// integral floats (`3.0` coerces, `3.5` does not); float fields accept
/// any JSON number.
pub fn parse_patient_record(value: &Value) -> Result<PatientRecord, ValidationError> {
    let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

    Ok(PatientRecord {
        male: require_int(obj, "male")?,
        age: require_int(obj, "age")?,
        education: require_int(obj, "education")?,
        current_smoker: require_int(obj, "currentSmoker")?,
        cigs_per_day: require_int(obj, "cigsPerDay")?,
        bp_meds: require_int(obj, "BPMeds")?,
        prevalent_stroke: require_int(obj, "prevalentStroke")?,
        prevalent_hyp: require_int(obj, "prevalentHyp")?,
        diabetes: require_int(obj, "diabetes")?,
        tot_chol: require_float(obj, "totChol")?,
        sys_bp: require_float(obj, "sysBP")?,
        dia_bp: require_float(obj, "diaBP")?,
        weight: require_float(obj, "weight")?,
        height: require_float(obj, "height")?,
        heart_rate: require_float(obj, "heartRate")?,
        glucose: require_float(obj, "glucose")?,
    })
}

fn require_int(obj: &Map<String, Value>, field: &'static str) -> Result<i64, ValidationError> {
    let value = obj
        .get(field)
        .ok_or(ValidationError::MissingField(field))?;

    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    if let Some(f) = value.as_f64() {
        // Integral floats coerce, anything fractional does not.
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            return Ok(f as i64);
        }
        return Err(ValidationError::NotInteger(field));
    }
    Err(ValidationError::NotNumeric(field))
}

fn require_float(obj: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let value = obj
        .get(field)
        .ok_or(ValidationError::MissingField(field))?;

    value.as_f64().ok_or(ValidationError::NotNumeric(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "male": 1,
            "age": 50,
            "education": 2,
            "currentSmoker": 0,
            "cigsPerDay": 0,
            "BPMeds": 0,
            "prevalentStroke": 0,
            "prevalentHyp": 0,
            "diabetes": 0,
            "totChol": 200,
            "sysBP": 120,
            "diaBP": 80,
            "weight": 70,
            "height": 1.7,
            "heartRate": 72,
            "glucose": 90
        })
    }

    #[test]
    fn valid_payload_parses() {
        let record = parse_patient_record(&sample_payload()).unwrap();
        assert_eq!(record.male, 1);
        assert_eq!(record.age, 50);
        assert_eq!(record.tot_chol, 200.0);
        assert_eq!(record.height, 1.7);
    }

    #[test]
    fn every_missing_field_is_named() {
        let payload = sample_payload();
        let obj = payload.as_object().unwrap();
        for field in obj.keys() {
            let mut partial = obj.clone();
            partial.remove(field);
            let err = parse_patient_record(&Value::Object(partial)).unwrap_err();
            assert_eq!(err.field(), Some(field.as_str()));
            assert!(matches!(err, ValidationError::MissingField(_)));
        }
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let mut payload = sample_payload();
        payload["sysBP"] = json!("high");
        let err = parse_patient_record(&payload).unwrap_err();
        assert_eq!(err, ValidationError::NotNumeric("sysBP"));
    }

    #[test]
    fn integral_float_coerces_to_int_field() {
        let mut payload = sample_payload();
        payload["age"] = json!(50.0);
        let record = parse_patient_record(&payload).unwrap();
        assert_eq!(record.age, 50);
    }

    #[test]
    fn fractional_value_in_int_field_is_rejected() {
        let mut payload = sample_payload();
        payload["cigsPerDay"] = json!(2.5);
        let err = parse_patient_record(&payload).unwrap_err();
        assert_eq!(err, ValidationError::NotInteger("cigsPerDay"));
    }

    #[test]
    fn integer_is_accepted_in_float_field() {
        let mut payload = sample_payload();
        payload["glucose"] = json!(90);
        let record = parse_patient_record(&payload).unwrap();
        assert_eq!(record.glucose, 90.0);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = parse_patient_record(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject);
        assert_eq!(err.field(), None);
    }
}
