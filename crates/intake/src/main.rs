//! Patient intake front end for the CHD risk service.
//!
//! A command-line stand-in for the original intake form: each widget
//! becomes a flag with the same bounds and unit coercions (checkbox to
//! 0/1, labeled selection to ordinal code), one submission per run.
//! Defaults mirror the form's initial values. Transport failures and
//! API errors are rendered inline; the process never panics.
//!
//! There is deliberately no request timeout unless `--timeout-secs` is
//! given: the service answers in sub-second time and a hung connection
//! is surfaced by the operator, not a timer. Known limitation.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;

use framingham_types::PatientRecord;

#[derive(Parser)]
#[command(name = "framingham-intake")]
#[command(about = "Submit patient intake data for CHD 10-year risk assessment", long_about = None)]
#[command(version)]
struct Cli {
    /// Inference service endpoint
    #[arg(long, default_value = "http://localhost:8000")]
    api_url: String,

    /// Optional request timeout in seconds (no timeout when omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Patient sex
    #[arg(long, value_enum, default_value = "female")]
    sex: Sex,

    /// Age in years
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(i64).range(20..=100))]
    age: i64,

    /// Education level
    #[arg(long, value_enum, default_value = "some-high-school")]
    education: Education,

    /// Current smoker
    #[arg(long)]
    smoker: bool,

    /// Cigarettes per day
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..=100))]
    cigs_per_day: i64,

    /// On blood pressure medication
    #[arg(long)]
    bp_meds: bool,

    /// History of stroke
    #[arg(long)]
    stroke: bool,

    /// Prevalent hypertension
    #[arg(long)]
    hypertension: bool,

    /// Diabetic
    #[arg(long)]
    diabetes: bool,

    /// Total cholesterol, mg/dL
    #[arg(long, default_value_t = 200.0, value_parser = parse_tot_chol)]
    tot_chol: f64,

    /// Systolic blood pressure, mmHg
    #[arg(long, default_value_t = 120.0, value_parser = parse_sys_bp)]
    sys_bp: f64,

    /// Diastolic blood pressure, mmHg
    #[arg(long, default_value_t = 80.0, value_parser = parse_dia_bp)]
    dia_bp: f64,

    /// Weight in kilograms
    #[arg(long, default_value_t = 70.0, value_parser = parse_weight)]
    weight: f64,

    /// Height in meters
    #[arg(long, default_value_t = 1.7, value_parser = parse_height)]
    height: f64,

    /// Heart rate, bpm
    #[arg(long, default_value_t = 72.0, value_parser = parse_heart_rate)]
    heart_rate: f64,

    /// Glucose, mg/dL
    #[arg(long, default_value_t = 90.0, value_parser = parse_glucose)]
    glucose: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Sex {
    Female,
    Male,
}

impl Sex {
    fn code(self) -> i64 {
        match self {
            Sex::Female => 0,
            Sex::Male => 1,
        }
    }
}

/// Education labels from the intake form, coerced to ordinal codes 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Education {
    SomeHighSchool,
    HighSchoolGed,
    SomeCollege,
    College,
}

impl Education {
    fn code(self) -> i64 {
        match self {
            Education::SomeHighSchool => 1,
            Education::HighSchoolGed => 2,
            Education::SomeCollege => 3,
            Education::College => 4,
        }
    }
}

fn parse_bounded(s: &str, field: &str, min: f64, max: f64) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("{field} must be a number"))?;
    if value < min || value > max {
        return Err(format!("{field} must be between {min} and {max}"));
    }
    Ok(value)
}

fn parse_tot_chol(s: &str) -> Result<f64, String> {
    parse_bounded(s, "total cholesterol", 100.0, 400.0)
}

fn parse_sys_bp(s: &str) -> Result<f64, String> {
    parse_bounded(s, "systolic BP", 80.0, 250.0)
}

fn parse_dia_bp(s: &str) -> Result<f64, String> {
    parse_bounded(s, "diastolic BP", 40.0, 150.0)
}

fn parse_weight(s: &str) -> Result<f64, String> {
    parse_bounded(s, "weight", 30.0, 200.0)
}

fn parse_height(s: &str) -> Result<f64, String> {
    parse_bounded(s, "height", 1.0, 2.5)
}

fn parse_heart_rate(s: &str) -> Result<f64, String> {
    parse_bounded(s, "heart rate", 40.0, 150.0)
}

fn parse_glucose(s: &str) -> Result<f64, String> {
    parse_bounded(s, "glucose", 50.0, 300.0)
}

impl Cli {
    /// Coerce flag values into the request payload.
    fn to_record(&self) -> PatientRecord {
        PatientRecord {
            male: self.sex.code(),
            age: self.age,
            education: self.education.code(),
            current_smoker: i64::from(self.smoker),
            cigs_per_day: self.cigs_per_day,
            bp_meds: i64::from(self.bp_meds),
            prevalent_stroke: i64::from(self.stroke),
            prevalent_hyp: i64::from(self.hypertension),
            diabetes: i64::from(self.diabetes),
            tot_chol: self.tot_chol,
            sys_bp: self.sys_bp,
            dia_bp: self.dia_bp,
            weight: self.weight,
            height: self.height,
            heart_rate: self.heart_rate,
            glucose: self.glucose,
        }
    }
}

/// Submit the record and interpret the response body.
async fn submit(cli: &Cli) -> Result<u64> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = cli.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().context("failed to build HTTP client")?;

    let record = cli.to_record();
    let url = format!("{}/predict", cli.api_url.trim_end_matches('/'));

    let response = client
        .post(&url)
        .json(&record)
        .send()
        .await
        .with_context(|| format!("failed to connect to the API at {url}"))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read API response")?;

    if !status.is_success() {
        return Err(anyhow!("API error {status}: {body}"));
    }

    parse_prediction(&body)
}

/// Extract the binary label from a successful response body.
///
/// The service contract is exactly 0 or 1; anything else is treated as
/// an API error rather than silently rendered as one of the two states.
fn parse_prediction(body: &str) -> Result<u64> {
    let parsed: Value =
        serde_json::from_str(body).context("API returned a non-JSON response")?;
    let label = parsed
        .get("chances of Ten year CHD")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("API response is missing the prediction: {body}"))?;
    if label > 1 {
        return Err(anyhow!("API returned an unexpected risk label: {label}"));
    }
    Ok(label)
}

fn render_result(label: u64) {
    if label == 1 {
        println!("High risk of CHD");
        println!(
            "This patient has a high risk of developing coronary heart disease \
             within 10 years. Consider preventive measures and regular monitoring."
        );
    } else {
        println!("Low risk of CHD");
        println!(
            "This patient has a low risk of developing coronary heart disease \
             within 10 years. Maintain healthy lifestyle practices."
        );
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match submit(&cli).await {
        Ok(label) => render_result(label),
        Err(err) => {
            // Error state, not a crash: the command can simply be re-run.
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from([&["framingham-intake"], args].concat())
    }

    #[test]
    fn defaults_mirror_the_intake_form() {
        let record = parse(&[]).to_record();
        assert_eq!(record.male, 0);
        assert_eq!(record.age, 50);
        assert_eq!(record.education, 1);
        assert_eq!(record.current_smoker, 0);
        assert_eq!(record.tot_chol, 200.0);
        assert_eq!(record.sys_bp, 120.0);
        assert_eq!(record.dia_bp, 80.0);
        assert_eq!(record.weight, 70.0);
        assert_eq!(record.height, 1.7);
        assert_eq!(record.heart_rate, 72.0);
        assert_eq!(record.glucose, 90.0);
    }

    #[test]
    fn checkbox_flags_coerce_to_binary() {
        let record = parse(&[
            "--sex",
            "male",
            "--smoker",
            "--bp-meds",
            "--stroke",
            "--hypertension",
            "--diabetes",
        ])
        .to_record();
        assert_eq!(record.male, 1);
        assert_eq!(record.current_smoker, 1);
        assert_eq!(record.bp_meds, 1);
        assert_eq!(record.prevalent_stroke, 1);
        assert_eq!(record.prevalent_hyp, 1);
        assert_eq!(record.diabetes, 1);
    }

    #[test]
    fn education_labels_coerce_to_ordinals() {
        assert_eq!(parse(&["--education", "some-high-school"]).to_record().education, 1);
        assert_eq!(parse(&["--education", "high-school-ged"]).to_record().education, 2);
        assert_eq!(parse(&["--education", "some-college"]).to_record().education, 3);
        assert_eq!(parse(&["--education", "college"]).to_record().education, 4);
    }

    #[test]
    fn out_of_range_vitals_are_rejected_at_the_flag() {
        assert!(Cli::try_parse_from(["framingham-intake", "--age", "19"]).is_err());
        assert!(Cli::try_parse_from(["framingham-intake", "--height", "0"]).is_err());
        assert!(Cli::try_parse_from(["framingham-intake", "--sys-bp", "300"]).is_err());
        assert!(Cli::try_parse_from(["framingham-intake", "--glucose", "banana"]).is_err());
    }

    #[test]
    fn prediction_parsing_accepts_only_binary_labels() {
        assert_eq!(
            parse_prediction(r#"{"chances of Ten year CHD": 0}"#).unwrap(),
            0
        );
        assert_eq!(
            parse_prediction(r#"{"chances of Ten year CHD": 1}"#).unwrap(),
            1
        );
        assert!(parse_prediction(r#"{"chances of Ten year CHD": 2}"#).is_err());
        assert!(parse_prediction(r#"{"chances of Ten year CHD": 0.7}"#).is_err());
        assert!(parse_prediction(r#"{"prediction": 1}"#).is_err());
        assert!(parse_prediction("not json").is_err());
    }

    #[test]
    fn bounded_parser_accepts_edges() {
        assert_eq!(parse_height("1.0").unwrap(), 1.0);
        assert_eq!(parse_height("2.5").unwrap(), 2.5);
        assert!(parse_height("2.51").is_err());
    }
}
