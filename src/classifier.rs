use chrono::Utc;

use crate::error::TriageError;
use crate::models::{
    ClassificationResult, Severity, Symptom, SymptomRecord, MIN_REPORTED_SYMPTOMS,
};

/// Per-symptom weights in tenths of a score point per intensity step.
/// Keeping them as integers makes the weighted sum exact arithmetic, so
/// band boundaries are never subject to float rounding.
const DEFAULT_WEIGHTS: [(Symptom, u32); Symptom::COUNT] = [
    (Symptom::Fiebre, 5),
    (Symptom::DolorCabeza, 5),
    (Symptom::Nausea, 5),
    (Symptom::Fatiga, 7),
    (Symptom::DolorPecho, 9),
    (Symptom::DificultadRespirar, 10),
    (Symptom::DolorAbdominal, 7),
    (Symptom::Mareos, 5),
    (Symptom::PerdidaPeso, 6),
    (Symptom::Tos, 5),
    (Symptom::CongestionNasal, 3),
    (Symptom::DolorGarganta, 4),
    (Symptom::DolorMuscular, 4),
    (Symptom::DolorArticular, 5),
    (Symptom::ErupcionCutanea, 6),
    (Symptom::Sangrado, 8),
    (Symptom::CambiosVision, 7),
    (Symptom::Confusion, 9),
    (Symptom::Convulsiones, 10),
    (Symptom::DolorEspalda, 5),
];

/// Score points (tenths) at which each band above NOT_SICK begins. Lower
/// edges are inclusive: a score exactly on a boundary takes the band above.
const DEFAULT_THRESHOLDS: [u32; 4] = [40, 200, 240, 320];

/// Read-only scoring configuration injected into the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub weights: [u32; Symptom::COUNT],
    pub thresholds: [u32; 4],
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let mut weights = [0u32; Symptom::COUNT];
        for (symptom, weight) in DEFAULT_WEIGHTS {
            weights[symptom as usize] = weight;
        }
        Self {
            weights,
            thresholds: DEFAULT_THRESHOLDS,
        }
    }
}

impl ClassifierConfig {
    /// Weight in tenths of a point per intensity step.
    pub fn weight(&self, symptom: Symptom) -> u32 {
        self.weights[symptom as usize]
    }

    /// Picks the highest band whose lower threshold the score satisfies.
    pub fn severity_for(&self, points: u32) -> Severity {
        let mut selected = Severity::NotSick;
        for (band, threshold) in Severity::ALL[1..].iter().zip(self.thresholds) {
            if points >= threshold {
                selected = *band;
            }
        }
        selected
    }
}

/// Pure symptom-to-severity classifier. No state beyond its configuration,
/// no I/O; identical input always yields identical output.
#[derive(Debug, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Scores a validated record and assigns a severity band. Age is
    /// contextual input only; no documented weighting exists for it, so it
    /// is carried through to the result untouched.
    pub fn classify(
        &self,
        symptoms: &SymptomRecord,
        age: Option<u32>,
    ) -> Result<ClassificationResult, TriageError> {
        let reported = symptoms.reported_count();
        if reported < MIN_REPORTED_SYMPTOMS {
            return Err(TriageError::Validation(format!(
                "at least {MIN_REPORTED_SYMPTOMS} symptoms with intensity above zero are required, got {reported}"
            )));
        }

        let points = self.score_points(symptoms);
        Ok(ClassificationResult {
            severity: self.config.severity_for(points),
            score: points as f64 / 10.0,
            recorded_at: Utc::now(),
            symptoms: symptoms.clone(),
            age,
        })
    }

    /// Weighted sum of intensities, in tenths of a score point.
    pub fn score_points(&self, symptoms: &SymptomRecord) -> u32 {
        symptoms
            .iter()
            .map(|(symptom, intensity)| u32::from(intensity) * self.config.weight(symptom))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, u8)]) -> SymptomRecord {
        SymptomRecord::from_named(pairs.iter().copied()).unwrap()
    }

    fn classify(pairs: &[(&str, u8)]) -> ClassificationResult {
        Classifier::default().classify(&record(pairs), None).unwrap()
    }

    #[test]
    fn background_aches_classify_as_not_sick() {
        let result = classify(&[("fatiga", 2), ("dolor_muscular", 1), ("mareos", 1)]);
        assert_eq!(result.severity, Severity::NotSick);
        assert_eq!(result.score, 2.3);
    }

    #[test]
    fn moderate_respiratory_picture_is_mild() {
        let result = classify(&[("fiebre", 3), ("dolor_cabeza", 3), ("dificultad_respirar", 5)]);
        assert_eq!(result.severity, Severity::Mild);
        assert_eq!(result.score, 8.0);
    }

    #[test]
    fn high_fever_with_chest_pain_stays_mild() {
        let result = classify(&[("fiebre", 10), ("dolor_pecho", 8), ("dificultad_respirar", 7)]);
        assert_eq!(result.severity, Severity::Mild);
        assert_eq!(result.score, 19.2);
    }

    #[test]
    fn breathing_distress_with_fatigue_is_acute() {
        let result = classify(&[("dolor_pecho", 7), ("dificultad_respirar", 9), ("fatiga", 8)]);
        assert_eq!(result.severity, Severity::Acute);
        assert_eq!(result.score, 20.9);
    }

    #[test]
    fn maxed_cardiorespiratory_triad_is_chronic() {
        // Lands exactly on the CHRONIC lower boundary (240 points).
        let result = classify(&[("dolor_pecho", 10), ("tos", 10), ("dificultad_respirar", 10)]);
        assert_eq!(result.severity, Severity::Chronic);
        assert_eq!(result.score, 24.0);
    }

    #[test]
    fn fewer_than_three_reported_symptoms_is_rejected() {
        let err = Classifier::default()
            .classify(&record(&[("fiebre", 8), ("tos", 6), ("mareos", 0)]), None)
            .unwrap_err();
        assert!(matches!(err, TriageError::Validation(_)));
    }

    #[test]
    fn insertion_order_does_not_change_the_outcome() {
        let forward = record(&[("fiebre", 3), ("dolor_cabeza", 3), ("dificultad_respirar", 5)]);
        let reverse = record(&[("dificultad_respirar", 5), ("dolor_cabeza", 3), ("fiebre", 3)]);
        let classifier = Classifier::default();
        let a = classifier.classify(&forward, None).unwrap();
        let b = classifier.classify(&reverse, None).unwrap();
        assert_eq!(a.severity, b.severity);
        assert_eq!(a.score, b.score);
    }

    #[test]
    fn raising_an_intensity_never_lowers_the_band() {
        let classifier = Classifier::default();
        let mut previous = Severity::NotSick;
        for intensity in 1..=10 {
            let result = classifier
                .classify(
                    &record(&[
                        ("dolor_pecho", intensity),
                        ("dificultad_respirar", 9),
                        ("fatiga", 8),
                    ]),
                    None,
                )
                .unwrap();
            assert!(result.severity >= previous);
            previous = result.severity;
        }
    }

    #[test]
    fn exact_boundary_selects_the_higher_band() {
        let config = ClassifierConfig::default();
        assert_eq!(config.severity_for(0), Severity::NotSick);
        assert_eq!(config.severity_for(39), Severity::NotSick);
        assert_eq!(config.severity_for(40), Severity::Mild);
        assert_eq!(config.severity_for(199), Severity::Mild);
        assert_eq!(config.severity_for(200), Severity::Acute);
        assert_eq!(config.severity_for(239), Severity::Acute);
        assert_eq!(config.severity_for(240), Severity::Chronic);
        assert_eq!(config.severity_for(319), Severity::Chronic);
        assert_eq!(config.severity_for(320), Severity::Terminal);
    }

    #[test]
    fn injected_config_overrides_the_defaults() {
        let mut config = ClassifierConfig::default();
        config.thresholds = [10, 20, 30, 40];
        let classifier = Classifier::new(config);
        let result = classifier
            .classify(&record(&[("fatiga", 2), ("dolor_muscular", 1), ("mareos", 1)]), None)
            .unwrap();
        // 23 points clears the lowered MILD and ACUTE thresholds
        assert_eq!(result.severity, Severity::Acute);
    }

    #[test]
    fn age_never_shifts_the_score() {
        let symptoms = record(&[("fiebre", 3), ("dolor_cabeza", 3), ("dificultad_respirar", 5)]);
        let classifier = Classifier::default();
        let young = classifier.classify(&symptoms, Some(8)).unwrap();
        let old = classifier.classify(&symptoms, Some(80)).unwrap();
        assert_eq!(young.score, old.score);
        assert_eq!(young.severity, old.severity);
        assert_eq!(old.age, Some(80));
    }
}
