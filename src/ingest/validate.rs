//! Structural diagnostics for GeoJSON documents. Used by the `validate`
//! subcommand; parse failures are errors, structural oddities are warnings
//! or informational.

use std::fmt;

use geojson::{Feature, GeoJson};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }
}

/// Validate raw document text. Coordinate-range and winding audits belong to
/// rendering collaborators, not here.
pub fn validate_document(raw: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    let document = match raw.parse::<GeoJson>() {
        Ok(document) => document,
        Err(err) => {
            report.push(
                ValidationSeverity::Error,
                "document",
                format!("not a valid GeoJSON document: {err}"),
            );
            return report;
        }
    };

    match &document {
        GeoJson::FeatureCollection(collection) => {
            if collection.features.is_empty() {
                report.push(
                    ValidationSeverity::Warning,
                    "features",
                    "collection contains no features",
                );
            }
            for (index, feature) in collection.features.iter().enumerate() {
                check_feature(&mut report, &format!("features[{index}]"), feature);
            }
        }
        GeoJson::Feature(feature) => {
            report.push(
                ValidationSeverity::Info,
                "document",
                "top-level object is a single feature",
            );
            check_feature(&mut report, "feature", feature);
        }
        GeoJson::Geometry(_) => {
            report.push(
                ValidationSeverity::Info,
                "document",
                "bare geometry document (no feature wrapper)",
            );
        }
    }

    report
}

fn check_feature(report: &mut ValidationReport, context: &str, feature: &Feature) {
    if feature.geometry.is_none() {
        report.push(ValidationSeverity::Warning, context, "feature has null geometry");
    }
    if feature.properties.is_none() {
        report.push(
            ValidationSeverity::Info,
            context,
            "feature has no properties member",
        );
    }
}
