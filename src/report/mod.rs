//! Report generation: one-page PDF summaries of a classification.
//!
//! A report contains the title, the predicted condition, the confidence
//! percentage and a precaution paragraph looked up from a fixed mapping.
//! It is written next to the uploaded image as `<base>_report.pdf`,
//! overwriting any previous report for the same base name.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::error::ReportError;

/// Title line printed at the top of every report.
pub const REPORT_TITLE: &str = "EyeIntel Diagnostic Report";

const REPORT_EXTENSION: &str = "pdf";

const GENERIC_PRECAUTION: &str = "Consult a specialist for further evaluation.";

/// Precaution paragraph for a condition, keyed by its display name.
///
/// Unknown names fall back to a generic referral.
pub fn precaution_for(label_display: &str) -> &'static str {
    match label_display {
        "Cataract" => "Consult an ophthalmologist for possible surgery. Avoid driving at night.",
        "Diabetic Retinopathy" => "Maintain blood sugar levels. Schedule regular eye exams.",
        "Glaucoma" => "Use prescribed eye drops. Monitor intraocular pressure regularly.",
        "Normal" => "No signs of disease detected. Continue routine eye checkups.",
        _ => GENERIC_PRECAUTION,
    }
}

/// Derive the report filename from the uploaded image's filename.
///
/// The image extension is stripped and `_report.pdf` appended:
/// `scan.png` becomes `scan_report.pdf`.
pub fn report_filename(base_filename: &str) -> String {
    let base = match base_filename.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => base_filename,
    };
    format!("{}_report.{}", base, REPORT_EXTENSION)
}

/// Renders classification reports into the storage area.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    /// Create a generator writing into `output_dir` (the same area as
    /// image intake).
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The storage area this generator writes into.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render and persist a report.
    ///
    /// `label_display` is the human-readable condition name,
    /// `confidence` the percentage in [0, 100], `base_filename` the
    /// sanitized name of the uploaded image. Returns the path of the
    /// written PDF; any failure is an error, there is no partial mode.
    pub fn generate(
        &self,
        label_display: &str,
        confidence: f64,
        base_filename: &str,
    ) -> Result<PathBuf, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(REPORT_TITLE, Mm(210.0), Mm(297.0), "report");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        layer.use_text(REPORT_TITLE, 16.0, Mm(25.0), Mm(270.0), &font);
        layer.use_text(
            format!("Prediction: {}", label_display),
            12.0,
            Mm(25.0),
            Mm(250.0),
            &font,
        );
        layer.use_text(
            format!("Confidence: {:.2}%", confidence),
            12.0,
            Mm(25.0),
            Mm(242.0),
            &font,
        );
        layer.use_text("Precautionary Advice:", 12.0, Mm(25.0), Mm(226.0), &font);
        layer.use_text(
            precaution_for(label_display),
            12.0,
            Mm(25.0),
            Mm(218.0),
            &font,
        );

        let path = self.output_dir.join(report_filename(base_filename));
        let file = File::create(&path).map_err(|e| ReportError::Io(e.to_string()))?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| ReportError::Pdf(e.to_string()))?;

        Ok(path)
    }
}

// =============================================================================
// Tests
// =============================================================================
