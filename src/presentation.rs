//! Result presentation.
//!
//! Maps each result to a panel according to its declared type. The mapping is
//! exhaustive: records of an unrecognized type get an explicit "unknown type"
//! panel instead of an empty one.

use crate::results::{AnalysisResult, ResultCollection, ResultType};

/// One labelled value inside a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelField {
    pub label: &'static str,
    pub value: String,
}

impl PanelField {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    Fields(Vec<PanelField>),
    UnknownType(String),
}

/// A disclosure panel: the record id as header, details as body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPanel {
    pub title: String,
    pub body: PanelBody,
}

impl ResultPanel {
    /// Renders the body as display lines.
    pub fn body_lines(&self) -> Vec<String> {
        match &self.body {
            PanelBody::Fields(fields) => fields
                .iter()
                .map(|field| format!("{}: {}", field.label, field.value))
                .collect(),
            PanelBody::UnknownType(result_type) => vec![format!(
                "Unknown result type \"{result_type}\": no renderer available."
            )],
        }
    }

    pub fn field(&self, label: &str) -> Option<&str> {
        match &self.body {
            PanelBody::Fields(fields) => fields
                .iter()
                .find(|field| field.label == label)
                .map(|field| field.value.as_str()),
            PanelBody::UnknownType(_) => None,
        }
    }
}

pub const DESCRIPTION: &str = "Description";
pub const VALIDITY: &str = "Record is valid?";
pub const LENGTH: &str = "Sequence length";
pub const PHRED_PER_BASE: &str = "PHRED score per base";
pub const GC_PERCENT: &str = "GC %";
pub const ORF_COUNT: &str = "No. of ORFs";

/// Builds the panel for one result.
pub fn panel_for(result: &AnalysisResult) -> ResultPanel {
    let body = match &result.result_type {
        ResultType::Fastq => PanelBody::Fields(fastq_fields(result)),
        ResultType::Fasta => PanelBody::Fields(common_fields(result)),
        ResultType::Unknown(other) => PanelBody::UnknownType(other.clone()),
    };
    ResultPanel {
        title: result.id.clone(),
        body,
    }
}

/// One panel per result, in collection order.
pub fn panels(results: &ResultCollection) -> Vec<ResultPanel> {
    results.iter().map(panel_for).collect()
}

fn common_fields(result: &AnalysisResult) -> Vec<PanelField> {
    vec![
        PanelField::new(DESCRIPTION, result.description.clone()),
        PanelField::new(VALIDITY, if result.is_valid { "Yes" } else { "No" }),
        PanelField::new(LENGTH, format!("{} bases", result.sequence_length)),
        PanelField::new(GC_PERCENT, format!("{:.2}%", result.gc_fraction * 100.0)),
        PanelField::new(ORF_COUNT, result.orf_count.to_string()),
    ]
}

fn fastq_fields(result: &AnalysisResult) -> Vec<PanelField> {
    let mut fields = common_fields(result);
    let phred = result
        .phred_score_per_base()
        .map_or_else(|| "n/a".to_string(), |score| format!("{score:.2}"));
    // Shown right after the length, before GC content
    fields.insert(3, PanelField::new(PHRED_PER_BASE, phred));
    fields
}

/// Selection and expansion state of the result accordion.
///
/// Any number of panels may be expanded at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelCursor {
    selected: usize,
    expanded: Vec<bool>,
}

impl PanelCursor {
    /// Cursor over `count` collapsed panels.
    pub fn new(count: usize) -> Self {
        Self {
            selected: 0,
            expanded: vec![false; count],
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.get(index).copied().unwrap_or(false)
    }

    pub fn next(&mut self) {
        if self.selected + 1 < self.expanded.len() {
            self.selected += 1;
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Expands or collapses the selected panel.
    pub fn toggle(&mut self) {
        if let Some(open) = self.expanded.get_mut(self.selected) {
            *open = !*open;
        }
    }
}
