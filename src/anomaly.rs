use crate::error::Result;
use crate::model::TemplateModel;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    NewEvent,
    RareEvent,
    RareVariables,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAnomaly {
    pub kinds: Vec<AnomalyKind>,
    pub line_index: usize,
    pub line: String,
    pub template: Option<String>,
    pub variables: Vec<String>,
    pub event_probability: f64,
    pub variable_probability: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyThresholds {
    pub rare_event: f64,
    pub rare_variables: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self { rare_event: 0.01, rare_variables: 0.05 }
    }
}

pub fn detect_line_anomalies<S: AsRef<str>>(
    model: &TemplateModel,
    lines: &[S],
    thresholds: &AnomalyThresholds,
) -> Result<Vec<LineAnomaly>> {
    let mut out = Vec::new();
    for (line_index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }
        let scored = model.classify(line)?;
        let mut kinds = Vec::new();
        if scored.template.is_none() {
            kinds.push(AnomalyKind::NewEvent);
        }
        // an unseen template is also rare; both kinds are reported
        if scored.event_probability < thresholds.rare_event {
            kinds.push(AnomalyKind::RareEvent);
        }
        if scored.variable_probability.is_some_and(|p| p < thresholds.rare_variables) {
            kinds.push(AnomalyKind::RareVariables);
        }
        if kinds.is_empty() {
            continue;
        }
        out.push(LineAnomaly {
            kinds,
            line_index,
            line: line.to_owned(),
            template: scored.template,
            variables: scored.variables,
            event_probability: scored.event_probability,
            variable_probability: scored.variable_probability,
        });
    }
    Ok(out)
}
