use super::domain::{CompetencyId, CriterionId};
use super::funnel::{FunnelGate, GateRule};
use super::quadrant::Axis;
use super::radar::RadarDomain;
use super::taxonomy::{CriterionSelector, CriterionSet, SchemaError, SubjectTaxonomy};
use serde::{Deserialize, Serialize};

/// Serialized description of how one subject feeds the generic engine.
///
/// Subject specifics live here as data: which criteria form the quadrant axes,
/// which criteria gate each funnel level, and which competencies form the
/// radar spokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDefinition {
    pub taxonomy: SubjectTaxonomy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes: Option<AxesDefinition>,
    #[serde(default)]
    pub funnel: Vec<GateDefinition>,
    #[serde(default)]
    pub radar: Vec<DomainDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxesDefinition {
    pub x: DomainDefinition,
    pub y: DomainDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDefinition {
    pub label: String,
    pub criteria: Vec<CriterionSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDefinition {
    pub label: String,
    pub rule: RuleDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDefinition {
    Clears {
        competency: CompetencyId,
        criterion: CriterionId,
    },
    All(Vec<RuleDefinition>),
    Any(Vec<RuleDefinition>),
}

impl RuleDefinition {
    pub fn clears(competency: impl Into<CompetencyId>, criterion: impl Into<CriterionId>) -> Self {
        Self::Clears {
            competency: competency.into(),
            criterion: criterion.into(),
        }
    }

    fn compile(&self, taxonomy: &SubjectTaxonomy) -> Result<GateRule, SchemaError> {
        match self {
            RuleDefinition::Clears {
                competency,
                criterion,
            } => Ok(GateRule::Clears(
                taxonomy.criterion_ref(competency.clone(), criterion.clone())?,
            )),
            RuleDefinition::All(rules) => Ok(GateRule::All(compile_rules(rules, taxonomy)?)),
            RuleDefinition::Any(rules) => Ok(GateRule::Any(compile_rules(rules, taxonomy)?)),
        }
    }
}

fn compile_rules(
    rules: &[RuleDefinition],
    taxonomy: &SubjectTaxonomy,
) -> Result<Vec<GateRule>, SchemaError> {
    rules.iter().map(|rule| rule.compile(taxonomy)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadrantAxes {
    pub x: Axis,
    pub y: Axis,
}

/// Validated, ready-to-use profile. Every criterion reference has been checked
/// against the taxonomy, so the analytics never see a dangling id.
#[derive(Debug, Clone)]
pub struct SubjectProfile {
    definition: ProfileDefinition,
    all_criteria: CriterionSet,
    axes: Option<QuadrantAxes>,
    funnel: Vec<FunnelGate<GateRule>>,
    radar: Vec<RadarDomain>,
}

impl SubjectProfile {
    pub fn from_definition(definition: ProfileDefinition) -> Result<Self, SchemaError> {
        let taxonomy = &definition.taxonomy;
        taxonomy.validate()?;

        let axes = match &definition.axes {
            Some(axes) => Some(QuadrantAxes {
                x: compile_axis(taxonomy, &axes.x)?,
                y: compile_axis(taxonomy, &axes.y)?,
            }),
            None => None,
        };

        let funnel = definition
            .funnel
            .iter()
            .map(|gate| Ok(FunnelGate::new(gate.label.clone(), gate.rule.compile(taxonomy)?)))
            .collect::<Result<Vec<_>, SchemaError>>()?;

        let radar = definition
            .radar
            .iter()
            .map(|domain| {
                Ok(RadarDomain {
                    label: domain.label.clone(),
                    criteria: taxonomy.select(&domain.criteria)?,
                })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        Ok(Self {
            all_criteria: taxonomy.all_criteria(),
            definition,
            axes,
            funnel,
            radar,
        })
    }

    pub fn subject(&self) -> &str {
        &self.definition.taxonomy.subject
    }

    pub fn level(&self) -> &str {
        &self.definition.taxonomy.level
    }

    pub fn taxonomy(&self) -> &SubjectTaxonomy {
        &self.definition.taxonomy
    }

    pub fn definition(&self) -> &ProfileDefinition {
        &self.definition
    }

    pub fn all_criteria(&self) -> &CriterionSet {
        &self.all_criteria
    }

    pub fn axes(&self) -> Option<&QuadrantAxes> {
        self.axes.as_ref()
    }

    pub fn funnel(&self) -> &[FunnelGate<GateRule>] {
        &self.funnel
    }

    pub fn radar(&self) -> &[RadarDomain] {
        &self.radar
    }
}

fn compile_axis(
    taxonomy: &SubjectTaxonomy,
    domain: &DomainDefinition,
) -> Result<Axis, SchemaError> {
    let criteria = taxonomy.select(&domain.criteria)?;
    if criteria.is_empty() {
        return Err(SchemaError::InvalidProfile {
            subject: taxonomy.subject.clone(),
            detail: format!("axis '{}' selects no criteria", domain.label),
        });
    }

    Ok(Axis {
        label: domain.label.clone(),
        criteria,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::arithmetic_taxonomy;

    fn definition() -> ProfileDefinition {
        ProfileDefinition {
            taxonomy: arithmetic_taxonomy(),
            axes: Some(AxesDefinition {
                x: DomainDefinition {
                    label: "Computation".to_string(),
                    criteria: vec![CriterionSelector::competency("computation")],
                },
                y: DomainDefinition {
                    label: "Reasoning".to_string(),
                    criteria: vec![CriterionSelector::competency("reasoning")],
                },
            }),
            funnel: vec![
                GateDefinition {
                    label: "Adds".to_string(),
                    rule: RuleDefinition::clears("computation", 1u32),
                },
                GateDefinition {
                    label: "Reasons".to_string(),
                    rule: RuleDefinition::All(vec![
                        RuleDefinition::clears("computation", 2u32),
                        RuleDefinition::clears("reasoning", 1u32),
                    ]),
                },
            ],
            radar: vec![DomainDefinition {
                label: "Computation".to_string(),
                criteria: vec![CriterionSelector::competency("computation")],
            }],
        }
    }

    #[test]
    fn compiles_a_valid_definition() {
        let profile = SubjectProfile::from_definition(definition()).expect("profile compiles");

        assert_eq!(profile.subject(), "math");
        assert_eq!(profile.all_criteria().len(), 3);
        assert_eq!(profile.funnel().len(), 2);
        assert_eq!(profile.radar()[0].criteria.len(), 2);
        let axes = profile.axes().expect("axes declared");
        assert_eq!(axes.y.criteria.len(), 1);
    }

    #[test]
    fn fails_fast_on_unknown_gate_criterion() {
        let mut definition = definition();
        definition.funnel.push(GateDefinition {
            label: "Geometry".to_string(),
            rule: RuleDefinition::Any(vec![RuleDefinition::clears("geometry", 1u32)]),
        });

        match SubjectProfile::from_definition(definition) {
            Err(SchemaError::UnknownCompetency { competency, .. }) => {
                assert_eq!(competency, "geometry")
            }
            other => panic!("expected unknown competency, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_axes() {
        let mut definition = definition();
        if let Some(axes) = definition.axes.as_mut() {
            axes.x.criteria.clear();
        }

        assert!(matches!(
            SubjectProfile::from_definition(definition),
            Err(SchemaError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn definition_round_trips_through_json() {
        let json = r#"{
            "taxonomy": {
                "subject": "math",
                "level": "4",
                "competencies": [
                    { "id": "computation", "label": "Computation",
                      "criteria": [ { "id": "1", "label": "Addition" } ] }
                ]
            },
            "funnel": [
                { "label": "Adds", "rule": { "clears": { "competency": "computation", "criterion": "1" } } }
            ]
        }"#;

        let definition: ProfileDefinition = serde_json::from_str(json).expect("definition parses");
        assert!(definition.axes.is_none());
        let profile = SubjectProfile::from_definition(definition).expect("profile compiles");
        assert_eq!(profile.funnel()[0].label, "Adds");
    }

    #[test]
    fn integer_criterion_ids_are_accepted() {
        let json = r#"{
            "taxonomy": {
                "subject": "math",
                "level": "4",
                "competencies": [
                    { "id": "computation", "label": "Computation",
                      "criteria": [ { "id": 1, "label": "Addition" }, { "id": "02", "label": "Subtraction" } ] }
                ]
            },
            "axes": {
                "x": { "label": "Adding", "criteria": [ { "competency": "computation", "criteria": [1] } ] },
                "y": { "label": "Subtracting", "criteria": [ { "competency": "computation", "criteria": [2] } ] }
            },
            "funnel": [
                { "label": "Adds", "rule": { "clears": { "competency": "computation", "criterion": 1 } } }
            ]
        }"#;

        let definition: ProfileDefinition = serde_json::from_str(json).expect("definition parses");
        let criteria = &definition.taxonomy.competencies[0].criteria;
        assert_eq!(criteria[0].id, CriterionId::from(1u32));
        assert_eq!(criteria[1].id, CriterionId::from(2u32));

        let profile = SubjectProfile::from_definition(definition).expect("profile compiles");
        assert_eq!(profile.all_criteria().len(), 2);
        let axes = profile.axes().expect("axes declared");
        assert_eq!(axes.y.criteria.len(), 1);
    }
}
