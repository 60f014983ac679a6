use super::profile::{
    AxesDefinition, DomainDefinition, GateDefinition, ProfileDefinition, RuleDefinition,
    SubjectProfile,
};
use super::taxonomy::{
    CompetencyDefinition, CriterionDefinition, CriterionSelector, SchemaError, SubjectTaxonomy,
};
use std::sync::Arc;

/// Registry of validated subject profiles, looked up by subject and level.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: Vec<Arc<SubjectProfile>>,
}

impl ProfileCatalog {
    /// Built-in Arabic and mathematics profiles.
    pub fn standard() -> Result<Self, SchemaError> {
        let mut catalog = Self::default();
        catalog.register(SubjectProfile::from_definition(arabic_definition())?);
        catalog.register(SubjectProfile::from_definition(math_definition())?);
        Ok(catalog)
    }

    /// Adds a profile, replacing any existing one for the same subject and level.
    pub fn register(&mut self, profile: SubjectProfile) {
        let profile = Arc::new(profile);
        match self.profiles.iter_mut().find(|existing| {
            existing.subject() == profile.subject() && existing.level() == profile.level()
        }) {
            Some(slot) => *slot = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Finds the profile for `subject`; without a level the first registered
    /// level of that subject is returned.
    pub fn get(&self, subject: &str, level: Option<&str>) -> Result<Arc<SubjectProfile>, SchemaError> {
        let subject = subject.trim();
        let level = level.map(str::trim).filter(|value| !value.is_empty());

        self.profiles
            .iter()
            .find(|profile| {
                profile.subject() == subject && level.map_or(true, |level| profile.level() == level)
            })
            .cloned()
            .ok_or_else(|| SchemaError::UnknownSubject(subject.to_string()))
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Arc<SubjectProfile>> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn competency(id: &str, label: &str, criteria: &[(u32, &str)]) -> CompetencyDefinition {
    CompetencyDefinition {
        id: id.into(),
        label: label.to_string(),
        criteria: criteria
            .iter()
            .map(|(id, label)| CriterionDefinition {
                id: (*id).into(),
                label: label.to_string(),
            })
            .collect(),
    }
}

fn domain(label: &str, criteria: Vec<CriterionSelector>) -> DomainDefinition {
    DomainDefinition {
        label: label.to_string(),
        criteria,
    }
}

fn gate(label: &str, rule: RuleDefinition) -> GateDefinition {
    GateDefinition {
        label: label.to_string(),
        rule,
    }
}

fn arabic_definition() -> ProfileDefinition {
    ProfileDefinition {
        taxonomy: SubjectTaxonomy {
            subject: "arabic".to_string(),
            level: "3".to_string(),
            competencies: vec![
                competency(
                    "oral",
                    "Oral communication",
                    &[(1, "Listening"), (2, "Speaking")],
                ),
                competency(
                    "reading",
                    "Reading",
                    &[(1, "Decoding"), (2, "Fluency"), (3, "Comprehension")],
                ),
                competency(
                    "writing",
                    "Writing",
                    &[(1, "Handwriting"), (2, "Spelling"), (3, "Production")],
                ),
            ],
        },
        axes: Some(AxesDefinition {
            x: domain(
                "Decoding",
                vec![CriterionSelector::criteria("reading", [1u32, 2])],
            ),
            y: domain(
                "Comprehension",
                vec![
                    CriterionSelector::criteria("reading", [3u32]),
                    CriterionSelector::criteria("writing", [3u32]),
                ],
            ),
        }),
        funnel: vec![
            gate("Decodes", RuleDefinition::clears("reading", 1u32)),
            gate("Reads fluently", RuleDefinition::clears("reading", 2u32)),
            gate("Understands", RuleDefinition::clears("reading", 3u32)),
            gate(
                "Writes independently",
                RuleDefinition::All(vec![
                    RuleDefinition::clears("writing", 2u32),
                    RuleDefinition::clears("writing", 3u32),
                ]),
            ),
        ],
        radar: vec![
            domain("Oral", vec![CriterionSelector::competency("oral")]),
            domain("Reading", vec![CriterionSelector::competency("reading")]),
            domain("Writing", vec![CriterionSelector::competency("writing")]),
        ],
    }
}

fn math_definition() -> ProfileDefinition {
    ProfileDefinition {
        taxonomy: SubjectTaxonomy {
            subject: "math".to_string(),
            level: "3".to_string(),
            competencies: vec![
                competency(
                    "numbers",
                    "Numbers",
                    &[(1, "Counting"), (2, "Place value")],
                ),
                competency(
                    "computation",
                    "Computation",
                    &[(1, "Addition"), (2, "Subtraction"), (3, "Multiplication")],
                ),
                competency(
                    "measurement",
                    "Measurement and geometry",
                    &[(1, "Units"), (2, "Shapes")],
                ),
                competency(
                    "problem_solving",
                    "Problem solving",
                    &[(1, "Modelling"), (2, "Reasoning")],
                ),
            ],
        },
        axes: Some(AxesDefinition {
            x: domain(
                "Computation",
                vec![
                    CriterionSelector::competency("numbers"),
                    CriterionSelector::competency("computation"),
                ],
            ),
            y: domain(
                "Reasoning",
                vec![CriterionSelector::competency("problem_solving")],
            ),
        }),
        funnel: vec![
            gate(
                "Number sense",
                RuleDefinition::All(vec![
                    RuleDefinition::clears("numbers", 1u32),
                    RuleDefinition::clears("numbers", 2u32),
                ]),
            ),
            gate("Computes", RuleDefinition::clears("computation", 3u32)),
            gate("Models", RuleDefinition::clears("problem_solving", 1u32)),
            gate("Reasons", RuleDefinition::clears("problem_solving", 2u32)),
        ],
        radar: vec![
            domain("Numbers", vec![CriterionSelector::competency("numbers")]),
            domain(
                "Computation",
                vec![CriterionSelector::competency("computation")],
            ),
            domain(
                "Measurement",
                vec![CriterionSelector::competency("measurement")],
            ),
            domain(
                "Problem solving",
                vec![CriterionSelector::competency("problem_solving")],
            ),
        ],
    }
}
