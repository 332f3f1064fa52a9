//! crates/diagnostic_core/src/questionnaire.rs
//!
//! The fixed diagnostic questionnaire: ten typed questions, each tagged
//! with a category. Static data, defined once, never mutated.

use serde::Serialize;

/// How a question is answered: a 1-10 rating or one option from a list.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Range,
    Select { options: Vec<&'static str> },
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub category: &'static str,
    pub prompt: &'static str,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// The full ordered question list. Question categories are the axes the
/// company answers along; they are related to, but not the same set as,
/// the report's scored categories.
pub fn questions() -> Vec<Question> {
    vec![
        Question {
            id: "efficiency_process",
            category: "Operational Efficiency",
            prompt: "How clearly (1-10) are your operational processes defined and documented?",
            kind: QuestionKind::Range,
        },
        Question {
            id: "efficiency_automation",
            category: "Operational Efficiency",
            prompt: "To what extent are your core workflows automated?",
            kind: QuestionKind::Select {
                options: vec!["Manual", "Some tools", "Mostly automated", "fully automated"],
            },
        },
        Question {
            id: "digital_tools",
            category: "Digital Maturity",
            prompt: "How integrated are your digital tools across departments?",
            kind: QuestionKind::Select {
                options: vec![
                    "Siloed",
                    "Some integration",
                    "Integrated ecosystem",
                    "Real-time sync",
                ],
            },
        },
        Question {
            id: "digital_data",
            category: "Digital Maturity",
            prompt: "How often do you use data analytics for decision making?",
            kind: QuestionKind::Select {
                options: vec!["Rarely", "Monthly", "Weekly", "Daily"],
            },
        },
        Question {
            id: "hr_training",
            category: "HR Capability",
            prompt: "Do you have a formal continuous learning/training program?",
            kind: QuestionKind::Select {
                options: vec!["No", "Ad-hoc", "Formal program", "Comprehensive L&D culture"],
            },
        },
        Question {
            id: "hr_satisfaction",
            category: "HR Capability",
            prompt: "Rate your employee retention/satisfaction (1-10).",
            kind: QuestionKind::Range,
        },
        Question {
            id: "innovation_budget",
            category: "Innovation",
            prompt: "What % of budget is allocated to R&D or new initiatives?",
            kind: QuestionKind::Select {
                options: vec!["0%", "1-5%", "5-10%", "10%+"],
            },
        },
        Question {
            id: "innovation_speed",
            category: "Innovation",
            prompt: "How fast can you launch a new product/feature from idea to market?",
            kind: QuestionKind::Select {
                options: vec!["Years", "Months", "Weeks", "Days"],
            },
        },
        Question {
            id: "risk_compliance",
            category: "Risk Awareness",
            prompt: "How regularly do you audit for compliance and security risks?",
            kind: QuestionKind::Select {
                options: vec!["Never", "Annually", "Quarterly", "Continuous monitoring"],
            },
        },
        Question {
            id: "risk_resilience",
            category: "Risk Awareness",
            prompt: "Do you have a tested disaster recovery plan?",
            kind: QuestionKind::Select {
                options: vec![
                    "No",
                    "Drafted but untested",
                    "Tested annually",
                    "Robust & automated",
                ],
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ten_questions_with_unique_ids() {
        let qs = questions();
        assert_eq!(qs.len(), 10);
        let ids: HashSet<&str> = qs.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn select_questions_always_have_options() {
        for q in questions() {
            if let QuestionKind::Select { options } = &q.kind {
                assert!(!options.is_empty(), "question {} has no options", q.id);
            }
        }
    }
}
