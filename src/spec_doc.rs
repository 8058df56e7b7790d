//! Markdown integration specification for a project.
use std::collections::HashMap;

use crate::model::{FieldMapping, Project, Scenario, System};
use crate::verdict::VerdictResult;

const TO_BE_FILLED: &str = "(To be filled.)";
const NOT_SET: &str = "(not set)";

/// One scenario as it appears in the document.
#[derive(Debug, Clone)]
pub struct UseCase<'a> {
    pub scenario: &'a Scenario,
    pub mappings: &'a [FieldMapping],
    /// Present only when the scenario has recorded constraints.
    pub verdict: Option<VerdictResult>,
}

/// Ids of the systems referenced as CTA or CTS, first reference first.
pub fn referenced_system_ids(scenarios: &[Scenario]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for scenario in scenarios {
        for id in [&scenario.cta_system_id, &scenario.cts_system_id]
            .into_iter()
            .flatten()
        {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    ids
}

/// Render the document. `systems` should hold the referenced systems in the
/// order they are listed; unknown ids render as "(not set)".
pub fn render_project_spec(project: &Project, use_cases: &[UseCase<'_>], systems: &[System]) -> String {
    let by_id: HashMap<&str, &System> = systems
        .iter()
        .map(|system| (system.id.as_str(), system))
        .collect();
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# Integration Spec: {}", project.name));
    lines.push(String::new());
    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
        lines.push(String::new());
    }
    lines.push("---".to_string());
    lines.push(String::new());

    lines.push("## Systems".to_string());
    lines.push(String::new());
    for system in systems {
        lines.push(format!("- **{}**", system.name));
        lines.push(format!("  - Base URL: `{}`", system.base_url));
        lines.push(format!("  - Auth: {}", system.auth_type));
        if let Some(docs_url) = system.docs_url.as_deref() {
            lines.push(format!("  - Docs: {docs_url}"));
        }
        lines.push(String::new());
    }
    lines.push("---".to_string());
    lines.push(String::new());

    lines.push("## Use cases (CTA / CTS)".to_string());
    lines.push(String::new());
    for use_case in use_cases {
        push_use_case(&mut lines, use_case, &by_id);
    }

    lines.push("---".to_string());
    lines.push(String::new());
    for heading in ["## Out of scope", "## Open questions"] {
        lines.push(heading.to_string());
        lines.push(String::new());
        lines.push(TO_BE_FILLED.to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

fn push_use_case(lines: &mut Vec<String>, use_case: &UseCase<'_>, by_id: &HashMap<&str, &System>) {
    let scenario = use_case.scenario;
    let system_name = |id: &Option<String>| {
        id.as_deref()
            .and_then(|id| by_id.get(id))
            .map(|system| system.name.clone())
            .unwrap_or_else(|| NOT_SET.to_string())
    };

    lines.push(format!("### {}", scenario.name));
    if let Some(description) = scenario.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(String::new());
        lines.push(description.to_string());
        lines.push(String::new());
    }
    lines.push(format!("- **CTA (source):** {}", system_name(&scenario.cta_system_id)));
    lines.push(format!("- **CTS (target):** {}", system_name(&scenario.cts_system_id)));
    if let Some(verdict) = &use_case.verdict {
        lines.push(format!(
            "- **Feasibility:** {} ({} confidence)",
            verdict.verdict, verdict.confidence
        ));
    }
    lines.push(String::new());

    if !use_case.mappings.is_empty() {
        lines.push("| Source (CTA) | Target (CTS) |".to_string());
        lines.push("|--------------|--------------|".to_string());
        for mapping in use_case.mappings {
            lines.push(format!(
                "| `{}` | `{}` |",
                mapping.source_path, mapping.target_path
            ));
        }
        lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuthType, Constraint, EvidenceSource};
    use crate::verdict::evaluate_verdict;
    use pretty_assertions::assert_eq;

    fn scenario(name: &str, cta: Option<&str>, cts: Option<&str>) -> Scenario {
        Scenario {
            id: format!("sc-{name}"),
            project_id: "p1".to_string(),
            name: name.to_string(),
            description: None,
            cta_system_id: cta.map(str::to_string),
            cts_system_id: cts.map(str::to_string),
            created_at: String::new(),
        }
    }

    fn system(id: &str, name: &str, docs_url: Option<&str>) -> System {
        System {
            id: id.to_string(),
            name: name.to_string(),
            base_url: format!("https://{id}.example.com"),
            auth_type: AuthType::ApiKey,
            docs_url: docs_url.map(str::to_string),
            created_at: String::new(),
        }
    }

    #[test]
    fn referenced_systems_are_listed_once_in_first_use_order() {
        let scenarios = vec![
            scenario("a", Some("s2"), Some("s1")),
            scenario("b", Some("s1"), None),
            scenario("c", None, Some("s3")),
        ];
        assert_eq!(referenced_system_ids(&scenarios), vec!["s2", "s1", "s3"]);
    }

    #[test]
    fn renders_the_full_document() {
        let project = Project {
            id: "p1".to_string(),
            name: "Field Service".to_string(),
            description: Some("Work order sync.".to_string()),
            created_at: String::new(),
        };
        let mut with_mappings = scenario("WO → Case", Some("corrigo"), Some("sfdc"));
        with_mappings.description = Some("Create a case per work order.".to_string());
        let bare = scenario("Unassigned", None, Some("gone"));
        let mappings = vec![FieldMapping {
            id: "m1".to_string(),
            scenario_id: with_mappings.id.clone(),
            source_path: "id".to_string(),
            target_path: "ExternalId__c".to_string(),
            transform_notes: None,
            created_at: String::new(),
        }];
        let constraints = vec![Constraint {
            id: "c1".to_string(),
            scenario_id: with_mappings.id.clone(),
            description: "Likely supports pagination".to_string(),
            category: None,
            source: EvidenceSource::Inference,
            created_at: String::new(),
        }];
        let use_cases = vec![
            UseCase {
                scenario: &with_mappings,
                mappings: &mappings,
                verdict: Some(evaluate_verdict(&constraints)),
            },
            UseCase {
                scenario: &bare,
                mappings: &[],
                verdict: None,
            },
        ];
        let systems = vec![
            system("corrigo", "CorrigoPro", Some("https://docs.corrigo.example.com")),
            system("sfdc", "Salesforce", None),
        ];

        let markdown = render_project_spec(&project, &use_cases, &systems);

        let expected = "\
# Integration Spec: Field Service

Work order sync.

---

## Systems

- **CorrigoPro**
  - Base URL: `https://corrigo.example.com`
  - Auth: apiKey
  - Docs: https://docs.corrigo.example.com

- **Salesforce**
  - Base URL: `https://sfdc.example.com`
  - Auth: apiKey

---

## Use cases (CTA / CTS)

### WO → Case

Create a case per work order.

- **CTA (source):** CorrigoPro
- **CTS (target):** Salesforce
- **Feasibility:** Partially Feasible (Low confidence)

| Source (CTA) | Target (CTS) |
|--------------|--------------|
| `id` | `ExternalId__c` |

### Unassigned
- **CTA (source):** (not set)
- **CTS (target):** (not set)

---

## Out of scope

(To be filled.)

## Open questions

(To be filled.)
";
        assert_eq!(markdown, expected);
    }

    #[test]
    fn empty_project_still_has_every_section() {
        let project = Project {
            id: "p1".to_string(),
            name: "Empty".to_string(),
            description: None,
            created_at: String::new(),
        };
        let markdown = render_project_spec(&project, &[], &[]);
        assert!(markdown.starts_with("# Integration Spec: Empty\n\n---\n\n## Systems\n\n---\n"));
        assert!(markdown.contains("## Use cases (CTA / CTS)\n\n---\n"));
        assert!(markdown.ends_with("## Open questions\n\n(To be filled.)\n"));
    }
}
