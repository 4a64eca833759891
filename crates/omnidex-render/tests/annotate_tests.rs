use omnidex_core::config::MissingRulePolicy;
use omnidex_core::error::{Error, Result};
use omnidex_core::rules::{DisplayRule, RuleTable};
use omnidex_core::traits::{DatabaseRegistry, IndexDatabase};
use omnidex_core::types::{AnnotatedResult, IndexRecord, Row};
use omnidex_render::ResultAnnotator;

struct FixedDb {
    rows: Vec<Row>,
}

impl IndexDatabase for FixedDb {
    fn execute(&self, _sql: &str, params: &[(&str, &str)]) -> Result<Vec<Row>> {
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0, "key", "display_sql binds the record key");
        Ok(self.rows.clone())
    }
}

struct OneSourceRegistry {
    source: String,
    db: FixedDb,
}

impl DatabaseRegistry for OneSourceRegistry {
    fn database(&self, name: &str) -> Result<&dyn IndexDatabase> {
        if name == self.source {
            Ok(&self.db)
        } else {
            Err(Error::NotFound(format!("database: {}", name)))
        }
    }
}

fn record(type_name: &str) -> IndexRecord {
    IndexRecord {
        rowid: 1,
        r#type: type_name.to_string(),
        key: "https://example.com/1".to_string(),
        title: Some("Wolf sighting".to_string()),
        category: Some("1".to_string()),
        timestamp: Some("2020-03-01T10:00:00".to_string()),
        search_1: Some("a wolf was seen".to_string()),
        rank: None,
    }
}

fn display_row(pairs: &[(&str, &str)]) -> Row {
    let mut row = Row::new();
    for (name, value) in pairs {
        row.insert(name.to_string(), serde_json::Value::String(value.to_string()));
    }
    row
}

#[test]
fn display_sql_fetches_extra_fields_from_the_source_database() {
    let mut rules = RuleTable::default();
    rules.insert(
        "github/issues",
        DisplayRule {
            display_sql: Some("select state from issues where html_url = :key".to_string()),
            display_template: Some("<h3>{{ title }}</h3> is {{ display.state }}".to_string()),
        },
    );
    let registry = OneSourceRegistry {
        source: "github".to_string(),
        db: FixedDb { rows: vec![display_row(&[("state", "open")])] },
    };

    let mut annotator = ResultAnnotator::new(&rules, &registry, MissingRulePolicy::Fail);
    let mut result = AnnotatedResult::new(record("github/issues"));
    annotator.annotate(&mut result).expect("annotate");

    assert_eq!(result.display["state"], "open");
    assert_eq!(result.output, "<h3>Wolf sighting</h3> is open");
}

#[test]
fn display_is_empty_when_the_lookup_returns_no_rows() {
    let mut rules = RuleTable::default();
    rules.insert(
        "github/issues",
        DisplayRule {
            display_sql: Some("select state from issues where html_url = :key".to_string()),
            display_template: None,
        },
    );
    let registry = OneSourceRegistry {
        source: "github".to_string(),
        db: FixedDb { rows: Vec::new() },
    };

    let mut annotator = ResultAnnotator::new(&rules, &registry, MissingRulePolicy::Fail);
    let mut result = AnnotatedResult::new(record("github/issues"));
    annotator.annotate(&mut result).expect("annotate");

    assert!(result.display.is_empty());
    assert!(result.output.starts_with("<pre>"), "fallback rendering");
}

#[test]
fn template_context_exposes_the_json_helper() {
    let mut rules = RuleTable::default();
    rules.insert(
        "blog/post",
        DisplayRule {
            display_sql: None,
            display_template: Some("{{ display | tojson }}|{{ key }}".to_string()),
        },
    );
    let registry = OneSourceRegistry {
        source: "blog".to_string(),
        db: FixedDb { rows: Vec::new() },
    };

    let mut annotator = ResultAnnotator::new(&rules, &registry, MissingRulePolicy::Fail);
    let mut result = AnnotatedResult::new(record("blog/post"));
    annotator.annotate(&mut result).expect("annotate");

    assert_eq!(result.output, "{}|https://example.com/1");
}

#[test]
fn fallback_output_is_escaped_preformatted_json() {
    let rules = RuleTable::default();
    let registry = OneSourceRegistry {
        source: "blog".to_string(),
        db: FixedDb { rows: Vec::new() },
    };

    let mut annotator = ResultAnnotator::new(&rules, &registry, MissingRulePolicy::Skip);
    let mut result = AnnotatedResult::new(record("blog/post"));
    annotator.annotate(&mut result).expect("annotate");

    assert!(result.output.starts_with("<pre>"));
    assert!(result.output.ends_with("</pre>"));
    assert!(result.output.contains("&quot;type&quot;"));
    assert!(
        !result.output[5..result.output.len() - 6].contains('<'),
        "JSON body is fully escaped"
    );
}

#[test]
fn annotation_is_idempotent() {
    let mut rules = RuleTable::default();
    rules.insert(
        "github/issues",
        DisplayRule {
            display_sql: Some("select state from issues where html_url = :key".to_string()),
            display_template: Some("{{ title }}: {{ display.state }}".to_string()),
        },
    );
    let registry = OneSourceRegistry {
        source: "github".to_string(),
        db: FixedDb { rows: vec![display_row(&[("state", "closed")])] },
    };

    let mut annotator = ResultAnnotator::new(&rules, &registry, MissingRulePolicy::Fail);
    let mut result = AnnotatedResult::new(record("github/issues"));
    annotator.annotate(&mut result).expect("first pass");
    let first = result.clone();
    annotator.annotate(&mut result).expect("second pass");

    assert_eq!(result.display, first.display);
    assert_eq!(result.output, first.output);
}

#[test]
fn missing_rule_is_fatal_by_default() {
    let rules = RuleTable::default();
    let registry = OneSourceRegistry {
        source: "blog".to_string(),
        db: FixedDb { rows: Vec::new() },
    };

    let mut annotator = ResultAnnotator::new(&rules, &registry, MissingRulePolicy::Fail);
    let mut result = AnnotatedResult::new(record("blog/post"));
    let err = annotator.annotate(&mut result).expect_err("fatal");
    assert!(matches!(err, Error::MissingRule(t) if t == "blog/post"));
}

#[test]
fn missing_rule_can_degrade_to_the_fallback() {
    let rules = RuleTable::default();
    let registry = OneSourceRegistry {
        source: "blog".to_string(),
        db: FixedDb { rows: Vec::new() },
    };

    let mut annotator = ResultAnnotator::new(&rules, &registry, MissingRulePolicy::Skip);
    let mut results = vec![
        AnnotatedResult::new(record("blog/post")),
        AnnotatedResult::new(record("blog/post")),
    ];
    annotator.annotate_all(&mut results).expect("degraded rows");
    for result in &results {
        assert!(result.display.is_empty());
        assert!(result.output.starts_with("<pre>"));
    }
}
