//! Per-type display annotation.
//!
//! Each result row is annotated with a `display` mapping (fetched by the
//! rule's optional lookup query) and an `output` string (the rule's
//! template, or a generic preformatted-JSON fallback). Templates compile
//! once per type and render many times; annotation is idempotent.

use std::collections::HashSet;

use minijinja::Environment;
use serde_json::{Map, Value};
use tracing::debug;

use omnidex_core::config::MissingRulePolicy;
use omnidex_core::error::{Error, Result};
use omnidex_core::rules::RuleTable;
use omnidex_core::traits::DatabaseRegistry;
use omnidex_core::types::{AnnotatedResult, Row};

pub struct ResultAnnotator<'a> {
    rules: &'a RuleTable,
    registry: &'a dyn DatabaseRegistry,
    policy: MissingRulePolicy,
    env: Environment<'static>,
    compiled: HashSet<String>,
}

impl<'a> ResultAnnotator<'a> {
    pub fn new(
        rules: &'a RuleTable,
        registry: &'a dyn DatabaseRegistry,
        policy: MissingRulePolicy,
    ) -> Self {
        let mut env = Environment::new();
        env.add_filter("intcomma", intcomma);
        Self {
            rules,
            registry,
            policy,
            env,
            compiled: HashSet::new(),
        }
    }

    /// Annotate rows in order. Row annotation only mutates the row itself.
    pub fn annotate_all(&mut self, results: &mut [AnnotatedResult]) -> Result<()> {
        for result in results.iter_mut() {
            self.annotate(result)?;
        }
        Ok(())
    }

    pub fn annotate(&mut self, result: &mut AnnotatedResult) -> Result<()> {
        let type_name = result.record.r#type.clone();
        let rules = self.rules;
        let Some(rule) = rules.get(&type_name) else {
            match self.policy {
                MissingRulePolicy::Fail => return Err(Error::MissingRule(type_name)),
                MissingRulePolicy::Skip => {
                    debug!("no display rule for type {}, using fallback", type_name);
                    result.display = Row::new();
                    let output = fallback_output(result);
                    result.output = output;
                    return Ok(());
                }
            }
        };

        if let Some(sql) = rule.display_sql.as_deref() {
            let registry = self.registry;
            let db = registry.database(result.record.source())?;
            let rows = db.execute(sql, &[("key", result.record.key.as_str())])?;
            result.display = rows.into_iter().next().unwrap_or_default();
        } else {
            result.display = Row::new();
        }

        let output = match rule.display_template.as_deref() {
            Some(template) => self.render(&type_name, template, result)?,
            None => fallback_output(result),
        };
        result.output = output;
        Ok(())
    }

    fn render(
        &mut self,
        type_name: &str,
        source: &str,
        result: &AnnotatedResult,
    ) -> Result<String> {
        if !self.compiled.contains(type_name) {
            self.env
                .add_template_owned(type_name.to_string(), source.to_string())
                .map_err(|e| Error::Template(format!("{}: {}", type_name, e)))?;
            self.compiled.insert(type_name.to_string());
        }
        let template = self
            .env
            .get_template(type_name)
            .map_err(|e| Error::Template(format!("{}: {}", type_name, e)))?;
        template
            .render(render_context(result))
            .map_err(|e| Error::Template(format!("{}: {}", type_name, e)))
    }
}

/// Record fields at the top level plus the `display` mapping; the
/// template engine's `tojson` filter is the JSON-encoding helper.
fn render_context(result: &AnnotatedResult) -> Value {
    let mut context = match serde_json::to_value(&result.record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    context.insert("display".to_string(), Value::Object(result.display.clone()));
    Value::Object(context)
}

/// Generic rendering for rule-less output: the full row pretty-printed as
/// JSON, HTML-escaped, wrapped as preformatted text.
fn fallback_output(result: &AnnotatedResult) -> String {
    let mut row = match serde_json::to_value(&result.record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if !result.display.is_empty() {
        row.insert("display".to_string(), Value::Object(result.display.clone()));
    }
    let rendered = serde_json::to_string_pretty(&Value::Object(row)).unwrap_or_default();
    format!("<pre>{}</pre>", escape_html(&rendered))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn intcomma(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        format!("-{}", out)
    } else {
        out
    }
}
