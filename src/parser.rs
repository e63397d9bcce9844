//! Parse schema DSL source into configured, preprocessed messages.
//!
//! The loader only drives the configuration surface: `set_name`/`set_id`/
//! `set_size`/`add_field` on the message and the per-kind setters on the
//! most recently added field. Setter misuse (a `max` on a `bool`, say)
//! surfaces as the setter's own [`ConfigError`].

use crate::error::ConfigError;
use crate::field::Field;
use crate::message::Message;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::path::Path;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

/// Parse schema source into ready-to-use messages. Each message is
/// preprocessed before return, so oversize layouts fail here.
pub fn parse(source: &str) -> Result<Vec<Message>, ConfigError> {
    let pairs = SchemaParser::parse(Rule::schema, source)
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    let root = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::Parse("empty schema".to_string()))?;

    let mut messages = Vec::new();
    for pair in root.into_inner() {
        if pair.as_rule() == Rule::message_def {
            messages.push(build_message(pair)?);
        }
    }
    Ok(messages)
}

/// Parse a schema file from disk.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Message>, ConfigError> {
    let source = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.as_ref().display(), e)))?;
    parse(&source)
}

fn build_message(pair: Pair<Rule>) -> Result<Message, ConfigError> {
    let mut msg = Message::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => msg.set_name(inner.as_str()),
            Rule::msg_prop => apply_msg_prop(&mut msg, inner)?,
            Rule::field_def => build_field(&mut msg, inner)?,
            _ => {}
        }
    }
    msg.preprocess()?;
    Ok(msg)
}

fn apply_msg_prop(msg: &mut Message, pair: Pair<Rule>) -> Result<(), ConfigError> {
    let mut inner = pair.into_inner();
    let name = expect_pair(&mut inner, "property name")?.as_str().to_string();
    let value = expect_pair(&mut inner, "property value")?;
    match name.as_str() {
        "id" => msg.set_id(parse_num::<u32>(&name, &scalar_text(value)?)?),
        "size" => msg.set_size(parse_num::<usize>(&name, &scalar_text(value)?)?),
        "trigger" => msg.set_trigger_var(&scalar_text(value)?),
        other => {
            return Err(ConfigError::Parse(format!(
                "unknown message property: {}",
                other
            )))
        }
    }
    Ok(())
}

fn build_field(msg: &mut Message, pair: Pair<Rule>) -> Result<(), ConfigError> {
    let mut inner = pair.into_inner();
    let kind = expect_pair(&mut inner, "field kind")?.as_str().to_string();
    let name = expect_pair(&mut inner, "field name")?.as_str().to_string();
    msg.add_field(&kind)?;
    let field = match msg.last_field_mut() {
        Some(f) => f,
        None => unreachable!("add_field just succeeded"),
    };
    field.set_name(&name);
    for prop in inner {
        apply_field_prop(field, prop)?;
    }
    Ok(())
}

fn apply_field_prop(field: &mut Field, pair: Pair<Rule>) -> Result<(), ConfigError> {
    let mut inner = pair.into_inner();
    let name = expect_pair(&mut inner, "property name")?.as_str().to_string();
    let value = expect_pair(&mut inner, "property value")?;
    match name.as_str() {
        "min" => field.set_min(parse_num::<f64>(&name, &scalar_text(value)?)?)?,
        "max" => field.set_max(parse_num::<f64>(&name, &scalar_text(value)?)?)?,
        "precision" => field.set_precision(parse_num::<u32>(&name, &scalar_text(value)?)?)?,
        "max_length" => field.set_max_length(parse_num::<usize>(&name, &scalar_text(value)?)?)?,
        "num_bytes" => field.set_num_bytes(parse_num::<usize>(&name, &scalar_text(value)?)?)?,
        "static_val" => field.set_static_val(&scalar_text(value)?)?,
        "array_length" => {
            field.set_array_length(parse_num::<usize>(&name, &scalar_text(value)?)?)
        }
        "source_var" => field.set_source_var(&scalar_text(value)?),
        "source_key" => field.set_source_key(&scalar_text(value)?),
        "algorithms" => field.set_algorithms(list_items(value)?),
        "values" => {
            for v in list_items(value)? {
                field.add_enum_value(&v)?;
            }
        }
        other => {
            return Err(ConfigError::Parse(format!(
                "unknown field property: {}",
                other
            )))
        }
    }
    Ok(())
}

fn expect_pair<'a>(
    inner: &mut pest::iterators::Pairs<'a, Rule>,
    what: &str,
) -> Result<Pair<'a, Rule>, ConfigError> {
    inner
        .next()
        .ok_or_else(|| ConfigError::Parse(format!("missing {}", what)))
}

fn scalar_text(pair: Pair<Rule>) -> Result<String, ConfigError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ConfigError::Parse("empty property value".to_string()))?;
    match inner.as_rule() {
        Rule::list => Err(ConfigError::Parse(
            "expected a scalar value, found a list".to_string(),
        )),
        Rule::string_lit => Ok(inner.as_str().trim_matches('"').to_string()),
        _ => Ok(inner.as_str().to_string()),
    }
}

fn list_items(pair: Pair<Rule>) -> Result<Vec<String>, ConfigError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ConfigError::Parse("empty property value".to_string()))?;
    if inner.as_rule() != Rule::list {
        return Err(ConfigError::Parse(
            "expected a list value, found a scalar".to_string(),
        ));
    }
    let mut items = Vec::new();
    for item in inner.into_inner() {
        let leaf = item
            .into_inner()
            .next()
            .ok_or_else(|| ConfigError::Parse("empty list item".to_string()))?;
        items.push(leaf.as_str().trim_matches('"').to_string());
    }
    Ok(items)
}

fn parse_num<T: std::str::FromStr>(name: &str, text: &str) -> Result<T, ConfigError> {
    text.parse().map_err(|_| {
        ConfigError::Parse(format!("{}: expected a number, got \"{}\"", name, text))
    })
}
