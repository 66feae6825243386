//! Parser for the delimited extraction record format.
//!
//! The model is asked to emit records like
//! `("entity"<|>Tomaz<|>Person<|>Tomaz works for Neo4j)` separated by `##`
//! and terminated by `<|COMPLETE|>`. LLM output drifts, so parsing is
//! defensive: a malformed record is dropped with a warning and the rest of
//! the response is still processed.

use tracing::warn;

use crate::types::{ExtractedEntity, ExtractedRelationship, ExtractionOutput};

use super::prompts::{COMPLETION_DELIMITER, RECORD_DELIMITER, TUPLE_DELIMITER};

/// Default relationship type when the model omits one (the upstream
/// MS GraphRAG record format carries no type field).
pub const DEFAULT_REL_TYPE: &str = "RELATED_TO";

/// Parse one completion into entity and relationship records.
///
/// Never fails: anything unrecognizable is skipped.
pub fn parse_extraction_output(content: &str) -> ExtractionOutput {
    let mut output = ExtractionOutput::default();

    let content = content.replace(COMPLETION_DELIMITER, "");
    for raw in content.split(RECORD_DELIMITER) {
        let record = raw.trim();
        if record.is_empty() {
            continue;
        }

        match parse_record(record) {
            Some(Record::Entity(entity)) => output.entities.push(entity),
            Some(Record::Relationship(rel)) => output.relationships.push(rel),
            None => warn!(record = %truncate(record, 120), "skipping malformed extraction record"),
        }
    }

    output
}

/// Normalize a relationship type label: trim, spaces and hyphens to
/// underscores, uppercased.
pub fn normalize_rel_type(raw: &str) -> String {
    raw.trim()
        .replace([' ', '-'], "_")
        .to_uppercase()
}

enum Record {
    Entity(ExtractedEntity),
    Relationship(ExtractedRelationship),
}

fn parse_record(record: &str) -> Option<Record> {
    let inner = strip_parens(record);
    let fields: Vec<String> = inner
        .split(TUPLE_DELIMITER)
        .map(|f| unquote(f).to_string())
        .collect();

    match fields.first().map(|k| k.to_lowercase()) {
        Some(kind) if kind == "entity" => parse_entity(&fields).map(Record::Entity),
        Some(kind) if kind == "relationship" => parse_relationship(&fields).map(Record::Relationship),
        _ => None,
    }
}

fn parse_entity(fields: &[String]) -> Option<ExtractedEntity> {
    // ("entity", name, type, description)
    if fields.len() != 4 {
        return None;
    }
    let name = fields[1].trim();
    let entity_type = fields[2].trim();
    if name.is_empty() || entity_type.is_empty() {
        return None;
    }

    Some(ExtractedEntity {
        name: name.to_string(),
        entity_type: entity_type.to_string(),
        description: fields[3].trim().to_string(),
    })
}

fn parse_relationship(fields: &[String]) -> Option<ExtractedRelationship> {
    // ("relationship", source, target, rel_type, description, strength)
    // or the upstream 5-field form without rel_type.
    let (source, target, rel_type, description, strength) = match fields.len() {
        6 => (
            &fields[1],
            &fields[2],
            normalize_rel_type(&fields[3]),
            &fields[4],
            fields[5].as_str(),
        ),
        5 => (
            &fields[1],
            &fields[2],
            DEFAULT_REL_TYPE.to_string(),
            &fields[3],
            fields[4].as_str(),
        ),
        _ => return None,
    };

    let source = source.trim();
    let target = target.trim();
    if source.is_empty() || target.is_empty() || rel_type.is_empty() {
        return None;
    }

    Some(ExtractedRelationship {
        source: source.to_string(),
        target: target.to_string(),
        rel_type,
        description: description.trim().to_string(),
        strength: parse_strength(strength),
    })
}

/// Lenient strength parse: accepts "9", "9.0", "strength: 9"; clamps to 1-10.
fn parse_strength(raw: &str) -> Option<f64> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok().map(|s| s.clamp(1.0, 10.0))
}

fn strip_parens(record: &str) -> &str {
    let record = record.trim();
    record
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(record)
}

fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_record() {
        let content = r#"("entity"<|>Tomaz<|>Person<|>Tomaz works for Neo4j)##
("entity"<|>Neo4j<|>Organization<|>A graph database company)<|COMPLETE|>"#;

        let output = parse_extraction_output(content);
        assert_eq!(output.entities.len(), 2);
        assert_eq!(output.entities[0].name, "Tomaz");
        assert_eq!(output.entities[0].entity_type, "Person");
        assert_eq!(output.entities[1].name, "Neo4j");
        assert!(output.relationships.is_empty());
    }

    #[test]
    fn test_parse_relationship_with_type() {
        let content =
            r#"("relationship"<|>Tomaz<|>Neo4j<|>works for<|>Tomaz is employed by Neo4j<|>9)"#;

        let output = parse_extraction_output(content);
        assert_eq!(output.relationships.len(), 1);
        let rel = &output.relationships[0];
        assert_eq!(rel.source, "Tomaz");
        assert_eq!(rel.target, "Neo4j");
        assert_eq!(rel.rel_type, "WORKS_FOR");
        assert_eq!(rel.strength, Some(9.0));
    }

    #[test]
    fn test_parse_relationship_without_type_defaults() {
        // Upstream 5-field form: no relationship_type field.
        let content = r#"("relationship"<|>Tomaz<|>Grosuplje<|>Tomaz lives in Grosuplje<|>8)"#;

        let output = parse_extraction_output(content);
        assert_eq!(output.relationships.len(), 1);
        assert_eq!(output.relationships[0].rel_type, DEFAULT_REL_TYPE);
        assert_eq!(output.relationships[0].description, "Tomaz lives in Grosuplje");
    }

    #[test]
    fn test_malformed_records_are_dropped_not_fatal() {
        let content = r#"("entity"<|>Tomaz<|>Person<|>desc)##
("entity"<|>missing fields)##
garbage record##
("relationship"<|>A<|>B)##
("entity"<|>Neo4j<|>Organization<|>desc)<|COMPLETE|>"#;

        let output = parse_extraction_output(content);
        assert_eq!(output.entities.len(), 2);
        assert!(output.relationships.is_empty());
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(parse_extraction_output("").is_empty());
        assert!(parse_extraction_output("  \n ").is_empty());
        assert!(parse_extraction_output("<|COMPLETE|>").is_empty());
    }

    #[test]
    fn test_entity_with_empty_name_dropped() {
        let content = r#"("entity"<|> <|>Person<|>desc)"#;
        assert!(parse_extraction_output(content).entities.is_empty());
    }

    #[test]
    fn test_strength_parsing_lenient() {
        assert_eq!(parse_strength("9"), Some(9.0));
        assert_eq!(parse_strength("7.5"), Some(7.5));
        assert_eq!(parse_strength("strength: 6"), Some(6.0));
        assert_eq!(parse_strength("42"), Some(10.0)); // clamped
        assert_eq!(parse_strength("high"), None);
    }

    #[test]
    fn test_normalize_rel_type() {
        assert_eq!(normalize_rel_type("works for"), "WORKS_FOR");
        assert_eq!(normalize_rel_type(" lives-in "), "LIVES_IN");
        assert_eq!(normalize_rel_type("CEO_OF"), "CEO_OF");
    }

    #[test]
    fn test_quoted_fields_unquoted() {
        let content = r#"("entity"<|>"Tomaz"<|>"Person"<|>"a description")"#;
        let output = parse_extraction_output(content);
        assert_eq!(output.entities[0].name, "Tomaz");
        assert_eq!(output.entities[0].description, "a description");
    }
}
