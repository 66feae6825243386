//! Prompt templates for the extraction and summarization engines.
//!
//! The extraction prompt follows the MS GraphRAG delimited record format:
//! tuples joined by [`TUPLE_DELIMITER`], records joined by
//! [`RECORD_DELIMITER`], output terminated by [`COMPLETION_DELIMITER`].

/// Delimiter between fields inside a record.
pub const TUPLE_DELIMITER: &str = "<|>";

/// Delimiter between records.
pub const RECORD_DELIMITER: &str = "##";

/// Marker the model emits when the whole list has been produced.
pub const COMPLETION_DELIMITER: &str = "<|COMPLETE|>";

/// Build the entity/relationship extraction prompt for one text chunk.
pub fn graph_extraction_prompt(entity_types: &[String], text: &str) -> String {
    let types = entity_types.join(", ");

    format!(
        r#"-Goal-
Given a text document and a list of entity types, identify all entities of those types from the text and all relationships among the identified entities.

-Steps-
1. Identify all entities. For each identified entity, extract the following information:
- entity_name: Name of the entity, capitalized
- entity_type: One of the following types: [{types}]
- entity_description: Comprehensive description of the entity's attributes and activities
Format each entity as ("entity"{tuple}<entity_name>{tuple}<entity_type>{tuple}<entity_description>)

2. From the entities identified in step 1, identify all pairs of (source_entity, target_entity) that are *clearly related* to each other.
For each pair of related entities, extract the following information:
- source_entity: name of the source entity, as identified in step 1
- target_entity: name of the target entity, as identified in step 1
- relationship_type: a short label for the relationship in UPPER_SNAKE_CASE (e.g. WORKS_FOR, LIVES_IN)
- relationship_description: explanation as to why you think the source entity and the target entity are related to each other
- relationship_strength: a numeric score from 1 to 10 indicating strength of the relationship
Format each relationship as ("relationship"{tuple}<source_entity>{tuple}<target_entity>{tuple}<relationship_type>{tuple}<relationship_description>{tuple}<relationship_strength>)

3. Return output as a single list of all the entities and relationships identified in steps 1 and 2. Use **{record}** as the list delimiter.

4. When finished, output {completion}

-Example-
Entity types: [Person, Organization]
Text: Alice is the CEO of Acme Corp.
Output:
("entity"{tuple}Alice{tuple}Person{tuple}Alice is the chief executive officer of Acme Corp){record}
("entity"{tuple}Acme Corp{tuple}Organization{tuple}Acme Corp is a company led by Alice){record}
("relationship"{tuple}Alice{tuple}Acme Corp{tuple}CEO_OF{tuple}Alice leads Acme Corp as its CEO{tuple}9){completion}

-Real Data-
Entity types: [{types}]
Text: {text}
Output:
"#,
        types = types,
        text = text,
        tuple = TUPLE_DELIMITER,
        record = RECORD_DELIMITER,
        completion = COMPLETION_DELIMITER,
    )
}

/// System message used for all completion calls.
pub fn system_prompt() -> &'static str {
    "You are a helpful assistant that extracts structured information from text \
     and writes concise, factual summaries."
}

/// Build the summary prompt for an entity and its accumulated descriptions.
pub fn entity_summary_prompt(name: &str, entity_type: &str, descriptions: &[String]) -> String {
    format!(
        r#"You are generating a comprehensive summary of one entity in a knowledge graph.
Given the entity and a list of descriptions collected from different source texts, write a single concise summary that merges all of the information. Resolve any contradictions and write in third person. Include the entity name in the summary.

Entity: {name}
Type: {entity_type}
Descriptions:
{descriptions}

Summary:"#,
        name = name,
        entity_type = entity_type,
        descriptions = bullet_list(descriptions),
    )
}

/// Build the summary prompt for a relationship and its evidence list.
pub fn relationship_summary_prompt(
    source: &str,
    target: &str,
    rel_type: &str,
    descriptions: &[String],
) -> String {
    format!(
        r#"You are generating a comprehensive summary of one relationship in a knowledge graph.
Given the two endpoints, the relationship type, and a list of evidence descriptions collected from different source texts, write a single concise summary of the relationship. Resolve any contradictions and write in third person.

Relationship: ({source})-[{rel_type}]->({target})
Evidence:
{descriptions}

Summary:"#,
        source = source,
        target = target,
        rel_type = rel_type,
        descriptions = bullet_list(descriptions),
    )
}

/// Build the summary prompt for a detected community of entities.
///
/// `members` are rendered lines ("name (type): context"), `relationships`
/// are rendered lines for edges among members.
pub fn community_summary_prompt(members: &[String], relationships: &[String]) -> String {
    let relationship_section = if relationships.is_empty() {
        "(none recorded)".to_string()
    } else {
        relationships.join("\n")
    };

    format!(
        r#"You are analyzing a community of related entities detected in a knowledge graph.
Given the member entities and the relationships among them, write a summary of the community: what ties these entities together, the key members, and the overall theme. Write a single paragraph in third person.

Members:
{members}

Relationships among members:
{relationships}

Summary:"#,
        members = members.join("\n"),
        relationships = relationship_section,
    )
}

/// Build the type reconciliation prompt for an entity whose mentions
/// disagreed on the type.
pub fn type_reconciliation_prompt(name: &str, candidates: &[String]) -> String {
    format!(
        r#"An entity was extracted multiple times with conflicting types.
Entity: {name}
Candidate types: {candidates}

Answer with exactly one of the candidate types, the one that best describes the entity. Output only the type, nothing else."#,
        name = name,
        candidates = candidates.join(", "),
    )
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|d| format!("- {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_contains_types_and_delimiters() {
        let types = vec!["Person".to_string(), "Location".to_string()];
        let prompt = graph_extraction_prompt(&types, "Tomaz lives in Grosuplje");

        assert!(prompt.contains("Person, Location"));
        assert!(prompt.contains("Tomaz lives in Grosuplje"));
        assert!(prompt.contains(TUPLE_DELIMITER));
        assert!(prompt.contains(RECORD_DELIMITER));
        assert!(prompt.contains(COMPLETION_DELIMITER));
    }

    #[test]
    fn test_entity_summary_prompt_lists_descriptions() {
        let descriptions = vec!["works for Neo4j".to_string(), "lives in Grosuplje".to_string()];
        let prompt = entity_summary_prompt("Tomaz", "Person", &descriptions);

        assert!(prompt.contains("Entity: Tomaz"));
        assert!(prompt.contains("- works for Neo4j"));
        assert!(prompt.contains("- lives in Grosuplje"));
    }

    #[test]
    fn test_community_prompt_handles_no_relationships() {
        let members = vec!["Tomaz (Person)".to_string()];
        let prompt = community_summary_prompt(&members, &[]);
        assert!(prompt.contains("(none recorded)"));
    }
}
