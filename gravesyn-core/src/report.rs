//! Output formatting - plaintext and JSON.

use serde_json::json;

use crate::classify::Classification;
use crate::patterns::PatternLibrary;
use crate::taxonomy::TagSet;

fn tag_summary(tags: &TagSet) -> String {
    if tags.is_empty() {
        return "neutral".to_string();
    }
    tags.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Prints a classification in plain text format.
pub fn print_plain(result: &Classification) {
    println!("TAGS ({} cards):", result.tags.len());
    for (id, tags) in &result.tags {
        println!("- {}: {}", id, tag_summary(tags));
    }

    if result.edges.is_empty() {
        println!("No graveyard synergy edges found.");
    } else {
        println!("EDGES ({}):", result.edges.len());
        for edge in &result.edges {
            println!("- {} [{:.2}]", edge.pair, edge.strength);
            for link in &edge.links {
                println!("    {}", link);
            }
        }
    }

    if !result.rejected.is_empty() {
        println!("REJECTED ({}):", result.rejected.len());
        for e in &result.rejected {
            println!("- {}", e);
        }
    }
}

/// JSON value of a classification.
pub fn to_json(result: &Classification) -> serde_json::Value {
    let rejected: Vec<_> = result
        .rejected
        .iter()
        .map(|e| json!({ "card_id": e.card_id(), "error": e.to_string() }))
        .collect();
    json!({
        "tags": result.tags,
        "edges": result.edges,
        "rejected": rejected,
    })
}

/// Prints a classification in JSON format.
pub fn print_json(result: &Classification) {
    match serde_json::to_string_pretty(&to_json(result)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"edges\": {}}}", result.edges.len());
        }
    }
}

/// Prints the audit table of a library.
pub fn print_rules_plain(library: &PatternLibrary) {
    print!("{}", library.render_table());
}

/// Prints the library as a versioned JSON rule table.
pub fn print_rules_json(library: &PatternLibrary) {
    match serde_json::to_string_pretty(&library.to_table()) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("[WARN] JSON serialization failed: {}", e),
    }
}
