use serde::Serialize;
use tiendanube_mcp::ToolRegistry;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct CategoryListing<'a> {
    category: &'static str,
    tools: Vec<ToolListing<'a>>,
}

#[derive(Debug, Serialize)]
struct ToolListing<'a> {
    name: &'a str,
    description: &'a str,
}

pub fn run(json_output: bool) -> CommandResult {
    let registry = match ToolRegistry::builtin() {
        Ok(registry) => registry,
        Err(error) => return CommandResult::failure("tools", "registry", error.to_string(), 2),
    };
    CommandResult::output(render(&registry, json_output))
}

pub fn render(registry: &ToolRegistry, json_output: bool) -> String {
    let listing: Vec<CategoryListing<'_>> = registry
        .by_category()
        .into_iter()
        .map(|(category, definitions)| CategoryListing {
            category,
            tools: definitions
                .into_iter()
                .map(|definition| ToolListing {
                    name: definition.name,
                    description: definition.description,
                })
                .collect(),
        })
        .collect();

    if json_output {
        return serde_json::to_string_pretty(&listing).unwrap_or_else(|error| {
            format!("{{\"error\":\"{}\"}}", super::escape_json(&error.to_string()))
        });
    }

    let mut lines = vec![format!("{} tools in {} categories", registry.len(), listing.len())];
    for category in &listing {
        lines.push(format!("{} ({})", category.category, category.tools.len()));
        for tool in &category.tools {
            let summary = tool.description.split(". ").next().unwrap_or(tool.description);
            lines.push(format!("  - {}: {}", tool.name, summary.trim_end_matches('.')));
        }
    }
    lines.join("\n")
}
