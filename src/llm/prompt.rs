//! Prompt text for batch analysis and the optimize pass.

pub const ANALYSIS_SYSTEM: &str = "You are a code analysis engine. Reply with one pure JSON \
object and nothing else: no markdown fences, no commentary. Respect the token limit you are given.";

pub const OPTIMIZE_SYSTEM: &str = "You compress JSON documents without losing information. \
Reply with valid JSON only.";

const ANALYSIS_SCHEMA: &str = r#"{
  "files": {
    "<file path exactly as given in the FILE header>": {
      "file_type": "model | service | api_endpoint | utility | config | test | ...",
      "file_purpose": "one or two sentences",
      "dependencies": ["import or package"],
      "classes": [{"name": "Name", "purpose": "short", "methods": ["method"]}],
      "functions": [{"name": "name", "purpose": "short"}],
      "api_endpoints": [{"path": "/route", "method": "GET"}],
      "design_patterns": ["pattern"],
      "integration_points": ["where this file meets other components"],
      "relationships": ["how this file relates to the rest of the system"]
    }
  }
}"#;

/// Instructions for one batch. `token_budget` bounds the whole reply.
pub fn analysis_prompt(batch_content: &str, token_budget: usize) -> String {
    format!(
        "Analyze the source files below and describe each one as JSON.\n\
         \n\
         The complete reply must stay under {token_budget} tokens. When space is short, keep every \
         file but shorten descriptions and drop the least important fields; coverage of all files \
         matters more than depth.\n\
         \n\
         Reply with exactly this shape:\n\
         {ANALYSIS_SCHEMA}\n\
         \n\
         Rules:\n\
         - \"files\" is an object keyed by file path, never an array.\n\
         - Use the file path exactly as written after \"FILE n:\" in the headers.\n\
         - Double quotes for every key and string; no trailing commas.\n\
         - Leave out any field that would be empty.\n\
         \n\
         FILES:\n\
         {batch_content}\n\
         \n\
         Return only the JSON object."
    )
}

/// Instructions for compressing an existing aggregate document.
pub fn optimize_prompt(document_json: &str) -> String {
    format!(
        "Shorten the descriptions in the JSON document below without losing essential meaning.\n\
         \n\
         Requirements:\n\
         - Keep the top-level keys \"metadata\", \"file_tree\" and \"file_analyses\".\n\
         - Keep every entry of \"file_analyses\" and its path key.\n\
         - Leave \"metadata\" and \"file_tree\" unchanged.\n\
         - Remove redundancy; make descriptions concise.\n\
         - Output valid JSON: double-quoted keys and strings, no trailing commas.\n\
         \n\
         Document:\n\
         {document_json}\n\
         \n\
         Return only the optimized JSON."
    )
}
