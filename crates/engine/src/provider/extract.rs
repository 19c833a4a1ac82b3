//! Fenced-code-block extraction from markdown replies.

/// Extract the first fenced YAML block from a markdown response.
///
/// Blocks tagged `yaml` or `yml` are preferred; when none carries a tag,
/// the first untagged block is returned. Returns `None` when the text has
/// no complete fenced block.
pub fn extract_fenced_yaml(markdown: &str) -> Option<String> {
    let mut untagged_block: Option<String> = None;

    let mut lines = markdown.lines();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        let Some(fence_rest) = trimmed.strip_prefix("```") else {
            continue;
        };
        let language = fence_rest.trim().to_lowercase();

        let mut block = String::new();
        let mut closed = false;
        for block_line in lines.by_ref() {
            if block_line.trim_start().starts_with("```") {
                closed = true;
                break;
            }
            block.push_str(block_line);
            block.push('\n');
        }
        if !closed {
            break;
        }

        if language == "yaml" || language == "yml" {
            return Some(block);
        }
        if language.is_empty() && untagged_block.is_none() {
            untagged_block = Some(block);
        }
    }

    untagged_block
}
