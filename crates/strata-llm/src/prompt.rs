//! Prompt construction

use strata_core::GenerationRequest;

/// System prompt shared by every round
pub const SYSTEM_PROMPT: &str = "You are an expert front-end developer. \
Produce one complete, self-contained HTML5 document that works offline. \
Put all CSS in a single <style> element inside <head> and all JavaScript in a \
single <script> element at the end of <body>. Use no CDNs, imports or other \
external resources. Reply with the HTML document only: no Markdown fences, \
no explanations.";

/// User prompt for one request
#[must_use]
pub fn user_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::new();
    match &request.prior_script {
        None => {
            prompt.push_str("Create a complete HTML file for this project.\n\n");
            prompt.push_str(&format!("Title: {}\n", request.task));
            prompt.push_str(&format!("Requirements: {}\n", request.brief.trim()));
        }
        Some(script) => {
            prompt.push_str(&format!(
                "Round {} of an existing project. Produce the parts of the page that \
                 the new requirements add or change.\n\n",
                request.round
            ));
            prompt.push_str(&format!("Title: {}\n", request.task));
            prompt.push_str(&format!("New requirements: {}\n\n", request.brief.trim()));
            prompt.push_str("Existing script (functions you redefine replace these by name):\n");
            prompt.push_str("<script>\n");
            prompt.push_str(script.trim());
            prompt.push_str("\n</script>\n");
        }
    }
    prompt.push_str(
        "\nRules:\n\
         - Include <!DOCTYPE html>\n\
         - Give every top-level section of <body> a stable, descriptive id\n\
         - Declare behavior as named top-level functions\n\
         - Output raw HTML only\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_round_prompt_has_no_prior_context() {
        let prompt = user_prompt(&GenerationRequest::new("Todo", "A list", 1));
        assert!(prompt.contains("Title: Todo"));
        assert!(prompt.contains("Requirements: A list"));
        assert!(!prompt.contains("<script>"));
    }

    #[test]
    fn update_prompt_embeds_prior_script() {
        let request =
            GenerationRequest::new("Todo", "Add filters", 3).with_prior_script("function add() {}");
        let prompt = user_prompt(&request);
        assert!(prompt.starts_with("Round 3"));
        assert!(prompt.contains("<script>\nfunction add() {}\n</script>"));
    }
}
