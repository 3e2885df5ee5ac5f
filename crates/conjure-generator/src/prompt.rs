use conjure_context::Context;

/// A prompt ready to send: fixed system instruction plus one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const SYSTEM_INSTRUCTION: &str = "You translate natural-language requests into shell commands.\n\n\
Rules:\n\
- Output ONLY the literal command text, nothing else\n\
- No markdown, no explanations, no surrounding quotes or code fences\n\
- If several commands are needed, chain them with && or ;\n\
- Prefer portable, POSIX-compliant forms\n\
- If the request is ambiguous, make a reasonable assumption instead of asking for clarification";

const CONTEXT_GUIDANCE: &str =
    "\n- Use the provided context (current app, directory, selected text) to inform the command";

/// Build the prompt for a request. Pure: equal inputs yield byte-identical
/// output.
pub fn build_prompt(request: &str, context: &Context) -> Prompt {
    let system = if context.is_empty() {
        SYSTEM_INSTRUCTION.to_string()
    } else {
        format!("{SYSTEM_INSTRUCTION}{CONTEXT_GUIDANCE}")
    };

    Prompt {
        system,
        user: build_user_turn(request, context),
    }
}

/// The user turn: the bare request, or the request behind a context block
/// listing the non-empty fields in fixed order (app, directory, selection).
fn build_user_turn(request: &str, context: &Context) -> String {
    if context.is_empty() {
        return request.to_string();
    }

    let mut lines = Vec::new();
    if let Some(app) = &context.foreground_app {
        lines.push(format!("Current app: {app}"));
    }
    if let Some(dir) = &context.working_directory {
        lines.push(format!("Current directory: {dir}"));
    }
    if let Some(text) = &context.selected_text {
        lines.push(format!("Selected text:\n{text}"));
    }

    format!("Context:\n{}\n\nRequest: {request}", lines.join("\n"))
}
