// Cross-cutting prompt fragments shared by every generation prompt.
// Task-specific prompts live in generation::prompts.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prompt that writes résumé prose.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Only state facts that are present in, or directly implied by, the source. \
    Do NOT invent employers, dates, titles, degrees or figures. \
    Expanding on scope, methods and tools already mentioned is allowed.";
