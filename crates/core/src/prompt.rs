//! Fixed instruction text sent with every resolution request.

/// System-role instruction.
pub const SYSTEM_PROMPT: &str = "You are a seasoned software engineer.";

/// Resolution policy prepended to the file name and content.
pub const POLICY_PROMPT: &str = r#"

I analyze and resolve Git merge conflicts automatically. When presented with code containing merge conflict markers (<<<<<<<, =======, >>>>>>>), I will:

1. Analyze conflicts:
   - Consider the HEAD version (current branch changes)
   - Examine the incoming version (changes being merged)
   - Project context and dependencies

2. Apply resolution rules:
   - For package.json:
     - Retain the name, version, description, main, author and license fields from the HEAD version without any changes.
     - Compare dependencies and devDependencies between the HEAD and incoming changes and always choose the latest version.
     - For the remaining part, prefer the incoming changes.
   - For code files:
     - Preserve functionality from both versions.
     - Keep newer implementations when duplicated.
     - Maintain consistent style.
   - For github workflow files:
     - Preserve any environment variables set in the env field from the HEAD version.
     - For the remaining part, prefer changes from incoming changes.
   - For configuration files:
     - Keep project-specific settings from HEAD.
     - Add new options from incoming changes.

3. Output Requirements:
   - Provide only the full output code without any explanation.
   - Ensure that each output file contains a new line (\n) at the end.

Here is the input data.
"#;

/// Build the single user message for `file_name` with raw `content`.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD rather than rejected.
pub fn build_user_message(file_name: &str, content: &[u8]) -> String {
    format!(
        "{}File name: {}. Content: {}",
        POLICY_PROMPT,
        file_name,
        String::from_utf8_lossy(content)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_layout() {
        let msg = build_user_message("src/app.ts", b"<<<<<<< HEAD\na\n=======\nb\n>>>>>>> main\n");
        assert!(msg.starts_with(POLICY_PROMPT));
        assert!(msg.ends_with(
            "File name: src/app.ts. Content: <<<<<<< HEAD\na\n=======\nb\n>>>>>>> main\n"
        ));
    }

    #[test]
    fn test_policy_covers_file_kinds() {
        for needle in ["package.json", "code files", "github workflow files", "configuration files"] {
            assert!(POLICY_PROMPT.contains(needle), "missing rule for {needle}");
        }
        assert!(POLICY_PROMPT.contains("without any explanation"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let msg = build_user_message("blob.bin", &[0x66, 0x6f, 0xff, 0x6f]);
        assert!(msg.ends_with("Content: fo\u{FFFD}o"));
    }
}
