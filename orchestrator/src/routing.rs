/// Decides whether a prompt asks for a picture rather than text.
///
/// Matches a trimmed, lowercased prompt that starts with `create an image`
/// or `generate an image`, or contains `image of` or `draw ` anywhere.
pub fn should_generate_image(prompt: &str) -> bool {
    let p = prompt.trim().to_lowercase();
    p.starts_with("create an image")
        || p.starts_with("generate an image")
        || p.contains("image of")
        || p.contains("draw ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_prompts() {
        assert!(should_generate_image("  Create an image of a black cat"));
        assert!(should_generate_image("GENERATE AN IMAGE: sunset"));
        assert!(should_generate_image("show me an image of the sea"));
        assert!(should_generate_image("please draw a fox"));
    }

    #[test]
    fn text_prompts() {
        assert!(!should_generate_image("What is an image sensor?"));
        assert!(!should_generate_image("drawbacks of rust"));
        assert!(!should_generate_image("I want to create images later"));
        assert!(!should_generate_image(""));
    }

    #[test]
    fn draw_needs_a_trailing_space() {
        assert!(!should_generate_image("withdraw"));
        assert!(should_generate_image("withdraw money"));
    }
}
