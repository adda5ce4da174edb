/// Plain-text result for pasting elsewhere. Never contains the answer.
pub fn share_text(
    title: &str,
    puzzle_number: i64,
    clue: &str,
    streak: u32,
    hints_used: usize,
) -> String {
    let mut text = format!("{title} #{puzzle_number}\nClue: {clue}\nSolved it! 🔥 Streak: {streak}");
    match hints_used {
        0 => {}
        1 => text.push_str(" (1 hint)"),
        n => text.push_str(&format!(" ({n} hints)")),
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_text_layout() {
        let text = share_text("Daily Word", 12, "Feline", 3, 0);
        assert_eq!(text, "Daily Word #12\nClue: Feline\nSolved it! 🔥 Streak: 3");
    }

    #[test]
    fn test_share_text_mentions_hints() {
        assert!(share_text("D", 1, "c", 1, 1).ends_with("(1 hint)"));
        assert!(share_text("D", 1, "c", 1, 2).ends_with("(2 hints)"));
    }
}
