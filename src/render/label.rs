/// Turn a raw column name into a title: underscores become spaces, each word capitalized
pub fn format_label(label: &str) -> String {
    if label.is_empty() {
        return String::new();
    }

    label
        .replace('_', " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_becomes_title() {
        assert_eq!(format_label("win_loss_ratio"), "Win Loss Ratio");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(format_label(""), "");
    }

    #[test]
    fn rest_of_word_is_lowercased() {
        assert_eq!(format_label("PPG_by_TEAM"), "Ppg By Team");
    }

    #[test]
    fn repeated_separators_are_preserved() {
        assert_eq!(format_label("field__goal pct"), "Field  Goal Pct");
    }
}
