//! Text normalization shared by ticket creation, search and display.

use chrono::{DateTime, Utc};

/// Capitalize each `.`-separated sentence: first character uppercased, the
/// rest lowercased, sentences rejoined with `". "`.
///
/// ```
/// use callcenter::text::capitalize_sentences;
/// assert_eq!(capitalize_sentences("12 MAIN st.apt 4"), "12 main st. Apt 4");
/// ```
pub fn capitalize_sentences(text: &str) -> String {
    text.split('.')
        .map(|sentence| {
            let trimmed = sentence.trim();
            let mut chars = trimmed.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.as_str().to_lowercase().chars())
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(". ")
}

/// How long until `action_date`, or "Expired" once it has passed.
pub fn time_left(action_date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if action_date < now {
        return "Expired".to_string();
    }

    let remaining = action_date
        .signed_duration_since(now)
        .to_std()
        .unwrap_or_default();
    let formatted = timeago::Formatter::new().convert(remaining);
    let distance = formatted.strip_suffix(" ago").unwrap_or(&formatted);

    format!("Deadline in {}", distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn capitalizes_every_sentence() {
        assert_eq!(
            capitalize_sentences("hello WORLD. second one"),
            "Hello world. Second one"
        );
    }

    #[test]
    fn leaves_leading_digits_alone() {
        assert_eq!(capitalize_sentences("ab12 Main"), "Ab12 main");
        assert_eq!(capitalize_sentences("  7 oak AVE "), "7 oak ave");
    }

    #[test]
    fn empty_sentences_stay_empty() {
        assert_eq!(capitalize_sentences(""), "");
        assert_eq!(capitalize_sentences("a."), "A. ");
    }

    #[test]
    fn past_dates_are_expired() {
        let now = Utc::now();
        assert_eq!(time_left(now - Duration::hours(1), now), "Expired");
    }

    #[test]
    fn future_dates_show_distance() {
        let now = Utc::now();
        let text = time_left(now + Duration::days(3), now);
        assert_eq!(text, "Deadline in 3 days");
    }
}
