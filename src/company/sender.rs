use regex::Regex;
use std::sync::OnceLock;

/// Address part of a `Display Name <addr>` sender, or the bare sender.
pub fn parse_address(sender: &str) -> Option<&str> {
    static ANGLE: OnceLock<Regex> = OnceLock::new();
    let angle = ANGLE.get_or_init(|| Regex::new(r"<([^<>]*)>").expect("valid address pattern"));

    let address = match angle.captures(sender).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => sender.trim(),
    };

    let (local, domain) = address.split_once('@')?;
    if local.is_empty() || domain.is_empty() || address.contains(char::is_whitespace) {
        return None;
    }
    Some(address)
}

/// Company guess from the sender domain: `no-reply@big-tech.io` -> `Big Tech`.
pub fn company_from_sender(sender: &str) -> Option<String> {
    let address = parse_address(sender)?;
    let domain = address.rsplit_once('@')?.1;
    let label = domain.split('.').next()?.replace('-', " ");

    let name = title_case(&label);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Uppercase the first letter after every non-letter, lowercase the rest:
/// `3m labs` -> `3M Labs`.
fn title_case(text: &str) -> String {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let mut after_letter = false;
            word.chars()
                .flat_map(|c| {
                    let cased: Vec<char> = if after_letter {
                        c.to_lowercase().collect()
                    } else {
                        c.to_uppercase().collect()
                    };
                    after_letter = c.is_alphabetic();
                    cased
                })
                .collect()
        })
        .collect();
    words.join(" ")
}
