//! Wording for the human readable output.

/// Picks `singular` when there is exactly one of something.
#[inline]
pub fn plural<'a>(amount: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if amount == 1 {
        singular
    } else {
        plural
    }
}

/// `1 file`, `3 files`.
pub fn counted(amount: usize, singular: &str, plural_form: &str) -> String {
    format!("{amount} {}", plural(amount, singular, plural_form))
}

/// Joins items with commas, with an "and" before the last one.
pub fn english_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_owned(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [rest @ .., last] => {
            let rest: Vec<&str> = rest.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", rest.join(", "), last.as_ref())
        }
    }
}
