use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of generated state identifiers.
pub const GENERATED_ID_LEN: usize = 10;

/// Generates a random alphanumeric identifier for states defined without one.
pub fn make_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_id_is_ten_alphanumeric_chars() {
        let id = make_id();
        assert_eq!(id.len(), GENERATED_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_make_id_varies() {
        // 62^10 possibilities, a collision here means the generator is broken
        assert_ne!(make_id(), make_id());
    }
}
