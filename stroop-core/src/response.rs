/// Scores a response: exact match of palette keys, no partial credit.
pub fn evaluate(target: &str, response: &str) -> bool {
    target == response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_identity_only() {
        assert!(evaluate("RED", "RED"));
        assert!(!evaluate("RED", "GREEN"));
        assert!(!evaluate("RED", "red"));
        assert!(!evaluate("RED", "RED "));
    }
}
