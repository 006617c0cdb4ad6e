/// Jenkins API token.
///
/// Wraps the secret so it never shows up in `Debug` output or logs.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::from("11aabbccddeeff");
        assert_eq!(format!("{token:?}"), "Token(***)");
        assert_eq!(token.as_str(), "11aabbccddeeff");
    }
}
