/// Placeholder written into templates at every variable position.
pub const VAR_TOKEN: &str = "*HVRY%";

/// Whitespace-split tokens of one log line.
pub type TokenSequence = Vec<String>;

pub fn tokenize(line: &str) -> TokenSequence {
    line.split_whitespace().map(str::to_owned).collect()
}

pub fn is_var_token(token: &str) -> bool {
    token == VAR_TOKEN
}
