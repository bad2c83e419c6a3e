//! Custom value parsers for clap.

/// Parse a `KEY=VALUE` pair. The value may be empty; the key may not.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

pub(super) fn parse_parallelism(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if n == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(n)
}
