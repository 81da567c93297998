/// Parse a TCP port, rejecting 0 (the OS would pick one).
pub fn parse_port(s: &str) -> Result<u16, String> {
    let port: u16 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid port number", s))?;
    if port == 0 {
        return Err("Port must be between 1 and 65535".to_string());
    }
    Ok(port)
}
